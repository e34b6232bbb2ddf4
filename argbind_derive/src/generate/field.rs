use crate::model::{DeriveField, DeriveValue, FieldDefault, FromStrTarget};
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;

impl DeriveField {
    /// The `Field` builder expression describing this field.
    pub(crate) fn generate(self) -> TokenStream2 {
        let DeriveField {
            field_name,
            field_type,
            help,
            default,
            from_str,
        } = self;
        let field_name_str = format!("{field_name}");
        let field_type = field_type.tokens;

        let type_spec = match from_str {
            None => quote! { <#field_type as ::argbind::Typed>::type_spec() },
            Some(FromStrTarget::Direct) => {
                quote! { ::argbind::TypeSpec::Parsed(::argbind::ParsedType::of::<#field_type>()) }
            }
            Some(FromStrTarget::Optional(DeriveValue { tokens: inner })) => quote! {
                ::argbind::TypeSpec::Optional(::std::boxed::Box::new(
                    ::argbind::TypeSpec::Parsed(::argbind::ParsedType::of::<#inner>())
                ))
            },
        };

        let help = help.map(|DeriveValue { tokens }| quote! { .help(#tokens) });

        let default = match default {
            FieldDefault::Absent => None,
            FieldDefault::Null => Some(quote! {
                .default(::argbind::DefaultFactory::constant(::argbind::Value::Null))
            }),
            FieldDefault::Trait => Some(quote! {
                .default(::argbind::DefaultFactory::of(|| -> #field_type {
                    ::core::default::Default::default()
                }))
            }),
            FieldDefault::Expression(DeriveValue { tokens }) => {
                // String literals convert into owned text types (`String`, `PathBuf`, ..).
                let expression = if syn::parse2::<syn::LitStr>(tokens.clone()).is_ok() {
                    quote! { ::core::convert::Into::into(#tokens) }
                } else {
                    tokens
                };

                Some(quote! {
                    .default(::argbind::DefaultFactory::of(|| -> #field_type { #expression }))
                })
            }
        };

        quote! {
            ::argbind::Field::new(#field_name_str, #type_spec) #help #default
        }
    }
}
