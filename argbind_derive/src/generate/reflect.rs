use crate::model::{DeriveReflect, DeriveValue, DeriveVariant, Shape};
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;

impl DeriveReflect {
    pub(crate) fn generate(self) -> TokenStream2 {
        let DeriveReflect { type_name, shape } = self;
        let type_name_str = format!("{type_name}");

        match shape {
            Shape::Record { fields, forwards } => {
                let fields = fields.into_iter().map(|field| {
                    let field = field.generate();
                    quote! { .field(#field) }
                });
                let forwards = forwards.into_iter().map(|DeriveValue { tokens }| {
                    quote! { .forward_to(::argbind::StructType::of::<#tokens>()) }
                });

                quote! {
                    impl ::argbind::Typed for #type_name {
                        fn type_spec() -> ::argbind::TypeSpec {
                            ::argbind::TypeSpec::Struct(::argbind::StructType::of::<#type_name>())
                        }
                    }

                    impl ::argbind::Reflect for #type_name {
                        fn schema() -> ::argbind::Schema {
                            ::argbind::Schema::new(#type_name_str)
                                #( #fields )*
                                #( #forwards )*
                        }
                    }
                }
            }
            Shape::Union { variants, prefix } => {
                let variants = variants.into_iter().map(|DeriveVariant { label, target }| {
                    let target = target.tokens;
                    quote! { .variant(#label, ::argbind::StructType::of::<#target>()) }
                });

                quote! {
                    impl ::argbind::Typed for #type_name {
                        fn type_spec() -> ::argbind::TypeSpec {
                            ::argbind::TypeSpec::Conditional(
                                ::argbind::ConditionalType::new(#type_name_str)
                                    #( #variants )*
                                    .prefix(#prefix)
                            )
                        }
                    }
                }
            }
            Shape::Choices { labels } => {
                quote! {
                    impl ::argbind::Typed for #type_name {
                        fn type_spec() -> ::argbind::TypeSpec {
                            ::argbind::TypeSpec::Literal(::std::vec![
                                #( ::argbind::Value::String(::std::string::String::from(#labels)) ),*
                            ])
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeriveField, FieldDefault};
    use proc_macro2::Span;

    fn ident(name: &str) -> syn::Ident {
        syn::Ident::new(name, Span::call_site())
    }

    #[test]
    fn generate_record() {
        // Setup
        let derive_reflect = DeriveReflect {
            type_name: ident("Parameters"),
            shape: Shape::Record {
                fields: vec![DeriveField {
                    field_name: ident("apple"),
                    field_type: DeriveValue {
                        tokens: quote! { usize },
                    },
                    help: None,
                    default: FieldDefault::Absent,
                    from_str: None,
                }],
                forwards: vec![DeriveValue {
                    tokens: quote! { Base },
                }],
            },
        };

        // Execute
        let token_stream = derive_reflect.generate();

        // Verify
        assert_eq!(
            token_stream.to_string(),
            quote! {
                impl ::argbind::Typed for Parameters {
                    fn type_spec() -> ::argbind::TypeSpec {
                        ::argbind::TypeSpec::Struct(::argbind::StructType::of::<Parameters>())
                    }
                }

                impl ::argbind::Reflect for Parameters {
                    fn schema() -> ::argbind::Schema {
                        ::argbind::Schema::new("Parameters")
                            .field(::argbind::Field::new("apple", <usize as ::argbind::Typed>::type_spec()))
                            .forward_to(::argbind::StructType::of::<Base>())
                    }
                }
            }
            .to_string()
        );
    }

    #[test]
    fn generate_union() {
        // Setup
        let derive_reflect = DeriveReflect {
            type_name: ident("Optimizer"),
            shape: Shape::Union {
                variants: vec![DeriveVariant {
                    label: "adam".to_string(),
                    target: DeriveValue {
                        tokens: quote! { AdamConfig },
                    },
                }],
                prefix: false,
            },
        };

        // Execute
        let token_stream = derive_reflect.generate();

        // Verify
        assert_eq!(
            token_stream.to_string(),
            quote! {
                impl ::argbind::Typed for Optimizer {
                    fn type_spec() -> ::argbind::TypeSpec {
                        ::argbind::TypeSpec::Conditional(
                            ::argbind::ConditionalType::new("Optimizer")
                                .variant("adam", ::argbind::StructType::of::<AdamConfig>())
                                .prefix(false)
                        )
                    }
                }
            }
            .to_string()
        );
    }

    #[test]
    fn generate_choices() {
        let derive_reflect = DeriveReflect {
            type_name: ident("Mode"),
            shape: Shape::Choices {
                labels: vec!["fast".to_string(), "slow".to_string()],
            },
        };
        assert_eq!(
            derive_reflect.generate().to_string(),
            quote! {
                impl ::argbind::Typed for Mode {
                    fn type_spec() -> ::argbind::TypeSpec {
                        ::argbind::TypeSpec::Literal(::std::vec![
                            ::argbind::Value::String(::std::string::String::from("fast")),
                            ::argbind::Value::String(::std::string::String::from("slow"))
                        ])
                    }
                }
            }
            .to_string()
        );
    }
}
