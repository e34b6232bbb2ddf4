use crate::load::{documentation, incompatible_error, single_value};
use crate::model::{DeriveField, DeriveValue, FieldDefault, FromStrTarget, IntermediateAttributes};
use quote::{quote, ToTokens};

impl TryFrom<&syn::Field> for DeriveField {
    type Error = syn::Error;

    fn try_from(value: &syn::Field) -> Result<Self, Self::Error> {
        let Some(field_name) = value.ident.clone() else {
            return Err(syn::Error::new_spanned(value, "Invalid - fields must be named."));
        };
        let attributes = IntermediateAttributes::collect(&value.attrs)?;
        let explicit_default = single_value(&attributes, "default", &field_name)?;
        let trait_default = attributes.singletons.contains("default");
        let from_str = attributes.singletons.contains("from_str").then(|| {
            match option_inner(&value.ty) {
                Some(inner) => FromStrTarget::Optional(DeriveValue {
                    tokens: inner.to_token_stream(),
                }),
                None => FromStrTarget::Direct,
            }
        });
        let help = match single_value(&attributes, "help", &field_name)? {
            Some(help) => Some(help),
            None => documentation(&value.attrs).map(|docs| DeriveValue {
                tokens: quote! { #docs },
            }),
        };

        if explicit_default.is_some() && trait_default {
            return Err(incompatible_error(
                "field",
                &field_name,
                "#[argbind(default = ..)]",
                "#[argbind(default)]",
            ));
        }

        let default = match (explicit_default, trait_default) {
            (Some(expression), _) => FieldDefault::Expression(expression),
            (None, true) => FieldDefault::Trait,
            (None, false) if option_inner(&value.ty).is_some() => FieldDefault::Null,
            (None, false) => FieldDefault::Absent,
        };

        Ok(DeriveField {
            field_name,
            field_type: DeriveValue {
                tokens: value.ty.to_token_stream(),
            },
            help,
            default,
            from_str,
        })
    }
}

impl DeriveField {
    /// Whether the field is excluded from the schema.
    pub(crate) fn skipped(value: &syn::Field) -> Result<bool, syn::Error> {
        Ok(IntermediateAttributes::collect(&value.attrs)?
            .singletons
            .contains("skip"))
    }
}

// The `T` of an `Option<T>` field type.
fn option_inner(field_type: &syn::Type) -> Option<&syn::Type> {
    let syn::Type::Path(syn::TypePath { qself: None, path }) = field_type else {
        return None;
    };
    let segment = path.segments.last()?;

    if segment.ident != "Option" {
        return None;
    }

    match &segment.arguments {
        syn::PathArguments::AngleBracketed(arguments) => match arguments.args.first()? {
            syn::GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}
