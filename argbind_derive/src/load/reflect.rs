use crate::load::{incompatible_error, single_value, snake_case};
use crate::model::{DeriveField, DeriveReflect, DeriveValue, DeriveVariant, IntermediateAttributes, Shape};
use quote::ToTokens;

impl TryFrom<syn::DeriveInput> for DeriveReflect {
    type Error = syn::Error;

    fn try_from(value: syn::DeriveInput) -> Result<Self, Self::Error> {
        let type_name = value.ident.clone();

        if !value.generics.params.is_empty() {
            return Err(syn::Error::new(
                type_name.span(),
                "Invalid - `Reflect` cannot be derived for generic types.",
            ));
        }

        let attributes = IntermediateAttributes::collect(&value.attrs)?;

        let shape = match &value.data {
            syn::Data::Struct(syn::DataStruct {
                fields: syn::Fields::Named(fields),
                ..
            }) => {
                let mut derive_fields = Vec::default();

                for field in &fields.named {
                    if !DeriveField::skipped(field)? {
                        derive_fields.push(DeriveField::try_from(field)?);
                    }
                }

                Shape::Record {
                    fields: derive_fields,
                    forwards: attributes.pairs.get("forward").cloned().unwrap_or_default(),
                }
            }
            syn::Data::Struct(_) => {
                return Err(syn::Error::new(
                    type_name.span(),
                    "Invalid - `Reflect` requires a struct with named fields.",
                ));
            }
            syn::Data::Enum(data) => load_enum(&type_name, &attributes, data)?,
            syn::Data::Union(_) => {
                return Err(syn::Error::new(
                    type_name.span(),
                    "Invalid - `Reflect` cannot be derived for unions.",
                ));
            }
        };

        Ok(DeriveReflect { type_name, shape })
    }
}

fn load_enum(
    type_name: &syn::Ident,
    attributes: &IntermediateAttributes,
    data: &syn::DataEnum,
) -> Result<Shape, syn::Error> {
    let mut variants = Vec::default();
    let mut labels = Vec::default();

    for variant in &data.variants {
        let variant_attributes = IntermediateAttributes::collect(&variant.attrs)?;
        let label = match single_value(&variant_attributes, "label", &variant.ident)? {
            Some(value) => syn::parse2::<syn::LitStr>(value.tokens)?.value(),
            None => snake_case(&variant.ident.to_string()),
        };

        match &variant.fields {
            syn::Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                variants.push(DeriveVariant {
                    label,
                    target: DeriveValue {
                        tokens: fields.unnamed[0].ty.to_token_stream(),
                    },
                });
            }
            syn::Fields::Unit => labels.push(label),
            _ => {
                return Err(syn::Error::new(
                    variant.ident.span(),
                    "Invalid - enum variants must be units or wrap exactly one record.",
                ));
            }
        }
    }

    match (variants.is_empty(), labels.is_empty()) {
        (true, true) => Err(syn::Error::new(
            type_name.span(),
            "Invalid - `Reflect` requires at least one enum variant.",
        )),
        (false, false) => Err(incompatible_error(
            "enum",
            type_name,
            "unit variants",
            "record variants",
        )),
        (true, false) => Ok(Shape::Choices { labels }),
        (false, true) => {
            let prefix = match single_value(attributes, "prefix", type_name)? {
                Some(value) => syn::parse2::<syn::LitBool>(value.tokens)?.value,
                None => true,
            };
            Ok(Shape::Union { variants, prefix })
        }
    }
}
