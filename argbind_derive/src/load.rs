mod attribute;
mod field;
mod reflect;

use crate::model::{DeriveValue, IntermediateAttributes};

pub(self) fn incompatible_error(
    context: &str,
    name: &syn::Ident,
    left: impl Into<String>,
    right: impl Into<String>,
) -> syn::Error {
    syn::Error::new(
        name.span(),
        format!(
            "Invalid - {context} cannot be both `{}` and `{}`.",
            left.into(),
            right.into(),
        ),
    )
}

// The single value of a `key = value` attribute pair; repeating the key is an error.
pub(self) fn single_value(
    attributes: &IntermediateAttributes,
    key: &str,
    name: &syn::Ident,
) -> Result<Option<DeriveValue>, syn::Error> {
    match attributes.pairs.get(key).map(Vec::as_slice) {
        None | Some([]) => Ok(None),
        Some([value]) => Ok(Some(value.clone())),
        Some(_) => Err(syn::Error::new(
            name.span(),
            format!("Invalid - `#[argbind({key} = ..)]` may only be specified once."),
        )),
    }
}

// The `///` documentation, with lines joined by a space.
pub(self) fn documentation(attrs: &[syn::Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attribute| attribute.path().is_ident("doc"))
        .filter_map(|attribute| match &attribute.meta {
            syn::Meta::NameValue(syn::MetaNameValue {
                value:
                    syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(line),
                        ..
                    }),
                ..
            }) => Some(line.value().trim().to_string()),
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}

pub(self) fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);

    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn snake_case_names() {
        assert_eq!(snake_case("Adam"), "adam");
        assert_eq!(snake_case("StochasticGradient"), "stochastic_gradient");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn documentation_lines() {
        // Setup
        let item: syn::ItemStruct = parse_quote! {
            /// The learning rate.
            ///
            /// Must be positive.
            #[argbind(default = 0.1)]
            struct Parameters {}
        };

        // Execute
        let docs = documentation(&item.attrs);

        // Verify
        assert_eq!(docs, Some("The learning rate. Must be positive.".to_string()));
    }

    #[test]
    fn documentation_absent() {
        let item: syn::ItemStruct = parse_quote! {
            struct Parameters {}
        };
        assert_eq!(documentation(&item.attrs), None);
    }
}
