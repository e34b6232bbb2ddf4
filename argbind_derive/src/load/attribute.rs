use crate::model::{DeriveValue, IntermediateAttributes};
use quote::ToTokens;
use std::collections::{HashMap, HashSet};

impl TryFrom<&syn::Attribute> for IntermediateAttributes {
    type Error = syn::Error;

    fn try_from(value: &syn::Attribute) -> Result<Self, Self::Error> {
        let attributes_parser =
            syn::punctuated::Punctuated::<syn::Expr, syn::Token![,]>::parse_terminated;
        let expressions = value.parse_args_with(attributes_parser)?;
        let mut singletons = HashSet::default();
        let mut pairs: HashMap<String, Vec<DeriveValue>> = HashMap::default();

        for expression in expressions {
            match expression {
                syn::Expr::Assign(assignment) => {
                    let left = assignment.left.to_token_stream();
                    pairs.entry(left.to_string()).or_default().push(DeriveValue {
                        tokens: assignment.right.to_token_stream(),
                    });
                }
                syn::Expr::Path(ref path) if path.path.get_ident().is_some() => {
                    singletons.insert(path.to_token_stream().to_string());
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        &other,
                        format!("Unparseable attribute: {}", other.to_token_stream()),
                    ));
                }
            };
        }

        Ok(Self { singletons, pairs })
    }
}

impl IntermediateAttributes {
    /// Gather every `#[argbind(..)]` attribute of an item.
    pub(crate) fn collect(attrs: &[syn::Attribute]) -> Result<Self, syn::Error> {
        let mut collected = IntermediateAttributes::default();

        for attribute in attrs {
            if attribute.path().is_ident("argbind") {
                let IntermediateAttributes { singletons, pairs } = IntermediateAttributes::try_from(attribute)?;
                collected.singletons.extend(singletons);

                for (key, values) in pairs {
                    collected.pairs.entry(key).or_default().extend(values);
                }
            }
        }

        Ok(collected)
    }
}
