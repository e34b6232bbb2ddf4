use proc_macro2::TokenStream as TokenStream2;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct DeriveValue {
    pub tokens: TokenStream2,
}

impl PartialEq for DeriveValue {
    fn eq(&self, other: &Self) -> bool {
        self.tokens.to_string() == other.tokens.to_string()
    }
}

impl Eq for DeriveValue {}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IntermediateAttributes {
    pub singletons: HashSet<String>,
    pub pairs: HashMap<String, Vec<DeriveValue>>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum FieldDefault {
    Absent,
    // `Option<T>` fields default to null.
    Null,
    Trait,
    Expression(DeriveValue),
}

#[derive(Debug, PartialEq, Eq)]
pub struct DeriveField {
    pub field_name: syn::Ident,
    pub field_type: DeriveValue,
    pub help: Option<DeriveValue>,
    pub default: FieldDefault,
    pub from_str: Option<FromStrTarget>,
}

/// What `#[argbind(from_str)]` parses the argument into.
#[derive(Debug, PartialEq, Eq)]
pub enum FromStrTarget {
    /// The field type itself.
    Direct,
    /// The inner type of an `Option<..>` field.
    Optional(DeriveValue),
}

#[derive(Debug, PartialEq, Eq)]
pub struct DeriveVariant {
    pub label: String,
    pub target: DeriveValue,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Shape {
    Record {
        fields: Vec<DeriveField>,
        forwards: Vec<DeriveValue>,
    },
    Union {
        variants: Vec<DeriveVariant>,
        prefix: bool,
    },
    Choices {
        labels: Vec<String>,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub struct DeriveReflect {
    pub type_name: syn::Ident,
    pub shape: Shape,
}
