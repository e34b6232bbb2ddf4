use serde_json::Value;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::model::{ArgumentValues, StructType};

type Resolver = Arc<dyn Fn(&ArgumentValues) -> Option<(String, StructType)> + Send + Sync>;

#[derive(Clone)]
enum Selection {
    Labels(Vec<(String, StructType)>),
    Resolved {
        labels: Option<Vec<String>>,
        resolver: Resolver,
        always_expand: bool,
    },
}

/// A tagged union whose member is selected by a discriminant argument.
///
/// The discriminant is registered as a `str` argument.
/// Once its value is known, the fields of the selected member are registered too.
#[derive(Clone)]
pub struct ConditionalType {
    name: String,
    prefix: bool,
    selection: Selection,
}

impl ConditionalType {
    /// A tagged union selected by label.
    /// Members are added with [`ConditionalType::variant`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: true,
            selection: Selection::Labels(Vec::new()),
        }
    }

    /// A tagged union whose member is chosen by a function of the arguments parsed so far.
    ///
    /// By default the resolver only runs once the discriminant itself has a value.
    pub fn resolved_by(
        name: impl Into<String>,
        resolver: impl Fn(&ArgumentValues) -> Option<(String, StructType)> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            prefix: true,
            selection: Selection::Resolved {
                labels: None,
                resolver: Arc::new(resolver),
                always_expand: false,
            },
        }
    }

    /// Add a member selected by `label`.
    /// Has no effect on a resolver based union.
    pub fn variant(mut self, label: impl Into<String>, target: StructType) -> Self {
        if let Selection::Labels(labels) = &mut self.selection {
            labels.push((label.into(), target));
        }
        self
    }

    /// Declare the labels a resolver based union accepts, which become the discriminant's choices.
    pub fn labels<S: Into<String>>(mut self, declared: impl IntoIterator<Item = S>) -> Self {
        if let Selection::Resolved { labels, .. } = &mut self.selection {
            *labels = Some(declared.into_iter().map(Into::into).collect());
        }
        self
    }

    /// Run the resolver even when the discriminant has no value.
    pub fn always_expand(mut self, expand: bool) -> Self {
        if let Selection::Resolved { always_expand, .. } = &mut self.selection {
            *always_expand = expand;
        }
        self
    }

    /// Whether the member's argument names are prefixed by the discriminant's name (`--k-field`).
    /// Without the prefix they sit at the discriminant's level (`--field`).
    pub fn prefix(mut self, prefix: bool) -> Self {
        self.prefix = prefix;
        self
    }

    /// The name of the union.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// See [`ConditionalType::prefix`].
    pub fn has_prefix(&self) -> bool {
        self.prefix
    }

    /// The accepted labels, when known up front.
    pub fn choices(&self) -> Option<Vec<Value>> {
        match &self.selection {
            Selection::Labels(labels) => Some(
                labels
                    .iter()
                    .map(|(label, _)| Value::String(label.clone()))
                    .collect(),
            ),
            Selection::Resolved { labels, .. } => labels
                .as_ref()
                .map(|labels| labels.iter().cloned().map(Value::String).collect()),
        }
    }

    /// Select the member for the discriminant's current value.
    pub fn resolve(
        &self,
        discriminant: Option<&Value>,
        values: &ArgumentValues,
    ) -> Option<VariantType> {
        let (label, target) = match &self.selection {
            Selection::Labels(labels) => {
                let selected = discriminant.and_then(Value::as_str)?;
                labels
                    .iter()
                    .find(|(label, _)| label == selected)
                    .map(|(label, target)| (label.clone(), *target))?
            }
            Selection::Resolved {
                resolver,
                always_expand,
                ..
            } => {
                let present = discriminant.map_or(false, |value| !value.is_null());

                if !present && !always_expand {
                    return None;
                }

                resolver(values)?
            }
        };

        Some(VariantType {
            union: self.clone(),
            label,
            target,
        })
    }
}

impl PartialEq for ConditionalType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.prefix == other.prefix
            && match (&self.selection, &other.selection) {
                (Selection::Labels(left), Selection::Labels(right)) => left == right,
                (
                    Selection::Resolved {
                        resolver: left, ..
                    },
                    Selection::Resolved {
                        resolver: right, ..
                    },
                ) => Arc::ptr_eq(left, right),
                _ => false,
            }
    }
}

impl Debug for ConditionalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalType")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("choices", &self.choices())
            .finish()
    }
}

/// The member of a [`ConditionalType`] selected by its discriminant.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantType {
    union: ConditionalType,
    label: String,
    target: StructType,
}

impl VariantType {
    /// The union this member belongs to.
    pub fn union(&self) -> &ConditionalType {
        &self.union
    }

    /// The selected label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The member's record type.
    pub fn target(&self) -> StructType {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{Field, Reflect, Schema};
    use crate::model::{TypeSpec, Typed};
    use serde_json::json;

    struct First;
    struct Second;

    impl Typed for First {
        fn type_spec() -> TypeSpec {
            TypeSpec::Struct(StructType::of::<First>())
        }
    }

    impl Reflect for First {
        fn schema() -> Schema {
            Schema::new("First").field(Field::new("a", TypeSpec::Int))
        }
    }

    impl Typed for Second {
        fn type_spec() -> TypeSpec {
            TypeSpec::Struct(StructType::of::<Second>())
        }
    }

    impl Reflect for Second {
        fn schema() -> Schema {
            Schema::new("Second").field(Field::new("b", TypeSpec::Str))
        }
    }

    fn union() -> ConditionalType {
        ConditionalType::new("Choice")
            .variant("first", StructType::of::<First>())
            .variant("second", StructType::of::<Second>())
    }

    #[test]
    fn choices() {
        assert_eq!(union().choices(), Some(vec![json!("first"), json!("second")]));
    }

    #[test]
    fn resolve_label() {
        // Setup
        let union = union();

        // Execute
        let variant = union.resolve(Some(&json!("second")), &ArgumentValues::default());

        // Verify
        assert_matches!(variant, Some(variant) => {
            assert_eq!(variant.label(), "second");
            assert_eq!(variant.target(), StructType::of::<Second>());
            assert_eq!(variant.union(), &union);
        });
    }

    #[test]
    fn resolve_label_unknown() {
        let union = union();
        assert_eq!(
            union.resolve(Some(&json!("third")), &ArgumentValues::default()),
            None
        );
        assert_eq!(union.resolve(None, &ArgumentValues::default()), None);
    }

    #[test]
    fn resolve_function() {
        // Setup
        let union = ConditionalType::resolved_by("Choice", |values| {
            match values.get("mode").and_then(Value::as_str) {
                Some("fast") => Some(("first".to_string(), StructType::of::<First>())),
                _ => None,
            }
        });
        let mut values = ArgumentValues::default();
        values.insert("mode".to_string(), json!("fast"));

        // Execute
        let variant = union.resolve(Some(&json!("fast")), &values);
        let absent = union.resolve(None, &values);

        // Verify
        assert_matches!(variant, Some(variant) => {
            assert_eq!(variant.label(), "first");
        });
        assert_eq!(absent, None);
        assert_eq!(union.choices(), None);
    }

    #[test]
    fn resolve_function_always_expand() {
        // Setup
        let union = ConditionalType::resolved_by("Choice", |_| {
            Some(("second".to_string(), StructType::of::<Second>()))
        })
        .labels(["second"])
        .always_expand(true);

        // Execute
        let variant = union.resolve(None, &ArgumentValues::default());

        // Verify
        assert_matches!(variant, Some(variant) => {
            assert_eq!(variant.label(), "second");
        });
        assert_eq!(union.choices(), Some(vec![json!("second")]));
    }

    #[test]
    fn refined_by_variant() {
        // Setup
        let union = union();
        let variant = union
            .resolve(Some(&json!("first")), &ArgumentValues::default())
            .map(TypeSpec::Variant);

        // Execute & Verify
        assert_matches!(variant, Some(variant) => {
            assert!(TypeSpec::Conditional(union.clone()).is_refined_by(&variant));
            assert!(!variant.is_refined_by(&TypeSpec::Conditional(union)));
            assert!(!TypeSpec::Conditional(ConditionalType::new("Other")).is_refined_by(&variant));
        });
    }
}
