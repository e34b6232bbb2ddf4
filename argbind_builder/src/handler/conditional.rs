use serde_json::{Map, Value};

use crate::constant::*;
use crate::error::Error;
use crate::handler::{Handler, Preprocessed};
use crate::model::{ArgumentType, ArgumentValues, ConditionalType, TypeSpec, VariantType};
use crate::reflect::Schema;
use crate::runtime::Runtime;
use crate::tree::algebra::{merge_parameter_trees, prefix_parameter};
use crate::tree::{Parameter, ParameterWithPath};

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// Handles tagged unions ([`TypeSpec::Conditional`]).
///
/// The discriminant registers as a `str` argument whose choices are the labels.
/// Before parsing, each discriminant with a selected member expands into a [`TypeSpec::Variant`] aggregate holding the
/// member's fields, which bind to `{label: {fields..}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionalHandler;

impl ConditionalHandler {
    fn expand(
        &self,
        discriminant: &ParameterWithPath<'_>,
        variant: VariantType,
    ) -> Result<Parameter, Error> {
        let members = Parameter::from_schema(&variant.target().schema())?;
        let prefix = variant.union().has_prefix();
        // The level the discriminant is registered at: its argument name without its own segment.
        let level = discriminant.argument_name().and_then(|argument_name| {
            let name = discriminant.name()?;
            argument_name
                .strip_suffix(name)?
                .strip_suffix(ARGUMENT_SEPARATOR)
                .map(str::to_string)
        });
        let children = members
            .children()
            .iter()
            .map(|member| {
                if prefix {
                    member.clone()
                } else {
                    let name = member.name().unwrap_or_default();
                    let argument_name = match &level {
                        Some(level) => format!("{level}{ARGUMENT_SEPARATOR}{name}"),
                        None => name.to_string(),
                    };

                    member.clone().with_argument_name(Some(argument_name))
                }
            })
            .collect();

        #[cfg(feature = "tracing_debug")]
        {
            debug!(
                "Expanding '{:?}' into {}.",
                discriminant.full_name(),
                variant.label()
            );
        }

        let expansion = Parameter::container(
            discriminant.name().map(str::to_string),
            Some(TypeSpec::Variant(variant)),
        )
        .with_help(discriminant.help())
        .with_argument_name(discriminant.explicit_argument_name().map(str::to_string))
        .with_children(children);
        let parent_path = discriminant
            .parent()
            .and_then(|parent| parent.full_name())
            .unwrap_or_default();

        Ok(prefix_parameter(expansion, &parent_path, None))
    }
}

fn conditional<'a>(parameter: &'a ParameterWithPath<'_>) -> Option<&'a ConditionalType> {
    match parameter.type_spec() {
        Some(TypeSpec::Conditional(union)) if parameter.is_leaf() => Some(union),
        _ => None,
    }
}

impl Handler for ConditionalHandler {
    fn preprocess(&self, parameter: &ParameterWithPath<'_>) -> Option<Preprocessed> {
        if let Some(union) = conditional(parameter) {
            let choices = union
                .choices()
                .or_else(|| parameter.choices().map(<[Value]>::to_vec));

            return Some(Preprocessed::Keep(
                parameter
                    .parameter()
                    .clone()
                    .with_argument_type(Some(ArgumentType::Str))
                    .with_choices(choices),
            ));
        }

        match parameter.type_spec() {
            Some(TypeSpec::Variant(_)) => Some(Preprocessed::Keep(parameter.parameter().clone())),
            _ => None,
        }
    }

    fn add_parameter(
        &self,
        parameter: &ParameterWithPath<'_>,
        _runtime: &mut dyn Runtime,
    ) -> Result<bool, Error> {
        Ok(matches!(parameter.type_spec(), Some(TypeSpec::Variant(_))))
    }

    fn bind(
        &self,
        parameter: &ParameterWithPath<'_>,
        _values: &ArgumentValues,
        children: &[(String, Value)],
    ) -> Result<Option<Value>, Error> {
        let Some(TypeSpec::Variant(variant)) = parameter.type_spec() else {
            return Ok(None);
        };

        let fields: Map<String, Value> = children.iter().cloned().collect();
        let mut tagged = Map::default();
        tagged.insert(variant.label().to_string(), Value::Object(fields));
        Ok(Some(Value::Object(tagged)))
    }

    fn before_parse(
        &self,
        parameters: &Parameter,
        _runtime: &dyn Runtime,
        values: &ArgumentValues,
    ) -> Result<Option<Parameter>, Error> {
        let mut expansions = Vec::default();

        for parameter in parameters.enumerate_parameters() {
            let Some(union) = conditional(&parameter) else {
                continue;
            };

            let discriminant = parameter
                .argument_name()
                .and_then(|argument_name| values.get(&argument_name));

            if let Some(variant) = union.resolve(discriminant, values) {
                expansions.push(self.expand(&parameter, variant)?);
            }
        }

        if expansions.is_empty() {
            Ok(None)
        } else {
            Ok(Some(merge_parameter_trees(expansions)))
        }
    }

    fn after_parse(
        &self,
        parameters: &Parameter,
        values: &ArgumentValues,
        mut bound: Value,
    ) -> Result<Value, Error> {
        for parameter in parameters.enumerate_parameters() {
            let (Some(union), Some(full_name)) = (conditional(&parameter), parameter.full_name()) else {
                continue;
            };

            let pointer = format!("/{}", full_name.replace(PATH_SEPARATOR, "/"));
            let Some(slot) = bound.pointer_mut(&pointer) else {
                continue;
            };

            // Already expanded and bound.
            if slot.is_object() {
                continue;
            }

            if let Some(variant) = union.resolve(Some(&*slot), values) {
                let fields = member_defaults(&variant.target().schema(), &full_name)?;
                let mut tagged = Map::default();
                tagged.insert(variant.label().to_string(), fields);
                *slot = Value::Object(tagged);
            }
        }

        Ok(bound)
    }
}

// A member selected after registration never had its fields registered; complete it from the defaults.
fn member_defaults(schema: &Schema, path: &str) -> Result<Value, Error> {
    let members = Parameter::from_schema(schema)?;
    let folded = members.fold(|node, children: Vec<(Option<String>, Value)>| {
        let value = if node.name().is_none() || !node.is_leaf() {
            Value::Object(
                children
                    .into_iter()
                    .filter_map(|(name, value)| name.map(|name| (name, value)))
                    .collect(),
            )
        } else {
            node.default().ok_or_else(|| {
                Error::MissingArgument(format!(
                    "{path}{PATH_SEPARATOR}{}",
                    node.full_name().unwrap_or_default()
                ))
            })?
        };

        Ok::<_, Error>(Some((node.name().map(str::to_string), value)))
    })?;

    Ok(folded.map(|(_, value)| value).unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerRegistry;
    use crate::model::{DefaultFactory, StructType, Typed};
    use crate::reflect::Field;
    use crate::runtime::MemoryRuntime;
    use serde_json::json;

    struct D1;
    struct D2;

    impl Typed for D1 {
        fn type_spec() -> TypeSpec {
            TypeSpec::Struct(StructType::of::<D1>())
        }
    }

    impl crate::reflect::Reflect for D1 {
        fn schema() -> Schema {
            Schema::new("D1").field(Field::new("prop_d1", TypeSpec::Str).default_value("d"))
        }
    }

    impl Typed for D2 {
        fn type_spec() -> TypeSpec {
            TypeSpec::Struct(StructType::of::<D2>())
        }
    }

    impl crate::reflect::Reflect for D2 {
        fn schema() -> Schema {
            Schema::new("D2").field(Field::new("prop_d2", TypeSpec::Str))
        }
    }

    fn union(prefix: bool) -> ConditionalType {
        ConditionalType::new("D")
            .variant("d1", StructType::of::<D1>())
            .variant("d2", StructType::of::<D2>())
            .prefix(prefix)
    }

    fn tree(prefix: bool) -> Parameter {
        Parameter::root().with_children(vec![Parameter::container(
            Some("outer".to_string()),
            Some(TypeSpec::Mapping),
        )
        .with_children(vec![Parameter::new("k", TypeSpec::Conditional(union(prefix)))])])
    }

    fn values(pairs: &[(&str, Value)]) -> ArgumentValues {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn preprocess() {
        // Execute
        let result = HandlerRegistry::default().preprocess(&tree(true));

        // Verify
        assert_matches!(result, Some(tree) => {
            let k = tree.find("outer").and_then(|outer| outer.find("k"));
            assert_matches!(k, Some(k) => {
                assert_eq!(k.argument_type(), Some(ArgumentType::Str));
                assert_eq!(k.choices(), Some(&[json!("d1"), json!("d2")][..]));
            });
        });
    }

    #[test]
    fn before_parse_prefixed() {
        // Setup
        let runtime = MemoryRuntime::new();

        // Execute
        let result = ConditionalHandler.before_parse(&tree(true), &runtime, &values(&[("outer_k", json!("d2"))]));

        // Verify
        assert_matches!(result, Ok(Some(expansion)) => {
            let names: Vec<(Option<String>, Option<String>)> = expansion
                .enumerate_parameters()
                .map(|p| (p.full_name(), p.argument_name()))
                .collect();
            assert_eq!(
                names,
                vec![
                    (None, None),
                    (Some("outer".to_string()), Some("outer".to_string())),
                    (Some("outer.k".to_string()), Some("outer_k".to_string())),
                    (Some("outer.k.prop_d2".to_string()), Some("outer_k_prop_d2".to_string())),
                ]
            );
            let outer = expansion.find("outer");
            assert_eq!(outer.and_then(Parameter::type_spec), None);
            assert_matches!(
                outer.and_then(|outer| outer.find("k")).and_then(Parameter::type_spec),
                Some(TypeSpec::Variant(variant)) => {
                    assert_eq!(variant.label(), "d2");
                }
            );
        });
    }

    #[test]
    fn before_parse_unprefixed() {
        // Setup
        let runtime = MemoryRuntime::new();

        // Execute
        let result = ConditionalHandler.before_parse(&tree(false), &runtime, &values(&[("outer_k", json!("d2"))]));

        // Verify
        assert_matches!(result, Ok(Some(expansion)) => {
            let names: Vec<Option<String>> = expansion
                .enumerate_parameters()
                .map(|p| p.argument_name())
                .collect();
            assert_eq!(
                names,
                vec![None, Some("outer".to_string()), Some("outer_k".to_string()), Some("outer_prop_d2".to_string())]
            );
        });
    }

    #[test]
    fn before_parse_unprefixed_explicit_name() {
        // Setup
        let tree = Parameter::root().with_children(vec![Parameter::container(
            Some("outer".to_string()),
            Some(TypeSpec::Mapping),
        )
        .with_children(vec![
            Parameter::new("k", TypeSpec::Conditional(union(false))).with_argument_name(Some("k".to_string()))
        ])]);
        let runtime = MemoryRuntime::new();

        // Execute
        let result = ConditionalHandler.before_parse(&tree, &runtime, &values(&[("k", json!("d2"))]));

        // Verify
        assert_matches!(result, Ok(Some(expansion)) => {
            let names: Vec<Option<String>> = expansion
                .enumerate_parameters()
                .map(|p| p.argument_name())
                .collect();
            assert_eq!(
                names,
                vec![None, Some("outer".to_string()), Some("k".to_string()), Some("prop_d2".to_string())]
            );
        });
    }

    #[test]
    fn before_parse_unselected() {
        let runtime = MemoryRuntime::new();
        assert_matches!(ConditionalHandler.before_parse(&tree(true), &runtime, &ArgumentValues::default()), Ok(None));
        assert_matches!(
            ConditionalHandler.before_parse(&tree(true), &runtime, &values(&[("outer_k", json!("d3"))])),
            Ok(None)
        );
    }

    #[test]
    fn bind_variant() {
        // Setup
        let runtime = MemoryRuntime::new();
        let expansion = ConditionalHandler.before_parse(&tree(true), &runtime, &values(&[("outer_k", json!("d2"))]));
        let registry = HandlerRegistry::default();

        // Execute
        let result = expansion.map(|expansion| {
            expansion.map(|expansion| {
                let outer = expansion.children()[0].clone().with_type(Some(TypeSpec::Mapping));
                let expansion = expansion.with_children(vec![outer]);
                registry.bind(&expansion, &crate::handler::tests::parsed(&[("outer_k_prop_d2", json!("ok"))]))
            })
        });

        // Verify
        assert_matches!(result, Ok(Some(Ok(value))) => {
            assert_eq!(value, json!({"outer": {"k": {"d2": {"prop_d2": "ok"}}}}));
        });
    }

    #[test]
    fn after_parse_completes() {
        // Setup
        let bound = json!({"outer": {"k": "d1"}});

        // Execute
        let result = ConditionalHandler.after_parse(&tree(true), &ArgumentValues::default(), bound);

        // Verify
        assert_matches!(result, Ok(value) => {
            assert_eq!(value, json!({"outer": {"k": {"d1": {"prop_d1": "d"}}}}));
        });
    }

    #[test]
    fn after_parse_missing() {
        let bound = json!({"outer": {"k": "d2"}});
        let result = ConditionalHandler.after_parse(&tree(true), &ArgumentValues::default(), bound);
        assert_matches!(result, Err(Error::MissingArgument(path)) => {
            assert_eq!(path, "outer.k.prop_d2");
        });
    }

    #[test]
    fn after_parse_resolver() {
        // Setup
        let union = ConditionalType::resolved_by("D", |values: &ArgumentValues| {
            values
                .get("mode")
                .and_then(Value::as_str)
                .filter(|mode| *mode == "first")
                .map(|_| ("d1".to_string(), StructType::of::<D1>()))
        })
        .always_expand(true);
        let tree = Parameter::root().with_children(vec![
            Parameter::new("k", TypeSpec::Conditional(union)).with_default(Some(DefaultFactory::constant(Value::Null))),
        ]);

        // Execute
        let result = ConditionalHandler.after_parse(&tree, &values(&[("mode", json!("first"))]), json!({"k": null}));

        // Verify
        assert_matches!(result, Ok(value) => {
            assert_eq!(value, json!({"k": {"d1": {"prop_d1": "d"}}}));
        });
    }
}
