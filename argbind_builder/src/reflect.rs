use serde::Serialize;
use std::collections::HashSet;

use crate::error::Error;
use crate::model::{DefaultFactory, StructType, TypeSpec, Typed};
use crate::tree::{join_path, Parameter};

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// A Rust type whose fields can be reflected into a parameter tree.
///
/// Typically implemented via `#[derive(Reflect)]`.
pub trait Reflect: Typed {
    /// Describe the fields of the type.
    fn schema() -> Schema;
}

/// How a field takes part in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// An ordinary named field.
    Named,
    /// The instance receiver; never becomes a parameter.
    Receiver,
    /// Forwards any extra keywords to the bases; pulls their fields in.
    Forward,
}

/// A reflected field.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    type_spec: TypeSpec,
    help: String,
    default: Option<DefaultFactory>,
    kind: FieldKind,
}

impl Field {
    /// A named field of the given type.
    pub fn new(name: impl Into<String>, type_spec: TypeSpec) -> Self {
        Self {
            name: name.into(),
            type_spec,
            help: String::default(),
            default: None,
            kind: FieldKind::Named,
        }
    }

    /// The instance receiver.
    pub fn receiver(name: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::Receiver,
            ..Self::new(name, TypeSpec::Mapping)
        }
    }

    /// A keyword forwarding field.
    pub fn forward(name: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::Forward,
            ..Self::new(name, TypeSpec::Mapping)
        }
    }

    /// Document the field.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Set the default producer.
    pub fn default(mut self, default: DefaultFactory) -> Self {
        self.default = Some(default);
        self
    }

    /// Set a fixed default.
    pub fn default_value<T>(self, value: T) -> Self
    where
        T: Serialize + Clone + Send + Sync + 'static,
    {
        self.default(DefaultFactory::of(move || value.clone()))
    }

    /// The name of the field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    pub fn type_spec(&self) -> &TypeSpec {
        &self.type_spec
    }

    /// How the field takes part in the tree.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

/// The reflected description of a record type.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
    bases: Vec<StructType>,
}

impl Schema {
    /// An empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::default(),
            bases: Vec::default(),
        }
    }

    /// Add a field.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a base whose fields are pulled in when the schema has a [`FieldKind::Forward`] field.
    pub fn base(mut self, base: StructType) -> Self {
        self.bases.push(base);
        self
    }

    /// Forward extra keywords to `base`, pulling in its fields.
    pub fn forward_to(self, base: StructType) -> Self {
        let forwards = self
            .fields
            .iter()
            .any(|field| field.kind() == FieldKind::Forward);
        let schema = if forwards {
            self
        } else {
            self.field(Field::forward("forward"))
        };

        schema.base(base)
    }

    /// The name of the type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fields, in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The bases.
    pub fn bases(&self) -> &[StructType] {
        &self.bases
    }
}

impl Parameter {
    /// Reflect the parameter tree of `T`.
    pub fn of<T: Reflect>() -> Result<Parameter, Error> {
        Parameter::from_schema(&T::schema())
    }

    /// Build the parameter tree of a schema.
    ///
    /// The root is an unnamed mapping whose children are the schema's fields.
    /// Record typed fields become aggregates holding their own fields.
    pub fn from_schema(schema: &Schema) -> Result<Parameter, Error> {
        let mut builder = TreeBuilder::default();
        let children = builder.collect(schema, None)?;
        Ok(Parameter::root().with_children(children))
    }
}

#[derive(Default)]
struct TreeBuilder {
    generated: HashSet<String>,
}

impl TreeBuilder {
    fn collect(&mut self, schema: &Schema, parent: Option<&str>) -> Result<Vec<Parameter>, Error> {
        let mut parameters = Vec::default();
        let mut forwards = false;

        for field in schema.fields() {
            match field.kind() {
                FieldKind::Receiver => continue,
                FieldKind::Forward => {
                    forwards = true;
                    continue;
                }
                FieldKind::Named => {}
            }

            let full_name = join_path(parent, field.name());

            if !self.generated.insert(full_name.clone()) {
                return Err(Error::DuplicateParameter(full_name));
            }

            let mut parameter = Parameter::new(field.name(), field.type_spec().clone())
                .with_help(field.help.clone())
                .with_default(field.default.clone());

            if let TypeSpec::Struct(nested) = field.type_spec() {
                let children = self.collect(&nested.schema(), Some(&full_name))?;
                parameter = parameter.with_children(children);
            }

            parameters.push(parameter);
        }

        if forwards {
            for base in schema.bases() {
                #[cfg(feature = "tracing_debug")]
                {
                    debug!("Schema {} forwards to {}.", schema.name(), base.name());
                }

                parameters.extend(self.collect(&base.schema(), parent)?);
            }
        }

        Ok(parameters)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) struct Inner;
    pub(crate) struct Outer;
    struct Base;
    struct Child;
    struct Clash;

    impl Typed for Inner {
        fn type_spec() -> TypeSpec {
            TypeSpec::Struct(StructType::of::<Inner>())
        }
    }

    impl Reflect for Inner {
        fn schema() -> Schema {
            Schema::new("Inner")
                .field(Field::receiver("self"))
                .field(Field::new("x", TypeSpec::Int).help("the x"))
                .field(Field::new("names", TypeSpec::List(crate::model::ArgumentType::Str)).default_value(vec!["a"]))
        }
    }

    impl Typed for Outer {
        fn type_spec() -> TypeSpec {
            TypeSpec::Struct(StructType::of::<Outer>())
        }
    }

    impl Reflect for Outer {
        fn schema() -> Schema {
            Schema::new("Outer")
                .field(Field::new("inner", Inner::type_spec()))
                .field(Field::new("y", TypeSpec::Float).default_value(0.5))
        }
    }

    impl Typed for Base {
        fn type_spec() -> TypeSpec {
            TypeSpec::Struct(StructType::of::<Base>())
        }
    }

    impl Reflect for Base {
        fn schema() -> Schema {
            Schema::new("Base").field(Field::new("z", TypeSpec::Str))
        }
    }

    impl Typed for Child {
        fn type_spec() -> TypeSpec {
            TypeSpec::Struct(StructType::of::<Child>())
        }
    }

    impl Reflect for Child {
        fn schema() -> Schema {
            Schema::new("Child")
                .field(Field::new("w", TypeSpec::Bool))
                .forward_to(StructType::of::<Base>())
        }
    }

    impl Typed for Clash {
        fn type_spec() -> TypeSpec {
            TypeSpec::Struct(StructType::of::<Clash>())
        }
    }

    impl Reflect for Clash {
        fn schema() -> Schema {
            Schema::new("Clash")
                .field(Field::new("z", TypeSpec::Int))
                .forward_to(StructType::of::<Base>())
        }
    }

    fn full_names(parameter: &Parameter) -> Vec<String> {
        parameter
            .enumerate_parameters()
            .filter_map(|p| p.full_name())
            .collect()
    }

    #[test]
    fn nested() {
        // Execute
        let result = Parameter::of::<Outer>();

        // Verify
        assert_matches!(result, Ok(tree) => {
            assert_eq!(tree.name(), None);
            assert_eq!(tree.type_spec(), Some(&TypeSpec::Mapping));
            assert_eq!(full_names(&tree), vec!["inner", "inner.x", "inner.names", "y"]);

            let inner = tree.find("inner");
            assert_matches!(inner.and_then(|p| p.find("x")), Some(x) => {
                assert_eq!(x.help(), "the x");
                assert_eq!(x.default(), None);
            });
            assert_matches!(inner.and_then(|p| p.find("names")), Some(names) => {
                assert_eq!(names.default(), Some(json!(["a"])));
            });
            assert_eq!(tree.find("y").and_then(Parameter::default), Some(json!(0.5)));
        });
    }

    #[test]
    fn forward() {
        // Execute
        let result = Parameter::of::<Child>();

        // Verify
        assert_matches!(result, Ok(tree) => {
            assert_eq!(full_names(&tree), vec!["w", "z"]);
        });
    }

    #[test]
    fn forward_duplicate() {
        // Execute
        let result = Parameter::of::<Clash>();

        // Verify
        assert_matches!(result, Err(Error::DuplicateParameter(name)) => {
            assert_eq!(name, "z");
        });
    }

    #[test]
    fn bases_without_forward() {
        // Setup
        let schema = Schema::new("Lonely")
            .field(Field::new("w", TypeSpec::Bool))
            .base(StructType::of::<Base>());

        // Execute
        let result = Parameter::from_schema(&schema);

        // Verify
        assert_matches!(result, Ok(tree) => {
            assert_eq!(full_names(&tree), vec!["w"]);
        });
    }
}
