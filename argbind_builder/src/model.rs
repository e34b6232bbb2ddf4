use serde::Serialize;
use serde_json::Value;
use std::any::{type_name, TypeId};
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::reflect::{Reflect, Schema};

#[cfg(feature = "tracing_debug")]
use tracing::debug;

mod conditional;
pub use self::conditional::{ConditionalType, VariantType};

/// The raw argument bag produced by a runtime, keyed by argument name.
pub type ArgumentValues = BTreeMap<String, Value>;

/// The primitive type a runtime converts Cli input into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentType {
    /// `true` or `false`.
    Bool,
    /// A signed 64 bit integer.
    Int,
    /// A 64 bit float.
    Float,
    /// Any text.
    Str,
}

impl ArgumentType {
    /// Convert a raw token into a value of this type.
    /// Returns `None` when the token does not represent this type.
    pub fn cast(&self, token: &str) -> Option<Value> {
        match self {
            ArgumentType::Bool => token.parse::<bool>().ok().map(Value::Bool),
            ArgumentType::Int => token.parse::<i64>().ok().map(Value::from),
            ArgumentType::Float => token
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            ArgumentType::Str => Some(Value::String(token.to_string())),
        }
    }

    /// The type of a scalar value, if it is one.
    pub fn of(value: &Value) -> Option<ArgumentType> {
        match value {
            Value::Bool(_) => Some(ArgumentType::Bool),
            Value::Number(number) if number.is_f64() => Some(ArgumentType::Float),
            Value::Number(_) => Some(ArgumentType::Int),
            Value::String(_) => Some(ArgumentType::Str),
            _ => None,
        }
    }

    // Wider types come later.
    fn rank(&self) -> u8 {
        match self {
            ArgumentType::Bool => 0,
            ArgumentType::Int => 1,
            ArgumentType::Float => 2,
            ArgumentType::Str => 3,
        }
    }
}

impl Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgumentType::Bool => "bool",
            ArgumentType::Int => "int",
            ArgumentType::Float => "float",
            ArgumentType::Str => "str",
        };
        write!(f, "{name}")
    }
}

/// The declared type of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    /// A boolean.
    Bool,
    /// An integer.
    Int,
    /// A float.
    Float,
    /// Text.
    Str,
    /// A comma delimited list of primitives.
    List(ArgumentType),
    /// One of a fixed set of scalar values.
    Literal(Vec<Value>),
    /// Any of the member types.
    Union(Vec<TypeSpec>),
    /// The inner type, or nothing.
    Optional(Box<TypeSpec>),
    /// A type constructed from its textual form.
    Parsed(ParsedType),
    /// A reflected record; its fields become the children of the parameter.
    Struct(StructType),
    /// A tagged union selected by a discriminant argument.
    Conditional(ConditionalType),
    /// The selected member of a tagged union.
    Variant(VariantType),
    /// A plain key/value mapping.
    Mapping,
    /// Receives the complete raw argument bag.
    AllArguments,
    /// A type no handler is expected to understand.
    Opaque(&'static str),
}

impl TypeSpec {
    /// The primitive argument type, if this is a primitive.
    pub fn primitive(&self) -> Option<ArgumentType> {
        match self {
            TypeSpec::Bool => Some(ArgumentType::Bool),
            TypeSpec::Int => Some(ArgumentType::Int),
            TypeSpec::Float => Some(ArgumentType::Float),
            TypeSpec::Str => Some(ArgumentType::Str),
            _ => None,
        }
    }

    /// Resolve the argument type a runtime needs for this type.
    ///
    /// Literals use the type of their first member, unions the widest primitive member, and optionals their inner type.
    pub fn resolve_argument_type(&self) -> Option<ArgumentType> {
        match self {
            TypeSpec::Literal(values) => values.first().and_then(ArgumentType::of),
            TypeSpec::Union(members) => members
                .iter()
                .filter_map(TypeSpec::resolve_argument_type)
                .max_by_key(ArgumentType::rank),
            TypeSpec::Optional(inner) => inner.resolve_argument_type(),
            _ => self.primitive(),
        }
    }

    /// Whether a value of this type may be stored by an argument already registered as `existing`.
    pub fn is_compatible(&self, existing: ArgumentType) -> bool {
        match self {
            TypeSpec::Literal(values) => values.first().and_then(ArgumentType::of) == Some(existing),
            TypeSpec::Union(members) => members.iter().any(|member| member.is_compatible(existing)),
            TypeSpec::Optional(inner) => inner.is_compatible(existing),
            TypeSpec::List(_) | TypeSpec::Parsed(_) | TypeSpec::Conditional(_) => {
                existing == ArgumentType::Str
            }
            _ => self.primitive() == Some(existing),
        }
    }

    /// Whether `other` is the expansion of this tagged union.
    pub fn is_refined_by(&self, other: &TypeSpec) -> bool {
        match (self, other) {
            (TypeSpec::Conditional(union), TypeSpec::Variant(variant)) => variant.union() == union,
            _ => false,
        }
    }
}

impl Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::List(inner) => write!(f, "list[{inner}]"),
            TypeSpec::Literal(values) => {
                let values: Vec<String> = values.iter().map(Value::to_string).collect();
                write!(f, "literal[{}]", values.join(", "))
            }
            TypeSpec::Union(members) => {
                let members: Vec<String> = members.iter().map(TypeSpec::to_string).collect();
                write!(f, "union[{}]", members.join(", "))
            }
            TypeSpec::Optional(inner) => write!(f, "optional[{inner}]"),
            TypeSpec::Parsed(parsed) => write!(f, "{}", parsed.name()),
            TypeSpec::Struct(structure) => write!(f, "{}", structure.name()),
            TypeSpec::Conditional(union) => write!(f, "conditional[{}]", union.name()),
            TypeSpec::Variant(variant) => {
                write!(f, "{}[{}]", variant.union().name(), variant.label())
            }
            TypeSpec::Mapping => write!(f, "mapping"),
            TypeSpec::AllArguments => write!(f, "all-arguments"),
            TypeSpec::Opaque(name) => write!(f, "{name}"),
            primitive => match primitive.primitive() {
                Some(argument_type) => write!(f, "{argument_type}"),
                None => write!(f, "?"),
            },
        }
    }
}

/// A zero-argument producer of a parameter's default.
///
/// The factory is invoked each time the default is needed, so every binding receives a fresh value.
/// Two factories are equal when they produce equal values.
#[derive(Clone)]
pub struct DefaultFactory(Arc<dyn Fn() -> Value + Send + Sync>);

impl DefaultFactory {
    /// Wrap a raw value producer.
    pub fn new(factory: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(factory))
    }

    /// A factory producing a fixed value.
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::new(move || value.clone())
    }

    /// A factory producing a Rust value, serialized on each call.
    ///
    /// A value that cannot be represented (ex: a map with non-string keys) produces null.
    pub fn of<T: Serialize>(factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self::new(move || match serde_json::to_value(factory()) {
            Ok(value) => value,
            Err(_error) => {
                #[cfg(feature = "tracing_debug")]
                {
                    debug!("Default of {} is not representable, using null: {_error}.", type_name::<T>());
                }

                Value::Null
            }
        })
    }

    /// Invoke the factory.
    pub fn produce(&self) -> Value {
        (self.0)()
    }
}

impl PartialEq for DefaultFactory {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.produce() == other.produce()
    }
}

impl Debug for DefaultFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DefaultFactory({})", self.produce())
    }
}

/// A reflected record type.
/// Equality is by Rust type identity.
#[derive(Clone, Copy)]
pub struct StructType {
    type_id: TypeId,
    name: &'static str,
    schema: fn() -> Schema,
}

impl StructType {
    /// The struct type of `T`.
    pub fn of<T: Reflect + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
            schema: T::schema,
        }
    }

    /// The Rust name of the type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Reflect the type's schema.
    pub fn schema(&self) -> Schema {
        (self.schema)()
    }
}

impl PartialEq for StructType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Debug for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StructType({})", self.name)
    }
}

/// A type constructible from text through [`FromStr`].
#[derive(Clone, Copy)]
pub struct ParsedType {
    type_id: TypeId,
    name: &'static str,
    parse: fn(&str) -> Result<Value, String>,
}

impl ParsedType {
    /// The parsed type of `T`.
    pub fn of<T>() -> Self
    where
        T: FromStr + Serialize + 'static,
        T::Err: Display,
    {
        Self {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
            parse: parse_into::<T>,
        }
    }

    /// The Rust name of the type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Parse the token, then serialize the result.
    pub fn parse(&self, token: &str) -> Result<Value, String> {
        (self.parse)(token)
    }
}

fn parse_into<T>(token: &str) -> Result<Value, String>
where
    T: FromStr + Serialize,
    T::Err: Display,
{
    let value = T::from_str(token).map_err(|error| error.to_string())?;
    serde_json::to_value(value).map_err(|error| error.to_string())
}

impl PartialEq for ParsedType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Debug for ParsedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParsedType({})", self.name)
    }
}

/// A Rust type with a declared [`TypeSpec`].
///
/// Implemented here for the primitives, `String`, `PathBuf`, `Vec<T>` and `Option<T>`.
/// `#[derive(Reflect)]` implements it for user types.
pub trait Typed {
    /// The declared type.
    fn type_spec() -> TypeSpec;
}

macro_rules! typed {
    ($spec:expr => $($t:ty),+) => {
        $(
            impl Typed for $t {
                fn type_spec() -> TypeSpec {
                    $spec
                }
            }
        )+
    };
}

typed!(TypeSpec::Bool => bool);
typed!(TypeSpec::Int => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
typed!(TypeSpec::Float => f32, f64);
typed!(TypeSpec::Str => String, PathBuf);

impl<T: Typed> Typed for Vec<T> {
    fn type_spec() -> TypeSpec {
        match T::type_spec().primitive() {
            Some(inner) => TypeSpec::List(inner),
            None => TypeSpec::Opaque(type_name::<Vec<T>>()),
        }
    }
}

impl<T: Typed> Typed for Option<T> {
    fn type_spec() -> TypeSpec {
        TypeSpec::Optional(Box::new(T::type_spec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[rstest]
    #[case(ArgumentType::Bool, "true", Some(json!(true)))]
    #[case(ArgumentType::Bool, "1", None)]
    #[case(ArgumentType::Int, "-3", Some(json!(-3)))]
    #[case(ArgumentType::Int, "3.0", None)]
    #[case(ArgumentType::Float, "0.5", Some(json!(0.5)))]
    #[case(ArgumentType::Float, "abc", None)]
    #[case(ArgumentType::Str, "abc", Some(json!("abc")))]
    fn cast(#[case] argument_type: ArgumentType, #[case] token: &str, #[case] expected: Option<Value>) {
        assert_eq!(argument_type.cast(token), expected);
    }

    #[rstest]
    #[case(json!(true), Some(ArgumentType::Bool))]
    #[case(json!(1), Some(ArgumentType::Int))]
    #[case(json!(1.5), Some(ArgumentType::Float))]
    #[case(json!("a"), Some(ArgumentType::Str))]
    #[case(json!([1]), None)]
    #[case(Value::Null, None)]
    fn argument_type_of(#[case] value: Value, #[case] expected: Option<ArgumentType>) {
        assert_eq!(ArgumentType::of(&value), expected);
    }

    #[rstest]
    #[case(TypeSpec::Int, Some(ArgumentType::Int))]
    #[case(TypeSpec::Literal(vec![json!("a"), json!("b")]), Some(ArgumentType::Str))]
    #[case(TypeSpec::Literal(vec![]), None)]
    #[case(TypeSpec::Union(vec![TypeSpec::Int, TypeSpec::Float]), Some(ArgumentType::Float))]
    #[case(TypeSpec::Union(vec![TypeSpec::Str, TypeSpec::Int]), Some(ArgumentType::Str))]
    #[case(TypeSpec::Optional(Box::new(TypeSpec::Int)), Some(ArgumentType::Int))]
    #[case(TypeSpec::List(ArgumentType::Int), None)]
    #[case(TypeSpec::Mapping, None)]
    fn resolve_argument_type(#[case] type_spec: TypeSpec, #[case] expected: Option<ArgumentType>) {
        assert_eq!(type_spec.resolve_argument_type(), expected);
    }

    #[rstest]
    #[case(TypeSpec::Int, ArgumentType::Int, true)]
    #[case(TypeSpec::Int, ArgumentType::Str, false)]
    #[case(TypeSpec::Literal(vec![json!(1), json!(2)]), ArgumentType::Int, true)]
    #[case(TypeSpec::Literal(vec![json!(1), json!(2)]), ArgumentType::Str, false)]
    #[case(TypeSpec::Union(vec![TypeSpec::Int, TypeSpec::Str]), ArgumentType::Str, true)]
    #[case(TypeSpec::Optional(Box::new(TypeSpec::Float)), ArgumentType::Float, true)]
    #[case(TypeSpec::List(ArgumentType::Int), ArgumentType::Str, true)]
    #[case(TypeSpec::List(ArgumentType::Int), ArgumentType::Int, false)]
    #[case(TypeSpec::Mapping, ArgumentType::Str, false)]
    fn is_compatible(#[case] type_spec: TypeSpec, #[case] existing: ArgumentType, #[case] expected: bool) {
        assert_eq!(type_spec.is_compatible(existing), expected);
    }

    #[test]
    fn typed_primitives() {
        assert_eq!(u8::type_spec(), TypeSpec::Int);
        assert_eq!(f32::type_spec(), TypeSpec::Float);
        assert_eq!(PathBuf::type_spec(), TypeSpec::Str);
        assert_eq!(Vec::<i32>::type_spec(), TypeSpec::List(ArgumentType::Int));
        assert_eq!(
            Option::<String>::type_spec(),
            TypeSpec::Optional(Box::new(TypeSpec::Str))
        );
        assert_matches!(Vec::<Vec<i32>>::type_spec(), TypeSpec::Opaque(_));
    }

    #[test]
    fn default_factory_produces_fresh() {
        // Setup
        let counter = Arc::new(AtomicUsize::new(0));
        let shared = counter.clone();
        let factory = DefaultFactory::new(move || json!(shared.fetch_add(1, Ordering::SeqCst)));

        // Execute
        let first = factory.produce();
        let second = factory.produce();

        // Verify
        assert_eq!(first, json!(0));
        assert_eq!(second, json!(1));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn default_factory_equality() {
        assert_eq!(DefaultFactory::constant(1), DefaultFactory::of(|| 1u8));
        assert_ne!(DefaultFactory::constant(1), DefaultFactory::constant("1"));
        assert_eq!(
            DefaultFactory::of(|| vec![1, 2]),
            DefaultFactory::constant(json!([1, 2]))
        );
    }

    #[test]
    fn default_factory_unrepresentable() {
        let factory = DefaultFactory::of(|| BTreeMap::from([((1, 2), 3)]));
        assert_eq!(factory.produce(), Value::Null);
    }

    #[test]
    fn parsed_type() {
        // Setup
        let parsed = ParsedType::of::<Ipv4Addr>();

        // Execute
        let ok = parsed.parse("127.0.0.1");
        let err = parsed.parse("abc");

        // Verify
        assert_eq!(ok, Ok(json!("127.0.0.1")));
        assert_matches!(err, Err(_));
        assert_eq!(parsed, ParsedType::of::<Ipv4Addr>());
    }
}
