use serde_json::{Map, Value};
use std::convert::Infallible;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::error::Error;
use crate::model::{ArgumentValues, TypeSpec};
use crate::runtime::{ParsedArguments, Runtime};
use crate::tree::{Parameter, ParameterWithPath};

mod all_arguments;
mod conditional;
mod default;
mod from_str;
mod list;

pub use self::all_arguments::AllArgumentsHandler;
pub use self::conditional::ConditionalHandler;
pub use self::default::DefaultHandler;
pub use self::from_str::FromStrHandler;
pub use self::list::ListHandler;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// The outcome of a handled preprocess.
#[derive(Debug, Clone, PartialEq)]
pub enum Preprocessed {
    /// Keep the (possibly rewritten) parameter.
    Keep(Parameter),
    /// Remove the parameter from the tree.
    Drop,
}

/// A pluggable strategy for a family of parameter types.
///
/// Every hook defaults to "not handled", in which case the registry asks the next handler.
pub trait Handler: Send + Sync {
    /// Normalize a parameter before registration: resolve its argument type and choices, or drop it.
    /// The parameter's children have already been preprocessed.
    fn preprocess(&self, _parameter: &ParameterWithPath<'_>) -> Option<Preprocessed> {
        None
    }

    /// Register the parameter with the runtime; `Ok(true)` when handled.
    fn add_parameter(
        &self,
        _parameter: &ParameterWithPath<'_>,
        _runtime: &mut dyn Runtime,
    ) -> Result<bool, Error> {
        Ok(false)
    }

    /// Produce the final value of a parameter from the argument bag and its bound children.
    fn bind(
        &self,
        _parameter: &ParameterWithPath<'_>,
        _values: &ArgumentValues,
        _children: &[(String, Value)],
    ) -> Result<Option<Value>, Error> {
        Ok(None)
    }

    /// Convert the raw value of a leaf.
    fn parse_value(
        &self,
        _parameter: &ParameterWithPath<'_>,
        _value: &Value,
    ) -> Result<Option<Value>, Error> {
        Ok(None)
    }

    /// Inspect the parsed-so-far arguments and contribute additional parameters.
    fn before_parse(
        &self,
        _parameters: &Parameter,
        _runtime: &dyn Runtime,
        _values: &ArgumentValues,
    ) -> Result<Option<Parameter>, Error> {
        Ok(None)
    }

    /// Post-process the bound result.
    fn after_parse(
        &self,
        _parameters: &Parameter,
        _values: &ArgumentValues,
        bound: Value,
    ) -> Result<Value, Error> {
        Ok(bound)
    }
}

/// An ordered chain of handlers.
///
/// The most recently registered handler is asked first, so registering a handler overrides the ones before it.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn Handler>>,
}

impl Default for HandlerRegistry {
    /// The built-in handlers.
    fn default() -> Self {
        HandlerRegistry::empty()
            .register(DefaultHandler)
            .register(AllArgumentsHandler)
            .register(ListHandler)
            .register(FromStrHandler)
            .register(ConditionalHandler)
    }
}

impl Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl HandlerRegistry {
    /// A registry without any handlers.
    pub fn empty() -> Self {
        Self {
            handlers: Vec::default(),
        }
    }

    /// Put a handler at the front of the chain.
    pub fn register<H: Handler + 'static>(mut self, handler: H) -> Self {
        #[cfg(feature = "tracing_debug")]
        {
            debug!("Registering handler {}.", std::any::type_name::<H>());
        }

        self.handlers.insert(0, Arc::new(handler));
        self
    }

    /// The handlers, in the order they are asked.
    pub fn handlers(&self) -> impl Iterator<Item = &dyn Handler> {
        self.handlers.iter().map(|handler| handler.as_ref())
    }

    /// Normalize a tree bottom-up.
    ///
    /// The root is never offered to the handlers.
    /// Leaves no handler accepts are dropped, aggregates no handler accepts are kept.
    pub fn preprocess(&self, parameters: &Parameter) -> Option<Parameter> {
        let result: Result<Option<Parameter>, Infallible> = parameters.walk(|node, children| {
            let rebuilt = node.rebuild(children);

            if rebuilt.name().is_none() {
                return Ok(Some(rebuilt));
            }

            let view = ParameterWithPath::new(&rebuilt, node.parent().cloned());

            for handler in self.handlers() {
                match handler.preprocess(&view) {
                    Some(Preprocessed::Keep(parameter)) => return Ok(Some(parameter)),
                    Some(Preprocessed::Drop) => return Ok(None),
                    None => {}
                }
            }

            if rebuilt.is_leaf() {
                #[cfg(feature = "tracing_debug")]
                {
                    debug!("Dropping unsupported parameter '{:?}'.", view.full_name());
                }

                Ok(None)
            } else {
                Ok(Some(rebuilt))
            }
        });

        result.unwrap_or_else(|never| match never {})
    }

    /// Register one parameter with the runtime.
    pub fn add_parameter(
        &self,
        parameter: &ParameterWithPath<'_>,
        runtime: &mut dyn Runtime,
    ) -> Result<(), Error> {
        for handler in self.handlers() {
            if handler.add_parameter(parameter, runtime)? {
                return Ok(());
            }
        }

        Err(Error::NoHandler {
            operation: "register",
            name: parameter.full_name().unwrap_or_default(),
        })
    }

    /// Convert the raw value of a leaf; values no handler converts pass through unchanged.
    pub fn parse_value(&self, parameter: &ParameterWithPath<'_>, value: Value) -> Result<Value, Error> {
        for handler in self.handlers() {
            if let Some(parsed) = handler.parse_value(parameter, &value)? {
                return Ok(parsed);
            }
        }

        Ok(value)
    }

    /// Bind a tree bottom-up against the parsed arguments.
    pub fn bind(&self, parameters: &Parameter, parsed: &ParsedArguments) -> Result<Value, Error> {
        let bound = parameters.fold(|node, children: Vec<(Option<String>, Value)>| {
            let children: Vec<(String, Value)> = children
                .into_iter()
                .filter_map(|(name, value)| name.map(|name| (name, value)))
                .collect();
            let value = self.bind_parameter(node, parsed, children)?;
            Ok::<_, Error>(Some((node.name().map(str::to_string), value)))
        })?;

        Ok(bound.map(|(_, value)| value).unwrap_or(Value::Null))
    }

    fn bind_parameter(
        &self,
        parameter: &ParameterWithPath<'_>,
        parsed: &ParsedArguments,
        children: Vec<(String, Value)>,
    ) -> Result<Value, Error> {
        for handler in self.handlers() {
            if let Some(value) = handler.bind(parameter, parsed.values(), &children)? {
                return Ok(value);
            }
        }

        let aggregate = parameter.name().is_none()
            || !parameter.is_leaf()
            || matches!(parameter.type_spec(), Some(TypeSpec::Struct(_)));

        if aggregate {
            return match parameter.type_spec() {
                _ if parameter.name().is_none() => Ok(object(children)),
                Some(TypeSpec::Struct(_)) | Some(TypeSpec::Mapping) => Ok(object(children)),
                other => Err(Error::AggregateTypeUnsupported {
                    name: parameter.full_name().unwrap_or_default(),
                    type_name: other.map_or_else(|| "none".to_string(), TypeSpec::to_string),
                }),
            };
        }

        let argument_name = parameter.argument_name().unwrap_or_default();

        match parsed.get(&argument_name) {
            // Left at the registered default: produce a fresh one (exactly one factory call).
            Some(value) if parsed.is_default(&argument_name) => {
                Ok(parameter.default().unwrap_or_else(|| value.clone()))
            }
            Some(value) => self.parse_value(parameter, value.clone()),
            None => parameter.default().ok_or_else(|| {
                Error::MissingArgument(parameter.flag_name().unwrap_or(argument_name))
            }),
        }
    }

    /// Ask every handler, oldest first, for additional parameters.
    pub fn before_parse(
        &self,
        parameters: &Parameter,
        runtime: &dyn Runtime,
        values: &ArgumentValues,
    ) -> Result<Vec<Parameter>, Error> {
        let mut contributed = Vec::default();

        for handler in self.handlers.iter().rev() {
            if let Some(parameter) = handler.before_parse(parameters, runtime, values)? {
                contributed.push(parameter);
            }
        }

        Ok(contributed)
    }

    /// Pass the bound result through every handler's completion hook.
    pub fn after_parse(
        &self,
        parameters: &Parameter,
        values: &ArgumentValues,
        bound: Value,
    ) -> Result<Value, Error> {
        self.handlers()
            .try_fold(bound, |bound, handler| handler.after_parse(parameters, values, bound))
    }
}

fn object(children: Vec<(String, Value)>) -> Value {
    Value::Object(children.into_iter().collect::<Map<String, Value>>())
}
