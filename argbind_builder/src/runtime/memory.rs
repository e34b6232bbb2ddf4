use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::Error;
use crate::model::ArgumentValues;
use crate::runtime::tokens::tokenize;
use crate::runtime::{Argument, ArgumentAction, ArgumentTable, ParsedArguments, Runtime};
use crate::tree::Parameter;

/// A minimal in-process runtime: long flags only, no help, no positionals.
///
/// Useful for embedding (and testing) bindings without a full Cli front end.
#[derive(Debug, Clone, Default)]
pub struct MemoryRuntime {
    table: ArgumentTable,
    parameters: Option<Parameter>,
}

impl MemoryRuntime {
    /// An empty runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registered arguments, in registration order.
    pub fn arguments(&self) -> impl Iterator<Item = &Argument> {
        self.table.iter()
    }
}

impl Runtime for MemoryRuntime {
    fn add_argument(&mut self, argument: Argument) -> Result<(), Error> {
        self.table.upsert(argument);
        Ok(())
    }

    fn find_argument(&self, name: &str) -> Option<&Argument> {
        self.table.find(name)
    }

    fn parameters(&self) -> Option<&Parameter> {
        self.parameters.as_ref()
    }

    fn set_parameters(&mut self, parameters: Parameter) {
        self.parameters = Some(parameters);
    }

    fn parse_from(&self, tokens: &[&str]) -> Result<ParsedArguments, Error> {
        let mut values = ArgumentValues::default();

        for token in tokenize(tokens) {
            let argument = self
                .table
                .by_flag(&token.flag)
                .ok_or_else(|| Error::UnrecognizedArgument(format!("--{}", token.flag)))?;

            let value = match (argument.action(), token.value) {
                (ArgumentAction::Store, Some(raw)) => argument.convert(&raw)?,
                (ArgumentAction::SetTrue, None) => Value::Bool(true),
                (ArgumentAction::SetFalse, None) => Value::Bool(false),
                (ArgumentAction::Store, None) => {
                    return Err(Error::InvalidValue {
                        name: argument.name().to_string(),
                        token: String::default(),
                        type_name: argument.argument_type().to_string(),
                    });
                }
                (_, Some(raw)) => {
                    return Err(Error::InvalidValue {
                        name: argument.name().to_string(),
                        token: raw,
                        type_name: "flag".to_string(),
                    });
                }
            };

            values.insert(argument.name().to_string(), value);
        }

        let mut defaulted = BTreeSet::default();

        for argument in self.table.iter() {
            if values.contains_key(argument.name()) {
                continue;
            }

            if argument.required() {
                return Err(Error::MissingArgument(format!("--{}", argument.flag())));
            }

            values.insert(
                argument.name().to_string(),
                argument.default().cloned().unwrap_or(Value::Null),
            );
            defaulted.insert(argument.name().to_string());
        }

        Ok(ParsedArguments::new(values, self.parameters.clone()).with_defaulted(defaulted))
    }
}
