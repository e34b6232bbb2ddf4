use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::Error;
use crate::model::{ArgumentType, ArgumentValues};
use crate::tree::{flag_name, Parameter};

mod clap_runtime;
mod memory;
pub(crate) mod tokens;

pub use self::clap_runtime::ClapRuntime;
pub use self::memory::MemoryRuntime;

/// How an argument stores its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentAction {
    /// Store the (converted) value following the flag.
    Store,
    /// Store `true` when the flag is present.
    SetTrue,
    /// Store `false` when the flag is present.
    SetFalse,
}

/// A Cli argument as registered with a runtime.
///
/// The `name` is the key of the parsed value in the argument bag; the two flags of a boolean pair share it.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    name: String,
    flag: String,
    action: ArgumentAction,
    argument_type: ArgumentType,
    required: bool,
    help: String,
    default: Option<Value>,
    choices: Option<Vec<Value>>,
}

impl Argument {
    /// An optional storing argument, flagged by the name.
    pub fn new(name: impl Into<String>, argument_type: ArgumentType) -> Self {
        let name = name.into();

        Self {
            flag: flag_name(&name),
            name,
            action: ArgumentAction::Store,
            argument_type,
            required: false,
            help: String::default(),
            default: None,
            choices: None,
        }
    }

    /// Change the flag (without the leading `--`).
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = flag.into();
        self
    }

    /// Change the action.
    pub fn with_action(mut self, action: ArgumentAction) -> Self {
        self.action = action;
        self
    }

    /// Change whether the argument must be provided.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Document the argument.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Change the value used when the argument is not provided.
    pub fn with_default(mut self, default: Option<Value>) -> Self {
        self.default = default;
        self
    }

    /// Change the allowed values.
    pub fn with_choices(mut self, choices: Option<Vec<Value>>) -> Self {
        self.choices = choices;
        self
    }

    /// The key of the parsed value.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The flag (without the leading `--`).
    pub fn flag(&self) -> &str {
        &self.flag
    }

    /// The action.
    pub fn action(&self) -> ArgumentAction {
        self.action
    }

    /// The type values are converted to.
    pub fn argument_type(&self) -> ArgumentType {
        self.argument_type
    }

    /// Whether the argument must be provided.
    pub fn required(&self) -> bool {
        self.required
    }

    /// The documentation.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// The value used when the argument is not provided.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The allowed values.
    pub fn choices(&self) -> Option<&[Value]> {
        self.choices.as_deref()
    }

    /// Convert a raw token, enforcing the choices.
    pub(crate) fn convert(&self, token: &str) -> Result<Value, Error> {
        let value = self
            .argument_type
            .cast(token)
            .ok_or_else(|| Error::InvalidValue {
                name: self.name.clone(),
                token: token.to_string(),
                type_name: self.argument_type.to_string(),
            })?;

        match &self.choices {
            Some(choices) if !choices.is_empty() && !choices.contains(&value) => {
                Err(Error::InvalidChoice {
                    name: self.name.clone(),
                    token: token.to_string(),
                    choices: choices.iter().map(render_value).collect::<Vec<_>>().join(", "),
                })
            }
            _ => Ok(value),
        }
    }
}

/// The result of parsing Cli input.
#[derive(Debug, Clone, Default)]
pub struct ParsedArguments {
    values: ArgumentValues,
    defaulted: BTreeSet<String>,
    parameters: Option<Parameter>,
}

impl ParsedArguments {
    /// Pair an argument bag with the parameter tree registered to produce it.
    pub fn new(values: ArgumentValues, parameters: Option<Parameter>) -> Self {
        Self {
            values,
            defaulted: BTreeSet::default(),
            parameters,
        }
    }

    /// Mark the arguments whose value is the registered default (they were not provided).
    pub fn with_defaulted(mut self, defaulted: BTreeSet<String>) -> Self {
        self.defaulted = defaulted;
        self
    }

    /// Whether the argument was left at its registered default.
    pub fn is_default(&self, name: &str) -> bool {
        self.defaulted.contains(name)
    }

    /// The argument bag, keyed by argument name.
    pub fn values(&self) -> &ArgumentValues {
        &self.values
    }

    /// The value of one argument.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The registered parameter tree.
    pub fn parameters(&self) -> Option<&Parameter> {
        self.parameters.as_ref()
    }
}

/// The Cli parsing backend parameters are registered with.
pub trait Runtime {
    /// Register an argument.
    /// An argument with the same name and flag is replaced in place.
    fn add_argument(&mut self, argument: Argument) -> Result<(), Error>;

    /// The storing argument registered under `name`, if any.
    /// For a boolean pair this is the `true` flag.
    fn find_argument(&self, name: &str) -> Option<&Argument>;

    /// The parameter tree stored alongside the arguments.
    fn parameters(&self) -> Option<&Parameter>;

    /// Replace the stored parameter tree.
    fn set_parameters(&mut self, parameters: Parameter);

    /// Parse the Cli tokens (excluding the program name).
    fn parse_from(&self, tokens: &[&str]) -> Result<ParsedArguments, Error>;
}

/// The registered arguments, in registration order.
#[derive(Debug, Clone, Default)]
pub(crate) struct ArgumentTable {
    arguments: Vec<Argument>,
}

impl ArgumentTable {
    pub(crate) fn upsert(&mut self, argument: Argument) {
        let position = self
            .arguments
            .iter()
            .position(|a| a.name == argument.name && a.flag == argument.flag);

        match position {
            Some(position) => self.arguments[position] = argument,
            None => self.arguments.push(argument),
        }
    }

    pub(crate) fn find(&self, name: &str) -> Option<&Argument> {
        self.arguments
            .iter()
            .find(|a| a.name == name && a.action != ArgumentAction::SetFalse)
    }

    pub(crate) fn by_flag(&self, flag: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.flag == flag)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.arguments.iter()
    }
}

/// The textual form of a value as a Cli user would type it.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(values) => values
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(&crate::constant::LIST_DELIMITER.to_string()),
        Value::Null => String::default(),
        other => other.to_string(),
    }
}
