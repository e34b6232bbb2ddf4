use clap::builder::PossibleValuesParser;
use clap::parser::ValueSource;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_json::{Number, Value};
use std::collections::BTreeSet;

use crate::error::Error;
use crate::model::{ArgumentType, ArgumentValues};
use crate::runtime::{render_value, Argument, ArgumentAction, ArgumentTable, ParsedArguments, Runtime};
use crate::tree::Parameter;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// A runtime backed by a [`clap::Command`].
///
/// Registered arguments are applied to (a copy of) the base command each time it is built, so the command always
/// reflects the latest registration.
#[derive(Debug, Clone)]
pub struct ClapRuntime {
    base: Command,
    table: ArgumentTable,
    parameters: Option<Parameter>,
}

impl ClapRuntime {
    /// A runtime for the program.
    pub fn new(program: impl Into<String>) -> Self {
        Self::from_command(Command::new(program.into()))
    }

    /// A runtime extending an existing command (ex: one with its own `about`, `version`, etc).
    pub fn from_command(command: Command) -> Self {
        Self {
            base: command,
            table: ArgumentTable::default(),
            parameters: None,
        }
    }

    /// Document the program.
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.base = self.base.about(about.into());
        self
    }

    /// The command with every registered argument.
    pub fn command(&self) -> Command {
        self.table
            .iter()
            .fold(self.base.clone(), |command, argument| {
                command.arg(self.build_arg(argument))
            })
    }

    fn build_arg(&self, argument: &Argument) -> Arg {
        let flag = argument.flag().to_string();
        let arg = Arg::new(flag.clone())
            .long(flag)
            .help(argument.help().to_string());

        match argument.action() {
            ArgumentAction::SetTrue => arg.action(ArgAction::SetTrue),
            ArgumentAction::SetFalse => {
                let arg = arg.action(ArgAction::SetTrue);

                match self.table.find(argument.name()) {
                    Some(affirmative) => arg.conflicts_with(affirmative.flag().to_string()),
                    None => arg,
                }
            }
            ArgumentAction::Store => {
                let arg = arg.action(ArgAction::Set).required(argument.required());
                let arg = match argument.choices().filter(|choices| !choices.is_empty()) {
                    Some(choices) => {
                        arg.value_parser(PossibleValuesParser::new(choices.iter().map(render_value)))
                    }
                    None => match argument.argument_type() {
                        ArgumentType::Bool => arg.value_parser(value_parser!(bool)),
                        ArgumentType::Int => arg.value_parser(value_parser!(i64)),
                        ArgumentType::Float => arg.value_parser(value_parser!(f64)),
                        ArgumentType::Str => arg.value_parser(value_parser!(String)),
                    },
                };

                match argument.default().filter(|default| !default.is_null()) {
                    Some(default) => arg.default_value(render_value(default)),
                    None => arg,
                }
            }
        }
    }

    fn extract(&self, matches: &ArgMatches) -> Result<(ArgumentValues, BTreeSet<String>), Error> {
        let mut values = ArgumentValues::default();
        let mut defaulted = BTreeSet::default();

        for argument in self.table.iter() {
            let name = argument.name().to_string();
            let provided = matches.value_source(argument.flag()) == Some(ValueSource::CommandLine);
            let default = argument.default().cloned().unwrap_or(Value::Null);

            if provided {
                let value = match argument.action() {
                    ArgumentAction::SetTrue => Value::Bool(true),
                    ArgumentAction::SetFalse => Value::Bool(false),
                    ArgumentAction::Store => read_value(matches, argument)?,
                };

                defaulted.remove(&name);
                values.insert(name, value);
            } else if !values.contains_key(&name) {
                defaulted.insert(name.clone());
                values.insert(name, default);
            }
        }

        Ok((values, defaulted))
    }
}

fn read_value(matches: &ArgMatches, argument: &Argument) -> Result<Value, Error> {
    let id = argument.flag();

    if argument.choices().map_or(false, |choices| !choices.is_empty()) {
        return match matches.get_one::<String>(id) {
            Some(token) => argument.convert(token),
            None => Ok(Value::Null),
        };
    }

    let value = match argument.argument_type() {
        ArgumentType::Bool => matches.get_one::<bool>(id).map(|v| Value::Bool(*v)),
        ArgumentType::Int => matches.get_one::<i64>(id).map(|v| Value::from(*v)),
        ArgumentType::Float => matches
            .get_one::<f64>(id)
            .and_then(|v| Number::from_f64(*v))
            .map(Value::Number),
        ArgumentType::Str => matches.get_one::<String>(id).cloned().map(Value::String),
    };

    Ok(value.unwrap_or(Value::Null))
}

impl Runtime for ClapRuntime {
    fn add_argument(&mut self, argument: Argument) -> Result<(), Error> {
        #[cfg(feature = "tracing_debug")]
        {
            debug!("Adding argument --{} ({:?}).", argument.flag(), argument.action());
        }

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
        let command = self.command();
        let program = command.get_name().to_string();
        let argv = std::iter::once(program.as_str()).chain(tokens.iter().copied());
        let matches = command.try_get_matches_from(argv)?;
        let (values, defaulted) = self.extract(&matches)?;

        Ok(ParsedArguments::new(values, self.parameters.clone()).with_defaulted(defaulted))
    }
}
