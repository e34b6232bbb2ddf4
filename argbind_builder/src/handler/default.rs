use serde_json::Value;

use crate::constant::*;
use crate::error::Error;
use crate::handler::{Handler, Preprocessed};
use crate::model::{ArgumentType, TypeSpec};
use crate::runtime::{Argument, ArgumentAction, Runtime};
use crate::tree::ParameterWithPath;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// Handles primitives, literals, unions, optionals and plain aggregates.
///
/// Booleans register as a pair of flags: `--name` and `--no-name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHandler;

fn literal_choices(type_spec: &TypeSpec) -> Option<&[Value]> {
    match type_spec {
        TypeSpec::Literal(values) => Some(values),
        TypeSpec::Optional(inner) => literal_choices(inner),
        _ => None,
    }
}

fn with_marker(help: &str, marked: bool) -> String {
    match (help.is_empty(), marked) {
        (_, false) => help.to_string(),
        (true, true) => DEFAULT_MARKER.to_string(),
        (false, true) => format!("{help} {DEFAULT_MARKER}"),
    }
}

impl Handler for DefaultHandler {
    fn preprocess(&self, parameter: &ParameterWithPath<'_>) -> Option<Preprocessed> {
        let original = parameter.parameter();

        if !original.is_leaf() || matches!(original.type_spec(), Some(TypeSpec::Struct(_))) {
            return Some(Preprocessed::Keep(original.clone()));
        }

        let boolean_default = matches!(original.default(), Some(Value::Bool(_)));

        let Some(type_spec) = original.type_spec() else {
            return if boolean_default {
                Some(Preprocessed::Keep(
                    original.clone().with_argument_type(Some(ArgumentType::Bool)),
                ))
            } else {
                Some(Preprocessed::Drop)
            };
        };

        let argument_type = match type_spec.resolve_argument_type() {
            Some(argument_type) => argument_type,
            None if boolean_default => ArgumentType::Bool,
            None => return None,
        };

        let choices = literal_choices(type_spec)
            .map(<[Value]>::to_vec)
            .or_else(|| original.choices().map(<[Value]>::to_vec));

        Some(Preprocessed::Keep(
            original
                .clone()
                .with_argument_type(Some(argument_type))
                .with_choices(choices),
        ))
    }

    fn add_parameter(
        &self,
        parameter: &ParameterWithPath<'_>,
        runtime: &mut dyn Runtime,
    ) -> Result<bool, Error> {
        if !parameter.is_leaf() || matches!(parameter.type_spec(), Some(TypeSpec::Struct(_))) {
            return Ok(true);
        }

        let (Some(argument_type), Some(name), Some(flag)) = (
            parameter.argument_type(),
            parameter.argument_name(),
            parameter.flag_name(),
        ) else {
            return Ok(false);
        };

        let default = parameter.default();
        let required = default.is_none();
        let choices = parameter.choices().map(<[Value]>::to_vec);

        if let Some(existing) = runtime.find_argument(&name).cloned() {
            #[cfg(feature = "tracing_debug")]
            {
                debug!("Merging into the existing argument --{}.", existing.flag());
            }

            let updated = existing
                .with_required(required)
                .with_help(parameter.help())
                .with_default(default)
                .with_choices(choices);
            runtime.add_argument(updated)?;
            return Ok(true);
        }

        if argument_type == ArgumentType::Bool && choices.is_none() {
            let default = default.unwrap_or(Value::Bool(false));
            let marked = default == Value::Bool(true);
            let negative = flag.strip_prefix(AFFIRMATION_PREFIX).unwrap_or(&flag);

            runtime.add_argument(
                Argument::new(name.clone(), ArgumentType::Bool)
                    .with_flag(flag.clone())
                    .with_action(ArgumentAction::SetTrue)
                    .with_help(with_marker(parameter.help(), marked))
                    .with_default(Some(default.clone())),
            )?;
            runtime.add_argument(
                Argument::new(name, ArgumentType::Bool)
                    .with_flag(format!("{NEGATION_PREFIX}{negative}"))
                    .with_action(ArgumentAction::SetFalse)
                    .with_help(with_marker(parameter.help(), !marked))
                    .with_default(Some(default)),
            )?;
        } else {
            runtime.add_argument(
                Argument::new(name, argument_type)
                    .with_flag(flag)
                    .with_required(required)
                    .with_help(parameter.help())
                    .with_default(default)
                    .with_choices(choices),
            )?;
        }

        Ok(true)
    }
}
