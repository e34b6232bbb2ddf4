use serde_json::Value;

use crate::error::Error;
use crate::handler::{Handler, Preprocessed};
use crate::model::{ArgumentType, ParsedType, TypeSpec};
use crate::tree::ParameterWithPath;

/// Handles types constructed from their textual form ([`TypeSpec::Parsed`]), optional or not.
#[derive(Debug, Clone, Copy, Default)]
pub struct FromStrHandler;

fn parsed_type<'a>(parameter: &'a ParameterWithPath<'_>) -> Option<&'a ParsedType> {
    match parameter.type_spec() {
        Some(TypeSpec::Parsed(parsed)) => Some(parsed),
        Some(TypeSpec::Optional(inner)) => match inner.as_ref() {
            TypeSpec::Parsed(parsed) => Some(parsed),
            _ => None,
        },
        _ => None,
    }
}

impl Handler for FromStrHandler {
    fn preprocess(&self, parameter: &ParameterWithPath<'_>) -> Option<Preprocessed> {
        parsed_type(parameter).map(|_| {
            Preprocessed::Keep(
                parameter
                    .parameter()
                    .clone()
                    .with_argument_type(Some(ArgumentType::Str)),
            )
        })
    }

    fn parse_value(
        &self,
        parameter: &ParameterWithPath<'_>,
        value: &Value,
    ) -> Result<Option<Value>, Error> {
        let (Some(parsed), Value::String(token)) = (parsed_type(parameter), value) else {
            return Ok(None);
        };

        parsed
            .parse(token)
            .map(Some)
            .map_err(|_| Error::InvalidValue {
                name: parameter.argument_name().unwrap_or_default(),
                token: token.clone(),
                type_name: parsed.name().to_string(),
            })
    }
}
