use serde_json::Value;

use crate::constant::*;
use crate::error::Error;
use crate::handler::{Handler, Preprocessed};
use crate::model::{ArgumentType, TypeSpec};
use crate::tree::ParameterWithPath;

/// Handles lists of primitives, written as a single comma delimited argument: `--values 1,2,3`.
///
/// An empty argument is an empty list. An optional list left unset stays null.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListHandler;

fn element_type(parameter: &ParameterWithPath<'_>) -> Option<ArgumentType> {
    match parameter.type_spec() {
        Some(TypeSpec::List(element)) if *element != ArgumentType::Bool => Some(*element),
        Some(TypeSpec::Optional(inner)) => match inner.as_ref() {
            TypeSpec::List(element) if *element != ArgumentType::Bool => Some(*element),
            _ => None,
        },
        _ => None,
    }
}

impl Handler for ListHandler {
    fn preprocess(&self, parameter: &ParameterWithPath<'_>) -> Option<Preprocessed> {
        element_type(parameter).map(|_| {
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
        let (Some(element), Value::String(text)) = (element_type(parameter), value) else {
            return Ok(None);
        };

        if text.is_empty() {
            return Ok(Some(Value::Array(Vec::default())));
        }

        let values = text
            .split(LIST_DELIMITER)
            .map(|token| {
                let token = token.trim();
                element.cast(token).ok_or_else(|| Error::InvalidValue {
                    name: parameter.argument_name().unwrap_or_default(),
                    token: token.to_string(),
                    type_name: element.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Value::Array(values)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Parameter;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(ArgumentType::Int, json!("2,3"), json!([2, 3]))]
    #[case(ArgumentType::Float, json!("0.5, 1"), json!([0.5, 1.0]))]
    #[case(ArgumentType::Str, json!("a,b"), json!(["a", "b"]))]
    #[case(ArgumentType::Str, json!(""), json!([]))]
    #[case(ArgumentType::Int, json!([1]), json!([1]))]
    fn parse(#[case] element: ArgumentType, #[case] raw: Value, #[case] expected: Value) {
        // Setup
        let parameter = Parameter::new("vals", TypeSpec::List(element));

        // Execute
        let result = ListHandler.parse_value(&ParameterWithPath::from(&parameter), &raw);

        // Verify
        match result {
            Ok(Some(value)) => assert_eq!(value, expected),
            Ok(None) => assert_eq!(raw, expected),
            Err(error) => panic!("unexpected {error}"),
        }
    }

    #[test]
    fn parse_invalid() {
        let parameter = Parameter::new("vals", TypeSpec::List(ArgumentType::Int));
        assert_matches!(
            ListHandler.parse_value(&ParameterWithPath::from(&parameter), &json!("1,x")),
            Err(Error::InvalidValue { name, token, type_name }) => {
                assert_eq!(name, "vals");
                assert_eq!(token, "x");
                assert_eq!(type_name, "int");
            }
        );
    }

    #[test]
    fn parse_optional() {
        // Setup
        let parameter = Parameter::new(
            "vals",
            TypeSpec::Optional(Box::new(TypeSpec::List(ArgumentType::Int))),
        );
        let parameter = ParameterWithPath::from(&parameter);

        // Execute
        let given = ListHandler.parse_value(&parameter, &json!("1,2"));
        let missing = ListHandler.parse_value(&parameter, &Value::Null);

        // Verify
        assert_matches!(given, Ok(Some(value)) => {
            assert_eq!(value, json!([1, 2]));
        });
        assert_matches!(missing, Ok(None));
    }

    #[test]
    fn preprocess() {
        let parameter = Parameter::new("vals", TypeSpec::List(ArgumentType::Int));
        assert_matches!(
            ListHandler.preprocess(&ParameterWithPath::from(&parameter)),
            Some(Preprocessed::Keep(p)) => {
                assert_eq!(p.argument_type(), Some(ArgumentType::Str));
            }
        );

        let booleans = Parameter::new("vals", TypeSpec::List(ArgumentType::Bool));
        assert_eq!(ListHandler.preprocess(&ParameterWithPath::from(&booleans)), None);

        let optional = Parameter::new(
            "vals",
            TypeSpec::Optional(Box::new(TypeSpec::List(ArgumentType::Float))),
        );
        assert_matches!(
            ListHandler.preprocess(&ParameterWithPath::from(&optional)),
            Some(Preprocessed::Keep(p)) => {
                assert_eq!(p.argument_type(), Some(ArgumentType::Str));
            }
        );
    }
}
