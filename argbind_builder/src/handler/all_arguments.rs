use serde_json::Value;

use crate::error::Error;
use crate::handler::{Handler, Preprocessed};
use crate::model::{ArgumentValues, TypeSpec};
use crate::runtime::Runtime;
use crate::tree::ParameterWithPath;

/// Binds [`TypeSpec::AllArguments`] parameters to the complete raw argument bag.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllArgumentsHandler;

fn is_all_arguments(parameter: &ParameterWithPath<'_>) -> bool {
    matches!(parameter.type_spec(), Some(TypeSpec::AllArguments))
}

impl Handler for AllArgumentsHandler {
    fn preprocess(&self, parameter: &ParameterWithPath<'_>) -> Option<Preprocessed> {
        is_all_arguments(parameter).then(|| Preprocessed::Keep(parameter.parameter().clone()))
    }

    fn add_parameter(
        &self,
        parameter: &ParameterWithPath<'_>,
        _runtime: &mut dyn Runtime,
    ) -> Result<bool, Error> {
        Ok(is_all_arguments(parameter))
    }

    fn bind(
        &self,
        parameter: &ParameterWithPath<'_>,
        values: &ArgumentValues,
        _children: &[(String, Value)],
    ) -> Result<Option<Value>, Error> {
        if is_all_arguments(parameter) {
            Ok(Some(Value::Object(values.clone().into_iter().collect())))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerRegistry;
    use crate::runtime::{MemoryRuntime, ParsedArguments};
    use crate::tree::Parameter;
    use serde_json::json;

    #[test]
    fn bind_everything() {
        // Setup
        let tree = Parameter::root().with_children(vec![
            Parameter::new("a", TypeSpec::Int),
            Parameter::new("everything", TypeSpec::AllArguments),
        ]);
        let registry = HandlerRegistry::default();
        let values: ArgumentValues = [
            ("a".to_string(), json!(1)),
            ("other".to_string(), json!("x")),
        ]
        .into();

        // Execute
        let preprocessed = registry.preprocess(&tree);
        let result = preprocessed.as_ref().map(|tree| registry.bind(tree, &ParsedArguments::new(values.clone(), None)));

        // Verify
        assert_matches!(result, Some(Ok(value)) => {
            assert_eq!(value, json!({"a": 1, "everything": {"a": 1, "other": "x"}}));
        });
    }

    #[test]
    fn registers_nothing() {
        // Setup
        let tree = Parameter::root().with_children(vec![Parameter::new("everything", TypeSpec::AllArguments)]);
        let mut runtime = MemoryRuntime::new();
        let root = ParameterWithPath::from(&tree);

        // Execute
        let result = root
            .find("everything")
            .map(|p| AllArgumentsHandler.add_parameter(&p, &mut runtime));

        // Verify
        assert_matches!(result, Some(Ok(true)));
        assert_eq!(runtime.arguments().count(), 0);
    }
}
