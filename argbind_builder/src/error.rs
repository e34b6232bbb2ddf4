use thiserror::Error;

/// Everything that can go wrong while building, registering or binding parameters.
///
/// Configuration errors (the first seven variants) point at a bug in how the parameters were declared or composed.
/// The remaining variants describe Cli input that could not be turned into values.
#[derive(Debug, Error)]
pub enum Error {
    /// The same full name was generated twice while building a tree.
    #[error("parameter '{0}' was already generated.")]
    DuplicateParameter(String),

    /// Two sources declare incompatible types for the same parameter.
    #[error("there are conflicting types for '{name}': [{left}, {right}].")]
    TypeConflict {
        /// Full or argument name of the parameter.
        name: String,
        /// The type already present.
        left: String,
        /// The type being merged in.
        right: String,
    },

    /// Two sources declare different defaults for the same parameter, and soft defaults were not requested.
    #[error("there are conflicting defaults for '{name}': [{left}, {right}].")]
    DefaultConflict {
        /// Full or argument name of the parameter.
        name: String,
        /// The default already present.
        left: String,
        /// The default being merged in.
        right: String,
    },

    /// Default overrides were supplied for paths that do not exist in the tree.
    #[error("some defaults were not found: {0:?}.")]
    UnboundDefaultReference(Vec<String>),

    /// No registered handler accepted the operation for a parameter.
    #[error("there was no handler registered to {operation} '{name}'.")]
    NoHandler {
        /// The handler operation (ex: `register`).
        operation: &'static str,
        /// Full name of the parameter.
        name: String,
    },

    /// A path lookup reached a missing segment.
    #[error("could not find path '{0}'.")]
    PathNotFound(String),

    /// An aggregate parameter has a type that cannot be assembled from its children.
    #[error("aggregate type {type_name} of '{name}' is not supported.")]
    AggregateTypeUnsupported {
        /// Full name of the parameter.
        name: String,
        /// The offending type.
        type_name: String,
    },

    /// A raw value could not be converted.
    #[error("cannot convert '{token}' to {type_name} for '{name}'.")]
    InvalidValue {
        /// Argument name of the parameter.
        name: String,
        /// The raw input.
        token: String,
        /// The target type.
        type_name: String,
    },

    /// A value is outside the allowed choices.
    #[error("invalid choice '{token}' for '{name}' (choose from {choices}).")]
    InvalidChoice {
        /// Argument name of the parameter.
        name: String,
        /// The raw input.
        token: String,
        /// The allowed choices, comma separated.
        choices: String,
    },

    /// A required argument was not provided.
    #[error("missing required argument '{0}'.")]
    MissingArgument(String),

    /// A flag is not registered with the runtime.
    #[error("unrecognized argument '{0}'.")]
    UnrecognizedArgument(String),

    /// The clap runtime rejected the input (this includes `--help`).
    #[error(transparent)]
    Cli(#[from] clap::Error),

    /// The bound value does not fit the requested Rust type.
    #[error("cannot deserialize bound arguments: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl Error {
    /// The process exit code that best describes this error.
    /// Help/version requests exit with `0`, all else with `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Cli(error) if !error.use_stderr() => 0,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Error::DuplicateParameter("a.b".to_string()), "parameter 'a.b' was already generated.")]
    #[case(Error::PathNotFound("a.b".to_string()), "could not find path 'a.b'.")]
    #[case(
        Error::UnboundDefaultReference(vec!["x".to_string()]),
        "some defaults were not found: [\"x\"]."
    )]
    #[case(
        Error::NoHandler { operation: "register", name: "k".to_string() },
        "there was no handler registered to register 'k'."
    )]
    fn display(#[case] error: Error, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn exit_code() {
        assert_eq!(Error::MissingArgument("--k".to_string()).exit_code(), 1);
    }
}
