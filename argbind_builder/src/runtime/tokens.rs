use serde_json::Value;

use crate::constant::*;
use crate::model::ArgumentValues;
use crate::tree::argument_name;

/// A long flag found in the Cli tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlagToken {
    pub(crate) flag: String,
    pub(crate) value: Option<String>,
}

/// Scan for long flags: `--name=value`, `--name value` or a bare `--name`.
/// Everything else is skipped.
pub(crate) fn tokenize(tokens: &[&str]) -> Vec<FlagToken> {
    let mut flags = Vec::default();
    let mut index = 0;

    while index < tokens.len() {
        let token = tokens[index];
        index += 1;

        let Some(flag) = token.strip_prefix(LONG_PREFIX) else {
            continue;
        };

        if flag.is_empty() {
            continue;
        }

        match flag.split_once('=') {
            Some((flag, value)) => flags.push(FlagToken {
                flag: flag.to_string(),
                value: Some(value.to_string()),
            }),
            None => {
                let value = match tokens.get(index) {
                    Some(next) if !next.starts_with(LONG_PREFIX) => {
                        index += 1;
                        Some(next.to_string())
                    }
                    _ => None,
                };

                flags.push(FlagToken {
                    flag: flag.to_string(),
                    value,
                });
            }
        }
    }

    flags
}

/// A best effort parse of the Cli tokens, independent of any registered argument.
///
/// Values are kept as text, bare flags become `true`, and keys are argument names (`--a-b` is `a_b`).
/// Entries in `seed` are kept unless overridden.
pub(crate) fn parse_arguments_manually(tokens: &[&str], seed: ArgumentValues) -> ArgumentValues {
    let mut values = seed;

    for token in tokenize(tokens) {
        let value = match token.value {
            Some(value) => Value::String(value),
            None => Value::Bool(true),
        };

        values.insert(argument_name(&token.flag), value);
    }

    values
}
