//! JSON <-> ADL value conversion for the command line

use serde_json::json;

use super::CliError;
use crate::{Output, Value};

/// Split a JSON object into named data columns.
///
/// ```text
/// {"x": [1, 2, 3], "jets": [[...], [...], [...]]}
/// ```
pub fn json_to_columns(json: &serde_json::Value) -> Result<Vec<(String, Value)>, CliError> {
    match json {
        serde_json::Value::Object(map) => Ok(map
            .iter()
            .map(|(name, column)| (name.clone(), Value::from_json(column)))
            .collect()),
        other => Err(CliError::InvalidInput(format!(
            "expected an object of named columns, found {}",
            match other {
                serde_json::Value::Array(_) => "an array",
                serde_json::Value::String(_) => "a string",
                serde_json::Value::Number(_) => "a number",
                serde_json::Value::Bool(_) => "a boolean",
                _ => "null",
            }
        ))),
    }
}

/// Convert the symbols returned by [`crate::Run::call`] to JSON
pub fn output_to_json(output: &Output) -> serde_json::Value {
    match output {
        Output::Batch(columns) => serde_json::Value::Object(
            columns
                .iter()
                .map(|(name, values)| {
                    (
                        name.clone(),
                        serde_json::Value::Array(values.iter().map(Value::to_json).collect()),
                    )
                })
                .collect(),
        ),
        Output::Single(symbols) => json!(
            symbols
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect::<serde_json::Map<_, _>>()
        ),
    }
}
