//! Run ADL programs against JSON input

use serde_json::json;

use super::{CliError, json_to_columns, output_to_json};
use crate::{Run, path::parse_path};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The ADL program
    pub program: String,
    /// JSON input string: an object of named columns
    pub input: Option<String>,
    /// Provenance tag matched by `source` blocks
    pub source: Option<String>,
    /// Show only the aggregation node at this `/`-separated path
    pub path: Option<String>,
    /// Pretty-print the output
    pub pretty: bool,
    /// Only validate syntax and aggregation names, don't execute
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// The program parsed and its aggregation tree was built
    SyntaxValid,
    /// The input was evaluated; symbols and aggregations as JSON
    Success(serde_json::Value),
}

/// Execute an adl check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let mut run = Run::new(&options.program)?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let json_value: serde_json::Value = serde_json::from_str(json_str).map_err(CliError::Json)?;
    let columns = json_to_columns(&json_value)?;

    let output = run.call(options.source.as_deref(), columns)?;

    let result = match &options.path {
        Some(path) => run.get(&parse_path(path))?.to_json(),
        None => json!({
            "symbols": output_to_json(&output),
            "aggregation": run.aggregation().to_json(),
        }),
    };
    Ok(CheckResult::Success(result))
}
