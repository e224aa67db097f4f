//! CLI support for adl-lang
//!
//! Provides programmatic access to the `adl` command's functionality for
//! embedding in other tools.

mod check;
mod convert;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use convert::{json_to_columns, output_to_json};

use std::io;

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Error in the ADL program or while evaluating it
    Adl(crate::AdlError),
    /// Requested aggregation path does not exist
    Access(crate::AccessError),
    /// JSON parsing error
    Json(serde_json::Error),
    /// IO error
    Io(io::Error),
    /// No input provided
    NoInput,
    /// Input JSON of the wrong shape
    InvalidInput(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Adl(e) => write!(f, "{}", e),
            CliError::Access(e) => write!(f, "Aggregation lookup failed: {}", e),
            CliError::Json(e) => write!(f, "Invalid JSON: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => write!(f, "No input provided. Use --input or pipe JSON to stdin."),
            CliError::InvalidInput(message) => write!(f, "Invalid input: {}", message),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Adl(e) => Some(e),
            CliError::Access(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<crate::AdlError> for CliError {
    fn from(e: crate::AdlError) -> Self {
        CliError::Adl(e)
    }
}

impl From<crate::AccessError> for CliError {
    fn from(e: crate::AccessError) -> Self {
        CliError::Access(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
