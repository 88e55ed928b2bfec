//! JSON serialization for stability results.

use crate::error::Result;
use crate::result::ResultTable;

/// Serialize a ResultTable to a compact JSON string.
///
/// # Errors
///
/// Returns `Serialization` if serialization fails (a non-finite score).
pub fn to_json(table: &ResultTable) -> Result<String> {
    Ok(serde_json::to_string(table)?)
}

/// Serialize a ResultTable to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns `Serialization` if serialization fails (a non-finite score).
pub fn to_json_pretty(table: &ResultTable) -> Result<String> {
    Ok(serde_json::to_string_pretty(table)?)
}

/// Parse a ResultTable previously written with [`to_json`].
pub fn from_json(json: &str) -> Result<ResultTable> {
    Ok(serde_json::from_str(json)?)
}
