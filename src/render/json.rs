//! JSON rendering for change ledgers and refine reports.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::refine::ChangeLedger;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize a ledger, report or summary to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Ledger(format!("JSON serialization error: {}", e)))
}

/// Read a ledger back from JSON.
pub fn ledger_from_json(json: &str) -> Result<ChangeLedger> {
    serde_json::from_str(json).map_err(|e| Error::Ledger(format!("invalid ledger JSON: {}", e)))
}
