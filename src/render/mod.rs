//! Rendering of change ledgers and document text.

mod json;
mod text;

pub use json::{ledger_from_json, to_json, JsonFormat};
pub use text::{ledger_to_text, to_text};
