//! Plain-text amended input.
//!
//! Paragraphs are separated by one or more blank lines. A single newline
//! stays inside its paragraph and becomes a line break.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

fn paragraph_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{2,}").expect("paragraph break pattern is valid"))
}

/// Split amended text into paragraphs.
///
/// Line endings are normalized to `\n` and leading/trailing newlines are
/// dropped. Empty input yields no paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let trimmed = normalized.trim_matches('\n');
    if trimmed.is_empty() {
        return Vec::new();
    }
    paragraph_break()
        .split(trimmed)
        .map(str::to_string)
        .collect()
}

/// Read a UTF-8 text file and split it into paragraphs.
pub fn read_paragraphs<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let data = std::fs::read(path)
        .map_err(|e| Error::DocumentRead(format!("{}: {}", path.display(), e)))?;
    let text = String::from_utf8(data)
        .map_err(|e| Error::DocumentRead(format!("{}: not UTF-8 ({})", path.display(), e)))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    Ok(split_paragraphs(text))
}

/// Join paragraphs into the plain-text amended format.
pub fn join_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> String {
    paragraphs
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Whether `paragraphs` survive a join and split unchanged.
///
/// Empty paragraphs, and paragraphs that start or end with a newline,
/// merge into the blank lines that separate paragraphs.
pub fn round_trips<S: AsRef<str>>(paragraphs: &[S]) -> bool {
    let split = split_paragraphs(&join_paragraphs(paragraphs));
    split.len() == paragraphs.len()
        && split
            .iter()
            .zip(paragraphs)
            .all(|(a, b)| a.as_str() == b.as_ref())
}
