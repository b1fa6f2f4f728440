//! Plain text rendering: ledger summaries and document paragraphs.

use std::fmt::Write;

use crate::model::DocxDocument;
use crate::parser::join_paragraphs;
use crate::refine::{ChangeLedger, ParagraphStatus};

/// Render the document's paragraphs in the amended-text format.
///
/// Splitting the result with [`crate::parser::split_paragraphs`] gives back
/// the same paragraphs as long as none of them is empty.
pub fn to_text(doc: &DocxDocument) -> String {
    join_paragraphs(&doc.paragraph_texts())
}

/// Render a human-readable ledger summary. Unchanged paragraphs are not listed.
pub fn ledger_to_text(ledger: &ChangeLedger) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Change ledger ({}, markup {})",
        ledger.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        if ledger.markup { "on" } else { "off" }
    );

    for entry in &ledger.entries {
        if entry.status == ParagraphStatus::Unchanged {
            continue;
        }
        let _ = write!(out, "  {} #{}: {}", entry.story, entry.index, entry.status);
        if entry.status == ParagraphStatus::Modified {
            let _ = write!(
                out,
                " (+{} -{} words)",
                entry.inserted_words, entry.deleted_words
            );
        }
        if entry.needs_review {
            out.push_str(" [needs review]");
        }
        if let Some(ref note) = entry.note {
            let _ = write!(out, ": {}", note);
        }
        out.push('\n');
    }

    let summary = ledger.summary();
    let _ = writeln!(
        out,
        "Total: {} paragraphs, {} modified, {} unchanged, {} skipped, {} need review",
        summary.total, summary.modified, summary.unchanged, summary.skipped, summary.needs_review
    );
    out
}
