//! Error types for docx-refine.

use std::io;
use thiserror::Error;

/// Result type alias for docx-refine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while refining a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not a DOCX package.
    #[error("Unknown file format: not a valid DOCX package")]
    UnknownFormat,

    /// A package part is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// The source document is corrupt or lacks a required part.
    #[error("Cannot read document: {0}")]
    DocumentRead(String),

    /// The output document could not be written.
    #[error("Cannot write document: {0}")]
    DocumentWrite(String),

    /// The original and amended inputs disagree on paragraph count.
    #[error(
        "Paragraph count mismatch in {part}: original has {expected}, amended has {actual}"
    )]
    ParagraphCountMismatch {
        /// Package part the paragraphs were read from
        part: String,
        /// Paragraphs in the original
        expected: usize,
        /// Paragraphs in the amended input
        actual: usize,
    },

    /// A paragraph holds fields or hyperlinks and cannot be rewritten safely.
    #[error("Paragraph {index} has unsupported content: {reason}")]
    UnsupportedParagraphContent {
        /// Paragraph index within its part
        index: usize,
        /// What made the paragraph unsupported
        reason: String,
    },

    /// Inserted text had no neighboring run to take its formatting from.
    #[error("Paragraph {index} has no run to inherit formatting from; {fallback}")]
    StyleInheritance {
        /// Paragraph index within its part
        index: usize,
        /// Fallback that was applied instead
        fallback: String,
    },

    /// An output path is unusable (same as an input, or missing directory).
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// The change ledger could not be serialized.
    #[error("Ledger error: {0}")]
    Ledger(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.to_string())
    }
}

impl Error {
    /// Whether the error is a per-paragraph condition that refinement recovers from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedParagraphContent { .. } | Error::StyleInheritance { .. }
        )
    }
}
