//! # docx-refine
//!
//! Carry revised wording into a DOCX document while keeping its formatting.
//!
//! Given an original document and an amended version of its text (a second
//! DOCX, or plain text with blank lines between paragraphs), this library
//! writes a new document that keeps the original's styles, fonts, footnotes
//! and layout, carries the amended wording, and marks the changed words.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docx_refine::refine_file_with_text;
//!
//! fn main() -> docx_refine::Result<()> {
//!     let report = refine_file_with_text("contract.docx", "amended.txt", "refined.docx")?;
//!
//!     let summary = report.summary();
//!     println!("{} of {} paragraphs modified", summary.modified, summary.total);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Word-level diff**: LCS over word and whitespace tokens
//! - **Style preservation**: kept words keep their run formatting; inserted
//!   words take the formatting of their nearest neighbor
//! - **Markup**: inserted words in bold with a yellow highlight, or a clean
//!   document with no markup
//! - **Anchors kept**: footnote references and bookmarks survive rewording
//! - **Change ledger**: per-paragraph status as JSON or text
//! - **Non-destructive**: the original is only read; the output appears
//!   atomically or not at all

pub mod detect;
pub mod diff;
pub mod error;
pub mod model;
pub mod parser;
pub mod refine;
pub mod render;

// Re-export commonly used types
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_docx, DocxFormat};
pub use diff::{diff_words, tokenize, EditOp, EditScript, Hunk};
pub use error::{Error, Result};
pub use model::{AmendmentMarker, DocxDocument, Paragraph, Run, RunStyle, StoryKind};
pub use parser::{DocxPackage, ParagraphInfo};
pub use refine::{
    Amended, AmendedSource, ChangeLedger, ComplexParagraphPolicy, LedgerEntry, LedgerSummary,
    ParagraphStatus, RefineOptions, RefineReport, Refiner,
};
pub use render::JsonFormat;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Refine a document with an amended DOCX.
///
/// # Arguments
///
/// * `original` - The document whose formatting is kept
/// * `amended` - A DOCX with the same paragraphs, reworded
/// * `out` - Where to write the result (must differ from both inputs)
///
/// # Example
///
/// ```no_run
/// use docx_refine::refine_file;
///
/// let report = refine_file("contract.docx", "contract-edited.docx", "refined.docx").unwrap();
/// println!("{:?}", report.summary());
/// ```
pub fn refine_file<P, Q, R>(original: P, amended: Q, out: R) -> Result<RefineReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    Refiner::default().refine(original, &AmendedSource::docx(amended.as_ref()), out)
}

/// Refine a document with amended plain text.
///
/// Paragraphs in the text are separated by blank lines, and there must be
/// exactly one per paragraph of the original body.
///
/// # Example
///
/// ```no_run
/// use docx_refine::refine_file_with_text;
///
/// let report = refine_file_with_text("contract.docx", "amended.txt", "refined.docx").unwrap();
/// ```
pub fn refine_file_with_text<P, Q, R>(original: P, amended: Q, out: R) -> Result<RefineReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    Refiner::default().refine(original, &AmendedSource::text(amended.as_ref()), out)
}

/// Refine a document with custom options.
///
/// # Example
///
/// ```no_run
/// use docx_refine::{refine_file_with_options, AmendedSource, RefineOptions};
///
/// let options = RefineOptions::new().clean();
/// let report = refine_file_with_options(
///     "contract.docx",
///     &AmendedSource::text("amended.txt"),
///     "clean.docx",
///     options,
/// ).unwrap();
/// ```
pub fn refine_file_with_options<P: AsRef<Path>, Q: AsRef<Path>>(
    original: P,
    amended: &AmendedSource,
    out: Q,
    options: RefineOptions,
) -> Result<RefineReport> {
    Refiner::new(options).refine(original, amended, out)
}

/// The body paragraphs of a DOCX file, text of all runs included.
///
/// # Example
///
/// ```no_run
/// use docx_refine::extract_paragraphs;
///
/// for (i, text) in extract_paragraphs("contract.docx").unwrap().iter().enumerate() {
///     println!("{}: {}", i, text);
/// }
/// ```
pub fn extract_paragraphs<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    Ok(DocxPackage::open(path)?.body()?.paragraph_texts())
}

/// The body of a DOCX file in the amended-text format (paragraphs separated
/// by blank lines), ready to be edited and passed back as amended text.
///
/// Empty paragraphs, and paragraphs that start or end with a line break,
/// collapse into the blank lines between paragraphs, so the text of such a
/// document splits back into fewer paragraphs and refining with it fails
/// with [`Error::ParagraphCountMismatch`]. Check with
/// [`parser::round_trips`], or amend such documents with a DOCX instead.
///
/// # Example
///
/// ```no_run
/// use docx_refine::extract_text;
///
/// let text = extract_text("contract.docx").unwrap();
/// std::fs::write("amended.txt", text).unwrap();
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let body = DocxPackage::open(path)?.body()?;
    Ok(render::to_text(&body))
}

/// Paragraph overview of a DOCX file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// The inspected file
    pub path: PathBuf,
    /// Package information
    pub format: DocxFormat,
    /// Paragraphs per story part present in the package
    pub stories: Vec<StoryInfo>,
}

/// Paragraph overview of one story part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryInfo {
    /// The story
    pub story: StoryKind,
    /// Every paragraph in document order
    pub paragraphs: Vec<ParagraphInfo>,
}

impl StoryInfo {
    /// Paragraphs that would be skipped.
    pub fn unsupported(&self) -> impl Iterator<Item = &ParagraphInfo> {
        self.paragraphs.iter().filter(|p| p.unsupported.is_some())
    }
}

/// Describe the paragraphs of a DOCX file.
pub fn inspect_file<P: AsRef<Path>>(path: P) -> Result<DocumentInfo> {
    let path = path.as_ref();
    let package = DocxPackage::open(path)?;
    let format = detect_format_from_bytes(package.bytes())?;

    let mut stories = Vec::new();
    for kind in [StoryKind::Body, StoryKind::Footnotes, StoryKind::Endnotes] {
        if let Some(doc) = package.story(kind)? {
            stories.push(StoryInfo {
                story: kind,
                paragraphs: parser::describe(&doc),
            });
        }
    }

    Ok(DocumentInfo {
        path: path.to_path_buf(),
        format,
        stories,
    })
}
