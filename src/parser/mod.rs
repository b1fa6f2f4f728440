//! DOCX package reading and paragraph extraction.

pub mod extract;
mod package;
pub mod text;

pub use extract::{
    describe, extract, source_paragraphs, unsupported_reason, Extraction, ParagraphInfo,
    SourceParagraph, NESTED_PARAGRAPH,
};
pub use package::DocxPackage;
pub(crate) use package::{persist, staging_file};
pub use text::{join_paragraphs, read_paragraphs, round_trips, split_paragraphs};
