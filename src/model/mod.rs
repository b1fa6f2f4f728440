//! Document model types for WordprocessingML content.
//!
//! Story parts are parsed into an owned XML tree ([`xml`]); paragraphs are
//! read out of that tree as [`Paragraph`] views, rewritten, and written
//! back by index. Everything the model does not interpret is carried
//! through as opaque nodes.

mod document;
mod paragraph;
mod style;
pub mod wml;
pub mod xml;

pub use document::{DocxDocument, StoryKind};
pub use paragraph::{full_text, text_element, Paragraph, ParagraphChild, Run, RunContent};
pub use style::{AmendmentMarker, RunStyle};
pub use wml::Wml;
pub use xml::{Element, Node, XmlDocument};
