//! Paragraph alignment.
//!
//! Paragraphs are paired by position: original paragraph `i` with amended
//! paragraph `i`. The extractor has already checked the counts match.

use super::options::ComplexParagraphPolicy;
use crate::parser::{Extraction, SourceParagraph, NESTED_PARAGRAPH};

/// One original paragraph and its amended text.
#[derive(Debug, Clone, Copy)]
pub struct ParagraphPair<'a> {
    /// The original paragraph
    pub source: &'a SourceParagraph,
    /// The amended text
    pub amended: &'a str,
}

impl<'a> ParagraphPair<'a> {
    /// Position within the story part.
    pub fn index(&self) -> usize {
        self.source.index
    }

    /// Whether the amended text equals the original text exactly.
    pub fn is_identical(&self) -> bool {
        self.source.text == self.amended
    }

    /// Decide what to do with the paragraph.
    ///
    /// Paragraphs holding text boxes are never replaced: their nested
    /// paragraphs are aligned on their own.
    pub fn action(&self, policy: ComplexParagraphPolicy) -> Action<'a> {
        match (self.source.unsupported.as_deref(), policy) {
            (Some(reason), ComplexParagraphPolicy::Skip) => Action::Skip(reason),
            _ if self.is_identical() => Action::Keep,
            (Some(_), ComplexParagraphPolicy::Replace) if self.source.nested_paragraphs > 0 => {
                Action::Skip(NESTED_PARAGRAPH)
            }
            (Some(_), ComplexParagraphPolicy::Replace) => Action::Replace,
            (None, _) => Action::Rewrite,
        }
    }
}

/// What the refiner does with one paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    /// Leave the element untouched: the text did not change
    Keep,
    /// Rewrite runs from the word diff
    Rewrite,
    /// Replace all runs with the amended text
    Replace,
    /// Leave the element untouched: it cannot be rewritten safely
    Skip(&'a str),
}

/// Pair every original paragraph with its amended text, in order.
pub fn align(extraction: &Extraction) -> impl Iterator<Item = ParagraphPair<'_>> {
    extraction
        .original
        .iter()
        .zip(extraction.amended.iter())
        .map(|(source, amended)| ParagraphPair {
            source,
            amended: amended.as_str(),
        })
}
