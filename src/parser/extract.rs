//! Paragraph extraction: parallel original/amended paragraph sequences.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{full_text, DocxDocument, Element, Paragraph, StoryKind, Wml};

/// An original paragraph with everything the refiner needs to decide on it.
#[derive(Debug, Clone)]
pub struct SourceParagraph {
    /// Position within its story part
    pub index: usize,

    /// Paragraph view (properties and runs)
    pub paragraph: Paragraph,

    /// Text of every run in the paragraph, nested runs included
    pub text: String,

    /// Why the paragraph cannot be rewritten run-by-run, if it cannot
    pub unsupported: Option<String>,

    /// Paragraphs nested inside this one (text boxes), counted separately
    pub nested_paragraphs: usize,
}

impl SourceParagraph {
    /// Whether the paragraph can be rewritten run-by-run.
    pub fn is_simple(&self) -> bool {
        self.unsupported.is_none()
    }
}

/// Original and amended paragraphs of one story part, equal in length.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Story the paragraphs come from
    pub kind: StoryKind,

    /// Original paragraphs in document order
    pub original: Vec<SourceParagraph>,

    /// Amended paragraph texts in the same order
    pub amended: Vec<String>,
}

impl Extraction {
    /// Number of aligned paragraph pairs.
    pub fn len(&self) -> usize {
        self.original.len()
    }

    /// Check if there are no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}

/// Summary of one paragraph, used by the `info` view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParagraphInfo {
    /// Position within its story part
    pub index: usize,
    /// Paragraph style id (`w:pStyle`), if set
    pub style_id: Option<String>,
    /// Number of direct runs
    pub run_count: usize,
    /// Paragraph text
    pub text: String,
    /// Why the paragraph would be skipped, if it would
    pub unsupported: Option<String>,
}

/// Read every paragraph of a story part.
pub fn source_paragraphs(doc: &DocxDocument) -> Vec<SourceParagraph> {
    let wml = doc.wml();
    doc.paragraph_elements()
        .into_iter()
        .enumerate()
        .map(|(index, el)| SourceParagraph {
            index,
            paragraph: Paragraph::from_element(el, wml),
            text: full_text(el, wml),
            unsupported: unsupported_reason(el, wml),
            nested_paragraphs: count_nested(el, wml),
        })
        .collect()
}

fn count_nested(el: &Element, wml: &Wml) -> usize {
    el.elements()
        .map(|child| usize::from(wml.is(child, "p")) + count_nested(child, wml))
        .sum()
}

/// Pair an original story part with its amended paragraph texts.
///
/// Fails with [`Error::ParagraphCountMismatch`] if the counts differ.
pub fn extract(original: &DocxDocument, amended: Vec<String>) -> Result<Extraction> {
    let original_paragraphs = source_paragraphs(original);

    if original_paragraphs.len() != amended.len() {
        return Err(Error::ParagraphCountMismatch {
            part: original.kind().part_name().to_string(),
            expected: original_paragraphs.len(),
            actual: amended.len(),
        });
    }

    log::debug!(
        "{}: extracted {} paragraph pairs",
        original.kind(),
        original_paragraphs.len()
    );

    Ok(Extraction {
        kind: original.kind(),
        original: original_paragraphs,
        amended,
    })
}

/// Describe every paragraph of a story part.
pub fn describe(doc: &DocxDocument) -> Vec<ParagraphInfo> {
    let wml = doc.wml();
    source_paragraphs(doc)
        .into_iter()
        .map(|source| ParagraphInfo {
            index: source.index,
            style_id: source
                .paragraph
                .properties
                .as_ref()
                .and_then(|ppr| wml.child_val(ppr, "pStyle"))
                .map(str::to_string),
            run_count: source.paragraph.runs().count(),
            text: source.text,
            unsupported: source.unsupported,
        })
        .collect()
}

/// Reason given for paragraphs holding other paragraphs.
pub const NESTED_PARAGRAPH: &str = "contains a nested paragraph (text box)";

/// Why a `w:p` element cannot be rewritten run-by-run, if it cannot.
pub fn unsupported_reason(p: &Element, wml: &Wml) -> Option<String> {
    let first = p.elements().next();
    let ppr_misplaced = p.elements().any(|el| wml.is(el, "pPr"))
        && !first.map(|el| wml.is(el, "pPr")).unwrap_or(false);
    if ppr_misplaced {
        return Some("paragraph properties are not the first child".to_string());
    }

    if p.find_descendant(|el| wml.is(el, "hyperlink")).is_some() {
        return Some("contains a hyperlink".to_string());
    }

    let field = |el: &Element| {
        wml.is(el, "fldChar") || wml.is(el, "instrText") || wml.is(el, "fldSimple")
    };
    if p.find_descendant(field).is_some() {
        return Some("contains a field".to_string());
    }

    if p.find_descendant(|el| wml.is(el, "p")).is_some() {
        return Some(NESTED_PARAGRAPH.to_string());
    }

    for child in p.elements() {
        if wml.is(child, "pPr") {
            continue;
        }
        if wml.is(child, "r") {
            // Ruby text and similar: runs whose text sits in inner runs.
            if child.find_descendant(|el| wml.is(el, "r")).is_some() {
                return Some("contains nested runs".to_string());
            }
            continue;
        }
        if child.find_descendant(|el| wml.is(el, "r")).is_some() {
            return Some(format!("contains runs inside {}", child.name));
        }
    }

    None
}
