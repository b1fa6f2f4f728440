//! Story parts: the XML parts of a package that hold paragraphs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::paragraph::{full_text, Paragraph};
use super::wml::Wml;
use super::xml::{Element, Node, XmlDocument};
use crate::detect::{DOCUMENT_PART, ENDNOTES_PART, FOOTNOTES_PART};
use crate::error::{Error, Result};

/// Which story a part holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryKind {
    /// Main document body
    Body,
    /// Footnotes
    Footnotes,
    /// Endnotes
    Endnotes,
}

impl StoryKind {
    /// Package part name for this story.
    pub fn part_name(&self) -> &'static str {
        match self {
            StoryKind::Body => DOCUMENT_PART,
            StoryKind::Footnotes => FOOTNOTES_PART,
            StoryKind::Endnotes => ENDNOTES_PART,
        }
    }
}

impl std::fmt::Display for StoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.part_name())
    }
}

/// A parsed story part.
///
/// Paragraphs are addressed by their position in document order, which
/// includes paragraphs inside tables and text boxes.
#[derive(Debug, Clone)]
pub struct DocxDocument {
    kind: StoryKind,
    xml: XmlDocument,
    wml: Wml,
    modified: bool,
}

impl DocxDocument {
    /// Parse a story part.
    pub fn parse(kind: StoryKind, data: &[u8]) -> Result<Self> {
        let xml = XmlDocument::parse(data)
            .map_err(|e| Error::DocumentRead(format!("{}: {}", kind.part_name(), e)))?;
        let wml = Wml::from_root(&xml.root);

        if kind == StoryKind::Body && wml.child(&xml.root, "body").is_none() {
            return Err(Error::DocumentRead(format!(
                "{} has no body element",
                kind.part_name()
            )));
        }

        Ok(Self {
            kind,
            xml,
            wml,
            modified: false,
        })
    }

    /// The story this part holds.
    pub fn kind(&self) -> StoryKind {
        self.kind
    }

    /// Name resolver for this part.
    pub fn wml(&self) -> &Wml {
        &self.wml
    }

    /// Whether any paragraph has been replaced.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Paragraph elements in document order.
    pub fn paragraph_elements(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        if let Some(story) = self.story_root() {
            collect_paragraphs(story, &self.wml, &mut out);
        }
        out
    }

    /// Paragraph views in document order.
    pub fn paragraphs(&self) -> Vec<Paragraph> {
        self.paragraph_elements()
            .into_iter()
            .map(|el| Paragraph::from_element(el, &self.wml))
            .collect()
    }

    /// Number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraph_elements().len()
    }

    /// Text of every paragraph, including runs nested in hyperlinks and fields.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.paragraph_elements()
            .into_iter()
            .map(|el| full_text(el, &self.wml))
            .collect()
    }

    /// Plain text with paragraphs separated by blank lines.
    pub fn plain_text(&self) -> String {
        self.paragraph_texts().join("\n\n")
    }

    /// Replace paragraphs by index. Indices that do not exist are ignored.
    ///
    /// Returns the number of paragraphs replaced.
    pub fn replace_paragraphs(&mut self, replacements: HashMap<usize, Paragraph>) -> usize {
        if replacements.is_empty() {
            return 0;
        }

        let wml = self.wml.clone();
        let mut replacements = replacements;
        let mut index = 0;
        let mut replaced = 0;

        if let Some(story) = self.story_root_mut() {
            replace_in(story, &wml, &mut index, &mut replacements, &mut replaced);
        }
        if replaced > 0 {
            self.modified = true;
        }
        replaced
    }

    /// Serialize the part.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.xml.to_bytes()
    }

    fn story_root(&self) -> Option<&Element> {
        match self.kind {
            StoryKind::Body => self.wml.child(&self.xml.root, "body"),
            StoryKind::Footnotes | StoryKind::Endnotes => Some(&self.xml.root),
        }
    }

    fn story_root_mut(&mut self) -> Option<&mut Element> {
        let wml = &self.wml;
        match self.kind {
            StoryKind::Body => self.xml.root.elements_mut().find(|el| wml.is(el, "body")),
            StoryKind::Footnotes | StoryKind::Endnotes => Some(&mut self.xml.root),
        }
    }
}

fn collect_paragraphs<'a>(el: &'a Element, wml: &Wml, out: &mut Vec<&'a Element>) {
    for child in el.elements() {
        if wml.is(child, "p") {
            out.push(child);
        }
        collect_paragraphs(child, wml, out);
    }
}

fn replace_in(
    el: &mut Element,
    wml: &Wml,
    index: &mut usize,
    replacements: &mut HashMap<usize, Paragraph>,
    replaced: &mut usize,
) {
    for node in el.children.iter_mut() {
        let Node::Element(child) = node else {
            continue;
        };
        if wml.is(child, "p") {
            let here = *index;
            *index += 1;
            if let Some(paragraph) = replacements.remove(&here) {
                // Paragraphs nested in the old element keep their numbers.
                let mut nested = Vec::new();
                collect_paragraphs(child, wml, &mut nested);
                *index += nested.len();
                *child = paragraph.to_element(wml);
                *replaced += 1;
                continue;
            }
        }
        replace_in(child, wml, index, replacements, replaced);
    }
}
