//! Paragraph and run-level types.

use super::style::RunStyle;
use super::wml::{Wml, XML_SPACE};
use super::xml::{Element, Node};

/// Paragraph-mark revision markers that must not leak into run properties.
const MARK_ONLY_PROPS: &[&str] = &["ins", "del", "moveFrom", "moveTo", "rPrChange"];

/// A `w:p` element viewed as properties plus ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    /// Attributes of the `w:p` element (revision ids, para ids)
    pub attributes: Vec<(String, String)>,

    /// Paragraph properties (`w:pPr`): style, spacing, indentation, alignment
    pub properties: Option<Element>,

    /// Runs and other inline content in order
    pub children: Vec<ParagraphChild>,
}

/// Inline content directly under a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParagraphChild {
    /// A text run
    Run(Run),
    /// Anything else (bookmarks, proofing marks, comments), carried verbatim
    Other(Node),
}

/// A span of content sharing one formatting descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// Attributes of the `w:r` element (revision ids)
    pub attributes: Vec<(String, String)>,

    /// Formatting descriptor
    pub style: RunStyle,

    /// Content items in order
    pub content: Vec<RunContent>,
}

/// Content of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContent {
    /// Literal text (`w:t`)
    Text(String),
    /// Tab character (`w:tab`), one character of paragraph text
    Tab(Element),
    /// Line break (`w:br`), one character of paragraph text
    Break(Element),
    /// Zero-width content: footnote/endnote references, drawings, symbols
    Anchor(Element),
}

impl RunContent {
    /// The paragraph text this item contributes.
    pub fn text(&self) -> &str {
        match self {
            RunContent::Text(text) => text,
            RunContent::Tab(_) => "\t",
            RunContent::Break(_) => "\n",
            RunContent::Anchor(_) => "",
        }
    }

    /// Whether the item contributes characters to the paragraph text.
    pub fn is_textual(&self) -> bool {
        !matches!(self, RunContent::Anchor(_))
    }
}

impl Run {
    /// Create an empty run with a style.
    pub fn new(style: RunStyle) -> Self {
        Self {
            attributes: Vec::new(),
            style,
            content: Vec::new(),
        }
    }

    /// Create an empty run copying another run's attributes and style.
    pub fn like(other: &Run) -> Self {
        Self {
            attributes: other.attributes.clone(),
            style: other.style.clone(),
            content: Vec::new(),
        }
    }

    /// Builder-style text append.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(RunContent::Text(text.into()));
        self
    }

    /// Read a `w:r` element.
    pub fn from_element(el: &Element, wml: &Wml) -> Self {
        let mut style = RunStyle::none();
        let mut content = Vec::new();

        for child in el.elements() {
            if wml.is(child, "rPr") {
                style = RunStyle::from_properties(child.clone());
            } else if wml.is(child, "t") {
                content.push(RunContent::Text(child.text_content()));
            } else if wml.is(child, "tab") {
                content.push(RunContent::Tab(child.clone()));
            } else if wml.is(child, "br") {
                content.push(RunContent::Break(child.clone()));
            } else {
                content.push(RunContent::Anchor(child.clone()));
            }
        }

        Self {
            attributes: el.attributes.clone(),
            style,
            content,
        }
    }

    /// Text of the run.
    pub fn text(&self) -> String {
        self.content.iter().map(RunContent::text).collect()
    }

    /// Whether the run has text, tabs or breaks.
    pub fn is_textual(&self) -> bool {
        self.content.iter().any(RunContent::is_textual)
    }

    /// Build the `w:r` element.
    pub fn to_element(&self, wml: &Wml) -> Element {
        let mut el = Element::new(wml.name("r"));
        el.attributes = self.attributes.clone();
        if let Some(props) = self.style.properties() {
            el.children.push(Node::Element(props.clone()));
        }
        for item in &self.content {
            let child = match item {
                RunContent::Text(text) => text_element(text, wml),
                RunContent::Tab(tab) => tab.clone(),
                RunContent::Break(br) => br.clone(),
                RunContent::Anchor(anchor) => anchor.clone(),
            };
            el.children.push(Node::Element(child));
        }
        el
    }
}

/// Build a `w:t` element, preserving edge whitespace.
pub fn text_element(text: &str, wml: &Wml) -> Element {
    let mut t = Element::new(wml.name("t"));
    let edge_space = |c: char| matches!(c, ' ' | '\t' | '\n');
    if text.starts_with(edge_space) || text.ends_with(edge_space) {
        t.set_attribute(XML_SPACE, "preserve");
    }
    if !text.is_empty() {
        t.children.push(Node::Text(text.to_string()));
    }
    t
}

impl Paragraph {
    /// Create an empty paragraph.
    pub fn new() -> Self {
        Self {
            attributes: Vec::new(),
            properties: None,
            children: Vec::new(),
        }
    }

    /// Read a `w:p` element.
    pub fn from_element(el: &Element, wml: &Wml) -> Self {
        let mut properties = None;
        let mut children = Vec::new();

        for node in &el.children {
            match node {
                Node::Element(child) if wml.is(child, "pPr") && properties.is_none() => {
                    properties = Some(child.clone());
                }
                Node::Element(child) if wml.is(child, "r") => {
                    children.push(ParagraphChild::Run(Run::from_element(child, wml)));
                }
                // Stray whitespace between children is not content.
                Node::Text(text) if text.trim().is_empty() => {}
                other => children.push(ParagraphChild::Other(other.clone())),
            }
        }

        Self {
            attributes: el.attributes.clone(),
            properties,
            children,
        }
    }

    /// Add a run.
    pub fn add_run(&mut self, run: Run) {
        self.children.push(ParagraphChild::Run(run));
    }

    /// Iterate over direct runs.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.children.iter().filter_map(|child| match child {
            ParagraphChild::Run(run) => Some(run),
            ParagraphChild::Other(_) => None,
        })
    }

    /// Plain text of the direct runs (tabs as `\t`, breaks as `\n`).
    pub fn text(&self) -> String {
        self.runs().map(Run::text).collect()
    }

    /// Paragraph-mark run properties (`w:pPr/w:rPr`) usable as a run style.
    pub fn default_run_style(&self, wml: &Wml) -> Option<RunStyle> {
        let rpr = wml.child(self.properties.as_ref()?, "rPr")?;
        let mut rpr = rpr.clone();
        rpr.children.retain(|node| match node {
            Node::Element(el) => !MARK_ONLY_PROPS.iter().any(|name| wml.is(el, name)),
            _ => true,
        });
        Some(RunStyle::from_properties(rpr))
    }

    /// Build the `w:p` element with properties first.
    pub fn to_element(&self, wml: &Wml) -> Element {
        let mut el = Element::new(wml.name("p"));
        el.attributes = self.attributes.clone();
        if let Some(ref props) = self.properties {
            el.children.push(Node::Element(props.clone()));
        }
        for child in &self.children {
            el.children.push(match child {
                ParagraphChild::Run(run) => Node::Element(run.to_element(wml)),
                ParagraphChild::Other(node) => node.clone(),
            });
        }
        el
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Text of every run under an element, including runs nested in
/// hyperlinks, fields and content controls, in document order.
pub fn full_text(el: &Element, wml: &Wml) -> String {
    let mut out = String::new();
    collect_run_text(el, wml, &mut out);
    out
}

fn collect_run_text(el: &Element, wml: &Wml, out: &mut String) {
    for child in el.elements() {
        if wml.is(child, "r") {
            for item in child.elements() {
                if wml.is(item, "t") {
                    out.push_str(&item.text_content());
                } else if wml.is(item, "tab") {
                    out.push('\t');
                } else if wml.is(item, "br") {
                    out.push('\n');
                }
            }
        }
        collect_run_text(child, wml, out);
    }
}
