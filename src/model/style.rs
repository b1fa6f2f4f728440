//! Run formatting descriptors and the amendment marker.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::wml::Wml;
use super::xml::{Element, Node};

/// Schema order of `w:rPr` children (CT_RPr sequence).
const RPR_ORDER: &[&str] = &[
    "rStyle",
    "rFonts",
    "b",
    "bCs",
    "i",
    "iCs",
    "caps",
    "smallCaps",
    "strike",
    "dstrike",
    "outline",
    "shadow",
    "emboss",
    "imprint",
    "noProof",
    "snapToGrid",
    "vanish",
    "webHidden",
    "color",
    "spacing",
    "w",
    "kern",
    "position",
    "sz",
    "szCs",
    "highlight",
    "u",
    "effect",
    "bdr",
    "shd",
    "fitText",
    "vertAlign",
    "rtl",
    "cs",
    "em",
    "lang",
    "eastAsianLayout",
    "specVanish",
    "oMath",
    "rPrChange",
];

/// The inline formatting of a run: its `w:rPr` element.
///
/// The descriptor is immutable once read. Fragments split out of one run
/// share the same allocation; only the amendment marker produces a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStyle {
    props: Option<Arc<Element>>,
}

impl RunStyle {
    /// A run without explicit properties.
    pub fn none() -> Self {
        Self::default()
    }

    /// Wrap a `w:rPr` element.
    pub fn from_properties(props: Element) -> Self {
        Self {
            props: Some(Arc::new(props)),
        }
    }

    /// The underlying `w:rPr` element, if any.
    pub fn properties(&self) -> Option<&Element> {
        self.props.as_deref()
    }

    /// Check if the run carries no explicit properties.
    pub fn is_empty(&self) -> bool {
        self.props.is_none()
    }

    /// Whether two styles share one descriptor allocation.
    pub fn shares_descriptor(&self, other: &RunStyle) -> bool {
        match (&self.props, &other.props) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Font family (`w:rFonts/@w:ascii`).
    pub fn font_family<'a>(&'a self, wml: &Wml) -> Option<&'a str> {
        self.properties()
            .and_then(|rpr| wml.child(rpr, "rFonts"))
            .and_then(|fonts| fonts.attribute(&wml.name("ascii")))
    }

    /// Font size in points (`w:sz` is in half-points).
    pub fn font_size(&self, wml: &Wml) -> Option<f32> {
        self.properties()
            .and_then(|rpr| wml.child_val(rpr, "sz"))
            .and_then(|v| v.parse::<f32>().ok())
            .map(|half_points| half_points / 2.0)
    }

    /// Bold toggle.
    pub fn bold(&self, wml: &Wml) -> bool {
        self.toggle(wml, "b")
    }

    /// Italic toggle.
    pub fn italic(&self, wml: &Wml) -> bool {
        self.toggle(wml, "i")
    }

    /// Underline (any style other than `none`).
    pub fn underline(&self, wml: &Wml) -> bool {
        let Some(rpr) = self.properties() else {
            return false;
        };
        match wml.child(rpr, "u") {
            Some(u) => u.attribute(&wml.name("val")) != Some("none"),
            None => false,
        }
    }

    /// Text color (`w:color/@w:val`).
    pub fn color<'a>(&'a self, wml: &Wml) -> Option<&'a str> {
        self.properties().and_then(|rpr| wml.child_val(rpr, "color"))
    }

    /// Highlight color (`w:highlight/@w:val`).
    pub fn highlight<'a>(&'a self, wml: &Wml) -> Option<&'a str> {
        self.properties()
            .and_then(|rpr| wml.child_val(rpr, "highlight"))
    }

    /// Copy of this style with the amendment marker layered on top.
    pub fn with_marker(&self, marker: &AmendmentMarker, wml: &Wml) -> RunStyle {
        let mut rpr = match self.properties() {
            Some(props) => props.clone(),
            None => Element::new(wml.name("rPr")),
        };
        let val = wml.name("val");

        if marker.bold {
            if wml.child(&rpr, "b").is_some() {
                if let Some(b) = rpr.elements_mut().find(|el| wml.is(el, "b")) {
                    b.remove_attribute(&val);
                }
            } else {
                insert_ordered(&mut rpr, Element::new(wml.name("b")), wml);
            }
        }

        if let Some(ref color) = marker.highlight {
            if wml.child(&rpr, "highlight").is_some() {
                if let Some(highlight) = rpr.elements_mut().find(|el| wml.is(el, "highlight")) {
                    highlight.set_attribute(val.as_str(), color.as_str());
                }
            } else {
                let highlight =
                    Element::new(wml.name("highlight")).with_attribute(val.as_str(), color.as_str());
                insert_ordered(&mut rpr, highlight, wml);
            }
        }

        RunStyle::from_properties(rpr)
    }

    fn toggle(&self, wml: &Wml, local: &str) -> bool {
        let Some(rpr) = self.properties() else {
            return false;
        };
        match wml.child(rpr, local) {
            Some(el) => !matches!(
                el.attribute(&wml.name("val")),
                Some("0") | Some("false") | Some("off")
            ),
            None => false,
        }
    }
}

/// Insert a property into `w:rPr` at its schema position.
fn insert_ordered(rpr: &mut Element, prop: Element, wml: &Wml) {
    let rank = |el: &Element| {
        if el.prefix().unwrap_or("") != wml.prefix() {
            return RPR_ORDER.len();
        }
        RPR_ORDER
            .iter()
            .position(|name| *name == el.local_name())
            .unwrap_or(RPR_ORDER.len())
    };
    let new_rank = rank(&prop);

    let pos = rpr
        .children
        .iter()
        .position(|node| matches!(node, Node::Element(el) if rank(el) > new_rank))
        .unwrap_or(rpr.children.len());
    rpr.children.insert(pos, Node::Element(prop));
}

/// Formatting override applied to inserted or changed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendmentMarker {
    /// Force bold on marked runs
    pub bold: bool,

    /// Highlight color name (`w:highlight` value), or no highlight
    pub highlight: Option<String>,
}

impl AmendmentMarker {
    /// Create the default marker (bold + yellow highlight).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the highlight color.
    pub fn with_highlight(mut self, color: impl Into<String>) -> Self {
        self.highlight = Some(color.into());
        self
    }

    /// Disable the highlight.
    pub fn without_highlight(mut self) -> Self {
        self.highlight = None;
        self
    }

    /// Enable or disable forced bold.
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Whether a style carries this marker.
    pub fn is_applied(&self, style: &RunStyle, wml: &Wml) -> bool {
        if self.bold && !style.bold(wml) {
            return false;
        }
        match self.highlight {
            Some(ref color) => style.highlight(wml) == Some(color.as_str()),
            None => true,
        }
    }
}

impl Default for AmendmentMarker {
    fn default() -> Self {
        Self {
            bold: true,
            highlight: Some("yellow".to_string()),
        }
    }
}
