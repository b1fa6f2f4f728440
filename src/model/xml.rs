//! Owned XML tree for package parts.
//!
//! Parts are small enough to hold in memory, and rewriting runs needs
//! random access to siblings, so each part is parsed into a plain tree
//! instead of being streamed. Anything the refiner does not understand
//! (comments, processing instructions, unknown elements) is carried
//! through untouched.

use std::borrow::Cow;

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};

/// A node inside an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Child element
    Element(Element),
    /// Character data (unescaped)
    Text(String),
    /// Comment body as it appeared in the source
    Comment(String),
    /// CDATA section body
    CData(String),
    /// Processing instruction body (without `<?` and `?>`)
    Instruction(String),
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name, e.g. `w:r`
    pub name: String,
    /// Attributes in source order (values unescaped)
    pub attributes: Vec<(String, String)>,
    /// Child nodes in source order
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element without attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Builder-style child element append.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Builder-style text append.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Get an attribute value by qualified name.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attribute(&mut self, key: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Local part of the name (`r` for `w:r`).
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Prefix part of the name, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Iterate over child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Iterate mutably over child elements.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.name == name)
    }

    /// First child element with the given name, mutably.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|el| el.name == name)
    }

    /// Depth-first search over all descendants (not including `self`).
    pub fn find_descendant<F>(&self, pred: F) -> Option<&Element>
    where
        F: Fn(&Element) -> bool + Copy,
    {
        for child in self.elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated character data of this element and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Serialize this element (and its subtree) into `out`.
    pub fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            write_node(child, out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    /// Serialize this element to a string.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = utf8(start.name().as_ref())?.to_string();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = utf8(attr.key.as_ref())?.to_string();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            Node::Text(text) | Node::CData(text) => out.push_str(text),
            Node::Element(inner) => collect_text(inner, out),
            _ => {}
        }
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(el) => el.write_to(out),
        Node::Text(text) => out.push_str(&partial_escape(text.as_str())),
        Node::Comment(body) => {
            out.push_str("<!--");
            out.push_str(body);
            out.push_str("-->");
        }
        Node::CData(body) => {
            out.push_str("<![CDATA[");
            out.push_str(body);
            out.push_str("]]>");
        }
        Node::Instruction(body) => {
            out.push_str("<?");
            out.push_str(body);
            out.push_str("?>");
        }
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::Xml(format!("invalid UTF-8 in markup: {}", e)))
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// A parsed XML part: optional declaration, prolog nodes and the root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    /// Declaration body, e.g. `xml version="1.0" encoding="UTF-8" standalone="yes"`
    pub declaration: Option<String>,
    /// Comments and processing instructions before the root element
    pub prolog: Vec<Node>,
    /// Root element
    pub root: Element,
}

impl XmlDocument {
    /// Parse a part from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = decode_utf8(data)?;
        Self::parse_str(&text)
    }

    /// Parse a part from a string.
    pub fn parse_str(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);

        let mut declaration = None;
        let mut prolog = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event()?;
            let node = match event {
                Event::Decl(decl) => {
                    declaration = Some(lossy(&decl));
                    continue;
                }
                Event::Start(start) => {
                    stack.push(Element::from_start(&start)?);
                    continue;
                }
                Event::End(_) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| Error::Xml("unbalanced end tag".to_string()))?;
                    Node::Element(el)
                }
                Event::Empty(start) => Node::Element(Element::from_start(&start)?),
                Event::Text(text) => Node::Text(text.unescape()?.into_owned()),
                Event::CData(data) => Node::CData(lossy(&data)),
                Event::Comment(body) => Node::Comment(lossy(&body)),
                Event::PI(body) => Node::Instruction(lossy(&body)),
                Event::Eof => break,
                _ => continue,
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => match node {
                    Node::Element(el) => {
                        if root.is_some() {
                            return Err(Error::Xml("multiple root elements".to_string()));
                        }
                        root = Some(el);
                    }
                    // Whitespace between prolog items carries no content.
                    Node::Text(ref text) if text.trim().is_empty() => {}
                    Node::Text(_) => {
                        return Err(Error::Xml("text outside the root element".to_string()))
                    }
                    other if root.is_none() => prolog.push(other),
                    _ => {}
                },
            }
        }

        if !stack.is_empty() {
            return Err(Error::Xml("unexpected end of document".to_string()));
        }
        let root = root.ok_or_else(|| Error::Xml("document has no root element".to_string()))?;

        Ok(Self {
            declaration,
            prolog,
            root,
        })
    }

    /// Serialize the part back to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        if let Some(ref decl) = self.declaration {
            out.push_str("<?");
            out.push_str(decl);
            out.push_str("?>\r\n");
        }
        for node in &self.prolog {
            write_node(node, &mut out);
        }
        self.root.write_to(&mut out);
        out.into_bytes()
    }
}

fn decode_utf8(data: &[u8]) -> Result<Cow<'_, str>> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    match std::str::from_utf8(data) {
        Ok(text) => Ok(Cow::Borrowed(text)),
        Err(e) => Err(Error::Xml(format!("part is not UTF-8: {}", e))),
    }
}
