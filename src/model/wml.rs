//! WordprocessingML element names.

use super::xml::Element;

/// WordprocessingML main namespace.
pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// XML namespace (for `xml:space`).
pub const XML_SPACE: &str = "xml:space";

/// Resolves WordprocessingML names against the prefix a part actually uses.
///
/// Word always writes `w:`, but other producers are free to bind the
/// namespace to any prefix (or make it the default namespace).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wml {
    prefix: String,
}

impl Wml {
    /// Create a resolver for an explicit prefix (empty for the default namespace).
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Find the prefix bound to the WordprocessingML namespace on a part's root.
    pub fn from_root(root: &Element) -> Self {
        for (key, value) in &root.attributes {
            if value != W_NS {
                continue;
            }
            if let Some(prefix) = key.strip_prefix("xmlns:") {
                return Self::with_prefix(prefix);
            }
            if key == "xmlns" {
                return Self::with_prefix("");
            }
        }
        Self::default()
    }

    /// The bound prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Qualified name for a local WordprocessingML name.
    pub fn name(&self, local: &str) -> String {
        if self.prefix.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", self.prefix, local)
        }
    }

    /// Whether an element is the WordprocessingML element `local`.
    pub fn is(&self, el: &Element, local: &str) -> bool {
        el.local_name() == local && el.prefix().unwrap_or("") == self.prefix
    }

    /// First child element named `local`.
    pub fn child<'a>(&self, el: &'a Element, local: &str) -> Option<&'a Element> {
        el.elements().find(|child| self.is(child, local))
    }

    /// `w:val` attribute of a child element named `local`.
    pub fn child_val<'a>(&self, el: &'a Element, local: &str) -> Option<&'a str> {
        self.child(el, local)
            .and_then(|child| child.attribute(&self.name("val")))
    }
}

impl Default for Wml {
    fn default() -> Self {
        Self::with_prefix("w")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_root_prefix() {
        let root = Element::new("x:document").with_attribute("xmlns:x", W_NS);
        let wml = Wml::from_root(&root);
        assert_eq!(wml.prefix(), "x");
        assert_eq!(wml.name("p"), "x:p");
        assert!(wml.is(&Element::new("x:p"), "p"));
        assert!(!wml.is(&Element::new("w:p"), "p"));
    }

    #[test]
    fn test_default_namespace() {
        let root = Element::new("document").with_attribute("xmlns", W_NS);
        let wml = Wml::from_root(&root);
        assert_eq!(wml.name("r"), "r");
        assert!(wml.is(&Element::new("r"), "r"));
    }

    #[test]
    fn test_child_val() {
        let wml = Wml::default();
        let rpr = Element::new("w:rPr").with_child(Element::new("w:sz").with_attribute("w:val", "24"));
        assert_eq!(wml.child_val(&rpr, "sz"), Some("24"));
        assert_eq!(wml.child_val(&rpr, "color"), None);
    }
}
