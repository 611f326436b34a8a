//! Owned XML element tree.
//!
//! Parsed gateway replies outlive the text they came from (they are cached),
//! so the parser copies everything it needs into this structure.

use serde::Serialize;

/// One element of a parsed reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Trimmed text content directly under this element, if non-empty.
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Attribute lookup; gateway attribute names vary in case.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// True when the element has no children, no text and no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.is_none() && self.attributes.is_empty()
    }

    /// Depth-first iterator over this element and all of its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First element (self included) with the given tag name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.descendants().find(|el| el.name == name)
    }

    /// All elements (self included) with the given tag name, in document order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.descendants().filter(move |el| el.name == name)
    }

    /// Text of the first element with the given tag name.
    #[must_use]
    pub fn text_of(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(|el| el.text.as_deref())
    }
}

/// Iterator returned by [`XmlElement::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> XmlElement {
        XmlElement::new("ENVELOPE")
            .with_child(
                XmlElement::new("BODY")
                    .with_child(XmlElement::new("NAME").with_text("first"))
                    .with_child(XmlElement::new("LEDGER").with_attribute("NAME", "Cash")),
            )
            .with_child(XmlElement::new("NAME").with_text("second"))
    }

    #[test]
    fn descendants_are_in_document_order() {
        let tree = sample();
        let names: Vec<_> = tree.descendants().map(|el| el.name.as_str()).collect();
        assert_eq!(names, ["ENVELOPE", "BODY", "NAME", "LEDGER", "NAME"]);
    }

    #[test]
    fn find_returns_first_match() {
        let tree = sample();
        assert_eq!(tree.text_of("NAME"), Some("first"));
        assert_eq!(tree.find_all("NAME").count(), 2);
        assert!(tree.find("VOUCHER").is_none());
    }

    #[test]
    fn attribute_lookup_ignores_case() {
        let tree = sample();
        let ledger = tree.find("LEDGER").expect("ledger element");
        assert_eq!(ledger.attribute("name"), Some("Cash"));
    }

    #[test]
    fn empty_element_detection() {
        assert!(XmlElement::new("ENVELOPE").is_empty());
        assert!(!XmlElement::new("ENVELOPE").with_text("x").is_empty());
    }
}
