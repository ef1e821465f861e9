use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use quick_xml::escape::escape;
use serde::Serialize;

/// A node in a Panorama configuration or API response tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XmlNode {
    /// Element tag name.
    pub tag: String,
    /// XML attributes keyed by name.
    pub attributes: BTreeMap<String, String>,
    /// Child elements in document order.
    pub children: Vec<XmlNode>,
    /// Optional text content.
    pub text: Option<String>,
}

impl XmlNode {
    /// Create a new XML node with no attributes, children, or text.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Create an `<entry name="...">` node, the keyed container used for
    /// every named object in the configuration tree.
    pub fn entry(name: impl Into<String>) -> Self {
        Self::new("entry").with_attr("name", name)
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder-style text setter.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Return an attribute value by name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Return the first child with the provided tag.
    pub fn get_child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// Return all children with the provided tag.
    pub fn get_children(&self, tag: &str) -> Vec<&XmlNode> {
        self.children
            .iter()
            .filter(|child| child.tag == tag)
            .collect()
    }

    /// Return the `<entry>` child whose `name` attribute matches.
    pub fn find_entry(&self, name: &str) -> Option<&XmlNode> {
        self.children
            .iter()
            .find(|child| child.tag == "entry" && child.attr("name") == Some(name))
    }

    /// Collect the text of every `<member>` child, skipping empty ones.
    pub fn member_texts(&self) -> Vec<&str> {
        self.children
            .iter()
            .filter(|child| child.tag == "member")
            .filter_map(|child| child.text.as_deref())
            .collect()
    }

    /// Walk a nested child path and return terminal node text if found.
    pub fn get_text<'a>(&'a self, path: &[&str]) -> Option<&'a str> {
        let mut current = self;
        for segment in path {
            current = current.get_child(segment)?;
        }
        current.text.as_deref()
    }
}

impl Display for XmlNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (key, value) in &self.attributes {
            write!(f, " {}=\"{}\"", key, escape(value.as_str()))?;
        }

        if self.children.is_empty() && self.text.is_none() {
            return write!(f, "/>");
        }

        write!(f, ">")?;
        if let Some(text) = &self.text {
            write!(f, "{}", escape(text.as_str()))?;
        }
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::XmlNode;

    #[test]
    fn get_text_walks_nested_path() {
        let root = XmlNode::new("response").with_child(
            XmlNode::new("result").with_child(XmlNode::new("parent-dg").with_text("Branches")),
        );

        assert_eq!(root.get_text(&["result", "parent-dg"]), Some("Branches"));
        assert_eq!(root.get_text(&["result", "missing"]), None);
    }

    #[test]
    fn find_entry_matches_name_attribute() {
        let devices = XmlNode::new("devices")
            .with_child(XmlNode::entry("0001"))
            .with_child(XmlNode::entry("0002").with_child(XmlNode::new("variable")));

        let found = devices.find_entry("0002").expect("entry 0002");
        assert!(found.get_child("variable").is_some());
        assert!(devices.find_entry("0003").is_none());
    }

    #[test]
    fn display_escapes_text_and_attributes() {
        let node = XmlNode::entry("a&b").with_child(XmlNode::new("description").with_text("<x>"));
        assert_eq!(
            node.to_string(),
            r#"<entry name="a&amp;b"><description>&lt;x&gt;</description></entry>"#
        );
    }
}
