//! Owned SVG element tree.
//!
//! The renderer builds one of these directly; untrusted SVG text can be read
//! into the same shape with [`Graphic::parse`].

use std::fmt;

use roxmltree::{Document, NodeType};
use texspeak_core::EnrichmentError;
use texspeak_markup::mathml::escape;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    /// In document order; names are unique.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Replaces the value in place if the attribute exists, else appends it.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First element named `name`, depth-first, starting with `self`.
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.elements().find_map(|e| e.find(name))
    }

    /// Every element named `name`, depth-first.
    pub fn find_all<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        if self.name == name {
            out.push(self);
        }
        for child in self.elements() {
            child.find_all(name, out);
        }
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(value));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(&escape(t)),
                Node::Element(e) => e.write_to(out),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// A rendered or parsed graphic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graphic {
    root: Element,
}

impl Graphic {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    /// Reads SVG (or any XML wrapping SVG) text. Comments, processing
    /// instructions and whitespace-only text are dropped.
    pub fn parse(text: &str) -> Result<Self, EnrichmentError> {
        let doc = Document::parse(text).map_err(|e| EnrichmentError::Malformed(e.to_string()))?;
        let root = doc.root_element();
        let mut element = convert(root, None);
        let uses_xlink = root
            .descendants()
            .any(|n| n.attributes().any(|a| a.namespace() == Some(XLINK_NAMESPACE)));
        if uses_xlink && element.attribute("xmlns:xlink").is_none() {
            element.set_attribute("xmlns:xlink", XLINK_NAMESPACE);
        }
        Ok(Self::new(element))
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::with_capacity(4096);
        self.root.write_to(&mut out);
        out
    }
}

impl fmt::Display for Graphic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_svg())
    }
}

fn convert(node: roxmltree::Node, parent_ns: Option<&str>) -> Element {
    let tag = node.tag_name();
    let mut element = Element::new(tag.name());
    if tag.namespace() != parent_ns {
        if let Some(ns) = tag.namespace() {
            element.set_attribute("xmlns", ns);
        }
    }
    for attr in node.attributes() {
        let name = match attr.namespace() {
            Some(XLINK_NAMESPACE) => format!("xlink:{}", attr.name()),
            Some(XML_NAMESPACE) => format!("xml:{}", attr.name()),
            _ => attr.name().to_string(),
        };
        element.set_attribute(name, attr.value());
    }
    for child in node.children() {
        match child.node_type() {
            NodeType::Element => {
                element
                    .children
                    .push(Node::Element(convert(child, tag.namespace())));
            }
            NodeType::Text => {
                if let Some(text) = child.text().filter(|t| !t.trim().is_empty()) {
                    element.children.push(Node::Text(text.to_string()));
                }
            }
            _ => {}
        }
    }
    element
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_serializes() {
        let svg = Element::new("svg")
            .attr("xmlns", SVG_NAMESPACE)
            .attr("width", "2ex")
            .child(Element::new("text").text("a < b"));
        assert_eq!(
            Graphic::new(svg).to_svg(),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="2ex"><text>a &lt; b</text></svg>"#
        );
    }

    #[test]
    fn set_attribute_replaces_in_place() {
        let mut e = Element::new("svg").attr("role", "presentation").attr("width", "1");
        e.set_attribute("role", "img");
        assert_eq!(
            e.attributes,
            vec![
                ("role".to_string(), "img".to_string()),
                ("width".to_string(), "1".to_string())
            ]
        );
    }

    #[test]
    fn parses_wrapped_svg() {
        let text = r##"<mjx-container display="true"><svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><!-- c --><use xlink:href="#g"/></svg></mjx-container>"##;
        let graphic = Graphic::parse(text).unwrap();
        let svg = graphic.root().find("svg").unwrap();
        assert_eq!(svg.attribute("xmlns"), Some(SVG_NAMESPACE));
        let used = svg.find("use").unwrap();
        assert_eq!(used.attribute("xlink:href"), Some("#g"));
        assert_eq!(svg.children.len(), 1);
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(matches!(
            Graphic::parse("<svg><g></svg>"),
            Err(EnrichmentError::Malformed(_))
        ));
    }
}
