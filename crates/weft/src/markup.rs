//! Owned markup trees.
//!
//! Documents are built from these trees, `foreach` templates are captured
//! back into them, and tests assert against their HTML serialization.
//! Attributes use an ordered map, so serialization preserves insertion
//! order.

use indexmap::IndexMap;

/// A node in a markup tree: an element, an escaped text leaf, or a raw
/// (unescaped) markup leaf. `Raw` is the payload of the `html` directive and
/// is emitted verbatim by the serializer — caller-trusted by design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Raw(String),
}

/// An element: tag, ordered attributes, and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: IndexMap<String, String>,
    pub children: Vec<Node>,
}

/// Build an element node.
pub fn el<const N: usize>(tag: &str, attrs: [(&str, &str); N], children: Vec<Node>) -> Node {
    Node::Element(Element {
        tag: tag.to_owned(),
        attrs: attrs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect(),
        children,
    })
}

/// Build a text node.
pub fn text(content: &str) -> Node {
    Node::Text(content.to_owned())
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}

/// Serialize a node to compact HTML. Attributes are emitted in insertion
/// order; childless elements self-close.
pub fn to_html(node: &Node) -> String {
    match node {
        Node::Text(s) => escape_text(s),
        Node::Raw(s) => s.clone(),
        Node::Element(element) => element_to_html(element),
    }
}

fn element_to_html(element: &Element) -> String {
    let mut out = String::new();
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    if element.children.is_empty() {
        out.push_str(" />");
        return out;
    }
    out.push('>');
    for child in &element.children {
        out.push_str(&to_html(child));
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
    out
}
