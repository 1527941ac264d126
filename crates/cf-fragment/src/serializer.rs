//! HTML serialization of fragment trees.

use crate::node::{Element, Node};

/// Write nodes as HTML markup.
pub(crate) fn serialize_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        serialize_node(node, out);
    }
}

fn serialize_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Attachment(attachment) => out.push_str(attachment.raw()),
        Node::Element(element) => serialize_element(element, out),
    }
}

fn serialize_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    for (key, value) in &element.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_html(value));
        out.push('"');
    }
    out.push('>');

    if element.is_void() {
        return;
    }

    serialize_nodes(&element.children, out);

    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

/// Escape text content (`&`, `<`, `>`).
#[must_use]
pub fn escape_text(text: &str) -> String {
    escape(text, false)
}

/// Escape text for use in attribute values or anywhere in markup
/// (`&`, `<`, `>`, `"`).
#[must_use]
pub fn escape_html(text: &str) -> String {
    escape(text, true)
}

fn escape(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            _ => result.push(ch),
        }
    }
    result
}
