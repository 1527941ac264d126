//! HTML fragment model for chat message bodies.
//!
//! A message body is a small HTML fragment: text, inline and block
//! elements, and embedded attachments (mentions, link previews, uploaded
//! files). [`Fragment`] is an owned tree of [`Node`]s that can be parsed,
//! inspected, rebuilt by filters and serialized back to HTML.
//!
//! Attachments are opaque: the parser records their start-tag attributes
//! and the exact source markup, and the serializer writes that markup back
//! byte for byte.
//!
//! # Example
//!
//! ```
//! use cf_fragment::Fragment;
//!
//! let fragment = Fragment::parse("<div>Hello<br>**world**</div>").unwrap();
//! assert_eq!(fragment.to_plain_text(), "Hello\n**world**");
//! assert_eq!(fragment.to_html(), "<div>Hello<br>**world**</div>");
//! ```

mod entities;
mod error;
mod node;
mod parser;
mod serializer;
mod text;

use std::fmt;

pub use error::FragmentError;
pub use node::{Attachment, Element, Node};
pub use parser::{DEFAULT_ATTACHMENT_TAG, FragmentParser};
pub use serializer::{escape_html, escape_text};
pub use text::AttachmentText;

/// Parsed HTML fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    /// Create a fragment from top-level nodes.
    #[must_use]
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Parse markup using the default attachment tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the markup cannot be tokenized.
    pub fn parse(html: &str) -> Result<Self, FragmentError> {
        FragmentParser::new().parse(html)
    }

    /// Top-level nodes.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Consume the fragment, returning its top-level nodes.
    #[must_use]
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// True when the fragment has no attachments and no visible text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.has_attachments() && self.to_plain_text().trim().is_empty()
    }

    /// Whether any attachment appears anywhere in the tree.
    #[must_use]
    pub fn has_attachments(&self) -> bool {
        fn any(nodes: &[Node]) -> bool {
            nodes.iter().any(|node| match node {
                Node::Attachment(_) => true,
                Node::Element(element) => any(&element.children),
                Node::Text(_) => false,
            })
        }
        any(&self.nodes)
    }

    /// All attachments in document order.
    #[must_use]
    pub fn attachments(&self) -> Vec<&Attachment> {
        fn collect<'a>(nodes: &'a [Node], out: &mut Vec<&'a Attachment>) {
            for node in nodes {
                match node {
                    Node::Attachment(attachment) => out.push(attachment),
                    Node::Element(element) => collect(&element.children, out),
                    Node::Text(_) => {}
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.nodes, &mut out);
        out
    }

    /// Serialize to HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        serializer::serialize_nodes(&self.nodes, &mut out);
        out
    }

    /// Extract plain text, omitting attachments.
    #[must_use]
    pub fn to_plain_text(&self) -> String {
        text::extract(&self.nodes, AttachmentText::Omit)
    }

    /// Extract plain text with explicit attachment handling.
    #[must_use]
    pub fn to_plain_text_with(&self, attachments: AttachmentText<'_>) -> String {
        text::extract(&self.nodes, attachments)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

impl From<Vec<Node>> for Fragment {
    fn from(nodes: Vec<Node>) -> Self {
        Self::new(nodes)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const MENTION: &str = r#"<action-text-attachment sgid="BAh7" content-type="application/vnd.campfire.mention"><img src="/avatar.png"> David</action-text-attachment>"#;

    #[test]
    fn test_round_trip_preserves_markup() {
        let html = format!("<div>Hey {MENTION}, look <strong>here</strong></div>");
        let fragment = Fragment::parse(&html).unwrap();
        assert_eq!(fragment.to_html(), html);
    }

    #[test]
    fn test_round_trip_normalizes_entities() {
        let fragment = Fragment::parse("<div>Tom &amp; Jerry &nbsp;</div>").unwrap();
        assert_eq!(fragment.to_html(), "<div>Tom &amp; Jerry \u{00a0}</div>");
    }

    #[test]
    fn test_has_attachments_nested() {
        let fragment = Fragment::parse(&format!("<div><p>{MENTION}</p></div>")).unwrap();
        assert!(fragment.has_attachments());
        assert_eq!(fragment.attachments().len(), 1);
        assert_eq!(
            fragment.attachments()[0].content_type(),
            Some("application/vnd.campfire.mention")
        );
    }

    #[test]
    fn test_no_attachments() {
        let fragment = Fragment::parse("<div>**bold**</div>").unwrap();
        assert!(!fragment.has_attachments());
        assert!(fragment.attachments().is_empty());
    }

    #[test]
    fn test_is_empty() {
        assert!(Fragment::parse("").unwrap().is_empty());
        assert!(Fragment::parse("<div> <br></div>").unwrap().is_empty());
        assert!(!Fragment::parse("<div>hi</div>").unwrap().is_empty());
        assert!(!Fragment::parse(MENTION).unwrap().is_empty());
    }

    #[test]
    fn test_display_matches_to_html() {
        let fragment = Fragment::parse("<p>x</p>").unwrap();
        assert_eq!(fragment.to_string(), "<p>x</p>");
    }

    #[test]
    fn test_build_from_nodes() {
        let fragment = Fragment::from(vec![
            Element::new("p")
                .with_children(vec![Node::text("a & b")])
                .into(),
        ]);
        assert_eq!(fragment.to_html(), "<p>a &amp; b</p>");
    }
}
