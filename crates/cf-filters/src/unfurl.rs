//! Drops the URL text of a message that is only an unfurled link.

use cf_fragment::{Element, Fragment, Node};

use crate::filter::Filter;

/// Removes the typed URL when a message is just a link and its preview.
///
/// A message consisting of a URL followed by the preview attachment for
/// that URL shows the preview alone. Any other text keeps the message as
/// typed.
#[derive(Debug, Clone)]
pub struct RemoveSoloUnfurledLinkText {
    content_type: String,
}

impl RemoveSoloUnfurledLinkText {
    /// Create a filter matching previews with the given content type.
    #[must_use]
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
        }
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

impl Filter for RemoveSoloUnfurledLinkText {
    fn name(&self) -> &str {
        "remove-solo-unfurled-link-text"
    }

    fn is_applicable(&self, fragment: &Fragment) -> bool {
        let attachments = fragment.attachments();
        let [attachment] = attachments.as_slice() else {
            return false;
        };
        if attachment.content_type() != Some(self.content_type.as_str()) {
            return false;
        }
        let Some(href) = attachment.attr("href") else {
            return false;
        };

        let text = fragment.to_plain_text();
        let text = text.trim();
        !text.is_empty() && normalize_url(text) == normalize_url(href)
    }

    fn apply(&self, fragment: &Fragment) -> Fragment {
        Fragment::new(strip_text(fragment.nodes()))
    }
}

/// Copy nodes without their non-blank text, dropping links left empty.
fn strip_text(nodes: &[Node]) -> Vec<Node> {
    nodes
        .iter()
        .filter_map(|node| match node {
            Node::Text(text) if !text.trim().is_empty() => None,
            Node::Element(element) => {
                let children = strip_text(&element.children);
                if element.tag == "a" && children.is_empty() {
                    return None;
                }
                Some(Node::Element(Element {
                    tag: element.tag.clone(),
                    attrs: element.attrs.clone(),
                    children,
                }))
            }
            other => Some(other.clone()),
        })
        .collect()
}

/// Comparable form of a URL.
///
/// Lowercased, without scheme, `www.`, query, fragment or trailing slash.
/// `x.com` compares equal to `twitter.com`.
fn normalize_url(url: &str) -> String {
    let url = url.trim().to_lowercase();
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(&url);
    let url = url.strip_prefix("www.").unwrap_or(url);
    let url = url.split(['?', '#']).next().unwrap_or_default();
    let url = url.trim_end_matches('/');

    let (host, path) = url.split_at(url.find('/').unwrap_or(url.len()));
    let host = if host == "x.com" { "twitter.com" } else { host };
    format!("{host}{path}")
}
