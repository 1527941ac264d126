//! Node types of a fragment tree.

use crate::serializer::escape_html;

/// HTML elements that never have children or an end tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Check whether a (lowercase) tag name is an HTML void element.
pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Node in a fragment tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Regular element with parsed children.
    Element(Element),
    /// Raw text content (unescaped).
    Text(String),
    /// Embedded object kept as its original markup.
    Attachment(Attachment),
}

impl Node {
    /// Create a text node.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Element payload, if this is an element node.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Text payload, if this is a text node.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Attachment payload, if this is an attachment node.
    #[must_use]
    pub fn as_attachment(&self) -> Option<&Attachment> {
        match self {
            Self::Attachment(attachment) => Some(attachment),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<Attachment> for Node {
    fn from(attachment: Attachment) -> Self {
        Self::Attachment(attachment)
    }
}

/// Element node: tag name, attributes in source order, child nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
    /// Child nodes.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Set children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Look up an attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        lookup(&self.attrs, name)
    }

    /// Whether this is a void element (`br`, `hr`, `img`, ...).
    #[must_use]
    pub fn is_void(&self) -> bool {
        is_void(&self.tag)
    }
}

/// Opaque embedded object (link preview, mention, ...).
///
/// The original markup is captured when the fragment is parsed and written
/// back unchanged. The subtree is never parsed into nodes; filters see the
/// start-tag attributes and the inner markup as a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    tag: String,
    attrs: Vec<(String, String)>,
    raw: String,
    inner_html: String,
}

impl Attachment {
    /// Create an attachment from its tag, start-tag attributes and source markup.
    #[must_use]
    pub fn new(tag: impl Into<String>, attrs: Vec<(String, String)>, raw: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs,
            raw: raw.into(),
            inner_html: String::new(),
        }
    }

    /// Build an attachment from parts, serializing its markup.
    #[must_use]
    pub fn from_parts(
        tag: impl Into<String>,
        attrs: Vec<(String, String)>,
        inner_html: impl Into<String>,
    ) -> Self {
        let tag = tag.into();
        let inner_html = inner_html.into();

        let mut raw = format!("<{tag}");
        for (key, value) in &attrs {
            raw.push_str(&format!(r#" {key}="{}""#, escape_html(value)));
        }
        raw.push('>');
        raw.push_str(&inner_html);
        raw.push_str(&format!("</{tag}>"));

        Self {
            tag,
            attrs,
            raw,
            inner_html,
        }
    }

    /// Set the markup between the start and end tags.
    #[must_use]
    pub fn with_inner_html(mut self, inner_html: impl Into<String>) -> Self {
        self.inner_html = inner_html.into();
        self
    }

    /// Tag name of the attachment element.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Start-tag attributes in source order.
    #[must_use]
    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// Look up a start-tag attribute by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        lookup(&self.attrs, name)
    }

    /// The `content-type` attribute.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.attr("content-type")
    }

    /// Original markup, start tag through end tag.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Markup between the start and end tags. Empty for `<tag/>`.
    #[must_use]
    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }
}

fn lookup<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}
