//! Final HTML cleanup before a message is displayed.

use cf_fragment::{Attachment, Element, Fragment, FragmentParser, Node};

use crate::filter::Filter;

/// Placeholder element standing in for an attachment while sanitizing.
const SLOT_TAG: &str = "cf-slot";
const SLOT_ATTR: &str = "data-slot";

/// Tag an attachment is renamed to while its own markup is cleaned.
pub const ATTACHMENT_TAG: &str = "cf-attachment";

/// Attachment attributes kept by [`AmmoniaSanitizer`].
pub const ATTACHMENT_ATTRIBUTES: &[&str] = &[
    "sgid",
    "content-type",
    "url",
    "href",
    "filename",
    "filesize",
    "width",
    "height",
    "caption",
    "content",
    "presentation",
    "previewable",
];

/// Removes disallowed tags and attributes from serialized HTML.
pub trait Sanitizer: Send + Sync {
    /// Return a cleaned copy of `html`.
    fn clean(&self, html: &str) -> String;

    /// Clean the markup of one attachment, written as an
    /// [`ATTACHMENT_TAG`] element. Anything not returned as a single
    /// [`ATTACHMENT_TAG`] element drops the attachment.
    fn clean_attachment(&self, html: &str) -> String {
        self.clean(html)
    }
}

/// [`Sanitizer`] backed by `ammonia`.
///
/// Message markup gets the default ammonia policy without images, with
/// `target` allowed on links, `class` on code (fenced code language) and
/// `rel="noopener noreferrer"` forced on every link. Attachment markup gets
/// the default policy plus the attachment element and its known attributes;
/// images stay, for avatars and previews.
pub struct AmmoniaSanitizer {
    builder: ammonia::Builder<'static>,
    attachments: ammonia::Builder<'static>,
}

impl AmmoniaSanitizer {
    #[must_use]
    pub fn new() -> Self {
        let mut builder = ammonia::Builder::default();
        builder
            .rm_tags(&["img"])
            .add_tag_attributes("a", &["target"])
            .add_tag_attributes("code", &["class"])
            .link_rel(Some("noopener noreferrer"))
            .add_tags(&[SLOT_TAG])
            .add_tag_attributes(SLOT_TAG, &[SLOT_ATTR]);

        let mut attachments = ammonia::Builder::default();
        attachments
            .add_tag_attributes("img", &["class"])
            .link_rel(Some("noopener noreferrer"))
            .add_tags(&[ATTACHMENT_TAG])
            .add_tag_attributes(ATTACHMENT_TAG, ATTACHMENT_ATTRIBUTES);

        Self {
            builder,
            attachments,
        }
    }
}

impl Default for AmmoniaSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanitizer for AmmoniaSanitizer {
    fn clean(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }

    fn clean_attachment(&self, html: &str) -> String {
        self.attachments.clean(html).to_string()
    }
}

impl std::fmt::Debug for AmmoniaSanitizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmmoniaSanitizer").finish_non_exhaustive()
    }
}

/// Filter that sanitizes a fragment, keeping attachments atomic.
///
/// Each attachment is cleaned on its own with
/// [`Sanitizer::clean_attachment`], then swapped for a numbered placeholder
/// element while the message markup is cleaned, and put back afterwards.
/// An attachment whose markup was already clean is restored byte for byte.
/// Placeholders already present in the input are dropped.
#[derive(Debug)]
pub struct SanitizeTags<S = AmmoniaSanitizer> {
    sanitizer: S,
    parser: FragmentParser,
    attachment_parser: FragmentParser,
}

impl<S: Sanitizer> SanitizeTags<S> {
    #[must_use]
    pub fn new(sanitizer: S, parser: FragmentParser) -> Self {
        Self {
            sanitizer,
            parser,
            attachment_parser: FragmentParser::new().with_attachment_tag(ATTACHMENT_TAG),
        }
    }

    /// Sanitize a fragment.
    ///
    /// If the cleaned markup cannot be parsed the message degrades to its
    /// escaped plain text.
    #[must_use]
    pub fn strip(&self, fragment: &Fragment) -> Fragment {
        let mut attachments = Vec::new();
        let masked = Fragment::new(self.mask(fragment.nodes(), &mut attachments));
        let cleaned = self.sanitizer.clean(&masked.to_html());

        match self.parser.parse(&cleaned) {
            Ok(parsed) => {
                let mut slots: Vec<Option<Attachment>> =
                    attachments.into_iter().map(Some).collect();
                Fragment::new(unmask(parsed.into_nodes(), &mut slots))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sanitized HTML failed to parse");
                Fragment::new(vec![Node::text(fragment.to_plain_text())])
            }
        }
    }

    /// Sanitize one attachment. `None` drops it.
    fn clean_attachment(&self, attachment: &Attachment) -> Option<Attachment> {
        let renamed = Attachment::from_parts(
            ATTACHMENT_TAG,
            attachment.attrs().to_vec(),
            attachment.inner_html(),
        );
        let cleaned = self.sanitizer.clean_attachment(renamed.raw());

        let parsed = match self.attachment_parser.parse(&cleaned) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Sanitized attachment failed to parse");
                return None;
            }
        };
        let [Node::Attachment(clean)] = parsed.nodes() else {
            tracing::debug!(tag = attachment.tag(), "Dropping attachment rejected by sanitizer");
            return None;
        };

        if clean.attrs() == attachment.attrs() && clean.inner_html() == attachment.inner_html() {
            return Some(attachment.clone());
        }
        Some(Attachment::from_parts(
            attachment.tag(),
            clean.attrs().to_vec(),
            clean.inner_html(),
        ))
    }

    fn mask(&self, nodes: &[Node], attachments: &mut Vec<Attachment>) -> Vec<Node> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Attachment(attachment) => {
                    if let Some(clean) = self.clean_attachment(attachment) {
                        let slot = Element::new(SLOT_TAG)
                            .with_attr(SLOT_ATTR, attachments.len().to_string());
                        attachments.push(clean);
                        out.push(slot.into());
                    }
                }
                Node::Element(element) if element.tag == SLOT_TAG => {}
                Node::Element(element) => out.push(Node::Element(Element {
                    tag: element.tag.clone(),
                    attrs: element.attrs.clone(),
                    children: self.mask(&element.children, attachments),
                })),
                Node::Text(_) => out.push(node.clone()),
            }
        }
        out
    }
}

impl Default for SanitizeTags {
    fn default() -> Self {
        Self::new(AmmoniaSanitizer::new(), FragmentParser::new())
    }
}

impl<S: Sanitizer> Filter for SanitizeTags<S> {
    fn name(&self) -> &str {
        "sanitize-tags"
    }

    fn is_applicable(&self, _fragment: &Fragment) -> bool {
        true
    }

    fn apply(&self, fragment: &Fragment) -> Fragment {
        self.strip(fragment)
    }
}

fn unmask(nodes: Vec<Node>, slots: &mut [Option<Attachment>]) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(element) if element.tag == SLOT_TAG => {
                let attachment = element
                    .attr(SLOT_ATTR)
                    .and_then(|index| index.parse::<usize>().ok())
                    .and_then(|index| slots.get_mut(index))
                    .and_then(Option::take);
                if let Some(attachment) = attachment {
                    out.push(attachment.into());
                }
            }
            Node::Element(mut element) => {
                element.children = unmask(std::mem::take(&mut element.children), slots);
                out.push(Node::Element(element));
            }
            other => out.push(other),
        }
    }
    out
}
