//! HTML fragment parser built on the quick-xml reader.
//!
//! Chat bodies are HTML, not XML, so the reader is configured leniently:
//! end tag names are not checked, void elements never open a scope, and
//! attributes follow HTML rules. Attachment elements are not descended
//! into; their source markup is sliced out of the input as-is.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::entities::{decode_entity, normalize_entities};
use crate::error::FragmentError;
use crate::node::{Attachment, Element, Node, is_void};
use crate::Fragment;

/// Wrapper element giving the fragment a single root for the XML reader.
const ROOT_TAG: &str = "cf-root";

/// Tag used for embedded attachments unless configured otherwise.
pub const DEFAULT_ATTACHMENT_TAG: &str = "action-text-attachment";

/// Parses HTML markup into a [`Fragment`].
#[derive(Debug, Clone)]
pub struct FragmentParser {
    attachment_tag: String,
}

impl FragmentParser {
    /// Create a parser that treats `<action-text-attachment>` as opaque.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attachment_tag: DEFAULT_ATTACHMENT_TAG.to_owned(),
        }
    }

    /// Use a different tag name for opaque attachments.
    #[must_use]
    pub fn with_attachment_tag(mut self, tag: impl Into<String>) -> Self {
        self.attachment_tag = tag.into().to_ascii_lowercase();
        self
    }

    /// Tag name treated as an opaque attachment.
    #[must_use]
    pub fn attachment_tag(&self) -> &str {
        &self.attachment_tag
    }

    /// Parse HTML markup into a fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if the markup cannot be tokenized.
    pub fn parse(&self, html: &str) -> Result<Fragment, FragmentError> {
        let normalized = normalize_entities(html);
        let wrapped = format!("<{ROOT_TAG}>{normalized}</{ROOT_TAG}>");

        let mut reader = Reader::from_str(&wrapped);
        reader.config_mut().trim_text(false);
        reader.config_mut().check_end_names = false;

        // Consume the wrapper start tag.
        reader.read_event()?;

        let nodes = self.parse_children(&mut reader, &wrapped, ROOT_TAG)?;
        Ok(Fragment::new(nodes))
    }

    fn parse_children(
        &self,
        reader: &mut Reader<&[u8]>,
        source: &str,
        parent_tag: &str,
    ) -> Result<Vec<Node>, FragmentError> {
        let mut nodes = Vec::new();

        loop {
            let start = position(reader);
            match reader.read_event()? {
                Event::Start(e) => {
                    let tag = decode_tag(reader, e.name().as_ref());
                    let attrs = decode_attrs(reader, &e);
                    if tag == self.attachment_tag {
                        let span = reader.read_to_end(e.to_end().name())?;
                        let raw = source.get(start..position(reader)).unwrap_or_default();
                        let inner = usize::try_from(span.start)
                            .ok()
                            .zip(usize::try_from(span.end).ok())
                            .and_then(|(from, to)| source.get(from..to))
                            .unwrap_or_default();
                        nodes.push(Attachment::new(tag, attrs, raw).with_inner_html(inner).into());
                    } else if is_void(&tag) {
                        nodes.push(Element { tag, attrs, children: Vec::new() }.into());
                    } else {
                        let children = self.parse_children(reader, source, &tag)?;
                        nodes.push(Element { tag, attrs, children }.into());
                    }
                }
                Event::Empty(e) => {
                    let tag = decode_tag(reader, e.name().as_ref());
                    let attrs = decode_attrs(reader, &e);
                    if tag == self.attachment_tag {
                        let raw = source.get(start..position(reader)).unwrap_or_default();
                        nodes.push(Attachment::new(tag, attrs, raw).into());
                    } else {
                        nodes.push(Element { tag, attrs, children: Vec::new() }.into());
                    }
                }
                Event::Text(e) => {
                    let text = reader.decoder().decode(&e)?;
                    append_text(&mut nodes, &text);
                }
                Event::GeneralRef(e) => {
                    let entity = reader.decoder().decode(&e)?;
                    append_text(&mut nodes, &decode_entity(&entity));
                }
                Event::CData(e) => {
                    append_text(&mut nodes, &String::from_utf8_lossy(&e));
                }
                Event::End(e) => {
                    // Stray end tags (e.g. `</br>`) are ignored.
                    if decode_tag(reader, e.name().as_ref()) == parent_tag {
                        return Ok(nodes);
                    }
                }
                Event::Eof => return Ok(nodes),
                _ => {}
            }
        }
    }
}

impl Default for FragmentParser {
    fn default() -> Self {
        Self::new()
    }
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn decode_tag(reader: &Reader<&[u8]>, name: &[u8]) -> String {
    reader
        .decoder()
        .decode(name)
        .map_or_else(
            |_| String::from_utf8_lossy(name).into_owned(),
            std::borrow::Cow::into_owned,
        )
        .to_ascii_lowercase()
}

fn decode_attrs(reader: &Reader<&[u8]>, e: &BytesStart) -> Vec<(String, String)> {
    e.html_attributes()
        .flatten()
        .map(|attr| {
            let key = decode_tag(reader, attr.key.as_ref());
            let value = attr.unescape_value().map_or_else(
                |_| String::from_utf8_lossy(&attr.value).into_owned(),
                std::borrow::Cow::into_owned,
            );
            (key, value)
        })
        .collect()
}

/// Append text, merging with a preceding text node.
fn append_text(nodes: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(last)) = nodes.last_mut() {
        last.push_str(text);
    } else {
        nodes.push(Node::text(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Fragment {
        FragmentParser::new().parse(html).unwrap()
    }

    #[test]
    fn test_parse_simple_element() {
        let fragment = parse("<div>Hello</div>");
        let div = fragment.nodes()[0].as_element().unwrap();
        assert_eq!(div.tag, "div");
        assert_eq!(div.children, vec![Node::text("Hello")]);
    }

    #[test]
    fn test_parse_nested_elements() {
        let fragment = parse("<p><strong>Bold</strong> text</p>");
        let p = fragment.nodes()[0].as_element().unwrap();
        assert_eq!(p.children.len(), 2);
        assert_eq!(p.children[0].as_element().unwrap().tag, "strong");
        assert_eq!(p.children[1].as_text(), Some(" text"));
    }

    #[test]
    fn test_parse_top_level_text() {
        let fragment = parse("Just plain text here");
        assert_eq!(fragment.nodes(), &[Node::text("Just plain text here")]);
    }

    #[test]
    fn test_parse_void_elements_without_end_tag() {
        let fragment = parse("<div>one<br>two<br>three</div>");
        let div = fragment.nodes()[0].as_element().unwrap();
        assert_eq!(div.children.len(), 5);
        assert_eq!(div.children[4].as_text(), Some("three"));
    }

    #[test]
    fn test_parse_self_closing() {
        let fragment = parse("<p>Before<br />After</p>");
        let p = fragment.nodes()[0].as_element().unwrap();
        assert_eq!(p.children[1].as_element().unwrap().tag, "br");
        assert_eq!(p.children[2].as_text(), Some("After"));
    }

    #[test]
    fn test_parse_entities_merge_into_text() {
        let fragment = parse("<p>a &lt; b&nbsp;&amp; c</p>");
        let p = fragment.nodes()[0].as_element().unwrap();
        assert_eq!(p.children, vec![Node::text("a < b\u{00a0}& c")]);
    }

    #[test]
    fn test_parse_bare_ampersand() {
        let fragment = parse("Tom & Jerry");
        assert_eq!(fragment.nodes(), &[Node::text("Tom & Jerry")]);
    }

    #[test]
    fn test_parse_html_attributes() {
        let fragment = parse(r#"<img src=x onerror="alert('xss')" hidden>"#);
        let img = fragment.nodes()[0].as_element().unwrap();
        assert_eq!(img.attr("src"), Some("x"));
        assert_eq!(img.attr("onerror"), Some("alert('xss')"));
        assert_eq!(img.attr("hidden"), Some(""));
    }

    #[test]
    fn test_parse_uppercase_tags() {
        let fragment = parse("<DIV>x</DIV>");
        assert_eq!(fragment.nodes()[0].as_element().unwrap().tag, "div");
    }

    #[test]
    fn test_parse_attachment_is_opaque() {
        let attachment = r#"<action-text-attachment sgid="abc" content-type="application/vnd.campfire.mention" content="&lt;span&gt;David&lt;/span&gt;"><figure><img src="a.png"><figcaption>David</figcaption></figure></action-text-attachment>"#;
        let fragment = parse(&format!("<div>Hey {attachment}!</div>"));

        let div = fragment.nodes()[0].as_element().unwrap();
        assert_eq!(div.children.len(), 3);
        let node = div.children[1].as_attachment().unwrap();
        assert_eq!(node.raw(), attachment);
        assert_eq!(node.attr("sgid"), Some("abc"));
        assert_eq!(node.attr("content"), Some("<span>David</span>"));
        assert_eq!(
            node.inner_html(),
            r#"<figure><img src="a.png"><figcaption>David</figcaption></figure>"#
        );
        assert_eq!(div.children[2].as_text(), Some("!"));
    }

    #[test]
    fn test_parse_empty_attachment() {
        let fragment = parse(r#"<action-text-attachment sgid="abc"/>"#);
        let node = fragment.nodes()[0].as_attachment().unwrap();
        assert_eq!(node.raw(), r#"<action-text-attachment sgid="abc"/>"#);
        assert_eq!(node.inner_html(), "");
    }

    #[test]
    fn test_parse_custom_attachment_tag() {
        let parser = FragmentParser::new().with_attachment_tag("bc-attachment");
        let fragment = parser.parse("<bc-attachment id=\"1\"><p>x</p></bc-attachment>").unwrap();
        assert!(fragment.nodes()[0].as_attachment().is_some());
    }

    #[test]
    fn test_parse_bare_less_than() {
        let fragment = parse("if a < b then **x**");
        assert_eq!(fragment.nodes(), &[Node::text("if a < b then **x**")]);
        assert_eq!(fragment.to_html(), "if a &lt; b then **x**");

        let fragment = parse("I <3 you");
        assert_eq!(fragment.to_plain_text(), "I <3 you");

        let fragment = parse("<div>x <</div>");
        assert_eq!(fragment.to_plain_text(), "x <");
    }

    #[test]
    fn test_parse_stray_end_tag_ignored() {
        let fragment = parse("<div>a</br>b</div>");
        let div = fragment.nodes()[0].as_element().unwrap();
        assert_eq!(div.children, vec![Node::text("ab")]);
    }
}
