//! Plain-text extraction.
//!
//! Line breaks come from `<br>` and from block-level elements, which always
//! start and end on their own line. Paragraphs are followed by a blank line.
//! Whitespace inside text nodes is preserved as written.

use crate::node::{Element, Node};

/// Block-level elements rendered on their own lines.
const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tr",
    "ul",
];

/// How attachments appear in extracted text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttachmentText<'a> {
    /// Attachments contribute nothing.
    #[default]
    Omit,
    /// Each attachment is replaced by the given text.
    Placeholder(&'a str),
}

pub(crate) fn extract(nodes: &[Node], attachments: AttachmentText<'_>) -> String {
    let mut out = String::new();
    write_nodes(nodes, attachments, &mut out);
    out.truncate(out.trim_end_matches('\n').len());
    out
}

fn write_nodes(nodes: &[Node], attachments: AttachmentText<'_>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Attachment(_) => {
                if let AttachmentText::Placeholder(placeholder) = attachments {
                    out.push_str(placeholder);
                }
            }
            Node::Element(element) => write_element(element, attachments, out),
        }
    }
}

fn write_element(element: &Element, attachments: AttachmentText<'_>, out: &mut String) {
    if element.tag == "br" {
        out.push('\n');
        return;
    }

    let is_block = BLOCK_ELEMENTS.contains(&element.tag.as_str());
    if is_block {
        ensure_newlines(out, 1);
    }

    write_nodes(&element.children, attachments, out);

    if is_block {
        ensure_newlines(out, if element.tag == "p" { 2 } else { 1 });
    }
}

/// Make sure the output ends with at least `count` newlines.
///
/// Nothing is added at the very start of the output.
fn ensure_newlines(out: &mut String, count: usize) {
    if out.is_empty() {
        return;
    }
    let trailing = out.len() - out.trim_end_matches('\n').len();
    for _ in trailing..count {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FragmentParser;

    fn plain(html: &str) -> String {
        let fragment = FragmentParser::new().parse(html).unwrap();
        extract(fragment.nodes(), AttachmentText::Omit)
    }

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(plain("Hello **world**"), "Hello **world**");
    }

    #[test]
    fn test_br_becomes_newline() {
        assert_eq!(plain("<div>one<br>two</div>"), "one\ntwo");
    }

    #[test]
    fn test_consecutive_br_keep_blank_line() {
        assert_eq!(plain("<div>one<br><br>two</div>"), "one\n\ntwo");
    }

    #[test]
    fn test_divs_on_separate_lines() {
        assert_eq!(plain("<div>* one</div><div>* two</div>"), "* one\n* two");
    }

    #[test]
    fn test_paragraphs_separated_by_blank_line() {
        assert_eq!(plain("<p>one</p><p>two</p>"), "one\n\ntwo");
    }

    #[test]
    fn test_inline_elements_flatten() {
        assert_eq!(plain("<div>Hello <strong>there</strong>!</div>"), "Hello there!");
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(plain("<div>a &lt; b &amp;&amp; c</div>"), "a < b && c");
    }

    #[test]
    fn test_trailing_newlines_trimmed() {
        assert_eq!(plain("<div>text<br></div>"), "text");
    }

    #[test]
    fn test_attachment_placeholder() {
        let fragment = FragmentParser::new()
            .parse(r#"<div>Hi <action-text-attachment sgid="1"><span>Jo</span></action-text-attachment></div>"#)
            .unwrap();
        assert_eq!(extract(fragment.nodes(), AttachmentText::Omit), "Hi ");
        assert_eq!(
            extract(fragment.nodes(), AttachmentText::Placeholder("[mention]")),
            "Hi [mention]"
        );
    }
}
