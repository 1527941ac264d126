//! Markdown rendering for plain-text chat messages.

use cf_fragment::{Fragment, FragmentParser};
use cf_markdown::{MarkdownRenderer, has_markdown, normalize_lists};

use crate::filter::Filter;

/// Renders messages typed as markdown into rich text.
///
/// Runs only when the plain text looks like markdown and the fragment has
/// no attachments. Rendering replaces the whole fragment, which would lose
/// attachment state, so any attachment disables the filter for the message.
#[derive(Debug, Clone, Default)]
pub struct MarkdownFilter {
    renderer: MarkdownRenderer,
    parser: FragmentParser,
}

impl MarkdownFilter {
    #[must_use]
    pub fn new(renderer: MarkdownRenderer, parser: FragmentParser) -> Self {
        Self { renderer, parser }
    }

    /// Render a fragment's plain text to a new fragment.
    ///
    /// Falls back to the input if the rendered HTML cannot be parsed.
    #[must_use]
    pub fn render(&self, fragment: &Fragment) -> Fragment {
        let text = normalize_lists(&fragment.to_plain_text());
        let html = self.renderer.render(&text);

        match self.parser.parse(&html) {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::warn!(error = %e, "Rendered markdown failed to parse");
                fragment.clone()
            }
        }
    }
}

impl Filter for MarkdownFilter {
    fn name(&self) -> &str {
        "markdown"
    }

    fn is_applicable(&self, fragment: &Fragment) -> bool {
        if !has_markdown(&fragment.to_plain_text()) {
            return false;
        }
        if fragment.has_attachments() {
            tracing::debug!("Skipping markdown for message with attachments");
            return false;
        }
        true
    }

    fn apply(&self, fragment: &Fragment) -> Fragment {
        self.render(fragment)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn filter() -> MarkdownFilter {
        MarkdownFilter::default()
    }

    fn render(html: &str) -> String {
        let fragment = Fragment::parse(html).unwrap();
        let filter = filter();
        if filter.is_applicable(&fragment) {
            filter.apply(&fragment).to_html()
        } else {
            fragment.to_html()
        }
    }

    #[test]
    fn test_plain_text_not_applicable() {
        let fragment = Fragment::parse("Just a normal message").unwrap();
        assert!(!filter().is_applicable(&fragment));
    }

    #[test]
    fn test_bold_and_code() {
        assert_eq!(
            render("**bold** and `code`"),
            "<p><strong>bold</strong> and <code>code</code></p>\n"
        );
    }

    #[test]
    fn test_list_after_prose() {
        assert_eq!(
            render("Shopping:\n* milk\n* eggs"),
            "<p>Shopping:</p>\n<ul>\n<li>milk</li>\n<li>eggs</li>\n</ul>\n"
        );
    }

    #[test]
    fn test_div_lines_become_markdown_lines() {
        let html = render("<div>**one**</div><div>**two**</div>");
        assert!(html.contains("<strong>one</strong>"));
        assert!(html.contains("<strong>two</strong>"));
    }

    #[test]
    fn test_attachments_disable_markdown() {
        let html = r#"<div>**bold**<action-text-attachment sgid="x" content-type="application/vnd.campfire.mention"></action-text-attachment></div>"#;
        let fragment = Fragment::parse(html).unwrap();
        assert!(!filter().is_applicable(&fragment));
    }

    #[test]
    fn test_escaped_markup_stays_text() {
        let html = render("**bold** &lt;script&gt;x&lt;/script&gt;");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn test_javascript_link_not_rendered() {
        let html = render("[Click me](javascript:alert('xss'))");
        assert!(html.contains("[Click me](javascript:alert('xss'))"));
        assert!(!html.contains("<a"));
    }

    #[test]
    fn test_returns_new_fragment() {
        let fragment = Fragment::parse("**bold**").unwrap();
        let rendered = filter().apply(&fragment);
        assert_eq!(fragment.to_html(), "**bold**");
        assert_eq!(rendered.to_html(), "<p><strong>bold</strong></p>\n");
    }
}
