//! Display and persistence paths built from configuration.

use std::path::Path;
use std::sync::Arc;

use cf_config::Config;
use cf_emoji::{EmojiTable, Emojifier, MessageBody};
use cf_fragment::{Fragment, FragmentParser};
use cf_markdown::MarkdownRenderer;

use crate::error::PipelineError;
use crate::filter::FilterChain;
use crate::markdown::MarkdownFilter;
use crate::sanitize::{AmmoniaSanitizer, SanitizeTags};
use crate::unfurl::RemoveSoloUnfurledLinkText;

/// Build the filter chain used when displaying messages.
///
/// Markdown (when enabled), then solo unfurled link text removal, then
/// sanitizing.
#[must_use]
pub fn presentation_chain(config: &Config) -> FilterChain {
    let parser = parser(config);
    let mut chain = FilterChain::new();

    if config.markdown.enabled {
        let renderer = MarkdownRenderer::new().with_autolink(config.markdown.autolink);
        chain = chain.with(MarkdownFilter::new(renderer, parser.clone()));
    }

    chain
        .with(RemoveSoloUnfurledLinkText::new(
            config.unfurl.content_type.clone(),
        ))
        .with(SanitizeTags::new(AmmoniaSanitizer::new(), parser))
}

fn parser(config: &Config) -> FragmentParser {
    FragmentParser::new().with_attachment_tag(config.fragment.attachment_tag.clone())
}

/// Message content pipeline.
///
/// Built once at startup and shared by reference. [`render`] is the display
/// path, [`emojify`] the persistence path.
///
/// [`render`]: Pipeline::render
/// [`emojify`]: Pipeline::emojify
#[derive(Debug)]
pub struct Pipeline {
    parser: FragmentParser,
    chain: FilterChain,
    emojifier: Emojifier,
}

impl Pipeline {
    /// Build a pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured emoji table cannot be loaded.
    pub fn new(config: &Config) -> Result<Self, PipelineError> {
        let table = emoji_table(config.emoji.builtin, config.emoji.table_path())?;
        Ok(Self::with_emojifier(config, Emojifier::new(Arc::new(table))))
    }

    /// Build a pipeline with a caller-provided emojifier.
    #[must_use]
    pub fn with_emojifier(config: &Config, emojifier: Emojifier) -> Self {
        Self {
            parser: parser(config),
            chain: presentation_chain(config),
            emojifier,
        }
    }

    /// Load configuration and build a pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or the emoji table cannot be loaded.
    pub fn from_config_path(config_path: Option<&Path>) -> Result<Self, PipelineError> {
        Self::new(&Config::load(config_path)?)
    }

    /// Parser configured for this pipeline.
    #[must_use]
    pub fn parser(&self) -> &FragmentParser {
        &self.parser
    }

    /// Presentation filter chain.
    #[must_use]
    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    /// Parse stored message markup.
    ///
    /// # Errors
    ///
    /// Returns an error if the markup cannot be parsed.
    pub fn parse(&self, html: &str) -> Result<Fragment, PipelineError> {
        Ok(self.parser.parse(html)?)
    }

    /// Render message markup for display.
    ///
    /// # Errors
    ///
    /// Returns an error if the markup cannot be parsed.
    pub fn render(&self, html: &str) -> Result<String, PipelineError> {
        let fragment = self.parse(html)?;
        Ok(self.chain.run(fragment).to_html())
    }

    /// Render many messages in parallel. Output order matches input order.
    ///
    /// # Errors
    ///
    /// Returns the first parse error; nothing is rendered in that case.
    pub fn render_all<S: AsRef<str>>(&self, bodies: &[S]) -> Result<Vec<String>, PipelineError> {
        let fragments = bodies
            .iter()
            .map(|html| self.parse(html.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self
            .chain
            .run_all(fragments)
            .iter()
            .map(Fragment::to_html)
            .collect())
    }

    /// Rewrite emoji shortcodes in a body about to be saved.
    ///
    /// Returns `true` if the body changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewritten markup cannot be parsed.
    pub fn emojify(&self, body: &mut MessageBody) -> Result<bool, PipelineError> {
        Ok(body.before_save(&self.emojifier, &self.parser)?)
    }
}

fn emoji_table(builtin: bool, path: Option<&Path>) -> Result<EmojiTable, PipelineError> {
    let mut table = if builtin {
        EmojiTable::builtin()
    } else {
        EmojiTable::new()
    };
    if let Some(path) = path {
        table.extend(EmojiTable::load(path)?);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use pretty_assertions::assert_eq;
    use regex::Regex;

    use super::*;

    static PIPELINE: LazyLock<Pipeline> =
        LazyLock::new(|| Pipeline::new(&Config::default()).unwrap());

    fn render(html: &str) -> String {
        PIPELINE.render(html).unwrap()
    }

    const UNFURL: &str = r#"<action-text-attachment content-type="application/vnd.actiontext.opengraph-embed" url="https://basecamp.com/assets/general/opengraph.png" href="https://basecamp.com/" filename="Project management software, online collaboration" caption="Trusted by millions, Basecamp puts everything you need to get work done in one place."></action-text-attachment>"#;

    #[test]
    fn test_chain_order() {
        let chain = presentation_chain(&Config::default());
        assert_eq!(
            chain.names(),
            vec!["markdown", "remove-solo-unfurled-link-text", "sanitize-tags"]
        );
    }

    #[test]
    fn test_markdown_disabled() {
        let mut config = Config::default();
        config.markdown.enabled = false;
        assert_eq!(presentation_chain(&config).len(), 2);

        let pipeline = Pipeline::new(&config).unwrap();
        assert_eq!(pipeline.render("**bold**").unwrap(), "**bold**");
    }

    #[test]
    fn test_unfurled_link_text_removed() {
        let html = format!("<div>https://basecamp.com/{UNFURL}\n</div>");
        let out = render(&html);
        assert!(out.starts_with("<div><action-text-attachment"), "{out}");
    }

    #[test]
    fn test_unfurled_link_with_text_untouched() {
        let html = format!("<div>Hello https://basecamp.com/{UNFURL}\n</div>");
        assert_eq!(render(&html), html);
    }

    #[test]
    fn test_x_com_link_with_twitter_unfurl() {
        let unfurl = UNFURL.replace(
            r#"href="https://basecamp.com/""#,
            r#"href="https://twitter.com/basecamp/status/1""#,
        );
        let html = format!("<div>https://x.com/basecamp/status/1?s=20{unfurl}\n</div>");
        assert!(render(&html).starts_with("<div><action-text-attachment"));
    }

    #[test]
    fn test_images_removed() {
        assert_eq!(
            render(r#"Hello <img src="https://basecamp.com/assets/logo.svg">World"#),
            "Hello World"
        );
    }

    #[test]
    fn test_mention_preserved() {
        let html = r#"<div>Hi <action-text-attachment sgid="BAh7CEkiCGdpZAY6BkVUSSIr" content-type="application/vnd.campfire.mention"><img src="/users/1/avatar" class="avatar"></action-text-attachment>!</div>"#;
        assert_eq!(render(html), html);
    }

    #[test]
    fn test_attachment_markup_sanitized() {
        let html = r#"<div>hi <action-text-attachment onmouseover="alert(1)" sgid="x" content-type="application/vnd.campfire.mention"><script>alert(2)</script><img src=x onerror=alert(3)></action-text-attachment></div>"#;
        let out = render(html);
        assert!(out.contains("<action-text-attachment"), "{out}");
        assert!(!out.contains("onmouseover"), "{out}");
        assert!(!out.contains("<script"), "{out}");
        assert!(!out.contains("onerror"), "{out}");
    }

    #[test]
    fn test_code_block_language_class_kept() {
        let out = render("```ruby\nputs 1\n```");
        assert!(out.contains(r#"<code class="language-ruby">"#), "{out}");
    }

    #[test]
    fn test_renders_bold() {
        assert!(render("This is **bold** text").contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_renders_italic() {
        assert!(render("This is *italic* text").contains("<em>italic</em>"));
    }

    #[test]
    fn test_renders_inline_code() {
        assert!(render("Use `git status` here").contains("<code>git status</code>"));
    }

    #[test]
    fn test_renders_code_block() {
        let out = render("```\nfn main() {}\n```");
        assert!(out.contains("<pre><code>"));
        assert!(out.contains("fn main() {}"));
    }

    #[test]
    fn test_renders_lists() {
        let out = render("* Item 1\n* Item 2");
        assert!(out.contains("<ul>"));
        assert!(out.contains("<li>Item 1</li>"));

        let out = render("1. First\n2. Second");
        assert!(out.contains("<ol>"));
        assert!(out.contains("<li>First</li>"));
    }

    #[test]
    fn test_renders_list_after_prose() {
        let out = render("Here is a list:\n* Item 1\n* Item 2");
        assert!(out.contains("<p>Here is a list:</p>"));
        assert!(out.contains("<ul>"));
    }

    #[test]
    fn test_renders_link() {
        let re = Regex::new(r#"<a href="https://basecamp\.com".*?>Basecamp</a>"#).unwrap();
        let out = render("[Basecamp](https://basecamp.com)");
        assert!(re.is_match(&out), "{out}");
        assert!(out.contains(r#"rel="noopener noreferrer""#));
    }

    #[test]
    fn test_renders_header_blockquote_strikethrough() {
        assert!(render("# Heading").contains("<h1>Heading</h1>"));
        assert!(render("> quoted").contains("<blockquote>"));
        assert!(render("~~gone~~").contains("<del>gone</del>"));
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(render("Just a normal message"), "Just a normal message");
    }

    #[test]
    fn test_underscores_not_markdown() {
        assert_eq!(render("call __init__ on my_variable"), "call __init__ on my_variable");
    }

    #[test]
    fn test_single_list_line_not_markdown() {
        assert_eq!(render("- Not sure about that"), "- Not sure about that");
    }

    #[test]
    fn test_markdown_skipped_with_attachment() {
        let html = r#"<div>**bold** <action-text-attachment sgid="x" content-type="application/vnd.campfire.mention"></action-text-attachment></div>"#;
        assert!(render(html).contains("**bold**"));
    }

    #[test]
    fn test_script_removed() {
        let out = render("**bold** <script>alert('xss')</script>");
        assert!(out.contains("<strong>bold</strong>"));
        assert!(!out.contains("<script"));
    }

    #[test]
    fn test_javascript_link_not_rendered() {
        let out = render("[Click me](javascript:alert('xss'))");
        assert!(!out.contains(r#"href="javascript"#));
        assert!(out.contains("[Click me](javascript:alert('xss'))"));
    }

    #[test]
    fn test_event_handler_removed() {
        let out = render("**bold** <img src=x onerror=alert('xss')>");
        assert!(out.contains("<strong>bold</strong>"));
        assert!(!out.contains("onerror"));
    }

    #[test]
    fn test_style_removed() {
        let out = render("**bold** <div style='background:red'>styled</div>");
        assert!(out.contains("<strong>bold</strong>"));
        assert!(!out.contains("style="));
    }

    #[test]
    fn test_render_all() {
        let out = PIPELINE.render_all(&["**one**", "plain", "`two`"]).unwrap();
        assert_eq!(out[0], "<p><strong>one</strong></p>\n");
        assert_eq!(out[1], "plain");
        assert_eq!(out[2], "<p><code>two</code></p>\n");
    }

    #[test]
    fn test_emojify_body() {
        let mut body = MessageBody::create(PIPELINE.parse("I :heart: this!").unwrap());
        assert!(PIPELINE.emojify(&mut body).unwrap());
        assert!(body.fragment().to_html().contains('\u{2764}'));
    }

    #[test]
    fn test_emoji_table_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emoji.json");
        std::fs::write(&path, r#"[{"emoji": "☕", "aliases": ["coffee_time"]}]"#).unwrap();

        let mut config = Config::default();
        config.emoji.builtin = false;
        config.emoji.table_path = Some(path.display().to_string());

        let pipeline = Pipeline::new(&config).unwrap();
        let mut body = MessageBody::create(pipeline.parse(":coffee_time: :heart:").unwrap());
        assert!(pipeline.emojify(&mut body).unwrap());
        assert_eq!(body.fragment().to_html(), "\u{2615} :heart:");
    }

    #[test]
    fn test_missing_emoji_table() {
        let mut config = Config::default();
        config.emoji.table_path = Some("/nonexistent/emoji.json".to_owned());
        assert!(matches!(Pipeline::new(&config), Err(PipelineError::Emoji(_))));
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.toml");
        std::fs::write(&path, "[markdown]\nenabled = false\n").unwrap();

        let pipeline = Pipeline::from_config_path(Some(&path)).unwrap();
        assert_eq!(pipeline.chain().len(), 2);
    }

    #[test]
    fn test_missing_config_file() {
        let result = Pipeline::from_config_path(Some(Path::new("/nonexistent/filters.toml")));
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }
}
