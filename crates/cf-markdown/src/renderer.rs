//! Safe markdown to HTML rendering.
//!
//! The renderer walks pulldown-cmark events and writes a restricted set of
//! elements. Unsafe constructs are refused while writing, so the output
//! never depends on a later cleanup pass:
//!
//! - raw HTML, block or inline, is dropped
//! - only `http`/`https` links become anchors; anything else (and every
//!   image) is written back as its escaped source text
//! - no element carries `style`, `id` or event attributes
//! - indented code blocks are not code; their text is dedented and rendered
//!   as markdown once
//! - `_`/`__` emphasis, intra-word `*` emphasis and single-`~` strikethrough
//!   are written back as literal delimiters

use std::ops::Range;

use cf_fragment::{escape_html, escape_text};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::autolink::{LINK_ATTRIBUTES, autolink};

/// Markdown renderer for chat messages.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    autolink: bool,
}

impl MarkdownRenderer {
    /// Create a renderer with autolinking enabled.
    #[must_use]
    pub fn new() -> Self {
        Self { autolink: true }
    }

    /// Enable or disable linking of bare URLs.
    #[must_use]
    pub fn with_autolink(mut self, enabled: bool) -> Self {
        self.autolink = enabled;
        self
    }

    /// Parser options: strikethrough only. Tables, footnotes, task lists
    /// and heading attributes stay off.
    #[must_use]
    pub fn parser_options() -> Options {
        Options::ENABLE_STRIKETHROUGH
    }

    /// Render markdown text to HTML. Never fails; text the parser does not
    /// understand comes out escaped.
    #[must_use]
    pub fn render(&self, markdown: &str) -> String {
        render_pass(markdown, self.autolink, Pass::Top)
    }
}

/// Render pass. Dedented code block text gets one `Nested` pass, where any
/// indented block left is written as plain lines.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Pass {
    Top,
    Nested,
}

fn render_pass(markdown: &str, autolink: bool, pass: Pass) -> String {
    let mut writer = HtmlWriter::new(markdown, autolink, pass);
    let parser = Parser::new_ext(markdown, MarkdownRenderer::parser_options());
    for (event, range) in parser.into_offset_iter() {
        writer.event(event, range);
    }
    writer.finish()
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Code block being written.
enum CodeBlock {
    Fenced,
    /// Indented block, collected and rendered as markdown at the end.
    Indented(String),
}

/// Event writer for a single render call.
struct HtmlWriter<'a> {
    source: &'a str,
    autolink: bool,
    pass: Pass,
    output: String,
    /// Adjacent text events, merged so URLs split by the parser autolink
    /// as a whole.
    pending: String,
    /// Per open emphasis, strong or strikethrough: the literal delimiter
    /// to write back when the span is not rendered.
    delimiters: Vec<Option<&'static str>>,
    anchor_depth: usize,
    /// Nesting depth of a link or image being written as source text.
    skip_depth: usize,
    code: Option<CodeBlock>,
}

impl<'a> HtmlWriter<'a> {
    fn new(source: &'a str, autolink: bool, pass: Pass) -> Self {
        Self {
            source,
            autolink,
            pass,
            output: String::with_capacity(source.len() * 2),
            pending: String::new(),
            delimiters: Vec::new(),
            anchor_depth: 0,
            skip_depth: 0,
            code: None,
        }
    }

    fn finish(mut self) -> String {
        self.flush_text();
        self.output
    }

    fn event(&mut self, event: Event<'_>, range: Range<usize>) {
        if self.skip_depth > 0 {
            match event {
                Event::Start(_) => self.skip_depth += 1,
                Event::End(_) => self.skip_depth -= 1,
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(tag) => self.start_tag(tag, range),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                self.push_html("<code>");
                self.output.push_str(&escape_text(&code));
                self.output.push_str("</code>");
            }
            Event::SoftBreak | Event::HardBreak => self.push_html("<br>\n"),
            Event::Rule => self.push_html("<hr>\n"),
            // Raw HTML is never passed through.
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>, range: Range<usize>) {
        match tag {
            Tag::Paragraph => self.push_html("<p>"),
            Tag::Heading { level, .. } => {
                self.push_html(&format!("<h{}>", heading_level(level)));
            }
            Tag::BlockQuote(_) => self.push_html("<blockquote>\n"),
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
                let lang = info.split_whitespace().next().unwrap_or_default();
                if lang.is_empty() {
                    self.push_html("<pre><code>");
                } else {
                    self.push_html(&format!(
                        r#"<pre><code class="language-{}">"#,
                        escape_html(lang)
                    ));
                }
                self.code = Some(CodeBlock::Fenced);
            }
            Tag::CodeBlock(CodeBlockKind::Indented) => {
                self.flush_text();
                self.code = Some(CodeBlock::Indented(String::new()));
            }
            Tag::List(Some(1)) => self.push_html("<ol>\n"),
            Tag::List(Some(start)) => self.push_html(&format!("<ol start=\"{start}\">\n")),
            Tag::List(None) => self.push_html("<ul>\n"),
            Tag::Item => self.push_html("<li>"),
            Tag::Emphasis => self.open_emphasis(&range, "<em>", 1),
            Tag::Strong => self.open_emphasis(&range, "<strong>", 2),
            Tag::Strikethrough => self.open_strikethrough(&range),
            Tag::Link { dest_url, title, .. } => {
                if is_safe_url(&dest_url) {
                    let mut anchor = format!(r#"<a href="{}""#, escape_html(&dest_url));
                    if !title.is_empty() {
                        anchor.push_str(&format!(r#" title="{}""#, escape_html(&title)));
                    }
                    anchor.push_str(LINK_ATTRIBUTES);
                    anchor.push('>');
                    self.push_html(&anchor);
                    self.anchor_depth += 1;
                } else {
                    self.write_source(range);
                }
            }
            Tag::Image { .. } => self.write_source(range),
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.push_html("</p>\n"),
            TagEnd::Heading(level) => {
                self.push_html(&format!("</h{}>\n", heading_level(level)));
            }
            TagEnd::BlockQuote(_) => self.push_html("</blockquote>\n"),
            TagEnd::CodeBlock => match self.code.take() {
                Some(CodeBlock::Indented(text)) => self.indented_block(&text),
                _ => self.output.push_str("</code></pre>\n"),
            },
            TagEnd::List(true) => self.push_html("</ol>\n"),
            TagEnd::List(false) => self.push_html("</ul>\n"),
            TagEnd::Item => self.push_html("</li>\n"),
            TagEnd::Emphasis => self.close_delimited("</em>"),
            TagEnd::Strong => self.close_delimited("</strong>"),
            TagEnd::Strikethrough => self.close_delimited("</del>"),
            TagEnd::Link => {
                self.push_html("</a>");
                self.anchor_depth = self.anchor_depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        match &mut self.code {
            Some(CodeBlock::Fenced) => self.output.push_str(&escape_text(text)),
            Some(CodeBlock::Indented(buffer)) => buffer.push_str(text),
            None => self.pending.push_str(text),
        }
    }

    /// Open emphasis or strong. Underscore delimiters, and asterisks
    /// touching a letter or digit outside the span, stay literal.
    fn open_emphasis(&mut self, range: &Range<usize>, tag: &str, width: usize) {
        let underscored = self
            .source
            .get(range.clone())
            .is_some_and(|span| span.starts_with('_'));
        let delimiter = match (underscored, width) {
            (true, 1) => "_",
            (true, _) => "__",
            (false, 1) => "*",
            (false, _) => "**",
        };
        let literal = (underscored || self.intra_word(range)).then_some(delimiter);
        self.open_delimited(tag, literal);
    }

    /// Open strikethrough. Only `~~` counts; a single `~` stays literal.
    fn open_strikethrough(&mut self, range: &Range<usize>) {
        let doubled = self
            .source
            .get(range.clone())
            .is_some_and(|span| span.starts_with("~~"));
        self.open_delimited("<del>", if doubled { None } else { Some("~") });
    }

    fn open_delimited(&mut self, tag: &str, literal: Option<&'static str>) {
        match literal {
            Some(literal) => self.pending.push_str(literal),
            None => self.push_html(tag),
        }
        self.delimiters.push(literal);
    }

    /// Whether the span is glued to a word on either side.
    fn intra_word(&self, range: &Range<usize>) -> bool {
        let before = self.source.get(..range.start).and_then(|s| s.chars().next_back());
        let after = self.source.get(range.end..).and_then(|s| s.chars().next());
        before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric)
    }

    fn close_delimited(&mut self, tag: &str) {
        match self.delimiters.pop().flatten() {
            Some(literal) => self.pending.push_str(literal),
            None => self.push_html(tag),
        }
    }

    /// Write the event's markdown source as text and skip its contents.
    fn write_source(&mut self, range: Range<usize>) {
        self.flush_text();
        if let Some(source) = self.source.get(range) {
            self.output.push_str(&escape_text(source));
        }
        self.skip_depth = 1;
    }

    fn push_html(&mut self, html: &str) {
        self.flush_text();
        self.output.push_str(html);
    }

    fn flush_text(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending);
        if self.autolink && self.anchor_depth == 0 {
            self.output.push_str(&autolink(&text));
        } else {
            self.output.push_str(&escape_text(&text));
        }
    }

    /// Write an indented code block as markdown.
    ///
    /// Every line is dedented completely, so the text renders in a single
    /// extra pass no matter how deep the indentation was. Inside that pass
    /// an indented block is written as plain lines.
    fn indented_block(&mut self, text: &str) {
        let lines: Vec<&str> = text.lines().map(str::trim_start).collect();
        match self.pass {
            Pass::Top => {
                let html = render_pass(&lines.join("\n"), self.autolink, Pass::Nested);
                self.output.push_str(&html);
            }
            Pass::Nested => {
                self.push_html("<p>");
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        self.push_html("<br>\n");
                    }
                    self.pending.push_str(line);
                }
                self.push_html("</p>\n");
            }
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn is_safe_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
