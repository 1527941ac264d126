//! Markdown detection for plain chat text.
//!
//! Detection is deliberately conservative. Underscore emphasis is never
//! recognized (`__init__`, `my_variable_name`), and list rules need at
//! least two consecutive items of the same marker so that a lone
//! `- Not sure about that` stays plain text.

use std::sync::LazyLock;

use regex::RegexSet;

/// A pattern rule that can mark text as markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkdownRule {
    /// `**text**`
    Bold,
    /// `*text*`, not at the very start of the text.
    Italic,
    /// `` `code` ``
    InlineCode,
    /// Triple-backtick block.
    FencedCode,
    /// `# Header` through `###### Header`.
    Header,
    /// Two or more consecutive `* item` lines.
    AsteriskList,
    /// Two or more consecutive `- item` lines.
    HyphenList,
    /// Two or more consecutive `1. item` lines.
    OrderedList,
    /// `[text](url)`
    Link,
    /// `~~text~~`
    Strikethrough,
    /// `> quote`
    Blockquote,
    /// A line of three or more hyphens.
    HorizontalRule,
}

impl MarkdownRule {
    /// All rules, in evaluation order.
    pub const ALL: [Self; 12] = [
        Self::Bold,
        Self::Italic,
        Self::InlineCode,
        Self::FencedCode,
        Self::Header,
        Self::AsteriskList,
        Self::HyphenList,
        Self::OrderedList,
        Self::Link,
        Self::Strikethrough,
        Self::Blockquote,
        Self::HorizontalRule,
    ];

    fn pattern(self) -> &'static str {
        match self {
            Self::Bold => r"\*\*[^*]+\*\*",
            Self::Italic => r"[^*]\*[^*\s][^*]*\*",
            Self::InlineCode => r"`[^`]+`",
            Self::FencedCode => r"(?s)```.+?```",
            Self::Header => r"(?m)^#{1,6} ",
            Self::AsteriskList => r"(?m)(?:^\*[ \t].+\n?){2,}",
            Self::HyphenList => r"(?m)(?:^-[ \t].+\n?){2,}",
            Self::OrderedList => r"(?m)(?:^\d+\.[ \t].+\n?){2,}",
            Self::Link => r"\[.+?\]\(.+?\)",
            Self::Strikethrough => r"~~.+?~~",
            Self::Blockquote => r"(?m)^> ",
            Self::HorizontalRule => r"(?m)^---+\r?$",
        }
    }
}

static RULES: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(MarkdownRule::ALL.iter().map(|rule| rule.pattern()))
        .expect("invalid markdown rule regex")
});

/// Whether the text contains anything that looks like markdown.
#[must_use]
pub fn has_markdown(text: &str) -> bool {
    RULES.is_match(text)
}

/// Every rule that matches the text, in evaluation order.
#[must_use]
pub fn matching_rules(text: &str) -> Vec<MarkdownRule> {
    RULES
        .matches(text)
        .into_iter()
        .map(|index| MarkdownRule::ALL[index])
        .collect()
}
