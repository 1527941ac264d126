//! `:shortcode:` substitution in serialized message markup.

use std::borrow::Cow;
use std::sync::{Arc, LazyLock};

use cf_fragment::{Fragment, FragmentParser};
use regex::{Captures, Regex};

use crate::error::EmojiError;
use crate::table::EmojiLookup;

static SHORTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i):([a-z0-9_+-]+):").expect("invalid shortcode regex"));

/// Replaces emoji shortcodes with glyphs.
///
/// Only text between tags is rewritten. Tag names and attribute values
/// (including quoted `<` and `>`) are copied unchanged.
#[derive(Clone)]
pub struct Emojifier {
    lookup: Arc<dyn EmojiLookup>,
}

impl Emojifier {
    /// Create an emojifier over a shared lookup.
    #[must_use]
    pub fn new(lookup: Arc<dyn EmojiLookup>) -> Self {
        Self { lookup }
    }

    /// The lookup in use.
    #[must_use]
    pub fn lookup(&self) -> &dyn EmojiLookup {
        self.lookup.as_ref()
    }

    /// Rewrite shortcodes in serialized markup.
    ///
    /// Unknown shortcodes are left as typed. Returns [`Cow::Borrowed`] when
    /// nothing was replaced.
    #[must_use]
    pub fn emojify<'a>(&self, html: &'a str) -> Cow<'a, str> {
        let mut out: Option<String> = None;
        let mut copied = 0;

        for (start, end) in text_segments(html) {
            let segment = &html[start..end];
            let replaced = self.replace_shortcodes(segment);
            if let Cow::Owned(replaced) = replaced {
                let buffer = out.get_or_insert_with(|| String::with_capacity(html.len()));
                buffer.push_str(&html[copied..start]);
                buffer.push_str(&replaced);
                copied = end;
            }
        }

        match out {
            Some(mut buffer) => {
                buffer.push_str(&html[copied..]);
                Cow::Owned(buffer)
            }
            None => Cow::Borrowed(html),
        }
    }

    /// Emojify a fragment's markup.
    ///
    /// Returns `Ok(None)` when nothing changed, so callers can skip
    /// persisting the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewritten markup cannot be parsed.
    pub fn substitute(
        &self,
        fragment: &Fragment,
        parser: &FragmentParser,
    ) -> Result<Option<Fragment>, EmojiError> {
        let html = fragment.to_html();
        match self.emojify(&html) {
            Cow::Borrowed(_) => Ok(None),
            Cow::Owned(emojified) => Ok(Some(parser.parse(&emojified)?)),
        }
    }

    fn replace_shortcodes<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.contains(':') {
            return Cow::Borrowed(text);
        }

        let mut changed = false;
        let replaced = SHORTCODE.replace_all(text, |caps: &Captures| {
            match self.lookup.find(&caps[1].to_lowercase()) {
                Some(glyph) => {
                    changed = true;
                    glyph.to_owned()
                }
                None => caps[0].to_owned(),
            }
        });

        if changed { replaced } else { Cow::Borrowed(text) }
    }
}

impl std::fmt::Debug for Emojifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emojifier").finish_non_exhaustive()
    }
}

/// Byte ranges of the text between tags.
///
/// A tag runs from `<` to the next `>` outside a quoted attribute value.
fn text_segments(html: &str) -> Vec<(usize, usize)> {
    let bytes = html.as_bytes();
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        if text_start < i {
            segments.push((text_start, i));
        }

        let mut quote: Option<u8> = None;
        i += 1;
        while i < bytes.len() {
            match (quote, bytes[i]) {
                (None, b'>') => break,
                (None, q @ (b'"' | b'\'')) => quote = Some(q),
                (Some(q), c) if c == q => quote = None,
                _ => {}
            }
            i += 1;
        }
        i += 1;
        text_start = i;
    }

    if text_start < bytes.len() {
        segments.push((text_start, bytes.len()));
    }
    segments
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::EmojiTable;

    fn emojifier() -> Emojifier {
        Emojifier::new(Arc::new(EmojiTable::builtin()))
    }

    #[test]
    fn test_replaces_known_shortcode() {
        assert_eq!(emojifier().emojify("I :heart: this!"), "I \u{2764}\u{fe0f} this!");
    }

    #[test]
    fn test_multiple_occurrences() {
        let out = Emojifier::new(Arc::new(HashMap::from([(
            "heart".to_owned(),
            "\u{2665}".to_owned(),
        )])))
        .emojify(":heart: and :heart:")
        .into_owned();
        assert_eq!(out, "\u{2665} and \u{2665}");
    }

    #[test]
    fn test_case_insensitive() {
        let out = emojifier().emojify(":HEART: and :Heart: and :heart:");
        assert_eq!(out.matches('\u{2764}').count(), 3);
        assert!(!out.to_lowercase().contains(":heart:"));
    }

    #[test]
    fn test_unknown_shortcode_untouched() {
        let out = emojifier().emojify("This is :notarealcode: right?");
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, "This is :notarealcode: right?");
    }

    #[test]
    fn test_unknown_next_to_known() {
        assert_eq!(
            emojifier().emojify(":nope: :wave:"),
            ":nope: \u{1f44b}"
        );
    }

    #[test]
    fn test_different_shortcodes() {
        let out = emojifier().emojify(":heart: :thumbsup: :100: :+1:");
        assert!(out.contains('\u{2764}'));
        assert!(out.contains('\u{1f44d}'));
        assert!(out.contains('\u{1f4af}'));
        assert!(!out.contains(":+1:"));
    }

    #[test]
    fn test_text_inside_markup() {
        assert_eq!(
            emojifier().emojify("<div>Check this :thumbsup:</div>"),
            "<div>Check this \u{1f44d}</div>"
        );
    }

    #[test]
    fn test_attributes_untouched() {
        let html = r#"<a href="https://example.com/:wave:" title='x > :heart:'>:wave:</a>"#;
        assert_eq!(
            emojifier().emojify(html),
            "<a href=\"https://example.com/:wave:\" title='x > :heart:'>\u{1f44b}</a>"
        );
    }

    #[test]
    fn test_times_are_not_shortcodes() {
        let out = emojifier().emojify("Meet at 10:30:00");
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_text_segments() {
        let html = r#"a<b c="<>">d</b>e"#;
        let segments: Vec<&str> = text_segments(html)
            .into_iter()
            .map(|(s, e)| &html[s..e])
            .collect();
        assert_eq!(segments, vec!["a", "d", "e"]);
    }

    #[test]
    fn test_substitute_fragment() {
        let parser = FragmentParser::new();
        let fragment = parser.parse("<div>Hello :wave:</div>").unwrap();
        let updated = emojifier().substitute(&fragment, &parser).unwrap().unwrap();
        assert_eq!(updated.to_html(), "<div>Hello \u{1f44b}</div>");
    }

    #[test]
    fn test_substitute_unchanged_returns_none() {
        let parser = FragmentParser::new();
        let fragment = parser.parse("<div>Hello world</div>").unwrap();
        assert!(emojifier().substitute(&fragment, &parser).unwrap().is_none());
    }
}
