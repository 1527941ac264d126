//! HTML entity handling for XML parsing.
//!
//! Named HTML entities are converted to their Unicode characters before the
//! markup reaches the XML reader, and ampersands that do not start a valid
//! reference are escaped. Standard XML entities and numeric references are
//! left for the reader. A `<` that cannot open a tag is escaped too, the
//! way an HTML tokenizer treats it as text.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Matches an ampersand together with the reference it starts, if any.
static AMPERSAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+;|#[xX][0-9a-fA-F]+;|[a-zA-Z][a-zA-Z0-9]*;)?")
        .expect("invalid ampersand regex")
});

/// Prepare HTML text for the XML reader.
///
/// - `&nbsp;`, `&mdash;`, ... become Unicode characters
/// - `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;` and numeric references stay
/// - unknown named references and bare `&` are escaped as `&amp;`
/// - `<` not followed by a letter, `/`, `!` or `?` is escaped as `&lt;`
pub(crate) fn normalize_entities(html: &str) -> String {
    let html = escape_bare_less_than(html);
    if !html.contains('&') {
        return html.into_owned();
    }

    AMPERSAND_PATTERN
        .replace_all(&html, |caps: &Captures| {
            let Some(reference) = caps.get(1).map(|m| m.as_str()) else {
                return "&amp;".to_owned();
            };
            if reference.starts_with('#') {
                return caps[0].to_owned();
            }
            let name = reference.trim_end_matches(';');
            if matches!(name, "amp" | "lt" | "gt" | "quot" | "apos") {
                return caps[0].to_owned();
            }
            entity_to_unicode(name).map_or_else(|| format!("&amp;{reference}"), str::to_owned)
        })
        .into_owned()
}

fn escape_bare_less_than(html: &str) -> Cow<'_, str> {
    let opens_tag = |rest: &str| {
        rest.chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
    };
    if !html.match_indices('<').any(|(i, _)| !opens_tag(&html[i + 1..])) {
        return Cow::Borrowed(html);
    }

    let mut out = String::with_capacity(html.len() + 8);
    let mut rest = html;
    while let Some(i) = rest.find('<') {
        out.push_str(&rest[..i]);
        rest = &rest[i + 1..];
        out.push_str(if opens_tag(rest) { "<" } else { "&lt;" });
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Decode an entity reference reported by the XML reader.
pub(crate) fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        name => entity_to_unicode(name).map_or_else(|| format!("&{entity};"), str::to_owned),
    }
}

/// Map HTML entity name to Unicode character.
fn entity_to_unicode(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => "\u{00a0}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "bull" => "\u{2022}",
        "hellip" => "\u{2026}",
        "rarr" => "\u{2192}",
        "larr" => "\u{2190}",
        "harr" => "\u{2194}",
        "uarr" => "\u{2191}",
        "darr" => "\u{2193}",
        "times" => "\u{00d7}",
        "divide" => "\u{00f7}",
        "plusmn" => "\u{00b1}",
        "copy" => "\u{00a9}",
        "reg" => "\u{00ae}",
        "trade" => "\u{2122}",
        "euro" => "\u{20ac}",
        "pound" => "\u{00a3}",
        "yen" => "\u{00a5}",
        "cent" => "\u{00a2}",
        "deg" => "\u{00b0}",
        "sect" => "\u{00a7}",
        "para" => "\u{00b6}",
        "middot" => "\u{00b7}",
        "laquo" => "\u{00ab}",
        "raquo" => "\u{00bb}",
        "iexcl" => "\u{00a1}",
        "iquest" => "\u{00bf}",
        "zwj" => "\u{200d}",
        "zwnj" => "\u{200c}",
        _ => return None,
    })
}
