//! Bare URL linking for rendered text runs.

use std::sync::LazyLock;

use cf_fragment::{escape_html, escape_text};
use regex::Regex;

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>]+").expect("invalid autolink regex")
});

/// Attributes added to every anchor the renderer emits.
pub(crate) const LINK_ATTRIBUTES: &str = r#" target="_blank" rel="noopener noreferrer""#;

/// Escape a text run, turning bare URLs into anchors.
pub(crate) fn autolink(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for found in URL.find_iter(text) {
        let url = trim_url(found.as_str());
        if url.is_empty() || !url.contains('.') {
            continue;
        }
        let end = found.start() + url.len();

        out.push_str(&escape_text(&text[last..found.start()]));
        push_anchor(&mut out, url);
        last = end;
    }

    out.push_str(&escape_text(&text[last..]));
    out
}

/// Write an anchor for `url` with the standard link attributes.
pub(crate) fn push_anchor(out: &mut String, url: &str) {
    let href = if url.get(..4).is_some_and(|s| s.eq_ignore_ascii_case("www.")) {
        format!("http://{url}")
    } else {
        url.to_owned()
    };
    out.push_str("<a href=\"");
    out.push_str(&escape_html(&href));
    out.push('"');
    out.push_str(LINK_ATTRIBUTES);
    out.push('>');
    out.push_str(&escape_text(url));
    out.push_str("</a>");
}

/// Drop trailing punctuation and unbalanced closing parentheses.
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let Some(last) = url.chars().last() else {
            return url;
        };
        let trim = match last {
            '.' | ',' | ':' | ';' | '!' | '?' | '"' | '\'' | '*' | '~' | '_' => true,
            ')' => url.matches(')').count() > url.matches('(').count(),
            _ => false,
        };
        if !trim {
            return url;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
}
