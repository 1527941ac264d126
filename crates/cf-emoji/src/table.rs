//! Emoji alias tables.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::EmojiError;

/// Looks up the glyph for a lowercase emoji alias.
///
/// Implementations are shared read-only across threads. A lookup that
/// cannot answer returns `None`; the shortcode is then left as typed.
pub trait EmojiLookup: Send + Sync {
    /// Glyph for `alias` (already lowercased), if known.
    fn find(&self, alias: &str) -> Option<&str>;
}

impl EmojiLookup for HashMap<String, String> {
    fn find(&self, alias: &str) -> Option<&str> {
        self.get(alias).map(String::as_str)
    }
}

/// Common aliases available without a table file.
const BUILTIN: &[(&str, &str)] = &[
    ("+1", "\u{1f44d}"),
    ("-1", "\u{1f44e}"),
    ("100", "\u{1f4af}"),
    ("beers", "\u{1f37b}"),
    ("blush", "\u{1f60a}"),
    ("broken_heart", "\u{1f494}"),
    ("bulb", "\u{1f4a1}"),
    ("cake", "\u{1f370}"),
    ("clap", "\u{1f44f}"),
    ("coffee", "\u{2615}"),
    ("cry", "\u{1f622}"),
    ("exclamation", "\u{2757}"),
    ("eyes", "\u{1f440}"),
    ("facepalm", "\u{1f926}"),
    ("fire", "\u{1f525}"),
    ("grin", "\u{1f601}"),
    ("heart", "\u{2764}\u{fe0f}"),
    ("heart_eyes", "\u{1f60d}"),
    ("heavy_check_mark", "\u{2714}\u{fe0f}"),
    ("hugs", "\u{1f917}"),
    ("joy", "\u{1f602}"),
    ("laughing", "\u{1f606}"),
    ("memo", "\u{1f4dd}"),
    ("muscle", "\u{1f4aa}"),
    ("ok_hand", "\u{1f44c}"),
    ("point_up", "\u{261d}\u{fe0f}"),
    ("poop", "\u{1f4a9}"),
    ("pray", "\u{1f64f}"),
    ("question", "\u{2753}"),
    ("rage", "\u{1f621}"),
    ("raised_hands", "\u{1f64c}"),
    ("rocket", "\u{1f680}"),
    ("satisfied", "\u{1f606}"),
    ("see_no_evil", "\u{1f648}"),
    ("shrug", "\u{1f937}"),
    ("skull", "\u{1f480}"),
    ("slightly_smiling_face", "\u{1f642}"),
    ("smile", "\u{1f604}"),
    ("smiley", "\u{1f603}"),
    ("sob", "\u{1f62d}"),
    ("sparkles", "\u{2728}"),
    ("star", "\u{2b50}"),
    ("sunny", "\u{2600}\u{fe0f}"),
    ("sweat_smile", "\u{1f605}"),
    ("tada", "\u{1f389}"),
    ("thinking", "\u{1f914}"),
    ("thumbsdown", "\u{1f44e}"),
    ("thumbsup", "\u{1f44d}"),
    ("upside_down_face", "\u{1f643}"),
    ("warning", "\u{26a0}\u{fe0f}"),
    ("wave", "\u{1f44b}"),
    ("white_check_mark", "\u{2705}"),
    ("wink", "\u{1f609}"),
    ("x", "\u{274c}"),
    ("zap", "\u{26a1}"),
];

/// One entry of a gemoji `emoji.json` file. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct GemojiEntry {
    emoji: String,
    #[serde(default)]
    aliases: Vec<String>,
}

/// In-memory alias to glyph table.
#[derive(Debug, Clone, Default)]
pub struct EmojiTable {
    glyphs: HashMap<String, String>,
}

impl EmojiTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in common aliases.
    #[must_use]
    pub fn builtin() -> Self {
        let glyphs = BUILTIN
            .iter()
            .map(|(alias, glyph)| ((*alias).to_owned(), (*glyph).to_owned()))
            .collect();
        Self { glyphs }
    }

    /// Parse a table in gemoji JSON format:
    /// `[{"emoji": "👋", "aliases": ["wave"]}, ...]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the format.
    pub fn from_gemoji_json(json: &str) -> Result<Self, EmojiError> {
        let entries: Vec<GemojiEntry> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for entry in entries {
            for alias in entry.aliases {
                table.insert(&alias, &entry.emoji);
            }
        }
        Ok(table)
    }

    /// Load a gemoji JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, EmojiError> {
        let json = std::fs::read_to_string(path).map_err(|source| EmojiError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_gemoji_json(&json)?;
        tracing::info!(path = %path.display(), count = table.len(), "Loaded emoji table");
        Ok(table)
    }

    /// Add or replace an alias. Aliases are stored lowercase.
    pub fn insert(&mut self, alias: &str, glyph: &str) {
        self.glyphs.insert(alias.to_lowercase(), glyph.to_owned());
    }

    /// Merge another table into this one; its entries win.
    pub fn extend(&mut self, other: Self) {
        self.glyphs.extend(other.glyphs);
    }

    /// Number of aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether the table has no aliases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

impl EmojiLookup for EmojiTable {
    fn find(&self, alias: &str) -> Option<&str> {
        self.glyphs.get(alias).map(String::as_str)
    }
}
