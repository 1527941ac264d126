//! Error types for emoji tables and substitution.

use std::path::PathBuf;

/// Error loading an emoji table or rewriting a body.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EmojiError {
    /// Emoji table file could not be read.
    #[error("failed to read emoji table {}: {source}", path.display())]
    Io {
        /// Table file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Emoji table is not valid gemoji JSON.
    #[error("invalid emoji table: {0}")]
    Json(#[from] serde_json::Error),

    /// Rewritten body could not be parsed back into a fragment.
    #[error("failed to parse emojified body: {0}")]
    Fragment(#[from] cf_fragment::FragmentError),
}
