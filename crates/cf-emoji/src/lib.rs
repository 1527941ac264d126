//! Emoji shortcodes for chat messages.
//!
//! `:heart:` becomes ❤️ when a message body is created or edited. The alias
//! table is an injected [`EmojiLookup`]; [`EmojiTable`] provides a built-in
//! set of common aliases and loads gemoji-format JSON files.
//!
//! ```
//! use std::sync::Arc;
//!
//! use cf_emoji::{EmojiTable, Emojifier};
//!
//! let emojifier = Emojifier::new(Arc::new(EmojiTable::builtin()));
//! assert_eq!(emojifier.emojify("Hi :wave:"), "Hi \u{1f44b}");
//! ```

mod body;
mod emojifier;
mod error;
mod table;

pub use body::MessageBody;
pub use emojifier::Emojifier;
pub use error::EmojiError;
pub use table::{EmojiLookup, EmojiTable};
