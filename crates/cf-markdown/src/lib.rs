//! Markdown support for chat messages.
//!
//! Three stages, used in order by the markdown content filter:
//!
//! 1. [`has_markdown`] decides whether plain message text looks like
//!    markdown at all.
//! 2. [`normalize_lists`] separates list blocks from surrounding prose with
//!    blank lines.
//! 3. [`MarkdownRenderer`] converts the text to a restricted, safe subset of
//!    HTML.
//!
//! # Example
//!
//! ```
//! use cf_markdown::{MarkdownRenderer, has_markdown, normalize_lists};
//!
//! let text = "Todo:\n* **milk**\n* eggs";
//! assert!(has_markdown(text));
//!
//! let html = MarkdownRenderer::new().render(&normalize_lists(text));
//! assert!(html.contains("<li><strong>milk</strong></li>"));
//! ```

mod autolink;
mod detector;
mod fence;
mod normalizer;
mod renderer;

pub use detector::{MarkdownRule, has_markdown, matching_rules};
pub use normalizer::normalize_lists;
pub use renderer::MarkdownRenderer;
