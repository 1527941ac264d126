//! Content filters for chat message bodies.
//!
//! Messages are stored as rich-text fragments. Before display they pass
//! through a [`FilterChain`]: markdown rendering for messages typed as
//! markdown, removal of URL text that duplicates a link preview, and HTML
//! sanitizing. Emoji shortcodes are handled separately, once, when a body
//! is saved.
//!
//! [`Pipeline`] wires both paths from a [`cf_config::Config`]:
//!
//! ```
//! use cf_config::Config;
//! use cf_filters::Pipeline;
//!
//! let pipeline = Pipeline::new(&Config::default()).unwrap();
//! let html = pipeline.render("**Ship it**").unwrap();
//! assert_eq!(html, "<p><strong>Ship it</strong></p>\n");
//! ```

mod error;
mod filter;
mod markdown;
mod pipeline;
mod sanitize;
mod unfurl;

pub use error::PipelineError;
pub use filter::{Filter, FilterChain};
pub use markdown::MarkdownFilter;
pub use pipeline::{Pipeline, presentation_chain};
pub use sanitize::{
    ATTACHMENT_ATTRIBUTES, ATTACHMENT_TAG, AmmoniaSanitizer, SanitizeTags, Sanitizer,
};
pub use unfurl::RemoveSoloUnfurledLinkText;

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(FilterChain: Send, Sync);
    static_assertions::assert_impl_all!(Pipeline: Send, Sync);
    static_assertions::assert_impl_all!(MarkdownFilter: Filter);
    static_assertions::assert_impl_all!(RemoveSoloUnfurledLinkText: Filter);
    static_assertions::assert_impl_all!(SanitizeTags: Filter);
}
