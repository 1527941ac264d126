//! Error type for the pipeline facade.

/// Pipeline error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] cf_config::ConfigError),
    /// Emoji table loading or substitution failed.
    #[error(transparent)]
    Emoji(#[from] cf_emoji::EmojiError),
    /// Message markup could not be parsed.
    #[error("Invalid message markup: {0}")]
    Fragment(#[from] cf_fragment::FragmentError),
}
