//! Configuration for the message content filter pipeline.
//!
//! Parses `filters.toml` with serde. Every section is optional and falls
//! back to the defaults used by the chat app:
//!
//! ```toml
//! [fragment]
//! attachment_tag = "action-text-attachment"
//!
//! [markdown]
//! enabled = true
//! autolink = true
//!
//! [unfurl]
//! content_type = "application/vnd.actiontext.opengraph-embed"
//!
//! [emoji]
//! builtin = true
//! table_path = "${EMOJI_TABLE:-}"
//! ```
//!
//! ## Environment Variable Expansion
//!
//! String values support `${VAR}` (error if unset) and `${VAR:-default}`.
//! Expanded fields:
//! - `fragment.attachment_tag`
//! - `unfurl.content_type`
//! - `emoji.table_path`

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "filters.toml";

/// Default tag of embedded attachments.
pub const DEFAULT_ATTACHMENT_TAG: &str = "action-text-attachment";

/// Default content type of link preview attachments.
pub const DEFAULT_UNFURL_CONTENT_TYPE: &str = "application/vnd.actiontext.opengraph-embed";

/// Pipeline configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fragment parsing.
    pub fragment: FragmentConfig,
    /// Markdown rendering.
    pub markdown: MarkdownConfig,
    /// Link preview handling.
    pub unfurl: UnfurlConfig,
    /// Emoji shortcodes.
    pub emoji: EmojiConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Fragment parsing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FragmentConfig {
    /// Tag name of opaque attachment elements.
    pub attachment_tag: String,
}

impl Default for FragmentConfig {
    fn default() -> Self {
        Self {
            attachment_tag: DEFAULT_ATTACHMENT_TAG.to_owned(),
        }
    }
}

/// Markdown configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Whether the markdown filter runs at all.
    pub enabled: bool,
    /// Whether bare URLs become links.
    pub autolink: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            autolink: true,
        }
    }
}

/// Link preview configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UnfurlConfig {
    /// `content-type` of link preview attachments.
    pub content_type: String,
}

impl Default for UnfurlConfig {
    fn default() -> Self {
        Self {
            content_type: DEFAULT_UNFURL_CONTENT_TYPE.to_owned(),
        }
    }
}

/// Emoji configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmojiConfig {
    /// Include the built-in aliases.
    pub builtin: bool,
    /// Optional gemoji-format JSON file. Empty means none.
    /// Relative paths are resolved against the config file directory.
    pub table_path: Option<String>,
}

impl Default for EmojiConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            table_path: None,
        }
    }
}

impl EmojiConfig {
    /// Table file path, if one is configured.
    #[must_use]
    pub fn table_path(&self) -> Option<&Path> {
        self.table_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(Path::new)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`emoji.table_path`").
        field: String,
        /// Error message (e.g., "${`EMOJI_TABLE`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `filters.toml` in the current directory and its parents, falling
    /// back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist, or if
    /// reading, parsing, expansion or validation fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }

        match Self::discover_config() {
            Some(discovered) => Self::load_from_file(&discovered),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string.
    ///
    /// Relative paths are left as written.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, expansion or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any check fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_tag_name(&self.fragment.attachment_tag, "fragment.attachment_tag")?;
        if self.unfurl.content_type.trim().is_empty() {
            return Err(ConfigError::Validation(
                "unfurl.content_type cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;
        Ok(config)
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.fragment.attachment_tag =
            expand::expand_env(&self.fragment.attachment_tag, "fragment.attachment_tag")?;
        self.unfurl.content_type =
            expand::expand_env(&self.unfurl.content_type, "unfurl.content_type")?;
        if let Some(ref path) = self.emoji.table_path {
            self.emoji.table_path = Some(expand::expand_env(path, "emoji.table_path")?);
        }
        Ok(())
    }

    fn resolve_paths(&mut self, config_dir: &Path) {
        if let Some(path) = self.emoji.table_path()
            && path.is_relative()
        {
            let resolved = config_dir.join(path);
            self.emoji.table_path = Some(resolved.to_string_lossy().into_owned());
        }
    }
}

/// Require a valid element name: ASCII letter first, then letters, digits,
/// `-`, `_` or `.`.
fn require_tag_name(value: &str, field: &str) -> Result<(), ConfigError> {
    let mut chars = value.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(ConfigError::Validation(format!(
            "{field} must be a valid tag name, got {value:?}"
        )));
    }
    Ok(())
}
