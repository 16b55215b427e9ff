//! Error types for configuration loading and lookup.

use std::path::PathBuf;

/// Errors from loading a config file or reading a value out of it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A config file could not be read.
    #[error("read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config source is not valid TOML.
    #[error("decode TOML from {origin}: {source}")]
    Parse {
        /// File path, or `<inline>` for strings.
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    /// The TOML is valid but uses a shape this config does not hold
    /// (nested tables, datetimes, mixed-type arrays).
    #[error("key '{key}': {reason}")]
    Unsupported { key: String, reason: String },

    /// No such category.
    #[error("category '{0}' not found")]
    MissingCategory(String),

    /// The category exists but the key does not.
    #[error("key '{key}' not found in category '{category}'")]
    MissingKey { category: String, key: String },

    /// The key exists but holds a different type.
    #[error("value for '{category}.{key}' is not {expected} (found {found})")]
    WrongType {
        category: String,
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The value has the right type but cannot be used, e.g. a port above
    /// 65535 or an unparseable duration.
    #[error("value for '{category}.{key}' is invalid: {reason}")]
    InvalidValue {
        category: String,
        key: String,
        reason: String,
    },
}

impl ConfigError {
    /// Builds an [`InvalidValue`](Self::InvalidValue) error.
    pub fn invalid(
        category: &str,
        key: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            category: category.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
