//! Error types for the purepress core library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types for purepress.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration loading or validation error.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Front-matter block could not be split or parsed.
    #[error("Front-matter error in {}: {message}", path.display())]
    Frontmatter { path: PathBuf, message: String },

    /// The url root given to a build is unusable.
    #[error("Invalid url root {url:?}: {message}")]
    UrlRoot { url: String, message: String },

    /// Layered configuration error.
    #[error("Config crate error: {0}")]
    ConfigCrate(#[from] config::ConfigError),
}

impl CoreError {
    /// Create a new configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new front-matter error.
    pub fn frontmatter(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Frontmatter {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new url root error.
    pub fn url_root(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UrlRoot {
            url: url.into(),
            message: message.into(),
        }
    }
}
