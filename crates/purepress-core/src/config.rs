//! Site configuration management.
//!
//! The configuration lives in `purepress.toml` at the instance root and is
//! read once at startup. It has two sections: `[site]` describes the site
//! itself and `[config]` tunes generator behavior. Keys that purepress does
//! not know about are kept and handed to templates as `site.<key>` and
//! `config.<key>`.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    timezone::SiteTimezone,
};

/// Prefix for environment overrides, e.g. `PUREPRESS__SITE__TITLE`.
pub const ENV_PREFIX: &str = "PUREPRESS";

/// Main configuration structure for purepress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Site metadata.
    #[serde(default)]
    pub site: SiteConfig,

    /// Generator behavior.
    #[serde(default)]
    pub config: BehaviorConfig,
}

/// Site metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title.
    #[serde(default)]
    pub title: String,

    /// Site subtitle, also used as the feed description.
    #[serde(default)]
    pub subtitle: String,

    /// Site author name.
    #[serde(default)]
    pub author: Option<String>,

    /// Timezone for feed timestamps: `UTC+08:00` or an IANA name.
    #[serde(default)]
    pub timezone: Option<String>,

    /// Unrecognized keys, passed through to templates.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

/// Generator behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Number of posts on each index page.
    #[serde(default = "default_posts_per_index_page")]
    pub posts_per_index_page: usize,

    /// Default TOC depth; 0 keeps every heading level.
    #[serde(default)]
    pub toc_depth: usize,

    /// Feed id for the `follow_challenge` feed element.
    #[serde(default, deserialize_with = "deserialize_scalar_text")]
    pub feed_id: Option<String>,

    /// User id for the `follow_challenge` feed element.
    #[serde(default, deserialize_with = "deserialize_scalar_text")]
    pub user_id: Option<String>,

    /// Syntect theme for fenced code blocks. Unset leaves code unhighlighted.
    #[serde(default)]
    pub highlight_theme: Option<String>,

    /// Unrecognized keys, passed through to templates.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

fn default_posts_per_index_page() -> usize {
    5
}

/// Ids may be written as numbers in TOML or parsed as numbers from the
/// environment; both are kept as text.
fn deserialize_scalar_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(s) => s,
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            posts_per_index_page: default_posts_per_index_page(),
            toc_depth: 0,
            feed_id: None,
            user_id: None,
            highlight_theme: None,
            extra: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file layered with `PUREPRESS__*`
    /// environment variables.
    ///
    /// A missing file is not an error: every key has a default.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "configuration file not found, using defaults");
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize().map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| CoreError::config_with_source("Failed to parse config", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.config.posts_per_index_page == 0 {
            return Err(CoreError::config(
                "config.posts_per_index_page must be at least 1",
            ));
        }

        if self.config.feed_id.is_some() != self.config.user_id.is_some() {
            tracing::warn!("feed_id and user_id must both be set for the follow challenge");
        }

        Ok(())
    }

    /// Resolve the configured site timezone, falling back to UTC.
    pub fn timezone(&self) -> SiteTimezone {
        self.site
            .timezone
            .as_deref()
            .map(SiteTimezone::parse)
            .unwrap_or_default()
    }

    /// Flatten the pass-through keys into `(name, value)` pairs for templates.
    pub fn template_vars(&self) -> Vec<(String, String)> {
        let site = self
            .site
            .extra
            .iter()
            .map(|(k, v)| (format!("site.{k}"), toml_to_text(v)));
        let config = self
            .config
            .extra
            .iter()
            .map(|(k, v)| (format!("config.{k}"), toml_to_text(v)));
        site.chain(config).collect()
    }
}

fn toml_to_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
