//! On-disk layout of a purepress instance.

use std::path::{Path, PathBuf};

/// Environment variable selecting the instance root.
pub const INSTANCE_ENV: &str = "PUREPRESS_INSTANCE";

/// Name of the configuration file at the instance root.
pub const CONFIG_FILE: &str = "purepress.toml";

/// Folder layout of an instance, all relative to one root directory.
///
/// ```text
/// <root>/purepress.toml
/// <root>/posts/            YYYY-MM-DD-slug.md
/// <root>/pages/            any/path.md
/// <root>/static/           served under /static/
/// <root>/raw/              served as-is from the site root
/// <root>/theme/templates/  theme templates, custom/ overrides first
/// <root>/theme/static/     served under /static/theme/
/// <root>/build/            build output
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    root: PathBuf,
}

impl Instance {
    /// Create an instance rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.root.join("posts")
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.root.join("pages")
    }

    pub fn static_dir(&self) -> PathBuf {
        self.root.join("static")
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn theme_templates_dir(&self) -> PathBuf {
        self.root.join("theme").join("templates")
    }

    pub fn theme_static_dir(&self) -> PathBuf {
        self.root.join("theme").join("static")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    /// Content directories a preview server should watch for changes.
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.posts_dir(),
            self.pages_dir(),
            self.static_dir(),
            self.raw_dir(),
            self.root.join("theme"),
        ]
    }
}
