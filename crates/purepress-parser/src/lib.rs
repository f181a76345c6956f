//! Purepress Parser Library
//!
//! Loads content files: front-matter, Markdown rendering and TOC extraction.

pub mod links;
pub mod markdown;
pub mod syntax;
pub mod toc;

use std::path::{Path, PathBuf};

pub use markdown::{MarkdownRenderer, Rendered};
use purepress_core::{Config, CoreError, Entry, SiteUrls, frontmatter::parse_frontmatter};
pub use syntax::SyntaxHighlighter;
use thiserror::Error;

/// Parser errors.
#[derive(Debug, Error)]
pub enum ParserError {
    /// Front-matter could not be parsed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Content file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// What to produce when loading an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Skip Markdown rendering; only front-matter is read.
    pub meta_only: bool,
    /// Extract a table of contents from the rendered body.
    pub parse_toc: bool,
}

impl LoadOptions {
    pub const META: Self = Self {
        meta_only: true,
        parse_toc: false,
    };

    pub const FULL: Self = Self {
        meta_only: false,
        parse_toc: false,
    };

    pub const WITH_TOC: Self = Self {
        meta_only: false,
        parse_toc: true,
    };
}

/// Reads content files into [`Entry`] records.
#[derive(Debug)]
pub struct EntryLoader {
    renderer: MarkdownRenderer,
    toc_depth: usize,
}

impl EntryLoader {
    /// Create a loader for a site's configuration and URL layout.
    pub fn new(config: &Config, urls: SiteUrls) -> Self {
        Self {
            renderer: MarkdownRenderer::new(urls, config.config.highlight_theme.as_deref()),
            toc_depth: config.config.toc_depth,
        }
    }

    /// Load the entry at `path`. A missing file is `Ok(None)`.
    pub fn load(&self, path: &Path, options: LoadOptions) -> Result<Option<Entry>> {
        if !path.is_file() {
            return Ok(None);
        }

        let source = std::fs::read_to_string(path).map_err(|source| ParserError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), meta_only = options.meta_only, "loading entry");

        let (meta, body) = parse_frontmatter(&source, path)?;
        let mut entry = Entry {
            meta,
            ..Entry::default()
        };

        if options.meta_only {
            return Ok(Some(entry));
        }

        let rendered = self.renderer.render(&body);
        entry.content = Some(rendered.html);

        if options.parse_toc {
            let depth = entry.meta.toc_depth.unwrap_or(self.toc_depth);
            entry.toc = toc::build_tree(rendered.headings, depth);
            entry.toc_html = Some(toc::render_toc(&entry.toc));
        }

        Ok(Some(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader(config: &str) -> EntryLoader {
        let config = Config::from_toml(config).expect("config");
        EntryLoader::new(&config, SiteUrls::default())
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).expect("write");
        path
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = loader("").load(&dir.path().join("nope.md"), LoadOptions::FULL);
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_meta_only_skips_rendering() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "a.md", "---\ntitle: A\n---\n# Heading\n");

        let entry = loader("")
            .load(&path, LoadOptions::META)
            .expect("load")
            .expect("exists");
        assert_eq!(entry.title(), "A");
        assert!(entry.content.is_none());
        assert!(entry.toc_html.is_none());
    }

    #[test]
    fn test_full_load_with_toc() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "a.md", "# One\n\n## Two\n\n### Three\n");

        let entry = loader("")
            .load(&path, LoadOptions::WITH_TOC)
            .expect("load")
            .expect("exists");
        assert!(entry.content.as_deref().is_some_and(|c| c.contains("<h1 id=\"one\">")));
        assert_eq!(entry.toc.len(), 1);
        assert_eq!(entry.toc[0].children[0].children[0].text, "Three");
        assert!(entry.toc_html.as_deref().is_some_and(|t| t.contains("href=\"#three\"")));
    }

    #[test]
    fn test_entry_toc_depth_overrides_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(
            dir.path(),
            "a.md",
            "---\ntoc_depth: 1\n---\n# One\n\n## Two\n",
        );

        let entry = loader("[config]\ntoc_depth = 3\n")
            .load(&path, LoadOptions::WITH_TOC)
            .expect("load")
            .expect("exists");
        assert_eq!(entry.toc.len(), 1);
        assert!(entry.toc[0].children.is_empty());
    }

    #[test]
    fn test_config_toc_depth_applies() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "a.md", "# One\n\n## Two\n");

        let entry = loader("[config]\ntoc_depth = 1\n")
            .load(&path, LoadOptions::WITH_TOC)
            .expect("load")
            .expect("exists");
        assert!(entry.toc[0].children.is_empty());
    }

    #[test]
    fn test_bad_frontmatter_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "a.md", "---\ntitle: x\nno end\n");

        let result = loader("").load(&path, LoadOptions::FULL);
        assert!(matches!(result, Err(ParserError::Core(CoreError::Frontmatter { .. }))));
    }
}
