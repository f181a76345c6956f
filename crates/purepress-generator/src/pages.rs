//! Standalone pages under `pages/`.

use std::path::{Path, PathBuf};

use purepress_core::{Page, SiteUrls, paths::safe_join};
use purepress_parser::{EntryLoader, LoadOptions};

use crate::collector::Result;

/// Maps page URLs onto Markdown files under the pages directory.
#[derive(Debug, Clone, Copy)]
pub struct PageResolver<'a> {
    loader: &'a EntryLoader,
    urls: &'a SiteUrls,
    pages_dir: &'a Path,
}

impl<'a> PageResolver<'a> {
    #[must_use]
    pub fn new(loader: &'a EntryLoader, urls: &'a SiteUrls, pages_dir: &'a Path) -> Self {
        Self {
            loader,
            urls,
            pages_dir,
        }
    }

    /// Source file for a page URL relative to the site root. `None` when the
    /// URL would leave the pages directory.
    ///
    /// - `""`, `dir/` → `index.md` inside
    /// - `name.html` → `name.md`
    /// - anything else → `<url>.md`
    #[must_use]
    pub fn source_path(&self, rel_url: &str) -> Option<PathBuf> {
        let rel_file = if rel_url.is_empty() || rel_url.ends_with('/') {
            format!("{rel_url}index.md")
        } else if let Some(stem) = rel_url.strip_suffix(".html") {
            format!("{stem}.md")
        } else {
            format!("{rel_url}.md")
        };
        safe_join(self.pages_dir, &rel_file)
    }

    /// Load the page served at `rel_url`, always with rendered content.
    pub fn load_page(&self, rel_url: &str, parse_toc: bool) -> Result<Option<Page>> {
        let Some(source) = self.source_path(rel_url) else {
            return Ok(None);
        };
        let options = if parse_toc {
            LoadOptions::WITH_TOC
        } else {
            LoadOptions::FULL
        };
        let Some(mut entry) = self.loader.load(&source, options)? else {
            return Ok(None);
        };

        if entry.meta.title.is_none() {
            let stem = source
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default();
            entry.meta.title = Some(stem.replace('-', " "));
        }

        Ok(Some(Page {
            rel_url: rel_url.to_string(),
            url: self.urls.page(rel_url),
            source,
            entry,
        }))
    }
}
