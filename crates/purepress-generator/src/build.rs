//! Build orchestration.
//!
//! A build is a crawl: every route the site can serve is requested through
//! [`Site::handle`] and the response body is written to the analogous path
//! under `<instance>/build`.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use http::StatusCode;
use purepress_core::paths::is_single_segment;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::{
    assets::{self, AssetError},
    routes::{Response, Route},
    site::{Site, SiteError},
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Rendering a route failed.
    #[error("render error: {0}")]
    Site(#[from] SiteError),

    /// Copying static files failed.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// IO error on the output tree.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walking the pages directory failed.
    #[error("failed to walk pages: {0}")]
    Walk(#[from] walkdir::Error),

    /// A category or tag cannot be written as a directory name.
    #[error("{kind} name {name:?} is not a valid path segment")]
    InvalidName { kind: &'static str, name: String },

    /// A route that must exist did not render successfully.
    #[error("{path} returned {status}")]
    UnexpectedStatus { path: String, status: StatusCode },
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Standalone pages rendered.
    pub pages: usize,

    /// Posts rendered.
    pub posts: usize,

    /// Archive, category and tag listings rendered.
    pub listings: usize,

    /// Index pages rendered, including the first.
    pub index_pages: usize,

    /// Static and raw files copied.
    pub assets: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Site builder that crawls a [`Site`] into static files.
#[derive(Debug)]
pub struct Builder<'a> {
    site: &'a Site,
    output_dir: PathBuf,
}

impl<'a> Builder<'a> {
    /// Create a builder writing to the instance's build directory.
    #[must_use]
    pub fn new(site: &'a Site) -> Self {
        Self {
            output_dir: site.instance().build_dir(),
            site,
        }
    }

    /// Write somewhere other than `<instance>/build`.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Execute the full build process.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();
        let mut stats = BuildStats::default();

        info!(
            instance = %self.site.instance().root().display(),
            output = %self.output_dir.display(),
            "starting build"
        );

        // 1. Clean output directory
        self.clean_output()?;

        // 2. Copy static trees
        stats.assets = self.copy_assets()?;

        // 3. Pages
        stats.pages = self.build_pages()?;

        // 4. Posts, then the listings they imply
        let (posts, categories, tags) = self.build_posts()?;
        stats.posts = posts;
        stats.listings = self.build_listings(&categories, &tags)?;

        // 5. Index pages
        stats.index_pages = self.build_index()?;

        // 6. Feed and not-found page
        self.write_route(&Route::Feed, StatusCode::OK)?;
        self.write_route(&Route::NotFound, StatusCode::NOT_FOUND)?;

        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            pages = stats.pages,
            posts = stats.posts,
            listings = stats.listings,
            index_pages = stats.index_pages,
            assets = stats.assets,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Recreate the output directory.
    fn clean_output(&self) -> Result<()> {
        if self.output_dir.exists() {
            debug!(dir = %self.output_dir.display(), "cleaning output directory");
            fs::remove_dir_all(&self.output_dir).map_err(|source| BuildError::Io {
                path: self.output_dir.clone(),
                source,
            })?;
        }
        fs::create_dir_all(&self.output_dir).map_err(|source| BuildError::Io {
            path: self.output_dir.clone(),
            source,
        })
    }

    /// Raw files land at the site root; theme static before site static.
    fn copy_assets(&self) -> Result<usize> {
        let instance = self.site.instance();
        let static_out = self.output_dir.join("static");

        let mut count = assets::copy_dir_contents(&instance.raw_dir(), &self.output_dir)?;
        count += assets::copy_dir_contents(&instance.theme_static_dir(), &static_out.join("theme"))?;
        count += assets::copy_dir_contents(&instance.static_dir(), &static_out)?;
        Ok(count)
    }

    /// Render every Markdown file under the pages directory.
    fn build_pages(&self) -> Result<usize> {
        let pages_dir = self.site.instance().pages_dir();
        if !pages_dir.is_dir() {
            return Ok(0);
        }

        let mut count = 0;
        let walker = WalkDir::new(&pages_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(rel_url) = page_url(&pages_dir, entry.path()) else {
                continue;
            };
            self.write_route(&Route::Page(rel_url), StatusCode::OK)?;
            count += 1;
        }

        info!(count, "rendered pages");
        Ok(count)
    }

    /// Render every post and collect the category and tag names they use.
    fn build_posts(&self) -> Result<(usize, BTreeSet<String>, BTreeSet<String>)> {
        let posts = self.site.posts().load_posts(true)?;
        let mut categories = BTreeSet::new();
        let mut tags = BTreeSet::new();

        for post in &posts {
            let name = &post.name;
            let route = Route::Post {
                year: name.year,
                month: name.month,
                day: name.day,
                slug: name.slug.clone(),
            };
            self.write_route(&route, StatusCode::OK)?;
            categories.extend(post.categories().iter().cloned());
            tags.extend(post.tags().iter().cloned());
        }

        info!(count = posts.len(), "rendered posts");
        Ok((posts.len(), categories, tags))
    }

    /// Archive, then one listing per category and tag.
    fn build_listings(&self, categories: &BTreeSet<String>, tags: &BTreeSet<String>) -> Result<usize> {
        for (kind, names) in [("category", categories), ("tag", tags)] {
            if let Some(name) = names.iter().find(|name| !is_single_segment(name)) {
                return Err(BuildError::InvalidName {
                    kind,
                    name: name.clone(),
                });
            }
        }

        self.write_route(&Route::Archive, StatusCode::OK)?;
        for name in categories {
            self.write_route(&Route::Category(name.clone()), StatusCode::OK)?;
        }
        for name in tags {
            self.write_route(&Route::Tag(name.clone()), StatusCode::OK)?;
        }

        Ok(1 + categories.len() + tags.len())
    }

    /// Page 1 at `/`, then `/page/<n>/` until a page does not render.
    fn build_index(&self) -> Result<usize> {
        self.write_route(&Route::Index, StatusCode::OK)?;

        let mut count = 1;
        for n in 2.. {
            let route = Route::IndexPage(n);
            let response = self.site.render_route(&route)?;
            if response.status != StatusCode::OK {
                debug!(page = n, status = %response.status, "end of index pages");
                break;
            }
            self.write_response(&route, &response)?;
            count += 1;
        }

        info!(count, "rendered index pages");
        Ok(count)
    }

    /// Render a route and write its body, requiring `expected` status.
    ///
    /// Routes are rendered directly so a page whose path collides with a
    /// fixed route (`pages/404.md`) still renders as a page.
    fn write_route(&self, route: &Route, expected: StatusCode) -> Result<()> {
        let path = route.path();
        let response = self.site.render_route(route)?;
        if response.status != expected {
            return Err(BuildError::UnexpectedStatus {
                path,
                status: response.status,
            });
        }
        self.write_response(route, &response)
    }

    fn write_response(&self, route: &Route, response: &Response) -> Result<()> {
        let path = route.path();
        let output_path = route
            .output_path(&self.output_dir)
            .ok_or_else(|| BuildError::UnexpectedStatus {
                path: path.clone(),
                status: StatusCode::BAD_REQUEST,
            })?;

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|source| BuildError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&output_path, &response.body).map_err(|source| BuildError::Io {
            path: output_path.clone(),
            source,
        })?;

        debug!(route = %path, output = %output_path.display(), "wrote route");
        Ok(())
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// `pages/a/b.md` is served at `a/b.html`.
fn page_url(pages_dir: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(pages_dir).ok()?;
    if relative.extension()? != "md" {
        return None;
    }
    let html = relative.with_extension("html");
    let segments = html
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use purepress_core::{Config, Instance, SiteUrls};
    use tempfile::TempDir;

    use super::*;

    fn site(dir: &TempDir) -> Site {
        Site::new(
            Arc::new(Config::default()),
            Instance::new(dir.path()),
            SiteUrls::default(),
            true,
        )
    }

    #[test]
    fn test_page_url() {
        let root = Path::new("/blog/pages");
        assert_eq!(
            page_url(root, Path::new("/blog/pages/about/index.md")),
            Some("about/index.html".to_string())
        );
        assert_eq!(page_url(root, Path::new("/blog/pages/x.md")), Some("x.html".to_string()));
        assert_eq!(page_url(root, Path::new("/blog/pages/x.png")), None);
    }

    #[test]
    fn test_build_empty_site() {
        let dir = TempDir::new().unwrap();
        let site = site(&dir);

        let stats = Builder::new(&site).build().unwrap();

        assert_eq!(stats.posts, 0);
        assert_eq!(stats.index_pages, 1);
        assert_eq!(stats.listings, 1);
        let build = dir.path().join("build");
        assert!(build.join("index.html").exists());
        assert!(build.join("archive/index.html").exists());
        assert!(build.join("feed.xml").exists());
        assert!(build.join("404.html").exists());
    }

    #[test]
    fn test_build_cleans_previous_output() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("build/stale.html");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        Builder::new(&site(&dir)).build().unwrap();
        assert!(!stale.exists());
    }

    #[test]
    fn test_invalid_tag_aborts() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("posts")).unwrap();
        fs::write(
            dir.path().join("posts/2021-01-01-x.md"),
            "---\ntags: a/b\n---\nbody",
        )
        .unwrap();

        let err = Builder::new(&site(&dir)).build().unwrap_err();
        assert!(matches!(err, BuildError::InvalidName { kind: "tag", .. }));
    }

    #[test]
    fn test_hidden_pages_skipped() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pages/.drafts")).unwrap();
        fs::write(dir.path().join("pages/.drafts/x.md"), "draft").unwrap();
        fs::write(dir.path().join("pages/about.md"), "About me").unwrap();

        let stats = Builder::new(&site(&dir)).build().unwrap();
        assert_eq!(stats.pages, 1);
        assert!(dir.path().join("build/about.html").exists());
        assert!(!dir.path().join("build/.drafts").exists());
    }
}
