//! Post collection.
//!
//! Posts live flat in `posts/` as `YYYY-MM-DD-slug.md`. Nothing is cached:
//! every call reads the directory and the files again.

use std::{cmp::Reverse, path::Path};

use chrono::NaiveDateTime;
use purepress_core::{Post, PostFilename, SiteUrls, paths::is_single_segment};
use purepress_parser::{EntryLoader, LoadOptions};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::site::SiteError;

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, SiteError>;

/// Loads posts from the posts directory.
#[derive(Debug, Clone, Copy)]
pub struct PostResolver<'a> {
    loader: &'a EntryLoader,
    urls: &'a SiteUrls,
    posts_dir: &'a Path,
}

impl<'a> PostResolver<'a> {
    #[must_use]
    pub fn new(loader: &'a EntryLoader, urls: &'a SiteUrls, posts_dir: &'a Path) -> Self {
        Self {
            loader,
            urls,
            posts_dir,
        }
    }

    /// Load one post by filename.
    ///
    /// Returns `None` for filenames that do not follow the post naming
    /// convention and for files that do not exist.
    pub fn load_post(&self, filename: &str, options: LoadOptions) -> Result<Option<Post>> {
        if !is_single_segment(filename) {
            return Ok(None);
        }
        let Some(name) = PostFilename::parse(filename) else {
            debug!(filename, "not a post filename");
            return Ok(None);
        };

        let Some(mut entry) = self.loader.load(&self.posts_dir.join(filename), options)? else {
            return Ok(None);
        };

        if entry.meta.title.is_none() {
            entry.meta.title = Some(name.default_title());
        }
        if entry.meta.created.is_none() {
            entry.meta.created = name.default_created();
        }

        Ok(Some(Post {
            url: name.url(self.urls),
            name,
            entry,
        }))
    }

    /// Load every visible post, newest first.
    ///
    /// Posts without a creation time sort last; equal times fall back to
    /// filename order, also descending.
    pub fn load_posts(&self, meta_only: bool) -> Result<Vec<Post>> {
        let options = if meta_only {
            LoadOptions::META
        } else {
            LoadOptions::FULL
        };

        let mut posts = Vec::new();
        for filename in self.post_filenames() {
            match self.load_post(&filename, options)? {
                Some(post) if post.is_hidden() => debug!(filename = %filename, "skipping hidden post"),
                Some(post) => posts.push(post),
                None => {}
            }
        }

        posts.sort_by_cached_key(|post| {
            Reverse((
                post.created().unwrap_or(NaiveDateTime::MIN),
                post.name.filename.clone(),
            ))
        });
        Ok(posts)
    }

    /// Find the post served at a canonical URL.
    ///
    /// The zero-padded filename is tried first; otherwise the directory is
    /// scanned for a file whose date fields have the same numeric values.
    pub fn find_post(
        &self,
        year: u32,
        month: u32,
        day: u32,
        slug: &str,
        options: LoadOptions,
    ) -> Result<Option<Post>> {
        let canonical = format!("{year:04}-{month:02}-{day:02}-{slug}.md");
        if let Some(post) = self.load_post(&canonical, options)? {
            return Ok(Some(post));
        }

        let matching = self.post_filenames().into_iter().find(|filename| {
            PostFilename::parse(filename).is_some_and(|name| name.matches(year, month, day, slug))
        });
        match matching {
            Some(filename) => self.load_post(&filename, options),
            None => Ok(None),
        }
    }

    /// Names of the `.md` files directly inside the posts directory.
    fn post_filenames(&self) -> Vec<String> {
        if !self.posts_dir.is_dir() {
            return Vec::new();
        }
        WalkDir::new(self.posts_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "failed to read posts directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| name.ends_with(".md"))
            .collect()
    }
}
