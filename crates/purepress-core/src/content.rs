//! Content types: rendered entries, posts and pages.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::{frontmatter::Frontmatter, urls::SiteUrls};

/// One heading in a table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocNode {
    /// Heading level, 1 through 6.
    pub level: u8,
    /// Plain heading text.
    pub text: String,
    /// Anchor id of the heading.
    pub id: String,
    /// Deeper headings nested under this one.
    pub children: Vec<TocNode>,
}

/// A loaded content file: metadata plus rendered HTML.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Entry {
    pub meta: Frontmatter,
    /// Rendered HTML body, absent when only metadata was requested.
    pub content: Option<String>,
    pub toc: Vec<TocNode>,
    /// TOC rendered as nested `<ul>` lists.
    pub toc_html: Option<String>,
}

impl Entry {
    pub fn title(&self) -> &str {
        self.meta.title.as_deref().unwrap_or("")
    }
}

/// Components of a post filename `YYYY-MM-DD-slug.md`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostFilename {
    /// Original filename including extension.
    pub filename: String,
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub slug: String,
}

impl PostFilename {
    /// Parse a post filename.
    ///
    /// Returns `None` unless the stem has three numeric date fields forming a
    /// real calendar date followed by a non-empty slug.
    pub fn parse(filename: &str) -> Option<Self> {
        let stem = filename
            .rsplit_once('.')
            .map_or(filename, |(stem, _ext)| stem);

        let mut parts = stem.splitn(4, '-');
        let year = parse_number(parts.next()?)?;
        let month = parse_number(parts.next()?)?;
        let day = parse_number(parts.next()?)?;
        let slug = parts.next().filter(|slug| !slug.is_empty())?;

        let name = Self {
            filename: filename.to_string(),
            year,
            month,
            day,
            slug: slug.to_string(),
        };
        name.date().map(|_| name)
    }

    /// Calendar date encoded in the filename.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(i32::try_from(self.year).ok()?, self.month, self.day)
    }

    /// Title derived from the slug, with dashes read as spaces.
    pub fn default_title(&self) -> String {
        self.slug.replace('-', " ")
    }

    /// Midnight of the filename date.
    pub fn default_created(&self) -> Option<NaiveDateTime> {
        self.date().and_then(|date| date.and_hms_opt(0, 0, 0))
    }

    /// Whether the filename names the given date and slug.
    pub fn matches(&self, year: u32, month: u32, day: u32, slug: &str) -> bool {
        self.year == year && self.month == month && self.day == day && self.slug == slug
    }

    /// Canonical URL of the post.
    pub fn url(&self, urls: &SiteUrls) -> String {
        urls.post(self.year, self.month, self.day, &self.slug)
    }
}

fn parse_number(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// A dated blog entry from `posts/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub name: PostFilename,
    /// Canonical URL, root-relative with the site prefix.
    pub url: String,
    pub entry: Entry,
}

impl Post {
    pub fn title(&self) -> &str {
        self.entry.title()
    }

    /// Creation time; resolvers fill it from the filename when absent.
    pub fn created(&self) -> Option<NaiveDateTime> {
        self.entry.meta.created
    }

    pub fn updated(&self) -> Option<NaiveDateTime> {
        self.entry.meta.updated
    }

    pub fn tags(&self) -> &[String] {
        &self.entry.meta.tags
    }

    pub fn categories(&self) -> &[String] {
        &self.entry.meta.categories
    }

    pub fn is_hidden(&self) -> bool {
        self.entry.meta.hide
    }
}

/// A standalone page from `pages/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// Path relative to `pages/`, `/`-separated, without extension.
    pub rel_url: String,
    pub url: String,
    pub source: PathBuf,
    pub entry: Entry,
}

impl Page {
    pub fn title(&self) -> &str {
        self.entry.title()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_post_filename() {
        let name = PostFilename::parse("2021-08-03-hello-world.md").expect("valid");
        assert_eq!(name.year, 2021);
        assert_eq!(name.month, 8);
        assert_eq!(name.day, 3);
        assert_eq!(name.slug, "hello-world");
        assert_eq!(name.default_title(), "hello world");
        assert_eq!(name.url(&SiteUrls::default()), "/post/2021/08/03/hello-world/");
    }

    #[test]
    fn test_unpadded_date_fields() {
        let name = PostFilename::parse("2021-8-3-x.md").expect("valid");
        assert!(name.matches(2021, 8, 3, "x"));
        assert_eq!(name.url(&SiteUrls::default()), "/post/2021/08/03/x/");
    }

    #[test]
    fn test_invalid_post_filenames() {
        assert!(PostFilename::parse("notes.md").is_none());
        assert!(PostFilename::parse("2021-08-03.md").is_none());
        assert!(PostFilename::parse("2021-08-03-.md").is_none());
        assert!(PostFilename::parse("2021-ab-03-x.md").is_none());
        assert!(PostFilename::parse("2021-02-30-x.md").is_none());
        assert!(PostFilename::parse("2021-+8-03-x.md").is_none());
    }

    #[test]
    fn test_default_created_is_midnight() {
        let name = PostFilename::parse("1970-01-01-demo.md").expect("valid");
        assert_eq!(
            name.default_created().map(|dt| dt.to_string()),
            Some("1970-01-01 00:00:00".to_string())
        );
    }

    #[test]
    fn test_entry_title_defaults_to_empty() {
        assert_eq!(Entry::default().title(), "");
    }
}
