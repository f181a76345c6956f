//! The route table and handler responses.

use std::path::PathBuf;

use http::StatusCode;
use purepress_core::{SiteUrls, paths::safe_join};

/// Every kind of URL a site serves.
///
/// Paths are site-relative (no url root prefix) and percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/`
    Index,
    /// `/page/<n>/`
    IndexPage(usize),
    /// `/post/<year>/<month>/<day>/<slug>/`
    Post {
        year: u32,
        month: u32,
        day: u32,
        slug: String,
    },
    /// `/archive/`
    Archive,
    /// `/category/<name>/`
    Category(String),
    /// `/tag/<name>/`
    Tag(String),
    /// `/feed.xml`
    Feed,
    /// `/404.html`
    NotFound,
    /// Any other path: a page, else a raw file. Stored without leading `/`.
    Page(String),
}

impl Route {
    /// Parse a site-relative path. Unmatched paths become [`Route::Page`].
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let rel = path.strip_prefix('/').unwrap_or(path);

        match rel {
            "" => return Self::Index,
            "archive/" => return Self::Archive,
            "feed.xml" => return Self::Feed,
            "404.html" => return Self::NotFound,
            _ => {}
        }

        if let Some(inner) = rel.strip_suffix('/') {
            let segments: Vec<&str> = inner.split('/').collect();
            match segments.as_slice() {
                ["page", n] if is_number(n) => {
                    if let Ok(n) = n.parse() {
                        return Self::IndexPage(n);
                    }
                }
                ["post", y, m, d, slug]
                    if is_number(y) && is_number(m) && is_number(d) && !slug.is_empty() =>
                {
                    if let (Ok(year), Ok(month), Ok(day)) = (y.parse(), m.parse(), d.parse()) {
                        return Self::Post {
                            year,
                            month,
                            day,
                            slug: (*slug).to_string(),
                        };
                    }
                }
                ["category", name] if !name.is_empty() => return Self::Category((*name).to_string()),
                ["tag", name] if !name.is_empty() => return Self::Tag((*name).to_string()),
                _ => {}
            }
        }

        Self::Page(rel.to_string())
    }

    /// Decoded site-relative path, starting with `/`.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Index => "/".to_string(),
            Self::IndexPage(n) => format!("/page/{n}/"),
            Self::Post {
                year,
                month,
                day,
                slug,
            } => format!("/post/{year:04}/{month:02}/{day:02}/{slug}/"),
            Self::Archive => "/archive/".to_string(),
            Self::Category(name) => format!("/category/{name}/"),
            Self::Tag(name) => format!("/tag/{name}/"),
            Self::Feed => "/feed.xml".to_string(),
            Self::NotFound => "/404.html".to_string(),
            Self::Page(rel) => format!("/{rel}"),
        }
    }

    /// Encoded URL including the url root.
    #[must_use]
    pub fn url(&self, urls: &SiteUrls) -> String {
        match self {
            Self::Index => urls.index(),
            Self::IndexPage(n) => urls.index_page(*n),
            Self::Post {
                year,
                month,
                day,
                slug,
            } => urls.post(*year, *month, *day, slug),
            Self::Archive => urls.archive(),
            Self::Category(name) => urls.category(name),
            Self::Tag(name) => urls.tag(name),
            Self::Feed => urls.feed(),
            Self::NotFound => urls.not_found(),
            Self::Page(rel) => urls.page(rel),
        }
    }

    /// Where a build writes this route, relative to the output directory.
    ///
    /// Directory-style paths get an `index.html`. `None` when the path
    /// would leave the output directory.
    #[must_use]
    pub fn output_path(&self, out_dir: &std::path::Path) -> Option<PathBuf> {
        let path = self.path();
        let rel = path.trim_start_matches('/');
        if rel.is_empty() || rel.ends_with('/') {
            safe_join(out_dir, &format!("{rel}index.html"))
        } else {
            safe_join(out_dir, rel)
        }
    }

    /// The canonical route for a path missing its trailing slash, if any.
    #[must_use]
    pub fn with_trailing_slash(path: &str) -> Option<Self> {
        if path.ends_with('/') {
            return None;
        }
        match Self::parse(&format!("{path}/")) {
            Self::Page(_) => None,
            route => Some(route),
        }
    }
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// A fully rendered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Vec<u8>,
    /// Redirect target for 3xx responses.
    pub location: Option<String>,
}

impl Response {
    pub const HTML: &'static str = "text/html; charset=utf-8";
    pub const RSS: &'static str = "application/rss+xml";

    #[must_use]
    pub fn html(status: StatusCode, body: String) -> Self {
        Self {
            status,
            content_type: Self::HTML.to_string(),
            body: body.into_bytes(),
            location: None,
        }
    }

    #[must_use]
    pub fn bytes(content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: content_type.into(),
            body,
            location: None,
        }
    }

    #[must_use]
    pub fn redirect(status: StatusCode, location: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            status,
            content_type: Self::HTML.to_string(),
            body: format!(
                "<!DOCTYPE html>\n<title>Redirecting...</title>\n<p>Redirecting to <a href=\"{0}\">{0}</a>.</p>\n",
                crate::html::escape(&location)
            )
            .into_bytes(),
            location: Some(location),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_parse_routes() {
        assert_eq!(Route::parse("/"), Route::Index);
        assert_eq!(Route::parse("/page/3/"), Route::IndexPage(3));
        assert_eq!(
            Route::parse("/post/2021/8/03/hello-world/"),
            Route::Post {
                year: 2021,
                month: 8,
                day: 3,
                slug: "hello-world".to_string()
            }
        );
        assert_eq!(Route::parse("/archive/"), Route::Archive);
        assert_eq!(Route::parse("/category/随笔/"), Route::Category("随笔".to_string()));
        assert_eq!(Route::parse("/tag/rust/"), Route::Tag("rust".to_string()));
        assert_eq!(Route::parse("/feed.xml"), Route::Feed);
        assert_eq!(Route::parse("/404.html"), Route::NotFound);
    }

    #[test]
    fn test_unmatched_paths_are_pages() {
        assert_eq!(Route::parse("/about/"), Route::Page("about/".to_string()));
        assert_eq!(Route::parse("/page/x/"), Route::Page("page/x/".to_string()));
        assert_eq!(Route::parse("/page/2"), Route::Page("page/2".to_string()));
        assert_eq!(
            Route::parse("/post/2021/08/03/a/b/"),
            Route::Page("post/2021/08/03/a/b/".to_string())
        );
    }

    #[test]
    fn test_path_round_trip() {
        for path in ["/", "/page/2/", "/post/2021/08/03/x/", "/tag/c++/", "/foo/bar.html"] {
            assert_eq!(Route::parse(path).path(), path);
        }
    }

    #[test]
    fn test_trailing_slash_redirect_target() {
        assert_eq!(Route::with_trailing_slash("/archive"), Some(Route::Archive));
        assert_eq!(Route::with_trailing_slash("/page/2"), Some(Route::IndexPage(2)));
        assert_eq!(Route::with_trailing_slash("/about"), None);
        assert_eq!(Route::with_trailing_slash("/archive/"), None);
    }

    #[test]
    fn test_output_paths() {
        let out = Path::new("/out");
        assert_eq!(Route::Index.output_path(out), Some(PathBuf::from("/out/index.html")));
        assert_eq!(
            Route::IndexPage(2).output_path(out),
            Some(PathBuf::from("/out/page/2/index.html"))
        );
        assert_eq!(Route::Feed.output_path(out), Some(PathBuf::from("/out/feed.xml")));
        assert_eq!(
            Route::Page("a/b.html".to_string()).output_path(out),
            Some(PathBuf::from("/out/a/b.html"))
        );
        assert_eq!(Route::Tag("..".to_string()).output_path(out), None);
    }

    #[test]
    fn test_redirect_response() {
        let response = Response::redirect(StatusCode::FOUND, "/");
        assert_eq!(response.status, StatusCode::FOUND);
        assert_eq!(response.location.as_deref(), Some("/"));
        assert!(!response.is_success());
    }
}
