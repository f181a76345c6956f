//! URL generation for every route of a site.
//!
//! All URLs are root-relative and carry the site's path prefix, so a build
//! can be hosted under a sub-path such as `https://example.com/blog/`.

use url::Url;

use crate::error::{CoreError, Result};

/// Scheme, host and path prefix the site is served under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrls {
    scheme: String,
    host: String,
    /// Path prefix without trailing slash; empty when hosted at `/`.
    root: String,
}

impl Default for SiteUrls {
    fn default() -> Self {
        Self::new("http", "localhost", "/")
    }
}

impl SiteUrls {
    /// Create URL settings from parts. `root` may have or lack slashes.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, root: &str) -> Self {
        let root = root.trim_matches('/');
        Self {
            scheme: scheme.into(),
            host: host.into(),
            root: if root.is_empty() {
                String::new()
            } else {
                format!("/{root}")
            },
        }
    }

    /// Derive URL settings from a user supplied url root such as
    /// `http://example.com/blog/`.
    ///
    /// The returned flag is `false` when the input carried no host and
    /// `localhost` was substituted.
    pub fn from_url_root(url_root: &str) -> Result<(Self, bool)> {
        let url_root = url_root.trim();
        match Url::parse(url_root) {
            Ok(url) => {
                let Some(host) = url.host_str() else {
                    return Err(CoreError::url_root(url_root, "missing server name"));
                };
                let host = match url.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                };
                Ok((Self::new(url.scheme(), host, url.path()), true))
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok((Self::new("http", "localhost", url_root), false))
            }
            Err(e) => Err(CoreError::url_root(url_root, e.to_string())),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// The same scheme and root served under another host.
    #[must_use]
    pub fn with_host(&self, host: impl Into<String>) -> Self {
        Self {
            scheme: self.scheme.clone(),
            host: host.into(),
            root: self.root.clone(),
        }
    }

    /// Path prefix, empty or starting with `/` without a trailing slash.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// `scheme://host` without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// Prefix an already encoded site-relative path with the root.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.root)
        } else {
            format!("{}/{path}", self.root)
        }
    }

    /// Absolute URL for a URL returned by one of the other methods.
    pub fn external(&self, url: &str) -> String {
        format!("{}{url}", self.base_url())
    }

    pub fn index(&self) -> String {
        self.url("/")
    }

    pub fn index_page(&self, page: usize) -> String {
        self.url(&format!("/page/{page}/"))
    }

    /// Canonical post URL with zero-padded date parts.
    pub fn post(&self, year: u32, month: u32, day: u32, slug: &str) -> String {
        self.url(&format!(
            "/post/{year:04}/{month:02}/{day:02}/{}/",
            urlencoding::encode(slug)
        ))
    }

    pub fn archive(&self) -> String {
        self.url("/archive/")
    }

    pub fn category(&self, name: &str) -> String {
        self.url(&format!("/category/{}/", urlencoding::encode(name)))
    }

    pub fn tag(&self, name: &str) -> String {
        self.url(&format!("/tag/{}/", urlencoding::encode(name)))
    }

    /// URL of a page or raw file addressed by its relative path.
    pub fn page(&self, rel_url: &str) -> String {
        self.url(&format!("/{}", encode_path(rel_url)))
    }

    pub fn feed(&self) -> String {
        self.url("/feed.xml")
    }

    pub fn not_found(&self) -> String {
        self.url("/404.html")
    }

    /// URL of a file under the site `static/` folder; empty gives the folder.
    pub fn static_file(&self, rel: &str) -> String {
        self.url(&format!("/static/{}", encode_path(rel)))
    }

    /// URL of a file under the theme `static/` folder.
    pub fn theme_static(&self, rel: &str) -> String {
        self.url(&format!("/static/theme/{}", encode_path(rel)))
    }
}

/// Percent-encode each `/`-separated segment of a relative path.
fn encode_path(rel: &str) -> String {
    rel.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_root() {
        let urls = SiteUrls::default();
        assert_eq!(urls.root(), "");
        assert_eq!(urls.index(), "/");
        assert_eq!(urls.index_page(2), "/page/2/");
        assert_eq!(urls.post(2021, 8, 3, "hello-world"), "/post/2021/08/03/hello-world/");
        assert_eq!(urls.feed(), "/feed.xml");
        assert_eq!(urls.external(&urls.feed()), "http://localhost/feed.xml");
    }

    #[test]
    fn test_sub_path_root() {
        let (urls, has_host) = SiteUrls::from_url_root("https://example.com/blog/").unwrap();
        assert!(has_host);
        assert_eq!(urls.root(), "/blog");
        assert_eq!(urls.base_url(), "https://example.com");
        assert_eq!(urls.index(), "/blog/");
        assert_eq!(urls.archive(), "/blog/archive/");
        assert_eq!(urls.static_file("img/a.png"), "/blog/static/img/a.png");
        assert_eq!(urls.theme_static("style.css"), "/blog/static/theme/style.css");
    }

    #[test]
    fn test_with_host_keeps_root() {
        let (urls, _) = SiteUrls::from_url_root("https://example.com/blog/").unwrap();
        let moved = urls.with_host("blog.local:8080");
        assert_eq!(moved.host(), "blog.local:8080");
        assert_eq!(moved.external(&moved.feed()), "https://blog.local:8080/blog/feed.xml");
    }

    #[test]
    fn test_url_root_with_port() {
        let (urls, _) = SiteUrls::from_url_root("http://127.0.0.1:8080").unwrap();
        assert_eq!(urls.base_url(), "http://127.0.0.1:8080");
        assert_eq!(urls.index(), "/");
    }

    #[test]
    fn test_url_root_without_host() {
        let (urls, has_host) = SiteUrls::from_url_root("/docs/").unwrap();
        assert!(!has_host);
        assert_eq!(urls.base_url(), "http://localhost");
        assert_eq!(urls.index(), "/docs/");
    }

    #[test]
    fn test_names_are_encoded() {
        let urls = SiteUrls::default();
        assert_eq!(urls.tag("c++"), "/tag/c%2B%2B/");
        assert_eq!(urls.category("随笔"), "/category/%E9%9A%8F%E7%AC%94/");
        assert_eq!(urls.page("about me/index.html"), "/about%20me/index.html");
    }
}
