//! HTML fragments shared by the route handlers.
//!
//! Listings, pagers and term links are assembled here and inserted into
//! templates as ready-made HTML.

use chrono::NaiveDateTime;
use purepress_core::{Frontmatter, Post, SiteUrls};

/// Links to the neighbouring index pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pager {
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl Pager {
    /// Pager for index page `page` of `page_count`.
    #[must_use]
    pub fn for_page(page: usize, page_count: usize, urls: &SiteUrls) -> Self {
        let prev_url = match page {
            0 | 1 => None,
            2 => Some(urls.index()),
            n => Some(urls.index_page(n - 1)),
        };
        let next_url = (page < page_count).then(|| urls.index_page(page + 1));
        Self { prev_url, next_url }
    }

    /// Render as a `<nav>` block; empty when there is nowhere to go.
    #[must_use]
    pub fn to_html(&self) -> String {
        if self.prev_url.is_none() && self.next_url.is_none() {
            return String::new();
        }
        let prev = self
            .prev_url
            .as_deref()
            .map(|url| format!(r#"<a class="prev" href="{}">&larr; Newer</a>"#, escape(url)))
            .unwrap_or_default();
        let next = self
            .next_url
            .as_deref()
            .map(|url| format!(r#"<a class="next" href="{}">Older &rarr;</a>"#, escape(url)))
            .unwrap_or_default();
        format!(r#"<nav class="pager">{prev}{next}</nav>"#)
    }
}

/// Escape HTML special characters.
#[must_use]
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Human-readable date used in listings.
#[must_use]
pub fn format_date(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// `<li>` rows for archive-style listings.
#[must_use]
pub fn post_list_items(posts: &[Post]) -> String {
    posts
        .iter()
        .map(|post| {
            let date = post.created().map(|dt| format_date(&dt)).unwrap_or_default();
            format!(
                r#"<li><a href="{}">{}</a><time>{}</time></li>"#,
                escape(&post.url),
                escape(post.title()),
                date
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full-content entries for an index page.
#[must_use]
pub fn index_entries(posts: &[Post]) -> String {
    posts
        .iter()
        .map(|post| {
            let date = post.created().map(|dt| format_date(&dt)).unwrap_or_default();
            format!(
                "<article class=\"entry\">\n<h2><a href=\"{}\">{}</a></h2>\n<time>{}</time>\n<div class=\"content\">\n{}</div>\n</article>",
                escape(&post.url),
                escape(post.title()),
                date,
                post.entry.content.as_deref().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Comma-separated links to category or tag listings.
#[must_use]
pub fn term_links(names: &[String], url_for: impl Fn(&str) -> String) -> String {
    names
        .iter()
        .map(|name| {
            format!(
                r#"<a href="{}">{}</a>"#,
                escape(&url_for(name)),
                escape(name)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Wrap a rendered TOC for embedding above an entry.
#[must_use]
pub fn toc_block(toc_html: Option<&str>) -> Option<String> {
    toc_html
        .filter(|html| !html.is_empty())
        .map(|html| format!("<nav class=\"toc\">\n{html}</nav>"))
}

/// Scalar front-matter extras as `entry.<key>` template variables.
#[must_use]
pub fn entry_vars(meta: &Frontmatter) -> Vec<(String, String)> {
    meta.extra
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                serde_yaml::Value::String(s) => s.clone(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((format!("entry.{key}"), escape(&text)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pager_links() {
        let urls = SiteUrls::default();

        assert_eq!(
            Pager::for_page(1, 3, &urls),
            Pager {
                prev_url: None,
                next_url: Some("/page/2/".to_string())
            }
        );
        assert_eq!(
            Pager::for_page(2, 3, &urls),
            Pager {
                prev_url: Some("/".to_string()),
                next_url: Some("/page/3/".to_string())
            }
        );
        assert_eq!(
            Pager::for_page(3, 3, &urls),
            Pager {
                prev_url: Some("/page/2/".to_string()),
                next_url: None
            }
        );
        assert_eq!(Pager::for_page(1, 1, &urls).to_html(), "");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn test_term_links() {
        let urls = SiteUrls::default();
        let html = term_links(&["rust".to_string(), "c++".to_string()], |name| urls.tag(name));
        assert_eq!(
            html,
            r#"<a href="/tag/rust/">rust</a>, <a href="/tag/c%2B%2B/">c++</a>"#
        );
    }

    #[test]
    fn test_toc_block() {
        assert_eq!(toc_block(Some("")), None);
        assert_eq!(toc_block(None), None);
        assert!(toc_block(Some("<ul></ul>\n")).is_some_and(|b| b.starts_with("<nav")));
    }
}
