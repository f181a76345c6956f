//! Rewriting of source-relative links into site URLs.
//!
//! Authors link between content files by their location in the instance:
//!
//! | Written                           | Served at                       |
//! |-----------------------------------|---------------------------------|
//! | `/posts/2021-08-23-hello.md`      | `<root>/post/2021/08/23/hello/` |
//! | `/pages/about/index.md`           | `<root>/about/`                 |
//! | `/pages/foo/bar.md`               | `<root>/foo/bar.html`           |
//! | `/raw/x.html`                     | `<root>/x.html`                 |
//! | `/static/img.png` (images)        | `<root>/static/img.png`         |
//! | any other `/path`                 | `<root>/path`                   |

use purepress_core::SiteUrls;

/// Rewrite a link target. Returns `None` for links that are left alone
/// (relative, absolute with a scheme, fragments, protocol-relative).
pub fn rewrite_href(href: &str, urls: &SiteUrls) -> Option<String> {
    if !href.starts_with('/') || href.starts_with("//") {
        return None;
    }

    let (path, suffix) = split_suffix(href);

    let rewritten = if let Some(file) = path.strip_prefix("/posts/") {
        let file = file.replacen('-', "/", 3);
        let file = match file.strip_suffix(".md") {
            Some(stem) => format!("{stem}/"),
            None => file,
        };
        urls.url(&format!("/post/{file}"))
    } else if let Some(rel) = path.strip_prefix("/pages/") {
        let rel = if let Some(dir) = rel.strip_suffix("index.md") {
            dir.to_string()
        } else if let Some(stem) = rel.strip_suffix(".md") {
            format!("{stem}.html")
        } else {
            rel.to_string()
        };
        urls.url(&format!("/{rel}"))
    } else if let Some(rel) = path.strip_prefix("/raw/") {
        urls.url(&format!("/{rel}"))
    } else {
        urls.url(path)
    };

    Some(format!("{rewritten}{suffix}"))
}

/// Rewrite an image source under `/static/` to the static serving URL.
pub fn rewrite_image_src(src: &str, urls: &SiteUrls) -> Option<String> {
    src.starts_with("/static/").then(|| urls.url(src))
}

/// Split `path?query#fragment` into the path and the rest.
fn split_suffix(href: &str) -> (&str, &str) {
    match href.find(['?', '#']) {
        Some(pos) => href.split_at(pos),
        None => (href, ""),
    }
}
