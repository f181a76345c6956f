//! Route handlers.
//!
//! [`Site::handle`] turns a site-relative path into a [`Response`]. It is the
//! only entry point both the preview server and the builder use, so a built
//! file is byte-for-byte what preview serves at the same URL.

use std::{path::PathBuf, sync::Arc};

use http::StatusCode;
use purepress_core::{Config, Entry, Instance, Post, SiteUrls, paths::safe_join};
use purepress_parser::{EntryLoader, LoadOptions, ParserError};
use thiserror::Error;
use tracing::debug;

use crate::{
    collector::PostResolver,
    html::{self, Pager, escape},
    pages::PageResolver,
    routes::{Response, Route},
    rss::{FeedError, FeedGenerator},
    template::{TemplateContext, TemplateError, ThemeTemplates},
};

/// Errors raised while rendering a route.
#[derive(Debug, Error)]
pub enum SiteError {
    /// Loading or parsing an entry failed.
    #[error("content error: {0}")]
    Parser(#[from] ParserError),

    /// Rendering a template failed.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Generating the feed failed.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// A raw file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for route handlers.
pub type Result<T> = std::result::Result<T, SiteError>;

/// Everything needed to answer requests for one instance.
#[derive(Debug)]
pub struct Site {
    config: Arc<Config>,
    instance: Instance,
    urls: SiteUrls,
    loader: EntryLoader,
    templates: ThemeTemplates,
    posts_dir: PathBuf,
    pages_dir: PathBuf,
    building: bool,
}

impl Site {
    /// Create a site. `building` is exposed to templates so themes can
    /// tell a static build from preview.
    #[must_use]
    pub fn new(config: Arc<Config>, instance: Instance, urls: SiteUrls, building: bool) -> Self {
        let loader = EntryLoader::new(&config, urls.clone());
        let templates = ThemeTemplates::new(instance.theme_templates_dir());
        Self {
            posts_dir: instance.posts_dir(),
            pages_dir: instance.pages_dir(),
            config,
            instance,
            urls,
            loader,
            templates,
            building,
        }
    }

    /// The same site addressed through different URLs.
    #[must_use]
    pub fn with_urls(&self, urls: SiteUrls) -> Self {
        Self::new(
            Arc::clone(&self.config),
            self.instance.clone(),
            urls,
            self.building,
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn urls(&self) -> &SiteUrls {
        &self.urls
    }

    /// Post resolver over this instance's posts directory.
    pub fn posts(&self) -> PostResolver<'_> {
        PostResolver::new(&self.loader, &self.urls, &self.posts_dir)
    }

    /// Page resolver over this instance's pages directory.
    pub fn pages(&self) -> PageResolver<'_> {
        PageResolver::new(&self.loader, &self.urls, &self.pages_dir)
    }

    /// Answer a request for a decoded, site-relative path.
    pub fn handle(&self, path: &str) -> Result<Response> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        if let Some(route) = Route::with_trailing_slash(&path) {
            // Pages and raw files win over the redirect.
            if let Some(response) = self.page_or_raw(&path[1..])? {
                return Ok(response);
            }
            debug!(path = %path, to = %route.path(), "adding trailing slash");
            return Ok(Response::redirect(
                StatusCode::PERMANENT_REDIRECT,
                route.url(&self.urls),
            ));
        }

        self.render_route(&Route::parse(&path))
    }

    /// Render a route directly.
    pub fn render_route(&self, route: &Route) -> Result<Response> {
        match route {
            Route::Index => self.index_page(1),
            Route::IndexPage(1) => Ok(Response::redirect(StatusCode::FOUND, self.urls.index())),
            Route::IndexPage(n) => self.index_page(*n),
            Route::Post {
                year,
                month,
                day,
                slug,
            } => self.post(*year, *month, *day, slug),
            Route::Archive => self.archive("Archive", "All", |_| true),
            Route::Category(name) => {
                self.archive("Category", name, |post| post.categories().contains(name))
            }
            Route::Tag(name) => self.archive("Tag", name, |post| post.tags().contains(name)),
            Route::Feed => self.feed(),
            Route::NotFound => self.not_found(),
            Route::Page(rel) => self.page(rel),
        }
    }

    /// Number of index pages. Always at least one.
    pub fn page_count(&self) -> Result<usize> {
        let count = self.posts().load_posts(true)?.len();
        Ok(count.div_ceil(self.config.config.posts_per_index_page).max(1))
    }

    fn index_page(&self, page: usize) -> Result<Response> {
        let per_page = self.config.config.posts_per_index_page;
        let posts = self.posts().load_posts(true)?;
        let page_count = posts.len().div_ceil(per_page).max(1);
        if page < 1 || page > page_count {
            return self.not_found();
        }

        let begin = (page - 1) * per_page;
        let end = posts.len().min(begin + per_page);
        let mut entries = Vec::with_capacity(end.saturating_sub(begin));
        for meta in &posts[begin.min(end)..end] {
            if let Some(post) = self.posts().load_post(&meta.name.filename, LoadOptions::FULL)? {
                entries.push(post);
            }
        }

        let pager = Pager::for_page(page, page_count, &self.urls);
        let mut ctx = self.base_context(&self.config.site.title);
        if page > 1 {
            ctx.insert(
                "page_title",
                format!("Page {page} - {}", escape(&self.config.site.title)),
            );
        }
        ctx.insert("entries", html::index_entries(&entries));
        ctx.insert("pager", pager.to_html());
        ctx.insert("page_num", page.to_string());
        ctx.insert("page_count", page_count.to_string());
        if let Some(url) = &pager.prev_url {
            ctx.insert("prev_url", escape(url));
        }
        if let Some(url) = &pager.next_url {
            ctx.insert("next_url", escape(url));
        }

        self.render_html("index", &ctx)
    }

    fn post(&self, year: u32, month: u32, day: u32, slug: &str) -> Result<Response> {
        let Some(post) = self
            .posts()
            .find_post(year, month, day, slug, LoadOptions::WITH_TOC)?
        else {
            return self.not_found();
        };

        let mut ctx = self.entry_context(post.title(), &post.entry);
        ctx.insert("url", escape(&post.url));
        if let Some(created) = post.created() {
            ctx.insert("created", html::format_date(&created));
            ctx.insert("created_iso", created.format("%Y-%m-%dT%H:%M:%S").to_string());
        }
        if let Some(updated) = post.updated() {
            ctx.insert("updated", html::format_date(&updated));
        }
        if !post.categories().is_empty() {
            ctx.insert(
                "categories_html",
                html::term_links(post.categories(), |name| self.urls.category(name)),
            );
        }
        if !post.tags().is_empty() {
            ctx.insert(
                "tags_html",
                html::term_links(post.tags(), |name| self.urls.tag(name)),
            );
        }

        self.render_html("post", &ctx)
    }

    fn archive(
        &self,
        archive_type: &str,
        name: &str,
        keep: impl Fn(&Post) -> bool,
    ) -> Result<Response> {
        let posts: Vec<Post> = self
            .posts()
            .load_posts(true)?
            .into_iter()
            .filter(|post| keep(post))
            .collect();

        let title = format!("{archive_type}: {name}");
        let mut ctx = self.base_context(&title);
        ctx.insert("title", escape(&title));
        ctx.insert("archive_type", escape(archive_type));
        ctx.insert("archive_name", escape(name));
        ctx.insert("items", html::post_list_items(&posts));
        ctx.insert("post_count", posts.len().to_string());

        self.render_html("archive", &ctx)
    }

    fn page(&self, rel: &str) -> Result<Response> {
        match self.page_or_raw(rel)? {
            Some(response) => Ok(response),
            None => self.not_found(),
        }
    }

    /// A page, else a raw file; `None` when neither exists.
    fn page_or_raw(&self, rel: &str) -> Result<Option<Response>> {
        if let Some(page) = self.pages().load_page(rel, true)? {
            let mut ctx = self.entry_context(page.title(), &page.entry);
            ctx.insert("url", escape(&page.url));
            return self.render_html("page", &ctx).map(Some);
        }
        self.raw_file(rel)
    }

    fn raw_file(&self, rel: &str) -> Result<Option<Response>> {
        let rel_file = if rel.is_empty() || rel.ends_with('/') {
            format!("{rel}index.html")
        } else {
            rel.to_string()
        };
        let Some(path) = safe_join(&self.instance.raw_dir(), &rel_file) else {
            return Ok(None);
        };
        if !path.is_file() {
            return Ok(None);
        }

        let body = std::fs::read(&path).map_err(|source| SiteError::Io {
            path: path.clone(),
            source,
        })?;
        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Some(Response::bytes(content_type, body)))
    }

    fn feed(&self) -> Result<Response> {
        let recent = self.posts().load_posts(true)?;
        let mut posts = Vec::with_capacity(crate::rss::FEED_LIMIT);
        for meta in recent.iter().take(crate::rss::FEED_LIMIT) {
            if let Some(post) = self.posts().load_post(&meta.name.filename, LoadOptions::FULL)? {
                posts.push(post);
            }
        }

        let xml = FeedGenerator::new(&self.config, &self.urls).generate(&posts)?;
        Ok(Response::bytes(Response::RSS, xml))
    }

    fn not_found(&self) -> Result<Response> {
        let ctx = self.base_context("Page Not Found");
        let body = self.templates.render_page("404", &ctx)?;
        Ok(Response::html(StatusCode::NOT_FOUND, body))
    }

    fn render_html(&self, template: &str, ctx: &TemplateContext) -> Result<Response> {
        let body = self.templates.render_page(template, ctx)?;
        Ok(Response::html(StatusCode::OK, body))
    }

    /// Variables every template can use.
    fn base_context(&self, title: &str) -> TemplateContext {
        let site = &self.config.site;
        let page_title = if title.is_empty() || title == site.title {
            escape(&site.title)
        } else {
            format!("{} - {}", escape(title), escape(&site.title))
        };

        let mut ctx = TemplateContext::new()
            .with_var("page_title", page_title)
            .with_var("site_title", escape(&site.title))
            .with_var("site_subtitle", escape(&site.subtitle))
            .with_var("url_root", escape(self.urls.root()))
            .with_var("index_url", escape(&self.urls.index()))
            .with_var("archive_url", escape(&self.urls.archive()))
            .with_var("feed_url", escape(&self.urls.feed()))
            .with_var("static_url", escape(&self.urls.static_file("")))
            .with_var("theme_static_url", escape(&self.urls.theme_static("")))
            .with_var("building", if self.building { "true" } else { "" });
        if let Some(author) = &site.author {
            ctx.insert("site_author", escape(author));
        }
        ctx.extend(
            self.config
                .template_vars()
                .into_iter()
                .map(|(key, value)| (key, escape(&value))),
        );
        ctx
    }

    /// Base variables plus those of a rendered entry.
    fn entry_context(&self, title: &str, entry: &Entry) -> TemplateContext {
        let mut ctx = self.base_context(title);
        ctx.insert("title", escape(title));
        ctx.insert("content", entry.content.clone().unwrap_or_default());
        if let Some(toc_html) = &entry.toc_html {
            ctx.insert("toc_html", toc_html.clone());
        }
        if let Some(block) = html::toc_block(entry.toc_html.as_deref()) {
            ctx.insert("toc_block", block);
        }
        if let Some(author) = &entry.meta.author {
            ctx.insert("author", escape(author));
        }
        ctx.extend(html::entry_vars(&entry.meta));
        ctx
    }
}
