//! purepress generator library
//!
//! Route handlers and static site crawler for purepress.
//!
//! # Modules
//!
//! - [`site`] - [`Site::handle`], the single entry point for every URL
//! - [`routes`] - URL table and rendered responses
//! - [`collector`] - Post loading and ordering
//! - [`pages`] - Standalone page lookup
//! - [`template`] - Theme templates with variable interpolation
//! - [`html`] - Listing, pager and term-link fragments
//! - [`rss`] - RSS feed generation
//! - [`assets`] - Verbatim static file copies
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod collector;
pub mod html;
pub mod pages;
pub mod routes;
pub mod rss;
pub mod site;
pub mod template;

pub use build::{BuildError, BuildStats, Builder};
pub use collector::PostResolver;
pub use pages::PageResolver;
pub use routes::{Response, Route};
pub use rss::FeedGenerator;
pub use site::{Site, SiteError};
pub use template::{Template, TemplateContext, ThemeTemplates};
