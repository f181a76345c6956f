//! Purepress Core Library
//!
//! Core types, configuration, URL conventions and error handling for the
//! purepress blog generator.

pub mod config;
pub mod content;
pub mod error;
pub mod frontmatter;
pub mod instance;
pub mod paths;
pub mod timezone;
pub mod urls;

pub use config::Config;
pub use content::{Entry, Page, Post, PostFilename, TocNode};
pub use error::{CoreError, Result};
pub use frontmatter::Frontmatter;
pub use instance::Instance;
pub use timezone::SiteTimezone;
pub use urls::SiteUrls;
