//! RSS feed generation.
//!
//! Generates an RSS 2.0 feed of the most recent posts with Atom links and
//! Dublin Core creators and dates.

use std::collections::BTreeMap;

use purepress_core::{Config, Post, SiteTimezone, SiteUrls};
use rss::{
    ChannelBuilder, GuidBuilder, Item, ItemBuilder,
    extension::{
        ExtensionBuilder, ExtensionMap,
        atom::{AtomExtension, Link},
        dublincore::DublinCoreExtension,
    },
};
use thiserror::Error;
use tracing::debug;

/// Number of posts included in the feed.
pub const FEED_LIMIT: usize = 10;

/// RSS generation errors.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Serializing the channel failed.
    #[error("RSS write error: {0}")]
    Write(#[from] rss::Error),
}

/// Result type for RSS operations.
pub type Result<T> = std::result::Result<T, FeedError>;

/// RSS feed generator.
#[derive(Debug)]
pub struct FeedGenerator<'a> {
    config: &'a Config,
    urls: &'a SiteUrls,
    timezone: SiteTimezone,
}

impl<'a> FeedGenerator<'a> {
    /// Create a new RSS generator.
    #[must_use]
    pub fn new(config: &'a Config, urls: &'a SiteUrls) -> Self {
        Self {
            config,
            urls,
            timezone: config.timezone(),
        }
    }

    /// Generate RSS feed XML from posts with rendered content, newest first.
    pub fn generate(&self, posts: &[Post]) -> Result<Vec<u8>> {
        let posts = &posts[..posts.len().min(FEED_LIMIT)];
        debug!(count = posts.len(), "generating RSS feed");

        let home_url = self.urls.external(&self.urls.index());
        let feed_url = self.urls.external(&self.urls.feed());
        let site = &self.config.site;

        let mut atom = AtomExtension::default();
        atom.set_links(vec![
            atom_link(&feed_url, "self", Some("application/rss+xml")),
            atom_link(&home_url, "alternate", None),
        ]);

        let mut channel = ChannelBuilder::default()
            .title(site.title.clone())
            .link(home_url)
            .description(site.subtitle.clone())
            .generator(Some("purepress".to_string()))
            .atom_ext(Some(atom))
            .items(posts.iter().map(|post| self.post_to_item(post)).collect::<Vec<_>>())
            .build();

        if let Some(author) = &site.author {
            let mut dc = DublinCoreExtension::default();
            dc.set_creators(vec![author.clone()]);
            channel.set_dublin_core_ext(Some(dc));
        }

        if let Some(follow_challenge) = self.follow_challenge() {
            channel.set_extensions(follow_challenge);
        }

        Ok(channel.pretty_write_to(Vec::new(), b' ', 2)?)
    }

    /// Convert a post to an RSS item.
    fn post_to_item(&self, post: &Post) -> Item {
        let url = self.urls.external(&post.url);
        let guid = GuidBuilder::default().value(url.clone()).permalink(true).build();

        let mut dc = DublinCoreExtension::default();
        if let Some(updated) = post.updated().or(post.created()) {
            dc.set_dates(vec![self.timezone.localize(updated).to_rfc3339()]);
        }
        if let Some(author) = &post.entry.meta.author {
            dc.set_creators(vec![author.clone()]);
        }

        ItemBuilder::default()
            .title(Some(post.title().to_string()))
            .link(Some(url))
            .guid(Some(guid))
            .pub_date(
                post.created()
                    .map(|created| self.timezone.localize(created).to_rfc2822()),
            )
            .content(post.entry.content.clone())
            .dublin_core_ext(Some(dc))
            .build()
    }

    /// `<follow_challenge>` channel element, when both ids are configured.
    fn follow_challenge(&self) -> Option<ExtensionMap> {
        let behavior = &self.config.config;
        let (feed_id, user_id) = match (&behavior.feed_id, &behavior.user_id) {
            (Some(feed_id), Some(user_id)) if !feed_id.is_empty() && !user_id.is_empty() => {
                (feed_id, user_id)
            }
            _ => return None,
        };

        let mut children = BTreeMap::new();
        children.insert(
            "feedId".to_string(),
            vec![ExtensionBuilder::default()
                .name("feedId")
                .value(Some(feed_id.clone()))
                .build()],
        );
        children.insert(
            "userId".to_string(),
            vec![ExtensionBuilder::default()
                .name("userId")
                .value(Some(user_id.clone()))
                .build()],
        );

        let element = ExtensionBuilder::default()
            .name("follow_challenge")
            .children(children)
            .build();

        let mut by_name = BTreeMap::new();
        by_name.insert("follow_challenge".to_string(), vec![element]);
        let mut map = ExtensionMap::new();
        map.insert(String::new(), by_name);
        Some(map)
    }
}

fn atom_link(href: &str, rel: &str, mime_type: Option<&str>) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel(rel);
    link.set_mime_type(mime_type.map(str::to_string));
    link
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use purepress_core::{Entry, Frontmatter, PostFilename};

    use super::*;

    fn test_config(extra: &str) -> Config {
        Config::from_toml(&format!(
            "[site]\ntitle = \"Test Blog\"\nsubtitle = \"A test blog\"\nauthor = \"Test Author\"\ntimezone = \"UTC+08:00\"\n{extra}"
        ))
        .unwrap()
    }

    fn test_post(day: u32, title: &str) -> Post {
        let name = PostFilename::parse(&format!("2021-08-{day:02}-{title}.md")).unwrap();
        let created = NaiveDate::from_ymd_opt(2021, 8, day)
            .and_then(|d| d.and_hms_opt(10, 0, 0));
        Post {
            url: name.url(&SiteUrls::default()),
            name,
            entry: Entry {
                meta: Frontmatter {
                    title: Some(title.to_string()),
                    created,
                    author: Some("Post Author".to_string()),
                    ..Frontmatter::default()
                },
                content: Some(format!("<p>{title} body</p>")),
                ..Entry::default()
            },
        }
    }

    fn render(config: &Config, posts: &[Post]) -> String {
        let urls = SiteUrls::new("https", "example.com", "/blog");
        let bytes = FeedGenerator::new(config, &urls).generate(posts).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_generate_rss() {
        let config = test_config("");
        let xml = render(&config, &[test_post(2, "second"), test_post(1, "first")]);

        assert!(xml.contains("<title>Test Blog</title>"));
        assert!(xml.contains("<link>https://example.com/blog/</link>"));
        assert!(xml.contains("<description>A test blog</description>"));
        assert!(xml.contains("href=\"https://example.com/blog/feed.xml\""));
        assert!(xml.contains("rel=\"self\""));
        assert!(xml.contains("<dc:creator>Test Author</dc:creator>"));
        assert!(xml.contains("<dc:creator>Post Author</dc:creator>"));
        assert!(xml.contains("https://example.com/post/2021/08/01/first/"));
        assert!(xml.contains("Aug 2021 10:00:00 +0800"));
        assert!(xml.contains("<dc:date>2021-08-02T10:00:00+08:00</dc:date>"));
        assert!(xml.contains("second body"));
        assert!(!xml.contains("follow_challenge"));
    }

    #[test]
    fn test_empty_feed() {
        let config = test_config("");
        let xml = render(&config, &[]);
        assert!(xml.contains("<channel>"));
        assert!(!xml.contains("<item>"));
    }

    #[test]
    fn test_feed_limit() {
        let config = test_config("");
        let posts: Vec<_> = (1..=12).rev().map(|d| test_post(d, &format!("p{d}"))).collect();
        let xml = render(&config, &posts);
        assert_eq!(xml.matches("<item>").count(), FEED_LIMIT);
        assert!(xml.contains("p12 body"));
        assert!(!xml.contains("p2 body"));
    }

    #[test]
    fn test_follow_challenge() {
        let config = test_config("[config]\nfeed_id = \"123\"\nuser_id = \"456\"\n");
        let xml = render(&config, &[]);

        assert!(xml.contains("<follow_challenge>"));
        assert!(xml.contains("<feedId>123</feedId>"));
        assert!(xml.contains("<userId>456</userId>"));
    }

    #[test]
    fn test_follow_challenge_needs_both_ids() {
        let config = test_config("[config]\nfeed_id = \"123\"\n");
        assert!(!render(&config, &[]).contains("follow_challenge"));
    }
}
