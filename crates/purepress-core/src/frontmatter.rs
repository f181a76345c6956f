//! Front-matter parsing for content files.
//!
//! A content file may start with a YAML block between two `---` lines:
//!
//! ```text
//! ---
//! title: Hello World
//! created: 2021-08-23
//! tags: rust
//! ---
//!
//! Markdown body.
//! ```

use std::{collections::BTreeMap, path::Path};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_yaml::Value;

use crate::error::{CoreError, Result};

/// Line that opens and closes a front-matter block.
pub const DELIMITER: &str = "---";

/// Front-matter metadata for content files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Entry title. Resolvers fill it from the filename when absent.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub title: Option<String>,

    /// Creation time; bare dates are promoted to midnight.
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub created: Option<NaiveDateTime>,

    /// Last update time; bare dates are promoted to midnight.
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub updated: Option<NaiveDateTime>,

    /// Tags, always a sequence without duplicates.
    #[serde(default, deserialize_with = "deserialize_string_set")]
    pub tags: Vec<String>,

    /// Categories, always a sequence without duplicates.
    #[serde(default, deserialize_with = "deserialize_string_set")]
    pub categories: Vec<String>,

    /// Hidden posts are left out of listings, the feed and the build.
    #[serde(default)]
    pub hide: bool,

    /// Per-entry TOC depth, overriding `config.toc_depth`.
    #[serde(default)]
    pub toc_depth: Option<usize>,

    /// Entry author, used by the feed.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub author: Option<String>,

    /// Any other keys, passed through to templates.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Split content into the raw front-matter block and the body.
///
/// Without an opening `---` line the whole content is the body. An opening
/// line without a matching closing line is an error.
pub fn split_frontmatter<'a>(content: &'a str, path: &Path) -> Result<(Option<&'a str>, &'a str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let (first, rest) = content.split_once('\n').unwrap_or((content, ""));

    if first.trim() != DELIMITER {
        return Ok((None, content.trim()));
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim() == DELIMITER {
            let frontmatter = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((Some(frontmatter), body.trim()));
        }
        offset += line.len();
    }

    Err(CoreError::frontmatter(
        path,
        "front-matter block is missing its closing `---` line",
    ))
}

/// Parse front-matter and return it with the remaining body.
pub fn parse_frontmatter(content: &str, path: &Path) -> Result<(Frontmatter, String)> {
    let (raw, body) = split_frontmatter(content, path)?;

    let frontmatter = match raw {
        Some(raw) if !raw.trim().is_empty() => serde_yaml::from_str::<Option<Frontmatter>>(raw)
            .map_err(|e| CoreError::frontmatter(path, e.to_string()))?
            .unwrap_or_default(),
        _ => Frontmatter::default(),
    };

    Ok((frontmatter, body.to_string()))
}

/// Parse the timestamp forms accepted in front-matter.
///
/// Offsets in RFC 3339 input are dropped and the wall-clock time is kept;
/// the site timezone is applied when timestamps are published.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_local());
    }
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn scalar_to_string(value: Value) -> std::result::Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected a string, found {other:?}")),
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_to_string(value).map(Some).map_err(D::Error::custom),
    }
}

fn deserialize_datetime<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_datetime(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date-time `{s}`"))),
        Some(other) => Err(D::Error::custom(format!(
            "expected a date or date-time, found {other:?}"
        ))),
    }
}

fn deserialize_string_set<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(seq)) => seq
            .into_iter()
            .map(scalar_to_string)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(D::Error::custom)?,
        Some(single) => vec![scalar_to_string(single).map_err(D::Error::custom)?],
    };

    let mut unique: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, s))
            .expect("valid date")
    }

    #[test]
    fn test_split_frontmatter() {
        let content = "---\ntitle: \"Hello World\"\n---\n\nThis is the body content.\n";

        let (fm, body) = split_frontmatter(content, Path::new("a.md")).expect("split");
        assert_eq!(fm, Some("title: \"Hello World\"\n"));
        assert_eq!(body, "This is the body content.");
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "# Heading\n\nJust some content.";
        let (fm, body) = split_frontmatter(content, Path::new("a.md")).expect("split");
        assert!(fm.is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn test_dashes_inside_values_do_not_close_block() {
        let content = "---\ntitle: a---b\n---\nbody";
        let (fm, body) = parse_frontmatter(content, Path::new("a.md")).expect("parse");
        assert_eq!(fm.title.as_deref(), Some("a---b"));
        assert_eq!(body, "body");
    }

    #[test]
    fn test_unterminated_block_is_error() {
        let result = parse_frontmatter("---\ntitle: x\n\nbody", Path::new("a.md"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("closing"));
    }

    #[test]
    fn test_empty_frontmatter() {
        let (fm, body) = parse_frontmatter("---\n---\nbody", Path::new("a.md")).expect("parse");
        assert_eq!(fm, Frontmatter::default());
        assert_eq!(body, "body");
    }

    #[test]
    fn test_parse_full_frontmatter() {
        let content = r#"---
title: Test Post
created: 2021-08-23 10:30:00
updated: 2021-08-24
tags:
  - rust
  - test
  - rust
categories: Dev
hide: true
toc_depth: 2
author: Someone
cover: /static/cover.png
---

Content here."#;

        let (fm, body) = parse_frontmatter(content, Path::new("a.md")).expect("parse");

        assert_eq!(fm.title.as_deref(), Some("Test Post"));
        assert_eq!(fm.created, Some(ymd_hms(2021, 8, 23, 10, 30, 0)));
        assert_eq!(fm.updated, Some(ymd_hms(2021, 8, 24, 0, 0, 0)));
        assert_eq!(fm.tags, vec!["rust", "test"]);
        assert_eq!(fm.categories, vec!["Dev"]);
        assert!(fm.hide);
        assert_eq!(fm.toc_depth, Some(2));
        assert_eq!(fm.author.as_deref(), Some("Someone"));
        assert!(fm.extra.contains_key("cover"));
        assert_eq!(body, "Content here.");
    }

    #[test]
    fn test_single_scalar_tags_become_sequences() {
        let (fm, _) =
            parse_frontmatter("---\ntags: rust\ncategories: 2021\n---\n", Path::new("a.md"))
                .expect("parse");
        assert_eq!(fm.tags, vec!["rust"]);
        assert_eq!(fm.categories, vec!["2021"]);
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let result = parse_frontmatter("---\ntitle: [unclosed\n---\nbody", Path::new("a.md"));
        assert!(matches!(result, Err(CoreError::Frontmatter { .. })));
    }

    #[test]
    fn test_invalid_date_is_error() {
        let result = parse_frontmatter("---\ncreated: yesterday\n---\n", Path::new("a.md"));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_datetime_forms() {
        let midnight = ymd_hms(2021, 8, 23, 0, 0, 0);
        assert_eq!(parse_datetime("2021-08-23"), Some(midnight));
        assert_eq!(parse_datetime("2021-08-23 00:00"), Some(midnight));
        assert_eq!(parse_datetime("2021-08-23T00:00:00"), Some(midnight));
        assert_eq!(parse_datetime("2021-08-23T00:00:00+08:00"), Some(midnight));
        assert_eq!(parse_datetime("2021-08-23 00:00:00+08:00"), Some(midnight));
        assert_eq!(parse_datetime("23/08/2021"), None);
    }
}
