//! Markdown rendering using pulldown-cmark.
//!
//! Parsing produces an event stream that runs through a fixed sequence of
//! transforms before it is written out as HTML:
//!
//! 1. [`rewrite_image_sources`]
//! 2. [`rewrite_link_hrefs`]
//! 3. [`anchor_headings`]
//! 4. [`highlight_code`]

use std::collections::HashSet;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use purepress_core::SiteUrls;

use crate::{
    links::{rewrite_href, rewrite_image_src},
    syntax::{SyntaxHighlighter, plain_code_block},
    toc::{self, Heading},
};

/// Output of rendering one Markdown document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    /// Headings with their anchor ids, in document order.
    pub headings: Vec<Heading>,
}

/// Markdown renderer bound to the URL layout of one site.
#[derive(Debug)]
pub struct MarkdownRenderer {
    urls: SiteUrls,
    highlighter: Option<SyntaxHighlighter>,
    options: Options,
}

impl MarkdownRenderer {
    /// Create a renderer. Code is highlighted only when `highlight_theme`
    /// names a bundled syntect theme.
    pub fn new(urls: SiteUrls, highlight_theme: Option<&str>) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            urls,
            highlighter: highlight_theme.and_then(SyntaxHighlighter::new),
            options,
        }
    }

    /// Render a Markdown body to HTML.
    pub fn render(&self, body: &str) -> Rendered {
        let events: Vec<Event<'_>> = Parser::new_ext(body, self.options).collect();

        let events = rewrite_image_sources(events, &self.urls);
        let events = rewrite_link_hrefs(events, &self.urls);
        let events = anchor_headings(events);
        let events = highlight_code(events, self.highlighter.as_ref());

        let headings = toc::collect_headings(&events);

        let mut html_output = String::with_capacity(body.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());

        Rendered {
            html: html_output,
            headings,
        }
    }
}

/// Point `/static/...` image sources at the static serving URL.
pub fn rewrite_image_sources<'a>(events: Vec<Event<'a>>, urls: &SiteUrls) -> Vec<Event<'a>> {
    events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let dest_url = rewrite_image_src(&dest_url, urls)
                    .map(CowStr::from)
                    .unwrap_or(dest_url);
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                })
            }
            other => other,
        })
        .collect()
}

/// Rewrite root-relative link targets into site URLs.
pub fn rewrite_link_hrefs<'a>(events: Vec<Event<'a>>, urls: &SiteUrls) -> Vec<Event<'a>> {
    events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let dest_url = rewrite_href(&dest_url, urls)
                    .map(CowStr::from)
                    .unwrap_or(dest_url);
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                })
            }
            other => other,
        })
        .collect()
}

/// Give every heading an id. Explicit `{#id}` attributes are kept; other
/// headings get a slug of their text, suffixed `-1`, `-2`, ... on repeats.
pub fn anchor_headings(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut used: HashSet<String> = events
        .iter()
        .filter_map(|event| match event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();

    let mut index = 0;
    while index < events.len() {
        if let Event::Start(Tag::Heading { id: None, .. }) = &events[index] {
            let mut text = String::new();
            for event in &events[index + 1..] {
                match event {
                    Event::End(TagEnd::Heading(_)) => break,
                    Event::Text(t) | Event::Code(t) => text.push_str(t),
                    _ => {}
                }
            }

            let id = unique_id(&slugify(&text), &mut used);
            if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[index] {
                *slot = Some(CowStr::from(id));
            }
        }
        index += 1;
    }

    events
}

/// Replace fenced and indented code blocks with highlighted HTML.
pub fn highlight_code<'a>(
    events: Vec<Event<'a>>,
    highlighter: Option<&SyntaxHighlighter>,
) -> Vec<Event<'a>> {
    let Some(highlighter) = highlighter else {
        return events;
    };

    let mut output = Vec::with_capacity(events.len());
    let mut block: Option<(Option<String>, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split([' ', ',', '{'])
                        .next()
                        .filter(|token| !token.is_empty())
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                block = Some((lang, String::new()));
            }
            Event::Text(text) if block.is_some() => {
                if let Some((_, code)) = block.as_mut() {
                    code.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, code)) = block.take() {
                    let html = match lang.as_deref() {
                        Some(_) => highlighter.highlight(&code, lang.as_deref()),
                        None => plain_code_block(&code, None),
                    };
                    output.push(Event::Html(CowStr::from(html)));
                }
            }
            event => output.push(event),
        }
    }

    output
}

/// Convert heading text to an anchor slug.
fn slugify(text: &str) -> String {
    let slug = text
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

fn unique_id(base: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut n = 1;
    while used.contains(&candidate) {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}
