//! Table of contents extraction.

use pulldown_cmark::{Event, Tag, TagEnd};
use purepress_core::TocNode;

/// A heading found in a rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub id: String,
}

/// Collect headings that carry an anchor id, in document order.
pub fn collect_headings(events: &[Event<'_>]) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut current: Option<Heading> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = id.as_ref().map(|id| Heading {
                    level: *level as u8,
                    text: String::new(),
                    id: id.to_string(),
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(heading) = current.take() {
                    headings.push(heading);
                }
            }
            _ => {}
        }
    }

    headings
}

/// Nest headings under the closest preceding heading of a lower level.
///
/// `depth` bounds how many levels of nesting are kept; 0 keeps all.
pub fn build_tree(headings: Vec<Heading>, depth: usize) -> Vec<TocNode> {
    let mut roots: Vec<TocNode> = Vec::new();
    // Path of open nodes from a root down to the most recent heading.
    let mut open: Vec<u8> = Vec::new();

    for heading in headings {
        while open.last().is_some_and(|level| *level >= heading.level) {
            open.pop();
        }
        if depth > 0 && open.len() >= depth {
            continue;
        }

        let node = TocNode {
            level: heading.level,
            text: heading.text,
            id: heading.id,
            children: Vec::new(),
        };

        let mut siblings = &mut roots;
        for _ in 0..open.len() {
            if siblings.is_empty() {
                break;
            }
            let last = siblings.len() - 1;
            siblings = &mut siblings[last].children;
        }
        siblings.push(node);
        open.push(heading.level);
    }

    roots
}

/// Render a TOC tree as nested `<ul>` lists. Empty trees render as "".
pub fn render_toc(nodes: &[TocNode]) -> String {
    let mut html = String::new();
    write_list(nodes, &mut html);
    html
}

fn write_list(nodes: &[TocNode], html: &mut String) {
    if nodes.is_empty() {
        return;
    }
    html.push_str("<ul>\n");
    for node in nodes {
        html.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            escape(&node.id),
            escape(&node.text)
        ));
        if !node.children.is_empty() {
            html.push('\n');
            write_list(&node.children, html);
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ul>\n");
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
