//! Syntax highlighting for fenced code blocks.

use syntect::{highlighting::ThemeSet, html::highlighted_html_for_string, parsing::SyntaxSet};

/// Syntax highlighter using syntect.
#[derive(Debug)]
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme: String,
}

impl SyntaxHighlighter {
    /// Create a highlighter for a bundled syntect theme.
    ///
    /// Returns `None` when the theme is unknown, leaving code blocks to the
    /// plain `<pre><code>` rendering.
    pub fn new(theme: &str) -> Option<Self> {
        let theme_set = ThemeSet::load_defaults();
        if !theme_set.themes.contains_key(theme) {
            tracing::warn!(
                theme,
                available = ?theme_set.themes.keys().collect::<Vec<_>>(),
                "unknown highlight theme, code blocks stay unhighlighted"
            );
            return None;
        }

        Some(Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set,
            theme: theme.to_string(),
        })
    }

    /// Highlight code with the given language token.
    ///
    /// Unknown languages fall back to a `<pre><code>` block.
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let syntax = lang.and_then(|l| self.syntax_set.find_syntax_by_token(l));

        match (syntax, self.theme_set.themes.get(&self.theme)) {
            (Some(syntax), Some(theme)) => {
                highlighted_html_for_string(code, &self.syntax_set, syntax, theme)
                    .unwrap_or_else(|e| {
                        tracing::debug!(error = %e, "highlighting failed");
                        plain_code_block(code, lang)
                    })
            }
            _ => plain_code_block(code, lang),
        }
    }
}

/// Unhighlighted code block in the same shape pulldown-cmark emits.
pub fn plain_code_block(code: &str, lang: Option<&str>) -> String {
    let lang_class = lang
        .map(|l| format!(" class=\"language-{}\"", html_escape(l)))
        .unwrap_or_default();
    format!("<pre><code{lang_class}>{}</code></pre>\n", html_escape(code))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
