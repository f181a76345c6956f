//! HTML template system for page generation.
//!
//! A lightweight template system using string interpolation rather than a
//! full template engine. Themes provide templates as plain HTML files:
//!
//! ```text
//! theme/templates/custom/<name>.html   checked first
//! theme/templates/<name>.html          then the theme's own
//! built-in default                     last
//! ```

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Missing required variable.
    #[error("missing required variable `{variable}` in template {template}")]
    MissingVariable { template: String, variable: String },

    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Invalid template syntax.
    #[error("invalid template syntax in {template}: {message}")]
    InvalidSyntax { template: String, message: String },

    /// Template file could not be read.
    #[error("failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Names of the templates every theme renders.
pub const TEMPLATE_NAMES: &[&str] = &["base", "index", "post", "page", "archive", "404"];

/// Template context with variables for interpolation.
///
/// Values are inserted verbatim; callers escape text before inserting it.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable into the context.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Create context with initial variables.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert every pair from an iterator.
    pub fn extend<K, V>(&mut self, vars: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in vars {
            self.insert(key, value);
        }
    }

    /// Get a variable value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Check if a variable exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }
}

/// A simple template that supports variable interpolation.
///
/// Variables are written as `{{ name }}`; `{{ name? }}` renders as empty
/// when the variable is missing.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: String,
}

impl Template {
    /// Create a new template with the given name and content.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Get the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the template with the given context.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut result = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| TemplateError::InvalidSyntax {
                template: self.name.clone(),
                message: "unclosed {{ delimiter".to_string(),
            })?;

            let var_name = after[..end].trim();
            let (var_name, optional) = match var_name.strip_suffix('?') {
                Some(stripped) => (stripped.trim_end(), true),
                None => (var_name, false),
            };

            match context.get(var_name) {
                Some(value) => result.push_str(value),
                None if optional => {}
                None => {
                    return Err(TemplateError::MissingVariable {
                        template: self.name.clone(),
                        variable: var_name.to_string(),
                    });
                }
            }

            rest = &after[end + 2..];
        }
        result.push_str(rest);

        Ok(result)
    }
}

/// Templates of one instance's theme, read from disk on every render so
/// edits show up without a restart.
#[derive(Debug, Clone)]
pub struct ThemeTemplates {
    dir: PathBuf,
}

impl ThemeTemplates {
    /// Create a template source rooted at `theme/templates`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a template by name: custom override, theme file, built-in.
    pub fn load(&self, name: &str) -> Result<Template> {
        let file = format!("{name}.html");
        for path in [self.dir.join("custom").join(&file), self.dir.join(&file)] {
            if path.is_file() {
                debug!(template = name, path = %path.display(), "using theme template");
                let content = std::fs::read_to_string(&path)
                    .map_err(|source| TemplateError::Io { path, source })?;
                return Ok(Template::new(name, content));
            }
        }

        default_template(name)
            .map(|content| Template::new(name, content))
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }

    /// Render a named template.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        self.load(name)?.render(context)
    }

    /// Render a named template and wrap the result in `base`.
    pub fn render_page(&self, name: &str, context: &TemplateContext) -> Result<String> {
        let inner = self.render(name, context)?;
        let outer = context.clone().with_var("content", inner);
        self.render("base", &outer)
    }
}

/// Built-in template for a name, if there is one.
#[must_use]
pub fn default_template(name: &str) -> Option<&'static str> {
    match name {
        "base" => Some(DEFAULT_BASE_TEMPLATE),
        "index" => Some(DEFAULT_INDEX_TEMPLATE),
        "post" => Some(DEFAULT_POST_TEMPLATE),
        "page" => Some(DEFAULT_PAGE_TEMPLATE),
        "archive" => Some(DEFAULT_ARCHIVE_TEMPLATE),
        "404" => Some(DEFAULT_NOT_FOUND_TEMPLATE),
        _ => None,
    }
}

/// Default base HTML template.
pub const DEFAULT_BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ page_title }}</title>
    <meta name="description" content="{{ site_subtitle }}">
    <meta name="author" content="{{ site_author? }}">
    <link rel="alternate" type="application/rss+xml" title="{{ site_title }}" href="{{ feed_url }}">
    <style>
        :root {
            --color-primary: #3B82F6;
            --color-bg: #F8FAFC;
            --color-text: #1E293B;
            --color-text-muted: #64748B;
            --color-border: #E2E8F0;
            --color-code-bg: #F1F5F9;
        }
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: system-ui, -apple-system, sans-serif;
            line-height: 1.7;
            color: var(--color-text);
            background-color: var(--color-bg);
        }
        .container { max-width: 720px; margin: 0 auto; padding: 0 1.5rem; }
        header nav { display: flex; justify-content: space-between; padding: 1rem 0; border-bottom: 1px solid var(--color-border); }
        header .subtitle { color: var(--color-text-muted); font-size: 0.875rem; }
        main { padding: 2rem 0; }
        h1, h2, h3 { line-height: 1.3; margin: 1.5rem 0 0.75rem; }
        p, ul, ol, pre, table { margin-bottom: 1.25rem; }
        ul, ol { padding-left: 1.5rem; }
        a { color: var(--color-primary); text-decoration: none; }
        a:hover { text-decoration: underline; }
        code { background-color: var(--color-code-bg); padding: 0.125rem 0.375rem; border-radius: 0.25rem; }
        pre { padding: 1rem; overflow-x: auto; border-radius: 0.5rem; background-color: var(--color-code-bg); }
        pre code { padding: 0; background: none; }
        img { max-width: 100%; }
        time, .meta { color: var(--color-text-muted); font-size: 0.875rem; }
        .post-list { list-style: none; padding: 0; }
        .post-list li { display: flex; justify-content: space-between; padding: 0.5rem 0; border-bottom: 1px solid var(--color-border); }
        .pager { display: flex; justify-content: space-between; margin-top: 2rem; }
        .toc { border-left: 3px solid var(--color-border); padding-left: 1rem; margin-bottom: 2rem; }
        footer { border-top: 1px solid var(--color-border); padding: 2rem 0; text-align: center; color: var(--color-text-muted); font-size: 0.875rem; }
    </style>
</head>
<body>
    <header>
        <div class="container">
            <nav>
                <div>
                    <a href="{{ index_url }}" class="site-title">{{ site_title }}</a>
                    <div class="subtitle">{{ site_subtitle }}</div>
                </div>
                <div class="nav-links">
                    <a href="{{ archive_url }}">Archive</a>
                    <a href="{{ feed_url }}">Feed</a>
                </div>
            </nav>
        </div>
    </header>
    <main>
        <div class="container">
            {{ content }}
        </div>
    </main>
    <footer>
        <div class="container">
            <p>&copy; {{ site_author? }}. Powered by purepress.</p>
        </div>
    </footer>
</body>
</html>
"##;

/// Default index template: one page of posts with full content.
pub const DEFAULT_INDEX_TEMPLATE: &str = r#"<section class="index">
    {{ entries }}
    {{ pager }}
</section>"#;

/// Default post template.
pub const DEFAULT_POST_TEMPLATE: &str = r#"<article class="post">
    <header>
        <h1>{{ title }}</h1>
        <time datetime="{{ created_iso }}">{{ created }}</time>
        <div class="meta">{{ categories_html? }} {{ tags_html? }}</div>
    </header>
    {{ toc_block? }}
    <div class="content">
        {{ content }}
    </div>
</article>"#;

/// Default page template.
pub const DEFAULT_PAGE_TEMPLATE: &str = r#"<article class="page">
    <h1>{{ title }}</h1>
    {{ toc_block? }}
    <div class="content">
        {{ content }}
    </div>
</article>"#;

/// Default archive template, shared by archive, category and tag listings.
pub const DEFAULT_ARCHIVE_TEMPLATE: &str = r#"<section class="archive">
    <h1>{{ title }}</h1>
    <ul class="post-list">
        {{ items }}
    </ul>
</section>"#;

/// Default not-found template.
pub const DEFAULT_NOT_FOUND_TEMPLATE: &str = r#"<section class="not-found">
    <h1>404</h1>
    <p>The page you are looking for does not exist. Back to <a href="{{ index_url }}">{{ site_title }}</a>.</p>
</section>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_simple_render() {
        let template = Template::new("test", "Hello, {{ name }}!");
        let mut ctx = TemplateContext::new();
        ctx.insert("name", "World");

        let result = template.render(&ctx).unwrap();
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_template_multiple_variables() {
        let template = Template::new(
            "test",
            "{{ greeting }}, {{ name }}! Welcome to {{ place }}.",
        );
        let ctx = TemplateContext::new()
            .with_var("greeting", "Hello")
            .with_var("name", "User")
            .with_var("place", "purepress");

        let result = template.render(&ctx).unwrap();
        assert_eq!(result, "Hello, User! Welcome to purepress.");
    }

    #[test]
    fn test_template_optional_variable() {
        let template = Template::new("test", "Hello{{ suffix? }}!");
        let ctx = TemplateContext::new();

        let result = template.render(&ctx).unwrap();
        assert_eq!(result, "Hello!");

        let ctx = TemplateContext::new().with_var("suffix", ", World");
        let result = template.render(&ctx).unwrap();
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_values_are_not_reinterpolated() {
        let template = Template::new("test", "{{ a }}");
        let ctx = TemplateContext::new().with_var("a", "{{ b }}");
        assert_eq!(template.render(&ctx).unwrap(), "{{ b }}");
    }

    #[test]
    fn test_template_missing_required_variable() {
        let template = Template::new("test", "Hello, {{ name }}!");
        let result = template.render(&TemplateContext::new());
        assert!(matches!(
            result,
            Err(TemplateError::MissingVariable { ref variable, .. }) if variable == "name"
        ));
    }

    #[test]
    fn test_unclosed_delimiter() {
        let template = Template::new("test", "Hello, {{ name");
        assert!(matches!(
            template.render(&TemplateContext::new()),
            Err(TemplateError::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn test_builtin_templates_exist() {
        for name in TEMPLATE_NAMES {
            assert!(default_template(name).is_some(), "{name}");
        }
        assert!(default_template("nonexistent").is_none());
    }

    #[test]
    fn test_override_search_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let templates = ThemeTemplates::new(dir.path());

        assert!(templates.load("page").unwrap().render(&TemplateContext::new()).is_err());

        std::fs::write(dir.path().join("page.html"), "theme {{ title }}").unwrap();
        let ctx = TemplateContext::new().with_var("title", "T");
        assert_eq!(templates.render("page", &ctx).unwrap(), "theme T");

        std::fs::create_dir(dir.path().join("custom")).unwrap();
        std::fs::write(dir.path().join("custom").join("page.html"), "custom {{ title }}").unwrap();
        assert_eq!(templates.render("page", &ctx).unwrap(), "custom T");

        assert!(matches!(
            templates.load("missing"),
            Err(TemplateError::NotFound(_))
        ));
    }

    #[test]
    fn test_render_page_wraps_in_base() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("base.html"), "<body>{{ content }}</body>").unwrap();
        std::fs::write(dir.path().join("page.html"), "<p>{{ content }}</p>").unwrap();

        let templates = ThemeTemplates::new(dir.path());
        let ctx = TemplateContext::new().with_var("content", "hi");
        assert_eq!(
            templates.render_page("page", &ctx).unwrap(),
            "<body><p>hi</p></body>"
        );
    }
}
