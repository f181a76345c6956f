//! Init command - scaffold a new instance

use std::{fs, path::Path};

use color_eyre::eyre::{Result, WrapErr, bail};
use colored::Colorize;
use purepress_core::Instance;

use super::step;

/// Configuration written by `init`.
pub const DEFAULT_CONFIG: &str = r#"[site]
title = "My Blog"
subtitle = "Here is my blog"
author = "My Name"
timezone = "Asia/Shanghai"

[config]
posts_per_index_page = 5
"#;

/// Demo entry body; `{kind}` is `page` or `post`.
fn demo_entry(kind: &str) -> String {
    format!("---\ntitle: A demo {kind}\n---\n\nThis is a demo {kind}.\n")
}

/// Run the init command.
///
/// Fails when the instance directory exists and is not empty.
pub fn run(root: &Path) -> Result<()> {
    tracing::info!(root = %root.display(), "Initializing instance");

    if is_non_empty_dir(root)? {
        eprintln!(
            "{}",
            format!("The instance folder \"{}\" is not empty", root.display()).red()
        );
        bail!("instance folder {} is not empty", root.display());
    }

    let instance = Instance::new(root);

    step("Creating folders", || {
        for dir in [
            instance.posts_dir(),
            instance.pages_dir(),
            instance.static_dir(),
            instance.raw_dir(),
        ] {
            fs::create_dir_all(&dir)
                .wrap_err_with(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    })?;

    step("Creating default purepress.toml", || {
        write_file(&instance.config_file(), DEFAULT_CONFIG)
    })?;
    step("Creating demo page", || {
        write_file(&instance.pages_dir().join("demo.md"), &demo_entry("page"))
    })?;
    step("Creating demo post", || {
        write_file(
            &instance.posts_dir().join("1970-01-01-demo.md"),
            &demo_entry("post"),
        )
    })?;

    println!(
        "{}",
        "OK! Now you can install a theme and preview the site.".green()
    );
    Ok(())
}

fn is_non_empty_dir(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let mut entries =
        fs::read_dir(path).wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    Ok(entries.next().is_some())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).wrap_err_with(|| format!("Failed to write {}", path.display()))
}
