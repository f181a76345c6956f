//! Build command - crawls the site into static files

use std::{path::Path, sync::Arc};

use color_eyre::eyre::{Result, WrapErr};
use colored::Colorize;
use inquire::Text;
use purepress_core::SiteUrls;
use purepress_generator::{BuildStats, Builder, Site};

use super::load_instance;

/// Run the build command.
///
/// Prompts for the url root when it was not given on the command line.
pub fn run(root: &Path, url_root: Option<&str>) -> Result<()> {
    let url_root = match url_root {
        Some(url_root) => url_root.to_string(),
        None => Text::new("Please enter the url root (used as prefix of generated url)")
            .with_help_message("e.g. http://example.com/blog/")
            .prompt()
            .wrap_err("Failed to read the url root")?,
    };
    tracing::info!(root = %root.display(), url_root = %url_root, "Starting build");

    let (urls, has_host) =
        SiteUrls::from_url_root(&url_root).wrap_err("Invalid url root")?;
    if !has_host {
        println!(
            "{}",
            "The url root does not contain a valid server name, \"localhost\" will be used."
                .yellow()
        );
    }

    let (instance, config) = load_instance(root)?;
    let site = Site::new(Arc::clone(&config), instance, urls, true);
    let builder = Builder::new(&site);

    let stats = match builder.build() {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("{}", "Failed to build the site.".red());
            return Err(e).wrap_err("Build failed");
        }
    };

    print_build_stats(&stats, builder.output_dir());
    tracing::info!(?stats, "Build completed successfully");
    Ok(())
}

/// Print build statistics in a user-friendly format.
fn print_build_stats(stats: &BuildStats, output: &Path) {
    println!();
    println!("  Pages:        {:>6}", stats.pages);
    println!("  Posts:        {:>6}", stats.posts);
    println!("  Listings:     {:>6}", stats.listings);
    println!("  Index pages:  {:>6}", stats.index_pages);
    println!("  Assets:       {:>6}", stats.assets);
    println!("  Duration:     {:>6}ms", stats.duration_ms);
    println!();
    println!(
        "{}",
        format!(
            "OK! Now you can find the built site in \"{}\".",
            output.display()
        )
        .green()
    );
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_build_with_url_root() {
        let dir = TempDir::new().unwrap();
        crate::cmd::init::run(dir.path()).unwrap();

        run(dir.path(), Some("https://example.com/blog/")).unwrap();

        let post = fs::read_to_string(dir.path().join("build/post/1970/01/01/demo/index.html"))
            .unwrap();
        assert!(post.contains("A demo post"));
        assert!(post.contains("href=\"/blog/archive/\""));

        let feed = fs::read_to_string(dir.path().join("build/feed.xml")).unwrap();
        assert!(feed.contains("https://example.com/blog/post/1970/01/01/demo/"));
    }
}
