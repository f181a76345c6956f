//! purepress CLI
//!
//! A simple static blog generator with live preview.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use purepress::cmd::{self, preview::PreviewOptions};
use purepress_core::instance::INSTANCE_ENV;

/// Command-line interface for purepress.
#[derive(Parser)]
#[command(
    name = "purepress",
    version,
    about = "A simple static blog generator"
)]
struct Cli {
    /// Instance directory holding purepress.toml, posts/ and pages/
    #[arg(short, long, global = true, env = INSTANCE_ENV, default_value = ".")]
    instance: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Initialize an instance
    Init,
    /// Preview the site
    Preview {
        /// Host to listen on
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
        /// Do not watch for changes or live reload
        #[arg(long)]
        no_debug: bool,
        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },
    /// Build the site
    Build {
        /// URL root of the site, e.g. "http://example.com/blog/"
        #[arg(long)]
        url_root: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    purepress::init_tracing(cli.verbose);

    match cli.command {
        Commands::Init => {
            cmd::init::run(&cli.instance)?;
        }
        Commands::Preview {
            host,
            port,
            no_debug,
            open,
        } => {
            let options = PreviewOptions {
                host,
                port,
                debug: !no_debug,
                open,
            };
            cmd::preview::run(&cli.instance, options).await?;
        }
        Commands::Build { url_root } => {
            let instance = cli.instance.clone();
            tokio::task::spawn_blocking(move || cmd::build::run(&instance, url_root.as_deref()))
                .await??;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_build_command_parsing() {
        let cli = Cli::parse_from(["purepress", "build", "--url-root", "http://example.com/blog/"]);

        assert_eq!(cli.verbose, 0);
        match cli.command {
            Commands::Build { url_root } => {
                assert_eq!(url_root.as_deref(), Some("http://example.com/blog/"));
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_build_without_url_root() {
        let cli = Cli::parse_from(["purepress", "build"]);
        match cli.command {
            Commands::Build { url_root } => assert!(url_root.is_none()),
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_preview_defaults() {
        let cli = Cli::parse_from(["purepress", "preview"]);

        match cli.command {
            Commands::Preview {
                host,
                port,
                no_debug,
                open,
            } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 8080);
                assert!(!no_debug);
                assert!(!open);
            }
            _ => panic!("Expected Preview command"),
        }
    }

    #[test]
    fn test_cli_preview_options() {
        let cli = Cli::parse_from([
            "purepress",
            "preview",
            "-H",
            "0.0.0.0",
            "--port",
            "3000",
            "--no-debug",
            "--open",
        ]);

        match cli.command {
            Commands::Preview {
                host,
                port,
                no_debug,
                open,
            } => {
                assert_eq!(host, "0.0.0.0");
                assert_eq!(port, 3000);
                assert!(no_debug);
                assert!(open);
            }
            _ => panic!("Expected Preview command"),
        }
    }

    #[test]
    fn test_cli_instance_and_verbosity() {
        let cli = Cli::parse_from(["purepress", "init", "--instance", "/tmp/blog", "-vv"]);
        assert_eq!(cli.instance, PathBuf::from("/tmp/blog"));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Init));
    }
}
