//! Command implementations.

pub mod build;
pub mod init;
pub mod preview;

use std::{path::Path, sync::Arc};

use color_eyre::eyre::{Result, WrapErr};
use purepress_core::{Config, Instance};

/// Open the instance at `root` and load its configuration.
pub fn load_instance(root: &Path) -> Result<(Instance, Arc<Config>)> {
    let instance = Instance::new(root);
    let config = Config::load(&instance.config_file())
        .wrap_err_with(|| format!("Failed to load {}", instance.config_file().display()))?;
    tracing::debug!(?config, "Loaded configuration");
    Ok((instance, Arc::new(config)))
}

/// Print `"<op>..."` and run it, finishing the line with a coloured status.
pub fn step<T>(op: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    use std::io::Write;

    use colored::Colorize;

    print!("{op}...");
    let _ = std::io::stdout().flush();
    match f() {
        Ok(value) => {
            println!("{}", "OK".green());
            Ok(value)
        }
        Err(e) => {
            println!("{}", "FAILED".red());
            Err(e)
        }
    }
}
