//! Verbatim copies of static and raw files into the build output.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Asset copy errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Reading the source tree or writing a copy failed.
    #[error("failed to copy {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walking the source tree failed.
    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A walked file was not under the source directory.
    #[error("invalid asset path: {}", .0.display())]
    InvalidPath(PathBuf),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Copy every file under `source_dir` into `dest_dir`, keeping relative
/// paths. A missing source directory copies nothing.
///
/// Returns the number of files copied.
pub fn copy_dir_contents(source_dir: &Path, dest_dir: &Path) -> Result<usize> {
    if !source_dir.is_dir() {
        debug!(source = %source_dir.display(), "source directory does not exist, skipping");
        return Ok(0);
    }

    let mut count = 0;
    for entry in WalkDir::new(source_dir).min_depth(1) {
        let entry = entry.map_err(|source| AssetError::Walk {
            path: source_dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| AssetError::InvalidPath(entry.path().to_path_buf()))?;
        let dest_path = dest_dir.join(relative);
        copy_file(entry.path(), &dest_path)?;
        count += 1;

        debug!(
            src = %entry.path().display(),
            dest = %dest_path.display(),
            "copied asset"
        );
    }

    info!(
        source = %source_dir.display(),
        dest = %dest_dir.display(),
        count,
        "copied directory"
    );
    Ok(count)
}

/// Copy one file, creating parent directories.
pub fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|source| AssetError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::copy(source, dest).map_err(|e| AssetError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_copy_tree() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("css")).unwrap();
        fs::write(source.path().join("css/style.css"), "body { color: red; }").unwrap();
        fs::write(source.path().join("robots.txt"), "User-agent: *").unwrap();

        let count = copy_dir_contents(source.path(), &dest.path().join("static")).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            fs::read_to_string(dest.path().join("static/css/style.css")).unwrap(),
            "body { color: red; }"
        );
        assert!(dest.path().join("static/robots.txt").exists());
    }

    #[test]
    fn test_missing_source_copies_nothing() {
        let dest = TempDir::new().unwrap();
        let count = copy_dir_contents(&dest.path().join("nope"), dest.path()).unwrap();
        assert_eq!(count, 0);
    }
}
