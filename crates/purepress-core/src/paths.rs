//! Sandboxed path joins for URL-derived paths.

use std::path::{Path, PathBuf};

/// Join a `/`-separated relative path under `root`.
///
/// Returns `None` when any segment would leave `root` (`..`) or smuggles a
/// separator the URL layer cannot see (`\`, NUL). Empty and `.` segments are
/// skipped, so a leading `/` stays inside the root.
pub fn safe_join(root: &Path, rel: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in rel.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\\') || s.contains('\0') => return None,
            s => path.push(s),
        }
    }
    Some(path)
}

/// Whether `name` can be used as exactly one directory name.
pub fn is_single_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_inside_root() {
        let root = Path::new("/site/pages");
        assert_eq!(
            safe_join(root, "foo/bar.md"),
            Some(PathBuf::from("/site/pages/foo/bar.md"))
        );
        assert_eq!(
            safe_join(root, "/foo/./bar.md"),
            Some(PathBuf::from("/site/pages/foo/bar.md"))
        );
        assert_eq!(safe_join(root, ""), Some(PathBuf::from("/site/pages")));
    }

    #[test]
    fn test_traversal_rejected() {
        let root = Path::new("/site/pages");
        assert_eq!(safe_join(root, "../purepress.toml"), None);
        assert_eq!(safe_join(root, "foo/../../etc/passwd"), None);
        assert_eq!(safe_join(root, "foo\\..\\bar"), None);
    }

    #[test]
    fn test_single_segment() {
        assert!(is_single_segment("rust"));
        assert!(is_single_segment("编程"));
        assert!(!is_single_segment(".."));
        assert!(!is_single_segment("a/b"));
        assert!(!is_single_segment(""));
    }
}
