//! Path utilities for the VFS layer.
//!
//! All paths here are `/`-separated strings, independent of the host OS.
//! Joining follows the usual POSIX rule that an absolute component discards
//! everything before it, which is exactly what the validator must catch.

use crate::{Error, Result};

/// Join two path fragments with a single `/`.
///
/// An absolute `part` replaces `base` entirely.
pub fn join(base: &str, part: &str) -> String {
    if part.starts_with('/') || base.is_empty() {
        part.to_string()
    } else if base.ends_with('/') {
        format!("{}{}", base, part)
    } else {
        format!("{}/{}", base, part)
    }
}

/// Join any number of fragments left to right.
pub fn construct_path(parts: &[&str]) -> String {
    parts
        .iter()
        .fold(String::new(), |acc, part| join(&acc, part))
}

/// Normalize a path by resolving `.` and `..` and collapsing repeated slashes.
///
/// `..` above the root of an absolute path is dropped, as a shell would.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut components: Vec<&str> = Vec::new();

    for component in path.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                if components.last().is_some_and(|c| *c != "..") {
                    components.pop();
                } else if !absolute {
                    components.push("..");
                }
            }
            c => components.push(c),
        }
    }

    let joined = components.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Resolve `candidate` against `root` and require the result to stay inside it.
///
/// Returns the normalized absolute path. `root` should itself be absolute;
/// it is normalized before comparing.
pub fn validate(root: &str, candidate: &str) -> Result<String> {
    let root = normalize(root);
    let resolved = normalize(&join(&root, candidate));

    if is_within(&root, &resolved) {
        Ok(resolved)
    } else {
        Err(Error::InvalidPath(candidate.to_string()))
    }
}

/// Strip `root` from an absolute path that [`validate`] accepted.
///
/// A path outside `root` is [`Error::InvalidPath`].
pub fn relative_to<'a>(root: &str, path: &'a str) -> Result<&'a str> {
    let root = normalize(root);
    if !is_within(&root, path) {
        return Err(Error::InvalidPath(path.to_string()));
    }
    Ok(path[root.len()..].trim_start_matches('/'))
}

// Component-wise prefix test, so `/a/assets` does not contain `/a/assetsx`.
fn is_within(root: &str, path: &str) -> bool {
    if root == "/" {
        return path.starts_with('/');
    }
    path == root
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "/exploration/exp1/assets";

    #[test]
    fn test_join() {
        assert_eq!(join("/a", "b"), "/a/b");
        assert_eq!(join("/a/", "b"), "/a/b");
        assert_eq!(join("/a", "/etc"), "/etc");
        assert_eq!(join("/a", ""), "/a/");
        assert_eq!(construct_path(&["/", "topic/t/assets", "img"]), "/topic/t/assets/img");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/a/./b//c"), "/a/b/c");
        assert_eq!(normalize("/a/b/../c"), "/a/c");
        assert_eq!(normalize("/../../x"), "/x");
        assert_eq!(normalize("a/../../b"), "../b");
        assert_eq!(normalize(""), ".");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn test_validate_inside_root() {
        assert_eq!(validate(ROOT, "a/b.png").unwrap(), "/exploration/exp1/assets/a/b.png");
        assert_eq!(validate(ROOT, "a/../b.png").unwrap(), "/exploration/exp1/assets/b.png");
        assert_eq!(validate(ROOT, "").unwrap(), ROOT);
        assert_eq!(validate(ROOT, "./img/").unwrap(), "/exploration/exp1/assets/img");
    }

    #[test]
    fn test_validate_rejects_traversal() {
        for bad in ["../secret", "../../secret", "a/../../x.png", "/etc/passwd", "../assetsx/a.png"] {
            let err = validate(ROOT, bad).unwrap_err();
            assert!(matches!(err, Error::InvalidPath(_)), "accepted {}", bad);
        }
    }

    #[test]
    fn test_validate_rejects_sibling_with_same_prefix() {
        assert!(validate(ROOT, "../assets2/file.png").is_err());
    }

    #[test]
    fn test_relative_to() {
        let abs = validate(ROOT, "img/a.png").unwrap();
        assert_eq!(relative_to(ROOT, &abs).unwrap(), "img/a.png");
        assert_eq!(relative_to(ROOT, ROOT).unwrap(), "");
        assert_eq!(relative_to("/", "/img/a.png").unwrap(), "img/a.png");
    }

    #[test]
    fn test_relative_to_outside_root() {
        for outside in ["/assets/a.png", "/exploration/exp1/assetsx/a.png", "img/a.png"] {
            assert!(matches!(relative_to(ROOT, outside), Err(Error::InvalidPath(_))));
        }
    }
}
