//! Path normalization and the canonical registry key.
//!
//! Registries and heuristic searches must treat two differently-spelled
//! paths that denote the same filesystem entity as equal. Normalization is
//! purely lexical: hint paths routinely contain components that do not
//! exist on disk (unbuilt output directories, `$(Configuration)`-style
//! placeholders), so syscall-based canonicalization is not an option.

use std::path::{Component, Path, PathBuf};

/// Lexically normalizes a path: strips `.` components and resolves `..`
/// against the preceding component. A `..` that would climb past the root
/// (or past the start of a relative path) is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                }
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
        }
    }
    out
}

/// Makes `path` absolute against `base` (itself expected absolute), then
/// normalizes the result.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Canonical form of a path, used as the registry key and for every
/// path-equivalence test. Case-folded on Windows, where the filesystem
/// compares names case-insensitively.
///
/// Folding is lexical only. Paths that exist on disk are resolved through
/// [`DirTree::canonicalize`](crate::fs::DirTree::canonicalize) before they
/// are keyed, so symlink aliases collapse there; this type covers paths
/// that cannot be resolved on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey(String);

impl PathKey {
    pub fn new(path: &Path) -> Self {
        let normalized = normalize(path);
        let text = normalized.to_string_lossy().into_owned();
        #[cfg(windows)]
        let text = text.to_lowercase();
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Path-equivalence test per the registry invariant: canonical forms
/// compare equal, not literal spellings.
pub fn paths_equivalent(a: &Path, b: &Path) -> bool {
    PathKey::new(a) == PathKey::new(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_cur_dir() {
        assert_eq!(
            normalize(Path::new("/work/./src/./lib.sln")),
            PathBuf::from("/work/src/lib.sln")
        );
    }

    #[test]
    fn test_normalize_resolves_parent_dir() {
        assert_eq!(
            normalize(Path::new("/work/src/../out/app.dll")),
            PathBuf::from("/work/out/app.dll")
        );
    }

    #[test]
    fn test_normalize_drops_leading_parent_past_root() {
        assert_eq!(
            normalize(Path::new("/../../work/app.sln")),
            PathBuf::from("/work/app.sln")
        );
    }

    #[test]
    fn test_absolutize_relative_against_base() {
        assert_eq!(
            absolutize(Path::new("../p3/bin/p3.dll"), Path::new("/repo/s2/p1")),
            PathBuf::from("/repo/s2/p3/bin/p3.dll")
        );
    }

    #[test]
    fn test_absolutize_keeps_absolute_input() {
        assert_eq!(
            absolutize(Path::new("/repo/./a.sln"), Path::new("/elsewhere")),
            PathBuf::from("/repo/a.sln")
        );
    }

    #[test]
    fn test_path_key_equivalence_across_spellings() {
        assert!(paths_equivalent(
            Path::new("/repo/./s1/s1.sln"),
            Path::new("/repo/s2/../s1/s1.sln")
        ));
        assert!(!paths_equivalent(
            Path::new("/repo/s1/s1.sln"),
            Path::new("/repo/s2/s2.sln")
        ));
    }
}
