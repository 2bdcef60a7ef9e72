//! Directory-listing abstraction for the search heuristics.
//!
//! Every filesystem-walking component (discovery, the parent locator, the
//! loaders) goes through [`DirTree`] so the heuristics stay pure functions
//! over a listable tree and can be unit-tested against an in-memory fake.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{DependsError, Result};
use crate::paths::normalize;

/// Predicate over candidate file paths. Filters leaves only; it never
/// prunes directory descent.
pub type FilePredicate<'p> = &'p dyn Fn(&Path) -> bool;

/// A listable directory tree.
///
/// `read_dir` returns entries in lexical order. The parent locator breaks
/// same-level ties by taking the first match, so sorted listings are what
/// make the heuristics deterministic.
pub trait DirTree {
    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    /// Lists the direct entries (files and subdirectories) of `dir`,
    /// lexically sorted.
    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Canonical spelling of `path` for registry keys: symlinks and case
    /// aliases of an existing file must collapse to one spelling. Paths
    /// that do not exist (hint paths with unbuilt components) fall back to
    /// lexical normalization.
    fn canonicalize(&self, path: &Path) -> PathBuf {
        normalize(path)
    }

    /// Finds files under `root` matching `predicate`, in traversal order.
    ///
    /// Fails if `root` is not an existing directory. When `recursive` is
    /// set, descends into every subdirectory regardless of whether the
    /// predicate matched anything at that level. `max_results` short-circuits
    /// the traversal once reached; results up to the cap are still complete
    /// subject to traversal order.
    fn find_files(
        &self,
        root: &Path,
        recursive: bool,
        max_results: Option<usize>,
        predicate: FilePredicate<'_>,
    ) -> Result<Vec<PathBuf>> {
        if !self.is_dir(root) {
            return Err(DependsError::NotADirectory(root.to_path_buf()));
        }
        let mut found = Vec::new();
        self.find_files_into(root, recursive, max_results, predicate, &mut found)?;
        Ok(found)
    }

    #[doc(hidden)]
    fn find_files_into(
        &self,
        dir: &Path,
        recursive: bool,
        max_results: Option<usize>,
        predicate: FilePredicate<'_>,
        found: &mut Vec<PathBuf>,
    ) -> Result<()> {
        for entry in self.read_dir(dir)? {
            if max_results.is_some_and(|cap| found.len() >= cap) {
                return Ok(());
            }
            if self.is_dir(&entry) {
                if recursive {
                    self.find_files_into(&entry, recursive, max_results, predicate, found)?;
                }
            } else if predicate(&entry) {
                found.push(entry);
            }
        }
        Ok(())
    }
}

/// [`DirTree`] over the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsDirTree;

impl DirTree for OsDirTree {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir).map_err(|e| DependsError::io(dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DependsError::io(dir, e))?;
            paths.push(entry.path());
        }
        paths.sort();
        Ok(paths)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| DependsError::io(path, e))
    }

    fn canonicalize(&self, path: &Path) -> PathBuf {
        std::fs::canonicalize(path).unwrap_or_else(|_| normalize(path))
    }

    fn find_files(
        &self,
        root: &Path,
        recursive: bool,
        max_results: Option<usize>,
        predicate: FilePredicate<'_>,
    ) -> Result<Vec<PathBuf>> {
        if !self.is_dir(root) {
            return Err(DependsError::NotADirectory(root.to_path_buf()));
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut found = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(false)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            if max_results.is_some_and(|cap| found.len() >= cap) {
                break;
            }
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                match e.into_io_error() {
                    Some(io) => DependsError::io(path, io),
                    None => DependsError::NotADirectory(path),
                }
            })?;
            if entry.file_type().is_file() && predicate(entry.path()) {
                found.push(entry.into_path());
            }
        }
        Ok(found)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MemoryEntry {
    Dir,
    File(String),
}

/// In-memory [`DirTree`] fake for unit tests: a fabricated directory layout
/// with no real I/O behind it.
#[derive(Debug, Default, Clone)]
pub struct MemoryDirTree {
    entries: BTreeMap<PathBuf, MemoryEntry>,
}

impl MemoryDirTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory, creating missing ancestors.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        let path = normalize(path.as_ref());
        let mut current = path.as_path();
        loop {
            self.entries
                .entry(current.to_path_buf())
                .or_insert(MemoryEntry::Dir);
            match current.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => current = parent,
                _ => break,
            }
        }
        self
    }

    /// Adds a file with the given contents, creating missing ancestors.
    pub fn add_file(&mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> &mut Self {
        let path = normalize(path.as_ref());
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.add_dir(parent);
            }
        }
        self.entries.insert(path, MemoryEntry::File(contents.into()));
        self
    }
}

impl DirTree for MemoryDirTree {
    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entries.get(&normalize(path)), Some(MemoryEntry::Dir))
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(
            self.entries.get(&normalize(path)),
            Some(MemoryEntry::File(_))
        )
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let dir = normalize(dir);
        if !self.is_dir(&dir) {
            return Err(DependsError::NotADirectory(dir));
        }
        // BTreeMap iteration keeps the lexical-order contract.
        Ok(self
            .entries
            .keys()
            .filter(|path| path.parent() == Some(dir.as_path()))
            .cloned()
            .collect())
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.entries.get(&normalize(path)) {
            Some(MemoryEntry::File(contents)) => Ok(contents.clone()),
            _ => Err(DependsError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            )),
        }
    }
}
