//! Heuristic file location: solution discovery and the upward
//! producer/owner searches.
//!
//! There is no build metadata linking a referenced binary back to the
//! project that produces it. The only structural signal is layout
//! convention: build outputs sit a few directory levels below their owning
//! project (`bin/Debug/x86`), and solutions sit alongside or above their
//! member projects. Both searches climb ancestor-by-ancestor from a start
//! directory, testing each level non-recursively, and stop at the first
//! level with a match.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::fs::DirTree;
use crate::readers::{is_solution_file, ProjectRecognizer};

pub struct FileLocator<'a> {
    tree: &'a dyn DirTree,
    recognizer: &'a dyn ProjectRecognizer,
}

impl<'a> FileLocator<'a> {
    pub fn new(tree: &'a dyn DirTree, recognizer: &'a dyn ProjectRecognizer) -> Self {
        Self { tree, recognizer }
    }

    /// Finds every solution file under `root`, in traversal order.
    pub fn find_solutions(&self, root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
        self.tree
            .find_files(root, recursive, None, &is_solution_file)
    }

    /// Finds the project that most likely produces the binary at
    /// `hint_path`, climbing from the hint's directory toward the root.
    /// The hint's own directory is the first level tested, so a project
    /// file sitting next to the binary wins over anything above it.
    /// `None` when no ancestor level contains a recognizable project file.
    pub fn find_producing_project(&self, hint_path: &Path) -> Option<PathBuf> {
        let start = hint_path.parent()?;
        let found = self.ascend(start, &|path| {
            self.recognizer.is_project_file(self.tree, path)
        });
        match &found {
            Some(project) => debug!(hint = %hint_path.display(), project = %project.display(), "located producing project"),
            None => debug!(hint = %hint_path.display(), "no producing project found"),
        }
        found
    }

    /// Finds the solution that owns `project_path`, climbing from the
    /// project's directory toward the root. `None` when no ancestor level
    /// contains a solution file.
    pub fn find_owning_solution(&self, project_path: &Path) -> Option<PathBuf> {
        let start = project_path.parent()?;
        self.ascend(start, &is_solution_file)
    }

    /// Walks `start` and then each ancestor (never siblings or
    /// descendants), testing each existing directory non-recursively.
    /// Within a level, the lexically-first match wins; levels that do not
    /// exist on disk (unbuilt output dirs, configuration placeholders) are
    /// skipped. `None` once the root is passed without a match.
    fn ascend(&self, start: &Path, predicate: &dyn Fn(&Path) -> bool) -> Option<PathBuf> {
        let mut current = Some(start);
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            if self.tree.is_dir(dir) {
                if let Ok(matches) = self.tree.find_files(dir, false, Some(1), predicate) {
                    if let Some(found) = matches.into_iter().next() {
                        return Some(found);
                    }
                }
            }
            current = dir.parent();
        }
        None
    }
}
