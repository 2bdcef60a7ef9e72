//! In-memory artifact model: solutions, projects, assembly references.
//!
//! Entities live in an [`ArtifactStore`] arena and refer to each other by
//! stable ids, never by shared ownership. The store's path→id indexes are
//! the per-run registries that keep the same file from being loaded twice;
//! they are scoped to the store, not to the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::paths::PathKey;

/// Handle to a [`Solution`] in an [`ArtifactStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolutionId(u32);

/// Handle to a [`Project`] in an [`ArtifactStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectId(u32);

/// The referenced binary itself. Its real path depends on build
/// configuration and platform and cannot be derived from static
/// information, so it stays an opaque placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub file_path: Option<PathBuf>,
}

impl Assembly {
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// A declared dependency from a project on a binary, identified only by an
/// untrustworthy hint path.
#[derive(Debug, Clone)]
pub struct AssemblyReference {
    /// Absolute, normalized expected location of the referenced binary.
    /// May contain unresolved build-configuration placeholders.
    pub hint_path: PathBuf,
    pub assembly: Assembly,
    /// The project believed to produce the binary. Empty until resolution
    /// succeeds; may stay empty permanently.
    pub producer: Option<ProjectId>,
}

impl AssemblyReference {
    pub fn new(hint_path: PathBuf) -> Self {
        Self {
            hint_path,
            assembly: Assembly::unknown(),
            producer: None,
        }
    }
}

/// A buildable unit declaring assembly references.
#[derive(Debug, Clone)]
pub struct Project {
    pub file_path: PathBuf,
    /// Set exactly once, at construction. The first-seen parent wins.
    pub parent_solution: SolutionId,
    pub references: Vec<AssemblyReference>,
}

/// A top-level grouping file owning an ordered set of projects.
#[derive(Debug, Clone)]
pub struct Solution {
    pub file_path: PathBuf,
    /// Discovery order from the raw solution text.
    pub projects: Vec<ProjectId>,
}

/// Arena of loaded solutions and projects, with path-keyed registries for
/// duplicate-load avoidance.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    solutions: Vec<Solution>,
    projects: Vec<Project>,
    solution_index: HashMap<PathKey, SolutionId>,
    project_index: HashMap<PathKey, ProjectId>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new solution with no projects yet. If the path is
    /// already registered, returns the existing id instead.
    pub fn add_solution(&mut self, file_path: PathBuf) -> SolutionId {
        let key = PathKey::new(&file_path);
        if let Some(&id) = self.solution_index.get(&key) {
            return id;
        }
        let id = SolutionId(self.solutions.len() as u32);
        self.solutions.push(Solution {
            file_path,
            projects: Vec::new(),
        });
        self.solution_index.insert(key, id);
        id
    }

    /// Registers a new project and appends it to its parent solution's
    /// project list. If the path is already registered, returns the
    /// existing id (the original parent is kept) and still appends.
    pub fn add_project(
        &mut self,
        file_path: PathBuf,
        parent_solution: SolutionId,
        references: Vec<AssemblyReference>,
    ) -> ProjectId {
        let key = PathKey::new(&file_path);
        let id = match self.project_index.get(&key) {
            Some(&existing) => existing,
            None => {
                let id = ProjectId(self.projects.len() as u32);
                self.projects.push(Project {
                    file_path,
                    parent_solution,
                    references,
                });
                self.project_index.insert(key, id);
                id
            }
        };
        self.attach_project(parent_solution, id);
        id
    }

    /// Appends an already-registered project to a solution's project list.
    /// Does not change the project's parent solution.
    pub fn attach_project(&mut self, solution: SolutionId, project: ProjectId) {
        self.solutions[solution.0 as usize].projects.push(project);
    }

    pub fn solution(&self, id: SolutionId) -> &Solution {
        &self.solutions[id.0 as usize]
    }

    pub fn project(&self, id: ProjectId) -> &Project {
        &self.projects[id.0 as usize]
    }

    pub fn project_mut(&mut self, id: ProjectId) -> &mut Project {
        &mut self.projects[id.0 as usize]
    }

    pub fn find_solution(&self, path: &Path) -> Option<SolutionId> {
        self.solution_index.get(&PathKey::new(path)).copied()
    }

    pub fn find_project(&self, path: &Path) -> Option<ProjectId> {
        self.project_index.get(&PathKey::new(path)).copied()
    }

    pub fn solution_count(&self) -> usize {
        self.solutions.len()
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    /// Total number of assembly references across all projects.
    pub fn reference_count(&self) -> usize {
        self.projects.iter().map(|p| p.references.len()).sum()
    }

    /// Number of references with no resolved producer.
    pub fn unresolved_reference_count(&self) -> usize {
        self.projects
            .iter()
            .flat_map(|p| &p.references)
            .filter(|r| r.producer.is_none())
            .count()
    }
}
