//! Solution and project loading.
//!
//! Loading wires raw extracted content into the artifact arena. The store's
//! registries make loads idempotent: a second load request for a path that
//! is already registered returns the cached entity instead of re-parsing.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::Result;
use crate::fs::DirTree;
use crate::model::{ArtifactStore, AssemblyReference, ProjectId, SolutionId};
use crate::paths::absolutize;
use crate::readers::{ProjectReader, ProjectRecognizer, SolutionReader};

pub struct SolutionLoader<'a> {
    tree: &'a dyn DirTree,
    solution_reader: &'a dyn SolutionReader,
    project_reader: &'a dyn ProjectReader,
    recognizer: &'a dyn ProjectRecognizer,
}

impl<'a> SolutionLoader<'a> {
    pub fn new(
        tree: &'a dyn DirTree,
        solution_reader: &'a dyn SolutionReader,
        project_reader: &'a dyn ProjectReader,
        recognizer: &'a dyn ProjectRecognizer,
    ) -> Self {
        Self {
            tree,
            solution_reader,
            project_reader,
            recognizer,
        }
    }

    pub(crate) fn tree(&self) -> &'a dyn DirTree {
        self.tree
    }

    pub(crate) fn recognizer(&self) -> &'a dyn ProjectRecognizer {
        self.recognizer
    }

    /// Loads the solution at `path` (expected absolute) and, recursively,
    /// its member projects. Returns the cached solution if the path is
    /// already registered. The path is canonicalized first, so symlink and
    /// case aliases of an already-loaded solution hit the cache.
    ///
    /// Member projects are skipped when the file does not exist (virtual
    /// solution folders), the extension is not a recognized project kind,
    /// or the content signature fails. A member that fails to load is
    /// logged and skipped; the rest of the solution still loads. A failure
    /// to read or parse the solution file itself is an error.
    pub fn load_solution(&self, store: &mut ArtifactStore, path: &Path) -> Result<SolutionId> {
        let path = self.tree.canonicalize(path);
        if let Some(id) = store.find_solution(&path) {
            return Ok(id);
        }

        let members = self.solution_reader.member_project_paths(self.tree, &path)?;

        // Registered before the members load, so a project that transitively
        // reaches back to this solution finds it instead of looping.
        let id = store.add_solution(path.clone());
        debug!(solution = %path.display(), members = members.len(), "loading solution");

        let solution_dir = path.parent().unwrap_or_else(|| Path::new(""));
        for member in members {
            let project_path = absolutize(&member, solution_dir);
            if !self.tree.is_file(&project_path) {
                // Virtual solution folders show up as members with no file.
                continue;
            }
            if !self.recognizer.matches_extension(&project_path) {
                continue;
            }
            if !self.recognizer.matches_content(self.tree, &project_path) {
                continue;
            }
            match self.load_project(store, &project_path, id) {
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        project = %project_path.display(),
                        error = %err,
                        "skipping project that failed to load"
                    );
                }
            }
        }
        Ok(id)
    }

    /// Loads the project at `path` (expected absolute) under
    /// `parent_solution`. On a cache hit the already-loaded project is
    /// returned and the given parent is informational only: the first-seen
    /// parent wins.
    pub fn load_project(
        &self,
        store: &mut ArtifactStore,
        path: &Path,
        parent_solution: SolutionId,
    ) -> Result<ProjectId> {
        let path = self.tree.canonicalize(path);
        if let Some(id) = store.find_project(&path) {
            store.attach_project(parent_solution, id);
            return Ok(id);
        }

        let hints = self.project_reader.reference_hint_paths(self.tree, &path)?;
        let project_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let references = hints
            .iter()
            .map(|hint| AssemblyReference::new(absolutize(hint, project_dir)))
            .collect::<Vec<_>>();
        debug!(project = %path.display(), references = references.len(), "loaded project");
        Ok(store.add_project(path, parent_solution, references))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryDirTree;
    use crate::readers::{VsProjectReader, VsProjectRecognizer, VsSolutionReader};
    use std::path::PathBuf;

    const SLN: &str = concat!(
        "Project(\"{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}\") = \"p1\", \"p1\\p1.csproj\", \"{11111111-2222-3333-4444-555555555555}\"\n",
        "Project(\"{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}\") = \"folder\", \"folder\", \"{22222222-2222-3333-4444-555555555555}\"\n",
        "Project(\"{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}\") = \"native\", \"native\\native.vcxproj\", \"{33333333-2222-3333-4444-555555555555}\"\n",
        "Project(\"{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}\") = \"p2\", \"p2\\p2.csproj\", \"{44444444-2222-3333-4444-555555555555}\"\n",
    );

    const PROJECT_WITH_REF: &str = r#"<Project>
  <ItemGroup>
    <Reference Include="lib"><HintPath>..\..\other\lib\bin\lib.dll</HintPath></Reference>
  </ItemGroup>
</Project>"#;

    const PROJECT_EMPTY: &str = "<Project></Project>";

    fn loader_fixture() -> MemoryDirTree {
        let mut tree = MemoryDirTree::new();
        tree.add_file("/repo/s1/s1.sln", SLN)
            .add_file("/repo/s1/p1/p1.csproj", PROJECT_WITH_REF)
            .add_file("/repo/s1/p2/p2.csproj", PROJECT_EMPTY)
            .add_file("/repo/s1/native/native.vcxproj", "<Project></Project>");
        tree
    }

    fn load(tree: &MemoryDirTree, store: &mut ArtifactStore, path: &str) -> SolutionId {
        let loader = SolutionLoader::new(
            tree,
            &VsSolutionReader,
            &VsProjectReader,
            &VsProjectRecognizer,
        );
        loader.load_solution(store, Path::new(path)).unwrap()
    }

    #[test]
    fn test_load_solution_filters_members() {
        let tree = loader_fixture();
        let mut store = ArtifactStore::new();
        let s1 = load(&tree, &mut store, "/repo/s1/s1.sln");

        // The virtual folder (no file) and the unrecognized .vcxproj are
        // filtered out; the two csproj members load in discovery order.
        let projects = &store.solution(s1).projects;
        assert_eq!(projects.len(), 2);
        assert_eq!(
            store.project(projects[0]).file_path,
            PathBuf::from("/repo/s1/p1/p1.csproj")
        );
        assert_eq!(
            store.project(projects[1]).file_path,
            PathBuf::from("/repo/s1/p2/p2.csproj")
        );
    }

    #[test]
    fn test_hint_paths_absolutized_against_project_dir() {
        let tree = loader_fixture();
        let mut store = ArtifactStore::new();
        let s1 = load(&tree, &mut store, "/repo/s1/s1.sln");

        let p1 = store.solution(s1).projects[0];
        let references = &store.project(p1).references;
        assert_eq!(references.len(), 1);
        assert_eq!(
            references[0].hint_path,
            PathBuf::from("/repo/other/lib/bin/lib.dll")
        );
        assert!(references[0].producer.is_none());
    }

    #[test]
    fn test_load_solution_twice_returns_cached_instance() {
        let tree = loader_fixture();
        let mut store = ArtifactStore::new();
        let first = load(&tree, &mut store, "/repo/s1/s1.sln");
        let second = load(&tree, &mut store, "/repo/s1/./s1.sln");

        assert_eq!(first, second);
        assert_eq!(store.solution_count(), 1);
        assert_eq!(store.project_count(), 2);
    }

    #[test]
    fn test_load_missing_solution_is_io_error() {
        let tree = loader_fixture();
        let mut store = ArtifactStore::new();
        let loader = SolutionLoader::new(
            &tree,
            &VsSolutionReader,
            &VsProjectReader,
            &VsProjectRecognizer,
        );
        let err = loader
            .load_solution(&mut store, Path::new("/repo/missing.sln"))
            .unwrap_err();
        assert!(err.is_load_error());
        assert_eq!(store.solution_count(), 0);
    }

    #[test]
    fn test_first_seen_parent_wins() {
        let tree = loader_fixture();
        let mut store = ArtifactStore::new();
        let s1 = load(&tree, &mut store, "/repo/s1/s1.sln");
        let other = store.add_solution(PathBuf::from("/repo/other/other.sln"));

        let loader = SolutionLoader::new(
            &tree,
            &VsSolutionReader,
            &VsProjectReader,
            &VsProjectRecognizer,
        );
        let p1 = loader
            .load_project(&mut store, Path::new("/repo/s1/p1/p1.csproj"), other)
            .unwrap();
        assert_eq!(store.project(p1).parent_solution, s1);
    }
}
