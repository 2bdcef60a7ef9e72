//! Raw-content extraction from solution and project files.
//!
//! The graph core only needs two mappings out of the raw text: solution →
//! ordered member-project paths, and project → ordered reference hint
//! paths. The traits here are that boundary; the `Vs*` implementations
//! cover the Visual Studio formats.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DependsError, Result};
use crate::fs::DirTree;

/// Recognized project-file extensions (managed-language project kinds).
pub const PROJECT_EXTENSIONS: [&str; 2] = ["csproj", "vbproj"];

/// Solution-file extension.
pub const SOLUTION_EXTENSION: &str = "sln";

/// Document root marker expected in a recognizable project file.
const PROJECT_ROOT_MARKER: &str = "<Project";

/// Extension test for solution files.
pub fn is_solution_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOLUTION_EXTENSION))
}

/// Decides whether a candidate file is a loadable project file.
pub trait ProjectRecognizer {
    /// Extension is one of the recognized project-file extensions.
    fn matches_extension(&self, path: &Path) -> bool;

    /// Content carries the project-root marker. Unreadable content is
    /// simply not recognized.
    fn matches_content(&self, tree: &dyn DirTree, path: &Path) -> bool;

    fn is_project_file(&self, tree: &dyn DirTree, path: &Path) -> bool {
        self.matches_extension(path) && self.matches_content(tree, path)
    }
}

/// Recognizer for MSBuild-style project files.
#[derive(Debug, Default, Clone, Copy)]
pub struct VsProjectRecognizer;

impl ProjectRecognizer for VsProjectRecognizer {
    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                PROJECT_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
    }

    fn matches_content(&self, tree: &dyn DirTree, path: &Path) -> bool {
        tree.read_to_string(path)
            .map(|contents| contents.contains(PROJECT_ROOT_MARKER))
            .unwrap_or(false)
    }
}

/// Extracts the ordered member-project list from a solution file.
/// Paths come back as written (relative to the solution directory);
/// duplicates are preserved.
pub trait SolutionReader {
    fn member_project_paths(&self, tree: &dyn DirTree, solution_path: &Path)
        -> Result<Vec<PathBuf>>;
}

/// Extracts the ordered raw hint-path list from a project file.
/// Duplicates are preserved.
pub trait ProjectReader {
    fn reference_hint_paths(&self, tree: &dyn DirTree, project_path: &Path)
        -> Result<Vec<PathBuf>>;
}

static SOLUTION_PROJECT_LINE: Lazy<Regex> = Lazy::new(|| {
    // Project("{GUID}") = "Name", "relative\path\to\project.csproj", "{GUID}"
    let guid = r#"\{[A-F0-9]{8}-[A-F0-9]{4}-[A-F0-9]{4}-[A-F0-9]{4}-[A-F0-9]{12}\}"#;
    Regex::new(&format!(
        r#"(?im)^Project\("{guid}"\)\s*=\s*"[^"]+",\s*"([^"]+)",\s*"{guid}"\s*$"#
    ))
    .expect("solution project-line pattern")
});

static HINT_PATH_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<HintPath>\s*(.*?)\s*</HintPath>").expect("hint-path pattern")
});

/// Solution files always spell member paths with backslashes; make them
/// usable on every platform.
fn native_path(raw: &str) -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(raw)
    } else {
        PathBuf::from(raw.replace('\\', "/"))
    }
}

/// Reader for Visual Studio `.sln` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct VsSolutionReader;

impl SolutionReader for VsSolutionReader {
    fn member_project_paths(
        &self,
        tree: &dyn DirTree,
        solution_path: &Path,
    ) -> Result<Vec<PathBuf>> {
        let contents = tree.read_to_string(solution_path)?;
        Ok(SOLUTION_PROJECT_LINE
            .captures_iter(&contents)
            .map(|captures| native_path(&captures[1]))
            .collect())
    }
}

/// Reader for MSBuild project files.
///
/// Framework/GAC references carry no `<HintPath>` element, so they never
/// yield an entry here.
#[derive(Debug, Default, Clone, Copy)]
pub struct VsProjectReader;

impl ProjectReader for VsProjectReader {
    fn reference_hint_paths(
        &self,
        tree: &dyn DirTree,
        project_path: &Path,
    ) -> Result<Vec<PathBuf>> {
        let contents = tree.read_to_string(project_path)?;
        if !contents.contains(PROJECT_ROOT_MARKER) {
            return Err(DependsError::parse(
                project_path,
                "missing project document root",
            ));
        }
        Ok(HINT_PATH_ELEMENT
            .captures_iter(&contents)
            .map(|captures| native_path(&captures[1]))
            .collect())
    }
}
