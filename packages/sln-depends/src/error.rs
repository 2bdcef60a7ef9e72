use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DependsError>;

#[derive(Error, Debug)]
pub enum DependsError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unresolved assembly reference {hint} in project {project}")]
    UnresolvedReference { project: PathBuf, hint: PathBuf },

    #[error("Solution {0} is not part of the ordering working set")]
    UnknownSolution(PathBuf),

    #[error("Dependency cycle detected between solutions")]
    CycleDetected,
}

impl DependsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for the failure classes that abort loading a single entity
    /// (unreadable or malformed files), as opposed to ordering failures.
    pub fn is_load_error(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Parse { .. })
    }
}
