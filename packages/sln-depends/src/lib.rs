//! Dependency-ordered build sequencing for IDE solution files.
//!
//! A solution depends on another solution when one of its projects
//! references a binary that a project in the other solution produces.
//! Nothing in the files records that link, so it is recovered
//! heuristically from filesystem layout: climb from a reference's hint
//! path to the nearest project file, then from that project to the nearest
//! solution file. The resolved graph is then linearized so producers build
//! before their consumers.
//!
//! Pipeline: discover solution files under search roots → load solutions
//! and projects → prune references with no locatable producer → resolve
//! the rest (optionally loading dependency solutions outside the search
//! roots) → prune again → order.

pub mod error;
pub mod fs;
pub mod loader;
pub mod locator;
pub mod model;
pub mod order;
pub mod paths;
pub mod pipeline;
pub mod readers;
pub mod resolve;

pub use error::{DependsError, Result};
pub use fs::{DirTree, MemoryDirTree, OsDirTree};
pub use loader::SolutionLoader;
pub use locator::FileLocator;
pub use model::{
    ArtifactStore, Assembly, AssemblyReference, Project, ProjectId, Solution, SolutionId,
};
pub use order::{sort_solutions, OrderingStrategy};
pub use paths::{absolutize, normalize, paths_equivalent, PathKey};
pub use pipeline::{
    absolute_search_root, run_with_defaults, Pipeline, PipelineOptions, PipelineOutcome,
};
pub use readers::{
    is_solution_file, ProjectReader, ProjectRecognizer, SolutionReader, VsProjectReader,
    VsProjectRecognizer, VsSolutionReader,
};
pub use resolve::DependencyResolver;
