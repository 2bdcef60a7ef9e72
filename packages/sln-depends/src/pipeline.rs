//! End-to-end run: discover → load → prune → resolve → prune → order.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::loader::SolutionLoader;
use crate::locator::FileLocator;
use crate::model::{ArtifactStore, SolutionId};
use crate::order::{sort_solutions, OrderingStrategy};
use crate::resolve::DependencyResolver;

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Load solutions discovered through resolved references that are not
    /// under any search root.
    pub load_transitive: bool,
    pub strategy: OrderingStrategy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            load_transitive: true,
            strategy: OrderingStrategy::default(),
        }
    }
}

/// Everything a run produced: the loaded artifact graph, the working set in
/// discovery order, and the final dependency order.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub store: ArtifactStore,
    /// Discovery order, plus any transitively loaded solutions appended.
    pub solutions: Vec<SolutionId>,
    /// Producer-before-consumer order.
    pub ordered: Vec<SolutionId>,
    /// References dropped by the two prune passes.
    pub pruned_references: usize,
}

pub struct Pipeline<'a> {
    loader: SolutionLoader<'a>,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(loader: SolutionLoader<'a>, options: PipelineOptions) -> Self {
        Self { loader, options }
    }

    /// Runs the whole pipeline over the given search roots (expected
    /// absolute). A missing search root is an error; an empty discovery
    /// result is not, and yields an empty outcome.
    pub fn run(&self, search_roots: &[PathBuf]) -> Result<PipelineOutcome> {
        let locator = FileLocator::new(self.loader.tree(), self.loader.recognizer());

        let mut solution_files = Vec::new();
        for root in search_roots {
            let found = locator.find_solutions(root, true)?;
            info!(root = %root.display(), found = found.len(), "searched for solutions");
            solution_files.extend(found);
        }

        let mut store = ArtifactStore::new();
        let mut solutions: Vec<SolutionId> = Vec::new();
        for path in &solution_files {
            let id = self.loader.load_solution(&mut store, path)?;
            // The same solution can be discovered under two roots; keep the
            // working set free of duplicates.
            if !solutions.contains(&id) {
                solutions.push(id);
            }
        }
        info!(
            solutions = solutions.len(),
            projects = store.project_count(),
            references = store.reference_count(),
            "loaded solutions"
        );

        let resolver = DependencyResolver::new(&self.loader);
        // First prune: don't spend resolution work on references that can
        // never resolve.
        let mut pruned = resolver.remove_unresolvable_references(&mut store, &solutions);
        // One resolver invocation is a single sweep over the working set as
        // it stood on entry; transitively loaded solutions carry their own
        // unresolved references, so re-invoke until the set stops growing.
        loop {
            let before = solutions.len();
            resolver.resolve_references(
                &mut store,
                &mut solutions,
                self.options.load_transitive,
            )?;
            if solutions.len() == before {
                break;
            }
        }
        // Second prune: drop references whose owner solution could not be
        // matched or loaded.
        pruned += resolver.remove_unresolvable_references(&mut store, &solutions);

        let unresolved = store.unresolved_reference_count();
        if unresolved > 0 {
            warn!(unresolved, "references left unresolved; ordering will fail");
        }
        info!(pruned, unresolved, "resolution finished");

        let ordered = sort_solutions(&store, &solutions, self.options.strategy)?;

        Ok(PipelineOutcome {
            store,
            solutions,
            ordered,
            pruned_references: pruned,
        })
    }
}

/// Convenience constructor wiring the default Visual Studio collaborators
/// over a [`DirTree`](crate::fs::DirTree).
pub fn run_with_defaults(
    tree: &dyn crate::fs::DirTree,
    search_roots: &[PathBuf],
    options: PipelineOptions,
) -> Result<PipelineOutcome> {
    use crate::readers::{VsProjectReader, VsProjectRecognizer, VsSolutionReader};

    let solution_reader = VsSolutionReader;
    let project_reader = VsProjectReader;
    let recognizer = VsProjectRecognizer;
    let loader = SolutionLoader::new(tree, &solution_reader, &project_reader, &recognizer);
    Pipeline::new(loader, options).run(search_roots)
}

/// Absolutizes a caller-supplied search root against the current working
/// directory.
pub fn absolute_search_root(root: &Path) -> Result<PathBuf> {
    if root.is_absolute() {
        return Ok(crate::paths::normalize(root));
    }
    let cwd = std::env::current_dir().map_err(|e| crate::error::DependsError::io(root, e))?;
    Ok(crate::paths::absolutize(root, &cwd))
}
