//! Reference resolution and pruning.
//!
//! Resolution walks every (solution, project, reference) triple and tries
//! to tie the reference to the project that produces the referenced binary
//! and to that project's owning solution. "Could not resolve" is a normal
//! outcome, never an error; only I/O and parse failures from transitive
//! solution loads propagate.

use tracing::{debug, info};

use crate::error::Result;
use crate::loader::SolutionLoader;
use crate::locator::FileLocator;
use crate::model::{ArtifactStore, SolutionId};
use crate::paths::paths_equivalent;

pub struct DependencyResolver<'a> {
    loader: &'a SolutionLoader<'a>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(loader: &'a SolutionLoader<'a>) -> Self {
        Self { loader }
    }

    fn locator(&self) -> FileLocator<'a> {
        FileLocator::new(self.loader.tree(), self.loader.recognizer())
    }

    /// Resolves the producer of every still-unresolved reference in
    /// `solutions`. Already-resolved references are left untouched, so
    /// re-running the pass is a no-op.
    ///
    /// This is a single sweep over the working set as it stood on entry.
    /// With `load_transitive` set, owner solutions that are not in the
    /// working set are loaded and appended to it, but their own references
    /// are not resolved by this sweep; callers that want those covered
    /// re-invoke the resolver.
    pub fn resolve_references(
        &self,
        store: &mut ArtifactStore,
        solutions: &mut Vec<SolutionId>,
        load_transitive: bool,
    ) -> Result<()> {
        let locator = self.locator();
        let sweep: Vec<SolutionId> = solutions.clone();

        for &solution_id in &sweep {
            let project_ids = store.solution(solution_id).projects.clone();
            for project_id in project_ids {
                for reference_index in 0..store.project(project_id).references.len() {
                    if store.project(project_id).references[reference_index]
                        .producer
                        .is_some()
                    {
                        continue;
                    }
                    let hint_path =
                        store.project(project_id).references[reference_index].hint_path.clone();

                    let Some(producer_path) = locator.find_producing_project(&hint_path) else {
                        continue;
                    };
                    let Some(owner_path) = locator.find_owning_solution(&producer_path) else {
                        continue;
                    };
                    // Located paths may spell the file through a symlinked
                    // ancestor; stored paths are canonical.
                    let producer_path = self.loader.tree().canonicalize(&producer_path);
                    let owner_path = self.loader.tree().canonicalize(&owner_path);

                    let owner_id = match solutions
                        .iter()
                        .copied()
                        .find(|&id| paths_equivalent(&store.solution(id).file_path, &owner_path))
                    {
                        Some(id) => id,
                        None if load_transitive => {
                            // A dependency outside the search roots: load it
                            // now and append it to the working set.
                            let id = self.loader.load_solution(store, &owner_path)?;
                            info!(
                                solution = %store.solution(id).file_path.display(),
                                "loaded dependency solution"
                            );
                            solutions.push(id);
                            id
                        }
                        None => continue,
                    };

                    // The producer must be among the owner's loaded projects;
                    // members filtered out at load time stay unresolvable.
                    let Some(producer_id) = store
                        .solution(owner_id)
                        .projects
                        .iter()
                        .copied()
                        .find(|&id| paths_equivalent(&store.project(id).file_path, &producer_path))
                    else {
                        continue;
                    };

                    store.project_mut(project_id).references[reference_index].producer =
                        Some(producer_id);
                }
            }
        }
        Ok(())
    }

    /// Drops references that resolution can never satisfy: ones whose
    /// upward searches cannot find both a producing project and an owning
    /// solution. Already-resolved references always survive, and the
    /// relative order of survivors is preserved. Returns how many
    /// references were removed.
    ///
    /// Run before resolution to cut wasted work and again after it to
    /// discard references whose owner solution could never be matched.
    pub fn remove_unresolvable_references(
        &self,
        store: &mut ArtifactStore,
        solutions: &[SolutionId],
    ) -> usize {
        let locator = self.locator();
        let mut removed = 0;

        for &solution_id in solutions {
            let project_ids = store.solution(solution_id).projects.clone();
            for project_id in project_ids {
                let before = store.project(project_id).references.len();
                store.project_mut(project_id).references.retain(|reference| {
                    if reference.producer.is_some() {
                        return true;
                    }
                    locator
                        .find_producing_project(&reference.hint_path)
                        .map(|producer| locator.find_owning_solution(&producer).is_some())
                        .unwrap_or(false)
                });
                let after = store.project(project_id).references.len();
                if after < before {
                    debug!(
                        project = %store.project(project_id).file_path.display(),
                        removed = before - after,
                        "pruned unresolvable references"
                    );
                }
                removed += before - after;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryDirTree;
    use crate::model::AssemblyReference;
    use crate::readers::{VsProjectReader, VsProjectRecognizer, VsSolutionReader};
    use std::path::{Path, PathBuf};

    const PROJECT_XML: &str = "<Project></Project>";

    /// The canonical four-solution layout: S1's P1 consumes binaries
    /// produced in S2 and S3, S2's P3 consumes from S3, S3's P6 consumes
    /// from S4.
    fn fixture() -> (MemoryDirTree, ArtifactStore, Vec<SolutionId>) {
        let mut tree = MemoryDirTree::new();
        for (solution, projects) in [
            ("s1", &["p1", "p2"][..]),
            ("s2", &["p3", "p4"][..]),
            ("s3", &["p5", "p6"][..]),
            ("s4", &["p7", "p8"][..]),
        ] {
            tree.add_file(format!("/repo/{solution}/{solution}.sln"), "");
            for project in projects {
                tree.add_file(
                    format!("/repo/{solution}/{project}/{project}.csproj"),
                    PROJECT_XML,
                );
                tree.add_dir(format!("/repo/{solution}/{project}/bin"));
            }
        }

        let mut store = ArtifactStore::new();
        let mut solutions = Vec::new();
        for (solution, projects, refs) in [
            ("s1", &["p1", "p2"][..], &[("p1", "s2/p3"), ("p1", "s3/p5")][..]),
            ("s2", &["p3", "p4"][..], &[("p3", "s3/p5")][..]),
            ("s3", &["p5", "p6"][..], &[("p6", "s4/p7")][..]),
            ("s4", &["p7", "p8"][..], &[][..]),
        ] {
            let sid = store.add_solution(PathBuf::from(format!("/repo/{solution}/{solution}.sln")));
            solutions.push(sid);
            for project in projects {
                let hints: Vec<AssemblyReference> = refs
                    .iter()
                    .filter(|(consumer, _)| consumer == project)
                    .map(|(_, producer)| {
                        let name = producer.rsplit('/').next().unwrap();
                        AssemblyReference::new(PathBuf::from(format!(
                            "/repo/{producer}/bin/{name}.dll"
                        )))
                    })
                    .collect();
                store.add_project(
                    PathBuf::from(format!("/repo/{solution}/{project}/{project}.csproj")),
                    sid,
                    hints,
                );
            }
        }
        (tree, store, solutions)
    }

    fn resolver_parts(tree: &MemoryDirTree) -> SolutionLoader<'_> {
        SolutionLoader::new(
            tree,
            &VsSolutionReader,
            &VsProjectReader,
            &VsProjectRecognizer,
        )
    }

    #[test]
    fn test_resolve_ties_references_to_producers() {
        let (tree, mut store, mut solutions) = fixture();
        let loader = resolver_parts(&tree);
        let resolver = DependencyResolver::new(&loader);

        resolver
            .resolve_references(&mut store, &mut solutions, false)
            .unwrap();

        let p1 = store.solution(solutions[0]).projects[0];
        let p3 = store.solution(solutions[1]).projects[0];
        let p5 = store.solution(solutions[2]).projects[0];
        let p7 = store.solution(solutions[3]).projects[0];
        let p6 = store.solution(solutions[2]).projects[1];

        assert_eq!(store.project(p1).references[0].producer, Some(p3));
        assert_eq!(store.project(p1).references[1].producer, Some(p5));
        let p3_refs = &store.project(p3).references;
        assert_eq!(p3_refs[0].producer, Some(p5));
        assert_eq!(store.project(p6).references[0].producer, Some(p7));
        assert_eq!(store.unresolved_reference_count(), 0);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let (tree, mut store, mut solutions) = fixture();
        let loader = resolver_parts(&tree);
        let resolver = DependencyResolver::new(&loader);

        resolver
            .resolve_references(&mut store, &mut solutions, false)
            .unwrap();
        let first: Vec<_> = collect_producers(&store, &solutions);

        resolver
            .resolve_references(&mut store, &mut solutions, false)
            .unwrap();
        let second: Vec<_> = collect_producers(&store, &solutions);

        assert_eq!(first, second);
    }

    fn collect_producers(
        store: &ArtifactStore,
        solutions: &[SolutionId],
    ) -> Vec<Option<crate::model::ProjectId>> {
        solutions
            .iter()
            .flat_map(|&sid| store.solution(sid).projects.clone())
            .flat_map(|pid| {
                store
                    .project(pid)
                    .references
                    .iter()
                    .map(|r| r.producer)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    #[test]
    fn test_unlocatable_reference_stays_unresolved() {
        let (tree, mut store, mut solutions) = fixture();
        let p1 = store.solution(solutions[0]).projects[0];
        store
            .project_mut(p1)
            .references
            .push(AssemblyReference::new(PathBuf::from(
                "/repo/nowhere/bin/ghost.dll",
            )));

        let loader = resolver_parts(&tree);
        let resolver = DependencyResolver::new(&loader);
        resolver
            .resolve_references(&mut store, &mut solutions, false)
            .unwrap();

        assert_eq!(store.unresolved_reference_count(), 1);
    }

    #[test]
    fn test_transitive_loading_appends_discovered_solution() {
        const EXTERNAL_SLN: &str = "Project(\"{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}\") = \"ext\", \"ext\\ext.csproj\", \"{11111111-2222-3333-4444-555555555555}\"\n";

        let (mut tree, mut store, mut solutions) = fixture();
        tree.add_file("/repo/external/external.sln", EXTERNAL_SLN)
            .add_file("/repo/external/ext/ext.csproj", PROJECT_XML)
            .add_dir("/repo/external/ext/bin");

        let p2 = store.solution(solutions[0]).projects[1];
        store
            .project_mut(p2)
            .references
            .push(AssemblyReference::new(PathBuf::from(
                "/repo/external/ext/bin/ext.dll",
            )));

        let loader = resolver_parts(&tree);
        let resolver = DependencyResolver::new(&loader);
        resolver
            .resolve_references(&mut store, &mut solutions, true)
            .unwrap();

        assert_eq!(solutions.len(), 5);
        let external = *solutions.last().unwrap();
        assert_eq!(
            store.solution(external).file_path,
            PathBuf::from("/repo/external/external.sln")
        );
        let ext_project = store.solution(external).projects[0];
        assert_eq!(store.project(p2).references[0].producer, Some(ext_project));
    }

    #[test]
    fn test_transitive_loading_disabled_skips_unknown_owner() {
        const EXTERNAL_SLN: &str = "";

        let (mut tree, mut store, mut solutions) = fixture();
        tree.add_file("/repo/external/external.sln", EXTERNAL_SLN)
            .add_file("/repo/external/ext/ext.csproj", PROJECT_XML)
            .add_dir("/repo/external/ext/bin");

        let p2 = store.solution(solutions[0]).projects[1];
        store
            .project_mut(p2)
            .references
            .push(AssemblyReference::new(PathBuf::from(
                "/repo/external/ext/bin/ext.dll",
            )));

        let loader = resolver_parts(&tree);
        let resolver = DependencyResolver::new(&loader);
        resolver
            .resolve_references(&mut store, &mut solutions, false)
            .unwrap();

        assert_eq!(solutions.len(), 4);
        assert!(store.project(p2).references[0].producer.is_none());
    }

    #[test]
    fn test_prune_drops_unlocatable_and_preserves_order() {
        let (tree, mut store, solutions) = fixture();
        let p1 = store.solution(solutions[0]).projects[0];
        store.project_mut(p1).references.insert(
            1,
            AssemblyReference::new(PathBuf::from("/repo/nowhere/bin/ghost.dll")),
        );

        let loader = resolver_parts(&tree);
        let resolver = DependencyResolver::new(&loader);
        let removed = resolver.remove_unresolvable_references(&mut store, &solutions);

        assert_eq!(removed, 1);
        let hints: Vec<_> = store
            .project(p1)
            .references
            .iter()
            .map(|r| r.hint_path.clone())
            .collect();
        assert_eq!(
            hints,
            vec![
                PathBuf::from("/repo/s2/p3/bin/p3.dll"),
                PathBuf::from("/repo/s3/p5/bin/p5.dll"),
            ]
        );
    }

    #[test]
    fn test_prune_resolve_prune_reaches_fixpoint() {
        let (tree, mut store, mut solutions) = fixture();
        let p1 = store.solution(solutions[0]).projects[0];
        store
            .project_mut(p1)
            .references
            .push(AssemblyReference::new(PathBuf::from(
                "/repo/nowhere/bin/ghost.dll",
            )));

        let loader = resolver_parts(&tree);
        let resolver = DependencyResolver::new(&loader);

        resolver.remove_unresolvable_references(&mut store, &solutions);
        resolver
            .resolve_references(&mut store, &mut solutions, true)
            .unwrap();
        resolver.remove_unresolvable_references(&mut store, &solutions);

        assert_eq!(store.unresolved_reference_count(), 0);
    }
}
