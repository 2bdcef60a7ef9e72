//! Solution ordering: producers before consumers.
//!
//! The compatible algorithm is not an idealized topological sort. It makes
//! one sweep over the solutions in their fixed input order and, for every
//! resolved reference, moves the producing solution immediately before the
//! consuming one when it currently sits later. Ties (no constraint between
//! two solutions) keep their working-list order. One sweep cannot fix every
//! graph shape: a solution moved after its own turn has passed never gets
//! its dependencies re-checked. [`OrderingStrategy::Fixpoint`] repeats the
//! sweep until nothing moves, and reports a cycle when it cannot converge.

use tracing::{error, info};

use crate::error::{DependsError, Result};
use crate::model::{ArtifactStore, SolutionId};

/// Which ordering algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingStrategy {
    /// The compatible single-sweep correction pass. May leave deep or
    /// interleaved graphs misordered.
    #[default]
    SinglePass,
    /// Repeat sweeps until no solution moves; fails with
    /// [`DependsError::CycleDetected`] when the moves never settle.
    Fixpoint,
}

/// Orders `solutions` so that producers come no later than their
/// consumers, subject to the selected strategy.
///
/// Every reference encountered must already have a resolved producer;
/// an unresolved one is a precondition violation reported as
/// [`DependsError::UnresolvedReference`], not a partial order. An empty
/// input yields an empty order.
pub fn sort_solutions(
    store: &ArtifactStore,
    solutions: &[SolutionId],
    strategy: OrderingStrategy,
) -> Result<Vec<SolutionId>> {
    let mut order: Vec<SolutionId> = solutions.to_vec();
    let mut sweeps = 0usize;
    loop {
        let moved = sweep(store, solutions, &mut order)?;
        sweeps += 1;
        match strategy {
            OrderingStrategy::SinglePass => break,
            OrderingStrategy::Fixpoint => {
                if !moved {
                    break;
                }
                // A converging set settles within one sweep per solution;
                // anything still moving past that bound is cyclic.
                if sweeps > solutions.len() {
                    error!("ordering did not converge; dependency cycle");
                    return Err(DependsError::CycleDetected);
                }
            }
        }
    }
    info!(solutions = order.len(), sweeps, "ordered solutions");
    Ok(order)
}

/// One correction sweep in the fixed `input` order over the mutable
/// working list. Returns whether anything moved.
fn sweep(
    store: &ArtifactStore,
    input: &[SolutionId],
    order: &mut Vec<SolutionId>,
) -> Result<bool> {
    let mut moved = false;
    for &solution_id in input {
        for &project_id in &store.solution(solution_id).projects {
            let project = store.project(project_id);
            for reference in &project.references {
                let Some(producer_id) = reference.producer else {
                    error!(
                        solution = %store.solution(solution_id).file_path.display(),
                        project = %project.file_path.display(),
                        hint = %reference.hint_path.display(),
                        "cannot order: reference has no resolved producer"
                    );
                    return Err(DependsError::UnresolvedReference {
                        project: project.file_path.clone(),
                        hint: reference.hint_path.clone(),
                    });
                };
                let producer_solution = store.project(producer_id).parent_solution;

                let producer_pos = position(store, order, producer_solution)?;
                let consumer_pos = position(store, order, solution_id)?;
                if producer_pos > consumer_pos {
                    let dependency = order.remove(producer_pos);
                    order.insert(consumer_pos, dependency);
                    moved = true;
                }
            }
        }
    }
    Ok(moved)
}

fn position(store: &ArtifactStore, order: &[SolutionId], id: SolutionId) -> Result<usize> {
    order
        .iter()
        .position(|&candidate| candidate == id)
        .ok_or_else(|| DependsError::UnknownSolution(store.solution(id).file_path.clone()))
}
