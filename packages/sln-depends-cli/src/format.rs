//! Rendering of the final dependency order.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sln_depends::PipelineOutcome;

/// Writes the ordered solutions as one path per line, optionally
/// relativized against `base_dir`.
pub fn write_flat_list(
    out: &mut dyn Write,
    outcome: &PipelineOutcome,
    base_dir: Option<&Path>,
) -> std::io::Result<()> {
    for &id in &outcome.ordered {
        let path = &outcome.store.solution(id).file_path;
        let shown = match base_dir {
            Some(base) => path.strip_prefix(base).unwrap_or(path),
            None => path,
        };
        writeln!(out, "{}", shown.display())?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonReport {
    solutions: Vec<JsonSolution>,
}

#[derive(Serialize)]
struct JsonSolution {
    path: PathBuf,
    projects: Vec<JsonProject>,
}

#[derive(Serialize)]
struct JsonProject {
    path: PathBuf,
    references: Vec<JsonReference>,
}

#[derive(Serialize)]
struct JsonReference {
    hint_path: PathBuf,
    producer: Option<PathBuf>,
}

/// Writes the ordered solutions with their projects and reference
/// resolution state as a JSON document.
pub fn write_json(out: &mut dyn Write, outcome: &PipelineOutcome) -> anyhow::Result<()> {
    let report = JsonReport {
        solutions: outcome
            .ordered
            .iter()
            .map(|&id| {
                let solution = outcome.store.solution(id);
                JsonSolution {
                    path: solution.file_path.clone(),
                    projects: solution
                        .projects
                        .iter()
                        .map(|&pid| {
                            let project = outcome.store.project(pid);
                            JsonProject {
                                path: project.file_path.clone(),
                                references: project
                                    .references
                                    .iter()
                                    .map(|reference| JsonReference {
                                        hint_path: reference.hint_path.clone(),
                                        producer: reference.producer.map(|producer| {
                                            outcome.store.project(producer).file_path.clone()
                                        }),
                                    })
                                    .collect(),
                            }
                        })
                        .collect(),
                }
            })
            .collect(),
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}
