//! Command-line front end: scan directories for solution files and print
//! them in producer-before-consumer order.

mod format;

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use sln_depends::{
    absolute_search_root, run_with_defaults, OrderingStrategy, OsDirTree, PipelineOptions,
    PipelineOutcome,
};

#[derive(Parser)]
#[command(
    name = "sln-depends",
    version,
    about = "Orders IDE solution files so producers build before consumers"
)]
struct Cli {
    /// Directory to search for solution files; may be given more than once.
    #[arg(short = 'd', long = "search-dir", value_name = "DIR", required = true)]
    search_dirs: Vec<PathBuf>,

    /// Do not load dependency solutions found outside the search directories.
    #[arg(long)]
    without_dependencies: bool,

    /// Output format.
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Flat)]
    output_format: OutputFormat,

    /// Write the result to this file instead of stdout.
    #[arg(short = 'o', long, value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// Print solution paths relative to this directory (flat format only).
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Keep re-sweeping until the order is stable instead of the single-pass
    /// heuristic; fails on dependency cycles.
    #[arg(long)]
    strict_order: bool,

    /// Dump the gathered solution, project and reference information and
    /// raise the log level.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Also write log output to this file.
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Flat,
    Json,
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let default_directives = if cli.verbose {
        "sln_depends=debug,info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let file_layer = match &cli.log {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
        }
        None => None,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

/// Mirrors the `-v` dump: every solution with its projects, and every
/// reference with the project that produces it, if any.
fn dump_gathered_information(outcome: &PipelineOutcome) {
    eprintln!("Information gathered:");
    for &solution_id in &outcome.solutions {
        let solution = outcome.store.solution(solution_id);
        eprintln!("  Solution: {}", solution.file_path.display());
        for &project_id in &solution.projects {
            let project = outcome.store.project(project_id);
            eprintln!("    Project: {}", project.file_path.display());
            for reference in &project.references {
                match reference.producer {
                    Some(producer) => eprintln!(
                        "      Reference: {} <- {}",
                        reference.hint_path.display(),
                        outcome.store.project(producer).file_path.display()
                    ),
                    None => eprintln!(
                        "      Reference: {} (unresolved)",
                        reference.hint_path.display()
                    ),
                }
            }
        }
    }
}

fn render(cli: &Cli, outcome: &PipelineOutcome) -> anyhow::Result<Vec<u8>> {
    let mut rendered = Vec::new();
    match cli.output_format {
        OutputFormat::Flat => {
            // Stored paths are canonical; bring the base dir to the same
            // spelling so prefix stripping works through symlinks.
            let base_dir = cli
                .base_dir
                .as_ref()
                .map(|dir| dir.canonicalize().unwrap_or_else(|_| dir.clone()));
            format::write_flat_list(&mut rendered, outcome, base_dir.as_deref())?
        }
        OutputFormat::Json => format::write_json(&mut rendered, outcome)?,
    }
    Ok(rendered)
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let mut roots = Vec::with_capacity(cli.search_dirs.len());
    for dir in &cli.search_dirs {
        roots.push(absolute_search_root(dir)?);
    }

    let options = PipelineOptions {
        load_transitive: !cli.without_dependencies,
        strategy: if cli.strict_order {
            OrderingStrategy::Fixpoint
        } else {
            OrderingStrategy::SinglePass
        },
    };

    info!(
        roots = roots.len(),
        transitive = options.load_transitive,
        "scanning for solutions"
    );
    let outcome = run_with_defaults(&OsDirTree, &roots, options)
        .context("failed to resolve and order solutions")?;
    info!(
        solutions = outcome.solutions.len(),
        pruned = outcome.pruned_references,
        "run finished"
    );

    if cli.verbose {
        dump_gathered_information(&outcome);
    }
    if outcome.solutions.is_empty() {
        eprintln!("No solution files found.");
        return Ok(ExitCode::FAILURE);
    }

    // Render fully before touching the output file so a failed run never
    // leaves a partial result behind.
    let rendered = render(cli, &outcome)?;
    match &cli.output_file {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("cannot open output file {}", path.display()))?;
            file.write_all(&rendered)?;
        }
        None => std::io::stdout().write_all(&rendered)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(&cli) {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
