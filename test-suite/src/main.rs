//! Runs every case file under `cases/` and prints one line per case.

use std::path::Path;

use clap::Parser;
use rayon::prelude::*;
use test_suite::{CaseFile, CaseResult, RunConfig, ScenarioResult, cases_dir, collect_cases};

#[derive(Parser)]
#[command(name = "test-suite", about = "sieve test suite runner")]
struct Args {
    /// Log compiler activity and print compiled procedures on failure
    #[arg(short, long)]
    trace: bool,

    /// Only run files whose name contains this text
    #[arg(short, long)]
    filter: Option<String>,

    /// Print the first line of each failure only
    #[arg(short, long)]
    short: bool,

    /// Count unimplemented cases as failures
    #[arg(short, long)]
    all: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Pass,
    Fail,
    Todo,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Pass => "\x1b[1;32mPASS\x1b[0m",
            Status::Fail => "\x1b[1;31mFAIL\x1b[0m",
            Status::Todo => "\x1b[1;33mTODO\x1b[0m",
        }
    }
}

struct CaseLine {
    name: String,
    status: Status,
    result: CaseResult,
}

/// Outcome of one file: its cases, or why it could not be read.
struct FileRun {
    name: String,
    cases: Result<Vec<CaseLine>, String>,
}

fn display_name(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .with_extension("")
        .display()
        .to_string()
}

fn run_file(file: &CaseFile, config: &RunConfig, strict: bool) -> Vec<CaseLine> {
    file.all_cases()
        .map(|case| {
            let result = case.run_all(config);
            let status = match &case.data.unimplemented {
                Some(_) if !strict => Status::Todo,
                _ if result.all_passed() => Status::Pass,
                _ => Status::Fail,
            };
            CaseLine {
                name: case.name,
                status,
                result,
            }
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_target(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    let config = RunConfig { trace: args.trace };
    let base = cases_dir();

    let mut runs: Vec<FileRun> = collect_cases()?
        .par_iter()
        .map(|file| match file {
            Ok(file) => FileRun {
                name: display_name(&file.path, &base),
                cases: Ok(run_file(file, &config, args.all)),
            },
            Err(error) => FileRun {
                name: display_name(error.path(), &base),
                cases: Err(error.to_string()),
            },
        })
        .filter(|run| {
            args.filter
                .as_deref()
                .is_none_or(|filter| run.name.contains(filter))
        })
        .collect();
    runs.sort_by(|a, b| a.name.cmp(&b.name));

    if runs.is_empty() {
        println!("no case files found");
        return Ok(());
    }

    let mut counts = [0usize; 3];
    let mut failures = Vec::new();
    for run in &runs {
        let cases = match &run.cases {
            Ok(cases) => cases,
            Err(error) => {
                println!("{} {} (unreadable)", Status::Fail.label(), run.name);
                counts[1] += 1;
                failures.push((run.name.clone(), error.clone()));
                continue;
            }
        };
        println!("{}", run.name);
        for case in cases {
            println!(
                "  {} {} ({}/{})",
                case.status.label(),
                case.name,
                case.result.passed_count(),
                case.result.total_count()
            );
            match case.status {
                Status::Pass => counts[0] += 1,
                Status::Todo => counts[2] += 1,
                Status::Fail => {
                    counts[1] += 1;
                    for scenario in case.result.failed_scenarios() {
                        if let ScenarioResult::Failed { error } = &scenario.result {
                            let error = if args.short {
                                error.lines().next().unwrap_or_default()
                            } else {
                                error.as_str()
                            };
                            failures.push((
                                format!("{}[{}] {}", run.name, case.name, scenario.name),
                                error.to_string(),
                            ));
                        }
                    }
                }
            }
        }
    }

    for (id, error) in &failures {
        println!("\n{id}");
        for line in error.lines() {
            println!("    {line}");
        }
    }
    println!(
        "\n{} passed, {} failed, {} unimplemented",
        counts[0], counts[1], counts[2]
    );
    std::process::exit(if counts[1] == 0 { 0 } else { 1 });
}
