//! Case-file test suite for sieve.
//!
//! Each `*.json` file under `cases/` holds one or more named cases. A case
//! pairs a schema with an input value and the expected output and
//! violations; see [`case::CaseData`].

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod case;
pub mod scenarios;

pub use case::{Case, CaseData, CaseFile, CaseResult, NamedScenarioResult, ScenarioResult};
pub use scenarios::{Scenario, ScenarioError};

/// Options shared by every case in a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunConfig {
    /// Include the rendered procedure in failure details.
    pub trace: bool,
}

#[derive(Debug, Error)]
pub enum CollectCasesError {
    #[error("failed to read {}: {error}", path.display())]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("failed to parse {}: {error}", path.display())]
    ParseError {
        path: PathBuf,
        error: serde_json::Error,
    },
}

impl CollectCasesError {
    pub fn path(&self) -> &Path {
        match self {
            CollectCasesError::IoError { path, .. } | CollectCasesError::ParseError { path, .. } => {
                path
            }
        }
    }
}

pub fn cases_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("cases")
}

/// Read every case file under [`cases_dir`], sorted by path.
pub fn collect_cases() -> Result<Vec<Result<CaseFile, CollectCasesError>>, std::io::Error> {
    let mut paths = Vec::new();
    walk(&cases_dir(), &mut paths)?;
    paths.sort();

    Ok(paths
        .into_iter()
        .map(|path| {
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(error) => return Err(CollectCasesError::IoError { path, error }),
            };
            match CaseFile::parse(&content) {
                Ok(file) => Ok(file.with_path(path)),
                Err(error) => Err(CollectCasesError::ParseError { path, error }),
            }
        })
        .collect())
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), std::io::Error> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, files)?;
        } else if path.extension().and_then(|s| s.to_str()) == Some("json") {
            files.push(path);
        }
    }
    Ok(())
}
