//! Plain-text reports of violations and errors.
//!
//! A [`Report`] is a flat list of [`ReportEntry`] values built from either
//! the violations of a run or a fatal [`Error`]. It renders one line per
//! entry:
//!
//! ```text
//! error[string]: items[1].name: must be a string, got number
//! error[compile]: a: unknown rule 'nope' at 'a'
//! ```

use std::fmt;

use sieve_schema::{Violation, Violations};
use thisisplural::Plural;

use crate::error::Error;

// ============================================================================
// ReportEntry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A failed rule; the value is invalid but the run completed.
    Violation,
    /// The schema could not be read or compiled.
    Compile,
    /// A run was aborted.
    Execution,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub kind: EntryKind,
    /// Rule name for violations, a phase label otherwise.
    pub code: String,
    /// Location, in expression form when one exists.
    pub pointer: Option<String>,
    pub message: String,
}

impl ReportEntry {
    pub fn from_violation(violation: &Violation) -> Self {
        let pointer = violation
            .expression_pointer
            .clone()
            .or_else(|| (!violation.pointer.is_empty()).then(|| violation.pointer.clone()));
        Self {
            kind: EntryKind::Violation,
            code: violation.rule.clone(),
            pointer,
            message: violation.message.clone(),
        }
    }

    pub fn from_error(error: &Error) -> Self {
        let (kind, code) = match error {
            Error::InvalidSchema(_) => (EntryKind::Compile, "schema"),
            Error::Compile(_) => (EntryKind::Compile, "compile"),
            Error::Execution(_) => (EntryKind::Execution, "execution"),
        };
        Self {
            kind,
            code: code.to_string(),
            pointer: error
                .pointer()
                .filter(|pointer| !pointer.is_empty())
                .map(str::to_string),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: ", self.code)?;
        if let Some(pointer) = &self.pointer {
            write!(f, "{pointer}: ")?;
        }
        f.write_str(&self.message)
    }
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Plural)]
pub struct Report(Vec<ReportEntry>);

impl Report {
    pub fn from_violations(violations: &Violations) -> Self {
        Self(violations.0.iter().map(ReportEntry::from_violation).collect())
    }

    pub fn from_error(error: &Error) -> Self {
        Self(vec![ReportEntry::from_error(error)])
    }

    pub fn push(&mut self, entry: ReportEntry) {
        self.0.push(entry);
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.0
    }

    /// Number of entries of the given kind.
    pub fn count(&self, kind: EntryKind) -> usize {
        self.0.iter().filter(|entry| entry.kind == kind).count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.0 {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}
