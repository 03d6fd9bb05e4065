//! Compiler and procedure error types
//!
//! Two categories, neither of which is a violation:
//! - `CompileError`: the schema cannot be compiled (raised once, at compile time)
//! - `ExecutionError`: a validation call was aborted by a rule bug or misuse

use sieve_schema::{RuleError, RuleSetupError};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompileError {
    #[error("unknown rule '{name}' at '{pointer}'")]
    UnknownRule { name: String, pointer: String },

    #[error("rule '{name}' at '{pointer}' rejected its arguments: {source}")]
    InvalidRuleArgs {
        name: String,
        pointer: String,
        #[source]
        source: RuleSetupError,
    },

    /// Emitter bug: a block was closed that was never opened.
    #[error("block closed below nesting depth zero")]
    UnbalancedBlock,

    /// Emitter bug: the procedure ended with blocks still open.
    #[error("{depth} block(s) left open at end of compile")]
    UnclosedBlock { depth: usize },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutionError {
    #[error("procedure contains asynchronous rules, use validate_async")]
    RequiresAsync,

    #[error("rule '{rule}' failed unexpectedly at '{pointer}': {source}")]
    Rule {
        rule: String,
        pointer: String,
        #[source]
        source: RuleError,
    },
}
