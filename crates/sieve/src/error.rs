//! One error type for callers that parse, compile and run in a single step.

use sieve_compiler::{CompileError, ExecutionError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid schema: {0}")]
    InvalidSchema(#[source] serde_json::Error),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl Error {
    /// Pointer of the schema or value location the error refers to, if any.
    pub fn pointer(&self) -> Option<&str> {
        match self {
            Error::InvalidSchema(_) => None,
            Error::Compile(
                CompileError::UnknownRule { pointer, .. }
                | CompileError::InvalidRuleArgs { pointer, .. },
            ) => Some(pointer),
            Error::Compile(_) => None,
            Error::Execution(ExecutionError::Rule { pointer, .. }) => Some(pointer),
            Error::Execution(ExecutionError::RequiresAsync) => None,
        }
    }
}
