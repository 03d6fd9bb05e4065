//! Error types shared by rules and the registry

use thiserror::Error;

/// A rule rejected the arguments it was configured with.
///
/// Raised from [`Rule::compile`](crate::Rule::compile), so it only ever
/// surfaces while a schema is being compiled.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{reason}")]
pub struct RuleSetupError {
    pub reason: String,
}

impl RuleSetupError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Unexpected failure inside a rule's run-time phase.
///
/// This is a bug in the rule, not a problem with the input being validated.
/// It aborts the in-flight validation call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuleError {
    #[error("rule options are missing prepared state")]
    MissingPreparedState,

    #[error("{0}")]
    Custom(String),
}

impl RuleError {
    pub fn custom(message: impl Into<String>) -> Self {
        RuleError::Custom(message.into())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("rule '{name}' is already registered")]
    DuplicateRule { name: String },
}
