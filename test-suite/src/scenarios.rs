use sieve::{CompileError, ExecutionError, Node, Procedure, ValidationOutput, Value, Violation};
use thiserror::Error;

use crate::case::ExpectedViolation;

/// Error type for scenario failures.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("output mismatch.\nExpected:\n{expected}\nActual:\n{actual}")]
    OutputMismatch { expected: String, actual: String },

    #[error("violations mismatch.\nExpected:\n{}\nActual:\n{}", expected.join("\n"), actual.join("\n"))]
    ViolationsMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("expected compile error containing {expected:?}, but the schema compiled")]
    ExpectedCompileError { expected: String },

    #[error("compile error mismatch.\nExpected substring: {expected}\nActual: {actual}")]
    CompileErrorMismatch { expected: String, actual: String },

    #[error("compiling twice gave different {what}")]
    NonDeterministic { what: &'static str },

    #[error("sync and async runs differ.\nSync: {sync:?}\nAsync: {async_:?}")]
    AsyncMismatch {
        sync: Box<ValidationOutput>,
        async_: Box<ValidationOutput>,
    },

    #[error("failed to start async runtime: {0}")]
    Runtime(String),
}

/// A runnable check over one case.
pub enum Scenario<'a> {
    Validation(ValidationScenario<'a>),
    Determinism(DeterminismScenario<'a>),
    AsyncParity(AsyncParityScenario<'a>),
    CompileError(CompileErrorScenario<'a>),
}

impl Scenario<'_> {
    pub fn name(&self) -> String {
        match self {
            Scenario::Validation(_) => "validation".to_string(),
            Scenario::Determinism(_) => "determinism".to_string(),
            Scenario::AsyncParity(_) => "async_parity".to_string(),
            Scenario::CompileError(_) => "compile_error".to_string(),
        }
    }

    pub fn run(&self) -> Result<(), ScenarioError> {
        match self {
            Scenario::Validation(s) => s.run(),
            Scenario::Determinism(s) => s.run(),
            Scenario::AsyncParity(s) => s.run(),
            Scenario::CompileError(s) => s.run(),
        }
    }

    fn schema(&self) -> Result<&Node, &str> {
        match self {
            Scenario::Validation(s) => Ok(s.schema),
            Scenario::Determinism(s) => Ok(s.schema),
            Scenario::AsyncParity(s) => Ok(s.schema),
            Scenario::CompileError(s) => s.schema.map_err(String::as_str),
        }
    }

    /// The compiled procedure text, or the parse or compile error.
    pub fn render(&self) -> String {
        match self.schema().map(sieve::compile) {
            Ok(Ok(procedure)) => procedure.render().to_string(),
            Ok(Err(error)) => format!("<{error}>"),
            Err(error) => format!("<{error}>"),
        }
    }
}

fn describe(violation: &Violation) -> String {
    format!(
        "{} [{}] {}",
        violation.pointer, violation.rule, violation.message
    )
}

// ============================================================================
// validation
// ============================================================================

pub struct ValidationScenario<'a> {
    pub schema: &'a Node,
    pub input: &'a Value,
    pub output: Option<&'a Value>,
    pub violations: &'a [ExpectedViolation],
}

impl ValidationScenario<'_> {
    pub fn run(&self) -> Result<(), ScenarioError> {
        let procedure = sieve::compile(self.schema)?;
        let result = procedure.run(self.input)?;

        let matches = result.violations.0.len() == self.violations.len()
            && result
                .violations
                .0
                .iter()
                .zip(self.violations)
                .all(|(actual, expected)| {
                    actual.pointer == expected.pointer
                        && actual.rule == expected.rule
                        && expected
                            .message
                            .as_ref()
                            .is_none_or(|message| *message == actual.message)
                });
        if !matches {
            return Err(ScenarioError::ViolationsMismatch {
                expected: self
                    .violations
                    .iter()
                    .map(|v| {
                        format!(
                            "{} [{}] {}",
                            v.pointer,
                            v.rule,
                            v.message.as_deref().unwrap_or("*")
                        )
                    })
                    .collect(),
                actual: result.violations.0.iter().map(describe).collect(),
            });
        }

        if let Some(expected) = self.output {
            let actual = result.output.unwrap_or(Value::Null);
            if actual != *expected {
                return Err(ScenarioError::OutputMismatch {
                    expected: pretty(expected),
                    actual: pretty(&actual),
                });
            }
        }
        Ok(())
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
}

// ============================================================================
// determinism
// ============================================================================

pub struct DeterminismScenario<'a> {
    pub schema: &'a Node,
    pub input: &'a Value,
}

impl DeterminismScenario<'_> {
    pub fn run(&self) -> Result<(), ScenarioError> {
        let first = sieve::compile(self.schema)?;
        let second = sieve::compile(self.schema)?;
        if first.render() != second.render() {
            return Err(ScenarioError::NonDeterministic { what: "procedures" });
        }
        if first.run(self.input)? != second.run(self.input)? {
            return Err(ScenarioError::NonDeterministic { what: "results" });
        }
        // Reusing one procedure must not leak state between calls.
        if first.run(self.input)? != second.run(self.input)? {
            return Err(ScenarioError::NonDeterministic {
                what: "results on reuse",
            });
        }
        Ok(())
    }
}

// ============================================================================
// async_parity
// ============================================================================

pub struct AsyncParityScenario<'a> {
    pub schema: &'a Node,
    pub input: &'a Value,
}

impl AsyncParityScenario<'_> {
    pub fn run(&self) -> Result<(), ScenarioError> {
        let procedure = sieve::compile(self.schema)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| ScenarioError::Runtime(e.to_string()))?;
        let async_result = runtime.block_on(run_async(&procedure, self.input))?;
        let sync_result = procedure.run(self.input)?;
        if async_result != sync_result {
            return Err(ScenarioError::AsyncMismatch {
                sync: Box::new(sync_result),
                async_: Box::new(async_result),
            });
        }
        Ok(())
    }
}

async fn run_async(
    procedure: &Procedure,
    input: &Value,
) -> Result<ValidationOutput, ExecutionError> {
    procedure.run_async(input).await
}

// ============================================================================
// compile_error
// ============================================================================

/// A schema that must be rejected, either while parsing or while compiling.
pub struct CompileErrorScenario<'a> {
    pub schema: Result<&'a Node, &'a String>,
    pub expected: &'a str,
}

impl CompileErrorScenario<'_> {
    pub fn run(&self) -> Result<(), ScenarioError> {
        let actual = match self.schema {
            Ok(schema) => match sieve::compile(schema) {
                Ok(_) => {
                    return Err(ScenarioError::ExpectedCompileError {
                        expected: self.expected.to_string(),
                    });
                }
                Err(error) => error.to_string(),
            },
            Err(error) => error.clone(),
        };
        if actual.contains(self.expected) {
            Ok(())
        } else {
            Err(ScenarioError::CompileErrorMismatch {
                expected: self.expected.to_string(),
                actual,
            })
        }
    }
}
