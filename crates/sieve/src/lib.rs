//! Compile-once schema validation
//!
//! A schema ([`Node`]) is compiled against a rule [`Registry`] into a
//! [`Procedure`]. The procedure is then run against any number of values,
//! each run reporting per-field violations and producing an output that keeps
//! only the declared, validated fields.
//!
//! This crate bundles the compiler with the reference rule catalog:
//!
//! ```ignore
//! let schema = sieve::parse_schema(r#"{
//!     "type": "object",
//!     "rules": [{"name": "object"}],
//!     "children": {"name": {"type": "literal", "subtype": "string", "rules": [{"name": "string"}]}}
//! }"#)?;
//! let procedure = sieve::compile(&schema)?;
//! let result = procedure.run(&value)?;
//! ```

pub mod error;
pub mod report;

pub use error::Error;
pub use report::{EntryKind, Report, ReportEntry};

pub use sieve_compiler::{
    CompileError, Compiler, CompilerConfig, ExecutionError, Procedure, ProcedureStats,
    ValidationOutput,
};
pub use sieve_rules::catalog;
pub use sieve_schema::{
    ErrorReporter, LiteralType, Node, NodeKind, Outcome, Registry, Rule, RuleContext, RuleError,
    RuleMeta, RuleOptions, RuleRef, RuleSetupError, Value, Violation, ViolationCollector,
    Violations,
};

/// Rule implementations, for registries built from parts of the catalog.
pub mod rules {
    pub use sieve_rules::*;
}

/// Read a schema tree from its JSON form.
pub fn parse_schema(text: &str) -> Result<Node, Error> {
    serde_json::from_str(text).map_err(Error::InvalidSchema)
}

/// Read a schema tree from an already parsed JSON value.
pub fn schema_from_value(value: Value) -> Result<Node, Error> {
    serde_json::from_value(value).map_err(Error::InvalidSchema)
}

/// Compile `schema` against the reference catalog.
pub fn compile(schema: &Node) -> Result<Procedure, CompileError> {
    sieve_compiler::compile(&catalog(), schema)
}

/// Compile `schema` and run it once against `value`.
///
/// Compiling is the expensive part; keep the [`Procedure`] from [`compile`]
/// when validating more than one value.
pub fn validate(schema: &Node, value: &Value) -> Result<ValidationOutput, Error> {
    Ok(compile(schema)?.run(value)?)
}

/// Asynchronous form of [`validate`], for schemas with asynchronous rules.
pub async fn validate_async(schema: &Node, value: &Value) -> Result<ValidationOutput, Error> {
    let procedure = compile(schema)?;
    Ok(procedure.run_async(value).await?)
}
