//! Schema compiler for sieve
//!
//! Turns a [`Node`](sieve_schema::Node) tree into a [`Procedure`] once, ahead
//! of time. The procedure is a flattened instruction tree: value bindings,
//! guards derived from runtime type checks, rule invocations and output
//! assignments, with one loop per array that has an element schema. Running
//! it never walks the schema or looks up rules by name.

mod buffer;
mod compile;
mod config;
mod error;
mod ir;
mod pointer;
mod procedure;

pub use buffer::{BlockHeader, Buffer, render_block};
pub use compile::Compiler;
pub use config::CompilerConfig;
pub use error::{CompileError, ExecutionError};
pub use ir::{
    Block, Condition, Dest, FlagId, LoopMode, OutId, RuleId, Shape, SlotId, Source, Stmt,
};
pub use pointer::FieldLocation;
pub use procedure::{Procedure, ProcedureStats, ValidationOutput};

use sieve_schema::{Node, Registry};

/// Compile `schema` with the default configuration.
pub fn compile(registry: &Registry, schema: &Node) -> Result<Procedure, CompileError> {
    Compiler::new(registry).compile(schema)
}
