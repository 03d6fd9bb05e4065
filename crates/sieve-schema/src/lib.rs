//! Schema tree and plugin contracts for sieve.
//!
//! This crate holds everything the compiler consumes but does not own:
//! - [`Node`]: the typed schema tree (literal, object, array)
//! - [`Rule`]: the pluggable rule contract and its [`Registry`]
//! - [`ErrorReporter`]: where violations go during a validation call
//! - [`FieldPath`]: static pointer segments resolved against runtime indices

mod error;
mod node;
mod path;
mod registry;
mod report;
mod rule;

pub use error::{RegistryError, RuleError, RuleSetupError};
pub use node::{LiteralType, Node, NodeKind, RuleRef};
pub use path::{FieldPath, IndexVar, PathSegment};
pub use registry::Registry;
pub use report::{ErrorReporter, Violation, ViolationCollector, Violations};
pub use rule::{Outcome, Prepared, Rule, RuleContext, RuleMeta, RuleOptions};

pub use serde_json::Value;
