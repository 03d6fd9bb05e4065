//! Rule plugin contract
//!
//! A rule is a stateless, shared unit with two phases:
//! - compile: inspect the node's arguments once and describe the rule
//!   ([`RuleMeta`]); may precompute state such as a parsed pattern
//! - validate: check one value and either pass or produce one violation
//!
//! Asynchronous rules override [`Rule::validate_async`] and set
//! [`RuleMeta::is_async`]; the compiler uses that flag to pick the control
//! flow of the generated procedure.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::{RuleError, RuleSetupError};
use crate::path::FieldPath;

/// State a rule computes at compile time and reads back at validation time.
pub type Prepared = Arc<dyn Any + Send + Sync>;

/// Compile-time description of a configured rule.
#[derive(Clone)]
pub struct RuleMeta {
    pub name: String,
    pub is_async: bool,
    /// The rule tolerates an absent value and never reports on one.
    pub allow_undefined: bool,
    pub prepared: Option<Prepared>,
}

impl RuleMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_async: false,
            allow_undefined: false,
            prepared: None,
        }
    }

    #[must_use]
    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    #[must_use]
    pub fn allow_undefined(mut self) -> Self {
        self.allow_undefined = true;
        self
    }

    #[must_use]
    pub fn with_prepared<T: Any + Send + Sync>(mut self, state: T) -> Self {
        self.prepared = Some(Arc::new(state));
        self
    }
}

impl fmt::Debug for RuleMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleMeta")
            .field("name", &self.name)
            .field("is_async", &self.is_async)
            .field("allow_undefined", &self.allow_undefined)
            .field("prepared", &self.prepared.is_some())
            .finish()
    }
}

/// Options handed to the run-time phase.
#[derive(Clone, Default)]
pub struct RuleOptions {
    pub args: Value,
    pub message: Option<String>,
    pub prepared: Option<Prepared>,
}

impl RuleOptions {
    pub fn new(args: Value) -> Self {
        Self {
            args,
            message: None,
            prepared: None,
        }
    }

    /// Downcast the compile-time state.
    pub fn prepared<T: Any>(&self) -> Option<&T> {
        self.prepared.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for RuleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleOptions")
            .field("args", &self.args)
            .field("message", &self.message)
            .field("prepared", &self.prepared.is_some())
            .finish()
    }
}

/// Result of one rule run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail { message: String },
}

impl Outcome {
    pub fn fail(message: impl Into<String>) -> Self {
        Outcome::Fail {
            message: message.into(),
        }
    }

    /// `Pass` when `ok`, otherwise `Fail` with the given message.
    pub fn check(ok: bool, message: impl FnOnce() -> String) -> Self {
        if ok {
            Outcome::Pass
        } else {
            Outcome::Fail { message: message() }
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }
}

/// Where the value under validation lives, for one rule invocation.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub path: &'a FieldPath,
    /// Current values of every loop index variable, by [`IndexVar`](crate::IndexVar) id.
    pub indices: &'a [usize],
    pub root: &'a Value,
}

impl<'a> RuleContext<'a> {
    pub fn new(path: &'a FieldPath, indices: &'a [usize], root: &'a Value) -> Self {
        Self {
            path,
            indices,
            root,
        }
    }

    pub fn pointer(&self) -> String {
        self.path.render(self.indices)
    }

    pub fn expression_pointer(&self) -> Option<String> {
        self.path.render_expression(self.indices)
    }

    pub fn field_name(&self) -> Option<&'a str> {
        self.path.field_name()
    }
}

pub trait Rule: Send + Sync {
    /// Describe this rule as configured with `args`.
    fn compile(&self, args: &Value) -> Result<RuleMeta, RuleSetupError>;

    /// Check `value`; `None` means the field is absent.
    fn validate(
        &self,
        value: Option<&Value>,
        options: &RuleOptions,
        ctx: &RuleContext<'_>,
    ) -> Result<Outcome, RuleError>;

    /// Asynchronous form, called instead of [`Rule::validate`] when the
    /// compiled metadata is asynchronous.
    fn validate_async<'a>(
        &'a self,
        value: Option<&'a Value>,
        options: &'a RuleOptions,
        ctx: &'a RuleContext<'a>,
    ) -> BoxFuture<'a, Result<Outcome, RuleError>> {
        Box::pin(std::future::ready(self.validate(value, options, ctx)))
    }
}
