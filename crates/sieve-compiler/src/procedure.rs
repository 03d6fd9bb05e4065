//! Compiled validation procedure
//!
//! A [`Procedure`] is immutable once compiled and safe to share across
//! threads. Every call allocates a fresh [`Frame`] holding the value
//! bindings, validity flags, loop indices and output accumulators, so calls
//! never observe each other.
//!
//! Synchronous procedures run through `exec`. Asynchronous procedures run
//! through `exec_async`, which only suspends at statements that contain an
//! asynchronous rule; synchronous sub-blocks are handed back to `exec`.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use sieve_schema::{
    ErrorReporter, FieldPath, Outcome, Rule, RuleContext, RuleError, RuleMeta, RuleOptions,
    Violation, ViolationCollector, Violations,
};
use tracing::trace;

use crate::error::ExecutionError;
use crate::ir::{Block, Condition, Dest, FlagId, LoopMode, Shape, Stmt};
use crate::pointer::resolve;

// =============================================================================
// Compiled parts
// =============================================================================

/// A rule reference resolved against the registry at compile time.
pub(crate) struct CompiledRule {
    pub rule: Arc<dyn Rule>,
    pub meta: RuleMeta,
    pub options: RuleOptions,
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("meta", &self.meta)
            .field("options", &self.options)
            .finish()
    }
}

/// Number of each kind of variable a frame needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FrameLayout {
    pub slots: usize,
    pub flags: usize,
    pub indices: usize,
    pub outputs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcedureStats {
    /// Executable statements, at any depth.
    pub statements: usize,
    /// Resolved rule invocations.
    pub rules: usize,
    /// Value bindings.
    pub slots: usize,
}

/// Result of [`Procedure::run`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutput {
    /// No violations were reported
    pub is_valid: bool,
    /// Validated value, shaped like the schema
    pub output: Option<Value>,
    /// Violations in report order
    pub violations: Violations,
}

impl ValidationOutput {
    fn new(output: Option<Value>, collector: ViolationCollector) -> Self {
        let violations = collector.into_violations();
        Self {
            is_valid: violations.0.is_empty(),
            output,
            violations,
        }
    }
}

// =============================================================================
// Frame
// =============================================================================

/// Per-call mutable state.
struct Frame<'v> {
    root: &'v Value,
    slots: Vec<Option<&'v Value>>,
    flags: Vec<bool>,
    indices: Vec<usize>,
    outputs: Vec<Option<Value>>,
    result: Option<Value>,
}

impl<'v> Frame<'v> {
    fn new(root: &'v Value, layout: &FrameLayout) -> Self {
        Self {
            root,
            slots: vec![None; layout.slots],
            flags: vec![false; layout.flags],
            indices: vec![0; layout.indices],
            outputs: vec![None; layout.outputs],
            result: None,
        }
    }

    fn test(&self, cond: &Condition) -> bool {
        match cond {
            Condition::Exists(slot) => self.slots[slot.0].is_some(),
            Condition::Flag(flag) => self.flags[flag.0],
            Condition::Shape { slot, shape } => match (self.slots[slot.0], shape) {
                (Some(Value::Object(_)), Shape::Object) => true,
                (Some(Value::Array(_)), Shape::Array) => true,
                _ => false,
            },
            Condition::All(conds) => conds.iter().all(|c| self.test(c)),
        }
    }

    fn write(&mut self, dest: &Dest, value: Value) {
        match dest {
            Dest::Root => self.result = Some(value),
            Dest::Field { out, key } => {
                if let Some(Value::Object(map)) = &mut self.outputs[out.0] {
                    map.insert(key.clone(), value);
                }
            }
            Dest::Push { out } => {
                if let Some(Value::Array(items)) = &mut self.outputs[out.0] {
                    items.push(value);
                }
            }
        }
    }

    /// Number of elements to iterate for the array bound to `slot`.
    fn array_len(&self, slot: usize) -> usize {
        match self.slots[slot] {
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        }
    }

    fn element(&self, slot: usize, index: usize) -> Option<&'v Value> {
        match self.slots[slot] {
            Some(Value::Array(items)) => items.get(index),
            _ => None,
        }
    }
}

// =============================================================================
// Procedure
// =============================================================================

pub struct Procedure {
    body: Block,
    rules: Vec<CompiledRule>,
    layout: FrameLayout,
    text: String,
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("is_async", &self.is_async())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Procedure {
    pub(crate) fn new(
        body: Block,
        rules: Vec<CompiledRule>,
        layout: FrameLayout,
        text: String,
    ) -> Self {
        Self {
            body,
            rules,
            layout,
            text,
        }
    }

    /// Whether any rule in the procedure is asynchronous.
    pub fn is_async(&self) -> bool {
        self.body.is_async
    }

    /// The compiled procedure as text.
    pub fn render(&self) -> &str {
        &self.text
    }

    pub fn stats(&self) -> ProcedureStats {
        ProcedureStats {
            statements: self.body.executable_len(),
            rules: self.rules.len(),
            slots: self.layout.slots,
        }
    }

    /// Validate `value`, reporting violations to `reporter`.
    ///
    /// Returns the output built from declared, validated fields, or `None`
    /// when the root value itself failed or was absent. Asynchronous
    /// procedures must use [`Procedure::validate_async`].
    pub fn validate(
        &self,
        value: &Value,
        reporter: &mut dyn ErrorReporter,
    ) -> Result<Option<Value>, ExecutionError> {
        if self.is_async() {
            return Err(ExecutionError::RequiresAsync);
        }
        let mut frame = Frame::new(value, &self.layout);
        self.exec(&self.body, &mut frame, reporter)?;
        Ok(frame.result)
    }

    /// Validate `value`, awaiting asynchronous rules in order.
    ///
    /// Works for synchronous procedures too.
    pub async fn validate_async(
        &self,
        value: &Value,
        reporter: &mut dyn ErrorReporter,
    ) -> Result<Option<Value>, ExecutionError> {
        let mut frame = Frame::new(value, &self.layout);
        self.exec_async(&self.body, &mut frame, reporter).await?;
        Ok(frame.result)
    }

    /// [`Procedure::validate`] with a fresh collecting reporter.
    pub fn run(&self, value: &Value) -> Result<ValidationOutput, ExecutionError> {
        let mut collector = ViolationCollector::new();
        let output = self.validate(value, &mut collector)?;
        Ok(ValidationOutput::new(output, collector))
    }

    /// [`Procedure::validate_async`] with a fresh collecting reporter.
    pub async fn run_async(&self, value: &Value) -> Result<ValidationOutput, ExecutionError> {
        let mut collector = ViolationCollector::new();
        let output = self.validate_async(value, &mut collector).await?;
        Ok(ValidationOutput::new(output, collector))
    }

    fn exec<'v>(
        &self,
        block: &Block,
        frame: &mut Frame<'v>,
        reporter: &mut dyn ErrorReporter,
    ) -> Result<(), ExecutionError> {
        for stmt in &block.stmts {
            self.exec_stmt(stmt, frame, reporter)?;
        }
        Ok(())
    }

    fn exec_stmt<'v>(
        &self,
        stmt: &Stmt,
        frame: &mut Frame<'v>,
        reporter: &mut dyn ErrorReporter,
    ) -> Result<(), ExecutionError> {
        match stmt {
            Stmt::Bind { slot, source } => {
                frame.slots[slot.0] = resolve(source, frame.root, &frame.slots, &frame.indices);
            }
            Stmt::DeclareFlag(flag) => frame.flags[flag.0] = true,
            Stmt::RunRule {
                rule,
                slot,
                flag,
                path,
                is_async,
                bail,
                ..
            } => {
                if *bail && !frame.flags[flag.0] {
                    return Ok(());
                }
                if *is_async {
                    return Err(ExecutionError::RequiresAsync);
                }
                let compiled = &self.rules[rule.0];
                let value = frame.slots[slot.0];
                let ctx = RuleContext::new(path, &frame.indices, frame.root);
                let outcome = compiled
                    .rule
                    .validate(value, &compiled.options, &ctx)
                    .map_err(|source| rule_error(compiled, path, &frame.indices, source))?;
                settle(outcome, compiled, path, *flag, frame, reporter);
            }
            Stmt::Assign { slot, flag, dest } => {
                if flag.is_none_or(|flag| frame.flags[flag.0])
                    && let Some(value) = frame.slots[slot.0]
                {
                    frame.write(dest, value.clone());
                }
            }
            Stmt::DeclareOutput { out, shape } => {
                frame.outputs[out.0] = Some(match shape {
                    Shape::Object => Value::Object(Map::new()),
                    Shape::Array => Value::Array(Vec::new()),
                });
            }
            Stmt::Commit { out, flag, dest } => {
                let committed = flag.is_none_or(|flag| frame.flags[flag.0]);
                if let Some(value) = frame.outputs[out.0].take()
                    && committed
                {
                    frame.write(dest, value);
                }
            }
            Stmt::If { cond, body } => {
                if frame.test(cond) {
                    self.exec(body, frame, reporter)?;
                }
            }
            Stmt::Loop {
                array,
                element,
                index,
                body,
                ..
            } => {
                for i in 0..frame.array_len(array.0) {
                    frame.indices[index.0] = i;
                    frame.slots[element.0] = frame.element(array.0, i);
                    self.exec(body, frame, reporter)?;
                }
            }
            Stmt::Note(_) | Stmt::Blank => {}
        }
        Ok(())
    }

    fn exec_async<'a, 'v: 'a>(
        &'a self,
        block: &'a Block,
        frame: &'a mut Frame<'v>,
        reporter: &'a mut dyn ErrorReporter,
    ) -> BoxFuture<'a, Result<(), ExecutionError>> {
        Box::pin(async move {
            if !block.is_async {
                return self.exec(block, frame, reporter);
            }
            for stmt in &block.stmts {
                if !stmt.is_async() {
                    self.exec_stmt(stmt, frame, reporter)?;
                    continue;
                }
                match stmt {
                    Stmt::RunRule {
                        rule,
                        slot,
                        flag,
                        path,
                        bail,
                        ..
                    } => {
                        if *bail && !frame.flags[flag.0] {
                            continue;
                        }
                        let compiled = &self.rules[rule.0];
                        let value = frame.slots[slot.0];
                        let result = {
                            let ctx = RuleContext::new(path, &frame.indices, frame.root);
                            compiled
                                .rule
                                .validate_async(value, &compiled.options, &ctx)
                                .await
                        };
                        let outcome = result
                            .map_err(|source| rule_error(compiled, path, &frame.indices, source))?;
                        settle(outcome, compiled, path, *flag, frame, reporter);
                    }
                    Stmt::If { cond, body } => {
                        if frame.test(cond) {
                            self.exec_async(body, frame, reporter).await?;
                        }
                    }
                    Stmt::Loop {
                        array,
                        element,
                        index,
                        mode,
                        body,
                    } => {
                        for i in 0..frame.array_len(array.0) {
                            frame.indices[index.0] = i;
                            frame.slots[element.0] = frame.element(array.0, i);
                            match mode {
                                LoopMode::Sequential => {
                                    self.exec_async(body, frame, reporter).await?
                                }
                                LoopMode::Indexed => self.exec(body, frame, reporter)?,
                            }
                        }
                    }
                    other => self.exec_stmt(other, frame, reporter)?,
                }
            }
            Ok(())
        })
    }
}

/// Record a rule outcome: clear the flag and report on failure.
fn settle(
    outcome: Outcome,
    compiled: &CompiledRule,
    path: &FieldPath,
    flag: FlagId,
    frame: &mut Frame<'_>,
    reporter: &mut dyn ErrorReporter,
) {
    let Outcome::Fail { message } = outcome else {
        return;
    };
    frame.flags[flag.0] = false;

    let pointer = path.render(&frame.indices);
    let message = compiled
        .options
        .message
        .as_deref()
        .unwrap_or(&message)
        .replace("{field}", &pointer);
    let mut violation = Violation::new(pointer, compiled.meta.name.clone(), message);
    violation.expression_pointer = path.render_expression(&frame.indices);
    reporter.report(violation);
}

fn rule_error(
    compiled: &CompiledRule,
    path: &FieldPath,
    indices: &[usize],
    source: RuleError,
) -> ExecutionError {
    let pointer = path.render(indices);
    trace!(rule = %compiled.meta.name, %pointer, error = %source, "rule aborted validation");
    ExecutionError::Rule {
        rule: compiled.meta.name.clone(),
        pointer,
        source,
    }
}
