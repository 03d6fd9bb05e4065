//! Schema compilation
//!
//! # Architecture
//!
//! Compilation runs in two passes over the schema tree:
//! - resolve: every rule reference is looked up in the [`Registry`] and
//!   compiled into the procedure's rule table; each subtree records whether
//!   any rule below it is asynchronous. Unknown rules fail here, before
//!   anything is emitted.
//! - emit: `compile_node` dispatches each node to its kind-specific compiler
//!   (`literal`, `object`, `array`), which write statements into the
//!   [`Buffer`].
//!
//! `CompileState` owns the buffer and the index/output counters for exactly
//! one compile pass.

mod array;
mod literal;
mod object;

use std::sync::Arc;

use sieve_schema::{IndexVar, LiteralType, Node, NodeKind, Registry, RuleOptions};
use tracing::{debug, trace};

use crate::buffer::{Buffer, render_block};
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::ir::{Dest, OutId, RuleId, SlotId, Source, Stmt};
use crate::pointer::FieldLocation;
use crate::procedure::{CompiledRule, FrameLayout, Procedure};

// =============================================================================
// Public API
// =============================================================================

/// Compiles schema trees against a rule registry.
///
/// # Example
///
/// ```ignore
/// let compiler = Compiler::new(&registry);
/// let procedure = compiler.compile(&schema)?;
/// let mut reporter = ViolationCollector::new();
/// let output = procedure.validate(&value, &mut reporter)?;
/// ```
#[derive(Debug, Clone)]
pub struct Compiler<'r> {
    registry: &'r Registry,
    config: CompilerConfig,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            config: CompilerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile `schema` into a reusable procedure.
    pub fn compile(&self, schema: &Node) -> Result<Procedure, CompileError> {
        debug!(nodes = schema.count(), "compiling schema");

        let mut state = CompileState::new(&self.config);
        let resolved = state.resolve(self.registry, schema, &mut Vec::new())?;

        state.compile_node(&resolved, &FieldLocation::root(), Dest::Root, Binding::Declare)?;

        let CompileState {
            buffer,
            rules,
            next_index,
            next_output,
            ..
        } = state;
        let layout = FrameLayout {
            slots: buffer.slot_count(),
            flags: buffer.flag_count(),
            indices: next_index,
            outputs: next_output,
        };
        let body = buffer.finish()?;
        let text = render_block(&body, self.config.indent_width);
        let procedure = Procedure::new(body, rules, layout, text);

        debug!(
            is_async = procedure.is_async(),
            statements = procedure.stats().statements,
            rules = procedure.stats().rules,
            "compiled schema"
        );
        Ok(procedure)
    }
}

// =============================================================================
// Resolved schema
// =============================================================================

/// A schema node with its rules resolved to rule-table entries.
#[derive(Debug)]
pub(crate) struct ResolvedNode<'n> {
    pub rules: Vec<RuleId>,
    pub kind: ResolvedKind<'n>,
    /// Some rule in this subtree is asynchronous.
    pub has_async: bool,
}

#[derive(Debug)]
pub(crate) enum ResolvedKind<'n> {
    Literal(LiteralType),
    Object(Vec<(&'n str, ResolvedNode<'n>)>),
    Array(Option<Box<ResolvedNode<'n>>>),
}

impl ResolvedNode<'_> {
    /// Neither rules nor structural children. At the root this compiles to
    /// nothing; below it the value is passed through unchecked.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
            && match &self.kind {
                ResolvedKind::Literal(_) => true,
                ResolvedKind::Object(children) => children.is_empty(),
                ResolvedKind::Array(each) => each.is_none(),
            }
    }
}

/// How a node compiler obtains the binding for its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Binding {
    /// Declare a new slot from the location's source.
    Declare,
    /// Use a slot the caller already bound.
    Reuse(SlotId),
}

// =============================================================================
// CompileState
// =============================================================================

pub(crate) struct CompileState<'c> {
    pub buffer: Buffer,
    pub config: &'c CompilerConfig,
    pub rules: Vec<CompiledRule>,
    next_index: usize,
    next_output: usize,
}

impl<'c> CompileState<'c> {
    fn new(config: &'c CompilerConfig) -> Self {
        Self {
            buffer: Buffer::new(),
            config,
            rules: Vec::new(),
            next_index: 0,
            next_output: 0,
        }
    }

    pub fn index_var(&mut self) -> IndexVar {
        let var = IndexVar(self.next_index);
        self.next_index += 1;
        var
    }

    pub fn output(&mut self) -> OutId {
        let out = OutId(self.next_output);
        self.next_output += 1;
        out
    }

    pub fn rule(&self, id: RuleId) -> &CompiledRule {
        &self.rules[id.0]
    }

    /// Bind the value at `location`, or reuse a caller-provided binding.
    pub fn bind(&mut self, binding: Binding, location: &FieldLocation) -> SlotId {
        match binding {
            Binding::Reuse(slot) => slot,
            Binding::Declare => {
                let slot = self.buffer.slot();
                self.buffer.write_statement(Stmt::Bind {
                    slot,
                    source: location.source.clone(),
                });
                slot
            }
        }
    }

    /// Dispatch a node to the compiler for its kind.
    pub fn compile_node(
        &mut self,
        node: &ResolvedNode<'_>,
        location: &FieldLocation,
        dest: Dest,
        binding: Binding,
    ) -> Result<(), CompileError> {
        let is_root = matches!(location.source, Source::Root);
        if node.is_empty() && is_root {
            trace!("skipping empty schema");
            return Ok(());
        }
        trace!(path = %location.path, "compiling node");

        if !is_root {
            self.buffer.new_line();
        }
        match &node.kind {
            ResolvedKind::Literal(subtype) => {
                self.buffer.write_expression(format!(
                    "{} ({})",
                    display_path(location),
                    subtype.as_str()
                ));
                literal::compile(self, &node.rules, location, binding, Some(dest))?;
                Ok(())
            }
            ResolvedKind::Object(children) => {
                self.buffer
                    .write_expression(format!("{} (object)", display_path(location)));
                object::compile(self, node, children, location, dest, binding)
            }
            ResolvedKind::Array(each) => {
                self.buffer
                    .write_expression(format!("{} (array)", display_path(location)));
                array::compile(self, node, each.as_deref(), location, dest, binding)
            }
        }
    }

    /// Resolve `node`'s rules (and its subtree's) into the rule table.
    fn resolve<'n>(
        &mut self,
        registry: &Registry,
        node: &'n Node,
        pointer: &mut Vec<String>,
    ) -> Result<ResolvedNode<'n>, CompileError> {
        let mut rules = Vec::with_capacity(node.rules.len());
        let mut has_async = false;

        for rule_ref in &node.rules {
            let Some(rule) = registry.get(&rule_ref.name) else {
                return Err(CompileError::UnknownRule {
                    name: rule_ref.name.clone(),
                    pointer: pointer.join("."),
                });
            };
            let meta = rule
                .compile(&rule_ref.args)
                .map_err(|source| CompileError::InvalidRuleArgs {
                    name: rule_ref.name.clone(),
                    pointer: pointer.join("."),
                    source,
                })?;
            trace!(
                rule = %meta.name,
                is_async = meta.is_async,
                allow_undefined = meta.allow_undefined,
                "resolved rule"
            );
            has_async |= meta.is_async;

            let options = RuleOptions {
                args: rule_ref.args.clone(),
                message: rule_ref.message.clone(),
                prepared: meta.prepared.clone(),
            };
            rules.push(RuleId(self.rules.len()));
            self.rules.push(CompiledRule {
                rule: Arc::clone(rule),
                meta,
                options,
            });
        }

        let kind = match &node.kind {
            NodeKind::Literal { subtype } => ResolvedKind::Literal(*subtype),
            NodeKind::Object { children } => {
                let mut resolved = Vec::with_capacity(children.len());
                for (name, child) in children {
                    pointer.push(name.clone());
                    let child = self.resolve(registry, child, pointer);
                    pointer.pop();
                    let child = child?;
                    has_async |= child.has_async;
                    resolved.push((name.as_str(), child));
                }
                ResolvedKind::Object(resolved)
            }
            NodeKind::Array { each } => match each {
                Some(each) => {
                    pointer.push("*".to_string());
                    let each = self.resolve(registry, each, pointer);
                    pointer.pop();
                    let each = each?;
                    has_async |= each.has_async;
                    ResolvedKind::Array(Some(Box::new(each)))
                }
                None => ResolvedKind::Array(None),
            },
        };

        Ok(ResolvedNode {
            rules,
            kind,
            has_async,
        })
    }
}

fn display_path(location: &FieldLocation) -> String {
    if location.path.is_root() {
        "<root>".to_string()
    } else {
        location.path.to_string()
    }
}
