//! Literal node compiler
//!
//! Emits the guarded rule chain for one field: bind the value, declare a
//! validity flag, run the rules in declared order, and assign the value into
//! the destination when every rule passed.
//!
//! Absent values: when at least one rule on the field tolerates an absent
//! value, the rules that do not are wrapped in an existence guard, so an
//! absent value skips them. Without any tolerant rule, every rule sees the
//! absent value and is expected to report it.

use crate::buffer::BlockHeader;
use crate::error::CompileError;
use crate::ir::{Condition, Dest, FlagId, RuleId, SlotId, Stmt};
use crate::pointer::FieldLocation;

use super::{Binding, CompileState};

/// Bindings produced for a compiled field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LiteralCheck {
    pub slot: SlotId,
    /// `None` when the field has no rules.
    pub flag: Option<FlagId>,
}

pub(crate) fn compile(
    state: &mut CompileState<'_>,
    rules: &[RuleId],
    location: &FieldLocation,
    binding: Binding,
    output: Option<Dest>,
) -> Result<LiteralCheck, CompileError> {
    let slot = state.bind(binding, location);
    if rules.is_empty() {
        if let Some(dest) = output {
            state.buffer.write_statement(Stmt::Assign {
                slot,
                flag: None,
                dest,
            });
        }
        return Ok(LiteralCheck { slot, flag: None });
    }

    let flag = state.buffer.flag();
    state.buffer.write_statement(Stmt::DeclareFlag(flag));

    let tolerant = rules
        .iter()
        .any(|id| state.rule(*id).meta.allow_undefined);
    let bail = state.config.bail;
    let mut guarded = false;

    for &id in rules {
        let meta = &state.rule(id).meta;
        let needs_value = tolerant && !meta.allow_undefined;
        let stmt = Stmt::RunRule {
            rule: id,
            name: meta.name.clone(),
            slot,
            flag,
            path: location.path.clone(),
            is_async: meta.is_async,
            bail,
        };

        if needs_value && !guarded {
            state
                .buffer
                .indent(BlockHeader::If(Condition::Exists(slot)));
            guarded = true;
        } else if !needs_value && guarded {
            state.buffer.dedent()?;
            guarded = false;
        }
        state.buffer.write_statement(stmt);
    }
    if guarded {
        state.buffer.dedent()?;
    }

    if let Some(dest) = output {
        state
            .buffer
            .write_statement(Stmt::Assign {
                slot,
                flag: Some(flag),
                dest,
            });
    }

    Ok(LiteralCheck {
        slot,
        flag: Some(flag),
    })
}
