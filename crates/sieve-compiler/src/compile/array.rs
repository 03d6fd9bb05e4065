//! Array node compiler
//!
//! 1. The array's own rules (length bounds, ...) run through the literal
//!    compiler. Without an element schema that check also assigns the array
//!    to the destination unchanged.
//!    An element schema that checks nothing counts as no element schema.
//! 2. With an element schema, the container-level assignment is suppressed.
//!    Under a guard "value exists and is a list", an output accumulator and
//!    an index variable are declared and the element schema is compiled once
//!    into the loop body, with each element pushed onto the accumulator.
//!    The accumulator is committed only if the container-level rules passed.
//!
//! The loop form is chosen here, once: if any rule anywhere in the element
//! subtree is asynchronous the loop awaits each element before starting the
//! next, otherwise it is a plain indexed loop.

use crate::buffer::BlockHeader;
use crate::error::CompileError;
use crate::ir::{Condition, Dest, LoopMode, Shape, Stmt};
use crate::pointer::FieldLocation;

use super::{Binding, CompileState, ResolvedNode, literal};

pub(crate) fn compile(
    state: &mut CompileState<'_>,
    node: &ResolvedNode<'_>,
    each: Option<&ResolvedNode<'_>>,
    location: &FieldLocation,
    dest: Dest,
    binding: Binding,
) -> Result<(), CompileError> {
    let Some(each) = each.filter(|each| !each.is_empty()) else {
        literal::compile(state, &node.rules, location, binding, Some(dest))?;
        return Ok(());
    };

    let check = literal::compile(state, &node.rules, location, binding, None)?;

    state.buffer.indent(BlockHeader::If(Condition::Shape {
        slot: check.slot,
        shape: Shape::Array,
    }));

    let out = state.output();
    state.buffer.write_statement(Stmt::DeclareOutput {
        out,
        shape: Shape::Array,
    });

    let index = state.index_var();
    let element = state.buffer.slot();
    let mode = if each.has_async {
        LoopMode::Sequential
    } else {
        LoopMode::Indexed
    };
    state.buffer.indent(BlockHeader::Loop {
        array: check.slot,
        element,
        index,
        mode,
    });
    let element_location = location.element(check.slot, index);
    state.compile_node(
        each,
        &element_location,
        Dest::Push { out },
        Binding::Reuse(element),
    )?;
    state.buffer.dedent()?;

    state.buffer.write_statement(Stmt::Commit {
        out,
        flag: check.flag,
        dest,
    });

    state.buffer.dedent()
}
