//! Object node compiler
//!
//! The node's own rules run as a literal check with output disabled. When
//! that check passes and the value is a plain keyed container, a fresh output
//! object is declared, each declared child is compiled in declaration order,
//! and the output object is committed to the destination. Undeclared keys
//! never reach the output.

use crate::buffer::BlockHeader;
use crate::error::CompileError;
use crate::ir::{Condition, Dest, Shape, Stmt};
use crate::pointer::FieldLocation;

use super::{Binding, CompileState, ResolvedNode, literal};

pub(crate) fn compile(
    state: &mut CompileState<'_>,
    node: &ResolvedNode<'_>,
    children: &[(&str, ResolvedNode<'_>)],
    location: &FieldLocation,
    dest: Dest,
    binding: Binding,
) -> Result<(), CompileError> {
    let check = literal::compile(state, &node.rules, location, binding, None)?;

    let shape = Condition::Shape {
        slot: check.slot,
        shape: Shape::Object,
    };
    let cond = match check.flag {
        Some(flag) => Condition::All(vec![Condition::Flag(flag), shape]),
        None => shape,
    };
    state.buffer.indent(BlockHeader::If(cond));

    let out = state.output();
    state.buffer.write_statement(Stmt::DeclareOutput {
        out,
        shape: Shape::Object,
    });
    for (name, child) in children {
        let child_location = location.child(check.slot, name);
        let child_dest = Dest::Field {
            out,
            key: (*name).to_string(),
        };
        state.compile_node(child, &child_location, child_dest, Binding::Declare)?;
    }
    state.buffer.write_statement(Stmt::Commit {
        out,
        flag: None,
        dest,
    });

    state.buffer.dedent()
}
