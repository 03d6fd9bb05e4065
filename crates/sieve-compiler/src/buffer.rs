//! Ordered statement buffer for one compile pass.
//!
//! Statements are appended at the current nesting depth. `indent` opens a
//! block under a header (a guard or a loop) and `dedent` closes it, attaching
//! the finished body to its header statement in the enclosing block.

use std::fmt::Write;

use sieve_schema::IndexVar;

use crate::error::CompileError;
use crate::ir::{Block, Condition, FlagId, LoopMode, SlotId, Stmt};

/// Header of a block opened with [`Buffer::indent`].
#[derive(Debug, Clone, PartialEq)]
pub enum BlockHeader {
    If(Condition),
    Loop {
        array: SlotId,
        element: SlotId,
        index: IndexVar,
        mode: LoopMode,
    },
}

#[derive(Debug)]
struct OpenBlock {
    header: Option<BlockHeader>,
    stmts: Vec<Stmt>,
}

#[derive(Debug)]
pub struct Buffer {
    open: Vec<OpenBlock>,
    next_slot: usize,
    next_flag: usize,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            open: vec![OpenBlock {
                header: None,
                stmts: Vec::new(),
            }],
            next_slot: 0,
            next_flag: 0,
        }
    }

    /// Allocate a fresh value binding.
    pub fn slot(&mut self) -> SlotId {
        let id = SlotId(self.next_slot);
        self.next_slot += 1;
        id
    }

    /// Allocate a fresh validity flag.
    pub fn flag(&mut self) -> FlagId {
        let id = FlagId(self.next_flag);
        self.next_flag += 1;
        id
    }

    pub fn slot_count(&self) -> usize {
        self.next_slot
    }

    pub fn flag_count(&self) -> usize {
        self.next_flag
    }

    /// Current nesting depth; zero at the procedure body.
    pub fn depth(&self) -> usize {
        self.open.len() - 1
    }

    pub fn write_statement(&mut self, stmt: Stmt) {
        self.top().stmts.push(stmt);
    }

    /// Append a render-only annotation at the current depth.
    pub fn write_expression(&mut self, text: impl Into<String>) {
        self.top().stmts.push(Stmt::Note(text.into()));
    }

    pub fn new_line(&mut self) {
        self.top().stmts.push(Stmt::Blank);
    }

    pub fn indent(&mut self, header: BlockHeader) {
        self.open.push(OpenBlock {
            header: Some(header),
            stmts: Vec::new(),
        });
    }

    pub fn dedent(&mut self) -> Result<(), CompileError> {
        if self.open.len() <= 1 {
            return Err(CompileError::UnbalancedBlock);
        }
        let Some(OpenBlock {
            header: Some(header),
            stmts,
        }) = self.open.pop()
        else {
            return Err(CompileError::UnbalancedBlock);
        };
        let body = Block::new(stmts);
        let stmt = match header {
            BlockHeader::If(cond) => Stmt::If { cond, body },
            BlockHeader::Loop {
                array,
                element,
                index,
                mode,
            } => Stmt::Loop {
                array,
                element,
                index,
                mode,
                body,
            },
        };
        self.write_statement(stmt);
        Ok(())
    }

    /// Close the buffer and return the procedure body.
    pub fn finish(mut self) -> Result<Block, CompileError> {
        let depth = self.depth();
        if depth != 0 {
            return Err(CompileError::UnclosedBlock { depth });
        }
        let root = self.open.pop().ok_or(CompileError::UnbalancedBlock)?;
        Ok(Block::new(root.stmts))
    }

    /// Render the statements written so far. All blocks must be closed.
    pub fn render(&self, indent_width: usize) -> Result<String, CompileError> {
        let depth = self.depth();
        if depth != 0 {
            return Err(CompileError::UnclosedBlock { depth });
        }
        let mut out = String::new();
        render_stmts(&mut out, &self.open[0].stmts, 0, indent_width);
        Ok(out)
    }

    fn top(&mut self) -> &mut OpenBlock {
        let last = self.open.len() - 1;
        &mut self.open[last]
    }
}

/// Render a finished block as procedure text.
pub fn render_block(block: &Block, indent_width: usize) -> String {
    let mut out = String::new();
    render_stmts(&mut out, &block.stmts, 0, indent_width);
    out
}

fn render_stmts(out: &mut String, stmts: &[Stmt], level: usize, width: usize) {
    for stmt in stmts {
        if matches!(stmt, Stmt::Blank) {
            out.push('\n');
            continue;
        }
        out.push_str(&" ".repeat(level * width));
        // Writing into a String cannot fail.
        let _ = match stmt {
            Stmt::Bind { slot, source } => writeln!(out, "let {slot} = {source};"),
            Stmt::DeclareFlag(flag) => writeln!(out, "let {flag} = true;"),
            Stmt::RunRule {
                name,
                slot,
                flag,
                path,
                is_async,
                bail,
                ..
            } => {
                let op = if *bail { "&&=" } else { "&=" };
                let wait = if *is_async { "await " } else { "" };
                writeln!(out, "{flag} {op} {wait}{name}({slot}) @ {:?};", path.to_string())
            }
            Stmt::Assign {
                slot,
                flag: Some(flag),
                dest,
            } => writeln!(out, "if {flag} && {slot} exists {{ {dest} = {slot}; }}"),
            Stmt::Assign {
                slot,
                flag: None,
                dest,
            } => writeln!(out, "if {slot} exists {{ {dest} = {slot}; }}"),
            Stmt::DeclareOutput { out: id, shape } => {
                let init = match shape {
                    crate::ir::Shape::Object => "{}",
                    crate::ir::Shape::Array => "[]",
                };
                writeln!(out, "let {id} = {init};")
            }
            Stmt::Commit {
                out: id,
                flag: Some(flag),
                dest,
            } => writeln!(out, "if {flag} {{ {dest} = {id}; }}"),
            Stmt::Commit {
                out: id,
                flag: None,
                dest,
            } => writeln!(out, "{dest} = {id};"),
            Stmt::If { cond, body } => {
                let _ = writeln!(out, "if {cond} {{");
                render_stmts(out, &body.stmts, level + 1, width);
                writeln!(out, "{}}}", " ".repeat(level * width))
            }
            Stmt::Loop {
                array,
                element,
                index,
                mode,
                body,
            } => {
                let head = match mode {
                    LoopMode::Indexed => "for",
                    LoopMode::Sequential => "for await",
                };
                let _ = writeln!(
                    out,
                    "{head} {index} in 0..{array}.len {{ let {element} = {array}[{index}];"
                );
                render_stmts(out, &body.stmts, level + 1, width);
                writeln!(out, "{}}}", " ".repeat(level * width))
            }
            Stmt::Note(text) => writeln!(out, "// {text}"),
            Stmt::Blank => Ok(()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Source;

    #[test]
    fn test_dedent_below_zero_fails() {
        let mut buffer = Buffer::new();
        assert_eq!(buffer.dedent(), Err(CompileError::UnbalancedBlock));
    }

    #[test]
    fn test_finish_with_open_block_fails() {
        let mut buffer = Buffer::new();
        let slot = buffer.slot();
        buffer.indent(BlockHeader::If(Condition::Exists(slot)));
        assert_eq!(
            buffer.finish(),
            Err(CompileError::UnclosedBlock { depth: 1 })
        );
    }

    #[test]
    fn test_unique_names() {
        let mut buffer = Buffer::new();
        assert_eq!(buffer.slot(), SlotId(0));
        assert_eq!(buffer.slot(), SlotId(1));
        assert_eq!(buffer.flag(), FlagId(0));
        assert_eq!(buffer.slot_count(), 2);
        assert_eq!(buffer.flag_count(), 1);
    }

    #[test]
    fn test_block_nesting_and_render() {
        let mut buffer = Buffer::new();
        let v0 = buffer.slot();
        buffer.write_statement(Stmt::Bind {
            slot: v0,
            source: Source::Root,
        });
        buffer.indent(BlockHeader::If(Condition::Exists(v0)));
        assert_eq!(buffer.depth(), 1);
        buffer.write_expression("inside");
        buffer.dedent().unwrap();
        assert_eq!(buffer.depth(), 0);

        let text = buffer.render(2).unwrap();
        assert_eq!(
            text,
            "let v0 = input;\nif v0 exists {\n  // inside\n}\n"
        );

        let block = buffer.finish().unwrap();
        assert_eq!(block.stmts.len(), 2);
        assert!(matches!(&block.stmts[1], Stmt::If { body, .. } if body.stmts.len() == 1));
    }

    #[test]
    fn test_new_line_is_cosmetic() {
        let mut buffer = Buffer::new();
        buffer.new_line();
        let block = buffer.finish().unwrap();
        assert_eq!(block.executable_len(), 0);
    }
}
