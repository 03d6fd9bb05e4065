//! Instruction tree of a compiled procedure
//!
//! The compile pass emits [`Stmt`]s into a [`Buffer`](crate::Buffer); block
//! statements (`If`, `Loop`) own nested [`Block`]s. The procedure executes the
//! finished tree directly, so nothing here is re-derived from the schema at
//! validation time.

use std::fmt;

use sieve_schema::{FieldPath, IndexVar};

/// Local value binding (`v{n}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub usize);

/// Per-field validity variable (`ok{n}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlagId(pub usize);

/// Output accumulator (`out{n}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutId(pub usize);

/// Index into the procedure's resolved rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub usize);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for FlagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ok{}", self.0)
    }
}

impl fmt::Display for OutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "out{}", self.0)
    }
}

/// Runtime expression locating a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Root,
    Field { parent: SlotId, key: String },
    Element { parent: SlotId, index: IndexVar },
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Root => f.write_str("input"),
            Source::Field { parent, key } => write!(f, "{parent}[{key:?}]"),
            Source::Element { parent, index } => write!(f, "{parent}[{index}]"),
        }
    }
}

/// Where a validated value is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dest {
    Root,
    Field { out: OutId, key: String },
    Push { out: OutId },
}

impl fmt::Display for Dest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dest::Root => f.write_str("output"),
            Dest::Field { out, key } => write!(f, "{out}[{key:?}]"),
            Dest::Push { out } => write!(f, "{out}[]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Object,
    Array,
}

impl Shape {
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Object => "object",
            Shape::Array => "array",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The slot holds a value.
    Exists(SlotId),
    Flag(FlagId),
    /// The slot holds a value of the given shape.
    Shape { slot: SlotId, shape: Shape },
    All(Vec<Condition>),
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Exists(slot) => write!(f, "{slot} exists"),
            Condition::Flag(flag) => write!(f, "{flag}"),
            Condition::Shape { slot, shape } => write!(f, "{slot} is {}", shape.as_str()),
            Condition::All(conditions) => {
                for (i, condition) in conditions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" && ")?;
                    }
                    write!(f, "{condition}")?;
                }
                Ok(())
            }
        }
    }
}

/// Element loop form, fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Plain indexed loop; the body never suspends.
    Indexed,
    /// Each element's body is awaited before the next begins.
    Sequential,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Bind {
        slot: SlotId,
        source: Source,
    },
    DeclareFlag(FlagId),
    RunRule {
        rule: RuleId,
        name: String,
        slot: SlotId,
        flag: FlagId,
        path: FieldPath,
        is_async: bool,
        /// Skip when the flag was already cleared by an earlier rule.
        bail: bool,
    },
    /// Write the slot's value into `dest` if the value exists and the flag
    /// (when given) is set.
    Assign {
        slot: SlotId,
        flag: Option<FlagId>,
        dest: Dest,
    },
    DeclareOutput {
        out: OutId,
        shape: Shape,
    },
    /// Move an accumulator into `dest`, if `flag` (when given) is set.
    Commit {
        out: OutId,
        flag: Option<FlagId>,
        dest: Dest,
    },
    If {
        cond: Condition,
        body: Block,
    },
    Loop {
        array: SlotId,
        element: SlotId,
        index: IndexVar,
        mode: LoopMode,
        body: Block,
    },
    /// Render-only annotation.
    Note(String),
    /// Render-only blank line.
    Blank,
}

impl Stmt {
    pub fn is_async(&self) -> bool {
        match self {
            Stmt::RunRule { is_async, .. } => *is_async,
            Stmt::If { body, .. } | Stmt::Loop { body, .. } => body.is_async,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    /// Some statement in this block (at any depth) suspends.
    pub is_async: bool,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        let is_async = stmts.iter().any(Stmt::is_async);
        Self { stmts, is_async }
    }

    /// Statements that do something at runtime, at any depth.
    pub fn executable_len(&self) -> usize {
        self.stmts
            .iter()
            .map(|stmt| match stmt {
                Stmt::Note(_) | Stmt::Blank => 0,
                Stmt::If { body, .. } | Stmt::Loop { body, .. } => 1 + body.executable_len(),
                _ => 1,
            })
            .sum()
    }
}
