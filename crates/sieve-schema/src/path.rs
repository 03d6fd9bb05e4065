//! Field paths for error reporting
//!
//! A [`FieldPath`] is fixed at compile time. Keys are static; array indices
//! are represented by [`IndexVar`]s whose concrete values are only known while
//! the compiled procedure iterates. Rendering therefore takes the current
//! index values as an argument.

use std::fmt::{self, Write};

/// Identifier of a loop index variable inside a compiled procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexVar(pub usize);

impl fmt::Display for IndexVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(IndexVar),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(pub Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        FieldPath(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of a child field.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        FieldPath(segments)
    }

    /// Path of an element addressed by a loop index variable.
    pub fn index(&self, var: IndexVar) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(var));
        FieldPath(segments)
    }

    /// Whether any segment is a dynamic index.
    pub fn has_indices(&self) -> bool {
        self.0.iter().any(|s| matches!(s, PathSegment::Index(_)))
    }

    /// Last static key, if the path ends in one.
    pub fn field_name(&self) -> Option<&str> {
        match self.0.last() {
            Some(PathSegment::Key(key)) => Some(key),
            _ => None,
        }
    }

    /// Dotted pointer with concrete indices, e.g. `items.1.name`.
    ///
    /// The root renders as the empty string. An index variable that has no
    /// value in `indices` renders as `*`.
    pub fn render(&self, indices: &[usize]) -> String {
        let mut out = String::new();
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match segment {
                PathSegment::Key(key) => out.push_str(key),
                PathSegment::Index(var) => push_index(&mut out, *var, indices),
            }
        }
        out
    }

    /// Expression form with bracketed indices, e.g. `items[1].name`.
    ///
    /// Only meaningful inside array iteration; returns `None` for paths
    /// without dynamic indices.
    pub fn render_expression(&self, indices: &[usize]) -> Option<String> {
        if !self.has_indices() {
            return None;
        }
        let mut out = String::new();
        for segment in &self.0 {
            match segment {
                PathSegment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                PathSegment::Index(var) => {
                    out.push('[');
                    push_index(&mut out, *var, indices);
                    out.push(']');
                }
            }
        }
        Some(out)
    }
}

fn push_index(out: &mut String, var: IndexVar, indices: &[usize]) {
    match indices.get(var.0) {
        Some(index) => {
            let _ = write!(out, "{index}");
        }
        None => out.push('*'),
    }
}

/// Compile-time form, with index variables left symbolic.
impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char('.')?;
            }
            match segment {
                PathSegment::Key(key) => f.write_str(key)?,
                PathSegment::Index(var) => write!(f, "{{{var}}}")?,
            }
        }
        Ok(())
    }
}
