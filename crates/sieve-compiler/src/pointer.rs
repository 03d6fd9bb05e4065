//! Field pointers
//!
//! A [`FieldLocation`] pairs the error-reporting path of a field with the
//! runtime expression that fetches its value. Both are built at compile time
//! from the parent's location; loop indices stay symbolic ([`IndexVar`]) and
//! are resolved against the frame while the procedure runs.

use serde_json::Value;
use sieve_schema::{FieldPath, IndexVar};

use crate::ir::{SlotId, Source};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldLocation {
    pub path: FieldPath,
    pub source: Source,
}

impl FieldLocation {
    pub fn root() -> Self {
        Self {
            path: FieldPath::root(),
            source: Source::Root,
        }
    }

    /// Location of `key` inside the object bound to `parent`.
    pub fn child(&self, parent: SlotId, key: &str) -> Self {
        Self {
            path: self.path.key(key),
            source: Source::Field {
                parent,
                key: key.to_string(),
            },
        }
    }

    /// Location of the element at `index` inside the array bound to `parent`.
    pub fn element(&self, parent: SlotId, index: IndexVar) -> Self {
        Self {
            path: self.path.index(index),
            source: Source::Element { parent, index },
        }
    }

    pub fn pointer(&self, indices: &[usize]) -> String {
        self.path.render(indices)
    }

    pub fn expression_pointer(&self, indices: &[usize]) -> Option<String> {
        self.path.render_expression(indices)
    }
}

/// Evaluate a value source against the current frame.
///
/// Missing keys, out-of-range indices and non-container parents all
/// resolve to `None` (absent).
pub(crate) fn resolve<'v>(
    source: &Source,
    root: &'v Value,
    slots: &[Option<&'v Value>],
    indices: &[usize],
) -> Option<&'v Value> {
    match source {
        Source::Root => Some(root),
        Source::Field { parent, key } => match slots.get(parent.0).copied().flatten()? {
            Value::Object(map) => map.get(key),
            _ => None,
        },
        Source::Element { parent, index } => {
            let i = *indices.get(index.0)?;
            match slots.get(parent.0).copied().flatten()? {
                Value::Array(items) => items.get(i),
                _ => None,
            }
        }
    }
}
