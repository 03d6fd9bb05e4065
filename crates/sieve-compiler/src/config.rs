//! Compiler configuration.

/// Configuration options for the schema compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Stop running a field's rules after its first violation.
    /// Default: true
    pub bail: bool,

    /// Number of spaces per nesting level in the rendered procedure.
    /// Default: 2
    pub indent_width: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            bail: true,
            indent_width: 2,
        }
    }
}

impl CompilerConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bail mode.
    pub fn with_bail(mut self, bail: bool) -> Self {
        self.bail = bail;
        self
    }

    /// Set indent width.
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }
}
