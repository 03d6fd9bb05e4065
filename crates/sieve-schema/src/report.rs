//! Violation reporting
//!
//! Violations are data, not errors: a compiled procedure hands each failed
//! rule to an [`ErrorReporter`] and keeps going. [`ViolationCollector`] is the
//! default reporter; it keeps every violation in report order.

use std::fmt;

use thisisplural::Plural;

/// One failed rule at one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted pointer with concrete indices; empty for the root.
    pub pointer: String,
    pub rule: String,
    pub message: String,
    /// Bracketed form (`items[1].name`), only set inside array iteration.
    pub expression_pointer: Option<String>,
}

impl Violation {
    pub fn new(
        pointer: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            pointer: pointer.into(),
            rule: rule.into(),
            message: message.into(),
            expression_pointer: None,
        }
    }

    #[must_use]
    pub fn with_expression_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.expression_pointer = Some(pointer.into());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pointer.is_empty() {
            write!(f, "{} ({})", self.message, self.rule)
        } else {
            write!(f, "{}: {} ({})", self.pointer, self.message, self.rule)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Plural)]
pub struct Violations(pub Vec<Violation>);

impl Violations {
    /// Pointers in report order.
    pub fn pointers(&self) -> Vec<&str> {
        self.0.iter().map(|v| v.pointer.as_str()).collect()
    }

    /// Violations reported at exactly `pointer`.
    pub fn at<'a>(&'a self, pointer: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.0.iter().filter(move |v| v.pointer == pointer)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// Receives violations during one validation call.
pub trait ErrorReporter: Send {
    fn report(&mut self, violation: Violation);

    fn has_errors(&self) -> bool;
}

#[derive(Debug, Default)]
pub struct ViolationCollector {
    violations: Violations,
}

impl ViolationCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn violations(&self) -> &Violations {
        &self.violations
    }

    /// `Ok` when nothing was reported, otherwise every violation in order.
    pub fn into_result(self) -> Result<(), Violations> {
        if self.violations.0.is_empty() {
            Ok(())
        } else {
            Err(self.violations)
        }
    }

    pub fn into_violations(self) -> Violations {
        self.violations
    }
}

impl ErrorReporter for ViolationCollector {
    fn report(&mut self, violation: Violation) {
        self.violations.0.push(violation);
    }

    fn has_errors(&self) -> bool {
        !self.violations.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_empty_is_ok() {
        let collector = ViolationCollector::new();
        assert!(!collector.has_errors());
        assert_eq!(collector.into_result(), Ok(()));
    }

    #[test]
    fn test_collector_keeps_order() {
        let mut collector = ViolationCollector::new();
        collector.report(Violation::new("b", "number", "must be a number"));
        collector.report(Violation::new("a", "string", "must be a string"));
        let violations = collector.into_result().unwrap_err();
        assert_eq!(violations.pointers(), vec!["b", "a"]);
        assert_eq!(violations.at("a").count(), 1);
    }

    #[test]
    fn test_display() {
        let root = Violation::new("", "object", "must be an object");
        assert_eq!(root.to_string(), "must be an object (object)");
        let field = Violation::new("items.1", "string", "must be a string")
            .with_expression_pointer("items[1]");
        assert_eq!(field.to_string(), "items.1: must be a string (string)");
    }
}
