//! Rule catalog keyed by name
//!
//! The compiler resolves every [`RuleRef`](crate::RuleRef) against a registry
//! while compiling, so an unknown name fails the compile instead of the first
//! validation call.

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;

use crate::error::RegistryError;
use crate::rule::Rule;

#[derive(Clone, Default)]
pub struct Registry {
    rules: AHashMap<String, Arc<dyn Rule>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule under `name`. Names are unique.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        rule: impl Rule + 'static,
    ) -> Result<(), RegistryError> {
        self.register_shared(name, Arc::new(rule))
    }

    pub fn register_shared(
        &mut self,
        name: impl Into<String>,
        rule: Arc<dyn Rule>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.rules.contains_key(&name) {
            return Err(RegistryError::DuplicateRule { name });
        }
        self.rules.insert(name, rule);
        Ok(())
    }

    /// Builder form of [`Registry::register`] that replaces an existing entry.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, rule: impl Rule + 'static) -> Self {
        self.rules.insert(name.into(), Arc::new(rule));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("rules", &self.names())
            .finish()
    }
}
