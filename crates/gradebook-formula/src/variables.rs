//! Variable environments
//!
//! [`Variables`] is the flat seed map (raw scores and aggregates).
//! [`Environment`] layers calculated results on top of it without mutating
//! anything: each [`Environment::with_value`] returns a new snapshot that
//! shares everything already bound.

use crate::evaluator::VariableSource;
use ahash::AHashMap;
use gradebook_core::variable_key;
use std::sync::Arc;

/// Flat mapping from normalized variable name to value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    values: AHashMap<String, f64>,
}

impl Variables {
    /// Create an empty variable map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any previous value
    pub fn insert(&mut self, name: &str, value: f64) {
        self.values.insert(variable_key(name), value);
    }

    /// Set a variable only if the name is not bound yet.
    ///
    /// Returns `true` if the value was stored.
    pub fn insert_if_absent(&mut self, name: &str, value: f64) -> bool {
        match self.values.entry(variable_key(name)) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Look up a variable by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(&variable_key(name)).copied()
    }

    /// Whether a name is bound
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(&variable_key(name))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(normalized name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: AsRef<str>> FromIterator<(K, f64)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut vars = Variables::new();
        for (name, value) in iter {
            vars.insert(name.as_ref(), value);
        }
        vars
    }
}

impl VariableSource for Variables {
    fn value_of(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }
}

#[derive(Debug)]
struct Binding {
    key: String,
    value: f64,
    parent: Option<Arc<Binding>>,
}

/// Immutable variable snapshot: a shared seed plus a chain of bindings
#[derive(Debug, Clone, Default)]
pub struct Environment {
    base: Arc<Variables>,
    top: Option<Arc<Binding>>,
}

impl Environment {
    /// Create an environment over a seed map
    pub fn new(base: Variables) -> Self {
        Self {
            base: Arc::new(base),
            top: None,
        }
    }

    /// A new snapshot in which `name` is bound to `value`.
    ///
    /// The receiver is unchanged; later bindings shadow earlier ones and the seed.
    #[must_use]
    pub fn with_value(&self, name: &str, value: f64) -> Environment {
        Environment {
            base: Arc::clone(&self.base),
            top: Some(Arc::new(Binding {
                key: variable_key(name),
                value,
                parent: self.top.clone(),
            })),
        }
    }

    /// Look up a variable by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.value_of(&variable_key(name))
    }

    /// The seed the environment was built from
    pub fn base(&self) -> &Variables {
        &self.base
    }
}

impl VariableSource for Environment {
    fn value_of(&self, key: &str) -> Option<f64> {
        let mut cursor = self.top.as_deref();
        while let Some(binding) = cursor {
            if binding.key == key {
                return Some(binding.value);
            }
            cursor = binding.parent.as_deref();
        }
        self.base.value_of(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_normalized() {
        let mut vars = Variables::new();
        vars.insert(" Exam 1 ", 12.0);
        assert_eq!(vars.get("exam1"), Some(12.0));
        assert_eq!(vars.get("EXAM 1"), Some(12.0));
        assert!(vars.contains("Exam1"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut vars = Variables::new();
        assert!(vars.insert_if_absent("Quiz", 10.0));
        assert!(!vars.insert_if_absent("quiz ", 4.0));
        assert_eq!(vars.get("quiz"), Some(10.0));
    }

    #[test]
    fn test_environment_snapshots_are_independent() {
        let base: Variables = [("a", 1.0)].into_iter().collect();
        let first = Environment::new(base);
        let second = first.with_value("b", 2.0);
        let third = second.with_value("a", 5.0);

        assert_eq!(first.get("b"), None);
        assert_eq!(second.get("b"), Some(2.0));
        assert_eq!(second.get("a"), Some(1.0));
        assert_eq!(third.get("a"), Some(5.0));
        assert_eq!(third.base().get("a"), Some(1.0));
    }
}
