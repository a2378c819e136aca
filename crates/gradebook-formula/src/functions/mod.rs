//! Built-in formula functions
//!
//! `if` is not registered here: it is a special form handled by the
//! evaluator so that only the selected branch is evaluated.

pub mod math;
pub mod statistical;

use crate::error::{FormulaError, FormulaResult};
use ahash::AHashMap;

/// Function implementation signature
pub type FunctionImpl = fn(&[f64]) -> FormulaResult<f64>;

/// Function definition
pub struct FunctionDef {
    /// Function name (lowercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    /// Check an argument count against the definition
    pub fn check_arity(&self, actual: usize) -> FormulaResult<()> {
        if actual < self.min_args {
            return Err(FormulaError::ArgumentCount {
                function: self.name.to_string(),
                expected: format!("at least {}", self.min_args),
                actual,
            });
        }

        if let Some(max) = self.max_args {
            if actual > max {
                return Err(FormulaError::ArgumentCount {
                    function: self.name.to_string(),
                    expected: format!("at most {}", max),
                    actual,
                });
            }
        }

        Ok(())
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_statistical_functions();
        registry.register_math_functions();

        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_lowercase())
    }

    /// Whether a function name is known, including the `if` special form
    pub fn is_known(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case("if") || self.get(name).is_some()
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_lowercase(), def);
    }

    fn register_statistical_functions(&mut self) {
        self.register(FunctionDef {
            name: "avg",
            min_args: 1,
            max_args: None,
            implementation: statistical::fn_avg,
        });

        self.register(FunctionDef {
            name: "min",
            min_args: 1,
            max_args: None,
            implementation: statistical::fn_min,
        });

        self.register(FunctionDef {
            name: "max",
            min_args: 1,
            max_args: None,
            implementation: statistical::fn_max,
        });

        self.register(FunctionDef {
            name: "sum",
            min_args: 1,
            max_args: None,
            implementation: statistical::fn_sum,
        });
    }

    fn register_math_functions(&mut self) {
        self.register(FunctionDef {
            name: "abs",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_abs,
        });

        self.register(FunctionDef {
            name: "round",
            min_args: 1,
            max_args: Some(2),
            implementation: math::fn_round,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = FunctionRegistry::new();
        assert!(registry.get("AVG").is_some());
        assert!(registry.get("Max").is_some());
        assert!(registry.get("median").is_none());
        assert!(registry.is_known("IF"));
    }

    #[test]
    fn test_check_arity() {
        let registry = FunctionRegistry::new();
        let round = registry.get("round").unwrap();
        assert!(round.check_arity(1).is_ok());
        assert!(round.check_arity(2).is_ok());
        assert!(round.check_arity(0).is_err());
        assert!(round.check_arity(3).is_err());
    }
}
