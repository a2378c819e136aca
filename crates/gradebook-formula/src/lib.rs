//! # gradebook-formula
//!
//! Formula parser and evaluator for calculated grade items.
//!
//! This crate provides:
//! - Formula parsing (text → AST)
//! - Formula evaluation (AST + variables → number)
//! - Built-in functions (`avg`, `min`, `max`, `sum`, `abs`, `round`, `if`)
//! - Structural extraction of referenced names and a dependency graph
//!   with cycle-safe topological ordering
//!
//! ## Example
//!
//! ```rust
//! use gradebook_formula::{evaluate_str, Variables};
//!
//! let vars: Variables = [("Exam 1", 12.0), ("Exam 2", 16.0)].into_iter().collect();
//! let result = evaluate_str("avg(exam1, exam2)", &vars).unwrap();
//! assert_eq!(result, 14.0);
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod formula;
pub mod functions;
pub mod parser;
pub mod variables;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use dependency::{DependencyGraph, TopologicalOrder};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, evaluate_str, EvaluationContext, VariableSource};
pub use formula::{check_formula, Formula, FormulaCheck};
pub use parser::{parse_formula, MAX_NESTING};
pub use variables::{Environment, Variables};
