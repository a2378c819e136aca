//! Parsed formulas
//!
//! A [`Formula`] is parsed once and evaluated for every student. The names it
//! references are extracted from the AST, so `Exam1` inside `Exam10` or a
//! function called `max` never count as references.

use crate::ast::FormulaExpr;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{evaluate, get_function_registry, EvaluationContext, VariableSource};
use crate::parser::parse_formula;
use gradebook_core::variable_key;
use std::collections::BTreeSet;

/// A parsed formula together with the variables it references
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: FormulaExpr,
    /// Normalized names of referenced variables
    variables: BTreeSet<String>,
}

impl Formula {
    /// Parse a formula
    pub fn parse(source: &str) -> FormulaResult<Formula> {
        let expr = parse_formula(source)?;
        let mut variables = BTreeSet::new();
        expr.for_each_variable(&mut |name| {
            variables.insert(variable_key(name));
        });

        Ok(Formula {
            source: source.trim().to_string(),
            expr,
            variables,
        })
    }

    /// Formula text as given (trimmed)
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed expression
    pub fn expr(&self) -> &FormulaExpr {
        &self.expr
    }

    /// Normalized names of the referenced variables, sorted
    pub fn variables(&self) -> impl Iterator<Item = &str> + '_ {
        self.variables.iter().map(String::as_str)
    }

    /// Whether the formula references `name` (compared after normalization)
    pub fn references(&self, name: &str) -> bool {
        self.variables.contains(&variable_key(name))
    }

    /// Evaluate the formula against a variable source
    pub fn evaluate(&self, variables: &dyn VariableSource) -> FormulaResult<f64> {
        evaluate(&self.expr, &EvaluationContext::new(variables))
    }
}

/// Outcome of validating a formula before it is saved on a grade item
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormulaCheck {
    /// Normalized names referenced by the formula, sorted
    pub variables: Vec<String>,
    /// Referenced names that are not in the known set
    pub unknown_variables: Vec<String>,
    /// Calls to functions that do not exist, or with a wrong argument count
    pub function_errors: Vec<FormulaError>,
}

impl FormulaCheck {
    /// Whether the formula can be evaluated once the known names are bound
    pub fn is_valid(&self) -> bool {
        self.unknown_variables.is_empty() && self.function_errors.is_empty()
    }
}

/// Validate a formula against the names it may reference.
///
/// Returns an error if the formula does not parse.
///
/// ```rust
/// use gradebook_formula::check_formula;
///
/// let check = check_formula("avg(Exam1, Exam3) + pos", ["Exam 1", "Exam 2", "pos"]).unwrap();
/// assert_eq!(check.unknown_variables, vec!["exam3".to_string()]);
/// ```
pub fn check_formula<I, S>(source: &str, known: I) -> FormulaResult<FormulaCheck>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let formula = Formula::parse(source)?;
    let known: BTreeSet<String> = known
        .into_iter()
        .map(|name| variable_key(name.as_ref()))
        .collect();

    let registry = get_function_registry();
    let mut function_errors = Vec::new();
    formula.expr.for_each_function(&mut |name, arity| {
        if name == "if" {
            if arity != 3 {
                function_errors.push(FormulaError::ArgumentCount {
                    function: "if".to_string(),
                    expected: "exactly 3".to_string(),
                    actual: arity,
                });
            }
            return;
        }
        match registry.get(name) {
            Some(def) => {
                if let Err(e) = def.check_arity(arity) {
                    function_errors.push(e);
                }
            }
            None => function_errors.push(FormulaError::UnknownFunction(name.to_string())),
        }
    });

    Ok(FormulaCheck {
        variables: formula.variables.iter().cloned().collect(),
        unknown_variables: formula
            .variables
            .iter()
            .filter(|name| !known.contains(*name))
            .cloned()
            .collect(),
        function_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::Variables;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_variables_are_extracted_structurally() {
        let formula = Formula::parse("max(Exam10, exam1) + if(ABS_TD > 2, 0, Exam 1)");
        // "Exam 1" with a space is two tokens: not a valid formula
        assert!(formula.is_err());

        let formula = Formula::parse("max(Exam10, exam1) + if(ABS_TD > 2, 0, Exam1)").unwrap();
        assert_eq!(
            formula.variables().collect::<Vec<_>>(),
            vec!["abs_td", "exam1", "exam10"]
        );
        assert!(formula.references("Exam 1"));
        assert!(!formula.references("Exam"));
        assert!(!formula.references("max"));
    }

    #[test]
    fn test_evaluate_parsed_formula() {
        let formula = Formula::parse(" B + 1 ").unwrap();
        assert_eq!(formula.source(), "B + 1");

        let vars: Variables = [("b", 10.0)].into_iter().collect();
        assert_eq!(formula.evaluate(&vars).unwrap(), 11.0);
    }

    #[test]
    fn test_check_formula() {
        let check = check_formula("avg(a, b) + median(c) + round(1, 2, 3)", ["A", "c"]).unwrap();
        assert_eq!(check.variables, vec!["a", "b", "c"]);
        assert_eq!(check.unknown_variables, vec!["b"]);
        assert_eq!(check.function_errors.len(), 2);
        assert!(!check.is_valid());

        let check = check_formula("if(pos > neg, 1, 0)", ["pos", "neg"]).unwrap();
        assert!(check.is_valid());
    }

    #[test]
    fn test_check_formula_reports_parse_errors() {
        assert!(matches!(
            check_formula("avg(a,", ["a"]),
            Err(FormulaError::Parse { .. })
        ));
    }
}
