//! Formula evaluator
//!
//! Evaluates formula ASTs to produce numbers. Comparisons yield `1.0` or
//! `0.0`; any NaN or infinity is reported as an error instead of being
//! returned.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::parser::parse_formula;
use gradebook_core::variable_key;
use std::sync::OnceLock;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

pub(crate) fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Something formulas can read variables from
pub trait VariableSource {
    /// Value bound to an already normalized key (see [`variable_key`])
    fn value_of(&self, key: &str) -> Option<f64>;
}

struct NoVariables;

impl VariableSource for NoVariables {
    fn value_of(&self, _key: &str) -> Option<f64> {
        None
    }
}

/// Context for formula evaluation
pub struct EvaluationContext<'a> {
    variables: &'a dyn VariableSource,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(variables: &'a dyn VariableSource) -> Self {
        Self { variables }
    }

    /// Create a context without any variables (for testing)
    pub fn simple() -> EvaluationContext<'static> {
        EvaluationContext {
            variables: &NoVariables,
        }
    }

    /// Resolve a variable as written in a formula
    pub fn lookup(&self, name: &str) -> FormulaResult<f64> {
        self.variables
            .value_of(&variable_key(name))
            .ok_or_else(|| FormulaError::UnknownVariable(name.to_string()))
    }
}

/// Parse and evaluate a formula in one step
pub fn evaluate_str(formula: &str, variables: &dyn VariableSource) -> FormulaResult<f64> {
    let ast = parse_formula(formula)?;
    evaluate(&ast, &EvaluationContext::new(variables))
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<f64> {
    match expr {
        FormulaExpr::Number(n) => finite(*n),

        FormulaExpr::Variable(name) => ctx.lookup(name).and_then(finite),

        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

fn finite(value: f64) -> FormulaResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NonFinite)
    }
}

fn truth(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<f64> {
    let l = evaluate(left, ctx)?;
    let r = evaluate(right, ctx)?;

    match op {
        // Arithmetic operators
        BinaryOperator::Add => finite(l + r),
        BinaryOperator::Subtract => finite(l - r),
        BinaryOperator::Multiply => finite(l * r),
        BinaryOperator::Divide => {
            if r == 0.0 {
                Err(FormulaError::DivisionByZero)
            } else {
                finite(l / r)
            }
        }
        BinaryOperator::Power => finite(l.powf(r)),

        // Comparison operators
        BinaryOperator::Equal => Ok(truth(l == r)),
        BinaryOperator::NotEqual => Ok(truth(l != r)),
        BinaryOperator::LessThan => Ok(truth(l < r)),
        BinaryOperator::LessEqual => Ok(truth(l <= r)),
        BinaryOperator::GreaterThan => Ok(truth(l > r)),
        BinaryOperator::GreaterEqual => Ok(truth(l >= r)),
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<f64> {
    let value = evaluate(operand, ctx)?;

    match op {
        UnaryOperator::Negate => Ok(-value),
    }
}

/// Evaluate a function call
fn evaluate_function(name: &str, args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<f64> {
    // `if` only evaluates the branch it selects
    if name == "if" {
        return evaluate_if(args, ctx);
    }

    let registry = get_function_registry();

    let func = registry
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    func.check_arity(args.len())?;

    // Evaluate arguments
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    // Call the function
    (func.implementation)(&evaluated_args).and_then(finite)
}

fn evaluate_if(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<f64> {
    if args.len() != 3 {
        return Err(FormulaError::ArgumentCount {
            function: "if".to_string(),
            expected: "exactly 3".to_string(),
            actual: args.len(),
        });
    }

    let condition = evaluate(&args[0], ctx)?;
    if condition != 0.0 {
        evaluate(&args[1], ctx)
    } else {
        evaluate(&args[2], ctx)
    }
}
