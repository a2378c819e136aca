//! Formula Abstract Syntax Tree types

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    /// Numeric literal
    Number(f64),

    /// Variable reference, as written in the formula
    Variable(String),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },

    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    /// Function call (name is lower-cased)
    Function { name: String, args: Vec<FormulaExpr> },
}

impl FormulaExpr {
    /// Visit every variable reference in evaluation order
    pub fn for_each_variable<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            FormulaExpr::Number(_) => {}
            FormulaExpr::Variable(name) => f(name),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.for_each_variable(f);
                right.for_each_variable(f);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.for_each_variable(f),
            FormulaExpr::Function { args, .. } => {
                for arg in args {
                    arg.for_each_variable(f);
                }
            }
        }
    }

    /// Visit every function call
    pub fn for_each_function<'a>(&'a self, f: &mut impl FnMut(&'a str, usize)) {
        match self {
            FormulaExpr::Number(_) | FormulaExpr::Variable(_) => {}
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.for_each_function(f);
                right.for_each_function(f);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.for_each_function(f),
            FormulaExpr::Function { name, args } => {
                f(name, args.len());
                for arg in args {
                    arg.for_each_function(f);
                }
            }
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl BinaryOperator {
    /// Comparison operators yield 1.0 or 0.0
    pub fn is_comparison(self) -> bool {
        !matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
                | BinaryOperator::Power
        )
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}
