//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error at offset {position}: {message}")]
    Parse { position: usize, message: String },

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Invalid argument value
    #[error("Invalid argument for {function}: {message}")]
    Argument { function: String, message: String },

    /// Reference to a name with no value
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// An operation produced NaN or an infinity
    #[error("Result is not a finite number")]
    NonFinite,
}

impl FormulaError {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        FormulaError::Parse {
            position,
            message: message.into(),
        }
    }

    /// Whether the error comes from the formula text rather than from the values
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            FormulaError::Parse { .. }
                | FormulaError::UnknownFunction(_)
                | FormulaError::ArgumentCount { .. }
        )
    }
}
