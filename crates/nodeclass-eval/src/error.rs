//! Runtime error types for the query evaluator.

use thiserror::Error;

/// Evaluation error: a well-formed expression met data it cannot handle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A name that is not bound in the environment.
    #[error("undefined name: {0}")]
    UndefinedName(String),
    /// Attribute or subscript access on a mapping without that key.
    #[error("missing key '{key}'")]
    MissingKey { key: String },
    /// Sequence subscript outside the sequence.
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    /// Operator or method applied to the wrong kind of value.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// Division by zero or integer overflow.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
