use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors reported for one expression.
pub const MAX_ERRORS: usize = 8;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Name,
    Structure,
}

/// Numeric error code (E100–E399).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax errors (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const INVALID_ESCAPE: Self = Self(102);
    pub const UNEXPECTED_CHARACTER: Self = Self(103);
    pub const INVALID_NUMBER: Self = Self(104);
    pub const TRAILING_INPUT: Self = Self(105);

    // ── Name errors (E200–E299) ──
    pub const UNDEFINED_NAME: Self = Self(200);
    pub const UNKNOWN_FUNCTION: Self = Self(201);
    pub const UNKNOWN_METHOD: Self = Self(202);
    pub const WRONG_ARG_COUNT: Self = Self(203);

    // ── Structure errors (E300–E399) ──
    pub const NESTING_LIMIT_EXCEEDED: Self = Self(300);
    pub const CHAINED_COMPARISON: Self = Self(301);
    pub const EMPTY_EXPRESSION: Self = Self(302);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            200..=299 => ErrorCategory::Name,
            300..=399 => ErrorCategory::Structure,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Name => write!(f, "name"),
            Self::Structure => write!(f, "structure"),
        }
    }
}

/// A structured expression error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{span}: {code} [{category}] {message}")]
pub struct ExprError {
    /// Error code (e.g., E200).
    pub code: ErrorCode,
    /// Error category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable error message.
    pub message: String,
    /// Location inside the expression.
    #[serde(flatten)]
    pub span: Span,
    /// The full expression text.
    pub expression: String,
    /// Optional fix suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ExprError {
    /// Create a new error.
    pub fn new(
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            code,
            category: code.category(),
            message: message.into(),
            span,
            expression: expression.into(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Errors collected while lexing and parsing one expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprErrors {
    pub errors: Vec<ExprError>,
    pub total_errors: usize,
}

impl ExprErrors {
    /// Create an empty collection.
    pub fn empty() -> Self {
        Self {
            errors: Vec::new(),
            total_errors: 0,
        }
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Returns `true` once [`MAX_ERRORS`] have been recorded.
    pub fn is_full(&self) -> bool {
        self.total_errors >= MAX_ERRORS
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push_error(&mut self, error: ExprError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Move every error from `other` into `self`.
    pub fn extend(&mut self, other: ExprErrors) {
        let dropped = other.total_errors - other.errors.len();
        for error in other.errors {
            self.push_error(error);
        }
        self.total_errors += dropped;
    }

    /// The first recorded error, if any.
    pub fn first(&self) -> Option<&ExprError> {
        self.errors.first()
    }
}

impl fmt::Display for ExprErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "no errors"),
            [only] => write!(f, "{only}"),
            [first, ..] => write!(f, "{first} (and {} more)", self.total_errors - 1),
        }
    }
}

impl std::error::Error for ExprErrors {}
