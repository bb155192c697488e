//! Shared types for nodeclass query expressions.
//!
//! This crate defines the expression AST, source spans and structured
//! syntax errors used by the lexer, parser and evaluator of the
//! `filter`/`extract` mini-language.

mod error;
mod span;
pub mod ast;

pub use error::{ErrorCategory, ErrorCode, ExprError, ExprErrors, MAX_ERRORS};
pub use span::Span;

/// Result type used by the expression front-end.
pub type Result<T> = std::result::Result<T, ExprErrors>;
