//! Error types for interpolation, inventory functions, mutators and options.

use nodeclass_eval::EvalError;
use nodeclass_types::ExprErrors;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while parsing or rendering a composite value.
///
/// Every variant is fatal to the render in progress; nothing is retried and
/// no partial result is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpolationError {
    #[error("incomplete interpolation in {string:?}: dangling '{sentinel}'")]
    IncompleteInterpolation { string: String, sentinel: String },

    #[error("undefined variable: {path}")]
    UndefinedVariable { path: String },

    #[error("undefined function: {reference}")]
    UndefinedFunction { reference: String },

    #[error("malformed function call {reference:?}: {reason}")]
    MalformedFunctionCall { reference: String, reason: String },

    #[error("circular reference to '{path}' (via {})", .chain.join(" -> "))]
    CircularReference { path: String, chain: Vec<String> },

    #[error("reference depth limit {limit} exceeded while resolving '{path}'")]
    DepthExceeded { path: String, limit: usize },

    #[error("function '{name}' failed")]
    Function {
        name: String,
        source: FunctionError,
    },

    #[error("mutator '{name}' failed")]
    Mutator {
        name: String,
        source: MutatorError,
    },

    #[error("function reference {reference} needs an inventory")]
    InventoryRequired { reference: String },

    /// A failure while rendering `raw`, the string value that contained the
    /// offending reference.
    #[error("{cause} (in {raw:?})")]
    InValue {
        raw: String,
        #[source]
        cause: Box<InterpolationError>,
    },
}

impl InterpolationError {
    /// Attach the raw string being rendered. Errors that already name their
    /// string keep the innermost one.
    pub fn in_value(self, raw: &str) -> Self {
        match self {
            err @ (Self::InValue { .. } | Self::IncompleteInterpolation { .. }) => err,
            cause => Self::InValue {
                raw: raw.to_string(),
                cause: Box::new(cause),
            },
        }
    }

    /// The underlying failure, with any [`InValue`](Self::InValue) context removed.
    pub fn root(&self) -> &Self {
        match self {
            Self::InValue { cause, .. } => cause.root(),
            other => other,
        }
    }

    /// The raw string value the failure occurred in, when known.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::InValue { raw, .. } => Some(raw),
            Self::IncompleteInterpolation { string, .. } => Some(string),
            _ => None,
        }
    }
}

/// Failure inside one inventory query function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    #[error("node '{name}' is not in the inventory")]
    NodeNotFound { name: String },

    #[error("{function}() takes {expected} arguments, got {found}")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid expression: {0}")]
    Syntax(#[from] ExprErrors),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// A mutator rejected the value it was given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct MutatorError {
    pub reason: String,
}

impl MutatorError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Failure loading or validating [`InterpolationOptions`](crate::InterpolationOptions).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read options from {}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse options")]
    Parse(#[from] toml::de::Error),

    #[error("invalid options: {0}")]
    Invalid(String),

    #[error("unknown mutator '{0}'")]
    UnknownMutator(String),
}

pub type Result<T> = std::result::Result<T, InterpolationError>;
