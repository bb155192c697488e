//! nodeclass query evaluator.
//!
//! Evaluates a parsed filter/extract expression against one node's parameter
//! mapping. The evaluator has no access to anything but the `node` binding
//! and the literals in the expression.

mod env;
mod error;
mod evaluator;

pub use env::Environment;
pub use error::{EvalError, EvalResult};
pub use evaluator::{evaluate, is_truthy, type_name, Evaluator};
