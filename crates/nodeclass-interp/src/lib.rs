//! nodeclass reference interpolation.
//!
//! Strings inside a node's merged parameters may embed references:
//! `${path:to:value}` reads another parameter of the same node, and
//! `$[name(args)]` calls an inventory query function. A string that is
//! nothing but one reference renders to the referenced value's own type;
//! anything else renders to a string.
//!
//! ```
//! use nodeclass_interp::{FunctionMode, InterpolationOptions, Interpolator};
//! use serde_json::json;
//!
//! let interp = Interpolator::new(InterpolationOptions::default()).unwrap();
//! let ctx = json!({"port": 5432, "host": "db1"});
//! let url = interp.render(&json!("${host}:${port}"), &ctx, FunctionMode::Unavailable).unwrap();
//! assert_eq!(url, json!("db1:5432"));
//! ```

mod composite;
mod error;
mod function;
mod mutator;
mod options;
mod path;
mod reference;
mod resolve;

pub use composite::{coerce_to_string, CompositeValue};
pub use error::{ConfigError, FunctionError, InterpolationError, MutatorError, Result};
pub use function::{Aggregate, Function, FunctionRegistry, Get, Inventory, List, Print};
pub use mutator::{Mutator, MutatorCatalog, MutatorFn, Mutators, PriorityList};
pub use options::{InterpolationOptions, Sentinels};
pub use path::DictPath;
pub use reference::Reference;
pub use resolve::{FunctionMode, Interpolator, MAX_RESOLUTION_DEPTH};
