//! nodeclass inventory assembly.
//!
//! Loads raw node documents from a [`NodeStorage`], renders each node's
//! parameters with a shared [`Interpolator`](nodeclass_interp::Interpolator)
//! and collects the results into an
//! [`Inventory`](nodeclass_interp::Inventory) for cross-node functions.

mod builder;
mod error;
mod memory;
mod multi;
mod storage;

pub use builder::{to_host_vars, InventoryBuilder, NodeInfo, OwnParameters, ParameterSource, META_KEY};
pub use error::{InventoryError, Result, StorageError};
pub use memory::MemoryStorage;
pub use multi::MultiStorage;
pub use storage::{NodeStorage, RawEntity};
