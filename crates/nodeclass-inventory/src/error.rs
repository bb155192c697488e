//! Storage and inventory errors.

use nodeclass_interp::InterpolationError;
use thiserror::Error;

/// Failure reading raw node or class documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("{storage}: node '{name}' not found")]
    NodeNotFound { storage: String, name: String },

    #[error("{storage}: class '{name}' not found")]
    ClassNotFound { storage: String, name: String },

    #[error("{storage}: definition of '{name}' in {second} duplicates {first}")]
    DuplicateNodeName {
        storage: String,
        name: String,
        first: String,
        second: String,
    },

    #[error("'{name}' could not be loaded from any backend: {}", .failures.join("; "))]
    AllBackendsFailed { name: String, failures: Vec<String> },

    #[error("no storage backends configured")]
    NoBackends,

    #[error("{backend}: {message}")]
    Backend { backend: String, message: String },
}

/// Failure assembling the inventory or rendering one node.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("node '{node}': {source}")]
    Interpolation {
        node: String,
        source: InterpolationError,
    },

    #[error("failed to start worker pool")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, InventoryError>;
