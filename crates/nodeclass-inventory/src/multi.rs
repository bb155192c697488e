//! Fallback chain over several storage backends.

use crate::error::StorageError;
use crate::storage::{NodeStorage, RawEntity};
use indexmap::IndexSet;

/// Tries each backend in order and returns the first success.
///
/// A failing backend is logged and skipped; the lookup only fails when
/// every backend has failed.
pub struct MultiStorage {
    backends: Vec<Box<dyn NodeStorage>>,
}

impl MultiStorage {
    pub fn new(backends: Vec<Box<dyn NodeStorage>>) -> Self {
        Self { backends }
    }

    pub fn push(&mut self, backend: impl NodeStorage + 'static) {
        self.backends.push(Box::new(backend));
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    fn first_success<F>(&self, kind: &str, name: &str, load: F) -> Result<RawEntity, StorageError>
    where
        F: Fn(&dyn NodeStorage) -> Result<RawEntity, StorageError>,
    {
        if self.backends.is_empty() {
            return Err(StorageError::NoBackends);
        }
        let mut failures = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            match load(backend.as_ref()) {
                Ok(entity) => return Ok(entity),
                Err(err) => {
                    tracing::warn!(
                        backend = backend.name(),
                        "{kind} '{name}' not found: {err}"
                    );
                    failures.push(err.to_string());
                }
            }
        }
        Err(StorageError::AllBackendsFailed {
            name: name.to_string(),
            failures,
        })
    }
}

impl NodeStorage for MultiStorage {
    fn name(&self) -> &str {
        "multi"
    }

    fn enumerate_nodes(&self) -> Vec<String> {
        let mut seen = IndexSet::new();
        for backend in &self.backends {
            seen.extend(backend.enumerate_nodes());
        }
        seen.into_iter().collect()
    }

    fn get_node(&self, name: &str) -> Result<RawEntity, StorageError> {
        self.first_success("node", name, |b| b.get_node(name))
    }

    fn get_class(&self, name: &str, nodename: Option<&str>) -> Result<RawEntity, StorageError> {
        self.first_success("class", name, |b| b.get_class(name, nodename))
    }
}
