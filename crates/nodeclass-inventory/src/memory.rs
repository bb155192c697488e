//! In-memory storage backend.

use crate::error::StorageError;
use crate::storage::{NodeStorage, RawEntity};
use indexmap::IndexMap;

/// An entity together with where it was defined.
#[derive(Debug, Clone)]
struct Located {
    location: String,
    entity: RawEntity,
}

/// Nodes and classes held in memory, enumerated in registration order.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    name: String,
    nodes: IndexMap<String, Located>,
    classes: IndexMap<String, Located>,
    default_environment: Option<String>,
}

impl MemoryStorage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            classes: IndexMap::new(),
            default_environment: None,
        }
    }

    /// Environment given to nodes and classes that do not declare one.
    pub fn with_default_environment(mut self, environment: impl Into<String>) -> Self {
        self.default_environment = Some(environment.into());
        self
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        location: impl Into<String>,
        entity: RawEntity,
    ) -> Result<(), StorageError> {
        register(&self.name, &mut self.nodes, name.into(), location.into(), entity)
    }

    pub fn add_class(
        &mut self,
        name: impl Into<String>,
        location: impl Into<String>,
        entity: RawEntity,
    ) -> Result<(), StorageError> {
        register(&self.name, &mut self.classes, name.into(), location.into(), entity)
    }

    fn finish(&self, located: &Located) -> RawEntity {
        let mut entity = located.entity.clone();
        if entity.environment.is_none() {
            entity.environment = self.default_environment.clone();
        }
        entity
    }
}

fn register(
    storage: &str,
    table: &mut IndexMap<String, Located>,
    name: String,
    location: String,
    entity: RawEntity,
) -> Result<(), StorageError> {
    if let Some(existing) = table.get(&name) {
        return Err(StorageError::DuplicateNodeName {
            storage: storage.to_string(),
            name,
            first: existing.location.clone(),
            second: location,
        });
    }
    table.insert(name, Located { location, entity });
    Ok(())
}

impl NodeStorage for MemoryStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn enumerate_nodes(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    fn get_node(&self, name: &str) -> Result<RawEntity, StorageError> {
        self.nodes
            .get(name)
            .map(|located| self.finish(located))
            .ok_or_else(|| StorageError::NodeNotFound {
                storage: self.name.clone(),
                name: name.to_string(),
            })
    }

    fn get_class(&self, name: &str, _nodename: Option<&str>) -> Result<RawEntity, StorageError> {
        self.classes
            .get(name)
            .map(|located| self.finish(located))
            .ok_or_else(|| StorageError::ClassNotFound {
                storage: self.name.clone(),
                name: name.to_string(),
            })
    }
}
