//! The storage capability consumed by the inventory builder.

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A node or class document as stored, before merging or rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub applications: Vec<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

impl RawEntity {
    pub fn with_parameters(parameters: Value) -> Self {
        Self {
            parameters: match parameters {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            ..Self::default()
        }
    }
}

/// A source of raw node and class documents.
pub trait NodeStorage: Send + Sync {
    /// Short backend name used in errors and log lines.
    fn name(&self) -> &str;

    /// Every node name, in a stable order.
    fn enumerate_nodes(&self) -> Vec<String>;

    fn get_node(&self, name: &str) -> Result<RawEntity, StorageError>;

    /// `nodename` is the node being classified, for backends that resolve
    /// classes relative to it.
    fn get_class(&self, name: &str, nodename: Option<&str>) -> Result<RawEntity, StorageError>;
}
