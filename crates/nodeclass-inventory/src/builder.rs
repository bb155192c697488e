//! Inventory assembly and per-node rendering.

use crate::error::{InventoryError, Result, StorageError};
use crate::storage::{NodeStorage, RawEntity};
use nodeclass_interp::{FunctionMode, Interpolator, Inventory};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Key under which [`to_host_vars`] stores node metadata.
pub const META_KEY: &str = "__meta__";

/// Supplies the merged parameters for a node.
///
/// Class-hierarchy merging lives outside this crate; implement this to plug
/// it in.
pub trait ParameterSource: Send + Sync {
    fn parameters(
        &self,
        storage: &dyn NodeStorage,
        node: &str,
        entity: &RawEntity,
    ) -> std::result::Result<Value, StorageError>;
}

/// Uses the node's own parameters, without any classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnParameters;

impl ParameterSource for OwnParameters {
    fn parameters(
        &self,
        _storage: &dyn NodeStorage,
        _node: &str,
        entity: &RawEntity,
    ) -> std::result::Result<Value, StorageError> {
        Ok(Value::Object(entity.parameters.clone()))
    }
}

/// One rendered node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeInfo {
    pub name: String,
    pub classes: Vec<String>,
    pub applications: Vec<String>,
    pub environment: Option<String>,
    pub parameters: Value,
}

/// Builds the inventory from a storage backend.
pub struct InventoryBuilder<'a> {
    storage: &'a dyn NodeStorage,
    interp: &'a Interpolator,
    source: Box<dyn ParameterSource + 'a>,
    workers: usize,
}

impl<'a> InventoryBuilder<'a> {
    pub fn new(storage: &'a dyn NodeStorage, interp: &'a Interpolator) -> Self {
        Self {
            storage,
            interp,
            source: Box::new(OwnParameters),
            workers: 0,
        }
    }

    pub fn with_parameter_source(mut self, source: impl ParameterSource + 'a) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Size of the loading pool; 0 lets rayon pick.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Load and render every node, functions left unevaluated.
    ///
    /// Nodes load in parallel; the result is keyed in enumeration order and
    /// the first failure in that order is the one reported.
    pub fn build_nodes(&self) -> Result<Vec<NodeInfo>> {
        let names = self.storage.enumerate_nodes();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;
        let loaded: Vec<Result<NodeInfo>> = pool.install(|| {
            names
                .par_iter()
                .map(|name| self.load(name, FunctionMode::Defer))
                .collect()
        });
        let nodes = loaded.into_iter().collect::<Result<Vec<_>>>()?;
        tracing::info!(
            storage = self.storage.name(),
            nodes = nodes.len(),
            "assembled inventory"
        );
        Ok(nodes)
    }

    /// Node name → rendered parameters.
    pub fn build(&self) -> Result<Inventory> {
        Ok(self
            .build_nodes()?
            .into_iter()
            .map(|node| (node.name, node.parameters))
            .collect())
    }

    /// Render one node with its function references evaluated against
    /// `inventory`.
    pub fn nodeinfo(&self, name: &str, inventory: &Inventory) -> Result<NodeInfo> {
        self.load(name, FunctionMode::Evaluate(inventory))
    }

    fn load(&self, name: &str, mode: FunctionMode<'_>) -> Result<NodeInfo> {
        let span = tracing::debug_span!("node", node = %name);
        let _guard = span.enter();

        let entity = self.storage.get_node(name)?;
        let mut parameters = self.source.parameters(self.storage, name, &entity)?;
        self.interp
            .interpolate(&mut parameters, mode)
            .map_err(|source| InventoryError::Interpolation {
                node: name.to_string(),
                source,
            })?;
        tracing::debug!("rendered node");
        Ok(NodeInfo {
            name: name.to_string(),
            classes: entity.classes,
            applications: entity.applications,
            environment: entity.environment,
            parameters,
        })
    }
}

/// Node parameters with classes, applications and environment folded in
/// under [`META_KEY`].
pub fn to_host_vars(node: &NodeInfo) -> Value {
    let mut vars = match &node.parameters {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    vars.insert(
        META_KEY.to_string(),
        json!({
            "classes": node.classes,
            "applications": node.applications,
            "environment": node.environment,
        }),
    );
    Value::Object(vars)
}
