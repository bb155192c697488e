//! Variable environment for the query evaluator.

use nodeclass_types::ast::NODE_BINDING;
use serde_json::Value;
use std::collections::BTreeMap;

/// Read-only bindings visible to an expression.
///
/// In practice this holds exactly one entry, `node`, borrowed from the
/// inventory for the duration of one evaluation.
#[derive(Debug, Clone, Default)]
pub struct Environment<'a> {
    bindings: BTreeMap<&'static str, &'a Value>,
}

impl<'a> Environment<'a> {
    /// Create an environment with `node` bound to `parameters`.
    pub fn for_node(parameters: &'a Value) -> Self {
        let mut bindings = BTreeMap::new();
        bindings.insert(NODE_BINDING, parameters);
        Self { bindings }
    }

    /// Look up a bound name.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.bindings.get(name).copied()
    }
}
