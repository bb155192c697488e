//! Inventory query functions callable from function references.

use crate::error::FunctionError;
use indexmap::IndexMap;
use nodeclass_eval::{evaluate, is_truthy};
use nodeclass_parser::parse_expression;
use nodeclass_types::ast::Expr;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Node name → that node's parameters, in enumeration order.
pub type Inventory = IndexMap<String, Value>;

/// A function reachable from a function reference.
pub trait Function: Send + Sync {
    fn execute(&self, inventory: &Inventory, args: &[String]) -> Result<Value, FunctionError>;
}

/// Name → function table, built once and passed to the interpolator.
pub struct FunctionRegistry {
    functions: BTreeMap<String, Box<dyn Function>>,
}

impl FunctionRegistry {
    pub fn empty() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    /// Registry with `print`, `get`, `list` and `aggregate`.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("print", Print);
        registry.register("get", Get);
        registry.register("list", List);
        registry.register("aggregate", Aggregate);
        registry
    }

    /// Add or replace a function.
    pub fn register(&mut self, name: impl Into<String>, function: impl Function + 'static) {
        self.functions.insert(name.into(), Box::new(function));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Function> {
        self.functions.get(name).map(|f| f.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

// ── Builtins ─────────────────────────────────────────────────────────────

/// `print(a, b, ...)`: the arguments joined by single spaces.
pub struct Print;

impl Function for Print {
    fn execute(&self, _inventory: &Inventory, args: &[String]) -> Result<Value, FunctionError> {
        Ok(Value::String(args.join(" ")))
    }
}

/// `get(nodename, extract)`: evaluate `extract` against one node.
pub struct Get;

impl Function for Get {
    fn execute(&self, inventory: &Inventory, args: &[String]) -> Result<Value, FunctionError> {
        let [nodename, extract] = expect_args::<2>("get", args)?;
        let nodename = unquote(nodename);
        let extract = compile(extract)?;
        let node = inventory
            .get(nodename)
            .ok_or_else(|| FunctionError::NodeNotFound {
                name: nodename.to_string(),
            })?;
        Ok(evaluate(&extract, node)?)
    }
}

/// `list(filter, extract)`: extracted values of every matching node.
pub struct List;

impl Function for List {
    fn execute(&self, inventory: &Inventory, args: &[String]) -> Result<Value, FunctionError> {
        let query = Query::compile("list", args)?;
        let mut out = Vec::new();
        for (_, node) in inventory {
            if let Some(value) = query.run(node)? {
                out.push(value);
            }
        }
        Ok(Value::Array(out))
    }
}

/// `aggregate(filter, extract)`: node name → extracted value for every
/// matching node, in inventory order.
pub struct Aggregate;

impl Function for Aggregate {
    fn execute(&self, inventory: &Inventory, args: &[String]) -> Result<Value, FunctionError> {
        let query = Query::compile("aggregate", args)?;
        let mut out = Map::new();
        for (name, node) in inventory {
            if let Some(value) = query.run(node)? {
                out.insert(name.clone(), value);
            }
        }
        Ok(Value::Object(out))
    }
}

/// A parsed filter/extract pair.
struct Query {
    filter: Expr,
    extract: Expr,
}

impl Query {
    fn compile(function: &str, args: &[String]) -> Result<Self, FunctionError> {
        let [filter, extract] = expect_args::<2>(function, args)?;
        Ok(Self {
            filter: compile(filter)?,
            extract: compile(extract)?,
        })
    }

    fn run(&self, node: &Value) -> Result<Option<Value>, FunctionError> {
        if !is_truthy(&evaluate(&self.filter, node)?) {
            return Ok(None);
        }
        Ok(Some(evaluate(&self.extract, node)?))
    }
}

fn expect_args<'a, const N: usize>(
    function: &str,
    args: &'a [String],
) -> Result<&'a [String; N], FunctionError> {
    args.try_into().map_err(|_| FunctionError::ArgumentCount {
        function: function.to_string(),
        expected: N,
        found: args.len(),
    })
}

fn compile(arg: &str) -> Result<Expr, FunctionError> {
    Ok(parse_expression(unquote(arg))?)
}

/// Strip one pair of matching quotes wrapping the whole argument.
///
/// `"node.get('ip')"` becomes `node.get('ip')`, while `'a' + 'b'` is left
/// alone because the quote reappears inside.
fn unquote(arg: &str) -> &str {
    let arg = arg.trim();
    for q in ['\'', '"'] {
        if let Some(inner) = arg
            .strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q))
        {
            if !inner.contains(q) {
                return inner;
            }
        }
    }
    arg
}
