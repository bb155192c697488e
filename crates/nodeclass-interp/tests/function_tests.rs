//! Inventory function tests.
//!
//! Covers: `get`, `list`, `aggregate` and `print` through function
//! references, error kinds, test substitution of the registry, and
//! the sandboxed expression language.

use nodeclass_interp::*;
use serde_json::{json, Value};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn inventory() -> Inventory {
    let mut inv = Inventory::new();
    inv.insert("db1".into(), json!({"role": "db", "ip": "10.0.0.1"}));
    inv.insert("web1".into(), json!({"role": "web", "ip": "10.0.0.5"}));
    inv.insert("db2".into(), json!({"role": "db", "ip": "10.0.0.2"}));
    inv
}

fn call(raw: &str) -> Result<Value> {
    let interp = Interpolator::new(InterpolationOptions::default()).expect("default options");
    let inv = inventory();
    interp.render(&json!(raw), &json!({}), FunctionMode::Evaluate(&inv))
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ─────────────────────────────────────────────────────────────────────
// list / aggregate
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_list_filters_in_inventory_order() {
    let out = List
        .execute(&inventory(), &args(&["node.get('role')=='db'", "node.get('ip')"]))
        .unwrap();
    assert_eq!(out, json!(["10.0.0.1", "10.0.0.2"]));
}

#[test]
fn test_list_through_reference() {
    let out = call(r#"$[list("node.get('role')=='db'", "node.get('ip')")]"#).unwrap();
    assert_eq!(out, json!(["10.0.0.1", "10.0.0.2"]));
}

#[test]
fn test_list_with_no_matches_is_empty() {
    assert_eq!(call("$[list(node.role == 'cache', node.ip)]").unwrap(), json!([]));
}

#[test]
fn test_aggregate_maps_node_to_value() {
    let out = call("$[aggregate(node.role == 'db', node.ip)]").unwrap();
    assert_eq!(out, json!({"db1": "10.0.0.1", "db2": "10.0.0.2"}));
    let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, ["db1", "db2"]);
}

#[test]
fn test_aggregate_and_list_agree() {
    let inv = inventory();
    for (filter, extract) in [
        ("true", "node.ip"),
        ("node.role != 'db'", "node.role"),
        ("'1' in node.ip", "len(node.ip)"),
    ] {
        let list = List.execute(&inv, &args(&[filter, extract])).unwrap();
        let agg = Aggregate.execute(&inv, &args(&[filter, extract])).unwrap();
        let from_agg: Vec<Value> = agg.as_object().unwrap().values().cloned().collect();
        assert_eq!(list, Value::Array(from_agg), "{filter} / {extract}");
    }
}

#[test]
fn test_list_in_multi_part_string_is_json() {
    let out = call("ips: $[list(node.role == 'web', node.ip)]").unwrap();
    assert_eq!(out, json!(r#"ips: ["10.0.0.5"]"#));
}

// ─────────────────────────────────────────────────────────────────────
// get
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_get_extracts_from_one_node() {
    let out = Get
        .execute(&inventory(), &args(&["web1", "node.get('ip')"]))
        .unwrap();
    assert_eq!(out, json!("10.0.0.5"));
    assert_eq!(call("$[get('web1', \"node.get('ip')\")]").unwrap(), json!("10.0.0.5"));
}

#[test]
fn test_get_unknown_node_is_not_undefined_variable() {
    let err = call("$[get(nobody, node.ip)]").unwrap_err();
    assert_eq!(err.raw(), Some("$[get(nobody, node.ip)]"));
    let err = err.root();
    assert_eq!(
        *err,
        InterpolationError::Function {
            name: "get".into(),
            source: FunctionError::NodeNotFound {
                name: "nobody".into()
            },
        }
    );
    assert!(!matches!(err, InterpolationError::UndefinedVariable { .. }));
}

// ─────────────────────────────────────────────────────────────────────
// print
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_print_ignores_inventory() {
    assert_eq!(call("$[print(a,b ,  c)]").unwrap(), json!("a b c"));
    assert_eq!(call("$[print()]").unwrap(), json!(""));
}

// ─────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_wrong_argument_count() {
    let err = call("$[aggregate(true)]").unwrap_err();
    assert!(matches!(
        err.root(),
        InterpolationError::Function {
            source: FunctionError::ArgumentCount { expected: 2, found: 1, .. },
            ..
        }
    ));
}

#[test]
fn test_expression_cannot_reach_outside_node() {
    for expr in ["os.environ", "open('/etc/passwd')", "node.__class__()", "__import__('os')"] {
        let err = List.execute(&inventory(), &args(&["true", expr])).unwrap_err();
        assert!(matches!(err, FunctionError::Syntax(_)), "{expr}");
    }
}

#[test]
fn test_missing_key_in_extract() {
    let err = List
        .execute(&inventory(), &args(&["true", "node.hostname"]))
        .unwrap_err();
    assert!(matches!(err, FunctionError::Eval(_)));
}

// ─────────────────────────────────────────────────────────────────────
// Registry substitution
// ─────────────────────────────────────────────────────────────────────

struct Count;

impl Function for Count {
    fn execute(&self, inventory: &Inventory, _args: &[String]) -> std::result::Result<Value, FunctionError> {
        Ok(json!(inventory.len()))
    }
}

#[test]
fn test_custom_registry() {
    let mut functions = FunctionRegistry::empty();
    functions.register("count", Count);
    let interp = Interpolator::with_parts(InterpolationOptions::default(), functions, Mutators::default());
    let inv = inventory();
    let ctx = json!({});

    let out = interp
        .render(&json!("$[count()]"), &ctx, FunctionMode::Evaluate(&inv))
        .unwrap();
    assert_eq!(out, json!(3));

    let err = interp
        .render(&json!("$[print(x)]"), &ctx, FunctionMode::Evaluate(&inv))
        .unwrap_err();
    assert!(matches!(err.root(), InterpolationError::UndefinedFunction { .. }));
}

#[test]
fn test_function_output_is_not_rescanned() {
    // an unclosed parameter sentinel inside arguments is plain argument text
    assert_eq!(call("$[print(${, x)]").unwrap(), json!("${ x"));

    let mut functions = FunctionRegistry::empty();
    functions.register("raw", RawRef);
    let interp = Interpolator::with_parts(InterpolationOptions::default(), functions, Mutators::default());
    let inv = inventory();
    let out = interp
        .render(&json!("$[raw()]"), &json!({"a": 1}), FunctionMode::Evaluate(&inv))
        .unwrap();
    assert_eq!(out, json!("${a}"));
}

struct RawRef;

impl Function for RawRef {
    fn execute(&self, _inventory: &Inventory, _args: &[String]) -> std::result::Result<Value, FunctionError> {
        Ok(json!("${a}"))
    }
}
