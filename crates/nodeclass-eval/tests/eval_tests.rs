//! Evaluator tests for the query language.
//!
//! Covers: node access, methods, operators, truthiness, error kinds and
//! determinism. Expressions go through the real parser.

use nodeclass_eval::{evaluate, is_truthy, EvalError};
use nodeclass_parser::parse_expression;
use serde_json::{json, Value};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn eval_on(source: &str, node: &Value) -> Result<Value, EvalError> {
    let expr = parse_expression(source).unwrap_or_else(|e| panic!("parse failed: {e}"));
    evaluate(&expr, node)
}

fn eval_ok(source: &str, node: &Value) -> Value {
    eval_on(source, node).unwrap_or_else(|e| panic!("eval of {source:?} failed: {e}"))
}

fn eval(source: &str) -> Value {
    eval_ok(source, &sample_node())
}

fn sample_node() -> Value {
    json!({
        "role": "db",
        "port": 5432,
        "weight": 1.5,
        "roles": ["db", "backup"],
        "network": {"ip": "10.0.0.5", "vlan": 20},
        "empty": "",
        "tags": {}
    })
}

// ─────────────────────────────────────────────────────────────────────
// Access
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_filter_by_role() {
    assert_eq!(eval("node.get('role')=='db'"), json!(true));
    assert_eq!(eval_ok("node.get('role')=='db'", &json!({"role": "web"})), json!(false));
}

#[test]
fn test_get_missing_key_returns_default() {
    assert_eq!(eval("node.get('missing')"), Value::Null);
    assert_eq!(eval("node.get('missing', 'none')"), json!("none"));
}

#[test]
fn test_attribute_and_subscript() {
    assert_eq!(eval("node.network.ip"), json!("10.0.0.5"));
    assert_eq!(eval("node['network']['vlan']"), json!(20));
    assert_eq!(eval("node.roles[0]"), json!("db"));
    assert_eq!(eval("node.roles[-1]"), json!("backup"));
}

#[test]
fn test_access_on_computed_values() {
    assert_eq!(eval("['a', 'b', 'c'][1]"), json!("b"));
    assert_eq!(eval("node.network.keys()[0]"), json!("ip"));
    assert_eq!(eval("(node.roles + ['extra'])[-1]"), json!("extra"));
    assert_eq!(eval("(node.role or node.empty).upper()"), json!("DB"));
}

#[test]
fn test_access_leaves_node_untouched() {
    let node = sample_node();
    eval_ok("node.network.ip", &node);
    eval_ok("node.roles[0] == 'db' and node['network']", &node);
    assert_eq!(node, sample_node());
}

#[test]
fn test_deepest_parsable_chain_evaluates() {
    let source = vec!["node.port"; 30].join(" + ");
    assert_eq!(eval(&source), json!(5432 * 30));
}

#[test]
fn test_missing_attribute_is_error() {
    assert_eq!(
        eval_on("node.nope", &sample_node()),
        Err(EvalError::MissingKey { key: "nope".into() })
    );
}

#[test]
fn test_index_out_of_range() {
    assert_eq!(
        eval_on("node.roles[5]", &sample_node()),
        Err(EvalError::IndexOutOfRange { index: 5, len: 2 })
    );
}

#[test]
fn test_keys_and_values_preserve_order() {
    assert_eq!(eval("node.network.keys()"), json!(["ip", "vlan"]));
    assert_eq!(eval("node.network.values()"), json!(["10.0.0.5", 20]));
}

#[test]
fn test_string_methods() {
    assert_eq!(eval("node.network.ip.startswith('10.')"), json!(true));
    assert_eq!(eval("node.role.endswith('x')"), json!(false));
    assert_eq!(eval("node.role.upper()"), json!("DB"));
    assert_eq!(eval("'MiXeD'.lower()"), json!("mixed"));
}

#[test]
fn test_len() {
    assert_eq!(eval("len(node.roles)"), json!(2));
    assert_eq!(eval("len(node.network)"), json!(2));
    assert_eq!(eval("len('héllo')"), json!(5));
    assert!(matches!(
        eval_on("len(node.port)", &sample_node()),
        Err(EvalError::TypeMismatch(_))
    ));
}

// ─────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_logic_returns_operand() {
    assert_eq!(eval("node.empty or 'fallback'"), json!("fallback"));
    assert_eq!(eval("node.role and node.port"), json!(5432));
    assert_eq!(eval("not node.tags"), json!(true));
}

#[test]
fn test_short_circuit_skips_failing_operand() {
    assert_eq!(eval("false and node.nope"), json!(false));
    assert_eq!(eval("true or node.nope"), json!(true));
}

#[test]
fn test_membership() {
    assert_eq!(eval("'backup' in node.roles"), json!(true));
    assert_eq!(eval("'ip' in node.network"), json!(true));
    assert_eq!(eval("'0.0' in node.network.ip"), json!(true));
    assert_eq!(eval("'web' not in node.roles"), json!(true));
}

#[test]
fn test_comparisons() {
    assert_eq!(eval("node.port > 1024"), json!(true));
    assert_eq!(eval("node.weight <= 1.5"), json!(true));
    assert_eq!(eval("'a' < 'b'"), json!(true));
    assert_eq!(eval("1 == 1.0"), json!(true));
    assert!(matches!(
        eval_on("node.role < 3", &sample_node()),
        Err(EvalError::TypeMismatch(_))
    ));
}

#[test]
fn test_arithmetic() {
    assert_eq!(eval("node.port + 1"), json!(5433));
    assert_eq!(eval("7 / 2"), json!(3.5));
    assert_eq!(eval("-7 % 3"), json!(2));
    assert_eq!(eval("'a' + 'b'"), json!("ab"));
    assert_eq!(eval("node.roles + ['x']"), json!(["db", "backup", "x"]));
}

#[test]
fn test_division_by_zero() {
    assert!(matches!(
        eval_on("1 / 0", &sample_node()),
        Err(EvalError::Arithmetic(_))
    ));
}

#[test]
fn test_integer_overflow() {
    assert!(matches!(
        eval_on("9223372036854775807 + 1", &sample_node()),
        Err(EvalError::Arithmetic(_))
    ));
}

#[test]
fn test_truthiness_of_results() {
    assert!(is_truthy(&eval("node.roles")));
    assert!(!is_truthy(&eval("node.empty")));
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_determinism_100_iterations() {
    let source = "node.get('role') == 'db' and len(node.network.keys()) > 1";
    let first = eval(source);
    for i in 0..100 {
        assert_eq!(first, eval(source), "Determinism failure at iteration {i}");
    }
}
