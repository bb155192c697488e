//! Inventory builder tests.
//!
//! Covers: deterministic assembly under parallel loading, deferred
//! functions during assembly, function evaluation in `nodeinfo`, custom
//! parameter sources, host-vars reshaping and error attribution.

use nodeclass_interp::{FunctionError, InterpolationError, InterpolationOptions, Interpolator};
use nodeclass_inventory::*;
use serde_json::{json, Map, Value};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn interp() -> Interpolator {
    Interpolator::new(InterpolationOptions::default()).expect("default options")
}

fn node(role: &str, ip: &str) -> RawEntity {
    RawEntity {
        classes: vec![format!("role.{role}")],
        applications: vec![role.to_string()],
        parameters: json!({
            "role": role,
            "ip": ip,
            "address": "${ip}",
            "db_ips": "$[list(node.role == 'db', node.ip)]"
        })
        .as_object()
        .cloned()
        .unwrap_or_default(),
        environment: None,
    }
}

fn cluster() -> MemoryStorage {
    let mut storage = MemoryStorage::new("memory").with_default_environment("base");
    storage.add_node("db1", "db1.yml", node("db", "10.0.0.1")).unwrap();
    storage.add_node("web1", "web1.yml", node("web", "10.0.0.5")).unwrap();
    storage.add_node("db2", "db2.yml", node("db", "10.0.0.2")).unwrap();
    storage
}

// ─────────────────────────────────────────────────────────────────────
// Assembly
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_inventory_in_enumeration_order() {
    let storage = cluster();
    let interp = interp();
    let inventory = InventoryBuilder::new(&storage, &interp).build().unwrap();
    let names: Vec<_> = inventory.keys().cloned().collect();
    assert_eq!(names, ["db1", "web1", "db2"]);
    assert_eq!(inventory["web1"]["address"], json!("10.0.0.5"));
}

#[test]
fn test_functions_deferred_during_assembly() {
    let storage = cluster();
    let interp = interp();
    let inventory = InventoryBuilder::new(&storage, &interp).build().unwrap();
    assert_eq!(
        inventory["db1"]["db_ips"],
        json!("$[list(node.role == 'db', node.ip)]")
    );
}

#[test]
fn test_nodeinfo_evaluates_functions() {
    let storage = cluster();
    let interp = interp();
    let builder = InventoryBuilder::new(&storage, &interp);
    let inventory = builder.build().unwrap();
    let info = builder.nodeinfo("web1", &inventory).unwrap();
    assert_eq!(info.parameters["db_ips"], json!(["10.0.0.1", "10.0.0.2"]));
    assert_eq!(info.environment.as_deref(), Some("base"));
    assert_eq!(info.classes, ["role.web"]);
}

#[test]
fn test_parallel_build_is_deterministic() {
    let mut storage = MemoryStorage::new("memory");
    for i in 0..200 {
        let entity = RawEntity::with_parameters(json!({"id": i, "label": "node-${id}"}));
        storage.add_node(format!("n{i:03}"), format!("n{i}.yml"), entity).unwrap();
    }
    let interp = interp();
    let builder = InventoryBuilder::new(&storage, &interp).with_workers(8);
    let first = builder.build().unwrap();
    assert_eq!(first.len(), 200);
    assert_eq!(first["n042"]["label"], json!("node-42"));
    for i in 0..20 {
        assert_eq!(
            first.keys().collect::<Vec<_>>(),
            builder.build().unwrap().keys().collect::<Vec<_>>(),
            "Determinism failure at iteration {i}"
        );
    }
}

#[test]
fn test_first_failure_in_enumeration_order_reported() {
    let mut storage = MemoryStorage::new("memory");
    storage.add_node("ok", "ok.yml", RawEntity::with_parameters(json!({"a": 1}))).unwrap();
    storage.add_node("bad1", "bad1.yml", RawEntity::with_parameters(json!({"a": "${nope}"}))).unwrap();
    storage.add_node("bad2", "bad2.yml", RawEntity::with_parameters(json!({"a": "${a}"}))).unwrap();
    let interp = interp();
    let err = InventoryBuilder::new(&storage, &interp).build().unwrap_err();
    match err {
        InventoryError::Interpolation { node, source } => {
            assert_eq!(node, "bad1");
            assert_eq!(source.raw(), Some("${nope}"));
            assert_eq!(*source.root(), InterpolationError::UndefinedVariable { path: "nope".into() });
        }
        other => panic!("expected interpolation error, got {other}"),
    }
}

#[test]
fn test_nodeinfo_unknown_node() {
    let storage = cluster();
    let interp = interp();
    let err = InventoryBuilder::new(&storage, &interp)
        .nodeinfo("ghost", &Default::default())
        .unwrap_err();
    assert!(matches!(err, InventoryError::Storage(StorageError::NodeNotFound { .. })));
}

#[test]
fn test_function_error_carries_node() {
    let mut storage = MemoryStorage::new("memory");
    storage
        .add_node("a", "a.yml", RawEntity::with_parameters(json!({"peer": "$[get(zzz, node.ip)]"})))
        .unwrap();
    let interp = interp();
    let builder = InventoryBuilder::new(&storage, &interp);
    let inventory = builder.build().unwrap();
    match builder.nodeinfo("a", &inventory).unwrap_err() {
        InventoryError::Interpolation { node, source } => {
            assert_eq!(node, "a");
            assert!(matches!(
                source.root(),
                InterpolationError::Function {
                    source: FunctionError::NodeNotFound { .. },
                    ..
                }
            ));
        }
        other => panic!("expected interpolation error, got {other}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Parameter sources
// ─────────────────────────────────────────────────────────────────────

/// Overlays class parameters (in order) and then the node's own.
struct ShallowMerge;

impl ParameterSource for ShallowMerge {
    fn parameters(
        &self,
        storage: &dyn NodeStorage,
        node: &str,
        entity: &RawEntity,
    ) -> std::result::Result<Value, StorageError> {
        let mut merged = Map::new();
        for class in &entity.classes {
            merged.extend(storage.get_class(class, Some(node))?.parameters);
        }
        merged.extend(entity.parameters.clone());
        Ok(Value::Object(merged))
    }
}

#[test]
fn test_custom_parameter_source() {
    let mut storage = MemoryStorage::new("memory");
    storage
        .add_class("base", "classes/base.yml", RawEntity::with_parameters(json!({"ntp": "pool", "motd": "hi ${name}"})))
        .unwrap();
    let entity = RawEntity {
        classes: vec!["base".into()],
        parameters: json!({"name": "web1"}).as_object().cloned().unwrap_or_default(),
        ..RawEntity::default()
    };
    storage.add_node("web1", "web1.yml", entity).unwrap();

    let interp = interp();
    let inventory = InventoryBuilder::new(&storage, &interp)
        .with_parameter_source(ShallowMerge)
        .build()
        .unwrap();
    assert_eq!(inventory["web1"], json!({"ntp": "pool", "motd": "hi web1", "name": "web1"}));
}

#[test]
fn test_missing_class_propagates() {
    let mut storage = MemoryStorage::new("memory");
    let entity = RawEntity {
        classes: vec!["missing".into()],
        ..RawEntity::default()
    };
    storage.add_node("web1", "web1.yml", entity).unwrap();
    let interp = interp();
    let err = InventoryBuilder::new(&storage, &interp)
        .with_parameter_source(ShallowMerge)
        .build()
        .unwrap_err();
    assert!(matches!(err, InventoryError::Storage(StorageError::ClassNotFound { .. })));
}

// ─────────────────────────────────────────────────────────────────────
// Host vars
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_to_host_vars_injects_meta() {
    let storage = cluster();
    let interp = interp();
    let builder = InventoryBuilder::new(&storage, &interp);
    let inventory = builder.build().unwrap();
    let vars = to_host_vars(&builder.nodeinfo("db2", &inventory).unwrap());
    assert_eq!(vars["ip"], json!("10.0.0.2"));
    assert_eq!(
        vars[META_KEY],
        json!({
            "classes": ["role.db"],
            "applications": ["db"],
            "environment": "base"
        })
    );
}
