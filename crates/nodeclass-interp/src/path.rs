//! Delimited paths into nested parameter trees.

use crate::error::{InterpolationError, Result};
use serde_json::{Map, Value};
use std::fmt;

/// A parameter path such as `network:interfaces:0:ip`.
///
/// Segments index mappings by key. A segment made only of ASCII digits
/// indexes a sequence; anything else against a sequence, or any segment
/// against a scalar, is an undefined variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DictPath {
    delimiter: String,
    parts: Vec<String>,
}

impl DictPath {
    pub fn new(delimiter: &str, raw: &str) -> Self {
        Self {
            delimiter: delimiter.to_string(),
            parts: raw.split(delimiter).map(str::to_string).collect(),
        }
    }

    /// Path made of `parts` as given; segments are never split on the
    /// delimiter, so a mapping key that contains it stays one segment.
    pub fn from_parts(delimiter: &str, parts: Vec<String>) -> Self {
        Self {
            delimiter: delimiter.to_string(),
            parts,
        }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// `true` when `self` is a strict prefix of `other`.
    pub fn is_ancestor_of(&self, other: &DictPath) -> bool {
        self.parts.len() < other.parts.len() && other.parts.starts_with(&self.parts)
    }

    /// Look the path up inside `root`.
    pub fn get<'v>(&self, root: &'v Value) -> Result<&'v Value> {
        let mut current = root;
        for part in &self.parts {
            current = step(current, part).ok_or_else(|| self.undefined())?;
        }
        Ok(current)
    }

    /// Store `value` at this path, creating intermediate mappings as needed.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<()> {
        let Some((last, parents)) = self.parts.split_last() else {
            return Err(self.undefined());
        };
        let mut current = root;
        for part in parents {
            if let Value::Object(map) = current {
                if !map.contains_key(part.as_str()) {
                    map.insert(part.clone(), Value::Object(Map::new()));
                }
            }
            current = step_mut(current, part).ok_or_else(|| self.undefined())?;
        }
        match current {
            Value::Object(map) => {
                map.insert(last.clone(), value);
                Ok(())
            }
            Value::Array(items) => {
                let slot = seq_index(last)
                    .and_then(|i| items.get_mut(i))
                    .ok_or_else(|| self.undefined())?;
                *slot = value;
                Ok(())
            }
            _ => Err(self.undefined()),
        }
    }

    fn undefined(&self) -> InterpolationError {
        InterpolationError::UndefinedVariable {
            path: self.to_string(),
        }
    }
}

impl fmt::Display for DictPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join(&self.delimiter))
    }
}

fn seq_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn step<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => seq_index(segment).and_then(|i| items.get(i)),
        _ => None,
    }
}

fn step_mut<'v>(value: &'v mut Value, segment: &str) -> Option<&'v mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => seq_index(segment).and_then(|i| items.get_mut(i)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> DictPath {
        DictPath::new(":", raw)
    }

    #[test]
    fn test_get_nested() {
        let ctx = json!({"a": {"b": {"c": 3}}});
        assert_eq!(path("a:b:c").get(&ctx), Ok(&json!(3)));
        assert_eq!(path("a:b").get(&ctx), Ok(&json!({"c": 3})));
    }

    #[test]
    fn test_numeric_segment_indexes_sequence() {
        let ctx = json!({"ips": ["10.0.0.1", "10.0.0.2"]});
        assert_eq!(path("ips:1").get(&ctx), Ok(&json!("10.0.0.2")));
        assert!(path("ips:2").get(&ctx).is_err());
        assert!(path("ips:-1").get(&ctx).is_err());
        assert!(path("ips:+1").get(&ctx).is_err());
    }

    #[test]
    fn test_numeric_segment_is_a_key_in_mappings() {
        let ctx = json!({"ports": {"0": "zero"}});
        assert_eq!(path("ports:0").get(&ctx), Ok(&json!("zero")));
    }

    #[test]
    fn test_missing_reports_full_path() {
        let ctx = json!({"a": 1});
        assert_eq!(
            path("a:b:c").get(&ctx),
            Err(InterpolationError::UndefinedVariable {
                path: "a:b:c".into()
            })
        );
    }

    #[test]
    fn test_set_creates_intermediate_mappings() {
        let mut ctx = json!({});
        path("a:b").set(&mut ctx, json!(1)).unwrap();
        assert_eq!(ctx, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_set_into_sequence() {
        let mut ctx = json!({"l": [1, 2]});
        path("l:0").set(&mut ctx, json!("x")).unwrap();
        assert_eq!(ctx, json!({"l": ["x", 2]}));
        assert!(path("l:5").set(&mut ctx, json!(0)).is_err());
    }

    #[test]
    fn test_ancestry() {
        assert!(path("a").is_ancestor_of(&path("a:b")));
        assert!(!path("a:b").is_ancestor_of(&path("a:b")));
        assert!(!path("a:b").is_ancestor_of(&path("a")));
        assert!(!path("ab").is_ancestor_of(&path("a:b")));
    }

    #[test]
    fn test_display_rejoins() {
        assert_eq!(DictPath::new(".", "a.b.0").to_string(), "a.b.0");
    }

    #[test]
    fn test_from_parts_keeps_delimiter_inside_segment() {
        let whole = DictPath::from_parts(":", vec!["http:port".into()]);
        assert_eq!(whole.parts(), ["http:port"]);
        assert_ne!(whole, path("http:port"));
        let ctx = json!({"http:port": 80});
        assert_eq!(whole.get(&ctx), Ok(&json!(80)));
        assert!(path("http:port").get(&ctx).is_err());

        let mut out = json!({});
        whole.set(&mut out, json!(81)).unwrap();
        assert_eq!(out, json!({"http:port": 81}));
    }
}
