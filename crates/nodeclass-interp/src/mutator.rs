//! Mutator registry: an ordered, de-duplicating stack of value transforms.

use crate::error::{ConfigError, InterpolationError, MutatorError};
use indexmap::IndexSet;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Ordered list of unique items where pushing promotes to the front.
///
/// Pushing an item already present moves it to index 0; there is no
/// removal from outside.
#[derive(Clone)]
pub struct PriorityList<T: Eq + Hash> {
    items: IndexSet<T>,
}

impl<T: Eq + Hash + Clone> PriorityList<T> {
    pub fn new() -> Self {
        Self {
            items: IndexSet::new(),
        }
    }

    /// Push each item in turn; the last one pushed ends up first.
    pub fn push<I: IntoIterator<Item = T>>(&mut self, items: I) {
        for item in items {
            self.items.shift_remove(&item);
            self.items.shift_insert(0, item);
        }
    }

    /// Push every item of another list, in its front-to-back order.
    pub fn push_list(&mut self, other: &PriorityList<T>) {
        self.push(other.as_list());
    }

    pub fn as_list(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Eq + Hash + Clone> Default for PriorityList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for PriorityList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.push(iter);
        list
    }
}

// IndexSet equality ignores order, so compare element-wise.
impl<T: Eq + Hash> PartialEq for PriorityList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items.iter().eq(other.items.iter())
    }
}

impl<T: Eq + Hash> Eq for PriorityList<T> {}

impl<T: Eq + Hash> PartialEq<[T]> for PriorityList<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.items.iter().eq(other.iter())
    }
}

impl<T: Eq + Hash> PartialEq<Vec<T>> for PriorityList<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.items.iter().eq(other.iter())
    }
}

impl<T: Eq + Hash + fmt::Debug> fmt::Debug for PriorityList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PriorityList")
            .field(&self.items.iter().collect::<Vec<_>>())
            .finish()
    }
}

// ── Mutators ─────────────────────────────────────────────────────────────

pub type MutatorFn = fn(Value) -> Result<Value, MutatorError>;

/// A named value transform. Identity is the name.
#[derive(Clone)]
pub struct Mutator {
    name: String,
    transform: MutatorFn,
}

impl Mutator {
    pub fn new(name: impl Into<String>, transform: MutatorFn) -> Self {
        Self {
            name: name.into(),
            transform,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, value: Value) -> Result<Value, MutatorError> {
        (self.transform)(value)
    }
}

impl PartialEq for Mutator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Mutator {}

impl Hash for Mutator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for Mutator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mutator({})", self.name)
    }
}

/// Dotted name → mutator, used to resolve configured hook names.
#[derive(Debug, Clone)]
pub struct MutatorCatalog {
    entries: BTreeMap<String, Mutator>,
}

impl MutatorCatalog {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        catalog.register(Mutator::new("values.trim_strings", trim_strings));
        catalog.register(Mutator::new("values.drop_nulls", drop_nulls));
        catalog.register(Mutator::new("values.sort_keys", sort_keys));
        catalog
    }

    pub fn register(&mut self, mutator: Mutator) {
        self.entries.insert(mutator.name.clone(), mutator);
    }

    pub fn get(&self, name: &str) -> Option<&Mutator> {
        self.entries.get(name)
    }
}

impl Default for MutatorCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// The mutator stack applied to every rendered value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mutators {
    stack: PriorityList<Mutator>,
}

impl Mutators {
    pub fn new<I: IntoIterator<Item = Mutator>>(items: I) -> Self {
        Self {
            stack: items.into_iter().collect(),
        }
    }

    /// Resolve every name through `catalog`, failing on the first unknown one.
    pub fn load<S: AsRef<str>>(names: &[S], catalog: &MutatorCatalog) -> Result<Self, ConfigError> {
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let mutator = catalog
                .get(name)
                .ok_or_else(|| ConfigError::UnknownMutator(name.to_string()))?;
            resolved.push(mutator.clone());
        }
        Ok(Self::new(resolved))
    }

    pub fn push<I: IntoIterator<Item = Mutator>>(&mut self, items: I) {
        self.stack.push(items);
    }

    pub fn push_registry(&mut self, other: &Mutators) {
        self.stack.push_list(&other.stack);
    }

    pub fn as_list(&self) -> Vec<Mutator> {
        self.stack.as_list()
    }

    pub fn names(&self) -> Vec<&str> {
        self.stack.iter().map(Mutator::name).collect()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Run every mutator, most recently pushed first.
    pub fn apply(&self, mut value: Value) -> Result<Value, InterpolationError> {
        for mutator in self.stack.iter() {
            tracing::trace!(mutator = mutator.name(), "applying mutator");
            value = mutator
                .apply(value)
                .map_err(|source| InterpolationError::Mutator {
                    name: mutator.name.clone(),
                    source,
                })?;
        }
        Ok(value)
    }
}

impl PartialEq<Vec<Mutator>> for Mutators {
    fn eq(&self, other: &Vec<Mutator>) -> bool {
        self.stack == *other
    }
}

// ── Builtin transforms ───────────────────────────────────────────────────

fn map_leaves(value: Value, f: &impl Fn(Value) -> Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(|v| map_leaves(v, f)).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, map_leaves(v, f))).collect()),
        leaf => f(leaf),
    }
}

fn trim_strings(value: Value) -> Result<Value, MutatorError> {
    Ok(map_leaves(value, &|leaf| match leaf {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other,
    }))
}

fn drop_nulls(value: Value) -> Result<Value, MutatorError> {
    Ok(match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(drop_nulls)
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| drop_nulls(v).map(|v| (k, v)))
                .collect::<Result<_, _>>()?,
        ),
        other => other,
    })
}

fn sort_keys(value: Value) -> Result<Value, MutatorError> {
    Ok(match value {
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect::<Result<_, _>>()?),
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k, sort_keys(v)?);
            }
            Value::Object(sorted)
        }
        other => other,
    })
}
