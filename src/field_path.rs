//! Dotted field-path access for list records.
//!
//! Records are opaque to the list core. Sorting only ever reads a single
//! value out of a record through [`FieldAccess`], addressed by a dotted path
//! such as `"customer.email"`.
use std::cmp::Ordering;

use serde_json::Value;

/// A scalar read out of a record for comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Arrays and objects: present, but with no natural ordering.
    Composite,
}

impl FieldValue {
    fn kind_rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Number(_) => 2,
            FieldValue::Text(_) => 3,
            FieldValue::Composite => 4,
        }
    }

    /// Native ordering between values of the same kind. Strings compare
    /// byte-wise, numbers numerically; nothing is coerced across kinds.
    ///
    /// Values of different kinds are ordered by kind so the relation stays a
    /// total order, which the stable sort requires.
    pub fn native_cmp(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Number(a), FieldValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(FieldValue::Null, FieldValue::Number),
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => FieldValue::Composite,
        }
    }
}

/// Implemented by anything a list can sort.
pub trait FieldAccess {
    /// Returns the value at `path`, or `None` when any segment is missing.
    fn field(&self, path: &str) -> Option<FieldValue>;
}

impl FieldAccess for Value {
    fn field(&self, path: &str) -> Option<FieldValue> {
        lookup(self, path).map(FieldValue::from)
    }
}

impl<T: FieldAccess> FieldAccess for &T {
    fn field(&self, path: &str) -> Option<FieldValue> {
        (*self).field(path)
    }
}

/// Walk `path` one dot-separated segment at a time. Array segments are
/// addressed by index (`"items.0.name"`).
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
