use std::collections::{BTreeMap, HashMap};

use crate::core::Value;
use crate::decode::{RowTarget, TargetShape};

/// Dynamically typed value stored in a mapping-shaped target.
///
/// Scanned raw byte sequences are coerced to text; every other value keeps
/// its driver-native representation.
pub trait Dynamic: Sized {
    fn from_scanned(value: Value) -> Self;
}

impl Dynamic for Value {
    fn from_scanned(value: Value) -> Self {
        value.coerce_bytes_to_text()
    }
}

impl Dynamic for serde_json::Value {
    fn from_scanned(value: Value) -> Self {
        match value.coerce_bytes_to_text() {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::Value::from(i),
            // Non-finite floats have no JSON form and become null.
            Value::Float(f) => serde_json::Value::from(f),
            Value::Text(s) => serde_json::Value::String(s),
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::Blob(b) => serde_json::Value::String(String::from_utf8_lossy(&b).into_owned()),
        }
    }
}

impl<V: Dynamic> RowTarget for HashMap<String, V> {
    fn shape() -> TargetShape {
        TargetShape::Mapping
    }

    fn insert_column(&mut self, column: &str, value: Value) {
        self.insert(column.to_string(), V::from_scanned(value));
    }
}

impl<V: Dynamic> RowTarget for BTreeMap<String, V> {
    fn shape() -> TargetShape {
        TargetShape::Mapping
    }

    fn insert_column(&mut self, column: &str, value: Value) {
        self.insert(column.to_string(), V::from_scanned(value));
    }
}
