//! The `Object` composite value: an ordered field map plus a class name.

use super::Value;
use hashbrown::HashMap;

/// An ordered map from field names to Values, plus the class name used by
/// `NEW_OBJECT` and method dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    class_name: String,
    /// Insertion order is preserved for deterministic iteration (e.g. a
    /// future `Object.keys`-style native); lookups go through `index`.
    order: Vec<String>,
    fields: HashMap<String, Value>,
}

impl Object {
    /// Creates a new, empty object of the given class.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            order: Vec::new(),
            fields: HashMap::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.get(name).copied()
    }

    /// Sets a field, inserting it at the end of iteration order if new.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if !self.fields.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.fields.insert(name, value);
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Value)> {
        self.order
            .iter()
            .map(move |name| (name.as_str(), *self.fields.get(name).expect("order/fields desync")))
    }
}
