//! The associative representation generated classes serialize to.
//!
//! [`Value`] mirrors the subset of Godot's `Variant` that the generated
//! `to_dictionary`/`from_dictionary` functions exchange: nil, bool, int,
//! float, String, Array and Dictionary. [`codec`] models those generated
//! functions over a schema, so the emitted semantics can be exercised from
//! Rust.
//!
//! Conversion to and from JSON follows Godot's `JSON` class: every JSON
//! number parses as a float, which is why the generated decoder coerces
//! integer fields with `int(...)`.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

pub mod codec;

use codec::Object;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Array(Vec<Value>),
    Dictionary(Dictionary),
    /// An instance of a generated class held by reference, as map values are.
    Object(Box<Object>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "String",
            Value::Array(_) => "Array",
            Value::Dictionary(_) => "Dictionary",
            Value::Object(_) => "Object",
        }
    }

    /// Parse JSON the way Godot does: numbers become floats.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => {
                let mut dict = Dictionary::new();
                for (k, v) in map {
                    dict.insert(Value::Text(k.clone()), Value::from_json(v));
                }
                Value::Dictionary(dict)
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Serializing into serde_json::Value only fails for non-string keys,
        // which `Serialize` below already stringifies.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<Dictionary> for Value {
    fn from(d: Dictionary) -> Self {
        Value::Dictionary(d)
    }
}

/// Insertion-ordered dictionary with arbitrary `Value` keys, like Godot's.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    entries: Vec<(Value, Value)>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; replacing keeps the original position.
    pub fn insert(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.insert(Value::Text(key.to_string()), value);
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Lookup by string key, the form every wire name takes.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| matches!(k, Value::Text(t) if t == key))
            .map(|(_, v)| v)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get_str(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dictionary(dict) => dict.serialize(serializer),
            Value::Object(obj) => serializer.serialize_str(&format!("<{}>", obj.class_name())),
        }
    }
}

impl Serialize for Dictionary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            // JSON object keys are strings; Godot's JSON.stringify does the same.
            match k {
                Value::Text(s) => map.serialize_entry(s, v)?,
                other => map.serialize_entry(&key_string(other), v)?,
            }
        }
        map.end()
    }
}

pub(crate) fn key_string(key: &Value) -> String {
    match key {
        Value::Nil => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        other => other.to_json().to_string(),
    }
}
