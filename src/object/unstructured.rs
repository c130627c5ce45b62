//! Schema-agnostic resource representation
//!
//! [`Unstructured`] wraps the raw decoded mapping of a manifest whose kind
//! has no registered schema (or when the caller explicitly asked for
//! schema-agnostic decoding). Content is addressed through open key paths
//! rather than compiled-in fields.

use std::any::Any;

use serde_json::{Map, Value};

use crate::error::Error;
use crate::object::{ObjectMeta, ResourceObject, TypeMeta};

/// A resource with no compiled-in schema, backed by its raw decoded mapping
#[derive(Clone, Debug, PartialEq)]
pub struct Unstructured {
    value: Value,
}

impl Unstructured {
    /// Wrap a decoded mapping.
    ///
    /// The value is expected to be a JSON object with `apiVersion` and
    /// `kind` fields; missing identity fields read back as empty strings.
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Borrow the raw backing value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consume into the raw backing value
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Look up a nested value by dotted path (e.g. `"data.foo"` or
    /// `"spec.containers.0.image"`). Numeric segments index into arrays.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.value, |current, segment| {
            match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            }
        })
    }

    /// Set a nested value by dotted path, creating intermediate objects as
    /// needed. Refuses to touch the type identity fields.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), Error> {
        let first = path.split('.').next().unwrap_or(path);
        if first == "apiVersion" || first == "kind" {
            return Err(Error::serialization(format!(
                "field {first:?} is the object's type identity and may not be changed"
            )));
        }
        let mut current = &mut self.value;
        let segments: Vec<&str> = path.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            let map = match current {
                Value::Object(map) => map,
                other => {
                    *other = Value::Object(Map::new());
                    match other {
                        Value::Object(map) => map,
                        _ => unreachable!("just assigned an object"),
                    }
                }
            };
            if i == segments.len() - 1 {
                map.insert((*segment).to_string(), value);
                return Ok(());
            }
            current = map
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        Ok(())
    }

    fn string_map_to_value(map: &std::collections::BTreeMap<String, String>) -> Value {
        Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    /// Read a string-to-string map leniently: scalar values keep their text
    /// form (an unquoted `5` in YAML reads as `"5"`), nested values are
    /// dropped. One odd entry must not blank the map or its siblings.
    fn value_to_string_map(value: Option<&Value>) -> std::collections::BTreeMap<String, String> {
        let Some(Value::Object(map)) = value else {
            return std::collections::BTreeMap::new();
        };
        map.iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((key.clone(), text))
            })
            .collect()
    }
}

impl ResourceObject for Unstructured {
    fn type_meta(&self) -> TypeMeta {
        TypeMeta::new(
            self.value["apiVersion"].as_str().unwrap_or_default(),
            self.value["kind"].as_str().unwrap_or_default(),
        )
    }

    fn metadata(&self) -> ObjectMeta {
        // Field by field, not through a single deserialize: one malformed
        // field must not blank the name and the other maps with it.
        match self.value.get("metadata") {
            Some(meta) => ObjectMeta {
                name: meta
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                namespace: meta
                    .get("namespace")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                labels: Self::value_to_string_map(meta.get("labels")),
                annotations: Self::value_to_string_map(meta.get("annotations")),
            },
            None => ObjectMeta::default(),
        }
    }

    fn set_metadata(&mut self, metadata: ObjectMeta) {
        // Merge into the existing metadata mapping so open fields this model
        // does not know about (generateName, finalizers, ...) survive.
        let root = match &mut self.value {
            Value::Object(map) => map,
            other => {
                *other = Value::Object(Map::new());
                match other {
                    Value::Object(map) => map,
                    _ => unreachable!("just assigned an object"),
                }
            }
        };
        let meta_entry = root
            .entry("metadata".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !meta_entry.is_object() {
            *meta_entry = Value::Object(Map::new());
        }
        if let Value::Object(meta_map) = meta_entry {
            meta_map.insert("name".to_string(), Value::String(metadata.name));
            match metadata.namespace {
                Some(namespace) => {
                    meta_map.insert("namespace".to_string(), Value::String(namespace));
                }
                None => {
                    meta_map.remove("namespace");
                }
            }
            if metadata.labels.is_empty() {
                meta_map.remove("labels");
            } else {
                meta_map.insert(
                    "labels".to_string(),
                    Self::string_map_to_value(&metadata.labels),
                );
            }
            if metadata.annotations.is_empty() {
                meta_map.remove("annotations");
            } else {
                meta_map.insert(
                    "annotations".to_string(),
                    Self::string_map_to_value(&metadata.annotations),
                );
            }
        }
    }

    fn to_value(&self) -> Result<Value, Error> {
        Ok(self.value.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
