//! Document parsing: YAML (and JSON) text into `serde_json::Value`
//!
//! YAML is parsed with yaml-rust2 and converted to `serde_json::Value` so
//! the whole pipeline works on a single in-memory representation. A
//! document whose first non-blank character is `{` is treated as JSON and
//! parsed with serde_json directly; both formats land in the same shape.

use serde_json::{Map, Number, Value};
use yaml_rust2::{Yaml, YamlLoader};

use crate::error::Error;

/// Parse one document's text into a value.
///
/// Errors are serialization errors; callers attribute them to a source
/// locator and document ordinal.
pub(crate) fn parse_document(content: &str) -> Result<Value, Error> {
    if content.trim_start().starts_with('{') {
        return serde_json::from_str(content).map_err(|e| Error::serialization(e.to_string()));
    }
    let docs =
        YamlLoader::load_from_str(content).map_err(|e| Error::serialization(e.to_string()))?;
    match docs.into_iter().next() {
        Some(doc) => yaml_to_value(doc),
        None => Ok(Value::Null),
    }
}

fn yaml_to_value(yaml: Yaml) -> Result<Value, Error> {
    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Boolean(b) => Value::Bool(b),
        Yaml::Integer(i) => Value::Number(i.into()),
        Yaml::Real(text) => {
            let parsed: f64 = text
                .parse()
                .map_err(|e| Error::serialization(format!("invalid real {text:?}: {e}")))?;
            Number::from_f64(parsed).map_or(Value::Null, Value::Number)
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Array(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Yaml::Hash(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, value) in entries {
                map.insert(yaml_key(key)?, yaml_to_value(value)?);
            }
            Value::Object(map)
        }
        Yaml::Alias(_) => return Err(Error::serialization("aliases are not supported")),
        Yaml::BadValue => return Err(Error::serialization("malformed value")),
    })
}

fn yaml_key(key: Yaml) -> Result<String, Error> {
    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(r) => Ok(r),
        Yaml::Boolean(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(Error::serialization(format!(
            "unsupported mapping key: {other:?}"
        ))),
    }
}
