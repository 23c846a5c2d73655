//! YAML manifest parsing using yaml-rust2
//!
//! Manifests are parsed into `serde_json::Value` so typed deserialization
//! (k8s-openapi types, policy types, mesh config) goes through serde_json.

use serde_json::{Map, Number, Value};
use thiserror::Error;
use yaml_rust2::{Yaml, YamlLoader};

use crate::Error;

/// Error raised while converting YAML into JSON values
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct YamlError(String);

impl From<YamlError> for Error {
    fn from(err: YamlError) -> Self {
        Error::serialization(err.to_string())
    }
}

/// Parse the first YAML document.
///
/// Returns `Value::Null` for empty input.
pub fn parse_document(input: &str) -> Result<Value, YamlError> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| YamlError(e.to_string()))?;
    match docs.into_iter().next() {
        Some(doc) => to_json(doc),
        None => Ok(Value::Null),
    }
}

/// Parse every document of a `---` separated stream.
///
/// Empty documents (a stray `---` at the end of a kubectl dump) are dropped.
pub fn parse_documents(input: &str) -> Result<Vec<Value>, YamlError> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| YamlError(e.to_string()))?;
    let mut values = Vec::with_capacity(docs.len());
    for doc in docs {
        let value = to_json(doc)?;
        if !value.is_null() {
            values.push(value);
        }
    }
    Ok(values)
}

fn to_json(yaml: Yaml) -> Result<Value, YamlError> {
    match yaml {
        Yaml::Null => Ok(Value::Null),
        Yaml::Boolean(b) => Ok(Value::Bool(b)),
        Yaml::Integer(i) => Ok(Value::Number(i.into())),
        Yaml::Real(raw) => {
            let f: f64 = raw
                .parse()
                .map_err(|e: std::num::ParseFloatError| YamlError(format!("{}: {}", raw, e)))?;
            Ok(Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null))
        }
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Array(items) => items
            .into_iter()
            .map(to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Yaml::Hash(hash) => {
            let mut map = Map::with_capacity(hash.len());
            for (key, value) in hash {
                map.insert(key_string(key)?, to_json(value)?);
            }
            Ok(Value::Object(map))
        }
        Yaml::Alias(_) => Err(YamlError("YAML aliases not supported".to_string())),
        Yaml::BadValue => Err(YamlError("bad YAML value".to_string())),
    }
}

// Label and annotation keys can look like numbers or booleans; JSON wants strings.
fn key_string(key: Yaml) -> Result<String, YamlError> {
    match key {
        Yaml::String(s) | Yaml::Real(s) => Ok(s),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Boolean(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        _ => Err(YamlError("unsupported YAML key type".to_string())),
    }
}
