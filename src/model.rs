//! Canonical data model driving the expansion.
//!
//! The model file is parsed into a generic `serde_yaml::Value` and normalized
//! into [`Value`], a closed tree of maps, sequences and scalars with string
//! keys only. The root of a [`Model`] is always a map.

use crate::constants::JSON_EXTENSIONS;
use crate::error::{Error, Result};
use crate::renderer::TemplateRenderer;
use indexmap::IndexMap;
use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_yaml::Value as YamlValue;
use std::fmt;
use std::path::Path;

/// Scalar leaf of the model.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => f.write_str(s),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A node of the normalized model.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Map(IndexMap<String, Value>),
    Sequence(Vec<Value>),
    Scalar(Scalar),
    Absent,
}

impl Value {
    /// Looks up `key` when this value is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::String(s.to_string()))
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Map(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    state.serialize_entry(key, value)?;
                }
                state.end()
            }
            Value::Sequence(items) => serializer.collect_seq(items),
            Value::Scalar(scalar) => scalar.serialize(serializer),
            Value::Absent => serializer.serialize_none(),
        }
    }
}

/// The root of the data tree. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    root: Value,
}

impl Model {
    /// Wraps a normalized value; the value must be a map.
    pub fn new(root: Value) -> Result<Self> {
        if matches!(root, Value::Map(_)) {
            Ok(Self { root })
        } else {
            Err(Error::ModelError(format!(
                "the model root must be a map, found {}",
                kind_name(&root)
            )))
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Renders every templated string of the model once.
    ///
    /// Strings containing `{{` or `{%` are rendered with the nearest enclosing
    /// map as context; `root` refers to the model as it was before this pass.
    pub fn interpolate(&self, renderer: &dyn TemplateRenderer) -> Result<Model> {
        let root = interpolate_value(&self.root, &self.root, "model", renderer)?;
        Ok(Model { root })
    }
}

impl TryFrom<YamlValue> for Model {
    type Error = Error;

    fn try_from(value: YamlValue) -> Result<Self> {
        normalize(value)
    }
}

fn interpolate_value(
    value: &Value,
    scope: &Value,
    key_path: &str,
    renderer: &dyn TemplateRenderer,
) -> Result<Value> {
    match value {
        Value::Scalar(Scalar::String(s)) if s.contains("{{") || s.contains("{%") => {
            debug!("Interpolating {key_path}");
            let rendered = renderer.render(key_path, s, scope)?;
            Ok(Value::Scalar(Scalar::String(rendered)))
        }
        Value::Map(map) => {
            let mut rendered = IndexMap::with_capacity(map.len());
            for (key, item) in map {
                let path = format!("{key_path}.{key}");
                rendered.insert(key.clone(), interpolate_value(item, value, &path, renderer)?);
            }
            Ok(Value::Map(rendered))
        }
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                interpolate_value(item, scope, &format!("{key_path}[{i}]"), renderer)
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Sequence),
        _ => Ok(value.clone()),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Map(_) => "a map",
        Value::Sequence(_) => "a sequence",
        Value::Scalar(_) => "a scalar",
        Value::Absent => "nothing",
    }
}

/// Converts a parsed model document into the canonical [`Model`].
///
/// Map keys of any type are coerced to strings, tags are dropped and nested
/// collections are normalized recursively.
///
/// # Errors
/// * `Error::ModelError` if the document root is not a map
pub fn normalize(value: YamlValue) -> Result<Model> {
    Model::new(normalize_value(value)?)
}

fn normalize_value(value: YamlValue) -> Result<Value> {
    Ok(match value {
        YamlValue::Null => Value::Absent,
        YamlValue::Bool(b) => Value::Scalar(Scalar::Bool(b)),
        YamlValue::Number(n) => Value::Scalar(number(&n)),
        YamlValue::String(s) => Value::Scalar(Scalar::String(s)),
        YamlValue::Sequence(items) => {
            Value::Sequence(items.into_iter().map(normalize_value).collect::<Result<_>>()?)
        }
        YamlValue::Mapping(mapping) => {
            let mut map = IndexMap::with_capacity(mapping.len());
            for (key, item) in mapping {
                map.insert(key_to_string(key)?, normalize_value(item)?);
            }
            Value::Map(map)
        }
        YamlValue::Tagged(tagged) => normalize_value(tagged.value)?,
    })
}

fn number(n: &serde_yaml::Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        Scalar::Integer(i)
    } else if let Some(x) = n.as_f64() {
        Scalar::Float(x)
    } else {
        Scalar::String(n.to_string())
    }
}

fn key_to_string(key: YamlValue) -> Result<String> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        YamlValue::Tagged(tagged) => key_to_string(tagged.value),
        composite => serde_yaml::to_string(&composite)
            .map(|s| s.trim_end().to_string())
            .map_err(|e| Error::ModelError(format!("unsupported map key: {e}"))),
    }
}

/// Reads and normalizes a model file.
///
/// Files with a `.json` extension are parsed as JSON, anything else as YAML.
///
/// # Errors
/// * `Error::ConfigError` if the file cannot be read or parsed
/// * `Error::ModelError` if its root is not a map
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Model> {
    let path = path.as_ref();
    debug!("Loading model from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::ConfigError(format!("cannot read model file '{}': {e}", path.display()))
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| JSON_EXTENSIONS.contains(&ext));

    let document: YamlValue = if is_json {
        serde_json::from_str(&content).map_err(|e| {
            Error::ConfigError(format!("invalid JSON in '{}': {e}", path.display()))
        })?
    } else {
        serde_yaml::from_str(&content).map_err(|e| {
            Error::ConfigError(format!("invalid YAML in '{}': {e}", path.display()))
        })?
    };

    normalize(document)
}
