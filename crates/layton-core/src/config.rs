//! Project configuration stored as a JSON document in `.layton/config.json`.
//!
//! Values are addressed with dot-separated paths (`work.schedule.start`).
//! There is no locking: concurrent read-modify-write cycles from separate
//! processes can lose updates.

use crate::error::{LaytonError, Result};
use crate::{io, paths};
use serde_json::{json, Map, Value};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    data: Value,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: Value::Object(Map::new()),
        }
    }
}

impl Config {
    /// Starter document written by `layton config init`.
    pub fn default_document() -> Value {
        json!({
            "timezone": "UTC",
            "work": {
                "schedule": {
                    "start": "09:00",
                    "end": "17:00"
                }
            }
        })
    }

    pub fn from_value(data: Value) -> Self {
        match data {
            Value::Object(_) => Self { data },
            _ => Self::default(),
        }
    }

    pub fn exists(root: &Path) -> bool {
        paths::config_path(root).exists()
    }

    /// Load the project config. A missing file yields an empty document.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        match io::read_optional(&path)? {
            Some(raw) => {
                let data: Value = serde_json::from_str(&raw)?;
                Ok(Self::from_value(data))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let mut data = serde_json::to_string_pretty(&self.data)?;
        data.push('\n');
        io::atomic_write(&paths::config_path(root), data.as_bytes())
    }

    pub fn as_value(&self) -> &Value {
        &self.data
    }

    /// Look up a dotted key. Fails if any segment is missing.
    pub fn get(&self, key: &str) -> Result<&Value> {
        let mut current = &self.data;
        for segment in key.split('.') {
            current = current
                .as_object()
                .and_then(|obj| obj.get(segment))
                .ok_or_else(|| LaytonError::ConfigKeyNotFound(key.to_string()))?;
        }
        Ok(current)
    }

    /// Like [`Config::get`] but renders scalars as text and treats absence as `None`.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key).ok()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Set a dotted key, creating intermediate objects. Non-object
    /// intermediates are replaced.
    pub fn set(&mut self, key: &str, value: Value) {
        let mut current = &mut self.data;
        let mut segments = key.split('.').peekable();
        while let Some(segment) = segments.next() {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let Value::Object(obj) = current else {
                return;
            };
            if segments.peek().is_none() {
                obj.insert(segment.to_string(), value);
                return;
            }
            current = obj
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
    }

    /// Every leaf key in dot notation, in document order.
    pub fn keys(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_keys(&self.data, "", &mut out);
        out
    }
}

fn collect_keys(value: &Value, prefix: &str, out: &mut Vec<String>) {
    match value {
        Value::Object(obj) if !obj.is_empty() => {
            for (k, v) in obj {
                let path = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                collect_keys(v, &path, out);
            }
        }
        _ if !prefix.is_empty() => out.push(prefix.to_string()),
        _ => {}
    }
}

/// Interpret a CLI value: JSON when it parses, otherwise a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
