//! YAML-backed key/value configuration.
//!
//! [`Config`] wraps one YAML mapping. Nested mappings are reached with
//! [`Config::section`]. Strict getters fail with a [`ConfigError`] when a key
//! is missing or has the wrong type; the `_or` getters fall back to a default.

use std::fs;
use std::path::Path;

use log::warn;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// The configuration written out when no config file exists yet.
pub const DEFAULT_CONFIG: &str = include_str!("../config/default_config.yaml");

/// Errors raised while loading or reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The key is not present.
    #[error("Missing configuration key '{0}'")]
    Missing(String),

    /// The key is present but holds a value of another type.
    #[error("Expected type {expected} for key '{key}' but found {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The value has the right type but is not usable.
    #[error("Invalid value for key '{key}': {reason}")]
    Invalid { key: String, reason: String },

    /// The config file could not be read or created.
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid YAML.
    #[error("Config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A scope of configuration values.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: Mapping,
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// If the file does not exist, [`DEFAULT_CONFIG`] is written there first.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, DEFAULT_CONFIG)?;
            warn!("No config found, wrote defaults to {}", path.display());
        }
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse configuration from YAML text. An empty document is an empty config.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        match serde_yaml::from_str::<Value>(text)? {
            Value::Mapping(values) => Ok(Self { values }),
            Value::Null => Ok(Self::default()),
            other => Err(ConfigError::WrongType {
                key: String::from("<root>"),
                expected: "Mapping",
                found: type_name(&other),
            }),
        }
    }

    fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Fetch a nested section.
    pub fn section(&self, key: &str) -> Result<Config, ConfigError> {
        match self.value(key) {
            Some(Value::Mapping(values)) => Ok(Config { values: values.clone() }),
            Some(other) => Err(wrong_type(key, "Config Section", other)),
            None => Err(ConfigError::Missing(key.to_string())),
        }
    }

    /// Fetch a nested section, or an empty one if it is absent.
    pub fn section_or_empty(&self, key: &str) -> Config {
        self.section(key).unwrap_or_default()
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        match self.value(key) {
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(wrong_type(key, "Boolean", other)),
            None => Err(ConfigError::Missing(key.to_string())),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64, ConfigError> {
        match self.value(key) {
            Some(value @ Value::Number(n)) => n.as_i64().ok_or_else(|| wrong_type(key, "Integer", value)),
            Some(other) => Err(wrong_type(key, "Integer", other)),
            None => Err(ConfigError::Missing(key.to_string())),
        }
    }

    pub fn get_string(&self, key: &str) -> Result<String, ConfigError> {
        match self.value(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(wrong_type(key, "String", other)),
            None => Err(ConfigError::Missing(key.to_string())),
        }
    }

    /// Fetch a list of strings. Non-string entries are a type error.
    pub fn get_string_list(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        match self.value(key) {
            Some(Value::Sequence(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(wrong_type(key, "String", other)),
                })
                .collect(),
            Some(other) => Err(wrong_type(key, "List", other)),
            None => Err(ConfigError::Missing(key.to_string())),
        }
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        or_default(self.get_bool(key), default)
    }

    pub fn get_int_or(&self, key: &str, default: i64) -> i64 {
        or_default(self.get_int(key), default)
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        or_default(self.get_string(key), default.to_string())
    }

    pub fn get_string_list_or(&self, key: &str, default: Vec<String>) -> Vec<String> {
        or_default(self.get_string_list(key), default)
    }
}

// A missing key silently takes the default; a mistyped one is worth a warning.
fn or_default<T>(result: Result<T, ConfigError>, default: T) -> T {
    match result {
        Ok(value) => value,
        Err(ConfigError::Missing(_)) => default,
        Err(e) => {
            warn!("{e}, using default");
            default
        }
    }
}

fn wrong_type(key: &str, expected: &'static str, found: &Value) -> ConfigError {
    ConfigError::WrongType {
        key: key.to_string(),
        expected,
        found: type_name(found),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "Boolean",
        Value::Number(n) if n.is_f64() => "Float",
        Value::Number(n) if n.is_u64() && !n.is_i64() => "Unsigned",
        Value::Number(_) => "Integer",
        Value::String(_) => "String",
        Value::Sequence(_) => "List",
        Value::Mapping(_) => "Config Section",
        Value::Tagged(_) => "Tagged",
    }
}
