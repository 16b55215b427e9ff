//! The [`Config`] store: loading, merging, and typed reads.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::{ConfigError, Value};

/// Environment variable that switches convenience reads to strict mode
/// when set to `1`.
pub const PRODUCTION_ENV_VAR: &str = "IS_PRODUCTION";

/// Category holding keys defined at the top level of a TOML file.
const ROOT_CATEGORY: &str = "";

/// What a convenience read does when the value is missing or mistyped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Return the zero value and log the problem.
    #[default]
    Lenient,
    /// Treat the bad read as fatal (panic).
    Strict,
}

impl Strictness {
    /// `Strict` if `IS_PRODUCTION=1`, `Lenient` otherwise.
    pub fn from_env() -> Self {
        match std::env::var(PRODUCTION_ENV_VAR) {
            Ok(v) if v == "1" => Self::Strict,
            _ => Self::Lenient,
        }
    }
}

/// Category/key configuration.
///
/// Build it with [`Config::multi_load`] (or [`Config::from_toml_str`] in
/// tests), validate what you need at start-up, then share it read-only.
#[derive(Debug, Clone, Default)]
pub struct Config {
    categories: BTreeMap<String, BTreeMap<String, Value>>,
    strictness: Strictness,
}

impl Config {
    /// An empty, lenient config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses TOML text. Top-level tables become categories; top-level
    /// scalars land in the root category `""`.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, "<inline>")
    }

    fn parse(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let table: toml::Table =
            toml::from_str(text).map_err(|source| ConfigError::Parse {
                origin: origin.to_string(),
                source,
            })?;

        let mut config = Self::new();
        for (name, value) in table {
            match value {
                toml::Value::Table(entries) => {
                    let category = config.categories.entry(name.clone()).or_default();
                    for (key, value) in entries {
                        let full_key = format!("{name}.{key}");
                        category.insert(key, Value::from_toml(&full_key, value)?);
                    }
                }
                other => {
                    let value = Value::from_toml(&name, other)?;
                    config
                        .categories
                        .entry(ROOT_CATEGORY.to_string())
                        .or_default()
                        .insert(name, value);
                }
            }
        }
        Ok(config)
    }

    /// Reads a TOML file and merges it over this config.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layer = Self::parse(&text, &path.display().to_string())?;
        self.merge(layer);
        tracing::debug!(path = %path.display(), "config file loaded");
        Ok(())
    }

    /// Loads `common.toml`, then `{name}.toml`, then `{name}.override.toml`
    /// if it exists, each merged over the previous. The first two are
    /// required.
    pub fn multi_load(
        dir: impl AsRef<Path>,
        name: &str,
    ) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let mut config = Self::new();
        config.load(dir.join("common.toml"))?;
        config.load(dir.join(format!("{name}.toml")))?;

        let override_path = dir.join(format!("{name}.override.toml"));
        if override_path.exists() {
            config.load(&override_path)?;
        }
        Ok(config)
    }

    /// Merges `other` over `self`: categories are combined key by key,
    /// and where both define a key, `other` wins. Strictness is kept.
    pub fn merge(&mut self, other: Config) {
        for (name, entries) in other.categories {
            self.categories.entry(name).or_default().extend(entries);
        }
    }

    /// Sets one value, creating the category if needed.
    pub fn set(
        &mut self,
        category: &str,
        key: &str,
        value: impl Into<Value>,
    ) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Returns this config with the given strictness.
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// How convenience reads treat bad values.
    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// The raw value at `category.key`.
    pub fn value(&self, category: &str, key: &str) -> Result<&Value, ConfigError> {
        let entries = self
            .categories
            .get(category)
            .ok_or_else(|| ConfigError::MissingCategory(category.to_string()))?;
        entries.get(key).ok_or_else(|| ConfigError::MissingKey {
            category: category.to_string(),
            key: key.to_string(),
        })
    }

    // -- Fallible reads --

    /// Reads a string.
    pub fn str(&self, category: &str, key: &str) -> Result<String, ConfigError> {
        match self.value(category, key)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(wrong_type(category, key, "a string", other)),
        }
    }

    /// Reads a boolean.
    pub fn bool(&self, category: &str, key: &str) -> Result<bool, ConfigError> {
        match self.value(category, key)? {
            Value::Bool(b) => Ok(*b),
            other => Err(wrong_type(category, key, "a boolean", other)),
        }
    }

    /// Reads an integer.
    pub fn int(&self, category: &str, key: &str) -> Result<i64, ConfigError> {
        match self.value(category, key)? {
            Value::Integer(i) => Ok(*i),
            other => Err(wrong_type(category, key, "an integer", other)),
        }
    }

    /// Reads a float. Integers are not widened.
    pub fn float(&self, category: &str, key: &str) -> Result<f64, ConfigError> {
        match self.value(category, key)? {
            Value::Float(f) => Ok(*f),
            other => Err(wrong_type(category, key, "a float", other)),
        }
    }

    /// Reads a list of strings. An empty list satisfies any list read.
    pub fn str_list(
        &self,
        category: &str,
        key: &str,
    ) -> Result<Vec<String>, ConfigError> {
        self.list(category, key, "a list of strings", |v| match v {
            Value::String(s) => Some(s.clone()),
            _ => None,
        })
    }

    /// Reads a list of booleans.
    pub fn bool_list(
        &self,
        category: &str,
        key: &str,
    ) -> Result<Vec<bool>, ConfigError> {
        self.list(category, key, "a list of booleans", |v| match v {
            Value::Bool(b) => Some(*b),
            _ => None,
        })
    }

    /// Reads a list of integers.
    pub fn int_list(
        &self,
        category: &str,
        key: &str,
    ) -> Result<Vec<i64>, ConfigError> {
        self.list(category, key, "a list of integers", |v| match v {
            Value::Integer(i) => Some(*i),
            _ => None,
        })
    }

    /// Reads a list of floats.
    pub fn float_list(
        &self,
        category: &str,
        key: &str,
    ) -> Result<Vec<f64>, ConfigError> {
        self.list(category, key, "a list of floats", |v| match v {
            Value::Float(f) => Some(*f),
            _ => None,
        })
    }

    fn list<T>(
        &self,
        category: &str,
        key: &str,
        expected: &'static str,
        pick: impl Fn(&Value) -> Option<T>,
    ) -> Result<Vec<T>, ConfigError> {
        let value = self.value(category, key)?;
        let Value::List(items) = value else {
            return Err(wrong_type(category, key, expected, value));
        };
        items
            .iter()
            .map(|item| pick(item).ok_or_else(|| wrong_type(category, key, expected, value)))
            .collect()
    }

    // -- Convenience reads --

    /// [`str`](Self::str), or `""` on error.
    ///
    /// # Panics
    /// On error when the config is [`Strictness::Strict`]; likewise for
    /// every `*_or_default` read.
    pub fn str_or_default(&self, category: &str, key: &str) -> String {
        self.or_default(self.str(category, key))
    }

    /// [`bool`](Self::bool), or `false` on error.
    pub fn bool_or_default(&self, category: &str, key: &str) -> bool {
        self.or_default(self.bool(category, key))
    }

    /// [`int`](Self::int), or `0` on error.
    pub fn int_or_default(&self, category: &str, key: &str) -> i64 {
        self.or_default(self.int(category, key))
    }

    /// [`float`](Self::float), or `0.0` on error.
    pub fn float_or_default(&self, category: &str, key: &str) -> f64 {
        self.or_default(self.float(category, key))
    }

    /// [`str_list`](Self::str_list), or an empty list on error.
    pub fn str_list_or_default(&self, category: &str, key: &str) -> Vec<String> {
        self.or_default(self.str_list(category, key))
    }

    /// [`bool_list`](Self::bool_list), or an empty list on error.
    pub fn bool_list_or_default(&self, category: &str, key: &str) -> Vec<bool> {
        self.or_default(self.bool_list(category, key))
    }

    /// [`int_list`](Self::int_list), or an empty list on error.
    pub fn int_list_or_default(&self, category: &str, key: &str) -> Vec<i64> {
        self.or_default(self.int_list(category, key))
    }

    /// [`float_list`](Self::float_list), or an empty list on error.
    pub fn float_list_or_default(&self, category: &str, key: &str) -> Vec<f64> {
        self.or_default(self.float_list(category, key))
    }

    fn or_default<T: Default>(&self, result: Result<T, ConfigError>) -> T {
        match result {
            Ok(v) => v,
            Err(e) => match self.strictness {
                Strictness::Strict => panic!("config: {e}"),
                Strictness::Lenient => {
                    tracing::warn!(error = %e, "config read failed, using zero value");
                    T::default()
                }
            },
        }
    }
}

fn wrong_type(
    category: &str,
    key: &str,
    expected: &'static str,
    found: &Value,
) -> ConfigError {
    ConfigError::WrongType {
        category: category.to_string(),
        key: key.to_string(),
        expected,
        found: found.type_name(),
    }
}

// =========================================================================
// Tests
// =========================================================================
