//! Config values and their conversion from TOML.

/// One configuration value.
///
/// Integers are always `i64` and floats always `f64`, whatever width the
/// source used. Lists hold scalars of a single type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    List(Vec<Value>),
}

impl Value {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "a string",
            Self::Bool(_) => "a boolean",
            Self::Integer(_) => "an integer",
            Self::Float(_) => "a float",
            Self::List(_) => "a list",
        }
    }

    /// Converts a TOML value, rejecting shapes a category/key store cannot
    /// hold. `key` only feeds error messages.
    pub(crate) fn from_toml(
        key: &str,
        value: toml::Value,
    ) -> Result<Self, crate::ConfigError> {
        match value {
            toml::Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    let scalar = Self::scalar_from_toml(key, item)?;
                    if let Some(first) = out.first() {
                        if std::mem::discriminant(first)
                            != std::mem::discriminant(&scalar)
                        {
                            return Err(unsupported(key, "mixed types in array"));
                        }
                    }
                    out.push(scalar);
                }
                Ok(Self::List(out))
            }
            other => Self::scalar_from_toml(key, other),
        }
    }

    fn scalar_from_toml(
        key: &str,
        value: toml::Value,
    ) -> Result<Self, crate::ConfigError> {
        match value {
            toml::Value::String(s) => Ok(Self::String(s)),
            toml::Value::Integer(i) => Ok(Self::Integer(i)),
            toml::Value::Float(f) => Ok(Self::Float(f)),
            toml::Value::Boolean(b) => Ok(Self::Bool(b)),
            toml::Value::Array(_) => Err(unsupported(key, "nested arrays are not supported")),
            toml::Value::Table(_) => Err(unsupported(key, "nested tables are not supported")),
            toml::Value::Datetime(_) => Err(unsupported(key, "datetimes are not supported")),
        }
    }
}

fn unsupported(key: &str, reason: &str) -> crate::ConfigError {
    crate::ConfigError::Unsupported {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;

    #[test]
    fn test_from_toml_homogeneous_array_becomes_list() {
        let v = Value::from_toml(
            "ports",
            toml::Value::Array(vec![toml::Value::Integer(1), toml::Value::Integer(2)]),
        )
        .unwrap();
        assert_eq!(v, Value::List(vec![Value::Integer(1), Value::Integer(2)]));
    }

    #[test]
    fn test_from_toml_mixed_array_is_rejected() {
        let result = Value::from_toml(
            "mixed",
            toml::Value::Array(vec![
                toml::Value::Integer(1),
                toml::Value::String("two".into()),
            ]),
        );
        assert!(matches!(result, Err(ConfigError::Unsupported { .. })));
    }

    #[test]
    fn test_from_toml_nested_array_is_rejected() {
        let result = Value::from_toml(
            "nested",
            toml::Value::Array(vec![toml::Value::Array(vec![])]),
        );
        assert!(matches!(result, Err(ConfigError::Unsupported { .. })));
    }

    #[test]
    fn test_from_vec_of_str() {
        let v: Value = vec!["a", "b"].into();
        assert_eq!(
            v,
            Value::List(vec![Value::String("a".into()), Value::String("b".into())])
        );
    }
}
