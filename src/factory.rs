use crate::registry::{Config, ConfigError, Registry};

pub trait Factory: Send + Sync {
    type Item: ?Sized;

    /// Returns type as a string that is used mainly for concrete component identification.
    fn ty() -> &'static str where Self: Sized;

    /// Constructs a new component by configuring it with the given config.
    fn from(&self, cfg: &Config, registry: &Registry) -> Result<Box<Self::Item>, ConfigError>;
}

/// Extracts a required string field.
pub fn string<'a>(cfg: &'a Config, field: &'static str) -> Result<&'a str, ConfigError> {
    optional_string(cfg, field)?.ok_or(ConfigError::FieldRequired(field))
}

pub fn optional_string<'a>(cfg: &'a Config, field: &'static str) ->
    Result<Option<&'a str>, ConfigError>
{
    match cfg.get(field) {
        Some(value) => {
            value.as_str()
                .map(Some)
                .ok_or(ConfigError::FieldType(field, "a string"))
        }
        None => Ok(None),
    }
}

pub fn optional_bool(cfg: &Config, field: &'static str) -> Result<Option<bool>, ConfigError> {
    match cfg.get(field) {
        Some(value) => {
            value.as_bool()
                .map(Some)
                .ok_or(ConfigError::FieldType(field, "a boolean"))
        }
        None => Ok(None),
    }
}

pub fn optional_u64(cfg: &Config, field: &'static str) -> Result<Option<u64>, ConfigError> {
    match cfg.get(field) {
        Some(value) => {
            value.as_u64()
                .map(Some)
                .ok_or(ConfigError::FieldType(field, "an unsigned integer"))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::registry::ConfigError;
    use super::{optional_bool, optional_u64, string};

    #[test]
    fn fields() {
        let cfg = json!({"name": "main", "append": false, "mode": 420});

        assert_eq!("main", string(&cfg, "name").unwrap());
        assert_eq!(Some(false), optional_bool(&cfg, "append").unwrap());
        assert_eq!(Some(420), optional_u64(&cfg, "mode").unwrap());
        assert_eq!(None, optional_u64(&cfg, "capacity").unwrap());
    }

    #[test]
    fn missing_and_mistyped() {
        let cfg = json!({"name": 42});

        match string(&cfg, "path") {
            Err(ConfigError::FieldRequired("path")) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        match string(&cfg, "name") {
            Err(ConfigError::FieldType("name", "a string")) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
