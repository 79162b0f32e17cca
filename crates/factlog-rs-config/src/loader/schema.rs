//! Key and type checks for `factlog.json5`, run before serde decoding so
//! errors name the offending field (`config:list.limit`).

use crate::ConfigError;
use serde_json::{Map, Value};

/// JSON type a leaf field must have.
#[derive(Debug, Clone, Copy)]
enum Kind {
    String,
    Bool,
    Count,
}

impl Kind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Kind::String => value.is_string(),
            Kind::Bool => value.is_boolean(),
            Kind::Count => value.is_u64(),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Kind::String => "expected string",
            Kind::Bool => "expected bool",
            Kind::Count => "expected non-negative integer",
        }
    }
}

const TOP_LEVEL: &[(&str, Kind)] = &[("$schema", Kind::String)];

const SECTIONS: &[(&str, &[(&str, Kind)])] = &[
    ("store", &[("path", Kind::String)]),
    (
        "list",
        &[
            ("limit", Kind::Count),
            ("unique", Kind::Bool),
            ("include_missing", Kind::Bool),
        ],
    ),
];

/// Validate a parsed config file: only known keys, each with the right type.
pub(super) fn validate_config_schema(value: &Value) -> Result<(), ConfigError> {
    for (key, value) in as_object(value, "root")? {
        match SECTIONS.iter().find(|(name, _)| *name == key.as_str()) {
            Some((_, fields)) => {
                for (field, value) in as_object(value, key)? {
                    check_field(fields, field, value, &format!("{key}.{field}"))?;
                }
            }
            None => check_field(TOP_LEVEL, key, value, key)?,
        }
    }
    Ok(())
}

fn check_field(
    fields: &[(&str, Kind)],
    key: &str,
    value: &Value,
    path: &str,
) -> Result<(), ConfigError> {
    match fields.iter().find(|(name, _)| *name == key) {
        Some((_, kind)) if kind.accepts(value) => Ok(()),
        Some((_, kind)) => Err(invalid_field(path, kind.expected())),
        None => Err(invalid_field(path, "unknown key")),
    }
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ConfigError> {
    value
        .as_object()
        .ok_or_else(|| invalid_field(path, "expected object"))
}

fn invalid_field(path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: format!("config:{path}"),
        message: message.to_string(),
    }
}
