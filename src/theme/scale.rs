//! Conversion of raw config values into flat theme scales.

use serde_yaml::{Mapping, Value};

use crate::error::{Result, UcssError};

use super::Scale;

/// Key that maps a nested group onto its parent key (`red: {DEFAULT: ..}` -> `red`).
pub const DEFAULT_KEY: &str = "DEFAULT";

/// Flatten one theme axis from its config representation.
///
/// Nested maps join their keys with `-`, sequences of scalars join with
/// `, ` (font stacks), and numbers or booleans are stringified.
pub fn scale_from_value(axis: &str, value: &Value) -> Result<Scale> {
    let mut scale = Scale::new();
    match value {
        Value::Mapping(map) => flatten_into(&mut scale, axis, None, map)?,
        Value::Null => {}
        _ => {
            return Err(UcssError::Config {
                message: format!("theme axis '{}' must be a mapping", axis),
                help: Some(format!("Write `{}: {{ key: value }}`", axis)),
            })
        }
    }
    Ok(scale)
}

fn flatten_into(scale: &mut Scale, axis: &str, prefix: Option<&str>, map: &Mapping) -> Result<()> {
    for (key, value) in map {
        let key = scalar_to_string(key).ok_or_else(|| {
            UcssError::config(format!("theme axis '{}' has a non-scalar key", axis))
        })?;

        let full_key = match prefix {
            Some(prefix) if key == DEFAULT_KEY => prefix.to_string(),
            Some(prefix) => format!("{}-{}", prefix, key),
            None => key,
        };

        match value {
            Value::Mapping(inner) => flatten_into(scale, axis, Some(&full_key), inner)?,
            Value::Sequence(items) => {
                let parts = items
                    .iter()
                    .map(scalar_to_string)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| {
                        UcssError::config(format!(
                            "theme value '{}.{}' must be a list of scalars",
                            axis, full_key
                        ))
                    })?;
                let joined = parts.join(", ");
                check_value(axis, &full_key, &joined)?;
                scale.insert(full_key, joined);
            }
            other => {
                let literal = scalar_to_string(other).ok_or_else(|| {
                    UcssError::config(format!(
                        "theme value '{}.{}' must be a string or number",
                        axis, full_key
                    ))
                })?;
                check_value(axis, &full_key, &literal)?;
                scale.insert(full_key, literal);
            }
        }
    }
    Ok(())
}

/// Theme values are emitted verbatim, so anything that could close a
/// declaration block is refused up front.
fn check_value(axis: &str, key: &str, value: &str) -> Result<()> {
    if value.is_empty() || value.contains(['{', '}', ';']) {
        return Err(UcssError::Config {
            message: format!("theme value '{}.{}' is not a valid CSS value", axis, key),
            help: Some("Values may not be empty or contain '{', '}' or ';'".to_string()),
        });
    }
    Ok(())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(src: &str) -> Value {
        serde_yaml::from_str(src).unwrap()
    }

    #[test]
    fn test_flat_scale() {
        let scale = scale_from_value("spacing", &yaml("1: 0.25rem\n2: 0.5rem")).unwrap();
        assert_eq!(scale.get("1").map(String::as_str), Some("0.25rem"));
        assert_eq!(scale.get("2").map(String::as_str), Some("0.5rem"));
    }

    #[test]
    fn test_nested_colors_flatten() {
        let scale = scale_from_value(
            "colors",
            &yaml("brand:\n  DEFAULT: '#123456'\n  light: '#abcdef'\n  500: '#555'"),
        )
        .unwrap();
        assert_eq!(scale.get("brand").map(String::as_str), Some("#123456"));
        assert_eq!(scale.get("brand-light").map(String::as_str), Some("#abcdef"));
        assert_eq!(scale.get("brand-500").map(String::as_str), Some("#555"));
    }

    #[test]
    fn test_sequence_joins() {
        let scale = scale_from_value("fontFamily", &yaml("display: [Inter, sans-serif]")).unwrap();
        assert_eq!(
            scale.get("display").map(String::as_str),
            Some("Inter, sans-serif")
        );
    }

    #[test]
    fn test_numeric_values_stringify() {
        let scale = scale_from_value("zIndex", &yaml("60: 60")).unwrap();
        assert_eq!(scale.get("60").map(String::as_str), Some("60"));
    }

    #[test]
    fn test_rejects_non_mapping_axis() {
        assert!(scale_from_value("spacing", &yaml("[1, 2]")).is_err());
    }

    #[test]
    fn test_rejects_block_breaking_value() {
        assert!(scale_from_value("colors", &yaml("evil: 'red; } body { color: red'")).is_err());
    }

    #[test]
    fn test_null_axis_is_empty() {
        let scale = scale_from_value("spacing", &Value::Null).unwrap();
        assert!(scale.is_empty());
    }
}
