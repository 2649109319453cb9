use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{CommandError, Result};

pub(crate) fn get_required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CommandError::InvalidParams(format!("missing string parameter `{key}`")))
}

pub(crate) fn get_optional_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

pub(crate) fn get_required_f32(params: &Value, key: &str) -> Result<f32> {
    params
        .get(key)
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .ok_or_else(|| CommandError::InvalidParams(format!("missing float parameter `{key}`")))
}

/// A list of strings; a lone string counts as a one-element list.
pub(crate) fn get_optional_strings(params: &Value, key: &str) -> Result<Option<Vec<String>>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(single)) => Ok(Some(vec![single.clone()])),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    CommandError::InvalidParams(format!("`{key}` must only contain strings"))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(_) => Err(CommandError::InvalidParams(format!(
            "`{key}` must be a string or a list of strings"
        ))),
    }
}

/// Deserializes `params[key]`, treating a missing key as absent.
pub(crate) fn get_optional_typed<T: DeserializeOwned>(
    params: &Value,
    key: &str,
) -> Result<Option<T>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|error| CommandError::InvalidParams(format!("`{key}`: {error}"))),
    }
}
