//! Decoding and typed access to tool call arguments.

use serde_json::{Map, Value};

use crate::error::BatonError;

/// Decoded key/value arguments of a tool call.
///
/// Always an object: text that is empty, malformed or not a JSON object
/// decodes to an empty mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    values: Map<String, Value>,
}

impl ToolArguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Decode the raw argument text accumulated from the stream.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(values)) => Self { values },
            Ok(other) => {
                tracing::warn!(kind = json_kind(&other), "tool arguments are not an object");
                Self::default()
            }
            Err(err) => {
                tracing::warn!(error = %err, "tool arguments failed to decode");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the raw JSON value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, BatonError> {
        self.get_str_opt(key)
            .ok_or_else(|| BatonError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// Get an integer argument.
    pub fn get_i64(&self, key: &str) -> Result<i64, BatonError> {
        self.values
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| BatonError::InvalidArgument(format!("Missing integer argument: {key}")))
    }

    /// Get a boolean argument.
    pub fn get_bool(&self, key: &str) -> Result<bool, BatonError> {
        self.values
            .get(key)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| BatonError::InvalidArgument(format!("Missing boolean argument: {key}")))
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, BatonError> {
        serde_json::from_value(Value::Object(self.values.clone())).map_err(|e| {
            BatonError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object_arguments() {
        let args = ToolArguments::parse(r#"{"agentID": "Designer", "count": 2}"#);
        assert_eq!(args.get_str("agentID").unwrap(), "Designer");
        assert_eq!(args.get_i64("count").unwrap(), 2);
    }

    #[test]
    fn malformed_arguments_decode_to_empty_mapping() {
        assert!(ToolArguments::parse(r#"{"agentID": "Desi"#).is_empty());
        assert!(ToolArguments::parse("[1, 2]").is_empty());
        assert!(ToolArguments::parse("   ").is_empty());
    }

    #[test]
    fn missing_string_is_invalid_argument() {
        let args = ToolArguments::parse("{}");
        assert!(matches!(
            args.get_str("query"),
            Err(BatonError::InvalidArgument(_))
        ));
        assert_eq!(args.get_str_opt("query"), None);
    }

    #[test]
    fn deserializes_into_struct() {
        #[derive(serde::Deserialize)]
        struct Params {
            query: String,
            limit: Option<u32>,
        }

        let params: Params = ToolArguments::parse(r#"{"query":"rust"}"#)
            .deserialize()
            .unwrap();
        assert_eq!(params.query, "rust");
        assert_eq!(params.limit, None);
    }
}
