//! Script variable values and the literal token parser.
//!
//! Variables hold one of a closed set of shapes. Scalars are first-class
//! variants; structured data coming from JSON literals or tool responses is
//! kept as [`serde_json`] objects and arrays.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::ScriptError;

/// Variable bindings for one script execution, keyed by identifier.
pub type Variables = BTreeMap<String, Value>;

/// A dynamically-typed script value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    /// Integers above `i64::MAX`, e.g. on-chain ids. Only arrives through JSON
    /// input.
    Unsigned(u64),
    /// Non-integral numbers only arrive through JSON input (`vars` or tool
    /// responses); the literal parser never produces them.
    Float(f64),
    Boolean(bool),
    Null,
    Object(Map<String, JsonValue>),
    Array(Vec<JsonValue>),
}

impl Value {
    /// Render as indented JSON with object keys in sorted order.
    pub fn to_pretty_json(&self) -> String {
        let json = JsonValue::from(self.clone());
        // serde_json's default map is ordered by key.
        serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
    }

    /// Borrow the inner map when the value is a JSON object.
    pub fn as_object(&self) -> Option<&Map<String, JsonValue>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) | Self::Unsigned(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Null => "null",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
        }
    }
}

/// Template stringification: strings are inserted raw, everything else as
/// compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Unsigned(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
            Self::Object(map) => write!(f, "{}", JsonValue::Object(map.clone())),
            Self::Array(items) => write!(f, "{}", JsonValue::Array(items.clone())),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Boolean(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Self::Unsigned(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::Array(items),
            JsonValue::Object(map) => Self::Object(map),
        }
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => JsonValue::String(s),
            Value::Integer(n) => JsonValue::from(n),
            Value::Unsigned(n) => JsonValue::from(n),
            Value::Float(n) => JsonValue::from(n),
            Value::Boolean(b) => JsonValue::Bool(b),
            Value::Null => JsonValue::Null,
            Value::Object(map) => JsonValue::Object(map),
            Value::Array(items) => JsonValue::Array(items),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// Strip one pair of surrounding double quotes, if present.
///
/// No escape processing happens inside the quotes.
pub fn strip_quotes(text: &str) -> &str {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// Parse a raw `set`-style token into a typed value.
///
/// Precedence, against the trimmed token:
///
/// 1. `{...}` / `[...]` -- JSON object or array literal
/// 2. `"..."` -- string literal, quotes stripped
/// 3. ASCII digits only -- integer
/// 4. `true` / `false` (any case) -- boolean
/// 5. `null` (any case) -- null
/// 6. anything else -- the variable of that name, or the raw token as a string
pub fn parse_value(token: &str, variables: &Variables) -> Result<Value, ScriptError> {
    let token = token.trim();

    if token.starts_with('{') || token.starts_with('[') {
        let json: JsonValue = serde_json::from_str(token)
            .map_err(|e| ScriptError::validation(format!("invalid JSON literal: {e}")))?;
        return Ok(Value::from(json));
    }

    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        return Ok(Value::String(strip_quotes(token).to_string()));
    }

    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        return token.parse::<i64>().map(Value::Integer).map_err(|_| {
            ScriptError::validation(format!("integer literal out of range: {token}"))
        });
    }

    if token.eq_ignore_ascii_case("true") {
        return Ok(Value::Boolean(true));
    }
    if token.eq_ignore_ascii_case("false") {
        return Ok(Value::Boolean(false));
    }
    if token.eq_ignore_ascii_case("null") {
        return Ok(Value::Null);
    }

    Ok(variables
        .get(token)
        .cloned()
        .unwrap_or_else(|| Value::String(token.to_string())))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn vars() -> Variables {
        let mut vars = Variables::new();
        vars.insert("greeting".to_string(), Value::from("hello"));
        vars
    }

    #[test]
    fn json_object_literal() {
        let value = parse_value(r#"{"b": 2, "a": [1, 2]}"#, &vars()).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map["a"], json!([1, 2]));
        assert_eq!(map["b"], json!(2));
    }

    #[test]
    fn json_array_literal() {
        let value = parse_value("[1, \"two\"]", &vars()).unwrap();
        assert_eq!(value, Value::Array(vec![json!(1), json!("two")]));
    }

    #[test]
    fn malformed_json_is_a_validation_error() {
        let err = parse_value("{not json", &vars()).unwrap_err();
        assert_matches!(
            err,
            ScriptError::Validation(msg) if msg.starts_with("invalid JSON literal")
        );
    }

    #[test]
    fn quoted_string_keeps_placeholders() {
        let value = parse_value("\"a {{y}}\"", &vars()).unwrap();
        assert_eq!(value, Value::from("a {{y}}"));
    }

    #[test]
    fn digits_become_integers() {
        assert_eq!(parse_value(" 5 ", &vars()).unwrap(), Value::Integer(5));
        assert_eq!(parse_value("007", &vars()).unwrap(), Value::Integer(7));
    }

    #[test]
    fn signed_numbers_are_not_integers() {
        assert_eq!(parse_value("-5", &vars()).unwrap(), Value::from("-5"));
    }

    #[test]
    fn oversized_integer_is_rejected() {
        assert_matches!(
            parse_value("99999999999999999999999", &vars()),
            Err(ScriptError::Validation(_))
        );
    }

    #[test]
    fn booleans_and_null_ignore_case() {
        assert_eq!(parse_value("TRUE", &vars()).unwrap(), Value::Boolean(true));
        assert_eq!(parse_value("False", &vars()).unwrap(), Value::Boolean(false));
        assert_eq!(parse_value("Null", &vars()).unwrap(), Value::Null);
    }

    #[test]
    fn bare_word_resolves_variable_or_falls_back() {
        assert_eq!(parse_value("greeting", &vars()).unwrap(), Value::from("hello"));
        assert_eq!(parse_value("missing", &vars()).unwrap(), Value::from("missing"));
    }

    #[test]
    fn lone_quote_is_not_a_string_literal() {
        assert_eq!(parse_value("\"", &vars()).unwrap(), Value::from("\""));
    }

    #[test]
    fn pretty_json_sorts_keys() {
        let value = Value::from(json!({"zeta": 1, "alpha": {"b": 2, "a": 1}}));
        assert_eq!(
            value.to_pretty_json(),
            "{\n  \"alpha\": {\n    \"a\": 1,\n    \"b\": 2\n  },\n  \"zeta\": 1\n}"
        );
    }

    #[test]
    fn display_stringification() {
        assert_eq!(Value::Integer(5).to_string(), "5");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from(json!({"a": 1})).to_string(), "{\"a\":1}");
    }

    #[test]
    fn json_numbers_map_to_integer_or_float() {
        assert_eq!(Value::from(json!(3)), Value::Integer(3));
        assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
    }

    #[test]
    fn integers_above_i64_stay_exact() {
        let value = Value::from(json!(u64::MAX));
        assert_eq!(value, Value::Unsigned(u64::MAX));
        assert_eq!(value.kind(), "integer");
        assert_eq!(value.to_string(), "18446744073709551615");
        assert_eq!(value.to_pretty_json(), "18446744073709551615");
        assert_eq!(JsonValue::from(value), json!(u64::MAX));
    }
}
