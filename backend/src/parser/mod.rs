//! Tolerant access to JSON configuration embedded as text.
//!
//! Configuration blobs are stored as JSON text, and some of their fields are
//! themselves JSON text (`extraParamFields`, sometimes `columns` or
//! `params`). This module parses such text into a [`serde_json::Value`] tree
//! and adds typed, absence-tolerant accessors through [`ValueExt`].
//!
//! # Coercion
//!
//! - [`ValueExt::string_field`]: strings verbatim, numbers and booleans as
//!   their text, arrays and objects as compact JSON text.
//! - [`ValueExt::bool_field`]: booleans; `"true"`/`"1"`/`"Y"`/`"T"` and
//!   `"false"`/`"0"`/`"N"`/`"F"` (any case); numbers are `true` only when
//!   their integer part is `1`. Anything else is `None`.
//!
//! A JSON `null` is treated exactly like a missing key.

use serde_json::{Map, Value};

use crate::error::{ParseError, ParseResult};

/// Parse JSON text from the named field.
///
/// Returns `Ok(None)` for missing, empty or whitespace-only text.
pub fn parse_json_text(field: &str, text: Option<&str>) -> ParseResult<Option<Value>> {
    let text = match text.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(None),
    };

    serde_json::from_str(text)
        .map(Some)
        .map_err(|source| ParseError::Malformed {
            field: field.to_string(),
            source,
        })
}

/// Parse JSON text that must hold an object.
///
/// A JSON `null` document counts as absent.
pub fn parse_json_object(field: &str, text: Option<&str>) -> ParseResult<Option<Map<String, Value>>> {
    match parse_json_text(field, text)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(ParseError::UnexpectedShape {
            field: field.to_string(),
            expected: "object",
        }),
    }
}

/// Render a scalar or tree the way a loosely-typed getter would.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Interpret a value as a flag.
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "y" | "t" => Some(true),
            "false" | "0" | "n" | "f" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|f| f.trunc() == 1.0),
        _ => None,
    }
}

/// Absence-tolerant accessors for configuration trees.
pub trait ValueExt {
    /// Look up a key; `None` when absent, `null`, or when `self` is not an object.
    fn field(&self, key: &str) -> Option<&Value>;

    fn has_field(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// String view of a field, see the module docs for coercion rules.
    fn string_field(&self, key: &str) -> Option<String> {
        self.field(key).and_then(coerce_string)
    }

    /// Flag view of a field, see the module docs for coercion rules.
    fn bool_field(&self, key: &str) -> Option<bool> {
        self.field(key).and_then(coerce_bool)
    }

    /// A field holding either inline JSON or JSON text.
    ///
    /// Text is parsed (empty text is `None`); other values are cloned.
    fn embedded_field(&self, key: &str) -> ParseResult<Option<Value>> {
        match self.field(key) {
            None => Ok(None),
            Some(Value::String(text)) => parse_json_text(key, Some(text)),
            Some(other) => Ok(Some(other.clone())),
        }
    }
}

impl ValueExt for Value {
    fn field(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.field(key))
    }
}

impl ValueExt for Map<String, Value> {
    fn field(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|v| !v.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_text_is_absent() {
        assert!(parse_json_text("grid", None).unwrap().is_none());
        assert!(parse_json_text("grid", Some("")).unwrap().is_none());
        assert!(parse_json_text("grid", Some("   \n")).unwrap().is_none());
    }

    #[test]
    fn test_malformed_text_names_field() {
        let err = parse_json_text("dataSource", Some("{\"bean\":")).unwrap_err();
        assert_eq!(err.field(), "dataSource");
        assert!(err.to_string().contains("Malformed JSON"));
    }

    #[test]
    fn test_object_shape_enforced() {
        let map = parse_json_object("grid", Some(r#"{"columns":[]}"#)).unwrap().unwrap();
        assert!(map.contains_key("columns"));

        assert!(parse_json_object("grid", Some("null")).unwrap().is_none());

        let err = parse_json_object("grid", Some("[1,2]")).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedShape { .. }));
    }

    #[test]
    fn test_null_is_missing() {
        let value = json!({ "bean": null, "method": "list" });
        assert!(!value.has_field("bean"));
        assert!(!value.has_field("absent"));
        assert!(value.has_field("method"));
    }

    #[test]
    fn test_string_coercion() {
        let value = json!({
            "s": "text",
            "n": 42,
            "f": 1.5,
            "b": false,
            "o": { "a": 1 },
            "l": [1, "x"]
        });
        assert_eq!(value.string_field("s").as_deref(), Some("text"));
        assert_eq!(value.string_field("n").as_deref(), Some("42"));
        assert_eq!(value.string_field("f").as_deref(), Some("1.5"));
        assert_eq!(value.string_field("b").as_deref(), Some("false"));
        assert_eq!(value.string_field("o").as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(value.string_field("l").as_deref(), Some(r#"[1,"x"]"#));
        assert_eq!(value.string_field("missing"), None);
    }

    #[test]
    fn test_bool_coercion() {
        let value = json!({
            "t": true,
            "ts": "TRUE",
            "one": "1",
            "zero": 0,
            "seven": 7,
            "fraction": 1.5,
            "yes": "Y",
            "t_flag": "t",
            "no": "N",
            "f_flag": "F",
            "junk": "maybe",
            "obj": {}
        });
        assert_eq!(value.bool_field("t"), Some(true));
        assert_eq!(value.bool_field("ts"), Some(true));
        assert_eq!(value.bool_field("one"), Some(true));
        assert_eq!(value.bool_field("zero"), Some(false));
        assert_eq!(value.bool_field("seven"), Some(false));
        assert_eq!(value.bool_field("fraction"), Some(true));
        assert_eq!(value.bool_field("yes"), Some(true));
        assert_eq!(value.bool_field("t_flag"), Some(true));
        assert_eq!(value.bool_field("no"), Some(false));
        assert_eq!(value.bool_field("f_flag"), Some(false));
        assert_eq!(value.bool_field("junk"), None);
        assert_eq!(value.bool_field("obj"), None);
        assert_eq!(value.bool_field("missing"), None);
    }

    #[test]
    fn test_embedded_field_text_or_inline() {
        let value = json!({
            "text": r#"{"queryString":"SELECT 1"}"#,
            "inline": { "queryString": "SELECT 2" },
            "empty": "",
            "broken": "{nope"
        });

        let text = value.embedded_field("text").unwrap().unwrap();
        assert_eq!(text["queryString"], "SELECT 1");

        let inline = value.embedded_field("inline").unwrap().unwrap();
        assert_eq!(inline["queryString"], "SELECT 2");

        assert!(value.embedded_field("empty").unwrap().is_none());
        assert!(value.embedded_field("missing").unwrap().is_none());

        let err = value.embedded_field("broken").unwrap_err();
        assert_eq!(err.field(), "broken");
    }

    #[test]
    fn test_non_object_has_no_fields() {
        assert!(json!([1, 2]).field("a").is_none());
        assert!(json!("text").string_field("a").is_none());
    }
}
