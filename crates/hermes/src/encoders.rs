//! Built-in body and query serializers.
//!
//! The `json`, `flat_form`, `multipart_field` and `repeated_query` functions
//! are the defaults installed in every [`SerializerRegistry`]. The bracket
//! variants render `key[]=value` / `key[sub]=value` notation and can be
//! registered in their place.
//!
//! [`SerializerRegistry`]: crate::SerializerRegistry

use serde_json::Value;

use crate::error::BoxError;
use crate::query::QueryParams;

/// Serializes any value with `serde_json`.
pub fn json(value: &Value) -> Result<String, BoxError> {
    Ok(serde_json::to_string(value)?)
}

/// Flat `key=value&...` form encoding.
///
/// Arrays become repeated keys (`key=a&key=b`). Nested objects or arrays
/// inside arrays are rejected.
///
/// # Example
///
/// ```
/// use serde_json::json;
///
/// let body = hermes::encoders::flat_form(&json!({"username": "Jefte", "age": 22})).unwrap();
/// assert_eq!(body, "username=Jefte&age=22");
/// ```
pub fn flat_form(value: &Value) -> Result<String, BoxError> {
    let map = value
        .as_object()
        .ok_or("form payload must be an object")?;

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push(encode_pair(key, &scalar(key, item)?));
                }
            }
            other => pairs.push(encode_pair(key, &scalar(key, other)?)),
        }
    }

    Ok(pairs.join("&"))
}

/// Renders one multipart text field value.
///
/// Strings are sent verbatim, numbers and booleans via their display form,
/// `null` as an empty string, and anything else as JSON text.
pub fn multipart_field(value: &Value) -> Result<String, BoxError> {
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => serde_json::to_string(other)?,
    })
}

/// Default query encoding: arrays become repeated keys.
pub fn repeated_query(params: &QueryParams) -> Result<String, BoxError> {
    let pairs: Vec<String> = params
        .iter()
        .flat_map(|(key, value)| value.values().iter().map(move |v| encode_pair(key, v)))
        .collect();
    Ok(pairs.join("&"))
}

/// Bracket-notation form encoding.
///
/// Arrays of scalars render as `key[]=a&key[]=b`, nested objects as
/// `key[sub]=v`, arrays of objects as `key[0][sub]=v`. Keys that already end
/// in `[]` are not suffixed again.
///
/// # Example
///
/// ```
/// use serde_json::json;
///
/// let body = hermes::encoders::bracket_form(&json!({
///     "usernames": ["Jefte"],
///     "user": {"age": 22}
/// }))
/// .unwrap();
/// assert_eq!(body, "usernames%5B%5D=Jefte&user%5Bage%5D=22");
/// ```
pub fn bracket_form(value: &Value) -> Result<String, BoxError> {
    let map = value
        .as_object()
        .ok_or("form payload must be an object")?;

    let mut pairs = Vec::new();
    for (key, value) in map {
        flatten_brackets(key, value, &mut pairs)?;
    }
    Ok(pairs.join("&"))
}

/// Bracket-notation query encoding: array values render as `key[]=v`.
pub fn bracket_query(params: &QueryParams) -> Result<String, BoxError> {
    let mut pairs = Vec::new();
    for (key, value) in params.iter() {
        if value.is_many() {
            let key = array_key(key);
            for v in value.values() {
                pairs.push(encode_pair(&key, v));
            }
        } else {
            for v in value.values() {
                pairs.push(encode_pair(key, v));
            }
        }
    }
    Ok(pairs.join("&"))
}

fn flatten_brackets(key: &str, value: &Value, pairs: &mut Vec<String>) -> Result<(), BoxError> {
    match value {
        Value::Object(map) => {
            for (sub, value) in map {
                flatten_brackets(&format!("{key}[{sub}]"), value, pairs)?;
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                if item.is_object() || item.is_array() {
                    flatten_brackets(&format!("{key}[{index}]"), item, pairs)?;
                } else {
                    pairs.push(encode_pair(&array_key(key), &scalar(key, item)?));
                }
            }
        }
        other => pairs.push(encode_pair(key, &scalar(key, other)?)),
    }
    Ok(())
}

fn array_key(key: &str) -> String {
    if key.ends_with("[]") {
        key.to_string()
    } else {
        format!("{key}[]")
    }
}

fn scalar(key: &str, value: &Value) -> Result<String, BoxError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => {
            Err(format!("nested value for `{key}` needs a custom serializer").into())
        }
    }
}

fn encode_pair(key: &str, value: &str) -> String {
    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryValue;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_flat_form_preserves_order() {
        let body = flat_form(&json!({"username": "Jefte", "age": 22, "admin": false})).unwrap();
        assert_eq!(body, "username=Jefte&age=22&admin=false");
    }

    #[test]
    fn test_flat_form_repeats_array_keys() {
        let body = flat_form(&json!({"ids": [1, 2], "name": "a b"})).unwrap();
        assert_eq!(body, "ids=1&ids=2&name=a%20b");
    }

    #[test]
    fn test_flat_form_rejects_nested_objects() {
        let err = flat_form(&json!({"user": {"name": "Jefte"}})).unwrap_err();
        assert!(err.to_string().contains("user"));
    }

    #[test]
    fn test_flat_form_rejects_non_object() {
        assert!(flat_form(&json!(["a"])).is_err());
    }

    #[test]
    fn test_flat_form_round_trips_through_form_parser() {
        let body = flat_form(&json!({"username": "Jefte", "age": 22})).unwrap();
        let parsed: Vec<(String, String)> = serde_urlencoded::from_str(&body).unwrap();
        assert_eq!(
            parsed,
            vec![
                ("username".to_string(), "Jefte".to_string()),
                ("age".to_string(), "22".to_string()),
            ]
        );
    }

    #[test]
    fn test_bracket_form() {
        let body = bracket_form(&json!({
            "usernames": ["Jefte"],
            "emails[]": "jefteamorim@gmail.com",
            "age": 22,
        }))
        .unwrap();
        let parsed: Vec<(String, String)> = serde_urlencoded::from_str(&body).unwrap();
        assert_eq!(
            parsed,
            vec![
                ("usernames[]".to_string(), "Jefte".to_string()),
                ("emails[]".to_string(), "jefteamorim@gmail.com".to_string()),
                ("age".to_string(), "22".to_string()),
            ]
        );
    }

    #[test]
    fn test_bracket_form_nested() {
        let body = bracket_form(&json!({"items": [{"id": 1}], "meta": {"page": 2}})).unwrap();
        let parsed: Vec<(String, String)> = serde_urlencoded::from_str(&body).unwrap();
        assert_eq!(
            parsed,
            vec![
                ("items[0][id]".to_string(), "1".to_string()),
                ("meta[page]".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_bracket_query() {
        let mut params = QueryParams::new();
        params.push("ids", vec!["1"]);
        params.push("usernames[]", "jefte");
        params.push("page", "2");

        let encoded = bracket_query(&params).unwrap();
        assert_eq!(encoded, "ids%5B%5D=1&usernames%5B%5D=jefte&page=2");
    }

    #[test]
    fn test_repeated_query() {
        let mut params = QueryParams::new();
        params.push("orderBy", "id");
        params.push("ids", QueryValue::Many(vec!["1".into(), "2".into()]));

        assert_eq!(repeated_query(&params).unwrap(), "orderBy=id&ids=1&ids=2");
    }

    #[test]
    fn test_multipart_field_rendering() {
        assert_eq!(multipart_field(&json!("jefte")).unwrap(), "jefte");
        assert_eq!(multipart_field(&json!(22)).unwrap(), "22");
        assert_eq!(multipart_field(&json!(null)).unwrap(), "");
        assert_eq!(multipart_field(&json!({"a": 1})).unwrap(), r#"{"a":1}"#);
    }

    proptest! {
        #[test]
        fn prop_repeated_query_keeps_every_value(
            values in proptest::collection::vec("[a-zA-Z0-9 &=]{0,8}", 1..6)
        ) {
            let mut params = QueryParams::new();
            for value in &values {
                params.push("key", value.as_str());
            }

            let encoded = repeated_query(&params).unwrap();
            let parsed: Vec<(String, String)> = serde_urlencoded::from_str(&encoded).unwrap();
            let decoded: Vec<String> = parsed.into_iter().map(|(_, v)| v).collect();
            prop_assert_eq!(decoded, values);
        }
    }
}
