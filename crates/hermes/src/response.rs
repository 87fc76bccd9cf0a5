//! Response wrapper with content-type aware decoding and assertions.

use std::fmt;
use std::sync::OnceLock;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dump::RequestDump;
use crate::error::{ApiError, ApiResult};

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Parsed JSON, for JSON content types.
    Json(Value),
    /// Text for every other content type.
    Text(String),
}

impl ResponseBody {
    /// Returns the JSON value, if the body was decoded as JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Returns the text, if the body was decoded as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }
}

impl PartialEq<Value> for ResponseBody {
    fn eq(&self, other: &Value) -> bool {
        self.as_json() == Some(other)
    }
}

/// Immutable snapshot of a response.
///
/// The body is buffered in full at dispatch; decoding happens on the first
/// call to [`body`](Self::body) and is cached afterwards.
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    decoded: OnceLock<ResponseBody>,
    dump: Option<RequestDump>,
}

impl ApiResponse {
    /// Creates a response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            decoded: OnceLock::new(),
            dump: None,
        }
    }

    pub(crate) fn from_http(response: http::Response<Bytes>, dump: Option<RequestDump>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            dump,
            ..Self::new(parts.status, parts.headers, body)
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true if the status is successful (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the status is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Returns true if the status is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value by name, case-insensitively.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns true when the Content-Type is JSON (`application/json` or a
    /// `+json` structured suffix).
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type()
            .and_then(|ct| ct.parse::<mime::Mime>().ok())
            .is_some_and(|mime| {
                (mime.type_() == mime::APPLICATION && mime.subtype() == mime::JSON)
                    || mime.suffix() == Some(mime::JSON)
            })
    }

    /// Returns the decoded body.
    ///
    /// JSON content types are parsed into a [`Value`]; anything else is
    /// returned as text (invalid UTF-8 is replaced). An empty body is always
    /// `Text("")`.
    pub fn body(&self) -> ApiResult<&ResponseBody> {
        if let Some(decoded) = self.decoded.get() {
            return Ok(decoded);
        }

        let decoded = if self.is_json() && !self.body.is_empty() {
            ResponseBody::Json(serde_json::from_slice(&self.body)?)
        } else {
            ResponseBody::Text(String::from_utf8_lossy(&self.body).into_owned())
        };

        Ok(self.decoded.get_or_init(|| decoded))
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(&self) -> ApiResult<String> {
        String::from_utf8(self.body.to_vec()).map_err(|source| ApiError::InvalidText { source })
    }

    /// Deserializes the body as JSON, regardless of the Content-Type.
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns the wire form of the request, when it was dumped.
    #[must_use]
    pub fn request_dump(&self) -> Option<&RequestDump> {
        self.dump.as_ref()
    }

    // Assertion methods

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}",
            expected, self.status
        );
        self
    }

    /// Asserts that the status code equals the expected u16 value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status_code(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {}, got {}",
            expected,
            self.status.as_u16()
        );
        self
    }

    /// Asserts that the response is successful (2xx).
    ///
    /// # Panics
    ///
    /// Panics if the status is not 2xx.
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.is_success(),
            "Expected success status, got {}",
            self.status
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("Header '{}' not found", name));
        assert_eq!(
            actual, expected,
            "Header '{}': expected '{}', got '{}'",
            name, expected, actual
        );
        self
    }

    /// Asserts that the Content-Type header starts with `expected`.
    ///
    /// # Panics
    ///
    /// Panics if Content-Type is missing or doesn't match.
    pub fn assert_content_type(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let actual = self
            .content_type()
            .unwrap_or_else(|| panic!("Content-Type header not found"));
        assert!(
            actual.starts_with(expected),
            "Content-Type: expected '{}', got '{}'",
            expected,
            actual
        );
        self
    }

    /// Asserts that the body contains the expected substring.
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't contain the substring.
    pub fn assert_body_contains(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let body = String::from_utf8_lossy(&self.body);
        assert!(
            body.contains(expected),
            "Body should contain '{}', got: {}",
            expected,
            body
        );
        self
    }

    /// Asserts that the body equals the expected string.
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't match.
    pub fn assert_body_eq(&self, expected: impl AsRef<str>) -> &Self {
        let body = String::from_utf8_lossy(&self.body);
        assert_eq!(body, expected.as_ref(), "Body mismatch");
        self
    }

    /// Asserts that the JSON body matches the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or doesn't match.
    pub fn assert_json_eq(&self, expected: &Value) -> &Self {
        let actual = self.json_value();
        assert_eq!(&actual, expected, "JSON body mismatch");
        self
    }

    /// Asserts that a JSON field exists and equals the expected value.
    ///
    /// `path` is dot-separated; numeric segments index arrays
    /// (`items.0.name`).
    ///
    /// # Panics
    ///
    /// Panics if the field doesn't exist or doesn't match.
    pub fn assert_json_field(&self, path: impl AsRef<str>, expected: &Value) -> &Self {
        let path = path.as_ref();
        let json = self.json_value();
        let actual = json_path(&json, path).unwrap_or_else(|| {
            panic!("JSON path '{}' not found in: {:?}", path, json);
        });
        assert_eq!(
            actual, expected,
            "JSON field '{}': expected {:?}, got {:?}",
            path, expected, actual
        );
        self
    }

    fn json_value(&self) -> Value {
        match self.json::<Value>() {
            Ok(value) => value,
            Err(e) => panic!("Body should be valid JSON: {e}"),
        }
    }
}

impl fmt::Debug for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Simple JSON path accessor.
fn json_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        if segment.is_empty() {
            continue;
        }
        // Numeric segments index arrays: "items.0.name"
        current = match segment.parse::<usize>() {
            Ok(index) if current.is_array() => current.get(index)?,
            _ => current.get(segment)?,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_response(status: u16, content_type: &'static str, body: &str) -> ApiResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        ApiResponse::new(
            StatusCode::from_u16(status).unwrap(),
            headers,
            Bytes::from(body.to_string()),
        )
    }

    fn json_response(status: u16, body: &str) -> ApiResponse {
        create_response(status, "application/json", body)
    }

    #[test]
    fn test_status() {
        let response = json_response(200, "{}");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.status_code(), 200);
        assert!(response.is_success());
    }

    #[test]
    fn test_client_and_server_errors() {
        assert!(json_response(404, "{}").is_client_error());
        assert!(json_response(503, "{}").is_server_error());
        assert!(!json_response(503, "{}").is_success());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = json_response(200, "{}");
        assert_eq!(response.header_str("Content-Type"), Some("application/json"));
        assert_eq!(response.header_str("content-type"), Some("application/json"));
        assert!(response.header("x-missing").is_none());
    }

    #[test]
    fn test_json_body_is_decoded() {
        let response = json_response(200, r#"{"name":"Jefte","age":22}"#);
        let body = response.body().unwrap();
        assert_eq!(*body, json!({"name": "Jefte", "age": 22}));
    }

    #[test]
    fn test_structured_suffix_is_json() {
        let response = create_response(200, "application/problem+json; charset=utf-8", r#"{"a":1}"#);
        assert!(response.is_json());
        assert_eq!(response.body().unwrap().as_json(), Some(&json!({"a": 1})));
    }

    #[test]
    fn test_text_body() {
        let response = create_response(200, "text/plain", "hello");
        assert_eq!(response.body().unwrap().as_text(), Some("hello"));
    }

    #[test]
    fn test_text_rejects_invalid_utf8() {
        let response = ApiResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            Bytes::from_static(&[0x68, 0x69, 0xff]),
        );
        assert!(matches!(response.text(), Err(ApiError::InvalidText { .. })));
        assert_eq!(response.body().unwrap().as_text(), Some("hi\u{fffd}"));
    }

    #[test]
    fn test_empty_json_body_is_empty_text() {
        let response = json_response(204, "");
        assert_eq!(response.body().unwrap(), &ResponseBody::Text(String::new()));
    }

    #[test]
    fn test_malformed_json_fails_on_access() {
        let response = json_response(200, "{not json");
        assert!(matches!(response.body(), Err(ApiError::Decoding { .. })));
        assert_eq!(response.bytes().as_ref(), b"{not json");
    }

    #[test]
    fn test_body_is_cached() {
        let response = json_response(200, r#"{"a":1}"#);
        let first: *const ResponseBody = response.body().unwrap();
        let second: *const ResponseBody = response.body().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_typed_json() {
        #[derive(serde::Deserialize)]
        struct User {
            name: String,
        }

        let response = json_response(200, r#"{"name":"Alice"}"#);
        let user: User = response.json().unwrap();
        assert_eq!(user.name, "Alice");
    }

    #[test]
    fn test_assertions_chain() {
        let response = json_response(201, r#"{"user":{"tags":["admin"]}}"#);
        response
            .assert_status(StatusCode::CREATED)
            .assert_status_code(201)
            .assert_success()
            .assert_header("content-type", "application/json")
            .assert_content_type("application/json")
            .assert_body_contains("admin")
            .assert_json_field("user.tags.0", &json!("admin"))
            .assert_json_eq(&json!({"user": {"tags": ["admin"]}}));
    }

    #[test]
    fn test_assert_body_eq() {
        create_response(200, "text/plain", "OK").assert_body_eq("OK");
    }

    #[test]
    #[should_panic(expected = "Expected status 404")]
    fn test_assert_status_panics() {
        json_response(200, "{}").assert_status(StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_json_path() {
        let value = json!({
            "user": {
                "name": "Alice",
                "tags": ["admin", "user"]
            }
        });

        assert_eq!(json_path(&value, "user.name"), Some(&json!("Alice")));
        assert_eq!(json_path(&value, "user.tags.1"), Some(&json!("user")));
        assert_eq!(json_path(&value, "nonexistent"), None);
    }

    #[test]
    fn test_no_dump_by_default() {
        assert!(json_response(200, "{}").request_dump().is_none());
    }
}
