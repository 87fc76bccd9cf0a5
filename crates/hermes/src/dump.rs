//! Rendered wire form of a dispatched request.

use std::fmt;

use bytes::Bytes;
use http::Method;

/// Snapshot of a request exactly as it was handed to the transport.
///
/// Produced when [`ApiRequest::dump`](crate::ApiRequest::dump) is set. The
/// [`Display`](fmt::Display) impl renders an HTTP/1.1-style request; binary
/// bodies are summarized by length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDump {
    /// Request method.
    pub method: Method,
    /// Fully composed URL, query string included.
    pub url: String,
    /// Headers in the order they were sent.
    pub headers: Vec<(String, String)>,
    /// Encoded body.
    pub body: Bytes,
}

impl RequestDump {
    /// Returns the body as UTF-8 text, if it is valid UTF-8.
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Returns the first header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for RequestDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} HTTP/1.1", self.method, self.url)?;
        for (name, value) in &self.headers {
            writeln!(f, "{name}: {value}")?;
        }
        writeln!(f)?;
        match self.body_text() {
            Some(text) => write!(f, "{text}"),
            None => write!(f, "<{} bytes of binary data>", self.body.len()),
        }
    }
}
