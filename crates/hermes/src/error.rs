//! Request and response error types.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by serializers and transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur while building, sending, or reading a request.
///
/// Every variant except [`ApiError::Decoding`] is raised by dispatch before
/// or while talking to the network. Decoding errors are deferred until the
/// response body is first read.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport failed, or could not be created.
    #[error("transport error: {source}")]
    Transport {
        /// Error reported by the transport, unmodified.
        #[source]
        source: BoxError,
    },

    /// A body or query serializer failed. No bytes were sent.
    #[error("failed to encode {content_type} payload: {source}")]
    Encoding {
        /// Content type (or `query string`) being encoded.
        content_type: String,
        /// Error reported by the serializer.
        #[source]
        source: BoxError,
    },

    /// The response claims JSON but the body does not parse.
    #[error("failed to decode response body as JSON: {source}")]
    Decoding {
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// An attached file could not be read. No bytes were sent.
    #[error("cannot read attached file {}: {source}", path.display())]
    FileAccess {
        /// Path of the attachment.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The response body was read as text but is not valid UTF-8.
    #[error("response body is not valid UTF-8: {source}")]
    InvalidText {
        /// Conversion error, which still holds the raw bytes.
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Header name, header value, URL, or query string is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Wrap a transport failure.
    pub fn transport(source: impl Into<BoxError>) -> Self {
        Self::Transport {
            source: source.into(),
        }
    }

    /// Create an encoding error for the given content type.
    pub fn encoding(content_type: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Encoding {
            content_type: content_type.into(),
            source: source.into(),
        }
    }

    /// Create a file access error.
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(source: serde_json::Error) -> Self {
        Self::Decoding { source }
    }
}
