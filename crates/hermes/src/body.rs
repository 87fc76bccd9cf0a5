//! Request body kinds.

use bytes::Bytes;
use serde_json::Value;

use crate::multipart::MultipartPart;

/// `application/json`
pub const APPLICATION_JSON: &str = "application/json";

/// `application/x-www-form-urlencoded`
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// `multipart/form-data`
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// The encoding mode of a request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// No body.
    None,
    /// JSON body.
    Json,
    /// URL-encoded form body.
    Form,
    /// `multipart/form-data` body made of fields and files.
    Multipart,
    /// Body rendered by the serializer registered for a custom content type.
    Serialized,
    /// Raw bytes sent as-is.
    Raw,
}

/// Request payload. Exactly one kind is active at a time.
#[derive(Debug, Clone, Default)]
pub(crate) enum RequestBody {
    #[default]
    None,
    Json(Value),
    Form(Value),
    Multipart(Vec<MultipartPart>),
    Serialized { content_type: String, value: Value },
    Raw(Bytes),
}

impl RequestBody {
    pub(crate) fn kind(&self) -> BodyKind {
        match self {
            Self::None => BodyKind::None,
            Self::Json(_) => BodyKind::Json,
            Self::Form(_) => BodyKind::Form,
            Self::Multipart(_) => BodyKind::Multipart,
            Self::Serialized { .. } => BodyKind::Serialized,
            Self::Raw(_) => BodyKind::Raw,
        }
    }
}
