//! `multipart/form-data` bodies built from text fields and file attachments.
//!
//! Parts are collected by [`ApiRequest::fields`](crate::ApiRequest::fields)
//! and [`ApiRequest::file`](crate::ApiRequest::file) and framed at dispatch:
//!
//! ```text
//! --<boundary>\r\n
//! Content-Disposition: form-data; name="username"\r\n
//! \r\n
//! jefte\r\n
//! --<boundary>\r\n
//! Content-Disposition: form-data; name="package"; filename="package.json"\r\n
//! Content-Type: application/json\r\n
//! \r\n
//! <file bytes>\r\n
//! --<boundary>--\r\n
//! ```

use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use serde_json::Value;

use crate::body::MULTIPART_FORM_DATA;
use crate::error::{ApiError, ApiResult};
use crate::serializer::BodySerializer;

/// Where the content of a file part comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// Read from disk at dispatch time.
    Path(PathBuf),
    /// In-memory content.
    Bytes(Bytes),
}

impl From<&Path> for FileSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for FileSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&PathBuf> for FileSource {
    fn from(path: &PathBuf) -> Self {
        Self::Path(path.clone())
    }
}

impl From<&str> for FileSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<Bytes> for FileSource {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for FileSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for FileSource {
    fn from(bytes: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(bytes))
    }
}

/// Overrides for an attached file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOptions {
    /// Filename sent in `Content-Disposition`. Defaults to the path's basename.
    pub filename: Option<String>,
    /// Part content type. Defaults to a guess from the filename.
    pub content_type: Option<String>,
}

impl FileOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filename.
    #[must_use]
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the content type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartPart {
    /// A text field. Array values produce one part per element.
    Field {
        /// Field name.
        name: String,
        /// Field value, rendered by the multipart field serializer.
        value: Value,
    },
    /// A file attachment.
    File {
        /// Field name.
        field_name: String,
        /// File content source.
        source: FileSource,
        /// Filename override.
        filename: Option<String>,
        /// Content type override.
        content_type: Option<String>,
    },
}

impl MultipartPart {
    /// Creates a file part from a source and options.
    pub fn file(
        field_name: impl Into<String>,
        source: impl Into<FileSource>,
        options: FileOptions,
    ) -> Self {
        Self::File {
            field_name: field_name.into(),
            source: source.into(),
            filename: options.filename,
            content_type: options.content_type,
        }
    }
}

/// Generates a random boundary token.
pub fn generate_boundary() -> String {
    format!("----HermesFormBoundary{}", uuid::Uuid::new_v4().simple())
}

/// Returns the `Content-Type` header value for a boundary.
pub fn content_type(boundary: &str) -> String {
    format!("{MULTIPART_FORM_DATA}; boundary={boundary}")
}

/// Frames `parts` into a complete multipart body.
///
/// Files are read from disk here, before anything is handed to the
/// transport; each file handle is closed once its bytes are buffered.
pub(crate) async fn encode(
    parts: &[MultipartPart],
    boundary: &str,
    field_serializer: &BodySerializer,
) -> ApiResult<Bytes> {
    let mut body = BytesMut::new();

    for part in parts {
        match part {
            MultipartPart::Field { name, value } => {
                let values: Vec<&Value> = match value {
                    Value::Array(items) => items.iter().collect(),
                    other => vec![other],
                };
                for value in values {
                    let text = field_serializer(value)
                        .map_err(|e| ApiError::encoding(MULTIPART_FORM_DATA, e))?;
                    write_part_head(&mut body, boundary, name, None, None);
                    body.extend_from_slice(text.as_bytes());
                    body.extend_from_slice(b"\r\n");
                }
            }
            MultipartPart::File {
                field_name,
                source,
                filename,
                content_type,
            } => {
                let (content, default_name) = match source {
                    FileSource::Path(path) => {
                        let content = tokio::fs::read(path)
                            .await
                            .map_err(|e| ApiError::file_access(path, e))?;
                        let name = path
                            .file_name()
                            .map(|name| name.to_string_lossy().into_owned());
                        (Bytes::from(content), name)
                    }
                    FileSource::Bytes(bytes) => (bytes.clone(), None),
                };

                let filename = filename
                    .clone()
                    .or(default_name)
                    .unwrap_or_else(|| field_name.clone());
                let content_type = content_type.clone().unwrap_or_else(|| {
                    mime_guess::from_path(&filename)
                        .first_or_octet_stream()
                        .essence_str()
                        .to_string()
                });

                write_part_head(
                    &mut body,
                    boundary,
                    field_name,
                    Some(&filename),
                    Some(&content_type),
                );
                body.extend_from_slice(&content);
                body.extend_from_slice(b"\r\n");
            }
        }
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    Ok(body.freeze())
}

fn write_part_head(
    body: &mut BytesMut,
    boundary: &str,
    name: &str,
    filename: Option<&str>,
    content_type: Option<&str>,
) {
    let mut head = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"",
        escape_quoted(name)
    );
    if let Some(filename) = filename {
        head.push_str(&format!("; filename=\"{}\"", escape_quoted(filename)));
    }
    head.push_str("\r\n");
    if let Some(content_type) = content_type {
        head.push_str(&format!("Content-Type: {content_type}\r\n"));
    }
    head.push_str("\r\n");
    body.extend_from_slice(head.as_bytes());
}

// Same escaping browsers apply to names inside Content-Disposition.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
