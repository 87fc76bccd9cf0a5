//! # Hermes
//!
//! Fluent HTTP requests for API tests.
//!
//! A request is assembled with chained calls, encoded at dispatch with
//! serializers looked up by content type, sent, and wrapped in a response
//! that decodes JSON lazily and offers assertion helpers.
//!
//! ## Key Features
//!
//! - **Fluent builder**: headers, query strings, auth, JSON, forms, multipart
//!   fields and file uploads on one [`ApiRequest`]
//! - **Pluggable serializers**: replace the encoder for any content type, or
//!   the query-string encoder, through a [`SerializerRegistry`]
//! - **Response assertions**: status, header and JSON field checks on
//!   [`ApiResponse`]
//! - **Swappable transport**: real HTTP via `reqwest`, or an in-process
//!   [`HandlerTransport`] for tests without sockets
//!
//! ## Example
//!
//! ```no_run
//! use hermes::{ApiRequest, FileOptions};
//! use serde_json::json;
//!
//! # async fn run() -> hermes::ApiResult<()> {
//! let response = ApiRequest::post("http://localhost:3333", "/packages")
//!     .basic_auth("Jefte", "secret")
//!     .fields(&json!({"username": "jefte", "age": 22}))
//!     .file_with("package", "package.json", FileOptions::new().filename("pkg.json"))
//!     .dump()
//!     .await?;
//!
//! response
//!     .assert_status_code(201)
//!     .assert_json_field("package.filename", &json!("pkg.json"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom serializers
//!
//! ```
//! use hermes::{encoders, ApiRequest, FORM_URLENCODED};
//!
//! // Applies to every request that uses the shared registry.
//! ApiRequest::add_serializer(FORM_URLENCODED, encoders::bracket_form);
//! ApiRequest::remove_serializer(FORM_URLENCODED);
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod client;
mod dump;
pub mod encoders;
mod error;
mod multipart;
mod query;
mod request;
mod response;
mod serializer;
mod transport;

pub use body::{BodyKind, APPLICATION_JSON, FORM_URLENCODED, MULTIPART_FORM_DATA};
pub use client::ApiClient;
pub use dump::RequestDump;
pub use error::{ApiError, ApiResult, BoxError};
pub use multipart::{FileOptions, FileSource, MultipartPart};
pub use query::{QueryParams, QueryValue};
pub use request::ApiRequest;
pub use response::{ApiResponse, ResponseBody};
pub use serializer::{BodySerializer, QsSerializer, SerializerRegistry};
pub use transport::{HandlerTransport, ReqwestTransport, Transport};
