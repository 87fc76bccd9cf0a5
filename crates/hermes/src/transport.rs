//! The network seam between a dispatched request and a server.
//!
//! [`ReqwestTransport`] talks to real servers. [`HandlerTransport`] routes
//! requests to an in-process closure, so request encoding can be tested
//! without binding a port.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use reqwest::Client;

use crate::error::{ApiError, ApiResult, BoxError};

/// Sends a fully encoded request and buffers the response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request`. Errors are surfaced to the caller unmodified.
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, BoxError>;
}

/// Transport backed by a [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport that ignores proxy environment variables.
    pub fn new() -> ApiResult<Self> {
        Self::with_env_proxy(false)
    }

    /// Creates a transport, optionally honouring `HTTP_PROXY` and friends.
    pub fn with_env_proxy(use_env_proxy: bool) -> ApiResult<Self> {
        let mut builder = Client::builder();
        if !use_env_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(ApiError::transport)?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, BoxError> {
        let (parts, body) = request.into_parts();

        let response = self
            .client
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let mut wrapped = http::Response::new(body);
        *wrapped.status_mut() = status;
        *wrapped.headers_mut() = headers;
        Ok(wrapped)
    }
}

type Handler = Arc<
    dyn Fn(http::Request<Bytes>) -> Pin<Box<dyn Future<Output = http::Response<Bytes>> + Send>>
        + Send
        + Sync,
>;

/// Transport that hands each request to a closure.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use hermes::{ApiRequest, HandlerTransport};
/// use std::sync::Arc;
///
/// # block_on(async {
/// let transport = Arc::new(HandlerTransport::new(|request: http::Request<Bytes>| async move {
///     http::Response::new(Bytes::from(request.uri().to_string()))
/// }));
///
/// let response = ApiRequest::get("http://api.test", "/users")
///     .qs("page", 2)
///     .transport(transport)
///     .send()
///     .await
///     .unwrap();
///
/// assert_eq!(response.text().unwrap(), "http://api.test/users?page=2");
/// # });
/// # fn block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct HandlerTransport {
    handler: Handler,
}

impl HandlerTransport {
    /// Creates a transport from an async handler.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(http::Request<Bytes>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = http::Response<Bytes>> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |request| Box::pin(handler(request))),
        }
    }

    /// Creates a transport that answers with a JSON description of the
    /// request: `method`, `url`, `headers` and the body as text.
    pub fn echo() -> Self {
        Self::new(|request: http::Request<Bytes>| async move {
            let headers: serde_json::Map<String, serde_json::Value> = request
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        serde_json::Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
                    )
                })
                .collect();

            let echoed = serde_json::json!({
                "method": request.method().as_str(),
                "url": request.uri().to_string(),
                "headers": headers,
                "body": String::from_utf8_lossy(request.body()),
            });

            let mut response = http::Response::new(Bytes::from(echoed.to_string()));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            response
        })
    }

    /// Creates a transport that always returns the same response.
    pub fn fixed_response(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self::new(move |_request| {
            let body = body.clone();
            async move {
                let mut response = http::Response::new(body);
                *response.status_mut() = status;
                response
            }
        })
    }
}

impl std::fmt::Debug for HandlerTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HandlerTransport {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, BoxError> {
        Ok((self.handler)(request).await)
    }
}
