//! Client that mints requests against one base URL.

use std::sync::Arc;

use hermes_config::ClientConfig;
use http::Method;

use crate::error::ApiResult;
use crate::request::ApiRequest;
use crate::serializer::SerializerRegistry;
use crate::transport::{ReqwestTransport, Transport};

/// Shared settings for every request a test makes against one API.
///
/// Requests created by the client start with its base URL, default headers,
/// serializer registry and transport. They remain ordinary [`ApiRequest`]s
/// and can override any of these.
///
/// # Example
///
/// ```no_run
/// use hermes::ApiClient;
///
/// # async fn run() -> hermes::ApiResult<()> {
/// let client = ApiClient::new("http://localhost:3333")?
///     .with_default_header("accept", "application/json");
///
/// let response = client.get("/users").qs("page", 2).await?;
/// response.assert_success();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
#[must_use]
pub struct ApiClient {
    base_url: String,
    default_headers: Vec<(String, String)>,
    registry: Arc<SerializerRegistry>,
    transport: Arc<dyn Transport>,
    dump_requests: bool,
}

impl ApiClient {
    /// Creates a client backed by a new [`ReqwestTransport`].
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        Ok(Self::with_transport(
            base_url,
            Arc::new(ReqwestTransport::new()?),
        ))
    }

    /// Creates a client from the `[client]` configuration section.
    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        let transport = ReqwestTransport::with_env_proxy(config.use_env_proxy)?;
        let mut client = Self::with_transport(
            config.base_url.clone().unwrap_or_default(),
            Arc::new(transport),
        )
        .dump_requests(config.dump_requests);

        if let Some(user_agent) = &config.user_agent {
            client = client.with_default_header(http::header::USER_AGENT.as_str(), user_agent);
        }
        for (name, value) in &config.default_headers {
            client = client.with_default_header(name, value);
        }

        tracing::debug!(
            base_url = %client.base_url,
            default_headers = client.default_headers.len(),
            "created API client from config"
        );
        Ok(client)
    }

    /// Creates a client that sends through `transport`.
    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            default_headers: Vec::new(),
            registry: SerializerRegistry::shared(),
            transport,
            dump_requests: false,
        }
    }

    /// Adds a header included in every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Attaches `registry` to every request.
    pub fn with_serializers(mut self, registry: Arc<SerializerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Dumps every request.
    pub fn dump_requests(mut self, enabled: bool) -> Self {
        self.dump_requests = enabled;
        self
    }

    /// Base URL prepended to every endpoint.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates a GET request builder.
    pub fn get(&self, endpoint: impl Into<String>) -> ApiRequest {
        self.request(Method::GET, endpoint)
    }

    /// Creates a POST request builder.
    pub fn post(&self, endpoint: impl Into<String>) -> ApiRequest {
        self.request(Method::POST, endpoint)
    }

    /// Creates a PUT request builder.
    pub fn put(&self, endpoint: impl Into<String>) -> ApiRequest {
        self.request(Method::PUT, endpoint)
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, endpoint: impl Into<String>) -> ApiRequest {
        self.request(Method::PATCH, endpoint)
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, endpoint: impl Into<String>) -> ApiRequest {
        self.request(Method::DELETE, endpoint)
    }

    /// Creates a HEAD request builder.
    pub fn head(&self, endpoint: impl Into<String>) -> ApiRequest {
        self.request(Method::HEAD, endpoint)
    }

    /// Creates an OPTIONS request builder.
    pub fn options(&self, endpoint: impl Into<String>) -> ApiRequest {
        self.request(Method::OPTIONS, endpoint)
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, endpoint: impl Into<String>) -> ApiRequest {
        let request = ApiRequest::new(self.base_url.clone(), method, endpoint)
            .headers(self.default_headers.iter().cloned())
            .serializers(Arc::clone(&self.registry))
            .transport(Arc::clone(&self.transport));

        if self.dump_requests {
            request.dump()
        } else {
            request
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .field("dump_requests", &self.dump_requests)
            .finish_non_exhaustive()
    }
}
