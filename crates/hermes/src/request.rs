//! Fluent request builder.

use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::body::{BodyKind, RequestBody, APPLICATION_JSON, FORM_URLENCODED, MULTIPART_FORM_DATA};
use crate::dump::RequestDump;
use crate::error::{ApiError, ApiResult, BoxError};
use crate::multipart::{self, FileOptions, FileSource, MultipartPart};
use crate::query::{QueryParams, QueryValue};
use crate::response::ApiResponse;
use crate::serializer::{BodySerializer, SerializerRegistry};
use crate::transport::{ReqwestTransport, Transport};

/// A request under construction.
///
/// Every mutator consumes the builder and returns it, so calls chain.
/// Nothing is encoded or sent until [`send`](Self::send) is called or the
/// builder is awaited directly.
///
/// # Example
///
/// ```no_run
/// use hermes::ApiRequest;
/// use serde_json::json;
///
/// # async fn run() -> hermes::ApiResult<()> {
/// let response = ApiRequest::post("http://localhost:8080", "/users")
///     .bearer_token("foobar")
///     .qs("notify", true)
///     .json(&json!({"username": "jefte", "age": 22}))
///     .await?;
///
/// response.assert_status_code(201);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct ApiRequest {
    base_url: String,
    endpoint: String,
    method: Method,
    headers: IndexMap<String, String>,
    query: QueryParams,
    body: RequestBody,
    auth: Option<String>,
    dump: bool,
    registry: Arc<SerializerRegistry>,
    transport: Option<Arc<dyn Transport>>,
    pending_error: Option<ApiError>,
}

impl ApiRequest {
    /// Creates a request for `base_url + endpoint`.
    ///
    /// The two parts are concatenated as given; no slash is added or removed.
    pub fn new(base_url: impl Into<String>, method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint: endpoint.into(),
            method,
            headers: IndexMap::new(),
            query: QueryParams::new(),
            body: RequestBody::None,
            auth: None,
            dump: false,
            registry: SerializerRegistry::shared(),
            transport: None,
            pending_error: None,
        }
    }

    /// Creates a GET request.
    pub fn get(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(base_url, Method::GET, endpoint)
    }

    /// Creates a POST request.
    pub fn post(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(base_url, Method::POST, endpoint)
    }

    /// Creates a PUT request.
    pub fn put(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(base_url, Method::PUT, endpoint)
    }

    /// Creates a PATCH request.
    pub fn patch(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(base_url, Method::PATCH, endpoint)
    }

    /// Creates a DELETE request.
    pub fn delete(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(base_url, Method::DELETE, endpoint)
    }

    /// Creates a HEAD request.
    pub fn head(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(base_url, Method::HEAD, endpoint)
    }

    /// Creates an OPTIONS request.
    pub fn options(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(base_url, Method::OPTIONS, endpoint)
    }

    /// Sets a header. A later call with the same name replaces the value.
    ///
    /// Names are stored as given. Setting `Content-Type` suppresses the
    /// implicit content type of JSON, form and custom bodies.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets several headers, in order.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.headers.insert(name.into(), value.into());
        }
        self
    }

    /// Appends a query parameter. Repeated keys keep every value.
    pub fn qs(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.push(key, value);
        self
    }

    /// Appends every entry of `params`.
    pub fn qs_map<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<QueryValue>,
    {
        self.query.extend(params);
        self
    }

    /// Merges a literal query string such as `orderBy=id&page=2`.
    ///
    /// Keys already present are replaced in place; see
    /// [`QueryParams::merge_literal`].
    pub fn qs_str(mut self, literal: impl AsRef<str>) -> Self {
        if let Err(e) = self.query.merge_literal(literal.as_ref()) {
            self.fail(e);
        }
        self
    }

    /// Sets `Authorization: Basic base64(user:password)`.
    pub fn basic_auth(mut self, user: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        let credentials = STANDARD.encode(format!("{}:{}", user.as_ref(), password.as_ref()));
        self.auth = Some(format!("Basic {credentials}"));
        self
    }

    /// Sets `Authorization: Bearer <token>`.
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.auth = Some(format!("Bearer {}", token.as_ref()));
        self
    }

    /// Sends `value` as JSON. Replaces any other body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        if let Some(value) = self.to_value(APPLICATION_JSON, value) {
            self.body = RequestBody::Json(value);
        }
        self
    }

    /// Sends `value` URL-encoded. Replaces any other body.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        if let Some(value) = self.to_value(FORM_URLENCODED, value) {
            self.body = RequestBody::Form(value);
        }
        self
    }

    /// Adds multipart text fields, one per entry of the object `value`.
    ///
    /// Fields and files already added are kept; a JSON or form body is
    /// discarded.
    pub fn fields<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        let Some(value) = self.to_value(MULTIPART_FORM_DATA, value) else {
            return self;
        };
        let Value::Object(map) = value else {
            self.fail(ApiError::encoding(
                MULTIPART_FORM_DATA,
                "multipart fields must be an object",
            ));
            return self;
        };

        let fields = map
            .into_iter()
            .map(|(name, value)| MultipartPart::Field { name, value });
        self.push_parts(fields);
        self
    }

    /// Attaches a file under `field_name`.
    ///
    /// Paths are read at dispatch; the filename defaults to the path's
    /// basename and the part content type is guessed from it.
    pub fn file(self, field_name: impl Into<String>, source: impl Into<FileSource>) -> Self {
        self.file_with(field_name, source, FileOptions::default())
    }

    /// Attaches a file with an explicit filename or content type.
    pub fn file_with(
        mut self,
        field_name: impl Into<String>,
        source: impl Into<FileSource>,
        options: FileOptions,
    ) -> Self {
        let part = MultipartPart::file(field_name, source, options);
        self.push_parts([part]);
        self
    }

    /// Sends `value` rendered by the serializer registered for
    /// `content_type`. Replaces any other body.
    pub fn serialized<T: Serialize + ?Sized>(
        mut self,
        content_type: impl Into<String>,
        value: &T,
    ) -> Self {
        let content_type = content_type.into();
        if let Some(value) = self.to_value(&content_type, value) {
            self.body = RequestBody::Serialized {
                content_type,
                value,
            };
        }
        self
    }

    /// Sends raw bytes. No content type is implied.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Raw(body.into());
        self
    }

    /// Records the wire form of the request when it is sent.
    ///
    /// The dump is logged at INFO and available from
    /// [`ApiResponse::request_dump`].
    pub fn dump(mut self) -> Self {
        self.dump = true;
        self
    }

    /// Resolves serializers from `registry` instead of the shared one.
    pub fn serializers(mut self, registry: Arc<SerializerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Sends through `transport` instead of a fresh [`ReqwestTransport`].
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Registers a body serializer on the shared registry.
    pub fn add_serializer<F>(content_type: &str, serializer: F)
    where
        F: Fn(&Value) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        SerializerRegistry::shared().add_serializer(content_type, serializer);
    }

    /// Removes a body serializer from the shared registry, restoring the
    /// built-in default if there is one.
    #[doc(alias = "remove_parser")]
    pub fn remove_serializer(content_type: &str) {
        SerializerRegistry::shared().remove_serializer(content_type);
    }

    /// Overrides query-string encoding on the shared registry.
    pub fn set_qs_serializer<F>(serializer: F)
    where
        F: Fn(&QueryParams) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        SerializerRegistry::shared().set_qs_serializer(serializer);
    }

    /// Restores default query-string encoding on the shared registry.
    pub fn remove_qs_serializer() {
        SerializerRegistry::shared().remove_qs_serializer();
    }

    /// Target URL without the query string.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint)
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Headers set explicitly, in insertion order.
    pub fn headers_map(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Query parameters accumulated so far.
    pub fn query_params(&self) -> &QueryParams {
        &self.query
    }

    /// The active body kind.
    pub fn body_kind(&self) -> BodyKind {
        self.body.kind()
    }

    /// Encodes and sends the request.
    ///
    /// Encoding failures and unreadable files are reported before anything
    /// reaches the transport. Transport failures are returned as
    /// [`ApiError::Transport`] without retrying.
    pub async fn send(mut self) -> ApiResult<ApiResponse> {
        if let Some(err) = self.pending_error.take() {
            return Err(err);
        }

        let url = self.compose_url()?;
        let (content_type, body) = self.encode_body().await?;
        let headers = self.compose_headers(content_type.as_deref());

        tracing::debug!(
            method = %self.method,
            url = %url,
            body_kind = ?self.body.kind(),
            body_len = body.len(),
            "dispatching request"
        );

        let uri: Uri = url
            .parse()
            .map_err(|e| ApiError::invalid_request(format!("invalid URL `{url}`: {e}")))?;

        let mut header_map = HeaderMap::with_capacity(headers.len());
        for (name, value) in &headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::invalid_request(format!("invalid header name `{name}`: {e}")))?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                ApiError::invalid_request(format!("invalid value for header `{name}`: {e}"))
            })?;
            header_map.append(header_name, header_value);
        }

        let dump = self.dump.then(|| RequestDump {
            method: self.method.clone(),
            url: url.clone(),
            headers,
            body: body.clone(),
        });
        if let Some(dump) = &dump {
            tracing::info!(method = %dump.method, url = %dump.url, "request dump\n{dump}");
        }

        let mut request = http::Request::new(body);
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;
        *request.headers_mut() = header_map;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        let response = transport.send(request).await.map_err(ApiError::transport)?;

        tracing::debug!(
            status = response.status().as_u16(),
            body_len = response.body().len(),
            "received response"
        );

        Ok(ApiResponse::from_http(response, dump))
    }

    fn compose_url(&self) -> ApiResult<String> {
        let mut url = self.url();
        if self.query.is_empty() {
            return Ok(url);
        }

        let serializer = self.registry.qs_serializer();
        let query = serializer(&self.query).map_err(|e| ApiError::encoding("query string", e))?;
        if !query.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }
        Ok(url)
    }

    async fn encode_body(&self) -> ApiResult<(Option<String>, Bytes)> {
        match &self.body {
            RequestBody::None => Ok((None, Bytes::new())),
            RequestBody::Raw(bytes) => Ok((None, bytes.clone())),
            RequestBody::Json(value) => self.render(APPLICATION_JSON, value),
            RequestBody::Form(value) => self.render(FORM_URLENCODED, value),
            RequestBody::Serialized {
                content_type,
                value,
            } => self.render(content_type, value),
            RequestBody::Multipart(parts) => {
                let serializer = self.resolve(MULTIPART_FORM_DATA)?;
                let boundary = multipart::generate_boundary();
                let body = multipart::encode(parts, &boundary, &serializer).await?;
                Ok((Some(multipart::content_type(&boundary)), body))
            }
        }
    }

    fn render(&self, content_type: &str, value: &Value) -> ApiResult<(Option<String>, Bytes)> {
        let serializer = self.resolve(content_type)?;
        let rendered = serializer(value).map_err(|e| ApiError::encoding(content_type, e))?;
        Ok((Some(content_type.to_string()), Bytes::from(rendered)))
    }

    fn resolve(&self, content_type: &str) -> ApiResult<BodySerializer> {
        self.registry.serializer_for(content_type).ok_or_else(|| {
            ApiError::encoding(content_type, "no serializer registered for content type")
        })
    }

    fn compose_headers(&self, content_type: Option<&str>) -> Vec<(String, String)> {
        let multipart = self.body.kind() == BodyKind::Multipart;
        let is = |name: &str, header: &HeaderName| name.eq_ignore_ascii_case(header.as_str());

        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .filter(|(name, _)| !(multipart && is(name.as_str(), &CONTENT_TYPE)))
            .filter(|(name, _)| !(self.auth.is_some() && is(name.as_str(), &AUTHORIZATION)))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        if let Some(content_type) = content_type {
            if !headers.iter().any(|(name, _)| is(name.as_str(), &CONTENT_TYPE)) {
                headers.push((CONTENT_TYPE.as_str().to_string(), content_type.to_string()));
            }
        }
        if let Some(auth) = &self.auth {
            headers.push((AUTHORIZATION.as_str().to_string(), auth.clone()));
        }
        headers
    }

    fn push_parts(&mut self, new_parts: impl IntoIterator<Item = MultipartPart>) {
        let mut parts = match std::mem::take(&mut self.body) {
            RequestBody::Multipart(parts) => parts,
            _ => Vec::new(),
        };
        parts.extend(new_parts);
        self.body = RequestBody::Multipart(parts);
    }

    fn to_value<T: Serialize + ?Sized>(&mut self, content_type: &str, value: &T) -> Option<Value> {
        match serde_json::to_value(value) {
            Ok(value) => Some(value),
            Err(e) => {
                self.fail(ApiError::encoding(content_type, e));
                None
            }
        }
    }

    // Only the first failure is reported.
    fn fail(&mut self, err: ApiError) {
        if self.pending_error.is_none() {
            self.pending_error = Some(err);
        }
    }
}

impl IntoFuture for ApiRequest {
    type Output = ApiResult<ApiResponse>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.send())
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url())
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("body_kind", &self.body.kind())
            .field("auth", &self.auth.as_ref().map(|_| "<redacted>"))
            .field("dump", &self.dump)
            .finish_non_exhaustive()
    }
}
