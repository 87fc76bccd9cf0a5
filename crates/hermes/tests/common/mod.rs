//! Ephemeral HTTP server that records every request it receives.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

type HttpResponse = Response<Full<Bytes>>;
type Handler = Arc<dyn Fn(&CapturedRequest) -> HttpResponse + Send + Sync>;

/// A request as the server saw it.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// One part of a parsed multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub text: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decoded query pairs, in order.
    pub fn query(&self) -> Vec<(String, String)> {
        serde_urlencoded::from_str(self.uri.query().unwrap_or_default()).unwrap()
    }

    /// Decoded form body pairs, in order.
    pub fn form(&self) -> Vec<(String, String)> {
        serde_urlencoded::from_bytes(&self.body).unwrap()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub async fn multipart(&self) -> Vec<Part> {
        let content_type = self.header("content-type").expect("content-type header");
        let boundary = multer::parse_boundary(content_type).unwrap();
        let body = self.body.clone();
        let stream = futures_util::stream::once(async move { Ok::<_, Infallible>(body) });

        let mut multipart = multer::Multipart::new(stream, boundary);
        let mut parts = Vec::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(|m| m.essence_str().to_string());
            let text = field.text().await.unwrap();
            parts.push(Part {
                name,
                filename,
                content_type,
                text,
            });
        }
        parts
    }
}

pub struct TestServer {
    addr: SocketAddr,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Starts a server that answers every request with a JSON description
    /// of it.
    pub async fn start() -> Self {
        Self::with_handler(|request| {
            json_response(
                StatusCode::OK,
                &serde_json::json!({
                    "method": request.method.as_str(),
                    "path": request.uri.path(),
                    "query": request.uri.query(),
                }),
            )
        })
        .await
    }

    pub async fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&CapturedRequest) -> HttpResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let captured = Arc::new(Mutex::new(Vec::new()));
        let handler: Handler = Arc::new(handler);

        let server_captured = Arc::clone(&captured);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    continue;
                };
                let captured = Arc::clone(&server_captured);
                let handler = Arc::clone(&handler);

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let captured = Arc::clone(&captured);
                        let handler = Arc::clone(&handler);
                        async move {
                            let (parts, body) = req.into_parts();
                            let body = body.collect().await.unwrap().to_bytes();
                            let request = CapturedRequest {
                                method: parts.method,
                                uri: parts.uri,
                                headers: parts.headers,
                                body,
                            };
                            let response = handler(&request);
                            captured.lock().push(request);
                            Ok::<_, Infallible>(response)
                        }
                    });

                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self {
            addr,
            captured,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().clone()
    }

    pub fn last_request(&self) -> CapturedRequest {
        self.requests().pop().expect("server received no requests")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn json_response(status: StatusCode, value: &serde_json::Value) -> HttpResponse {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(value.to_string())))
        .unwrap()
}

pub fn fixture(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}
