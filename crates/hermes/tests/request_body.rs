//! Body encoding as seen by a real server.

mod common;

use std::sync::Arc;

use common::{fixture, json_response, TestServer};
use hermes::{encoders, ApiError, ApiRequest, FileOptions, SerializerRegistry, FORM_URLENCODED};
use http::StatusCode;
use serde_json::json;

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[tokio::test]
async fn form_round_trips_through_form_parser() {
    let server = TestServer::start().await;

    ApiRequest::post(server.base_url(), "/users")
        .form(&json!({"username": "Jefte", "age": 22, "tags": ["a", "b"]}))
        .await
        .unwrap()
        .assert_success();

    let request = server.last_request();
    assert_eq!(
        request.header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(
        request.form(),
        pairs(&[("username", "Jefte"), ("age", "22"), ("tags", "a"), ("tags", "b")])
    );
}

#[tokio::test]
async fn form_with_bracket_serializer() {
    let server = TestServer::start().await;
    let registry = Arc::new(SerializerRegistry::new());
    registry.add_serializer(FORM_URLENCODED, encoders::bracket_form);

    ApiRequest::post(server.base_url(), "/users")
        .serializers(Arc::clone(&registry))
        .form(&json!({
            "usernames": ["Jefte"],
            "emails[]": "jefteamorim@gmail.com",
            "age": 22,
        }))
        .await
        .unwrap();

    assert_eq!(
        server.last_request().form(),
        pairs(&[
            ("usernames[]", "Jefte"),
            ("emails[]", "jefteamorim@gmail.com"),
            ("age", "22"),
        ])
    );

    registry.remove_serializer(FORM_URLENCODED);
    ApiRequest::post(server.base_url(), "/users")
        .serializers(registry)
        .form(&json!({"usernames": ["Jefte"]}))
        .await
        .unwrap();

    assert_eq!(server.last_request().form(), pairs(&[("usernames", "Jefte")]));
}

#[tokio::test]
async fn json_then_form_sends_only_form() {
    let server = TestServer::start().await;

    ApiRequest::post(server.base_url(), "/users")
        .json(&json!({"kind": "json"}))
        .form(&json!({"kind": "form"}))
        .await
        .unwrap();

    let request = server.last_request();
    assert_eq!(
        request.header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(request.form(), pairs(&[("kind", "form")]));
}

#[tokio::test]
async fn json_body_and_json_response() {
    let server = TestServer::with_handler(|request| {
        let mut user = request.json();
        user["id"] = json!(1);
        json_response(StatusCode::CREATED, &user)
    })
    .await;

    let response = ApiRequest::post(server.base_url(), "/users")
        .json(&json!({"username": "jefte"}))
        .await
        .unwrap();

    assert_eq!(
        server.last_request().header("content-type"),
        Some("application/json")
    );
    response
        .assert_status(StatusCode::CREATED)
        .assert_json_eq(&json!({"username": "jefte", "id": 1}));
    assert_eq!(
        *response.body().unwrap(),
        json!({"username": "jefte", "id": 1})
    );
}

#[tokio::test]
async fn multipart_fields_and_file() {
    let server = TestServer::start().await;

    ApiRequest::post(server.base_url(), "/packages")
        .fields(&json!({"username": "jefte", "age": 22}))
        .file("package", fixture("package.json"))
        .await
        .unwrap();

    let request = server.last_request();
    assert!(request
        .header("content-type")
        .unwrap()
        .starts_with("multipart/form-data; boundary="));

    let parts = request.multipart().await;
    assert_eq!(parts.len(), 3);
    assert_eq!((parts[0].name.as_str(), parts[0].text.as_str()), ("username", "jefte"));
    assert_eq!((parts[1].name.as_str(), parts[1].text.as_str()), ("age", "22"));

    let file = &parts[2];
    assert_eq!(file.name, "package");
    assert_eq!(file.filename.as_deref(), Some("package.json"));
    assert_eq!(file.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        file.text,
        std::fs::read_to_string(fixture("package.json")).unwrap()
    );
}

#[tokio::test]
async fn multipart_filename_override() {
    let server = TestServer::start().await;

    ApiRequest::post(server.base_url(), "/packages")
        .file_with(
            "package",
            fixture("package.json"),
            FileOptions::new().filename("pkg.json"),
        )
        .await
        .unwrap();

    let parts = server.last_request().multipart().await;
    assert_eq!(parts[0].filename.as_deref(), Some("pkg.json"));
}

#[tokio::test]
async fn multipart_files_from_temp_dir() {
    let server = TestServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("report.csv");
    std::fs::write(&report, "a,b\n1,2\n").unwrap();

    ApiRequest::post(server.base_url(), "/reports")
        .file("report", &report)
        .fields(&json!({"tags": ["monthly", "finance"]}))
        .await
        .unwrap();

    let parts = server.last_request().multipart().await;
    let names: Vec<_> = parts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["report", "tags", "tags"]);
    assert_eq!(parts[0].content_type.as_deref(), Some("text/csv"));
    assert_eq!(parts[2].text, "finance");
}

#[tokio::test]
async fn missing_file_fails_before_sending() {
    let server = TestServer::start().await;

    let err = ApiRequest::post(server.base_url(), "/packages")
        .file("package", fixture("does-not-exist.json"))
        .await
        .unwrap_err();

    match err {
        ApiError::FileAccess { path, .. } => assert!(path.ends_with("does-not-exist.json")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(server.requests().is_empty());
}
