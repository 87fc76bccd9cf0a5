//! Authorization headers as seen by a real server.

mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::TestServer;
use hermes::ApiRequest;

fn decode_basic(header: &str) -> (String, String) {
    let encoded = header.strip_prefix("Basic ").expect("basic scheme");
    let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
    let (user, password) = decoded.split_once(':').unwrap();
    (user.to_string(), password.to_string())
}

#[tokio::test]
async fn basic_auth_credentials_round_trip() {
    let server = TestServer::start().await;

    ApiRequest::get(server.base_url(), "/me")
        .basic_auth("Jefte", "secret")
        .await
        .unwrap()
        .assert_success();

    let request = server.last_request();
    let (user, password) = decode_basic(request.header("authorization").unwrap());
    assert_eq!(user, "Jefte");
    assert_eq!(password, "secret");
}

#[tokio::test]
async fn bearer_token_is_sent_verbatim() {
    let server = TestServer::start().await;

    ApiRequest::get(server.base_url(), "/me")
        .bearer_token("foobar")
        .await
        .unwrap();

    assert_eq!(
        server.last_request().header("authorization"),
        Some("Bearer foobar")
    );
}

#[tokio::test]
async fn last_auth_call_wins() {
    let server = TestServer::start().await;

    ApiRequest::get(server.base_url(), "/me")
        .bearer_token("foobar")
        .basic_auth("Jefte", "secret")
        .await
        .unwrap();

    let request = server.last_request();
    let values: Vec<_> = request.headers.get_all("authorization").iter().collect();
    assert_eq!(values.len(), 1);
    assert!(request.header("authorization").unwrap().starts_with("Basic "));
}
