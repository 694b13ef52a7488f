//! Secret Manager client behavior against a mock API.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bq_oauth_agent::{SecretManagerClient, StaticTokenAuthorizer};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(endpoint: &str) -> SecretManagerClient {
    SecretManagerClient::new("my-project", Arc::new(StaticTokenAuthorizer::new("sm-token")))
        .with_endpoint(endpoint)
}

#[tokio::test]
async fn access_secret_decodes_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/my-project/secrets/bqoauth/versions/latest:access"))
        .and(header("authorization", "Bearer sm-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payload": {"data": BASE64.encode("s3cret-value")}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let value = client(&server.uri()).access_latest("bqoauth").await.unwrap();
    assert_eq!(value, "s3cret-value");
}

#[tokio::test]
async fn not_found_secret_is_an_error_naming_the_secret() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server.uri()).access_latest("missing").await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("missing"));
    assert!(message.contains("404"));
}

#[tokio::test]
async fn invalid_base64_payload_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"payload": {"data": "!!not-base64!!"}})),
        )
        .mount(&server)
        .await;

    let err = client(&server.uri()).access_latest("bqoauth").await.unwrap_err();
    assert!(err.to_string().contains("base64"));
}
