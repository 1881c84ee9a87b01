//! Integration tests for the upstream client against a mocked provider API.

use hostplane_upstream::{ApiClient, Credentials, ReqwestTransport, UpstreamError};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, credentials: Credentials) -> ApiClient {
    let transport = ReqwestTransport::builder()
        .base_url(server.uri())
        .credentials(credentials)
        .build()
        .expect("transport builds");
    ApiClient::from_transport(transport)
}

#[tokio::test]
async fn test_bearer_token_is_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/tokens/verify"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": {"id": "t1", "status": "active"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let verification = client(&server, Credentials::token("tok-123"))
        .verify_token()
        .await
        .unwrap();

    assert!(verification.is_active());
}

#[tokio::test]
async fn test_key_email_pair_is_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts/acct-1"))
        .and(header("x-auth-key", "global-key"))
        .and(header("x-auth-email", "ops@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": {"id": "acct-1", "name": "Ops"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let account = client(&server, Credentials::key_and_email("global-key", "ops@example.com"))
        .get_account("acct-1")
        .await
        .unwrap();

    assert_eq!(account.name.as_deref(), Some("Ops"));
}

#[tokio::test]
async fn test_unconfigured_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server, Credentials::default())
        .list_namespaces("acct-1")
        .await
        .unwrap_err();

    assert!(matches!(err, UpstreamError::Unconfigured(_)));
}

#[tokio::test]
async fn test_forbidden_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts/acct-1/workers/dispatch/namespaces"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "errors": [{"code": 10121, "message": "You do not have access to dispatch namespaces"}],
            "result": null
        })))
        .mount(&server)
        .await;

    let err = client(&server, Credentials::token("tok"))
        .list_namespaces("acct-1")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert!(err.has_code(10121));
    assert!(err.is_auth_related());
}

#[tokio::test]
async fn test_zone_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(query_param("name", "c.com"))
        .and(query_param("account.id", "acct-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": [{"id": "zone-c", "name": "c.com", "status": "active"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let zones = client(&server, Credentials::token("tok"))
        .find_zones("c.com", "acct-1")
        .await
        .unwrap();

    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].id, "zone-c");
}

#[tokio::test]
async fn test_transport_failure() {
    // nothing listens on the discard port
    let transport = ReqwestTransport::builder()
        .base_url("http://127.0.0.1:9")
        .credentials(Credentials::token("tok"))
        .build()
        .unwrap();

    let err = ApiClient::from_transport(transport)
        .verify_token()
        .await
        .unwrap_err();

    assert!(matches!(err, UpstreamError::Transport(_)));
}
