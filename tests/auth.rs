use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cash_panel::auth::firebase::FirebaseIdentity;
use cash_panel::auth::messages::auth_error_message;
use cash_panel::auth::provider::IdentityProvider;
use cash_panel::auth::types::Credentials;
use cash_panel::config::types::IdentityConfig;

fn identity(server: &MockServer) -> FirebaseIdentity {
    let endpoint = format!("{}/v1", server.uri());
    FirebaseIdentity::new(reqwest::Client::new(), IdentityConfig {
        api_key: "test-key".to_string(),
        auth_endpoint: endpoint.clone(),
        token_endpoint: endpoint,
    })
}

fn signed_in(expires_in: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "kind": "identitytoolkit#VerifyPasswordResponse",
        "localId": "uid-1",
        "email": "cat@example.com",
        "displayName": "",
        "idToken": "id-token-1",
        "registered": true,
        "refreshToken": "refresh-1",
        "expiresIn": expires_in,
    }))
}

fn rest_error(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "error": { "code": 400, "message": message, "errors": [] }
    }))
}

#[tokio::test]
async fn sign_in_publishes_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "email": "cat@example.com",
            "password": "whiskers",
            "returnSecureToken": true,
        })))
        .respond_with(signed_in("3600"))
        .expect(1)
        .mount(&server)
        .await;

    let identity = identity(&server);
    let sessions = identity.sessions();
    assert!(sessions.borrow().is_none());

    let session = identity.sign_in(&Credentials::new(" cat@example.com ", "whiskers")).await.unwrap();
    assert_eq!(session.uid, "uid-1");
    assert_eq!(session.display_email(), "cat@example.com");

    assert_eq!(sessions.borrow().as_ref().map(|session| session.uid.clone()), Some("uid-1".to_string()));
    assert_eq!(identity.id_token().await.unwrap(), Some("id-token-1".to_string()));

    identity.sign_out().await.unwrap();
    assert!(sessions.borrow().is_none());
    assert_eq!(identity.id_token().await.unwrap(), None);
}

#[tokio::test]
async fn existing_email_is_mapped_to_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(rest_error("EMAIL_EXISTS"))
        .mount(&server)
        .await;

    let identity = identity(&server);
    let err = identity.sign_up(&Credentials::new("cat@example.com", "whiskers")).await.unwrap_err();

    assert_eq!(err.code(), Some("auth/email-already-in-use"));
    assert_eq!(auth_error_message(&err), "An account with this email already exists.");
    assert!(identity.sessions().borrow().is_none());
}

#[tokio::test]
async fn wrong_credentials_are_mapped_to_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(rest_error("INVALID_LOGIN_CREDENTIALS"))
        .mount(&server)
        .await;

    let identity = identity(&server);
    let err = identity.sign_in(&Credentials::new("cat@example.com", "wrong!")).await.unwrap_err();
    assert_eq!(auth_error_message(&err), "Invalid email or password.");
}

#[tokio::test]
async fn expiring_token_is_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(signed_in("30"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .and(query_param("key", "test-key"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id_token": "id-token-2",
            "refresh_token": "refresh-2",
            "expires_in": "3600",
            "token_type": "Bearer",
            "user_id": "uid-1",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = identity(&server);
    identity.sign_in(&Credentials::new("cat@example.com", "whiskers")).await.unwrap();

    assert_eq!(identity.id_token().await.unwrap(), Some("id-token-2".to_string()));
    // fresh now, no second refresh
    assert_eq!(identity.id_token().await.unwrap(), Some("id-token-2".to_string()));

    let session = identity.sessions().borrow().clone().unwrap();
    assert_eq!(session.uid, "uid-1");
    assert_eq!(session.refresh_token, "refresh-2");
}

#[tokio::test]
async fn rejected_refresh_ends_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(signed_in("0"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(rest_error("TOKEN_EXPIRED"))
        .mount(&server)
        .await;

    let identity = identity(&server);
    identity.sign_in(&Credentials::new("cat@example.com", "whiskers")).await.unwrap();

    let err = identity.id_token().await.unwrap_err();
    assert_eq!(err.code(), Some("auth/user-token-expired"));
    assert!(identity.sessions().borrow().is_none());
}

#[tokio::test]
async fn unavailable_token_endpoint_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(signed_in("0"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(
            ResponseTemplate::new(503)
                .insert_header("content-type", "text/html")
                .set_body_string("<html><body>503 Service Unavailable</body></html>")
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id_token": "id-token-2",
            "refresh_token": "refresh-2",
            "expires_in": "3600",
        })))
        .mount(&server)
        .await;

    let identity = identity(&server);
    identity.sign_in(&Credentials::new("cat@example.com", "whiskers")).await.unwrap();

    assert!(identity.id_token().await.is_err());
    let session = identity.sessions().borrow().clone();
    assert_eq!(session.map(|session| session.refresh_token), Some("refresh-1".to_string()));

    // the next attempt goes through once the endpoint is back
    assert_eq!(identity.id_token().await.unwrap(), Some("id-token-2".to_string()));
}

#[tokio::test]
async fn unreachable_provider_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/v1", listener.local_addr().unwrap());
    drop(listener);

    let identity = FirebaseIdentity::new(reqwest::Client::new(), IdentityConfig {
        api_key: "test-key".to_string(),
        auth_endpoint: endpoint.clone(),
        token_endpoint: endpoint,
    });

    let err = identity.sign_in(&Credentials::new("cat@example.com", "whiskers")).await.unwrap_err();
    assert_eq!(err.code(), Some("auth/network-request-failed"));
    assert_eq!(auth_error_message(&err), "Network error. Please check your internet connection.");
}
