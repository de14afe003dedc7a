use core_lib::{code::AuthorizationCode, credentials::ClientCredentials, AuthError, OAuthProvider};
use schwab::{loopback_redirect_uri, SchwabEndpoints, SchwabProvider, LOOPBACK_PORT};
use serde_json::json;
use wiremock::matchers::{basic_auth, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer) -> SchwabProvider {
    let credentials = ClientCredentials {
        client_id: "app-key".to_string(),
        client_secret: "app-secret".to_string(),
    };
    SchwabProvider::with_endpoints(
        credentials,
        SchwabEndpoints {
            authorize_url: format!("{}/v1/oauth/authorize", server.uri()),
            token_url: format!("{}/v1/oauth/token", server.uri()),
        },
    )
    .expect("provider should build")
}

fn code(raw: &str) -> AuthorizationCode {
    AuthorizationCode::from_raw(raw).expect("valid code")
}

#[tokio::test]
async fn test_exchange_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/oauth/token"))
        .and(basic_auth("app-key", "app-secret"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc%26def"))
        .and(body_string_contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8765%2Fcallback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "I0.access",
            "refresh_token": "refresh-xyz",
            "expires_in": 1800,
            "token_type": "Bearer",
            "scope": "api",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    let tokens = provider
        .exchange_code(&code("abc%26def"), &loopback_redirect_uri(LOOPBACK_PORT))
        .await
        .unwrap();

    assert_eq!(tokens.access_token, "I0.access");
    assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-xyz"));
    assert!(tokens.expires_at.is_some());
}

#[tokio::test]
async fn test_exchange_without_refresh_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "only-access",
        })))
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    let tokens = provider
        .exchange_code(&code("c"), "https://developer.schwab.com/oauth2-redirect.html")
        .await
        .unwrap();

    assert_eq!(tokens.access_token, "only-access");
    assert!(tokens.refresh_token.is_none());
    assert!(tokens.expires_at.is_none());
}

#[tokio::test]
async fn test_exchange_tolerates_loosely_typed_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "expires_in": "1800",
            "scope": ["readonly"],
            "refresh_token": null,
        })))
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    let tokens = provider
        .exchange_code(&code("c"), "http://127.0.0.1:8765/callback")
        .await
        .unwrap();

    assert_eq!(tokens.access_token, "tok");
    assert!(tokens.refresh_token.is_none());
    assert!(tokens.expires_at.is_some());
}

#[tokio::test]
async fn test_exchange_huge_expires_in_still_yields_tokens() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "refresh_token": "ref",
            "expires_in": i64::MAX / 2,
        })))
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    let tokens = provider
        .exchange_code(&code("c"), "http://127.0.0.1:8765/callback")
        .await
        .unwrap();

    assert_eq!(tokens.refresh_token.as_deref(), Some("ref"));
    assert!(tokens.expires_at.is_none());
}

#[tokio::test]
async fn test_exchange_invalid_client() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "Unauthorized",
        })))
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    let err = provider
        .exchange_code(&code("c"), "http://127.0.0.1:8765/callback")
        .await
        .unwrap_err();

    match &err {
        AuthError::Exchange { status, body } => {
            assert_eq!(*status, 401);
            assert!(body.contains("invalid_client"));
        }
        other => panic!("Expected Exchange error, got {:?}", other),
    }
    assert!(err.is_invalid_client());
}

#[tokio::test]
async fn test_exchange_missing_access_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
        })))
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    match provider.exchange_code(&code("c"), "uri").await {
        Err(AuthError::MissingToken(body)) => assert!(body.contains("Bearer")),
        other => panic!("Expected MissingToken, got {:?}", other),
    }
}

#[tokio::test]
async fn test_exchange_non_json_success_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    match provider.exchange_code(&code("c"), "uri").await {
        Err(AuthError::MissingToken(body)) => assert_eq!(body, "<html>maintenance</html>"),
        other => panic!("Expected MissingToken, got {:?}", other),
    }
}

#[test]
fn test_auth_url_uses_endpoint_and_scope() {
    let provider = SchwabProvider::new(ClientCredentials {
        client_id: "app-key".to_string(),
        client_secret: "s".to_string(),
    })
    .unwrap();

    let url = provider.auth_url("https://developer.schwab.com/oauth2-redirect.html");
    assert_eq!(
        url,
        "https://api.schwabapi.com/v1/oauth/authorize?response_type=code&client_id=app-key\
         &redirect_uri=https%3A%2F%2Fdeveloper.schwab.com%2Foauth2-redirect.html&scope=readonly"
    );
}
