use std::time::Duration;

use core_lib::{
    authorization_url, code::AuthorizationCode, credentials::ClientCredentials, token::TokenSet,
    AuthError, OAuthProvider,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

pub const SCHWAB_AUTH_URL: &str = "https://api.schwabapi.com/v1/oauth/authorize";
pub const SCHWAB_TOKEN_URL: &str = "https://api.schwabapi.com/v1/oauth/token";
pub const SCHWAB_SCOPE: &str = "readonly";

/// Callback page hosted by the developer portal; shows the code in the address bar.
pub const PORTAL_REDIRECT_URI: &str = "https://developer.schwab.com/oauth2-redirect.html";
pub const LOOPBACK_PORT: u16 = 8765;

const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Token endpoint payload. Fields are loosely typed; only `access_token` is required.
#[derive(Deserialize, Debug, Default)]
struct SchwabTokenResponse {
    #[serde(default)]
    access_token: Value,
    #[serde(default)]
    refresh_token: Value,
    #[serde(default)]
    expires_in: Value,
    #[serde(default)]
    scope: Value,
    #[serde(default)]
    token_type: Value,
}

impl SchwabTokenResponse {
    fn access_token(&self) -> Option<&str> {
        text(&self.access_token)
    }

    fn refresh_token(&self) -> Option<&str> {
        text(&self.refresh_token)
    }

    /// Accepts `1800` as well as `"1800"`.
    fn expires_in(&self) -> Option<i64> {
        match &self.expires_in {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

fn text(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Authorization and token endpoints; overridable so tests can point at a mock.
#[derive(Debug, Clone)]
pub struct SchwabEndpoints {
    pub authorize_url: String,
    pub token_url: String,
}

impl Default for SchwabEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: SCHWAB_AUTH_URL.to_string(),
            token_url: SCHWAB_TOKEN_URL.to_string(),
        }
    }
}

pub fn loopback_redirect_uri(port: u16) -> String {
    format!("http://127.0.0.1:{}/callback", port)
}

pub struct SchwabProvider {
    credentials: ClientCredentials,
    endpoints: SchwabEndpoints,
    client: Client,
}

impl SchwabProvider {
    pub fn new(credentials: ClientCredentials) -> Result<Self, AuthError> {
        Self::with_endpoints(credentials, SchwabEndpoints::default())
    }

    pub fn with_endpoints(
        credentials: ClientCredentials,
        endpoints: SchwabEndpoints,
    ) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(EXCHANGE_TIMEOUT)
            .build()
            .map_err(|err| AuthError::Transport(err.to_string()))?;

        Ok(SchwabProvider {
            credentials,
            endpoints,
            client,
        })
    }
}

#[async_trait::async_trait]
impl OAuthProvider for SchwabProvider {
    fn auth_url(&self, redirect_uri: &str) -> String {
        authorization_url(
            &self.endpoints.authorize_url,
            &self.credentials.client_id,
            redirect_uri,
            SCHWAB_SCOPE,
        )
    }

    async fn exchange_code(
        &self,
        code: &AuthorizationCode,
        redirect_uri: &str,
    ) -> Result<TokenSet, AuthError> {
        debug!(token_url = %self.endpoints.token_url, redirect_uri, "exchanging authorization code");

        let res = self
            .client
            .post(&self.endpoints.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|err| AuthError::Transport(err.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|err| AuthError::Transport(err.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "token endpoint rejected the exchange");
            return Err(AuthError::Exchange {
                status: status.as_u16(),
                body,
            });
        }

        let token_response: SchwabTokenResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "token response is not a JSON object");
                return Err(AuthError::MissingToken(body));
            }
        };

        let Some(access_token) = token_response.access_token() else {
            return Err(AuthError::MissingToken(body));
        };

        debug!(
            token_type = text(&token_response.token_type).unwrap_or("unknown"),
            scope = text(&token_response.scope).unwrap_or(""),
            has_refresh = token_response.refresh_token().is_some(),
            "token exchange succeeded"
        );

        Ok(TokenSet::new(
            access_token,
            token_response.refresh_token(),
            token_response.expires_in(),
        ))
    }
}
