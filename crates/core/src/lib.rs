use code::AuthorizationCode;
use thiserror::Error;
use token::TokenSet;

pub mod code;
pub mod credentials;
pub mod token;

/// Represents an error that can occur during the OAuth bootstrap flow.
#[derive(Error, Debug)]
pub enum AuthError {
    /// App key or secret missing from both the config file and the environment.
    #[error("SCHWAB_APP_KEY and SCHWAB_APP_SECRET must be set in {0}")]
    MissingCredentials(String),

    /// No authorization code could be obtained.
    #[error("no authorization code received: {0}")]
    Capture(String),

    /// The token endpoint answered with a non-success status.
    #[error("token exchange failed: {status} {body}")]
    Exchange { status: u16, body: String },

    /// The token endpoint answered 2xx but without an access token.
    #[error("response contains no access_token: {0}")]
    MissingToken(String),

    #[error("request to provider failed: {0}")]
    Transport(String),

    #[error("config file I/O failed: {0}")]
    Storage(#[from] std::io::Error),
}

impl AuthError {
    /// True when the provider rejected the client key/secret pair.
    pub fn is_invalid_client(&self) -> bool {
        matches!(
            self,
            AuthError::Exchange { status: 401, body } if body.contains("invalid_client")
        )
    }
}

/// Defines the behavior that any OAuth provider must implement.
#[async_trait::async_trait]
pub trait OAuthProvider {
    /// Returns the URL to initiate the OAuth authorization flow.
    fn auth_url(&self, redirect_uri: &str) -> String;

    /// Exchanges an authorization code for an access token.
    async fn exchange_code(
        &self,
        code: &AuthorizationCode,
        redirect_uri: &str,
    ) -> Result<TokenSet, AuthError>;
}

/// Builds the provider authorization link for the authorization-code grant.
///
/// `client_id` and `redirect_uri` are percent-encoded; `scope` is appended as is.
pub fn authorization_url(base: &str, client_id: &str, redirect_uri: &str, scope: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}",
        base,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        scope
    )
}
