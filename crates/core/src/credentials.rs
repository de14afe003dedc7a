use std::collections::HashMap;

use crate::AuthError;

pub const APP_KEY_VAR: &str = "SCHWAB_APP_KEY";
pub const APP_SECRET_VAR: &str = "SCHWAB_APP_SECRET";

/// The registered application's key and secret.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    /// Resolves both values from the config file mapping, falling back to
    /// `env` per key when the file has no (or an empty) value.
    ///
    /// `origin` only feeds the error message.
    pub fn resolve<F>(
        file: &HashMap<String, String>,
        env: F,
        origin: &str,
    ) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            file.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .or_else(|| env(key).map(|v| v.trim().to_string()))
                .unwrap_or_default()
        };

        let client_id = lookup(APP_KEY_VAR);
        let client_secret = lookup(APP_SECRET_VAR);
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(AuthError::MissingCredentials(origin.to_string()));
        }

        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id_len", &self.client_id.len())
            .field("client_secret_len", &self.client_secret.len())
            .finish()
    }
}
