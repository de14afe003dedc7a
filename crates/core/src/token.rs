use chrono::{DateTime, Duration, Utc};

/// Holds access and refresh tokens, along with expiration information.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    pub fn new(access_token: &str, refresh_token: Option<&str>, expires_in: Option<i64>) -> Self {
        Self {
            access_token: access_token.to_string(),
            refresh_token: refresh_token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            expires_at: expires_in.and_then(expiry_after),
        }
    }

    pub fn is_expired(&self) -> bool {
        if let Some(expiration) = &self.expires_at {
            Utc::now() > *expiration
        } else {
            false
        }
    }
}

// Out-of-range lifetimes are treated as having no known expiry.
fn expiry_after(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    Duration::try_seconds(secs).and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
}
