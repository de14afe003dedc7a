#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use core_lib::token::TokenSet;

    #[test]
    fn test_token_expiration() {
        let token = TokenSet {
            access_token: String::from("access_token"),
            refresh_token: Some(String::from("refresh_token")),
            expires_at: Some(Utc::now() - Duration::seconds(1)),
        };

        assert!(token.is_expired());
    }

    #[test]
    fn test_token_not_expired() {
        let token = TokenSet {
            access_token: String::from("access_token"),
            refresh_token: Some(String::from("refresh_token")),
            expires_at: Some(Utc::now() + Duration::seconds(10)),
        };

        assert!(!token.is_expired());
    }

    #[test]
    fn test_expires_in_becomes_timestamp() {
        let before = Utc::now();
        let token = TokenSet::new("access", Some("refresh"), Some(1800));

        let expires_at = token.expires_at.expect("expiry should be set");
        assert!(expires_at >= before + Duration::seconds(1800));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_blank_refresh_token_is_dropped() {
        let token = TokenSet::new("access", Some("  "), None);
        assert!(token.refresh_token.is_none());
        assert!(token.expires_at.is_none());

        let token = TokenSet::new("access", None, Some(0));
        assert!(token.expires_at.is_none());
    }

    #[test]
    fn test_huge_expires_in_means_no_expiry() {
        let token = TokenSet::new("access", None, Some(i64::MAX / 2));
        assert_eq!(token.access_token, "access");
        assert!(token.expires_at.is_none());
        assert!(!token.is_expired());

        let token = TokenSet::new("access", None, Some(i64::MAX));
        assert!(token.expires_at.is_none());
    }
}
