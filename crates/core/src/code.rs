use std::fmt;

/// A single-use authorization code, already normalized for the token exchange.
///
/// The only way to build one is through [`AuthorizationCode::from_raw`] or
/// [`AuthorizationCode::from_pasted`], so every capture strategy shares the same
/// trimming, truncation and percent-decoding rules.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    /// Normalizes a code value as it appears in a query string.
    ///
    /// Anything after the first `&` is dropped before decoding, so an escaped
    /// `%26` survives as part of the code. Returns `None` when nothing is left.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let value = raw.trim().split('&').next().unwrap_or_default().trim();
        if value.is_empty() {
            return None;
        }

        let decoded = percent_decode(value).trim().to_string();
        if decoded.is_empty() {
            None
        } else {
            Some(Self(decoded))
        }
    }

    /// Accepts either a bare code or a whole redirect URL copied from a browser.
    pub fn from_pasted(input: &str) -> Option<Self> {
        let input = input.trim();
        let raw = match input.split_once("code=") {
            Some((_, rest)) => rest,
            None => input,
        };
        Self::from_raw(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Decodes `%XX` escapes; invalid UTF-8 is replaced rather than rejected.
pub fn percent_decode(raw: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned()
}

// Codes are bearer material; keep them out of debug output.
impl fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorizationCode(<{} chars>)", self.0.chars().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_ampersand_stays_inside_code() {
        let code = AuthorizationCode::from_raw("abc%26def").unwrap();
        assert_eq!(code.as_str(), "abc&def");
    }

    #[test]
    fn trailing_parameters_are_cut() {
        let code = AuthorizationCode::from_raw(" C0.b2F1dGg%40&session=xyz ").unwrap();
        assert_eq!(code.as_str(), "C0.b2F1dGg@");
    }

    #[test]
    fn pasted_redirect_url_yields_code() {
        let code = AuthorizationCode::from_pasted(
            "https://developer.schwab.com/oauth2-redirect.html?code=XYZ123&session=abc",
        )
        .unwrap();
        assert_eq!(code.as_str(), "XYZ123");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(AuthorizationCode::from_pasted("   ").is_none());
        assert!(AuthorizationCode::from_pasted("https://x/cb?code=&session=1").is_none());
        assert!(AuthorizationCode::from_raw("&state=1").is_none());
    }

    #[test]
    fn debug_hides_value() {
        let code = AuthorizationCode::from_raw("secret-code").unwrap();
        assert!(!format!("{:?}", code).contains("secret"));
    }
}
