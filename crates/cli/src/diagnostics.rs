//! Operator-facing reporting of the final result.

use std::io::{self, Write};

use core_lib::AuthError;

use crate::flow::Outcome;

pub const INVALID_CLIENT_HINT: &str = "\
Hint: 401 invalid_client usually means the App Key / App Secret pair was not accepted. Check:
  1. Open https://developer.schwab.com, go to your app and confirm the Consumer Key and Consumer Secret
     match the .env values exactly (copy and paste them again if unsure).
  2. If the secret was ever regenerated in the portal, the old one no longer works; put the newest
     secret in .env.
  3. Alternative: on the portal's API documentation page use \"Authorize\" with the App Key and Secret,
     then copy the returned access_token into SCHWAB_ACCESS_TOKEN in .env.";

/// Process exit status for a finished run.
pub fn exit_code<T>(result: &Result<T, AuthError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

pub fn report_success<W: Write>(out: &mut W, outcome: &Outcome) -> io::Result<()> {
    writeln!(out, "Wrote {}", outcome.env_path.display())?;
    if outcome.tokens.refresh_token.is_none() {
        writeln!(out, "The provider returned no refresh token; only SCHWAB_ACCESS_TOKEN was updated.")?;
    }
    if let Some(expires_at) = outcome.tokens.expires_at {
        writeln!(out, "The access token expires at {}.", expires_at.to_rfc3339())?;
    }
    writeln!(out, "Restart the application to start using Schwab data.")
}

pub fn report_failure<W: Write>(out: &mut W, err: &AuthError) -> io::Result<()> {
    match err {
        AuthError::MissingCredentials(path) => {
            writeln!(out, "Set SCHWAB_APP_KEY and SCHWAB_APP_SECRET in {} (or in the environment).", path)?;
        }
        AuthError::Capture(reason) => {
            writeln!(out, "No authorization code was received ({}). Please try again.", reason)?;
        }
        AuthError::Exchange { status, body } => {
            writeln!(out, "Token exchange failed: {} {}", status, body)?;
        }
        AuthError::MissingToken(body) => {
            writeln!(out, "The response contains no access_token: {}", body)?;
        }
        other => writeln!(out, "{}", other)?,
    }

    if err.is_invalid_client() {
        writeln!(out)?;
        writeln!(out, "{}", INVALID_CLIENT_HINT)?;
    }
    Ok(())
}
