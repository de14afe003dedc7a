use std::io::{self, BufRead, Write};

use core_lib::{code::AuthorizationCode, AuthError};

fn console(err: io::Error) -> AuthError {
    AuthError::Capture(format!("console I/O failed: {}", err))
}

/// Walks the operator through authorizing in the browser and pasting the code back.
///
/// `open` is called with the authorization link once the operator presses Enter.
/// The pasted text may be the bare code or the full redirect URL.
pub fn manual_paste<R, W, F>(
    input: &mut R,
    out: &mut W,
    auth_url: &str,
    redirect_uri: &str,
    open: F,
) -> Result<AuthorizationCode, AuthError>
where
    R: BufRead,
    W: Write,
    F: FnOnce(&str),
{
    writeln!(out, "[Manual mode: copy the code from the browser]").map_err(console)?;
    writeln!(out).map_err(console)?;
    writeln!(out, "1. Make sure this callback URL is registered in your Schwab app:").map_err(console)?;
    writeln!(out, "   {}", redirect_uri).map_err(console)?;
    writeln!(out).map_err(console)?;
    writeln!(out, "2. A browser window will open; sign in with your Schwab account and approve access.").map_err(console)?;
    writeln!(out, "   After the redirect the address bar contains code=...; copy everything after code=.").map_err(console)?;
    writeln!(out).map_err(console)?;
    write!(out, "Press Enter to open the browser...").map_err(console)?;
    out.flush().map_err(console)?;

    let mut line = String::new();
    input.read_line(&mut line).map_err(console)?;
    open(auth_url);

    writeln!(out).map_err(console)?;
    write!(out, "Paste the code (or the whole redirect URL): ").map_err(console)?;
    out.flush().map_err(console)?;

    line.clear();
    input.read_line(&mut line).map_err(console)?;

    AuthorizationCode::from_pasted(&line)
        .ok_or_else(|| AuthError::Capture("nothing usable was pasted".to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn pasted_url_is_reduced_to_code() {
        let mut input = Cursor::new(
            "\nhttps://developer.schwab.com/oauth2-redirect.html?code=XYZ123&session=abc\n",
        );
        let mut out = Vec::new();
        let mut opened = None;

        let code = manual_paste(
            &mut input,
            &mut out,
            "https://auth.example/authorize",
            "https://developer.schwab.com/oauth2-redirect.html",
            |url| opened = Some(url.to_string()),
        )
        .unwrap();

        assert_eq!(code.as_str(), "XYZ123");
        assert_eq!(opened.as_deref(), Some("https://auth.example/authorize"));
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("https://developer.schwab.com/oauth2-redirect.html"));
    }

    #[test]
    fn bare_code_is_decoded() {
        let mut input = Cursor::new("\n  C0.abc%40  \n");
        let mut out = Vec::new();

        let code = manual_paste(&mut input, &mut out, "u", "r", |_| {}).unwrap();
        assert_eq!(code.as_str(), "C0.abc@");
    }

    #[test]
    fn empty_paste_fails() {
        let mut input = Cursor::new("\n\n");
        let mut out = Vec::new();

        let err = manual_paste(&mut input, &mut out, "u", "r", |_| {}).unwrap_err();
        assert!(matches!(err, AuthError::Capture(_)));
    }

    #[test]
    fn closed_stdin_fails() {
        let mut input = Cursor::new("");
        let mut out = Vec::new();

        assert!(manual_paste(&mut input, &mut out, "u", "r", |_| {}).is_err());
    }
}
