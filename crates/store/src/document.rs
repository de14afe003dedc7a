//! Line-oriented model of a `.env` file and the token patch applied to it.
//!
//! Every line is kept as raw text; only assignments to the two token keys are
//! recognized, so a rewrite never disturbs anything else in the file.

pub const ACCESS_TOKEN_KEY: &str = "SCHWAB_ACCESS_TOKEN";
pub const REFRESH_TOKEN_KEY: &str = "SCHWAB_REFRESH_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedKey {
    AccessToken,
    RefreshToken,
}

impl ManagedKey {
    pub fn name(self) -> &'static str {
        match self {
            ManagedKey::AccessToken => ACCESS_TOKEN_KEY,
            ManagedKey::RefreshToken => REFRESH_TOKEN_KEY,
        }
    }

    fn index(self) -> usize {
        match self {
            ManagedKey::AccessToken => 0,
            ManagedKey::RefreshToken => 1,
        }
    }

    fn assignment(self, value: &str) -> String {
        format!("{}={}\n", self.name(), value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvLine {
    Passthrough(String),
    Managed {
        key: ManagedKey,
        commented: bool,
        value: String,
        raw: String,
    },
}

/// An ordered list of line records; `render` reproduces the input byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDocument {
    lines: Vec<EnvLine>,
}

impl EnvDocument {
    pub fn parse(contents: &str) -> Self {
        let lines = contents
            .split_inclusive('\n')
            .map(|raw| match classify(raw) {
                Some((key, commented, value)) => EnvLine::Managed {
                    key,
                    commented,
                    value,
                    raw: raw.to_string(),
                },
                None => EnvLine::Passthrough(raw.to_string()),
            })
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[EnvLine] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| match line {
                EnvLine::Passthrough(raw) => raw.as_str(),
                EnvLine::Managed { raw, .. } => raw.as_str(),
            })
            .collect()
    }

    /// Writes the token values into the document.
    ///
    /// The first active or commented line for a key is replaced in place,
    /// later active lines for that key are removed and missing keys are
    /// appended. With no refresh token, a document that already stores a
    /// refresh value keeps every refresh line as it is; otherwise the first
    /// placeholder becomes an empty assignment.
    pub fn apply_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> Self {
        let keep_stored_refresh = refresh_token.is_none() && self.has_stored_refresh();
        let mut written = [false; 2];
        let mut out = Vec::with_capacity(self.lines.len() + 2);

        for line in &self.lines {
            let EnvLine::Managed {
                key, commented, raw, ..
            } = line
            else {
                out.push(line.clone());
                continue;
            };

            if *key == ManagedKey::RefreshToken && keep_stored_refresh {
                out.push(line.clone());
                continue;
            }

            if written[key.index()] {
                if *commented {
                    out.push(line.clone());
                }
                continue;
            }

            let value = match key {
                ManagedKey::AccessToken => access_token,
                ManagedKey::RefreshToken => refresh_token.unwrap_or_default(),
            };
            written[key.index()] = true;
            out.push(managed(*key, value, raw.ends_with('\n')));
        }

        let mut appended = Vec::new();
        if !written[ManagedKey::AccessToken.index()] {
            appended.push(managed(ManagedKey::AccessToken, access_token, true));
        }
        if let Some(refresh) = refresh_token {
            if !written[ManagedKey::RefreshToken.index()] {
                appended.push(managed(ManagedKey::RefreshToken, refresh, true));
            }
        }

        if !appended.is_empty() {
            if let Some(last) = out.last_mut() {
                terminate(last);
            }
            out.extend(appended);
        }

        Self { lines: out }
    }

    fn has_stored_refresh(&self) -> bool {
        self.lines.iter().any(|line| {
            matches!(
                line,
                EnvLine::Managed {
                    key: ManagedKey::RefreshToken,
                    commented: false,
                    value,
                    ..
                } if !value.is_empty()
            )
        })
    }
}

fn managed(key: ManagedKey, value: &str, newline: bool) -> EnvLine {
    let mut raw = key.assignment(value);
    if !newline {
        raw.pop();
    }
    EnvLine::Managed {
        key,
        commented: false,
        value: value.to_string(),
        raw,
    }
}

fn terminate(line: &mut EnvLine) {
    let raw = match line {
        EnvLine::Passthrough(raw) => raw,
        EnvLine::Managed { raw, .. } => raw,
    };
    if !raw.ends_with('\n') {
        raw.push('\n');
    }
}

/// Recognizes `KEY=value` and `# KEY=value` for the managed keys.
fn classify(raw: &str) -> Option<(ManagedKey, bool, String)> {
    let trimmed = raw.trim();
    let (commented, body) = match trimmed.strip_prefix('#') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };

    [ManagedKey::AccessToken, ManagedKey::RefreshToken]
        .into_iter()
        .find_map(|key| {
            body.strip_prefix(key.name())
                .and_then(|rest| rest.trim_start().strip_prefix('='))
                .map(|value| (key, commented, value.trim().to_string()))
        })
}
