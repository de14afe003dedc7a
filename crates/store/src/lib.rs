use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use core_lib::{token::TokenSet, AuthError};
use tracing::debug;

pub mod document;

pub use document::{EnvDocument, EnvLine, ManagedKey, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

const BOM: char = '\u{feff}';

pub trait TokenStore {
    fn save_tokens(&self, token_set: &TokenSet) -> Result<(), AuthError>;
    fn load_tokens(&self) -> Result<Option<TokenSet>, AuthError>;
}

/// Key=value configuration file that also receives the issued tokens.
#[derive(Debug, Clone)]
pub struct EnvFileStore {
    path: PathBuf,
}

impl EnvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all assignments; a missing file yields an empty mapping.
    pub fn load(&self) -> Result<HashMap<String, String>, AuthError> {
        Ok(read_optional(&self.path)?
            .map(|contents| parse_assignments(&contents))
            .unwrap_or_default())
    }

    /// Rewrites the file with the token keys updated in place or appended.
    ///
    /// The whole file is rewritten in one go; there is no recovery from a
    /// write interrupted halfway.
    pub fn persist(&self, access_token: &str, refresh_token: Option<&str>) -> Result<(), AuthError> {
        let current = read_optional(&self.path)?.unwrap_or_default();
        let patched = EnvDocument::parse(&current).apply_tokens(access_token, refresh_token);

        debug!(
            path = %self.path.display(),
            lines = patched.lines().len(),
            with_refresh = refresh_token.is_some(),
            "writing tokens to config file"
        );
        fs::write(&self.path, patched.render())?;
        Ok(())
    }
}

impl TokenStore for EnvFileStore {
    fn save_tokens(&self, token_set: &TokenSet) -> Result<(), AuthError> {
        self.persist(&token_set.access_token, token_set.refresh_token.as_deref())
    }

    fn load_tokens(&self) -> Result<Option<TokenSet>, AuthError> {
        let values = self.load()?;
        let access_token = match values.get(ACCESS_TOKEN_KEY).filter(|v| !v.is_empty()) {
            Some(token) => token,
            None => return Ok(None),
        };
        let refresh_token = values
            .get(REFRESH_TOKEN_KEY)
            .map(String::as_str)
            .filter(|v| !v.is_empty());

        Ok(Some(TokenSet::new(access_token, refresh_token, None)))
    }
}

/// Parses `KEY=VALUE` lines, skipping blanks, comments and lines without `=`.
pub fn parse_assignments(contents: &str) -> HashMap<String, String> {
    let contents = contents.strip_prefix(BOM).unwrap_or(contents);
    let mut out = HashMap::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .trim_matches(BOM);
            out.insert(key.trim().to_string(), value.to_string());
        }
    }

    out
}

fn read_optional(path: &Path) -> Result<Option<String>, AuthError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}
