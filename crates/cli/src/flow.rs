//! Drives one authorization run: credentials, code capture, exchange, persistence.

use std::{
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use capture::CodeSource;
use core_lib::{credentials::ClientCredentials, token::TokenSet, AuthError, OAuthProvider};
use schwab::{loopback_redirect_uri, SchwabEndpoints, SchwabProvider, PORTAL_REDIRECT_URI};
use store::{EnvFileStore, TokenStore};
use tracing::debug;

use crate::args::Args;

pub const REDIRECT_URI_VAR: &str = "SCHWAB_REDIRECT_URI";

/// Everything a run needs once the command line has been interpreted.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub env_path: PathBuf,
    pub redirect_uri: String,
    pub source: CodeSource,
}

impl Invocation {
    pub fn from_args<F>(args: &Args, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let redirect_uri = resolve_redirect_uri(
            args.redirect_uri.as_deref(),
            args.manual,
            env(REDIRECT_URI_VAR),
            args.port,
        );

        let launch_browser = !args.no_browser;
        let source = match (&args.code, args.manual) {
            (Some(code), _) => CodeSource::Supplied(code.clone()),
            (None, true) => CodeSource::ManualPaste { launch_browser },
            (None, false) => CodeSource::LocalListener {
                addr: SocketAddr::from((Ipv4Addr::LOCALHOST, args.port)),
                timeout: args.callback_timeout.map(Duration::from_secs),
                launch_browser,
            },
        };

        Self {
            env_path: resolve_env_path(&args.env),
            redirect_uri,
            source,
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub env_path: PathBuf,
    pub tokens: TokenSet,
}

/// The workspace root, which relative `--env` paths are anchored to.
///
/// A binary installed away from its source tree no longer finds that
/// directory and uses the working directory instead.
pub fn project_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    existing_or_current(manifest_dir.ancestors().nth(2).unwrap_or(manifest_dir))
}

fn existing_or_current(candidate: &Path) -> PathBuf {
    if candidate.is_dir() {
        candidate.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

pub fn resolve_env_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root().join(path)
    }
}

/// Explicit flag, then the portal page in manual mode, then the environment,
/// then the loopback listener.
pub fn resolve_redirect_uri(
    explicit: Option<&str>,
    manual: bool,
    from_env: Option<String>,
    port: u16,
) -> String {
    if let Some(uri) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
        return uri.to_string();
    }
    if manual {
        return PORTAL_REDIRECT_URI.to_string();
    }
    from_env
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| loopback_redirect_uri(port))
}

/// Runs the whole flow against `endpoints`; `env` supplies process variables.
pub async fn run<F>(
    invocation: Invocation,
    endpoints: SchwabEndpoints,
    env: F,
) -> Result<Outcome, AuthError>
where
    F: Fn(&str) -> Option<String>,
{
    let store = EnvFileStore::new(&invocation.env_path);
    let values = store.load()?;
    let credentials = ClientCredentials::resolve(
        &values,
        &env,
        &invocation.env_path.display().to_string(),
    )?;

    println!(
        "[self-check] App Key length: {}, Secret length: {}",
        credentials.client_id.len(),
        credentials.client_secret.len()
    );

    let provider = SchwabProvider::with_endpoints(credentials, endpoints)?;
    let tokens = authorize(
        &provider,
        &store,
        invocation.source,
        &invocation.redirect_uri,
    )
    .await?;

    Ok(Outcome {
        env_path: invocation.env_path,
        tokens,
    })
}

/// Captures a code, exchanges it and stores the resulting tokens.
pub async fn authorize<P, S>(
    provider: &P,
    store: &S,
    source: CodeSource,
    redirect_uri: &str,
) -> Result<TokenSet, AuthError>
where
    P: OAuthProvider + Sync,
    S: TokenStore,
{
    let auth_url = provider.auth_url(redirect_uri);
    debug!(%auth_url, "authorization link built");

    let code = source.acquire(&auth_url, redirect_uri).await?;
    let tokens = provider.exchange_code(&code, redirect_uri).await?;

    println!();
    println!("Token obtained. Writing it to the config file...");
    store.save_tokens(&tokens)?;
    Ok(tokens)
}
