use std::{io, net::SocketAddr, time::Duration};

use core_lib::{code::AuthorizationCode, AuthError};
use tracing::{debug, warn};

pub mod listener;
pub mod prompt;

pub use listener::{CallbackListener, CallbackOutcome};

/// The ways an authorization code can be obtained; exactly one runs per invocation.
#[derive(Debug, Clone)]
pub enum CodeSource {
    /// Loopback listener that receives the browser redirect.
    LocalListener {
        addr: SocketAddr,
        timeout: Option<Duration>,
        launch_browser: bool,
    },
    /// A code (or redirect URL) already known to the caller.
    Supplied(String),
    /// Operator copies the code from the provider-hosted callback page.
    ManualPaste { launch_browser: bool },
}

impl CodeSource {
    pub async fn acquire(
        self,
        auth_url: &str,
        redirect_uri: &str,
    ) -> Result<AuthorizationCode, AuthError> {
        match self {
            CodeSource::Supplied(raw) => AuthorizationCode::from_pasted(&raw)
                .ok_or_else(|| AuthError::Capture("the supplied code is empty".to_string())),
            CodeSource::LocalListener {
                addr,
                timeout,
                launch_browser,
            } => {
                println!("1. Make sure this callback URL is registered in your Schwab app:");
                println!("   {}", redirect_uri);
                println!();
                println!("2. Sign in with your Schwab account in the browser and approve access...");

                let listener = CallbackListener::bind(addr).await?;
                debug!(addr = %listener.local_addr(), "callback listener bound");
                show_link(auth_url, launch_browser);
                listener.wait_for_code(timeout).await
            }
            CodeSource::ManualPaste { launch_browser } => {
                let auth_url = auth_url.to_string();
                let redirect_uri = redirect_uri.to_string();
                tokio::task::spawn_blocking(move || {
                    let stdin = io::stdin();
                    let mut input = stdin.lock();
                    let mut out = io::stdout();
                    prompt::manual_paste(&mut input, &mut out, &auth_url, &redirect_uri, |url| {
                        show_link(url, launch_browser)
                    })
                })
                .await
                .map_err(|err| AuthError::Capture(format!("prompt task failed: {}", err)))?
            }
        }
    }
}

fn show_link(url: &str, launch_browser: bool) {
    if launch_browser {
        open_browser(url);
    } else {
        println!("Open this URL in your browser:");
        println!("   {}", url);
    }
}

/// Opens `url` in the default browser, printing it when that is not possible.
pub fn open_browser(url: &str) {
    if let Err(e) = webbrowser::open(url) {
        warn!(error = %e, "could not launch a browser");
        println!("Could not open the browser automatically. Open this URL manually:");
        println!("   {}", url);
    }
}
