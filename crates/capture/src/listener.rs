//! One-request loopback HTTP listener that captures the OAuth redirect.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{RawQuery, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use core_lib::{
    code::{percent_decode, AuthorizationCode},
    AuthError,
};
use tokio::{net::TcpListener, sync::oneshot};
use tracing::{debug, warn};

const SUCCESS_HTML: &str =
    "<html><body><p>Token received. You can close this tab and check the terminal.</p></body></html>";

/// What the first request to the listener carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The `code` query value, still percent-encoded.
    Code(String),
    /// The decoded `error` value; empty when the query had neither field.
    Denied(String),
    /// A request to a path other than `/` or `/callback`.
    NotFound(String),
}

impl CallbackOutcome {
    pub fn into_code(self) -> Result<AuthorizationCode, AuthError> {
        match self {
            CallbackOutcome::Code(raw) => AuthorizationCode::from_raw(&raw)
                .ok_or_else(|| AuthError::Capture("the callback carried an empty code".to_string())),
            CallbackOutcome::Denied(error) if error.is_empty() => Err(AuthError::Capture(
                "the callback carried neither code nor error".to_string(),
            )),
            CallbackOutcome::Denied(error) => Err(AuthError::Capture(format!(
                "authorization was not granted ({})",
                error
            ))),
            CallbackOutcome::NotFound(path) => Err(AuthError::Capture(format!(
                "unexpected request to {}",
                path
            ))),
        }
    }
}

type Slot = Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>;

pub struct CallbackListener {
    listener: TcpListener,
    addr: SocketAddr,
}

impl CallbackListener {
    pub async fn bind(addr: SocketAddr) -> Result<Self, AuthError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| AuthError::Capture(format!("cannot listen on {}: {}", addr, err)))?;
        let addr = listener
            .local_addr()
            .map_err(|err| AuthError::Capture(format!("cannot read listener address: {}", err)))?;

        Ok(Self { listener, addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn wait_for_code(self, timeout: Option<Duration>) -> Result<AuthorizationCode, AuthError> {
        self.wait_for_outcome(timeout).await?.into_code()
    }

    /// Serves until the first request has been answered, then shuts down.
    ///
    /// With `timeout` set to `None` this waits for as long as the operator
    /// takes in the browser.
    pub async fn wait_for_outcome(
        self,
        timeout: Option<Duration>,
    ) -> Result<CallbackOutcome, AuthError> {
        let (tx, rx) = oneshot::channel();
        let slot: Slot = Arc::new(Mutex::new(Some(tx)));

        let app = Router::new()
            .route("/", get(callback))
            .route("/callback", get(callback))
            .fallback(not_found)
            .with_state(slot);

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let listener = self.listener;
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.await;
                })
                .await
        });

        debug!(addr = %self.addr, "waiting for the authorization redirect");
        let closed = || AuthError::Capture("the callback listener stopped unexpectedly".to_string());
        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(result) => result.map_err(|_| closed()),
                Err(_) => Err(AuthError::Capture(format!(
                    "no redirect arrived within {} seconds",
                    limit.as_secs()
                ))),
            },
            None => rx.await.map_err(|_| closed()),
        };

        let _ = stop_tx.send(());
        match server.await {
            Ok(Ok(())) => debug!("callback listener closed"),
            Ok(Err(err)) => warn!(error = %err, "callback listener failed"),
            Err(err) => warn!(error = %err, "callback listener task aborted"),
        }

        received
    }
}

async fn callback(State(slot): State<Slot>, RawQuery(query): RawQuery) -> Response {
    let outcome = parse_query(query.as_deref().unwrap_or_default());
    let response = match &outcome {
        CallbackOutcome::Code(_) => (StatusCode::OK, Html(SUCCESS_HTML)).into_response(),
        CallbackOutcome::Denied(error) | CallbackOutcome::NotFound(error) => {
            (StatusCode::BAD_REQUEST, format!("Error: {}", error)).into_response()
        }
    };
    if deliver(&slot, outcome) {
        response
    } else {
        (StatusCode::CONFLICT, "Error: the redirect was already handled").into_response()
    }
}

async fn not_found(State(slot): State<Slot>, uri: Uri) -> StatusCode {
    deliver(&slot, CallbackOutcome::NotFound(uri.path().to_string()));
    StatusCode::NOT_FOUND
}

// Only the first request is recorded; returns whether this one was.
fn deliver(slot: &Slot, outcome: CallbackOutcome) -> bool {
    let sender = slot.lock().ok().and_then(|mut guard| guard.take());
    match sender {
        Some(tx) => {
            let _ = tx.send(outcome);
            true
        }
        None => {
            debug!(?outcome, "ignoring request after the first one");
            false
        }
    }
}

/// Splits the raw query without decoding so the code is decoded exactly once.
fn parse_query(query: &str) -> CallbackOutcome {
    let mut code = None;
    let mut error = None;

    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            "code" if code.is_none() && !value.is_empty() => code = Some(value),
            "error" if error.is_none() => error = Some(value),
            _ => {}
        }
    }

    match code {
        Some(code) => CallbackOutcome::Code(code.to_string()),
        None => CallbackOutcome::Denied(percent_decode(&error.unwrap_or_default().replace('+', " "))),
    }
}
