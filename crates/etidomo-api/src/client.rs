// ETI/Domo HTTP client
//
// Wraps `reqwest::Client` with the gateway's single-endpoint transport:
// every request is a form POST to `/domo/` carrying one JSON document in
// the `command` field. Session handling lives in `session.rs`; endpoint
// groups (topology, devices, scenarios) are inherent methods in their own
// files so this module stays about transport and ack decoding.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, trace};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::models::{Reply, ack_reason_message};
use crate::transport::TransportConfig;

/// Session state shared by every request issued through one client.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub client_id: Option<String>,
    /// Bumped on every successful registration so callers can tell a
    /// fresh session from the one their caches were built against.
    pub epoch: u64,
}

/// Raw HTTP client for the ETI/Domo gateway.
///
/// Owns the session (`sl_client_id`) and decodes the session-layer ack
/// of every reply. Higher layers only ever see replies whose
/// `sl_data_ack_reason` was zero.
pub struct DomoClient {
    http: reqwest::Client,
    endpoint: Url,
    pub(crate) credentials: Credentials,
    timeout: Duration,
    session: RwLock<Session>,
}

impl DomoClient {
    /// Create a client for the gateway at `host` (name or IP, optional `:port`).
    pub fn new(
        host: &str,
        token: &SecretString,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let endpoint = Url::parse(&format!("http://{host}/domo/"))?;
        let http = transport.build_client(token)?;
        Ok(Self {
            http,
            endpoint,
            credentials,
            timeout: transport.timeout,
            session: RwLock::new(Session::default()),
        })
    }

    /// Create a client with a pre-built `reqwest::Client` and an explicit
    /// endpoint URL (the full `.../domo/` path).
    pub fn with_client(http: reqwest::Client, endpoint: Url, credentials: Credentials) -> Self {
        Self {
            http,
            endpoint,
            credentials,
            timeout: TransportConfig::default().timeout,
            session: RwLock::new(Session::default()),
        }
    }

    /// The `/domo/` endpoint every request is posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The login name used for session registration.
    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    /// The current session id, if logged in.
    pub fn client_id(&self) -> Option<String> {
        self.session_read().client_id.clone()
    }

    /// `true` while a session id is held.
    pub fn is_connected(&self) -> bool {
        self.session_read().client_id.is_some()
    }

    /// Number of successful registrations performed by this client.
    pub fn session_epoch(&self) -> u64 {
        self.session_read().epoch
    }

    /// Drop the cached session id so the next request logs in again.
    pub fn invalidate_session(&self) {
        if self.session_write().client_id.take().is_some() {
            debug!("session invalidated");
        }
    }

    pub(crate) fn session_read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn session_write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Transport ────────────────────────────────────────────────────

    /// Post one session-layer document and decode the ack.
    ///
    /// `expected_sl_cmd`, when given, must match the reply's `sl_cmd`.
    pub async fn send(&self, command: &Value, expected_sl_cmd: Option<&str>) -> Result<Reply, Error> {
        self.post(command, expected_sl_cmd, None).await
    }

    /// Like [`send`](Self::send), but lets the caller extend the request
    /// timeout for long-poll commands the gateway holds open on purpose.
    pub(crate) async fn post<T: Serialize + ?Sized>(
        &self,
        command: &T,
        expected_sl_cmd: Option<&str>,
        extra_wait: Option<Duration>,
    ) -> Result<Reply, Error> {
        let body = serde_json::to_string(command).map_err(Error::Encode)?;
        debug!("POST {}", self.endpoint);
        trace!(command = %body, "request");

        let mut request = self
            .http
            .post(self.endpoint.clone())
            .form(&[("command", body.as_str())]);
        let timeout = self.timeout + extra_wait.unwrap_or_default();
        if extra_wait.is_some() {
            request = request.timeout(timeout);
        }

        let resp = request.send().await.map_err(|e| self.map_transport(e, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "gateway returned an error status");
            return Err(Error::HttpStatus {
                status: status.as_u16(),
            });
        }

        let text = resp.text().await.map_err(|e| self.map_transport(e, timeout))?;
        trace!(body = %text, "response");
        parse_reply(&text, expected_sl_cmd)
    }

    fn map_transport(&self, e: reqwest::Error, timeout: Duration) -> Error {
        if e.is_timeout() {
            error!("timeout while talking to the gateway");
            Error::Timeout {
                timeout_secs: timeout.as_secs(),
            }
        } else {
            error!(error = %e, "transport error");
            Error::Transport(e)
        }
    }
}

/// Decode a raw reply body: check the ack reason, then the session command.
pub(crate) fn parse_reply(text: &str, expected_sl_cmd: Option<&str>) -> Result<Reply, Error> {
    let reply: Reply = serde_json::from_str(text).map_err(|_| {
        error!("reply is not a JSON object");
        Error::Gateway {
            message: "Error in sl_data_ack_reason, can't find value.".into(),
            errno: None,
        }
    })?;

    match reply.get("sl_data_ack_reason").and_then(Value::as_i64) {
        Some(0) => {}
        Some(code) => {
            let message = ack_reason_message(code)
                .map_or_else(|| format!("Unknown error (#{code})."), str::to_owned);
            error!(errno = code, "{message}");
            return Err(Error::Gateway {
                message,
                errno: Some(code),
            });
        }
        None => {
            error!("reply carries no sl_data_ack_reason");
            return Err(Error::Gateway {
                message: "Error in sl_data_ack_reason, can't find value.".into(),
                errno: None,
            });
        }
    }

    if let Some(expected) = expected_sl_cmd
        && reply.sl_cmd() != Some(expected)
    {
        error!(expected, actual = ?reply.sl_cmd(), "unexpected session reply");
        return Err(Error::UnexpectedResponse {
            expected: expected.to_owned(),
            actual: reply.sl_cmd().map(str::to_owned),
        });
    }

    Ok(reply)
}
