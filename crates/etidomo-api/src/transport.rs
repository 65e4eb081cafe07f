// Shared transport configuration for building reqwest::Client instances.
//
// The gateway speaks plain HTTP on the local network, so there is no TLS
// tuning here: only timeouts, the user agent and the static header set
// every request carries.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

pub(crate) const USER_AGENT: &str = concat!("etidomo/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout. Long-poll requests add their server-side wait on top.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` that sends the gateway access token on every request.
    ///
    /// The token goes out as `Authorization: access_token <token>`; the header
    /// is marked sensitive so it never shows up in debug output.
    pub fn build_client(&self, token: &SecretString) -> Result<reqwest::Client, Error> {
        let mut auth = HeaderValue::from_str(&format!("access_token {}", token.expose_secret()))
            .map_err(|e| Error::ClientBuild(format!("invalid access token: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }
}
