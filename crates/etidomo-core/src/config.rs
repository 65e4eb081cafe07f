// ── Runtime connection configuration ──
//
// Describes how to reach one ETI/Domo gateway. Carries credentials and
// timing knobs but never touches disk; the CLI (or any embedder) builds
// a `GatewayConfig` and hands it in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::CoreError;

/// Configuration for a single gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host name or IP address, optionally with `:port`.
    pub host: String,
    /// Static access token sent with every HTTP request.
    pub token: SecretString,
    /// Session-layer login.
    pub username: String,
    pub password: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Server-side wait for long-poll status requests. `None` lets the
    /// gateway pick.
    pub poll_timeout_secs: Option<u64>,
    /// Sleep between poll attempts while the gateway is unreachable.
    pub reconnect_delay: Duration,
}

impl GatewayConfig {
    /// Build a config with default timings.
    ///
    /// Fails when the access token is empty: the gateway rejects every
    /// request without it.
    pub fn new(
        host: impl Into<String>,
        token: SecretString,
        username: impl Into<String>,
        password: SecretString,
    ) -> Result<Self, CoreError> {
        let config = Self {
            host: host.into(),
            token,
            username: username.into(),
            password,
            timeout: Duration::from_secs(30),
            poll_timeout_secs: None,
            reconnect_delay: Duration::from_secs(1),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.host.trim().is_empty() {
            return Err(CoreError::Config {
                message: "Gateway host is REQUIRED".into(),
            });
        }
        if self.token.expose_secret().trim().is_empty() {
            return Err(CoreError::Config {
                message: "Access token is REQUIRED".into(),
            });
        }
        Ok(())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_timeout(mut self, secs: Option<u64>) -> Self {
        self.poll_timeout_secs = secs;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}
