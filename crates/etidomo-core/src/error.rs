// ── Core error types ──
//
// User-facing errors from etidomo-core. Consumers never match on HTTP
// details or ack frames; the `From<etidomo_api::Error>` impl folds the
// transport taxonomy into these variants while keeping the
// timeout / connection / gateway classification intact.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Gateway connection timed out after {timeout_secs}s")]
    ConnectionTimeout { timeout_secs: u64 },

    #[error("Cannot reach gateway: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Gateway disconnected")]
    GatewayDisconnected,

    // ── Gateway / protocol errors ────────────────────────────────────
    #[error("Gateway error: {message}")]
    Gateway { message: String, errno: Option<i64> },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // ── Device errors ────────────────────────────────────────────────
    #[error("Device {name:?} has no action id and cannot be controlled")]
    UnmanagedDevice { name: String },

    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Operation {operation} is not supported by {device_type} devices")]
    Unsupported {
        operation: String,
        device_type: String,
    },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` for transport failures, timeouts included.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::ConnectionFailed { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }

    /// The gateway error number behind a decoded ack failure.
    pub fn errno(&self) -> Option<i64> {
        match self {
            Self::Gateway { errno, .. } => *errno,
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<etidomo_api::Error> for CoreError {
    fn from(err: etidomo_api::Error) -> Self {
        use etidomo_api::Error as Api;

        match err {
            Api::Timeout { timeout_secs } => CoreError::ConnectionTimeout { timeout_secs },
            Api::Transport(ref e) if e.is_timeout() => {
                CoreError::ConnectionTimeout { timeout_secs: 0 }
            }
            Api::Transport(e) => CoreError::ConnectionFailed {
                reason: e.to_string(),
            },
            Api::HttpStatus { status } => CoreError::ConnectionFailed {
                reason: format!("HTTP {status}"),
            },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid gateway address: {e}"),
            },
            Api::ClientBuild(message) => CoreError::Config { message },
            Api::Gateway { message, errno } => CoreError::Gateway { message, errno },
            err @ Api::MissingClientId => CoreError::Gateway {
                message: err.to_string(),
                errno: None,
            },
            err @ (Api::UnexpectedResponse { .. } | Api::MalformedResponse { .. }) => {
                CoreError::Protocol {
                    message: err.to_string(),
                }
            }
            Api::Encode(e) => CoreError::Internal(e.to_string()),
        }
    }
}
