use thiserror::Error;

/// Top-level error type for the `etidomo-api` crate.
///
/// The gateway's own taxonomy is a three-level hierarchy: a connection
/// timeout is a connection error, and every connection error is a gateway
/// error. Rust enums are flat, so the hierarchy is exposed through
/// [`is_timeout`](Self::is_timeout) and
/// [`is_connection_error`](Self::is_connection_error) instead.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// The gateway did not answer within the request timeout.
    #[error("Timeout occurred while connecting to ETI/Domo gateway ({timeout_secs}s)")]
    Timeout { timeout_secs: u64 },

    /// HTTP transport error (connection refused, DNS failure, reset, etc.)
    #[error("Error occurred while communicating with ETI/Domo gateway: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with a non-success HTTP status.
    #[error("ETI/Domo gateway returned HTTP {status}")]
    HttpStatus { status: u16 },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Protocol ────────────────────────────────────────────────────
    /// Non-zero `sl_data_ack_reason`, decoded through the gateway error table.
    #[error("{message}")]
    Gateway { message: String, errno: Option<i64> },

    /// The reply's command tag did not match the one the caller expected.
    #[error("Invalid server response. Expected {expected:?}. Actual {actual:?}")]
    UnexpectedResponse {
        expected: String,
        actual: Option<String>,
    },

    /// The reply body was not a JSON object.
    #[error("Malformed gateway response: {message}")]
    MalformedResponse { message: String, body: String },

    /// A request payload could not be encoded as JSON.
    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// A successful registration reply without a usable `sl_client_id`.
    #[error("Error in sl_client_id, can't get value")]
    MissingClientId,
}

impl Error {
    /// `true` for the `ConnectionTimeout` class.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// `true` for the `ConnectionError` class (timeouts included).
    ///
    /// These are the only errors that invalidate the cached session id.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Transport(_) | Self::HttpStatus { .. }
        )
    }

    /// The gateway error number, if the failure was a decoded ack reason.
    pub fn errno(&self) -> Option<i64> {
        match self {
            Self::Gateway { errno, .. } => *errno,
            _ => None,
        }
    }
}
