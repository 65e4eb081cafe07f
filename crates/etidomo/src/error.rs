//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use etidomo_config::ConfigError;
use etidomo_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

/// Gateway error number for a rejected login.
const ERRNO_INVALID_USER: i64 = 1;

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the ETI/Domo gateway: {reason}")]
    #[diagnostic(
        code(etidomo::connection_failed),
        help(
            "Check that the gateway is powered and reachable on the local network.\n\
             Try: etidomo info --host <address>"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Gateway did not answer within {seconds}s")]
    #[diagnostic(
        code(etidomo::timeout),
        help("Increase the timeout with --timeout or check the gateway's load.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Login rejected: {message}")]
    #[diagnostic(
        code(etidomo::auth_failed),
        help(
            "Verify the username and password.\n\
             Run: etidomo config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No {what} configured for profile '{profile}'")]
    #[diagnostic(
        code(etidomo::no_credentials),
        help(
            "Store it with: etidomo config set-{what}\n\
             Or set the matching ETIDOMO_* environment variable."
        )
    )]
    NoCredentials { profile: String, what: String },

    // ── Gateway ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(etidomo::gateway))]
    Gateway { message: String, errno: Option<i64> },

    #[error("Unexpected gateway reply: {message}")]
    #[diagnostic(code(etidomo::protocol))]
    Protocol { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(etidomo::not_found),
        help("Run: etidomo {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Device '{name}' has no action id and cannot be controlled")]
    #[diagnostic(
        code(etidomo::unmanaged),
        help("Passive devices (meters, sensors) are read-only.")
    )]
    Unmanaged { name: String },

    #[error("'{operation}' is not supported by {device_type} devices")]
    #[diagnostic(code(etidomo::unsupported))]
    Unsupported {
        operation: String,
        device_type: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(etidomo::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(etidomo::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No gateway configured")]
    #[diagnostic(
        code(etidomo::no_config),
        help(
            "Add a profile to {path}\n\
             or pass --host, --token, --username and --password."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(etidomo::config))]
    Config(Box<ConfigError>),

    // ── Internal / IO / Serialization ────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(etidomo::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Unmanaged { .. } | Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionTimeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed { reason },

            CoreError::GatewayDisconnected => CliError::ConnectionFailed {
                reason: "gateway connection was closed".into(),
            },

            CoreError::Gateway { message, errno } if errno == Some(ERRNO_INVALID_USER) => {
                CliError::AuthFailed { message }
            }

            CoreError::Gateway { message, errno } => CliError::Gateway { message, errno },

            CoreError::Protocol { message } => CliError::Protocol { message },

            CoreError::UnmanagedDevice { name } => CliError::Unmanaged { name },

            CoreError::DeviceNotFound { identifier } => CliError::NotFound {
                resource_type: "device".into(),
                identifier,
                list_command: "devices list".into(),
            },

            CoreError::Unsupported {
                operation,
                device_type,
            } => CliError::Unsupported {
                operation,
                device_type,
            },

            CoreError::InvalidArgument { message } => CliError::Validation {
                field: "arguments".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "gateway config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile, what } => CliError::NoCredentials {
                profile,
                what: what.into(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Gateway(core) => core.into(),
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_user_is_an_auth_failure() {
        let err: CliError = CoreError::Gateway {
            message: "Invalid user.".into(),
            errno: Some(1),
        }
        .into();
        assert!(matches!(err, CliError::AuthFailed { .. }));
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn exit_codes_follow_error_class() {
        let timeout: CliError = CoreError::ConnectionTimeout { timeout_secs: 30 }.into();
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);

        let missing: CliError = CoreError::DeviceNotFound {
            identifier: "Garage".into(),
        }
        .into();
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);

        let passive: CliError = CoreError::UnmanagedDevice {
            name: "Meter".into(),
        }
        .into();
        assert_eq!(passive.exit_code(), exit_code::UNSUPPORTED);

        let empty: CliError = CoreError::InvalidArgument {
            message: "At least one argument is required".into(),
        }
        .into();
        assert_eq!(empty.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn missing_secret_names_the_kind() {
        let err: CliError = ConfigError::NoCredentials {
            profile: "home".into(),
            what: "token",
        }
        .into();
        assert_eq!(err.to_string(), "No token configured for profile 'home'");
    }
}
