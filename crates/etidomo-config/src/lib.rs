//! Shared configuration for the etidomo tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `etidomo_core::GatewayConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use etidomo_core::{CoreError, GatewayConfig, TravelTimes};

/// Keyring service name all secrets are stored under.
pub const KEYRING_SERVICE: &str = "etidomo";

const ENV_PREFIX: &str = "ETIDOMO_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {what} configured for profile '{profile}'")]
    NoCredentials { profile: String, what: &'static str },

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Gateway(#[from] CoreError),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named gateway profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The profile called `name`, or the default profile.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile(name.into()))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named gateway profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Gateway host or IP, optionally with `:port`.
    pub host: String,

    /// Session login name.
    pub username: Option<String>,

    /// Session password (plaintext, prefer keyring).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Static access token (plaintext, prefer keyring).
    pub token: Option<String>,

    /// Environment variable holding the access token.
    pub token_env: Option<String>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,

    /// Server-side long-poll wait in seconds.
    pub poll_timeout: Option<u64>,

    /// Retry delay in seconds while the gateway is offline.
    pub reconnect_delay: Option<u64>,

    /// Full opening travel time of covers, in seconds.
    pub cover_opening_time: Option<u64>,

    /// Full closing travel time of covers, in seconds.
    pub cover_closing_time: Option<u64>,
}

impl Profile {
    /// Cover travel times, falling back to the defaults.
    pub fn travel_times(&self) -> TravelTimes {
        let defaults = TravelTimes::default();
        TravelTimes {
            opening: self
                .cover_opening_time
                .map_or(defaults.opening, Duration::from_secs),
            closing: self
                .cover_closing_time
                .map_or(defaults.closing, Duration::from_secs),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "etidomo", "etidomo").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("etidomo");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full config from the canonical file plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` plus `ETIDOMO_` environment variables.
///
/// Nested keys use a double underscore:
/// `ETIDOMO_PROFILES__HOME__HOST=192.168.1.3`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if nothing can be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// A secret kept in the keyring, one entry per profile and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Token,
    Password,
}

impl SecretKind {
    fn key(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Password => "password",
        }
    }

    fn env_var(self) -> String {
        match self {
            Self::Token => format!("{ENV_PREFIX}TOKEN"),
            Self::Password => format!("{ENV_PREFIX}PASSWORD"),
        }
    }
}

fn keyring_entry(profile_name: &str, kind: SecretKind) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{}", kind.key()))
}

/// Store a secret for `profile_name` in the system keyring.
pub fn store_secret(profile_name: &str, kind: SecretKind, value: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name, kind)?.set_password(value)?;
    Ok(())
}

/// Resolve a secret: profile env var, `ETIDOMO_<KIND>`, keyring, plaintext.
pub fn resolve_secret(
    profile: &Profile,
    profile_name: &str,
    kind: SecretKind,
) -> Result<SecretString, ConfigError> {
    let (env_name, plaintext) = match kind {
        SecretKind::Token => (&profile.token_env, &profile.token),
        SecretKind::Password => (&profile.password_env, &profile.password),
    };

    // 1. Profile's *_env → env var lookup
    if let Some(env_name) = env_name
        && let Ok(val) = std::env::var(env_name)
    {
        return Ok(SecretString::from(val));
    }

    // 2. Global env var
    if let Ok(val) = std::env::var(kind.env_var()) {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Ok(entry) = keyring_entry(profile_name, kind)
        && let Ok(secret) = entry.get_password()
    {
        return Ok(SecretString::from(secret));
    }

    // 4. Plaintext in config
    if let Some(value) = plaintext {
        return Ok(SecretString::from(value.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
        what: kind.key(),
    })
}

/// Session login name from the profile or `ETIDOMO_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var(format!("{ENV_PREFIX}USERNAME")).ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
            what: "username",
        })
}

/// Build a `GatewayConfig` from a profile, without CLI overrides.
pub fn profile_to_gateway_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<GatewayConfig, ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }

    let token = resolve_secret(profile, profile_name, SecretKind::Token)?;
    let username = resolve_username(profile, profile_name)?;
    let password = resolve_secret(profile, profile_name, SecretKind::Password)?;

    let mut config = GatewayConfig::new(profile.host.clone(), token, username, password)?
        .with_timeout(Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)))
        .with_poll_timeout(profile.poll_timeout);
    if let Some(secs) = profile.reconnect_delay {
        config = config.with_reconnect_delay(Duration::from_secs(secs));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "home"

[defaults]
output = "json"
timeout = 10

[profiles.home]
host = "192.168.1.3"
username = "admin"
password = "plain-pw"
token = "plain-token"
poll_timeout = 60
reconnect_delay = 5
cover_opening_time = 25

[profiles.cabin]
host = "10.0.0.2"
"#;

    fn write_sample() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_profiles_and_defaults() {
        let (_dir, path) = write_sample();
        let cfg = load_config_from(&path).unwrap();

        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.color, "auto");
        assert_eq!(cfg.profiles.len(), 2);

        let (name, home) = cfg.profile(None).unwrap();
        assert_eq!(name, "home");
        assert_eq!(home.host, "192.168.1.3");
        assert_eq!(home.poll_timeout, Some(60));

        let (name, _) = cfg.profile(Some("cabin")).unwrap();
        assert_eq!(name, "cabin");
        assert!(matches!(
            cfg.profile(Some("attic")),
            Err(ConfigError::UnknownProfile(_))
        ));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 30);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                host: "gw.local".into(),
                username: Some("admin".into()),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let (_, profile) = loaded.profile(None).unwrap();
        assert_eq!(profile.host, "gw.local");
        assert_eq!(profile.username.as_deref(), Some("admin"));
    }

    #[test]
    fn travel_times_fall_back_to_defaults() {
        let (_dir, path) = write_sample();
        let cfg = load_config_from(&path).unwrap();
        let (_, home) = cfg.profile(None).unwrap();

        let travel = home.travel_times();
        assert_eq!(travel.opening, Duration::from_secs(25));
        assert_eq!(travel.closing, TravelTimes::default().closing);
    }

    #[test]
    fn profile_env_var_wins_over_plaintext() {
        let profile = Profile {
            host: "gw".into(),
            // PATH is always set; stands in for a user-provided variable.
            token_env: Some("PATH".into()),
            token: Some("plain".into()),
            ..Profile::default()
        };
        let token = resolve_secret(&profile, "t", SecretKind::Token).unwrap();
        assert_eq!(token.expose_secret(), std::env::var("PATH").unwrap());
    }

    #[test]
    fn profile_without_host_is_rejected() {
        let profile = Profile::default();
        let result = profile_to_gateway_config(&profile, "empty", &Defaults::default());
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn builds_gateway_config() {
        let profile = Profile {
            host: "192.168.1.3".into(),
            username: Some("admin".into()),
            password: Some("pw".into()),
            token: Some("tok".into()),
            timeout: None,
            poll_timeout: Some(60),
            reconnect_delay: Some(5),
            ..Profile::default()
        };
        let defaults = Defaults {
            timeout: 12,
            ..Defaults::default()
        };
        // Secrets may be shadowed by ETIDOMO_* variables on the test
        // machine; only the non-secret fields are checked.
        let config = profile_to_gateway_config(&profile, "etidomo-test-profile", &defaults).unwrap();
        assert_eq!(config.host, "192.168.1.3");
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.poll_timeout_secs, Some(60));
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
    }
}
