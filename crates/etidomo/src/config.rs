//! Translation from profiles and global flags to `etidomo_core::GatewayConfig`.
//!
//! Flags and their `ETIDOMO_*` environment variables win over the profile;
//! secrets missing from both fall back to the profile credential chain.

use std::time::Duration;

use secrecy::SecretString;

use etidomo_config::{Config, Profile, SecretKind};
use etidomo_core::{GatewayConfig, TravelTimes};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use etidomo_config::{config_path, load_config_or_default};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the gateway config for this invocation.
pub fn build_gateway_config(global: &GlobalOpts) -> Result<GatewayConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg, global);
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() && !cfg.profiles.is_empty() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", "),
        });
    }

    // No profile: everything has to come from flags / env vars.
    let host = global.host.clone().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let token = flag_secret(global.token.as_deref(), &profile_name, "token")?;
    let username = global
        .username
        .clone()
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.clone(),
            what: "username".into(),
        })?;
    let password = flag_secret(global.password.as_deref(), &profile_name, "password")?;

    let config = GatewayConfig::new(host, token, username, password)?
        .with_timeout(Duration::from_secs(
            global.timeout.unwrap_or(cfg.defaults.timeout),
        ));
    Ok(config)
}

/// Cover travel times of the active profile, or the defaults.
pub fn travel_times(global: &GlobalOpts) -> TravelTimes {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    cfg.profiles
        .get(&profile_name)
        .map(Profile::travel_times)
        .unwrap_or_default()
}

fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<GatewayConfig, CliError> {
    let host = global.host.as_deref().unwrap_or(&profile.host);
    if host.trim().is_empty() {
        return Err(CliError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }

    let token = match global.token {
        Some(ref token) => SecretString::from(token.clone()),
        None => etidomo_config::resolve_secret(profile, profile_name, SecretKind::Token)?,
    };
    let username = match global.username {
        Some(ref username) => username.clone(),
        None => etidomo_config::resolve_username(profile, profile_name)?,
    };
    let password = match global.password {
        Some(ref password) => SecretString::from(password.clone()),
        None => etidomo_config::resolve_secret(profile, profile_name, SecretKind::Password)?,
    };

    let timeout = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(cfg.defaults.timeout);

    let mut config = GatewayConfig::new(host, token, username, password)?
        .with_timeout(Duration::from_secs(timeout))
        .with_poll_timeout(profile.poll_timeout);
    if let Some(secs) = profile.reconnect_delay {
        config = config.with_reconnect_delay(Duration::from_secs(secs));
    }
    Ok(config)
}

fn flag_secret(
    value: Option<&str>,
    profile_name: &str,
    what: &str,
) -> Result<SecretString, CliError> {
    value
        .map(|v| SecretString::from(v.to_owned()))
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.into(),
            what: what.into(),
        })
}
