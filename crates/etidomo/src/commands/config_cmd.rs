//! Config subcommand handlers.

use std::io::BufRead;

use serde_json::Value;

use etidomo_config::SecretKind;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const SECRET_KEYS: [&str; 2] = ["password", "token"];

/// Replace plaintext secrets in a serialized config with a marker.
fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if SECRET_KEYS.contains(&key.as_str()) && !v.is_null() {
                    *v = Value::String("********".into());
                } else {
                    redact(v);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

fn read_secret(value: Option<String>, what: &str) -> Result<String, CliError> {
    let secret = match value {
        Some(v) => v,
        None => {
            eprintln!("Enter {what}, then press Enter:");
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line
        }
    };
    let secret = secret.trim().to_owned();
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: what.into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(secret)
}

fn store(global: &GlobalOpts, kind: SecretKind, value: Option<String>) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);
    let what = match kind {
        SecretKind::Token => "token",
        SecretKind::Password => "password",
    };
    let secret = read_secret(value, what)?;
    etidomo_config::store_secret(&profile_name, kind, &secret)?;
    if !global.quiet {
        eprintln!("✓ {what} stored in system keyring for profile '{profile_name}'");
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let mut value = serde_json::to_value(&cfg)?;
            redact(&mut value);
            let out = output::render_single(
                &global.output,
                &value,
                |v| serde_yaml::to_string(v).unwrap_or_else(|_| v.to_string()),
                |_| config::config_path().display().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword { value } => store(global, SecretKind::Password, value),
        ConfigCommand::SetToken { value } => store(global, SecretKind::Token, value),
    }
}
