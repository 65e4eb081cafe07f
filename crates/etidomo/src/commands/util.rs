//! Shared helpers for command handlers.

use serde::Serialize;
use serde_json::Value;

use etidomo_core::{Device, DeviceCommand, DeviceKind, Manager};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve a device identifier to its unique id.
///
/// Tries the unique id, then the action id, then the name (case-insensitive).
pub async fn resolve_device(manager: &mut Manager, identifier: &str) -> Result<Device, CliError> {
    let devices = manager.devices().await?;
    find_device(devices, identifier)
        .cloned()
        .ok_or_else(|| CliError::NotFound {
            resource_type: "device".into(),
            identifier: identifier.into(),
            list_command: "devices list".into(),
        })
}

fn find_device<'a>(devices: &'a [Device], identifier: &str) -> Option<&'a Device> {
    if let Some(d) = devices.iter().find(|d| d.unique_id() == identifier) {
        return Some(d);
    }
    if let Ok(act_id) = identifier.parse::<i64>()
        && let Some(d) = devices.iter().find(|d| d.act_id() == Some(act_id))
    {
        return Some(d);
    }
    devices
        .iter()
        .find(|d| d.name().is_some_and(|n| n.eq_ignore_ascii_case(identifier)))
}

/// Resolve `identifier`, send `command`, and report it unless quiet.
pub async fn execute(
    manager: &mut Manager,
    identifier: &str,
    command: DeviceCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = resolve_device(manager, identifier).await?;
    manager.execute(&device.unique_id(), &command).await?;
    if !global.quiet {
        eprintln!(
            "{}: {} sent",
            device.name().unwrap_or("device"),
            command.name()
        );
    }
    Ok(())
}

// ── Serializable device view ────────────────────────────────────────

/// Flattened device for structured output.
#[derive(Debug, Serialize)]
pub struct DeviceView {
    pub unique_id: String,
    pub name: Option<String>,
    pub kind: String,
    pub type_id: i64,
    pub act_id: Option<i64>,
    pub floor_id: Option<i64>,
    pub room_id: Option<i64>,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
}

impl DeviceView {
    pub fn new(device: &Device) -> Self {
        Self {
            unique_id: device.unique_id(),
            name: device.name().map(str::to_owned),
            kind: kind_label(device.kind()),
            type_id: device.type_id(),
            act_id: device.act_id(),
            floor_id: device.floor_id(),
            room_id: device.room_id(),
            state: state_label(device),
            info: None,
        }
    }

    /// Include the raw gateway record.
    pub fn with_info(mut self, device: &Device) -> Self {
        self.info = Some(Value::Object(device.info().clone()));
        self
    }
}

pub fn kind_label(kind: DeviceKind) -> String {
    match kind {
        DeviceKind::Light => "light".into(),
        DeviceKind::Thermostat => "thermostat".into(),
        DeviceKind::Relay => "relay".into(),
        DeviceKind::Opening => "opening".into(),
        DeviceKind::DigitalIn => "digital-in".into(),
        DeviceKind::EnergySensor => "energy".into(),
        DeviceKind::AnalogSensor(sensor) => format!("sensor/{sensor}"),
    }
}

/// One-word summary of the device's current state.
pub fn state_label(device: &Device) -> String {
    if let Some(light) = device.as_light() {
        return match light.state() {
            Some(state) if light.is_on() && light.support_brightness() => {
                format!("{state} {}%", light.brightness())
            }
            Some(state) => state.to_string(),
            None => "-".into(),
        };
    }
    if let Some(relay) = device.as_relay() {
        return if relay.is_on() { "on" } else { "off" }.into();
    }
    if let Some(opening) = device.as_opening() {
        return opening
            .state()
            .map_or_else(|| "-".into(), |s| s.to_string().to_lowercase());
    }
    if let Some(thermo) = device.as_thermostat() {
        let mode = thermo
            .mode()
            .map_or_else(|| "-".into(), |m| m.to_string());
        return match (thermo.current_temperature(), thermo.target_temperature()) {
            (Some(cur), Some(set)) => format!("{mode} {cur:.1}°C → {set:.1}°C"),
            (Some(cur), None) => format!("{mode} {cur:.1}°C"),
            _ => mode,
        };
    }
    if let Some(input) = device.as_digital_in() {
        return if input.is_on() { "on" } else { "off" }.into();
    }
    if let Some(sensor) = device.as_sensor() {
        let value = sensor.value().map_or_else(|| "-".into(), value_text);
        return match sensor.unit() {
            Some(unit) => format!("{value} {unit}"),
            None => value,
        };
    }
    device.state().map_or_else(|| "-".into(), value_text)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
