// ── Device model ──
//
// One `Device` per entry of a feature list. The gateway record is kept
// verbatim as a `DeviceState` map; the closed `DeviceKind` tag selects
// which typed view (`Light`, `Thermostat`, ...) can be taken over it.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::debug;

use etidomo_api::{DeviceState, Feature};

use crate::error::CoreError;
use crate::model::light::Light;
use crate::model::switch::{DigitalIn, Opening, Relay, Sensor};
use crate::model::thermo::Thermostat;

pub const TYPE_ENERGY_SENSOR: i64 = -2;
pub const TYPE_ANALOG_SENSOR: i64 = -1;
pub const TYPE_LIGHT: i64 = 0;
pub const TYPE_OPENING: i64 = 1;
pub const TYPE_THERMOSTAT: i64 = 2;
pub const TYPE_SCENARIO: i64 = 4;
pub const TYPE_GENERIC_RELAY: i64 = 11;
pub const TYPE_DIGITAL_INPUT: i64 = 14;

/// Display name of a gateway type id.
pub fn type_name(type_id: i64) -> &'static str {
    match type_id {
        -2 => "Energy Sensor",
        -1 => "Analog Sensor",
        0 => "Light",
        1 => "Opening",
        2 => "Thermostat",
        3 => "Page",
        4 => "Scenario",
        5 => "Camera",
        6 => "Security Panel",
        7 => "Security Area",
        8 => "Security Scenario",
        9 => "Security Input",
        10 => "Security output",
        11 => "Generic relay",
        12 => "Generic text",
        13 => "Sound zone",
        14 => "Digital input",
        _ => "Unknown",
    }
}

/// Ambient readings reported alongside the thermoregulation zones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Pressure,
}

/// Device variant. Each maps to one gateway type id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Light,
    Thermostat,
    Relay,
    Opening,
    DigitalIn,
    EnergySensor,
    AnalogSensor(SensorKind),
}

impl DeviceKind {
    pub fn type_id(self) -> i64 {
        match self {
            Self::Light => TYPE_LIGHT,
            Self::Thermostat => TYPE_THERMOSTAT,
            Self::Relay => TYPE_GENERIC_RELAY,
            Self::Opening => TYPE_OPENING,
            Self::DigitalIn => TYPE_DIGITAL_INPUT,
            Self::EnergySensor => TYPE_ENERGY_SENSOR,
            Self::AnalogSensor(_) => TYPE_ANALOG_SENSOR,
        }
    }

    pub fn type_name(self) -> &'static str {
        type_name(self.type_id())
    }

    /// The feature whose list command reports this kind.
    pub fn feature(self) -> Feature {
        match self {
            Self::Light => Feature::Lights,
            Self::Thermostat | Self::AnalogSensor(_) => Feature::Thermoregulation,
            Self::Relay => Feature::Relays,
            Self::Opening => Feature::Openings,
            Self::DigitalIn => Feature::DigitalIn,
            Self::EnergySensor => Feature::Energy,
        }
    }

    /// Record field holding the action id.
    pub fn act_id_key(self) -> &'static str {
        match self {
            Self::Opening => "open_act_id",
            _ => "act_id",
        }
    }

    /// Reply field a force-update reads the fresh record from.
    pub fn update_field(self) -> &'static str {
        match self {
            Self::AnalogSensor(sensor) => sensor.into(),
            _ => "array",
        }
    }

    fn default_device_class(self) -> Option<String> {
        match self {
            Self::DigitalIn => Some("switch".into()),
            Self::EnergySensor => None,
            Self::AnalogSensor(sensor) => Some(sensor.to_string()),
            other => Some(other.type_name().to_lowercase()),
        }
    }
}

/// A gateway device and its latest raw snapshot.
///
/// The name seen at construction is kept as the device label, so the
/// unique id stays stable when a later partial snapshot omits `name`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    kind: DeviceKind,
    label: Option<String>,
    info: DeviceState,
    device_class: Option<String>,
}

impl Device {
    pub fn new(kind: DeviceKind, info: DeviceState) -> Self {
        let label = info.get("name").and_then(Value::as_str).map(str::to_owned);
        Self {
            kind,
            label,
            info,
            device_class: kind.default_device_class(),
        }
    }

    /// Like [`new`](Self::new), naming the device `fallback` when the
    /// record carries no name.
    pub fn with_fallback_name(kind: DeviceKind, info: DeviceState, fallback: &str) -> Self {
        let mut device = Self::new(kind, info);
        if device.label.is_none() {
            device.label = Some(fallback.to_owned());
        }
        device
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn type_id(&self) -> i64 {
        self.kind.type_id()
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn device_class(&self) -> Option<&str> {
        self.device_class.as_deref()
    }

    /// The raw snapshot last received from the gateway.
    pub fn info(&self) -> &DeviceState {
        &self.info
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.info.get(key)
    }

    pub(crate) fn int_field(&self, key: &str) -> Option<i64> {
        self.info.get(key).and_then(Value::as_i64)
    }

    pub fn name(&self) -> Option<&str> {
        self.info
            .get("name")
            .and_then(Value::as_str)
            .or(self.label.as_deref())
    }

    /// `"<type_id>-<sha256(label)>"`; stable across restarts as long as the
    /// device keeps its name.
    pub fn unique_id(&self) -> String {
        let digest = Sha256::digest(self.label.as_deref().unwrap_or_default().as_bytes());
        format!("{}-{}", self.type_id(), hex::encode(digest))
    }

    /// Action id, or `None` for passive devices. Zero counts as absent.
    pub fn act_id(&self) -> Option<i64> {
        record_act_id(&self.info, self.kind)
    }

    pub fn is_managed(&self) -> bool {
        self.act_id().is_some()
    }

    pub(crate) fn require_act_id(&self) -> Result<i64, CoreError> {
        self.act_id().ok_or_else(|| CoreError::UnmanagedDevice {
            name: self.name().unwrap_or_default().to_owned(),
        })
    }

    pub fn floor_id(&self) -> Option<i64> {
        self.int_field("floor_ind")
    }

    pub fn room_id(&self) -> Option<i64> {
        self.int_field("room_ind")
    }

    /// The primary state value: `value` for sensors, `status` otherwise.
    pub fn state(&self) -> Option<&Value> {
        match self.kind {
            DeviceKind::EnergySensor | DeviceKind::AnalogSensor(_) => self.info.get("value"),
            _ => self.info.get("status"),
        }
    }

    /// `true` when `record` addresses this device.
    pub fn matches(&self, record: &DeviceState) -> bool {
        self.act_id().is_some() && record_act_id(record, self.kind) == self.act_id()
    }

    /// Replace the snapshot with `record` if it addresses this device.
    ///
    /// The new record supersedes the old one wholesale; fields it does not
    /// carry are dropped. Returns `true` when any incoming field differs
    /// from the previous snapshot.
    pub fn update_state(&mut self, mut record: DeviceState) -> bool {
        if record_act_id(&record, self.kind) != self.act_id() {
            return false;
        }
        record.remove("cmd_name");

        let changed: Vec<&str> = record
            .iter()
            .filter(|(k, v)| self.info.get(k.as_str()) != Some(*v))
            .map(|(k, _)| k.as_str())
            .collect();
        if !changed.is_empty() {
            debug!(
                kind = self.kind.type_name(),
                name = self.name().unwrap_or_default(),
                fields = ?changed,
                "received new state"
            );
        }
        let updated = !changed.is_empty();
        self.info = record;
        updated
    }

    // ── Typed views ──────────────────────────────────────────────────

    pub fn as_light(&self) -> Option<Light<'_>> {
        (self.kind == DeviceKind::Light).then(|| Light::new(self))
    }

    pub fn as_thermostat(&self) -> Option<Thermostat<'_>> {
        (self.kind == DeviceKind::Thermostat).then(|| Thermostat::new(self))
    }

    pub fn as_relay(&self) -> Option<Relay<'_>> {
        (self.kind == DeviceKind::Relay).then(|| Relay::new(self))
    }

    pub fn as_opening(&self) -> Option<Opening<'_>> {
        (self.kind == DeviceKind::Opening).then(|| Opening::new(self))
    }

    pub fn as_digital_in(&self) -> Option<DigitalIn<'_>> {
        (self.kind == DeviceKind::DigitalIn).then(|| DigitalIn::new(self))
    }

    pub fn as_sensor(&self) -> Option<Sensor<'_>> {
        matches!(
            self.kind,
            DeviceKind::EnergySensor | DeviceKind::AnalogSensor(_)
        )
        .then(|| Sensor::new(self))
    }
}

/// Action id carried by `record`, read the way `kind` reads it.
///
/// Openings use `open_act_id` but their status deltas may only carry
/// `act_id`, so that is the fallback.
fn record_act_id(record: &DeviceState, kind: DeviceKind) -> Option<i64> {
    record
        .get(kind.act_id_key())
        .or_else(|| record.get("act_id"))
        .and_then(Value::as_i64)
        .filter(|id| *id != 0)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn state(v: serde_json::Value) -> DeviceState {
        v.as_object().cloned().unwrap()
    }

    fn light() -> Device {
        Device::new(
            DeviceKind::Light,
            state(json!({"act_id": 5, "name": "Hall", "status": 0, "floor_ind": 1, "room_ind": 3})),
        )
    }

    #[test]
    fn update_replaces_snapshot_wholesale() {
        let mut dev = light();
        let changed = dev.update_state(state(json!({
            "cmd_name": "light_switch_ind", "act_id": 5, "status": 1
        })));
        assert!(changed);
        assert_eq!(dev.info(), &state(json!({"act_id": 5, "status": 1})));
        assert_eq!(dev.name(), Some("Hall"));
        assert_eq!(dev.unique_id(), light().unique_id());
    }

    #[test]
    fn identical_update_reports_no_change() {
        let mut dev = light();
        let snapshot = dev.info().clone();
        assert!(!dev.update_state(snapshot.clone()));
        assert_eq!(dev.info(), &snapshot);
    }

    #[test]
    fn mismatched_act_id_is_ignored() {
        let mut dev = light();
        let before = dev.clone();
        assert!(!dev.update_state(state(json!({"act_id": 6, "status": 1}))));
        assert_eq!(dev, before);
    }

    #[test]
    fn openings_use_their_own_action_field() {
        let dev = Device::new(
            DeviceKind::Opening,
            state(json!({"act_id": 1, "open_act_id": 40, "name": "Shutter"})),
        );
        assert_eq!(dev.act_id(), Some(40));
        assert!(dev.matches(&state(json!({"act_id": 40, "status": 2}))));
        assert!(!dev.matches(&state(json!({"act_id": 1}))));
    }

    #[test]
    fn zero_act_id_is_unmanaged() {
        let dev = Device::new(
            DeviceKind::EnergySensor,
            state(json!({"act_id": 0, "name": "Meter", "value": 1200, "unit": "W"})),
        );
        assert!(!dev.is_managed());
        assert!(matches!(
            dev.require_act_id(),
            Err(CoreError::UnmanagedDevice { name }) if name == "Meter"
        ));
    }

    #[test]
    fn unique_id_hashes_the_name() {
        let dev = light();
        let id = dev.unique_id();
        assert!(id.starts_with("0-"));
        assert_eq!(id.len(), 2 + 64);
        assert_eq!(id, light().unique_id());
    }

    #[test]
    fn metadata_accessors() {
        let dev = light();
        assert_eq!(dev.type_name(), "Light");
        assert_eq!(dev.device_class(), Some("light"));
        assert_eq!(dev.floor_id(), Some(1));
        assert_eq!(dev.room_id(), Some(3));
        assert_eq!(dev.state(), Some(&json!(0)));
        assert!(dev.as_light().is_some());
        assert!(dev.as_thermostat().is_none());

        let relay = Device::new(DeviceKind::Relay, DeviceState::new());
        assert_eq!(relay.device_class(), Some("generic relay"));
        let sensor = Device::new(DeviceKind::AnalogSensor(SensorKind::Humidity), DeviceState::new());
        assert_eq!(sensor.device_class(), Some("humidity"));
        assert_eq!(sensor.kind().update_field(), "humidity");
    }
}
