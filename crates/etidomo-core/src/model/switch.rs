// Views for the simple state devices: relays, openings, digital inputs
// and read-only sensors.

use serde_json::Value;
use strum::{Display, EnumString};
use tracing::debug;

use etidomo_api::ActionRequest;

use crate::error::CoreError;
use crate::model::device::Device;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RelayState {
    Off,
    On,
}

impl RelayState {
    pub fn code(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }
}

/// Movement commands for `opening_move_req`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OpeningState {
    Stop,
    Open,
    Close,
    SlatOpen,
    SlatClose,
}

impl OpeningState {
    pub fn code(self) -> i64 {
        match self {
            Self::Stop => 0,
            Self::Open => 1,
            Self::Close => 2,
            Self::SlatOpen => 3,
            Self::SlatClose => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Stop),
            1 => Some(Self::Open),
            2 => Some(Self::Close),
            3 => Some(Self::SlatOpen),
            4 => Some(Self::SlatClose),
            _ => None,
        }
    }
}

fn missing_argument() -> CoreError {
    CoreError::InvalidArgument {
        message: "At least one parameter is required".into(),
    }
}

// ── Relay ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Relay<'a> {
    device: &'a Device,
}

impl<'a> Relay<'a> {
    pub(crate) fn new(device: &'a Device) -> Self {
        Self { device }
    }

    pub fn is_on(&self) -> bool {
        self.device.int_field("status") == Some(RelayState::On.code())
    }

    pub fn switch(&self, state: Option<RelayState>) -> Result<ActionRequest, CoreError> {
        let state = state.ok_or_else(missing_argument)?;
        let act_id = self.device.require_act_id()?;
        debug!(name = self.device.name().unwrap_or_default(), %state, "set new relay state");
        Ok(ActionRequest::RelayActivation {
            act_id,
            wanted_status: state.code(),
        })
    }

    pub fn turn_on(&self) -> Result<ActionRequest, CoreError> {
        self.switch(Some(RelayState::On))
    }

    pub fn turn_off(&self) -> Result<ActionRequest, CoreError> {
        self.switch(Some(RelayState::Off))
    }
}

// ── Opening ──────────────────────────────────────────────────────────

/// Shutter, blind or gate.
#[derive(Debug, Clone, Copy)]
pub struct Opening<'a> {
    device: &'a Device,
}

impl<'a> Opening<'a> {
    pub(crate) fn new(device: &'a Device) -> Self {
        Self { device }
    }

    /// Last reported movement.
    pub fn state(&self) -> Option<OpeningState> {
        self.device.int_field("status").and_then(OpeningState::from_code)
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.state(), Some(OpeningState::Open | OpeningState::Close))
    }

    pub fn move_to(&self, state: Option<OpeningState>) -> Result<ActionRequest, CoreError> {
        let state = state.ok_or_else(missing_argument)?;
        let act_id = self.device.require_act_id()?;
        debug!(name = self.device.name().unwrap_or_default(), %state, "set new opening state");
        Ok(ActionRequest::OpeningMove {
            act_id,
            wanted_status: state.code(),
        })
    }

    pub fn open(&self) -> Result<ActionRequest, CoreError> {
        self.move_to(Some(OpeningState::Open))
    }

    pub fn close(&self) -> Result<ActionRequest, CoreError> {
        self.move_to(Some(OpeningState::Close))
    }

    pub fn stop(&self) -> Result<ActionRequest, CoreError> {
        self.move_to(Some(OpeningState::Stop))
    }
}

// ── Digital input ────────────────────────────────────────────────────

/// Technical alarm or contact input. Read-only.
#[derive(Debug, Clone, Copy)]
pub struct DigitalIn<'a> {
    device: &'a Device,
}

impl<'a> DigitalIn<'a> {
    pub(crate) fn new(device: &'a Device) -> Self {
        Self { device }
    }

    pub fn is_on(&self) -> bool {
        self.device.int_field("status").is_some_and(|s| s != 0)
    }
}

// ── Sensors ──────────────────────────────────────────────────────────

/// Energy meter or ambient sensor. Read-only.
#[derive(Debug, Clone, Copy)]
pub struct Sensor<'a> {
    device: &'a Device,
}

impl<'a> Sensor<'a> {
    pub(crate) fn new(device: &'a Device) -> Self {
        Self { device }
    }

    pub fn value(&self) -> Option<&'a Value> {
        self.device.field("value")
    }

    pub fn unit(&self) -> Option<&'a str> {
        self.device.field("unit").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;
    use crate::model::device::DeviceKind;

    fn device(kind: DeviceKind, v: serde_json::Value) -> Device {
        Device::new(kind, v.as_object().cloned().unwrap())
    }

    #[test]
    fn relay_and_opening_require_a_state() {
        let relay = device(DeviceKind::Relay, json!({"act_id": 2}));
        assert!(matches!(
            relay.as_relay().unwrap().switch(None),
            Err(CoreError::InvalidArgument { .. })
        ));
        let opening = device(DeviceKind::Opening, json!({"open_act_id": 9}));
        assert!(matches!(
            opening.as_opening().unwrap().move_to(None),
            Err(CoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn opening_commands_use_open_act_id() {
        let opening = device(DeviceKind::Opening, json!({"act_id": 1, "open_act_id": 9, "status": 1}));
        let o = opening.as_opening().unwrap();
        assert!(o.is_moving());
        assert_eq!(
            o.move_to(Some(OpeningState::SlatClose)).unwrap(),
            ActionRequest::OpeningMove {
                act_id: 9,
                wanted_status: 4
            }
        );
    }

    #[test]
    fn relay_turn_on() {
        let relay = device(DeviceKind::Relay, json!({"act_id": 2, "status": 0}));
        let r = relay.as_relay().unwrap();
        assert!(!r.is_on());
        assert_eq!(
            r.turn_on().unwrap(),
            ActionRequest::RelayActivation {
                act_id: 2,
                wanted_status: 1
            }
        );
    }

    #[test]
    fn sensor_reports_value_and_unit() {
        let meter = device(DeviceKind::EnergySensor, json!({"name": "Meter", "value": 830, "unit": "W"}));
        let s = meter.as_sensor().unwrap();
        assert_eq!(s.value(), Some(&json!(830)));
        assert_eq!(s.unit(), Some("W"));
    }
}
