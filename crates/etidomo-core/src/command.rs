// ── Command API ──
//
// Every state-changing device operation is a `DeviceCommand`. Commands
// are validated against the target device (kind, arguments, action id)
// and turned into a wire `ActionRequest` before anything is sent, so a
// rejected command never reaches the gateway.

use etidomo_api::{ActionRequest, ScenarioRecord};

use crate::error::CoreError;
use crate::model::{
    Device, Floor, FanSpeed, LightState, OpeningState, RelayState, Room, Season, ThermoMode,
};

/// A command addressed to one device.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    // ── Lights ───────────────────────────────────────────────────────
    LightSwitch {
        state: Option<LightState>,
        brightness: Option<u8>,
        rgb: Option<[u8; 3]>,
    },
    /// Brightness in percent, clamped to 0–100.
    SetBrightness(i64),
    /// Channels clamped to 0–255.
    SetRgbColor([i64; 3]),
    SetHsColor { hue: f64, saturation: f64 },

    // ── Relays / openings ────────────────────────────────────────────
    RelaySwitch(Option<RelayState>),
    Move(Option<OpeningState>),

    // ── Thermoregulation ─────────────────────────────────────────────
    ZoneConfig {
        mode: Option<ThermoMode>,
        temperature: Option<f64>,
        season: Option<Season>,
        fan_speed: Option<FanSpeed>,
    },
    SetFanMode(String),
}

impl DeviceCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LightSwitch { .. } => "light switch",
            Self::SetBrightness(_) => "set brightness",
            Self::SetRgbColor(_) => "set rgb color",
            Self::SetHsColor { .. } => "set hs color",
            Self::RelaySwitch(_) => "relay switch",
            Self::Move(_) => "opening move",
            Self::ZoneConfig { .. } => "zone config",
            Self::SetFanMode(_) => "set fan mode",
        }
    }

    /// Validate against `device` and build the wire request.
    ///
    /// `Ok(None)` means the command is a no-op for this device (for example
    /// a brightness change on a light that cannot dim).
    pub fn build(&self, device: &Device) -> Result<Option<ActionRequest>, CoreError> {
        let unsupported = || CoreError::Unsupported {
            operation: self.name().into(),
            device_type: device.type_name().into(),
        };

        match self {
            Self::LightSwitch {
                state,
                brightness,
                rgb,
            } => {
                let light = device.as_light().ok_or_else(unsupported)?;
                light.switch(*state, *brightness, *rgb).map(Some)
            }
            Self::SetBrightness(percent) => {
                device.as_light().ok_or_else(unsupported)?.set_brightness(*percent)
            }
            Self::SetRgbColor(rgb) => device.as_light().ok_or_else(unsupported)?.set_rgb_color(*rgb),
            Self::SetHsColor { hue, saturation } => device
                .as_light()
                .ok_or_else(unsupported)?
                .set_hs_color(*hue, *saturation),
            Self::RelaySwitch(state) => device
                .as_relay()
                .ok_or_else(unsupported)?
                .switch(*state)
                .map(Some),
            Self::Move(state) => device
                .as_opening()
                .ok_or_else(unsupported)?
                .move_to(*state)
                .map(Some),
            Self::ZoneConfig {
                mode,
                temperature,
                season,
                fan_speed,
            } => device
                .as_thermostat()
                .ok_or_else(unsupported)?
                .zone_config(*mode, *temperature, *season, *fan_speed)
                .map(Some),
            Self::SetFanMode(mode) => device
                .as_thermostat()
                .ok_or_else(unsupported)?
                .set_fan_mode(mode)
                .map(Some),
        }
    }
}

/// A request routed through the background [`Gateway`](crate::Gateway) task.
#[derive(Debug, Clone)]
pub enum GatewayCommand {
    Device {
        unique_id: String,
        command: DeviceCommand,
    },
    /// Re-read one device from the gateway.
    ForceUpdate { unique_id: String },
    /// Drop and refetch the whole catalog.
    PullDevices,
    Topology,
    ListScenarios,
    ActivateScenario { id: i64 },
    CreateScenario { name: String },
    DeleteScenario { id: i64 },
}

/// A command envelope sent through the command channel.
pub(crate) struct CommandEnvelope {
    pub command: GatewayCommand,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// Result of a command execution.
#[derive(Debug, Clone)]
pub enum CommandResult {
    Ok,
    /// Whether a force-update changed the device.
    Updated(bool),
    /// Unique ids that appeared or vanished after a catalog refetch.
    Devices {
        discovered: Vec<String>,
        removed: Vec<String>,
    },
    Topology {
        floors: Vec<Floor>,
        rooms: Vec<Room>,
    },
    Scenarios(Vec<ScenarioRecord>),
}
