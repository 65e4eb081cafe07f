use serde_json::Value;
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use etidomo_api::ActionRequest;

use crate::error::CoreError;
use crate::model::device::Device;

/// Zone operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ThermoMode {
    Off,
    Manual,
    Auto,
    Jolly,
}

impl ThermoMode {
    pub fn code(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::Manual => 1,
            Self::Auto => 2,
            Self::Jolly => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            1 => Some(Self::Manual),
            2 => Some(Self::Auto),
            3 => Some(Self::Jolly),
            _ => None,
        }
    }
}

/// Plant-wide season as named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Season {
    PlantOff,
    Winter,
    Summer,
}

/// Fan-coil speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FanSpeed {
    Off,
    Slow,
    Medium,
    Fast,
    Auto,
}

impl FanSpeed {
    pub fn code(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::Slow => 1,
            Self::Medium => 2,
            Self::Fast => 3,
            Self::Auto => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            1 => Some(Self::Slow),
            2 => Some(Self::Medium),
            3 => Some(Self::Fast),
            4 => Some(Self::Auto),
            _ => None,
        }
    }
}

/// Fan mode as shown to users. A stopped fan is still shown as `AUTO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum FanMode {
    Low,
    Medium,
    High,
    Auto,
}

impl From<Option<FanSpeed>> for FanMode {
    fn from(speed: Option<FanSpeed>) -> Self {
        match speed {
            Some(FanSpeed::Slow) => Self::Low,
            Some(FanSpeed::Medium) => Self::Medium,
            Some(FanSpeed::Fast) => Self::High,
            _ => Self::Auto,
        }
    }
}

impl From<FanMode> for FanSpeed {
    fn from(mode: FanMode) -> Self {
        match mode {
            FanMode::Low => Self::Slow,
            FanMode::Medium => Self::Medium,
            FanMode::High => Self::Fast,
            FanMode::Auto => Self::Auto,
        }
    }
}

/// Thermoregulation zone (or fan-coil) view over a [`Device`].
#[derive(Debug, Clone, Copy)]
pub struct Thermostat<'a> {
    device: &'a Device,
}

impl<'a> Thermostat<'a> {
    pub(crate) fn new(device: &'a Device) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &'a Device {
        self.device
    }

    pub fn raw_mode(&self) -> Option<i64> {
        self.device.int_field("mode")
    }

    pub fn mode(&self) -> Option<ThermoMode> {
        self.raw_mode().and_then(ThermoMode::from_code)
    }

    pub fn season(&self) -> Option<Season> {
        self.device
            .field("season")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// Measured temperature in °C (`temp`, or `temp_dec` on older firmware).
    pub fn current_temperature(&self) -> Option<f64> {
        self.device
            .field("temp")
            .or_else(|| self.device.field("temp_dec"))
            .and_then(Value::as_f64)
            .map(|t| t / 10.0)
    }

    /// Set point in °C.
    pub fn target_temperature(&self) -> Option<f64> {
        self.device
            .field("set_point")
            .and_then(Value::as_f64)
            .map(|t| t / 10.0)
    }

    fn dehumidifier(&self, key: &str) -> Option<i64> {
        self.device
            .field("dehumidifier")
            .and_then(|d| d.get(key))
            .and_then(Value::as_i64)
    }

    pub fn dehumidifier_state(&self) -> Option<i64> {
        self.dehumidifier("enabled")
    }

    pub fn target_humidity(&self) -> Option<i64> {
        self.dehumidifier("setpoint")
    }

    pub fn support_target_humidity(&self) -> bool {
        self.target_humidity().is_some()
    }

    pub fn fan_speed(&self) -> Option<FanSpeed> {
        self.device.int_field("fan_speed").and_then(FanSpeed::from_code)
    }

    pub fn support_fan_speed(&self) -> bool {
        self.device.int_field("fan_speed").is_some()
    }

    pub fn fan_mode(&self) -> FanMode {
        FanMode::from(self.fan_speed())
    }

    pub fn status(&self) -> Option<i64> {
        self.device.int_field("status")
    }

    pub fn antifreeze(&self) -> Option<i64> {
        self.device.int_field("antifreeze")
    }

    pub fn reason(&self) -> Option<i64> {
        self.device.int_field("reason")
    }

    /// Programmed temperature levels `t1`, `t2`, `t3` (tenths of °C).
    pub fn levels(&self) -> [Option<i64>; 3] {
        ["t1", "t2", "t3"].map(|k| self.device.int_field(k))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Build a `thermo_zone_config_req`. At least one argument is required;
    /// unset mode and set point keep their current values.
    pub fn zone_config(
        &self,
        mode: Option<ThermoMode>,
        temperature: Option<f64>,
        season: Option<Season>,
        fan_speed: Option<FanSpeed>,
    ) -> Result<ActionRequest, CoreError> {
        if mode.is_none() && temperature.is_none() && season.is_none() && fan_speed.is_none() {
            return Err(CoreError::InvalidArgument {
                message: "At least one parameter is required".into(),
            });
        }
        let act_id = self.device.require_act_id()?;

        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let set_point = match temperature {
            Some(t) => Some((t * 10.0).round() as i64),
            None => self.device.int_field("set_point"),
        };
        let extended = season.is_some() || fan_speed.is_some();

        debug!(
            name = self.device.name().unwrap_or_default(),
            ?mode,
            ?set_point,
            ?season,
            ?fan_speed,
            "set new thermostat config"
        );
        Ok(ActionRequest::ThermoZoneConfig {
            act_id,
            mode: mode.map(ThermoMode::code).or_else(|| self.raw_mode()),
            set_point,
            extended_infos: u8::from(extended),
            season: season.map(|s| s.to_string()),
            fan_speed: fan_speed.map(FanSpeed::code),
        })
    }

    pub fn set_target_temperature(&self, temperature: f64) -> Result<ActionRequest, CoreError> {
        self.zone_config(None, Some(temperature), None, None)
    }

    /// Set the fan from a user-facing mode name (`LOW`, `MEDIUM`, `HIGH`, `AUTO`).
    pub fn set_fan_mode(&self, mode: &str) -> Result<ActionRequest, CoreError> {
        let mode: FanMode = mode.parse().map_err(|_| CoreError::InvalidArgument {
            message: format!("invalid fan mode {mode:?}"),
        })?;
        self.zone_config(None, None, None, Some(FanSpeed::from(mode)))
    }
}
