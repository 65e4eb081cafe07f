//! Thermoregulation command handlers.

use etidomo_core::{DeviceCommand, FanSpeed, Manager, Season, ThermoMode};

use crate::cli::{FanSpeedArg, GlobalOpts, SeasonArg, ThermoArgs, ThermoCommand, ThermoModeArg};
use crate::error::CliError;

use super::util;

impl From<ThermoModeArg> for ThermoMode {
    fn from(arg: ThermoModeArg) -> Self {
        match arg {
            ThermoModeArg::Off => Self::Off,
            ThermoModeArg::Manual => Self::Manual,
            ThermoModeArg::Auto => Self::Auto,
            ThermoModeArg::Jolly => Self::Jolly,
        }
    }
}

impl From<SeasonArg> for Season {
    fn from(arg: SeasonArg) -> Self {
        match arg {
            SeasonArg::PlantOff => Self::PlantOff,
            SeasonArg::Winter => Self::Winter,
            SeasonArg::Summer => Self::Summer,
        }
    }
}

impl From<FanSpeedArg> for FanSpeed {
    fn from(arg: FanSpeedArg) -> Self {
        match arg {
            FanSpeedArg::Off => Self::Off,
            FanSpeedArg::Slow => Self::Slow,
            FanSpeedArg::Medium => Self::Medium,
            FanSpeedArg::Fast => Self::Fast,
            FanSpeedArg::Auto => Self::Auto,
        }
    }
}

pub async fn handle(
    manager: &mut Manager,
    args: ThermoArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let ThermoCommand::Set {
        device,
        mode,
        temperature,
        season,
        fan,
        fan_mode,
    } = args.command;

    // A named fan mode is its own request; the rest go in one zone config.
    if let Some(fan_mode) = fan_mode {
        util::execute(manager, &device, DeviceCommand::SetFanMode(fan_mode), global).await?;
        if mode.is_none() && temperature.is_none() && season.is_none() {
            return Ok(());
        }
    }

    let command = DeviceCommand::ZoneConfig {
        mode: mode.map(Into::into),
        temperature,
        season: season.map(Into::into),
        fan_speed: fan.map(Into::into),
    };
    util::execute(manager, &device, command, global).await
}
