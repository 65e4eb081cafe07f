//! Light command handlers.

use etidomo_core::{DeviceCommand, LightState, Manager};

use crate::cli::{GlobalOpts, LightArgs, LightCommand};
use crate::error::CliError;

use super::util;

fn rgb_arg(rgb: Option<Vec<u8>>) -> Result<Option<[u8; 3]>, CliError> {
    rgb.map(|channels| {
        <[u8; 3]>::try_from(channels).map_err(|got| CliError::Validation {
            field: "rgb".into(),
            reason: format!("expected 3 channels, got {}", got.len()),
        })
    })
    .transpose()
}

fn to_core(command: LightCommand) -> Result<(String, DeviceCommand), CliError> {
    Ok(match command {
        LightCommand::On {
            device,
            brightness,
            rgb,
        } => (
            device,
            DeviceCommand::LightSwitch {
                state: Some(LightState::On),
                brightness,
                rgb: rgb_arg(rgb)?,
            },
        ),
        LightCommand::Off { device } => (
            device,
            DeviceCommand::LightSwitch {
                state: Some(LightState::Off),
                brightness: None,
                rgb: None,
            },
        ),
        LightCommand::Auto { device } => (
            device,
            DeviceCommand::LightSwitch {
                state: Some(LightState::Auto),
                brightness: None,
                rgb: None,
            },
        ),
        LightCommand::Brightness { device, percent } => {
            (device, DeviceCommand::SetBrightness(percent))
        }
        LightCommand::Color {
            device,
            hue,
            saturation,
        } => (device, DeviceCommand::SetHsColor { hue, saturation }),
        LightCommand::Rgb {
            device,
            red,
            green,
            blue,
        } => (device, DeviceCommand::SetRgbColor([red, green, blue])),
    })
}

pub async fn handle(
    manager: &mut Manager,
    args: LightArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (device, command) = to_core(args.command)?;
    util::execute(manager, &device, command, global).await
}
