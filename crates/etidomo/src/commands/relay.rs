//! Relay command handlers.

use etidomo_core::{DeviceCommand, Manager, RelayState};

use crate::cli::{GlobalOpts, RelayArgs, RelayCommand};
use crate::error::CliError;

use super::util;

pub async fn handle(
    manager: &mut Manager,
    args: RelayArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (device, state) = match args.command {
        RelayCommand::On { device } => (device, RelayState::On),
        RelayCommand::Off { device } => (device, RelayState::Off),
    };
    util::execute(manager, &device, DeviceCommand::RelaySwitch(Some(state)), global).await
}
