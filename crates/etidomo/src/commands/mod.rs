//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod info;
pub mod light;
pub mod opening;
pub mod relay;
pub mod scenarios;
pub mod thermo;
pub mod topology;
pub mod util;
pub mod watch;

use etidomo_core::Manager;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a gateway-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    manager: &mut Manager,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Info => info::handle(manager, global).await,
        Command::Floors => topology::floors(manager, global).await,
        Command::Rooms => topology::rooms(manager, global).await,
        Command::Devices(args) => devices::handle(manager, args, global).await,
        Command::Light(args) => light::handle(manager, args, global).await,
        Command::Relay(args) => relay::handle(manager, args, global).await,
        Command::Opening(args) => opening::handle(manager, args, global).await,
        Command::Thermo(args) => thermo::handle(manager, args, global).await,
        Command::Scenarios(args) => scenarios::handle(manager, args, global).await,
        // Config, Completions and Watch are handled before dispatch
        Command::Config(_) | Command::Completions(_) | Command::Watch(_) => {
            Err(CliError::Internal("command needs no gateway session".into()))
        }
    }
}
