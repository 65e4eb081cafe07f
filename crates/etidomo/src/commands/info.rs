//! Gateway information.

use etidomo_core::{FeatureList, Manager};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(f: &FeatureList) -> String {
    [
        format!("Firmware: {}", f.swver.as_deref().unwrap_or("-")),
        format!("Serial:   {}", f.serial.as_deref().unwrap_or("-")),
        format!("Keycode:  {}", f.keycode.as_deref().unwrap_or("-")),
        format!("Features: {}", f.list.join(", ")),
    ]
    .join("\n")
}

pub async fn handle(manager: &mut Manager, global: &GlobalOpts) -> Result<(), CliError> {
    let info = manager.gateway_info().await?.clone();
    let out = output::render_single(&global.output, &info, detail, |f| {
        f.serial.clone().unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
