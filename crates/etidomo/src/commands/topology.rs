//! Floor and room listings.

use tabled::Tabled;

use etidomo_core::{Floor, Manager, Room};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct FloorRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Tabled)]
struct RoomRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Floor")]
    floor: String,
}

pub async fn floors(manager: &mut Manager, global: &GlobalOpts) -> Result<(), CliError> {
    let floors = manager.floors().await?.to_vec();
    let out = output::render_list(
        &global.output,
        &floors,
        |f| FloorRow {
            id: f.id,
            name: f.name.clone(),
        },
        |f| f.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn rooms(manager: &mut Manager, global: &GlobalOpts) -> Result<(), CliError> {
    let floors = manager.floors().await?.to_vec();
    let rooms = manager.rooms().await?.to_vec();
    let out = output::render_list(
        &global.output,
        &rooms,
        |r: &Room| RoomRow {
            id: r.id,
            name: r.name.clone(),
            floor: r
                .floor_id
                .map(|id| Floor::resolve(&floors, id).name)
                .unwrap_or_default(),
        },
        |r| r.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
