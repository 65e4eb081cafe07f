//! Device command handlers.

use tabled::Tabled;

use etidomo_core::{Device, DeviceKind, Floor, Manager, Room};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts, KindFilter};
use crate::error::CliError;
use crate::output;

use super::util::{self, DeviceView};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Act")]
    act_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Floor")]
    floor: String,
    #[tabled(rename = "Room")]
    room: String,
    #[tabled(rename = "State")]
    state: String,
}

fn row(view: &DeviceView, floors: &[Floor], rooms: &[Room]) -> DeviceRow {
    DeviceRow {
        act_id: view.act_id.map_or_else(|| "-".into(), |id| id.to_string()),
        name: view.name.clone().unwrap_or_default(),
        kind: view.kind.clone(),
        floor: view
            .floor_id
            .map(|id| Floor::resolve(floors, id).name)
            .unwrap_or_default(),
        room: view
            .room_id
            .map(|id| Room::resolve(rooms, id, view.floor_id).name)
            .unwrap_or_default(),
        state: view.state.clone(),
    }
}

fn detail(v: &DeviceView) -> String {
    let opt = |o: Option<i64>| o.map_or_else(|| "-".into(), |v| v.to_string());
    let mut lines = vec![
        format!("ID:       {}", v.unique_id),
        format!("Name:     {}", v.name.as_deref().unwrap_or("-")),
        format!("Kind:     {}", v.kind),
        format!("Act ID:   {}", opt(v.act_id)),
        format!("Floor:    {}", opt(v.floor_id)),
        format!("Room:     {}", opt(v.room_id)),
        format!("State:    {}", v.state),
    ];
    if let Some(ref info) = v.info
        && let Some(fields) = info.as_object()
    {
        lines.push("Record:".into());
        for (key, value) in fields {
            lines.push(format!("  {key}: {value}"));
        }
    }
    lines.join("\n")
}

fn matches_kind(device: &Device, filter: KindFilter) -> bool {
    matches!(
        (filter, device.kind()),
        (KindFilter::Light, DeviceKind::Light)
            | (KindFilter::Thermostat, DeviceKind::Thermostat)
            | (KindFilter::Relay, DeviceKind::Relay)
            | (KindFilter::Opening, DeviceKind::Opening)
            | (KindFilter::DigitalIn, DeviceKind::DigitalIn)
            | (KindFilter::Energy, DeviceKind::EnergySensor)
            | (KindFilter::Sensor, DeviceKind::AnalogSensor(_))
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    manager: &mut Manager,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List { kind, floor, room } => {
            let views: Vec<DeviceView> = manager
                .devices()
                .await?
                .iter()
                .filter(|d| kind.is_none_or(|k| matches_kind(d, k)))
                .filter(|d| floor.is_none_or(|f| d.floor_id() == Some(f)))
                .filter(|d| room.is_none_or(|r| d.room_id() == Some(r)))
                .map(DeviceView::new)
                .collect();

            // Names for the table; other formats carry the raw ids.
            let (floors, rooms) = if matches!(global.output, crate::cli::OutputFormat::Table) {
                (
                    manager.floors().await?.to_vec(),
                    manager.rooms().await?.to_vec(),
                )
            } else {
                (Vec::new(), Vec::new())
            };

            let out = output::render_list(
                &global.output,
                &views,
                |v| row(v, &floors, &rooms),
                |v| v.unique_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let found = util::resolve_device(manager, &device).await?;
            let view = DeviceView::new(&found).with_info(&found);
            let out =
                output::render_single(&global.output, &view, detail, |v| v.unique_id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Update { device } => {
            let found = util::resolve_device(manager, &device).await?;
            let changed = manager.update_device(&found.unique_id()).await?;
            let refreshed = manager
                .device_by_id(&found.unique_id())
                .await?
                .cloned()
                .unwrap_or(found);
            if !global.quiet {
                eprintln!(
                    "{}: {}",
                    refreshed.name().unwrap_or("device"),
                    if changed { "state refreshed" } else { "no change" }
                );
            }
            let view = DeviceView::new(&refreshed);
            let out =
                output::render_single(&global.output, &view, detail, |v| v.unique_id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn rows_resolve_topology_names() {
        let device = Device::new(
            DeviceKind::Relay,
            json!({"act_id": 7, "name": "Pump", "floor_ind": 1, "room_ind": 9, "status": 1})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let floors = vec![Floor {
            id: 1,
            name: "Ground".into(),
        }];
        let r = row(&DeviceView::new(&device), &floors, &[]);
        assert_eq!(r.floor, "Ground");
        assert_eq!(r.room, "Room #9");
        assert_eq!(r.state, "on");
        assert!(matches_kind(&device, KindFilter::Relay));
        assert!(!matches_kind(&device, KindFilter::Light));
    }
}
