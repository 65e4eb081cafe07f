//! `watch`: keep a gateway session open and print every state change.

use std::collections::HashMap;

use chrono::Local;
use owo_colors::OwoColorize;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use etidomo_core::{ConnectionState, Device, Gateway, GatewayConfig, GatewayEvent, ScenarioEvent};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::util;

/// One device whose state label changed between two snapshots.
#[derive(Debug, Serialize, PartialEq)]
struct Change {
    unique_id: String,
    name: String,
    kind: String,
    previous: Option<String>,
    state: String,
}

fn labels(devices: &[Device]) -> HashMap<String, String> {
    devices
        .iter()
        .map(|d| (d.unique_id(), util::state_label(d)))
        .collect()
}

fn changes(previous: &HashMap<String, String>, devices: &[Device]) -> Vec<Change> {
    devices
        .iter()
        .filter_map(|d| {
            let unique_id = d.unique_id();
            let state = util::state_label(d);
            let before = previous.get(&unique_id);
            (before != Some(&state)).then(|| Change {
                name: d.name().unwrap_or_default().to_owned(),
                kind: util::kind_label(d.kind()),
                previous: before.cloned(),
                state,
                unique_id,
            })
        })
        .collect()
}

struct Printer {
    json: bool,
    color: bool,
    quiet: bool,
}

impl Printer {
    fn new(global: &GlobalOpts) -> Self {
        Self {
            json: matches!(
                global.output,
                OutputFormat::Json | OutputFormat::JsonCompact
            ),
            color: output::should_color(&global.color),
            quiet: global.quiet,
        }
    }

    fn stamp(&self) -> String {
        let now = Local::now().format("%H:%M:%S").to_string();
        if self.color {
            now.dimmed().to_string()
        } else {
            now
        }
    }

    fn json_line(&self, kind: &str, payload: &impl Serialize) {
        let line = serde_json::json!({
            "time": Local::now().to_rfc3339(),
            "event": kind,
            "data": payload,
        });
        output::print_output(&line.to_string(), self.quiet);
    }

    fn change(&self, change: &Change) {
        if self.json {
            self.json_line("state", change);
            return;
        }
        let before = change.previous.as_deref().unwrap_or("-");
        output::print_output(
            &format!(
                "{} {} ({}): {} → {}",
                self.stamp(),
                change.name,
                change.kind,
                output::paint_state(before, self.color),
                output::paint_state(&change.state, self.color),
            ),
            self.quiet,
        );
    }

    fn connection(&self, state: &ConnectionState) {
        if self.json {
            self.json_line("connection", &format!("{state:?}"));
            return;
        }
        let text = match state {
            ConnectionState::Connected => "connected".to_owned(),
            ConnectionState::Connecting => "connecting".to_owned(),
            ConnectionState::Disconnected => "disconnected".to_owned(),
            ConnectionState::Failed => "failed".to_owned(),
            ConnectionState::Offline { attempt } => format!("offline (attempt {attempt})"),
        };
        let text = if self.color {
            text.yellow().to_string()
        } else {
            text
        };
        eprintln!("{} gateway {text}", self.stamp());
    }

    fn note(&self, kind: &str, message: String, payload: &impl Serialize) {
        if self.json {
            self.json_line(kind, payload);
        } else {
            output::print_output(&format!("{} {message}", self.stamp()), self.quiet);
        }
    }
}

pub async fn handle(
    config: GatewayConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let poll_timeout = args.poll_timeout.or(config.poll_timeout_secs);
    let gateway = Gateway::new(config.with_poll_timeout(poll_timeout));
    let printer = Printer::new(global);

    // Subscribe before connecting so the first snapshot is not missed.
    let mut events = gateway.events();
    let mut state_rx = gateway.connection_state();

    gateway.connect().await?;
    let snapshot = gateway.devices_snapshot();
    if !global.quiet && !printer.json {
        eprintln!("Watching {} devices (Ctrl-C to stop)", snapshot.len());
    }
    let mut known = labels(&snapshot);
    state_rx.mark_unchanged();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                printer.connection(&state);
            }

            event = events.recv() => match event {
                Ok(event) => handle_event(&gateway, &event, &mut known, &printer),
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "event stream lagged, resyncing");
                    handle_event(&gateway, &GatewayEvent::DevicesUpdated, &mut known, &printer);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    gateway.disconnect().await;
    Ok(())
}

fn handle_event(
    gateway: &Gateway,
    event: &GatewayEvent,
    known: &mut HashMap<String, String>,
    printer: &Printer,
) {
    match event {
        GatewayEvent::DevicesUpdated => {
            let snapshot = gateway.devices_snapshot();
            for change in changes(known, &snapshot) {
                printer.change(&change);
            }
            *known = labels(&snapshot);
        }
        GatewayEvent::DevicesDiscovered(ids) => {
            printer.note("discovered", format!("{} new device(s)", ids.len()), ids);
        }
        GatewayEvent::DeviceRemoved(id) => {
            printer.note("removed", format!("device {id} removed"), id);
        }
        GatewayEvent::Scenario(ScenarioEvent::StatusChanged { id, record }) => {
            let label = id.map_or_else(|| "?".into(), |id| id.to_string());
            printer.note("scenario", format!("scenario {label} changed"), record);
        }
        GatewayEvent::Scenario(ScenarioEvent::Refreshed { count }) => {
            printer.note(
                "scenarios",
                format!("scenario list refreshed ({count})"),
                count,
            );
        }
    }
}
