// ── Scenario subsystem ──
//
// Scenarios live beside the device catalog rather than in it. The
// manager lists, triggers, records and deletes them, and turns the two
// scenario notifications of the status poll into broadcast events.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info};

use etidomo_api::{DeviceState, DomoClient, ScenarioRecord};

use crate::error::CoreError;

const EVENT_CHANNEL_SIZE: usize = 64;

/// Notification emitted while handling status-poll records.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioEvent {
    /// An existing scenario changed state.
    StatusChanged { id: Option<i64>, record: DeviceState },
    /// The scenario list was refetched after a user-defined scenario was added.
    Refreshed { count: usize },
}

/// Scenario operations keyed by scenario `id`.
pub struct ScenarioManager {
    client: Arc<DomoClient>,
    scenarios: Vec<ScenarioRecord>,
    events: broadcast::Sender<ScenarioEvent>,
}

impl ScenarioManager {
    pub fn new(client: Arc<DomoClient>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self::with_events(client, events)
    }

    /// Publish events on an existing channel.
    pub fn with_events(client: Arc<DomoClient>, events: broadcast::Sender<ScenarioEvent>) -> Self {
        Self {
            client,
            scenarios: Vec::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScenarioEvent> {
        self.events.subscribe()
    }

    /// Scenarios seen by the last [`refresh`](Self::refresh).
    pub fn cached(&self) -> &[ScenarioRecord] {
        &self.scenarios
    }

    /// Fetch the scenario list. Not cached.
    pub async fn list(&self) -> Result<Vec<ScenarioRecord>, CoreError> {
        let scenarios = self.client.list_scenarios().await?;
        debug!(count = scenarios.len(), "scenario list fetched");
        Ok(scenarios)
    }

    /// Refetch the list into the side table.
    pub async fn refresh(&mut self) -> Result<&[ScenarioRecord], CoreError> {
        self.scenarios = self.list().await?;
        debug!(count = self.scenarios.len(), "scenario list refreshed");
        Ok(&self.scenarios)
    }

    pub async fn activate(&self, id: i64) -> Result<(), CoreError> {
        info!(id, "activating scenario");
        Ok(self.client.activate_scenario(id).await?)
    }

    pub async fn create(&self, name: &str) -> Result<(), CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::InvalidArgument {
                message: "scenario name must not be empty".into(),
            });
        }
        info!(name, "recording new scenario");
        Ok(self.client.create_scenario(name).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), CoreError> {
        info!(id, "deleting scenario");
        Ok(self.client.delete_scenario(id).await?)
    }

    /// Handle a `scenario_*` record from the status poll.
    pub async fn handle_update(&mut self, record: DeviceState) -> Result<(), CoreError> {
        match record.get("cmd_name").and_then(Value::as_str) {
            Some("scenario_status_ind") => {
                let id = record.get("id").and_then(Value::as_i64);
                debug!(?id, "scenario status changed");
                self.publish(ScenarioEvent::StatusChanged { id, record });
            }
            Some("scenario_user_ind")
                if matches!(
                    record.get("action").and_then(Value::as_str),
                    Some("add" | "create")
                ) =>
            {
                debug!("user scenario added, refreshing list");
                let count = self.refresh().await?.len();
                self.publish(ScenarioEvent::Refreshed { count });
            }
            other => debug!(cmd_name = ?other, "ignoring scenario record"),
        }
        Ok(())
    }

    fn publish(&self, event: ScenarioEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
