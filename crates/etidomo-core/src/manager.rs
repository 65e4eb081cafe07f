// ── Gateway manager ──
//
// Owns one `DomoClient` plus every cache built on top of it: the feature
// list (with firmware info), floors, rooms and the device catalog. All
// cache mutation goes through `&mut self`, so a manager is driven by a
// single task at a time; `Gateway` wraps it for shared use.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use etidomo_api::{
    Credentials, DeviceState, DomoClient, Feature, FeatureList, Scope, TransportConfig,
};

use crate::catalog::{DeviceCatalog, devices_from_reply};
use crate::command::DeviceCommand;
use crate::config::GatewayConfig;
use crate::error::CoreError;
use crate::model::{Device, DeviceKind, Floor, Room};
use crate::scenario::{ScenarioEvent, ScenarioManager};

/// Cached view of one gateway.
pub struct Manager {
    client: Arc<DomoClient>,
    features: Option<FeatureList>,
    floors: Option<Vec<Floor>>,
    rooms: Option<Vec<Room>>,
    devices: Option<DeviceCatalog>,
    /// Session epoch the feature list and catalog were built against.
    session_epoch: u64,
    scenarios: ScenarioManager,
}

impl Manager {
    /// Build a manager (and its HTTP client) from configuration. Does not
    /// touch the network.
    pub fn new(config: &GatewayConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let transport = TransportConfig {
            timeout: config.timeout,
        };
        let credentials = Credentials {
            username: config.username.clone(),
            password: config.password.clone(),
        };
        let client = DomoClient::new(&config.host, &config.token, credentials, &transport)?;
        Ok(Self::with_client(client))
    }

    /// Wrap an existing client.
    pub fn with_client(client: DomoClient) -> Self {
        let client = Arc::new(client);
        Self {
            scenarios: ScenarioManager::new(Arc::clone(&client)),
            client,
            features: None,
            floors: None,
            rooms: None,
            devices: None,
            session_epoch: 0,
        }
    }

    /// Publish scenario events on `events` instead of a private channel.
    pub fn with_scenario_events(mut self, events: broadcast::Sender<ScenarioEvent>) -> Self {
        self.scenarios = ScenarioManager::with_events(Arc::clone(&self.client), events);
        self
    }

    pub fn client(&self) -> &DomoClient {
        &self.client
    }

    /// `true` while a session is held.
    pub fn connected(&self) -> bool {
        self.client.is_connected()
    }

    pub fn scenarios(&self) -> &ScenarioManager {
        &self.scenarios
    }

    pub fn scenarios_mut(&mut self) -> &mut ScenarioManager {
        &mut self.scenarios
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Log in if needed. A new session drops the cached feature list and
    /// device catalog.
    pub async fn login(&mut self) -> Result<(), CoreError> {
        self.client.login().await?;
        self.sync_session();
        Ok(())
    }

    fn sync_session(&mut self) {
        let epoch = self.client.session_epoch();
        if epoch == self.session_epoch {
            return;
        }
        if self.features.is_some() || self.devices.is_some() {
            info!(epoch, "new gateway session, dropping cached devices");
        }
        self.features = None;
        self.devices = None;
        self.session_epoch = epoch;
    }

    // ── Gateway info ─────────────────────────────────────────────────

    /// Feature list plus firmware version, serial and keycode. Cached per
    /// session.
    pub async fn gateway_info(&mut self) -> Result<&FeatureList, CoreError> {
        self.login().await?;
        if self.features.is_none() {
            let features = self.client.feature_list().await?;
            debug!(features = ?features.list, "features received");
            self.features = Some(features);
        } else {
            debug!("features already cached");
        }
        Ok(self.features.get_or_insert_default())
    }

    pub async fn software_version(&mut self) -> Result<Option<String>, CoreError> {
        Ok(self.gateway_info().await?.swver.clone())
    }

    pub async fn serial(&mut self) -> Result<Option<String>, CoreError> {
        Ok(self.gateway_info().await?.serial.clone())
    }

    pub async fn keycode(&mut self) -> Result<Option<String>, CoreError> {
        Ok(self.gateway_info().await?.keycode.clone())
    }

    // ── Topology ─────────────────────────────────────────────────────

    /// All floors. Fetched once per manager.
    pub async fn floors(&mut self) -> Result<&[Floor], CoreError> {
        if self.floors.is_none() {
            let floors = self
                .client
                .floor_list()
                .await?
                .into_iter()
                .map(Floor::from)
                .collect();
            self.floors = Some(floors);
        } else {
            debug!("floors already cached");
        }
        Ok(self.floors.get_or_insert_default())
    }

    /// All rooms. Fetched once per manager.
    pub async fn rooms(&mut self) -> Result<&[Room], CoreError> {
        if self.rooms.is_none() {
            let rooms = self
                .client
                .room_list()
                .await?
                .into_iter()
                .map(Room::from)
                .collect();
            self.rooms = Some(rooms);
        } else {
            debug!("rooms already cached");
        }
        Ok(self.rooms.get_or_insert_default())
    }

    /// The floor with `id`, or a placeholder.
    pub async fn floor(&mut self, id: i64) -> Result<Floor, CoreError> {
        Ok(Floor::resolve(self.floors().await?, id))
    }

    /// The room with `id`, or a placeholder on `floor_id`.
    pub async fn room(&mut self, id: i64, floor_id: Option<i64>) -> Result<Room, CoreError> {
        Ok(Room::resolve(self.rooms().await?, id, floor_id))
    }

    // ── Device catalog ───────────────────────────────────────────────

    async fn catalog(&mut self) -> Result<&mut DeviceCatalog, CoreError> {
        self.login().await?;
        if self.devices.is_none() {
            let devices = self.fetch_devices().await?;
            self.devices = Some(DeviceCatalog::new(devices));
        } else {
            debug!("using cached devices");
        }
        Ok(self.devices.get_or_insert_default())
    }

    async fn fetch_devices(&mut self) -> Result<Vec<Device>, CoreError> {
        let names = self.gateway_info().await?.list.clone();
        let mut devices = Vec::new();
        for name in &names {
            let Ok(feature) = name.parse::<Feature>() else {
                warn!(feature = %name, "unsupported feature type");
                continue;
            };
            let reply = self
                .client
                .list_devices(feature.list_base(), Scope::Plant)
                .await?;
            devices.extend(devices_from_reply(feature, &reply));
        }
        info!(count = devices.len(), "device catalog loaded");
        Ok(devices)
    }

    /// Every known device, fetching the catalog on first use.
    pub async fn devices(&mut self) -> Result<&[Device], CoreError> {
        Ok(self.catalog().await?.devices())
    }

    /// Cloned catalog contents without touching the network.
    pub fn devices_snapshot(&self) -> Vec<Device> {
        self.devices
            .as_ref()
            .map(|c| c.devices().to_vec())
            .unwrap_or_default()
    }

    /// Drop the catalog; the next access refetches it.
    pub fn invalidate_devices(&mut self) {
        debug!("device catalog invalidated");
        self.devices = None;
    }

    pub async fn device_by_id(&mut self, unique_id: &str) -> Result<Option<&Device>, CoreError> {
        let device = self.catalog().await?.by_unique_id(unique_id);
        if device.is_none() {
            warn!(unique_id, "device not found");
        }
        Ok(device)
    }

    pub async fn device_by_act_id(&mut self, act_id: i64) -> Result<Option<&Device>, CoreError> {
        let device = self.catalog().await?.by_act_id(act_id);
        if device.is_none() {
            warn!(act_id, "device not found");
        }
        Ok(device)
    }

    pub async fn device_by_name(&mut self, name: &str) -> Result<Option<&Device>, CoreError> {
        let device = self.catalog().await?.by_name(name);
        if device.is_none() {
            warn!(name, "device not found");
        }
        Ok(device)
    }

    pub async fn devices_by_floor(&mut self, floor_id: i64) -> Result<Vec<&Device>, CoreError> {
        Ok(self.catalog().await?.by_floor(floor_id))
    }

    pub async fn devices_by_room(&mut self, room_id: i64) -> Result<Vec<&Device>, CoreError> {
        Ok(self.catalog().await?.by_room(room_id))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Validate `command` against the device and send it.
    pub async fn execute(&mut self, unique_id: &str, command: &DeviceCommand) -> Result<(), CoreError> {
        let device = self
            .catalog()
            .await?
            .by_unique_id(unique_id)
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: unique_id.to_owned(),
            })?;
        let Some(request) = command.build(device)? else {
            debug!(unique_id, command = command.name(), "command is a no-op for this device");
            return Ok(());
        };
        self.client.send_action(&request).await?;
        Ok(())
    }

    /// Re-read one device from the gateway. Returns whether it changed.
    ///
    /// Passive sensors without an action id are skipped silently; any
    /// other unmanaged device fails before a request is sent.
    pub async fn update_device(&mut self, unique_id: &str) -> Result<bool, CoreError> {
        let device = self
            .catalog()
            .await?
            .by_unique_id(unique_id)
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: unique_id.to_owned(),
            })?;
        let kind = device.kind();
        let act_id = match device.require_act_id() {
            Ok(id) => id,
            Err(_) if matches!(kind, DeviceKind::EnergySensor | DeviceKind::AnalogSensor(_)) => {
                debug!(unique_id, "passive sensor has no action id, skipping update");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let reply = self
            .client
            .list_devices(kind.feature().list_base(), Scope::Act(act_id))
            .await?;

        let Some(device) = self
            .devices
            .as_mut()
            .and_then(|c| c.by_unique_id_mut(unique_id))
        else {
            return Ok(false);
        };
        for record in reply.records(kind.update_field()) {
            if device.matches(&record) {
                return Ok(device.update_state(record));
            }
        }
        debug!(unique_id, "force update returned no matching record");
        Ok(false)
    }

    // ── Status polling ───────────────────────────────────────────────

    /// Long-poll the gateway and apply the returned deltas.
    ///
    /// Returns `true` when any device changed. The first call (or the first
    /// after a new session) only loads the catalog and always returns
    /// `true`; a plant update indication reloads it and also returns
    /// `true`.
    pub async fn status_update(&mut self, timeout_secs: Option<u64>) -> Result<bool, CoreError> {
        match self.poll_status(timeout_secs).await? {
            StatusPoll::Loaded => Ok(true),
            StatusPoll::Records(records) => self.apply_status(records).await,
        }
    }

    /// Network half of [`status_update()`](Self::status_update).
    ///
    /// Nothing is applied to the catalog here, so dropping the future
    /// mid-request loses no state.
    pub async fn poll_status(&mut self, timeout_secs: Option<u64>) -> Result<StatusPoll, CoreError> {
        self.login().await?;
        if self.devices.is_none() {
            debug!("devices not cached, loading catalog first");
            self.catalog().await?;
            return Ok(StatusPoll::Loaded);
        }
        Ok(StatusPoll::Records(
            self.client.status_update(timeout_secs).await?,
        ))
    }

    /// Apply records returned by [`poll_status()`](Self::poll_status).
    ///
    /// Device deltas go first. A failing scenario refresh is logged and
    /// does not hold back the rest of the batch.
    pub async fn apply_status(&mut self, records: Vec<DeviceState>) -> Result<bool, CoreError> {
        let mut updated = false;
        let mut plant_update = false;
        let mut scenario_records = Vec::new();

        for record in records {
            let cmd_name = record
                .get("cmd_name")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if cmd_name == "plant_update_ind" {
                plant_update = true;
            } else if cmd_name.starts_with("scenario_") {
                scenario_records.push(record);
            } else if record.contains_key("act_id") || record.contains_key("open_act_id") {
                if let Some(catalog) = self.devices.as_mut() {
                    updated |= catalog.apply(record);
                }
            } else {
                debug!(cmd_name, "ignoring record without action id");
            }
        }

        for record in scenario_records {
            if let Err(e) = self.scenarios.handle_update(record).await {
                warn!(error = %e, "scenario update failed");
            }
        }

        if plant_update {
            info!("plant update indication, reloading devices");
            self.invalidate_devices();
            self.catalog().await?;
            return Ok(true);
        }

        debug!(updated, "status update finished");
        Ok(updated)
    }
}

/// Result of the network half of a status poll.
#[derive(Debug)]
pub enum StatusPoll {
    /// No catalog was cached; it was loaded instead of polling.
    Loaded,
    /// Records returned by the long poll, not yet applied.
    Records(Vec<DeviceState>),
}
