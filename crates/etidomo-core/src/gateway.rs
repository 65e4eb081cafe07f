// ── Gateway abstraction ──
//
// Long-running handle around a `Manager`. Loads the plant on connect,
// then a single background task owns the manager: it runs the long-poll
// loop and executes commands sent through an mpsc channel, so cache
// mutation never races. Consumers observe connection state and device
// snapshots through `watch` channels and changes through a broadcast bus.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{CommandEnvelope, CommandResult, GatewayCommand};
use crate::config::GatewayConfig;
use crate::error::CoreError;
use crate::manager::{Manager, StatusPoll};
use crate::model::Device;
use crate::scenario::ScenarioEvent;

const COMMAND_CHANNEL_SIZE: usize = 32;
const EVENT_CHANNEL_SIZE: usize = 256;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Polls are failing; `attempt` counts consecutive failures.
    Offline { attempt: u32 },
    Failed,
}

// ── GatewayEvent ─────────────────────────────────────────────────

/// Change notification broadcast to every subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// A new device snapshot was published.
    DevicesUpdated,
    /// Unique ids that appeared after a catalog reload.
    DevicesDiscovered(Vec<String>),
    /// A device vanished after a catalog reload.
    DeviceRemoved(String),
    Scenario(ScenarioEvent),
}

// ── Gateway ──────────────────────────────────────────────────────

/// Cheaply cloneable handle to a running gateway connection.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    config: GatewayConfig,
    connection_state: watch::Sender<ConnectionState>,
    devices: watch::Sender<Arc<Vec<Device>>>,
    event_tx: broadcast::Sender<Arc<GatewayEvent>>,
    scenario_tx: broadcast::Sender<ScenarioEvent>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Gateway {
    /// Create a handle. Does NOT connect; call [`connect()`](Self::connect).
    pub fn new(config: GatewayConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (devices, _) = watch::channel(Arc::new(Vec::new()));
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (scenario_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Self {
            inner: Arc::new(GatewayInner {
                config,
                connection_state,
                devices,
                event_tx,
                scenario_tx,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Log in, load topology and devices, and start the poll loop.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let manager = Manager::new(&self.inner.config)?;
        self.start(manager).await
    }

    /// Like [`connect()`](Self::connect) with a caller-built manager.
    pub async fn start(&self, manager: Manager) -> Result<(), CoreError> {
        let Some(rx) = self.inner.command_rx.lock().await.take() else {
            return Err(CoreError::Internal("gateway already started".into()));
        };
        self.set_state(ConnectionState::Connecting);

        let mut manager = manager.with_scenario_events(self.inner.scenario_tx.clone());
        if let Err(e) = initial_load(&mut manager).await {
            self.set_state(ConnectionState::Failed);
            return Err(e);
        }
        self.publish_devices(&manager);

        self.set_state(ConnectionState::Connected);

        let mut handles = self.inner.task_handles.lock().await;
        handles.push(tokio::spawn(scenario_forward_task(
            self.clone(),
            self.inner.scenario_tx.subscribe(),
        )));
        handles.push(tokio::spawn(poll_task(self.clone(), manager, rx)));
        info!(host = %self.inner.config.host, "connected to gateway");
        Ok(())
    }

    /// Stop the background tasks and wait for them to finish.
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.set_state(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── Command execution ────────────────────────────────────────

    /// Run a command inside the task that owns the manager.
    pub async fn execute(&self, cmd: GatewayCommand) -> Result<CommandResult, CoreError> {
        if matches!(
            *self.inner.connection_state.borrow(),
            ConnectionState::Disconnected | ConnectionState::Failed
        ) {
            return Err(CoreError::GatewayDisconnected);
        }

        let (tx, rx) = oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::GatewayDisconnected)?;

        rx.await.map_err(|_| CoreError::GatewayDisconnected)?
    }

    // ── State observation ────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Current connection state, no subscription needed.
    pub fn state(&self) -> ConnectionState {
        self.inner.connection_state.borrow().clone()
    }

    pub fn events(&self) -> broadcast::Receiver<Arc<GatewayEvent>> {
        self.inner.event_tx.subscribe()
    }

    pub fn devices(&self) -> watch::Receiver<Arc<Vec<Device>>> {
        self.inner.devices.subscribe()
    }

    pub fn devices_snapshot(&self) -> Arc<Vec<Device>> {
        Arc::clone(&self.inner.devices.borrow())
    }

    // ── Publishing ───────────────────────────────────────────────

    /// Publish the manager's catalog and announce added/removed devices.
    fn publish_devices(&self, manager: &Manager) -> (Vec<String>, Vec<String>) {
        let snapshot = manager.devices_snapshot();
        let old: HashSet<String> = self
            .inner
            .devices
            .borrow()
            .iter()
            .map(Device::unique_id)
            .collect();
        let new: HashSet<String> = snapshot.iter().map(Device::unique_id).collect();

        let discovered: Vec<String> = snapshot
            .iter()
            .map(Device::unique_id)
            .filter(|id| !old.contains(id))
            .collect();
        let removed: Vec<String> = old.difference(&new).cloned().collect();

        self.inner.devices.send_replace(Arc::new(snapshot));
        self.emit(GatewayEvent::DevicesUpdated);
        if !discovered.is_empty() {
            self.emit(GatewayEvent::DevicesDiscovered(discovered.clone()));
        }
        for id in &removed {
            self.emit(GatewayEvent::DeviceRemoved(id.clone()));
        }
        (discovered, removed)
    }

    /// Stored even when nobody is subscribed.
    fn set_state(&self, state: ConnectionState) {
        self.inner.connection_state.send_replace(state);
    }

    fn emit(&self, event: GatewayEvent) {
        let _ = self.inner.event_tx.send(Arc::new(event));
    }
}

// ── Background tasks ─────────────────────────────────────────────

async fn initial_load(manager: &mut Manager) -> Result<(), CoreError> {
    manager.login().await?;
    manager.floors().await?;
    manager.rooms().await?;
    let count = manager.devices().await?.len();
    debug!(devices = count, "initial load complete");
    Ok(())
}

/// One wake-up of the poll task.
enum Step {
    Command(CommandEnvelope),
    Polled(Result<StatusPoll, CoreError>),
}

/// Own the manager: poll for status updates and serve commands.
///
/// Only the long-poll request races incoming commands. A command arriving
/// mid-request cancels it; the returned records are always applied in
/// full before the next command is served.
async fn poll_task(gateway: Gateway, mut manager: Manager, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = gateway.inner.cancel.clone();
    let poll_timeout = gateway.inner.config.poll_timeout_secs;
    let delay = gateway.inner.config.reconnect_delay;
    let mut failures: u32 = 0;

    loop {
        let step = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => match envelope {
                Some(envelope) => Step::Command(envelope),
                None => break,
            },
            result = manager.poll_status(poll_timeout) => Step::Polled(result),
        };

        let result = match step {
            Step::Command(envelope) => {
                let result = route_command(&gateway, &mut manager, envelope.command).await;
                let _ = envelope.response_tx.send(result);
                continue;
            }
            Step::Polled(Ok(StatusPoll::Loaded)) => Ok(true),
            Step::Polled(Ok(StatusPoll::Records(records))) => manager.apply_status(records).await,
            Step::Polled(Err(e)) => Err(e),
        };

        match result {
            Ok(changed) => {
                if failures > 0 {
                    info!("gateway back online");
                    failures = 0;
                    gateway.set_state(ConnectionState::Connected);
                }
                if changed {
                    gateway.publish_devices(&manager);
                }
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                if e.is_connection_error() {
                    warn!(error = %e, attempt = failures, "gateway offline");
                    gateway.set_state(ConnectionState::Offline { attempt: failures });
                } else {
                    warn!(error = %e, "status update failed");
                }
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
    debug!("poll task stopped");
}

/// Re-publish scenario notifications on the gateway bus.
async fn scenario_forward_task(gateway: Gateway, mut rx: broadcast::Receiver<ScenarioEvent>) {
    let cancel = gateway.inner.cancel.clone();
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Ok(event) => gateway.emit(GatewayEvent::Scenario(event)),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "scenario events lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

async fn route_command(
    gateway: &Gateway,
    manager: &mut Manager,
    cmd: GatewayCommand,
) -> Result<CommandResult, CoreError> {
    match cmd {
        GatewayCommand::Device { unique_id, command } => {
            manager.execute(&unique_id, &command).await?;
            Ok(CommandResult::Ok)
        }
        GatewayCommand::ForceUpdate { unique_id } => {
            let updated = manager.update_device(&unique_id).await?;
            if updated {
                gateway.publish_devices(manager);
            }
            Ok(CommandResult::Updated(updated))
        }
        GatewayCommand::PullDevices => {
            manager.invalidate_devices();
            manager.devices().await?;
            let (discovered, removed) = gateway.publish_devices(manager);
            Ok(CommandResult::Devices {
                discovered,
                removed,
            })
        }
        GatewayCommand::Topology => {
            let floors = manager.floors().await?.to_vec();
            let rooms = manager.rooms().await?.to_vec();
            Ok(CommandResult::Topology { floors, rooms })
        }
        GatewayCommand::ListScenarios => Ok(CommandResult::Scenarios(
            manager.scenarios().list().await?,
        )),
        GatewayCommand::ActivateScenario { id } => {
            manager.scenarios().activate(id).await?;
            Ok(CommandResult::Ok)
        }
        GatewayCommand::CreateScenario { name } => {
            manager.scenarios().create(&name).await?;
            Ok(CommandResult::Ok)
        }
        GatewayCommand::DeleteScenario { id } => {
            manager.scenarios().delete(id).await?;
            Ok(CommandResult::Ok)
        }
    }
}
