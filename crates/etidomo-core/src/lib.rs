//! Device catalog and gateway lifecycle on top of `etidomo-api`.
//!
//! - **[`Manager`]**: caches built on one gateway session (feature list,
//!   floors, rooms, the [`DeviceCatalog`]) plus the long-poll
//!   [`status_update()`](Manager::status_update) that keeps them current.
//!   Driven by one task through `&mut self`.
//!
//! - **[`Gateway`]**: cloneable background handle. Owns a `Manager` in a
//!   spawned task that runs the retry-forever poll loop and executes
//!   [`GatewayCommand`]s sent over an `mpsc` channel. Publishes device
//!   snapshots on a `watch` channel and [`GatewayEvent`]s on a broadcast bus.
//!
//! - **Domain model** ([`model`]): a single [`Device`] type tagged with a
//!   closed [`DeviceKind`], with borrowed per-kind views (`Light`,
//!   `Thermostat`, `Relay`, `Opening`, `DigitalIn`, `Sensor`).
//!
//! - **[`DeviceCommand`]**: validated state changes, built into wire
//!   requests before anything is sent.
//!
//! - **[`ScenarioManager`]**: stored scenarios and their notifications.
//!
//! - **[`CoverEstimator`]**: time-based position estimate for openings.

pub mod catalog;
pub mod command;
pub mod config;
pub mod convert;
pub mod cover;
pub mod error;
pub mod gateway;
pub mod manager;
pub mod model;
pub mod scenario;

// ── Primary re-exports ──────────────────────────────────────────────
pub use catalog::DeviceCatalog;
pub use command::{CommandResult, DeviceCommand, GatewayCommand};
pub use config::GatewayConfig;
pub use cover::{CoverEstimator, Direction, Progress, TravelTimes};
pub use error::CoreError;
pub use gateway::{ConnectionState, Gateway, GatewayEvent};
pub use manager::{Manager, StatusPoll};
pub use scenario::{ScenarioEvent, ScenarioManager};

pub use etidomo_api::{FeatureList, ScenarioRecord, ScenarioStatus};

pub use model::{
    Device, DeviceKind, DigitalIn, FanMode, FanSpeed, Floor, Light, LightState, LightType,
    Opening, OpeningState, Relay, RelayState, Room, Season, Sensor, SensorKind, ThermoMode,
    Thermostat,
};
