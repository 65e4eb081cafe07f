// etidomo-api: async client for the CAME ETI/Domo gateway JSON API
//
// The gateway exposes a single endpoint (`POST /domo/`) that takes one JSON
// document per request. A session layer (`sl_*` fields) wraps application
// messages (`cmd_name` plus payload). `DomoClient` handles the session,
// decodes the ack codes, and exposes each application command as an
// inherent async method.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

mod devices;
mod scenarios;
mod session;
mod topology;

pub use auth::Credentials;
pub use client::DomoClient;
pub use error::Error;
pub use models::{
    ActionRequest, DeviceState, Feature, FeatureList, FloorRecord, Reply, RoomRecord,
    ScenarioRecord, ScenarioStatus, Scope,
};
pub use transport::TransportConfig;
