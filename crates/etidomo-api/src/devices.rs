// Device list, action and status-polling endpoints

use std::time::Duration;

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::client::DomoClient;
use crate::error::Error;
use crate::models::{ActionRequest, DeviceState, GENERIC_REPLY, ListRequest, Reply, Scope};

impl DomoClient {
    /// Query `<base>_list_req` and return the whole reply.
    ///
    /// The reply is returned undecoded because some features attach extra
    /// top-level record groups next to `array` (thermoregulation reports
    /// its temperature, humidity and pressure sensors that way).
    pub async fn list_devices(&self, base: &str, scope: Scope) -> Result<Reply, Error> {
        debug!(base, ?scope, "listing devices");
        let expected = format!("{base}_list_resp");
        self.application_request(&ListRequest::new(base, scope), Some(&expected))
            .await
    }

    /// Fresh state records for the single device with `act_id`.
    pub async fn device_records(&self, base: &str, act_id: i64) -> Result<Vec<DeviceState>, Error> {
        Ok(self
            .list_devices(base, Scope::Act(act_id))
            .await?
            .records("array"))
    }

    /// Send a state-changing command; the gateway answers `generic_reply`.
    pub async fn send_action(&self, action: &ActionRequest) -> Result<(), Error> {
        debug!(act_id = action.act_id(), "sending action");
        self.application_request(action, Some(GENERIC_REPLY))
            .await
            .map(|_| ())
    }

    /// Long-poll for state changes.
    ///
    /// With `timeout_secs` the gateway holds the request open until
    /// something changes or the timeout expires; the HTTP timeout is
    /// extended by the same amount. Returns the `result` records, which
    /// mix device deltas with plant and scenario notifications.
    pub async fn status_update(&self, timeout_secs: Option<u64>) -> Result<Vec<DeviceState>, Error> {
        let mut cmd = Map::new();
        cmd.insert("cmd_name".into(), json!("status_update_req"));
        if let Some(secs) = timeout_secs {
            cmd.insert("timeout".into(), Value::from(secs));
        }
        let reply = self
            .application_request_with_wait(
                &cmd,
                Some("status_update_resp"),
                timeout_secs.map(Duration::from_secs),
            )
            .await?;
        Ok(reply.records("result"))
    }
}
