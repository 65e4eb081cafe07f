// Scenario endpoints

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::client::DomoClient;
use crate::error::Error;
use crate::models::ScenarioRecord;

impl DomoClient {
    /// All stored scenarios. Records that do not decode are skipped.
    pub async fn list_scenarios(&self) -> Result<Vec<ScenarioRecord>, Error> {
        debug!("fetching scenario list");
        let reply = self
            .application_request(&json!({"cmd_name": "scenarios_list_req"}), Some("scenarios_list_resp"))
            .await?;
        let scenarios = reply
            .records("array")
            .into_iter()
            .filter_map(|record| {
                let raw = Value::Object(record);
                match serde_json::from_value(raw.clone()) {
                    Ok(scenario) => Some(scenario),
                    Err(e) => {
                        warn!(error = %e, record = %raw, "skipping undecodable scenario");
                        None
                    }
                }
            })
            .collect();
        Ok(scenarios)
    }

    /// Trigger a scenario. The gateway sends no meaningful reply name.
    pub async fn activate_scenario(&self, id: i64) -> Result<(), Error> {
        debug!(id, "activating scenario");
        self.application_request(&json!({"cmd_name": "scenario_activation_req", "id": id}), None)
            .await
            .map(|_| ())
    }

    /// Start recording a new scenario with `name`.
    pub async fn create_scenario(&self, name: &str) -> Result<(), Error> {
        debug!(name, "creating scenario");
        self.application_request(
            &json!({"cmd_name": "scenario_registration_start", "name": name}),
            Some("scenario_registration_start_ack"),
        )
        .await
        .map(|_| ())
    }

    /// Delete a stored scenario.
    pub async fn delete_scenario(&self, id: i64) -> Result<(), Error> {
        debug!(id, "deleting scenario");
        self.application_request(
            &json!({"cmd_name": "scenario_delete_req", "id": id}),
            Some("scenario_delete_resp"),
        )
        .await
        .map(|_| ())
    }
}
