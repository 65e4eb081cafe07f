// Gateway metadata and plant topology endpoints

use serde_json::json;
use tracing::debug;

use crate::client::DomoClient;
use crate::error::Error;
use crate::models::{FeatureList, FloorListResponse, FloorRecord, RoomListResponse, RoomRecord};

impl DomoClient {
    /// Software version, serial, keycode and the list of enabled features.
    pub async fn feature_list(&self) -> Result<FeatureList, Error> {
        debug!("fetching feature list");
        self.application_request(&json!({"cmd_name": "feature_list_req"}), Some("feature_list_resp"))
            .await?
            .parse()
    }

    /// All floors of the plant.
    pub async fn floor_list(&self) -> Result<Vec<FloorRecord>, Error> {
        debug!("fetching floor list");
        let resp: FloorListResponse = self
            .application_request(
                &json!({"cmd_name": "floor_list_req", "topologic_scope": "plant"}),
                Some("floor_list_resp"),
            )
            .await?
            .parse()?;
        Ok(resp.floor_list)
    }

    /// All rooms of the plant.
    pub async fn room_list(&self) -> Result<Vec<RoomRecord>, Error> {
        debug!("fetching room list");
        let resp: RoomListResponse = self
            .application_request(
                &json!({"cmd_name": "room_list_req", "topologic_scope": "plant"}),
                Some("room_list_resp"),
            )
            .await?
            .parse()?;
        Ok(resp.room_list)
    }
}
