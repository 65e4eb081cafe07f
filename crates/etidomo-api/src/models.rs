// ETI/Domo wire models
//
// Every exchange is a flat JSON object: session-layer fields (`sl_cmd`,
// `sl_client_id`, `sl_data_ack_reason`) sit next to the application-layer
// fields (`cmd_name` plus feature-specific keys). Device records are kept as
// raw maps because the gateway's field set varies per firmware and per
// device type; typed views over them live in `etidomo-core`.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::Error;

/// Raw key/value snapshot of a single device as reported by the gateway.
pub type DeviceState = Map<String, Value>;

/// Application reply name for plain acknowledgements.
pub const GENERIC_REPLY: &str = "generic_reply";

// ── Reply ────────────────────────────────────────────────────────────

/// A decoded gateway reply (session envelope and application payload).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reply(pub Map<String, Value>);

impl Reply {
    /// Session-layer command tag (`sl_cmd`).
    pub fn sl_cmd(&self) -> Option<&str> {
        self.0.get("sl_cmd").and_then(Value::as_str)
    }

    /// Application-layer command tag (`cmd_name`).
    pub fn cmd_name(&self) -> Option<&str> {
        self.0.get("cmd_name").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Device records stored under `field`.
    ///
    /// The gateway usually answers with an array, but some scoped queries
    /// return a single object; both shapes are accepted. Anything else
    /// yields an empty list.
    pub fn records(&self, field: &str) -> Vec<DeviceState> {
        match self.0.get(field) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect(),
            Some(Value::Object(obj)) => vec![obj.clone()],
            _ => Vec::new(),
        }
    }

    /// Deserialize the reply into a typed payload.
    pub fn parse<T: DeserializeOwned>(self) -> Result<T, Error> {
        let body = Value::Object(self.0);
        serde_json::from_value(body.clone()).map_err(|e| Error::MalformedResponse {
            message: e.to_string(),
            body: body.to_string(),
        })
    }
}

// ── Session layer ────────────────────────────────────────────────────

/// Session-layer request wrapper.
#[derive(Debug, Serialize)]
#[serde(tag = "sl_cmd")]
pub(crate) enum SessionRequest<'a, T: Serialize + ?Sized> {
    #[serde(rename = "sl_registration_req")]
    Registration { sl_login: &'a str, sl_pwd: &'a str },
    #[serde(rename = "sl_data_req")]
    Data {
        sl_client_id: &'a str,
        sl_appl_msg: &'a T,
    },
}

/// Human-readable text for a non-zero `sl_data_ack_reason`.
pub fn ack_reason_message(code: i64) -> Option<&'static str> {
    let msg = match code {
        1 => "Invalid user.",
        3 => "Too many sessions during login.",
        4 => "Error occurred in JSON Syntax.",
        5 => "No session layer command tag.",
        6 => "Unrecognized session layer command.",
        7 => "No client ID in request.",
        8 => "Wrong client ID in request.",
        9 => "Wrong application command.",
        10 => "No reply to application command, maybe service down.",
        11 => "Wrong application data.",
        _ => return None,
    };
    Some(msg)
}

// ── Features ─────────────────────────────────────────────────────────

/// Device families the gateway can report in its feature list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Feature {
    Lights,
    Openings,
    Relays,
    Thermoregulation,
    Energy,
    #[strum(serialize = "digitalin")]
    DigitalIn,
}

impl Feature {
    /// Name used in `feature_list_resp`.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Prefix of the `<base>_list_req` / `<base>_list_resp` command pair.
    pub fn list_base(self) -> &'static str {
        match self {
            Self::Lights => "light",
            Self::Openings => "openings",
            Self::Relays => "relays",
            Self::Thermoregulation => "thermo",
            Self::Energy => "meters",
            Self::DigitalIn => "digitalin",
        }
    }
}

/// `feature_list_resp` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureList {
    #[serde(default)]
    pub swver: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub keycode: Option<String>,
    #[serde(default)]
    pub list: Vec<String>,
}

// ── Topology ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorRecord {
    pub floor_ind: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub room_ind: i64,
    pub name: String,
    pub floor_ind: i64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FloorListResponse {
    #[serde(default)]
    pub floor_list: Vec<FloorRecord>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RoomListResponse {
    #[serde(default)]
    pub room_list: Vec<RoomRecord>,
}

// ── Application requests ─────────────────────────────────────────────

/// Which part of the plant a list request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every device of the feature.
    Plant,
    /// The single device with this action id.
    Act(i64),
}

#[derive(Debug, Serialize)]
pub(crate) struct ListRequest {
    pub cmd_name: String,
    pub topologic_scope: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

impl ListRequest {
    pub fn new(base: &str, scope: Scope) -> Self {
        let (topologic_scope, value) = match scope {
            Scope::Plant => ("plant", None),
            Scope::Act(id) => ("act", Some(id)),
        };
        Self {
            cmd_name: format!("{base}_list_req"),
            topologic_scope,
            value,
        }
    }
}

/// A state-changing command addressed to one device.
///
/// Fields that are `None` and not marked optional are still sent (as
/// `null`); the gateway treats that as "leave unchanged".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cmd_name")]
pub enum ActionRequest {
    #[serde(rename = "light_switch_req")]
    LightSwitch {
        act_id: i64,
        wanted_status: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        perc: Option<u8>,
        #[serde(skip_serializing_if = "Option::is_none")]
        rgb: Option<[u8; 3]>,
    },
    #[serde(rename = "relay_activation_req")]
    RelayActivation { act_id: i64, wanted_status: i64 },
    #[serde(rename = "opening_move_req")]
    OpeningMove { act_id: i64, wanted_status: i64 },
    #[serde(rename = "thermo_zone_config_req")]
    ThermoZoneConfig {
        act_id: i64,
        mode: Option<i64>,
        set_point: Option<i64>,
        extended_infos: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        season: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        fan_speed: Option<i64>,
    },
}

impl ActionRequest {
    pub fn act_id(&self) -> i64 {
        match self {
            Self::LightSwitch { act_id, .. }
            | Self::RelayActivation { act_id, .. }
            | Self::OpeningMove { act_id, .. }
            | Self::ThermoZoneConfig { act_id, .. } => *act_id,
        }
    }
}

// ── Scenarios ────────────────────────────────────────────────────────

/// Stored scenario as returned by `scenarios_list_resp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub scenario_status: i64,
    #[serde(default, deserialize_with = "bool_or_int")]
    pub user_defined: bool,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Activation state of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioStatus {
    Off,
    Transitioning,
    On,
    Unknown(i64),
}

impl From<i64> for ScenarioStatus {
    fn from(value: i64) -> Self {
        match value {
            0 => Self::Off,
            1 => Self::Transitioning,
            2 => Self::On,
            other => Self::Unknown(other),
        }
    }
}

impl ScenarioRecord {
    pub fn status(&self) -> ScenarioStatus {
        ScenarioStatus::from(self.scenario_status)
    }
}

/// The gateway reports flags as either JSON booleans or 0/1 integers.
fn bool_or_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    })
}
