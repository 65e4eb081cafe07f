#![allow(clippy::unwrap_used)]
// Integration tests for `DomoClient` using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use etidomo_api::{
    ActionRequest, Credentials, DomoClient, Error, Feature, ScenarioStatus, Scope, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn endpoint(server: &MockServer) -> Url {
    Url::parse(&format!("{}/domo/", server.uri())).unwrap()
}

async fn setup() -> (MockServer, DomoClient) {
    let server = MockServer::start().await;
    let token = SecretString::from("tok-123".to_string());
    let http = TransportConfig::default().build_client(&token).unwrap();
    let client = DomoClient::with_client(http, endpoint(&server), Credentials::new("admin", "secret"));
    (server, client)
}

fn registration_ack() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "sl_cmd": "sl_registration_ack",
        "sl_data_ack_reason": 0,
        "sl_client_id": "c-1"
    }))
}

fn data_reply(payload: serde_json::Value) -> ResponseTemplate {
    let mut body = json!({"sl_cmd": "sl_data_ack", "sl_data_ack_reason": 0});
    body.as_object_mut()
        .unwrap()
        .extend(payload.as_object().unwrap().clone());
    ResponseTemplate::new(200).set_body_json(body)
}

async fn mount_login(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path("/domo/"))
        .and(body_string_contains("sl_registration_req"))
        .respond_with(registration_ack())
        .expect(times)
        .mount(server)
        .await;
}

// ── Session tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_login_sends_token_and_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/domo/"))
        .and(header("authorization", "access_token tok-123"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("sl_registration_req"))
        .and(body_string_contains("admin"))
        .respond_with(registration_ack())
        .expect(1)
        .mount(&server)
        .await;

    assert!(!client.is_connected());
    client.login().await.unwrap();
    assert_eq!(client.client_id().as_deref(), Some("c-1"));
    assert_eq!(client.session_epoch(), 1);
}

#[tokio::test]
async fn test_login_is_idempotent() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    client.login().await.unwrap();
    client.login().await.unwrap();
    assert_eq!(client.session_epoch(), 1);
}

#[tokio::test]
async fn test_login_without_client_id_fails() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/domo/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sl_cmd": "sl_registration_ack",
            "sl_data_ack_reason": 0,
            "sl_client_id": ""
        })))
        .mount(&server)
        .await;

    let result = client.login().await;
    assert!(
        matches!(result, Err(Error::MissingClientId)),
        "expected MissingClientId, got: {result:?}"
    );
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_invalid_user_is_decoded() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/domo/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"sl_data_ack_reason": 1})),
        )
        .mount(&server)
        .await;

    let err = client.login().await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid user.");
    assert_eq!(err.errno(), Some(1));
}

// ── Application layer ───────────────────────────────────────────────

#[tokio::test]
async fn test_feature_list() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/domo/"))
        .and(body_string_contains("sl_data_req"))
        .and(body_string_contains("feature_list_req"))
        .and(body_string_contains("c-1"))
        .respond_with(data_reply(json!({
            "cmd_name": "feature_list_resp",
            "swver": "1.2.3",
            "serial": "0011aabb",
            "keycode": "KEY",
            "list": ["lights", "thermoregulation", "cameras"]
        })))
        .mount(&server)
        .await;

    let features = client.feature_list().await.unwrap();
    assert_eq!(features.swver.as_deref(), Some("1.2.3"));
    assert_eq!(features.list.len(), 3);
}

#[tokio::test]
async fn test_unexpected_reply_name() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/domo/"))
        .and(body_string_contains("sl_data_req"))
        .respond_with(data_reply(json!({"cmd_name": "generic_reply"})))
        .mount(&server)
        .await;

    let result = client.floor_list().await;
    assert!(
        matches!(
            &result,
            Err(Error::UnexpectedResponse { expected, actual })
                if expected == "floor_list_resp" && actual.as_deref() == Some("generic_reply")
        ),
        "got: {result:?}"
    );
    // Protocol errors keep the session.
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_topology_lists() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(body_string_contains("floor_list_req"))
        .respond_with(data_reply(json!({
            "cmd_name": "floor_list_resp",
            "floor_list": [{"floor_ind": 0, "name": "Ground"}, {"floor_ind": 1, "name": "First"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("room_list_req"))
        .respond_with(data_reply(json!({
            "cmd_name": "room_list_resp",
            "room_list": [{"room_ind": 3, "name": "Kitchen", "floor_ind": 0}]
        })))
        .mount(&server)
        .await;

    let floors = client.floor_list().await.unwrap();
    let rooms = client.room_list().await.unwrap();
    assert_eq!(floors.len(), 2);
    assert_eq!(floors[1].name, "First");
    assert_eq!(rooms[0].room_ind, 3);
    assert_eq!(rooms[0].floor_ind, 0);
}

#[tokio::test]
async fn test_list_devices_plant_scope() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(body_string_contains("light_list_req"))
        .and(body_string_contains("plant"))
        .respond_with(data_reply(json!({
            "cmd_name": "light_list_resp",
            "array": [
                {"act_id": 1, "name": "Hall", "status": 0, "type": "STEP_STEP"},
                {"act_id": 2, "name": "Lounge", "status": 1, "type": "DIMMER", "perc": 40}
            ]
        })))
        .mount(&server)
        .await;

    let reply = client
        .list_devices(Feature::Lights.list_base(), Scope::Plant)
        .await
        .unwrap();
    let records = reply.records("array");
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["perc"], json!(40));
}

#[tokio::test]
async fn test_send_action() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(body_string_contains("relay_activation_req"))
        .respond_with(data_reply(json!({"cmd_name": "generic_reply"})))
        .expect(1)
        .mount(&server)
        .await;

    client
        .send_action(&ActionRequest::RelayActivation {
            act_id: 9,
            wanted_status: 1,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_status_update_returns_result_records() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(body_string_contains("status_update_req"))
        .and(body_string_contains("timeout"))
        .respond_with(data_reply(json!({
            "cmd_name": "status_update_resp",
            "result": [
                {"cmd_name": "light_switch_ind", "act_id": 1, "status": 1},
                {"cmd_name": "plant_update_ind"}
            ]
        })))
        .mount(&server)
        .await;

    let records = client.status_update(Some(1)).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["cmd_name"], json!("plant_update_ind"));
}

#[tokio::test]
async fn test_scenarios() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(body_string_contains("scenarios_list_req"))
        .respond_with(data_reply(json!({
            "cmd_name": "scenarios_list_resp",
            "array": [{"id": 5, "name": "Evening", "scenario_status": 0, "user_defined": 0}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("scenario_activation_req"))
        .respond_with(data_reply(json!({"cmd_name": "whatever"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("scenario_delete_req"))
        .respond_with(data_reply(json!({"cmd_name": "scenario_delete_resp"})))
        .expect(1)
        .mount(&server)
        .await;

    let scenarios = client.list_scenarios().await.unwrap();
    assert_eq!(scenarios[0].name, "Evening");
    assert_eq!(scenarios[0].status(), ScenarioStatus::Off);

    client.activate_scenario(5).await.unwrap();
    client.delete_scenario(5).await.unwrap();
}

#[tokio::test]
async fn test_scenario_list_skips_undecodable_records() {
    let (server, client) = setup().await;
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(body_string_contains("scenarios_list_req"))
        .respond_with(data_reply(json!({
            "cmd_name": "scenarios_list_resp",
            "array": [
                {"name": "no id here"},
                {"id": 6, "name": "Night", "scenario_status": 2, "user_defined": 1}
            ]
        })))
        .mount(&server)
        .await;

    let scenarios = client.list_scenarios().await.unwrap();
    assert_eq!(scenarios.len(), 1);
    assert_eq!(scenarios[0].id, 6);
    assert_eq!(scenarios[0].status(), ScenarioStatus::On);
}

// ── Connection failures ─────────────────────────────────────────────

#[tokio::test]
async fn test_http_error_drops_session_and_relogs() {
    let (server, client) = setup().await;
    mount_login(&server, 2).await;

    Mock::given(method("POST"))
        .and(body_string_contains("sl_data_req"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("sl_data_req"))
        .respond_with(data_reply(json!({"cmd_name": "generic_reply"})))
        .mount(&server)
        .await;

    let action = ActionRequest::OpeningMove {
        act_id: 4,
        wanted_status: 0,
    };
    let err = client.send_action(&action).await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 500 }));
    assert!(err.is_connection_error());
    assert!(!client.is_connected());

    client.send_action(&action).await.unwrap();
    assert_eq!(client.session_epoch(), 2);
}

#[tokio::test]
async fn test_timeout_is_reported_as_timeout() {
    let server = MockServer::start().await;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let client = DomoClient::with_client(http, endpoint(&server), Credentials::new("admin", "secret"));
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(body_string_contains("sl_data_req"))
        .respond_with(
            data_reply(json!({"cmd_name": "generic_reply"})).set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.feature_list().await.unwrap_err();
    assert!(err.is_timeout(), "got: {err:?}");
    assert!(err.is_connection_error());
    assert!(!client.is_connected());
}
