#![allow(clippy::unwrap_used)]
// Integration tests for the background `Gateway` handle.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use etidomo_api::{Credentials, DomoClient, TransportConfig};
use etidomo_core::{
    CommandResult, ConnectionState, CoreError, DeviceCommand, Gateway, GatewayCommand,
    GatewayConfig, GatewayEvent, Manager, RelayState, ScenarioEvent,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Gateway, Manager) {
    let server = MockServer::start().await;
    let token = SecretString::from("tok-123".to_string());
    let http = TransportConfig::default().build_client(&token).unwrap();
    let endpoint = Url::parse(&format!("{}/domo/", server.uri())).unwrap();
    let client = DomoClient::with_client(http, endpoint, Credentials::new("admin", "secret"));

    let config = GatewayConfig::new(
        server.address().to_string(),
        token,
        "admin",
        SecretString::from("secret".to_string()),
    )
    .unwrap()
    .with_reconnect_delay(Duration::from_millis(50));

    (server, Gateway::new(config), Manager::with_client(client))
}

fn data_reply(payload: Value) -> ResponseTemplate {
    let mut body = json!({"sl_cmd": "sl_data_ack", "sl_data_ack_reason": 0});
    body.as_object_mut()
        .unwrap()
        .extend(payload.as_object().unwrap().clone());
    ResponseTemplate::new(200).set_body_json(body)
}

async fn mount(server: &MockServer, needle: &str, reply: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/domo/"))
        .and(body_string_contains(needle))
        .respond_with(reply)
        .mount(server)
        .await;
}

/// Everything `start()` loads, plus an idle long-poll.
async fn mount_plant(server: &MockServer) {
    mount(
        server,
        "sl_registration_req",
        ResponseTemplate::new(200).set_body_json(json!({
            "sl_cmd": "sl_registration_ack",
            "sl_data_ack_reason": 0,
            "sl_client_id": "c-1"
        })),
    )
    .await;
    mount(
        server,
        "feature_list_req",
        data_reply(json!({"cmd_name": "feature_list_resp", "list": ["relays"]})),
    )
    .await;
    mount(
        server,
        "floor_list_req",
        data_reply(json!({"cmd_name": "floor_list_resp", "floor_list": []})),
    )
    .await;
    mount(
        server,
        "room_list_req",
        data_reply(json!({"cmd_name": "room_list_resp", "room_list": []})),
    )
    .await;
    mount(
        server,
        "relays_list_req",
        data_reply(json!({
            "cmd_name": "relays_list_resp",
            "array": [{"act_id": 7, "name": "Pump", "status": 0}]
        })),
    )
    .await;
    mount(
        server,
        "status_update_req",
        data_reply(json!({"cmd_name": "status_update_resp", "result": []}))
            .set_delay(Duration::from_millis(100)),
    )
    .await;
}

async fn next_event(
    rx: &mut tokio::sync::broadcast::Receiver<std::sync::Arc<GatewayEvent>>,
    wanted: fn(&GatewayEvent) -> bool,
) -> GatewayEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = rx.recv().await.unwrap();
            if wanted(&event) {
                return (*event).clone();
            }
        }
    })
    .await
    .unwrap()
}

// ── Lifecycle tests ─────────────────────────────────────────────────

#[tokio::test]
async fn test_start_publishes_snapshot() {
    let (server, gateway, manager) = setup().await;
    mount_plant(&server).await;

    assert_eq!(*gateway.connection_state().borrow(), ConnectionState::Disconnected);
    gateway.start(manager).await.unwrap();
    assert_eq!(*gateway.connection_state().borrow(), ConnectionState::Connected);

    let devices = gateway.devices_snapshot();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].name(), Some("Pump"));

    gateway.disconnect().await;
    assert_eq!(*gateway.connection_state().borrow(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_failed_start_reports_failure() {
    let (server, gateway, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path("/domo/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sl_data_ack_reason": 1})))
        .mount(&server)
        .await;

    let err = gateway.start(manager).await.unwrap_err();
    assert_eq!(err.errno(), Some(1));
    assert_eq!(*gateway.connection_state().borrow(), ConnectionState::Failed);
}

#[tokio::test]
async fn test_status_delta_emits_update() {
    let (server, gateway, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path("/domo/"))
        .and(body_string_contains("status_update_req"))
        .respond_with(data_reply(json!({
            "cmd_name": "status_update_resp",
            "result": [{"cmd_name": "relay_update_ind", "act_id": 7, "name": "Pump", "status": 1}]
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_plant(&server).await;

    gateway.start(manager).await.unwrap();
    let mut events = gateway.events();

    let event = next_event(&mut events, |e| matches!(e, GatewayEvent::DevicesUpdated)).await;
    assert_eq!(event, GatewayEvent::DevicesUpdated);

    let devices = gateway.devices_snapshot();
    assert!(devices[0].as_relay().unwrap().is_on());

    gateway.disconnect().await;
}

// ── Command tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_execute_routes_through_task() {
    let (server, gateway, manager) = setup().await;
    mount_plant(&server).await;

    Mock::given(method("POST"))
        .and(path("/domo/"))
        .and(body_string_contains("relay_activation_req"))
        .respond_with(data_reply(json!({"cmd_name": "generic_reply"})))
        .expect(1)
        .mount(&server)
        .await;

    gateway.start(manager).await.unwrap();
    let unique_id = gateway.devices_snapshot()[0].unique_id();

    let result = gateway
        .execute(GatewayCommand::Device {
            unique_id,
            command: DeviceCommand::RelaySwitch(Some(RelayState::On)),
        })
        .await
        .unwrap();
    assert!(matches!(result, CommandResult::Ok));

    let result = gateway.execute(GatewayCommand::Topology).await.unwrap();
    assert!(matches!(result, CommandResult::Topology { ref floors, .. } if floors.is_empty()));

    gateway.disconnect().await;
}

#[tokio::test]
async fn test_pull_devices_reports_nothing_new() {
    let (server, gateway, manager) = setup().await;
    mount_plant(&server).await;

    gateway.start(manager).await.unwrap();
    let result = gateway.execute(GatewayCommand::PullDevices).await.unwrap();
    match result {
        CommandResult::Devices {
            discovered,
            removed,
        } => {
            assert!(discovered.is_empty());
            assert!(removed.is_empty());
        }
        other => panic!("expected Devices, got: {other:?}"),
    }

    gateway.disconnect().await;
}

#[tokio::test]
async fn test_execute_after_disconnect_fails() {
    let (server, gateway, manager) = setup().await;
    mount_plant(&server).await;

    gateway.start(manager).await.unwrap();
    gateway.disconnect().await;

    let result = gateway.execute(GatewayCommand::PullDevices).await;
    assert!(
        matches!(result, Err(CoreError::GatewayDisconnected)),
        "expected GatewayDisconnected, got: {result:?}"
    );
}

#[tokio::test]
async fn test_execute_without_state_subscriber() {
    let (server, gateway, manager) = setup().await;
    mount_plant(&server).await;

    gateway.start(manager).await.unwrap();
    assert_eq!(gateway.state(), ConnectionState::Connected);

    let result = gateway.execute(GatewayCommand::Topology).await.unwrap();
    assert!(matches!(result, CommandResult::Topology { .. }));

    gateway.disconnect().await;
    assert_eq!(gateway.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_command_during_batch_keeps_deltas() {
    let (server, gateway, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path("/domo/"))
        .and(body_string_contains("status_update_req"))
        .respond_with(data_reply(json!({
            "cmd_name": "status_update_resp",
            "result": [
                {"cmd_name": "scenario_user_ind", "action": "add"},
                {"cmd_name": "relay_update_ind", "act_id": 7, "name": "Pump", "status": 1}
            ]
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount(
        &server,
        "scenarios_list_req",
        data_reply(json!({"cmd_name": "scenarios_list_resp", "array": []}))
            .set_delay(Duration::from_millis(800)),
    )
    .await;
    mount_plant(&server).await;

    gateway.start(manager).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    gateway.execute(GatewayCommand::Topology).await.unwrap();

    let mut devices = gateway.devices();
    tokio::time::timeout(
        Duration::from_secs(5),
        devices.wait_for(|d| d[0].as_relay().unwrap().is_on()),
    )
    .await
    .unwrap()
    .unwrap();

    gateway.disconnect().await;
}

// ── Recovery and discovery tests ────────────────────────────────────

async fn wait_for_state(
    gateway: &Gateway,
    wanted: fn(&ConnectionState) -> bool,
) -> ConnectionState {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let state = gateway.state();
            if wanted(&state) {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_failed_polls_go_offline_then_recover() {
    let (server, gateway, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path("/domo/"))
        .and(body_string_contains("status_update_req"))
        .respond_with(ResponseTemplate::new(502).set_delay(Duration::from_millis(20)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_plant(&server).await;

    gateway.start(manager).await.unwrap();

    let offline = wait_for_state(&gateway, |s| matches!(s, ConnectionState::Offline { .. })).await;
    assert_eq!(offline, ConnectionState::Offline { attempt: 1 });

    wait_for_state(&gateway, |s| *s == ConnectionState::Connected).await;
    assert_eq!(gateway.devices_snapshot().len(), 1);

    gateway.disconnect().await;
}

#[tokio::test]
async fn test_user_scenario_refresh_is_forwarded() {
    let (server, gateway, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path("/domo/"))
        .and(body_string_contains("status_update_req"))
        .respond_with(data_reply(json!({
            "cmd_name": "status_update_resp",
            "result": [{"cmd_name": "scenario_user_ind", "action": "add"}]
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount(
        &server,
        "scenarios_list_req",
        data_reply(json!({
            "cmd_name": "scenarios_list_resp",
            "array": [{"id": 3, "name": "Away", "scenario_status": 0, "user_defined": 1}]
        })),
    )
    .await;
    mount_plant(&server).await;

    let mut events = gateway.events();
    gateway.start(manager).await.unwrap();

    let event = next_event(&mut events, |e| matches!(e, GatewayEvent::Scenario(_))).await;
    assert_eq!(
        event,
        GatewayEvent::Scenario(ScenarioEvent::Refreshed { count: 1 })
    );

    gateway.disconnect().await;
}

async fn mount_relays_once_then(server: &MockServer, later: Value) {
    Mock::given(method("POST"))
        .and(path("/domo/"))
        .and(body_string_contains("relays_list_req"))
        .respond_with(data_reply(json!({
            "cmd_name": "relays_list_resp",
            "array": [{"act_id": 7, "name": "Pump", "status": 0}]
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/domo/"))
        .and(body_string_contains("relays_list_req"))
        .respond_with(data_reply(json!({
            "cmd_name": "relays_list_resp",
            "array": later
        })))
        .with_priority(2)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_pull_devices_announces_new_device() {
    let (server, gateway, manager) = setup().await;
    mount_relays_once_then(
        &server,
        json!([
            {"act_id": 7, "name": "Pump", "status": 0},
            {"act_id": 8, "name": "Fountain", "status": 0}
        ]),
    )
    .await;
    mount_plant(&server).await;

    gateway.start(manager).await.unwrap();
    let mut events = gateway.events();

    let result = gateway.execute(GatewayCommand::PullDevices).await.unwrap();
    let discovered = match result {
        CommandResult::Devices {
            discovered,
            removed,
        } => {
            assert!(removed.is_empty());
            discovered
        }
        other => panic!("expected Devices, got: {other:?}"),
    };
    assert_eq!(discovered.len(), 1);

    let event = next_event(&mut events, |e| matches!(e, GatewayEvent::DevicesDiscovered(_))).await;
    assert_eq!(event, GatewayEvent::DevicesDiscovered(discovered));
    assert_eq!(gateway.devices_snapshot().len(), 2);

    gateway.disconnect().await;
}

#[tokio::test]
async fn test_plant_update_announces_removed_device() {
    let (server, gateway, manager) = setup().await;
    mount_relays_once_then(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/domo/"))
        .and(body_string_contains("status_update_req"))
        .respond_with(data_reply(json!({
            "cmd_name": "status_update_resp",
            "result": [{"cmd_name": "plant_update_ind"}]
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_plant(&server).await;

    let mut events = gateway.events();
    gateway.start(manager).await.unwrap();

    let GatewayEvent::DevicesDiscovered(initial) =
        next_event(&mut events, |e| matches!(e, GatewayEvent::DevicesDiscovered(_))).await
    else {
        unreachable!()
    };
    let removed = next_event(&mut events, |e| matches!(e, GatewayEvent::DeviceRemoved(_))).await;
    assert_eq!(removed, GatewayEvent::DeviceRemoved(initial[0].clone()));
    assert!(gateway.devices_snapshot().is_empty());

    gateway.disconnect().await;
}
