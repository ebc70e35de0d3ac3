//! Integration tests for the HTTP configuration portal.
//!
//! These tests drive the axum router against a device built from mocks.

#![cfg(feature = "web")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use esp_relay::hal::{MockMqtt, MockRelayPin, MockStorage, MockWifi};
use esp_relay::services::{build_router, ApiResponse, SharedDevice, WebServerConfig};
use esp_relay::{ConfigStore, DeviceConfig, RelayDevice, StatusResponse, StoreResponse, SwitchResponse};

type TestDevice = SharedDevice<MockRelayPin, MockWifi, MockMqtt, MockStorage>;

fn create_test_app() -> (axum::Router, Arc<TestDevice>) {
    let device = RelayDevice::start(
        ConfigStore::new(MockStorage::new()),
        (DeviceConfig::default(), false),
        MockRelayPin::new(),
        MockWifi::new(),
        MockMqtt::new(),
        0,
    )
    .unwrap();
    let state = Arc::new(SharedDevice::new(device));
    let router = build_router(Arc::clone(&state), &WebServerConfig::default());
    (router, state)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

// ============================================================================
// Status
// ============================================================================

#[tokio::test]
async fn test_get_status() {
    let (app, _state) = create_test_app();

    let (status, body) = get(app, "/status").await;
    assert_eq!(status, StatusCode::OK);

    let json: ApiResponse<StatusResponse> = serde_json::from_slice(&body).unwrap();
    assert!(json.success);

    let data = json.data.unwrap();
    assert_eq!(data.wifi.as_str(), "access_point");
    assert_eq!(data.mqtt.as_str(), "disabled");
    assert!(!data.relay);
    assert!(!data.initialized);
    assert_eq!(data.ip.as_deref(), Some("192.168.4.1"));
}

#[tokio::test]
async fn test_root_is_status() {
    let (app, _state) = create_test_app();

    let (status, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    let json: ApiResponse<StatusResponse> = serde_json::from_slice(&body).unwrap();
    assert!(json.success);
}

// ============================================================================
// Switch
// ============================================================================

#[tokio::test]
async fn test_switch_on_then_repeat() {
    let (app, state) = create_test_app();

    let (status, body) = get(app.clone(), "/switch?on=true").await;
    assert_eq!(status, StatusCode::OK);
    let json: ApiResponse<SwitchResponse> = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json.data,
        Some(SwitchResponse {
            relay: true,
            changed: true
        })
    );
    assert!(state.status().relay_on);

    // Same state again does not change the pin
    let (_, body) = get(app, "/switch?on=1").await;
    let json: ApiResponse<SwitchResponse> = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json.data,
        Some(SwitchResponse {
            relay: true,
            changed: false
        })
    );
    state.with_device(|device| assert_eq!(device.relay().pin().writes, 1));
}

#[tokio::test]
async fn test_switch_post() {
    let (app, state) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/switch?on=false")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!state.status().relay_on);
}

#[tokio::test]
async fn test_switch_invalid_value() {
    let (app, state) = create_test_app();

    let (status, _) = get(app.clone(), "/switch?on=maybe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(app, "/switch").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(!state.status().relay_on);
}

// ============================================================================
// Store / Reboot
// ============================================================================

#[tokio::test]
async fn test_store_partial_update() {
    let (app, state) = create_test_app();

    let (status, body) = get(app, "/store?ssid=Home%20Net&password=secret&server=broker.local").await;
    assert_eq!(status, StatusCode::OK);

    let json: ApiResponse<StoreResponse> = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json.data,
        Some(StoreResponse {
            stored: true,
            reboot: false
        })
    );

    state.with_device(|device| {
        assert_eq!(device.config().ssid.as_str(), "Home Net");
        assert_eq!(device.config().mqtt_server.as_str(), "broker.local");
        // Untouched fields keep their values
        assert_eq!(device.config().mqtt_client_id.as_str(), "ESP_Relay");
        assert_eq!(device.store().storage().commits, 1);
    });

    let status = state.status();
    assert!(status.initialized);
    assert!(status.restart_pending);
    assert!(!state.restart_requested());
}

#[tokio::test]
async fn test_store_with_reboot_flag() {
    let (app, state) = create_test_app();

    let (status, _) = get(app, "/store?gpio=4&level=0&reboot=1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.restart_requested());
}

#[tokio::test]
async fn test_reboot() {
    let (app, state) = create_test_app();

    let (status, body) = get(app, "/reboot").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["rebooting"], true);
    assert!(state.restart_requested());
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_unknown_route() {
    let (app, _state) = create_test_app();

    let (status, body) = get(app, "/api/state").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let json: ApiResponse<()> = serde_json::from_slice(&body).unwrap();
    assert!(!json.success);
    assert_eq!(json.error.as_deref(), Some("Not found"));
}

#[tokio::test]
async fn test_storage_failure_is_500() {
    let mut storage = MockStorage::new();
    storage.fail_writes = true;
    let device = RelayDevice::start(
        ConfigStore::new(storage),
        (DeviceConfig::default(), false),
        MockRelayPin::new(),
        MockWifi::new(),
        MockMqtt::new(),
        0,
    )
    .unwrap();
    let state = Arc::new(SharedDevice::new(device));
    let app = build_router(Arc::clone(&state), &WebServerConfig::default());

    let (status, body) = get(app, "/store?ssid=Home").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: ApiResponse<()> = serde_json::from_slice(&body).unwrap();
    assert!(!json.success);
    assert!(json.error.unwrap().contains("storage"));
}
