//! # esp-relay
//!
//! Firmware core for a network-controllable relay: persistent configuration,
//! WiFi with access-point fallback, MQTT remote control and a small HTTP
//! configuration portal.
//!
//! ## Features
//!
//! - **Persistent configuration**: Fixed binary record with signature check and defaults
//! - **Non-blocking connectivity**: Station mode with a 60 s fallback to a local access point
//! - **MQTT control**: `"0"`/`"1"` commands, state queries, 30 s reconnect gate
//! - **Edge-triggered relay**: State changes are published, repeats are ignored
//! - **Hardware abstraction**: Everything runs on desktop against mocks
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware, storage and network abstractions
//! - `config` / `store` - Configuration record and its binary persistence
//! - `relay` - Relay output with logical/physical level mapping
//! - `connectivity` - WiFi station / access point supervisor
//! - `messaging` - MQTT session with reconnect gating
//! - `device` - Context object running one scheduler pass at a time
//! - `portal` - HTTP portal requests and replies
//! - `indicator` - On-board LED showing association and connect attempts
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use esp_relay::{
//!     hal::{MockMqtt, MockRelayPin, MockStorage, MockWifi},
//!     ConfigStore, DeviceConfig, RelayCommand, RelayDevice,
//! };
//!
//! let mut store = ConfigStore::new(MockStorage::new());
//! store
//!     .save(&DeviceConfig::default()
//!         .with_wifi("HomeNetwork", "secret")
//!         .with_mqtt_server("192.168.1.10", 1883))
//!     .unwrap();
//! let loaded = store.load();
//!
//! let mut device = RelayDevice::start(
//!     store,
//!     loaded,
//!     MockRelayPin::new(),
//!     MockWifi::new().with_network("HomeNetwork"),
//!     MockMqtt::new(),
//!     0,
//! )
//! .unwrap();
//!
//! // Scheduler pass: WiFi associates, broker connects and subscribes
//! device.run_once(10);
//!
//! device.handle_command(RelayCommand::On).unwrap();
//! assert!(device.status(20).relay_on);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Relay command decoding.
pub mod commands;
/// Device configuration record with builders and defaults.
pub mod config;
/// WiFi station / access-point supervisor.
pub mod connectivity;
/// Context object tying all components together.
pub mod device;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Connectivity indicator LED.
pub mod indicator;
/// MQTT session with reconnect gating.
pub mod messaging;
/// HTTP configuration portal requests and replies.
pub mod portal;
/// Relay output controller.
pub mod relay;
/// Fixed-layout binary configuration persistence.
pub mod store;
/// Core traits for hardware, storage and network abstraction.
pub mod traits;

/// Shared message types for the HTTP portal (serde-based).
#[cfg(feature = "serde")]
pub mod messages;

/// Network services for the desktop portal and MQTT (feature-gated).
#[cfg(any(feature = "web", feature = "mqtt"))]
pub mod services;

// Re-exports for convenience
pub use commands::RelayCommand;
pub use config::DeviceConfig;
pub use connectivity::{ConnectivitySupervisor, WifiMode};
pub use device::{DeviceError, DeviceStatus, RelayDevice};
pub use messaging::{MessagingSession, SessionError, SessionState};
pub use portal::{ConfigUpdate, PortalReply, PortalRequest};
pub use relay::{RelayController, SwitchOutcome};
pub use store::ConfigStore;
pub use traits::{
    // Hardware
    Clock,
    // Network
    HttpMethod,
    HttpRequest,
    HttpResponse,
    MqttClient,
    MqttMessage,
    // Storage
    NvStorage,
    RelayPin,
    StatusLed,
    WifiDriver,
};

// Message re-exports (for the HTTP portal)
#[cfg(feature = "serde")]
pub use messages::{ReplyBody, StatusResponse, StoreResponse, SwitchResponse};

#[cfg(feature = "serde-json-core")]
pub use messages::status_json;
