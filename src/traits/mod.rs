//! Trait definitions for hardware, storage, and network abstraction.
//!
//! This module defines the core abstractions that allow esp-relay to:
//! - Run on different hardware (ESP32, desktop mock)
//! - Persist configuration to flash, a file, or memory
//! - Use different WiFi and MQTT implementations
//!
//! # Submodules
//!
//! - `hardware`: Relay output pin, clock, status LED
//! - `storage`: Non-volatile byte region
//! - `network`: WiFi driver, MQTT client, HTTP request/response types
//!
//! # Hardware Abstraction
//!
//! The key traits are:
//!
//! - [`RelayPin`]: Digital output driving the relay
//! - [`Clock`]: Time source for `no_std` environments
//! - [`StatusLed`]: Connectivity indicator
//! - [`NvStorage`]: EEPROM-style persisted byte region
//! - [`WifiDriver`]: Station / access point / mDNS control
//! - [`MqttClient`]: Broker session

pub mod hardware;
pub mod network;
pub mod storage;

pub use hardware::*;
pub use network::*;
pub use storage::*;
