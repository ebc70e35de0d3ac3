//! ESP32 hardware abstraction layer for the relay board.
//!
//! # Hardware Configuration
//!
//! - **MCU**: any ESP32 variant supported by ESP-IDF
//! - **Relay**: single relay module on a GPIO chosen in the configuration
//!   (default GPIO5, active high)
//! - **Storage**: configuration blob in the default NVS partition
//!
//! Network drivers are enabled with the `wifi`, `mdns`, `esp32-http` and
//! `esp32-mqtt` features.

mod clock;
mod relay;
mod storage;

pub use clock::Esp32Clock;
pub use relay::Esp32RelayPin;
pub use storage::{Esp32Storage, NVS_CONFIG_KEY, NVS_NAMESPACE};

#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use wifi::{Esp32Wifi, Esp32WifiError};

#[cfg(feature = "esp32-http")]
mod http;
#[cfg(feature = "esp32-http")]
pub use http::{Esp32HttpServer, Esp32SharedState};

#[cfg(feature = "esp32-mqtt")]
mod mqtt;
#[cfg(feature = "esp32-mqtt")]
pub use mqtt::{Esp32Mqtt, Esp32MqttError};
