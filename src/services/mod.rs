//! Desktop network services: the HTTP portal and the MQTT client.
//!
//! - `web` feature: Axum-based portal server with JSON replies
//! - `mqtt` feature: `rumqttc` implementation of [`MqttClient`](crate::traits::MqttClient)
//!
//! The portal and the control loop share one device through
//! [`SharedDevice`] wrapped in `Arc`:
//!
//! ```ignore
//! use std::sync::Arc;
//! use esp_relay::services::{build_router, SharedDevice, WebServerConfig};
//!
//! let shared = Arc::new(SharedDevice::new(device));
//!
//! // Control loop on its own thread, portal on tokio
//! let router = build_router(Arc::clone(&shared), &WebServerConfig::default());
//! ```

// Shared device (available when either web or mqtt is enabled)
pub mod shared;

#[cfg(feature = "web")]
pub mod api;

#[cfg(feature = "web")]
pub mod web;

#[cfg(feature = "mqtt")]
pub mod mqtt;

// Re-exports
pub use shared::*;

#[cfg(feature = "web")]
pub use api::ApiResponse;

#[cfg(feature = "web")]
pub use web::*;

#[cfg(feature = "mqtt")]
pub use mqtt::*;
