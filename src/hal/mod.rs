//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `file`: File-backed configuration storage (requires `std` feature)
//! - `esp32`: ESP32 relay board with NVS, WiFi and MQTT (requires `esp32` feature)

pub mod mock;

#[cfg(feature = "std")]
pub mod file;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;

#[cfg(feature = "std")]
pub use file::FileStorage;

#[cfg(feature = "esp32")]
pub use esp32::*;
