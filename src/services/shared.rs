//! Shared device wrapper for the desktop services.
//!
//! `SharedDevice` provides thread-safe access to a single [`RelayDevice`]
//! that is shared between the control loop thread and the HTTP portal.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use esp_relay::services::SharedDevice;
//!
//! let shared = Arc::new(SharedDevice::new(device));
//!
//! // Control loop thread
//! loop {
//!     shared.run_once();
//!     if shared.restart_requested() {
//!         break;
//!     }
//!     std::thread::sleep(Duration::from_millis(10));
//! }
//!
//! // Portal handlers
//! let reply = shared.handle(PortalRequest::Switch(true));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use log::error;

use crate::device::{DeviceStatus, RelayDevice};
use crate::portal::{PortalReply, PortalRequest};
use crate::traits::{MqttClient, NvStorage, RelayPin, WifiDriver};

// ============================================================================
// Portal Service Trait
// ============================================================================

/// Something that answers portal requests.
///
/// This abstraction lets the HTTP router work with any device wrapper, and
/// lets tests drive the router without a full device.
pub trait PortalService: Send + Sync {
    /// Handle one request. Errors are returned as a message for the client.
    fn handle(&self, request: PortalRequest) -> Result<PortalReply, String>;
}

// ============================================================================
// Shared Device
// ============================================================================

/// A [`RelayDevice`] behind a mutex, with a common time base.
///
/// # Thread Safety
///
/// - Uses `Mutex` for device access; both the control loop and the portal
///   mutate the device.
/// - All timestamps come from the same `start_time`.
pub struct SharedDevice<P, W, C, S>
where
    P: RelayPin,
    W: WifiDriver,
    C: MqttClient,
    S: NvStorage,
{
    device: Mutex<RelayDevice<P, W, C, S>>,
    start_time: Instant,
    restart: AtomicBool,
}

impl<P, W, C, S> SharedDevice<P, W, C, S>
where
    P: RelayPin,
    W: WifiDriver,
    C: MqttClient,
    S: NvStorage,
{
    /// Wrap a started device.
    ///
    /// The device should have been started with `now_ms = 0`; `start_time`
    /// is set to `Instant::now()` and becomes the time base for every
    /// later call.
    pub fn new(device: RelayDevice<P, W, C, S>) -> Self {
        Self {
            device: Mutex::new(device),
            start_time: Instant::now(),
            restart: AtomicBool::new(false),
        }
    }

    /// Milliseconds since this wrapper was created.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Access the device with a mutable lock.
    pub fn with_device<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut RelayDevice<P, W, C, S>) -> R,
    {
        let mut guard = self.device.lock().unwrap();
        f(&mut guard)
    }

    /// One scheduler pass at the current time.
    pub fn run_once(&self) {
        let now_ms = self.now_ms();
        self.with_device(|device| device.run_once(now_ms));
    }

    /// Status snapshot.
    pub fn status(&self) -> DeviceStatus {
        let now_ms = self.now_ms();
        self.with_device(|device| device.status(now_ms))
    }

    /// True once a portal request asked for a restart.
    pub fn restart_requested(&self) -> bool {
        self.restart.load(Ordering::SeqCst)
    }
}

impl<P, W, C, S> PortalService for SharedDevice<P, W, C, S>
where
    P: RelayPin + Send,
    W: WifiDriver + Send,
    C: MqttClient + Send,
    S: NvStorage + Send,
{
    fn handle(&self, request: PortalRequest) -> Result<PortalReply, String> {
        let now_ms = self.now_ms();
        let reply = self
            .with_device(|device| device.handle_portal(request, now_ms))
            .map_err(|e| {
                error!("[Portal] Request failed: {}", e);
                e.to_string()
            })?;
        if reply.requests_restart() {
            self.restart.store(true, Ordering::SeqCst);
        }
        Ok(reply)
    }
}
