//! Shared message types for the HTTP portal.
//!
//! These types are `no_std` compatible and can be serialized using either
//! `serde_json` (desktop) or `serde-json-core` (embedded).
//!
//! # Example
//!
//! ```
//! use esp_relay::device::DeviceStatus;
//! use esp_relay::messages::StatusResponse;
//!
//! let status = StatusResponse::from(&DeviceStatus::default());
//! assert_eq!(status.wifi.as_str(), "off");
//! assert!(!status.relay);
//! ```

use core::fmt::Write;

use heapless::String as HString;
use serde::{Deserialize, Serialize};

use crate::device::DeviceStatus;
use crate::portal::PortalReply;

/// Short text label (mode names, dotted IPv4 address).
pub type Label = HString<16>;

fn label(s: &str) -> Label {
    let mut out = Label::new();
    let _ = out.push_str(s);
    out
}

// ============================================================================
// Response Types
// ============================================================================

/// Device status as reported by `GET /status`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// WiFi mode label
    pub wifi: Label,
    /// Broker session label
    pub mqtt: Label,
    /// Logical relay state
    pub relay: bool,
    /// Seconds since boot
    pub uptime: u64,
    /// Stored configuration found at boot
    pub initialized: bool,
    /// Saved configuration waits for a restart
    pub restart_pending: bool,
    /// Station or access point address
    pub ip: Option<Label>,
}

impl From<&DeviceStatus> for StatusResponse {
    fn from(status: &DeviceStatus) -> Self {
        let ip = status.ip.map(|ip| {
            let mut out = Label::new();
            let _ = write!(out, "{}", ip);
            out
        });
        Self {
            wifi: label(status.wifi_mode.as_str()),
            mqtt: label(status.session.as_str()),
            relay: status.relay_on,
            uptime: status.uptime_secs,
            initialized: status.initialized,
            restart_pending: status.restart_pending,
            ip,
        }
    }
}

/// Reply to `GET /switch`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchResponse {
    /// Logical relay state after the request
    pub relay: bool,
    /// Whether the relay changed state
    pub changed: bool,
}

/// Reply to `GET /store`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreResponse {
    /// Always true on success
    pub stored: bool,
    /// The device restarts to apply the configuration
    pub reboot: bool,
}

/// Any portal reply in serializable form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyBody {
    /// `/status`
    Status(StatusResponse),
    /// `/switch`
    Switch(SwitchResponse),
    /// `/store`
    Store(StoreResponse),
    /// `/reboot`
    Reboot {
        /// Always true
        rebooting: bool,
    },
}

impl From<&PortalReply> for ReplyBody {
    fn from(reply: &PortalReply) -> Self {
        match reply {
            PortalReply::Status(status) => ReplyBody::Status(status.into()),
            PortalReply::Switched { on, changed } => ReplyBody::Switch(SwitchResponse {
                relay: *on,
                changed: *changed,
            }),
            PortalReply::Stored { reboot } => ReplyBody::Store(StoreResponse {
                stored: true,
                reboot: *reboot,
            }),
            PortalReply::Rebooting => ReplyBody::Reboot { rebooting: true },
        }
    }
}

// ============================================================================
// Serialization (using serde-json-core for no_std compatibility)
// ============================================================================

/// Maximum encoded size of a status response.
pub const STATUS_JSON_LEN: usize = 192;

/// Serialize a status snapshot to a fixed-capacity JSON string.
///
/// # Example
///
/// ```
/// use esp_relay::device::DeviceStatus;
/// use esp_relay::messages::status_json;
///
/// let json = status_json(&DeviceStatus::default()).unwrap();
/// assert!(json.starts_with(r#"{"wifi":"off""#));
/// ```
#[cfg(feature = "serde-json-core")]
pub fn status_json(status: &DeviceStatus) -> Option<HString<STATUS_JSON_LEN>> {
    serde_json_core::to_string(&StatusResponse::from(status)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::WifiMode;
    use crate::messaging::SessionState;
    use core::net::Ipv4Addr;

    fn sample_status() -> DeviceStatus {
        DeviceStatus {
            wifi_mode: WifiMode::AccessPointFallback,
            session: SessionState::Disabled,
            relay_on: true,
            uptime_secs: 7,
            initialized: false,
            restart_pending: true,
            ip: Some(Ipv4Addr::new(192, 168, 4, 1)),
        }
    }

    // =========================================================================
    // StatusResponse tests
    // =========================================================================

    #[test]
    fn status_from_device() {
        let resp = StatusResponse::from(&sample_status());
        assert_eq!(resp.wifi.as_str(), "access_point");
        assert_eq!(resp.mqtt.as_str(), "disabled");
        assert!(resp.relay);
        assert_eq!(resp.uptime, 7);
        assert!(resp.restart_pending);
        assert_eq!(resp.ip.as_deref(), Some("192.168.4.1"));
    }

    #[test]
    fn longest_address_fits() {
        let mut status = sample_status();
        status.ip = Some(Ipv4Addr::new(255, 255, 255, 255));
        let resp = StatusResponse::from(&status);
        assert_eq!(resp.ip.as_deref(), Some("255.255.255.255"));
    }

    #[cfg(feature = "std")]
    #[test]
    fn status_serde_json() {
        let json = serde_json::to_string(&StatusResponse::from(&sample_status())).unwrap();
        assert!(json.contains(r#""wifi":"access_point""#));
        assert!(json.contains(r#""ip":"192.168.4.1""#));

        let back: StatusResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StatusResponse::from(&sample_status()));
    }

    // =========================================================================
    // ReplyBody tests
    // =========================================================================

    #[cfg(feature = "std")]
    #[test]
    fn reply_bodies_serialize_flat() {
        let switched = ReplyBody::from(&PortalReply::Switched {
            on: true,
            changed: false,
        });
        assert_eq!(
            serde_json::to_string(&switched).unwrap(),
            r#"{"relay":true,"changed":false}"#
        );

        let reboot = ReplyBody::from(&PortalReply::Rebooting);
        assert_eq!(serde_json::to_string(&reboot).unwrap(), r#"{"rebooting":true}"#);
    }

    #[cfg(feature = "serde-json-core")]
    #[test]
    fn status_json_core() {
        let json = status_json(&sample_status()).unwrap();
        assert!(json.contains(r#""relay":true"#));
        assert!(json.contains(r#""restart_pending":true"#));
    }

    #[cfg(feature = "serde-json-core")]
    #[test]
    fn status_json_worst_case_fits() {
        let status = DeviceStatus {
            wifi_mode: WifiMode::AccessPointFallback,
            session: SessionState::Disconnected,
            relay_on: false,
            uptime_secs: u64::MAX,
            initialized: false,
            restart_pending: false,
            ip: Some(Ipv4Addr::new(255, 255, 255, 255)),
        };
        let json = status_json(&status).unwrap();
        assert!(json.len() <= STATUS_JSON_LEN);
        assert!(json.contains(r#""uptime":18446744073709551615"#));
    }
}
