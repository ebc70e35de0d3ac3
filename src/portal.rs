//! Configuration portal boundary.
//!
//! The portal is the HTTP surface used to inspect the device, switch the
//! relay and store new settings. This module holds everything about it that
//! does not depend on an HTTP server: query parsing into a typed
//! [`ConfigUpdate`], routing into a [`PortalRequest`], and the
//! [`PortalReply`] a device returns. Replies are serialized by the server
//! through the types in `messages`.
//!
//! # Routes
//!
//! | Route | Request |
//! |-------|---------|
//! | `/`, `/status` | [`PortalRequest::Status`] |
//! | `/switch?on=true` | [`PortalRequest::Switch`] |
//! | `/store?ssid=...&port=...` | [`PortalRequest::Store`] |
//! | `/reboot` | [`PortalRequest::Reboot`] |
//!
//! # Store Arguments
//!
//! `ssid`, `password`, `domain`, `server`, `port`, `user`, `mqttpswd`,
//! `client`, `topic`, `gpio`, `level`, `onboot`, `reboot`. Every argument is
//! optional; omitted fields keep their stored value.
//!
//! # Example
//!
//! ```rust
//! use esp_relay::portal::{ConfigUpdate, PortalRequest};
//! use esp_relay::traits::{HttpMethod, HttpRequest};
//!
//! let req = HttpRequest::from_uri(HttpMethod::Get, "/store?ssid=Home+Net&port=8883&reboot=1");
//! let PortalRequest::Store(update) = PortalRequest::parse(&req).unwrap() else {
//!     panic!("expected store");
//! };
//! assert_eq!(update.ssid.as_deref(), Some("Home Net"));
//! assert_eq!(update.mqtt_port, Some(8883));
//! assert!(update.reboot);
//! ```

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, warn};

use crate::config::{field_string, DeviceConfig};
use crate::device::DeviceStatus;
use crate::relay::SwitchOutcome;
use crate::traits::{HttpRequest, HttpResponse};

// ============================================================================
// Query Decoding
// ============================================================================

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode one `application/x-www-form-urlencoded` component.
///
/// `+` becomes a space and `%XX` the byte it encodes. A `%` not followed by
/// two hex digits is kept literally. Invalid UTF-8 is replaced.
pub fn form_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Split a query string into decoded `(name, value)` pairs.
pub fn query_pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((name, value)) => (form_decode(name), form_decode(value)),
            None => (form_decode(part), String::new()),
        })
}

/// Parse a flag argument: `1`/`true`/`on` or `0`/`false`/`off`.
///
/// Other integers count as true when non-zero.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "on" => Some(true),
        "false" | "off" => Some(false),
        other => other.parse::<i32>().ok().map(|n| n != 0),
    }
}

// ============================================================================
// Config Update
// ============================================================================

/// Partial configuration update submitted through the portal.
///
/// `None` leaves the stored value unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    /// `ssid`
    pub ssid: Option<String>,
    /// `password`
    pub password: Option<String>,
    /// `domain`
    pub mdns_domain: Option<String>,
    /// `server`
    pub mqtt_server: Option<String>,
    /// `port`
    pub mqtt_port: Option<u16>,
    /// `user`
    pub mqtt_user: Option<String>,
    /// `mqttpswd`
    pub mqtt_password: Option<String>,
    /// `client`
    pub mqtt_client_id: Option<String>,
    /// `topic`
    pub mqtt_topic_suffix: Option<String>,
    /// `gpio`
    pub relay_pin: Option<u8>,
    /// `level`
    pub relay_active_high: Option<bool>,
    /// `onboot`
    pub relay_on_boot: Option<bool>,
    /// `reboot`: restart after storing
    pub reboot: bool,
}

impl ConfigUpdate {
    /// Build an update from a raw query string.
    ///
    /// Unknown arguments are ignored. A number or flag that does not parse
    /// is ignored too, keeping the stored value.
    pub fn from_query(query: &str) -> Self {
        let mut update = Self::default();
        for (name, value) in query_pairs(query) {
            match name.as_str() {
                "ssid" => update.ssid = Some(value),
                "password" => update.password = Some(value),
                "domain" => update.mdns_domain = Some(value),
                "server" => update.mqtt_server = Some(value),
                "port" => update.mqtt_port = parse_number(&name, &value),
                "user" => update.mqtt_user = Some(value),
                "mqttpswd" => update.mqtt_password = Some(value),
                "client" => update.mqtt_client_id = Some(value),
                "topic" => update.mqtt_topic_suffix = Some(value),
                "gpio" => update.relay_pin = parse_number(&name, &value),
                "level" => update.relay_active_high = parse_flag_arg(&name, &value),
                "onboot" => update.relay_on_boot = parse_flag_arg(&name, &value),
                "reboot" => update.reboot = parse_flag(&value).unwrap_or(false),
                _ => debug!("[Portal] Ignoring argument '{}'", name),
            }
        }
        update
    }

}

fn parse_number<T: core::str::FromStr>(name: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        warn!("[Portal] Ignoring invalid {}='{}'", name, value);
    }
    parsed
}

fn parse_flag_arg(name: &str, value: &str) -> Option<bool> {
    let parsed = parse_flag(value);
    if parsed.is_none() {
        warn!("[Portal] Ignoring invalid {}='{}'", name, value);
    }
    parsed
}

impl DeviceConfig {
    /// Overwrite the fields present in `update`.
    pub fn apply(&mut self, update: &ConfigUpdate) {
        fn text(slot: &mut crate::config::FieldString, value: &Option<String>) {
            if let Some(v) = value {
                *slot = field_string(v);
            }
        }

        text(&mut self.ssid, &update.ssid);
        text(&mut self.password, &update.password);
        text(&mut self.mdns_domain, &update.mdns_domain);
        text(&mut self.mqtt_server, &update.mqtt_server);
        text(&mut self.mqtt_user, &update.mqtt_user);
        text(&mut self.mqtt_password, &update.mqtt_password);
        text(&mut self.mqtt_client_id, &update.mqtt_client_id);
        text(&mut self.mqtt_topic_suffix, &update.mqtt_topic_suffix);
        if let Some(port) = update.mqtt_port {
            self.mqtt_port = port;
        }
        if let Some(pin) = update.relay_pin {
            self.relay_pin = pin;
        }
        if let Some(active_high) = update.relay_active_high {
            self.relay_active_high = active_high;
        }
        if let Some(on_boot) = update.relay_on_boot {
            self.relay_on_boot = on_boot;
        }
    }
}

// ============================================================================
// Routing
// ============================================================================

/// A request to the portal, decoded from its route and query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortalRequest {
    /// Report device status.
    Status,
    /// Switch the relay.
    Switch(bool),
    /// Store configuration fields.
    Store(ConfigUpdate),
    /// Restart the device.
    Reboot,
}

impl PortalRequest {
    /// Route an HTTP request.
    ///
    /// Returns the error response to send when the route is unknown or its
    /// arguments are unusable.
    pub fn parse(req: &HttpRequest) -> Result<Self, HttpResponse> {
        match req.path.as_str() {
            "/" | "/status" => Ok(PortalRequest::Status),
            "/switch" => {
                let on = query_pairs(req.query_str())
                    .find(|(name, _)| name == "on")
                    .map(|(_, value)| value);
                match on.as_deref() {
                    Some("true") | Some("1") => Ok(PortalRequest::Switch(true)),
                    Some("false") | Some("0") => Ok(PortalRequest::Switch(false)),
                    Some(_) => Err(HttpResponse::bad_request("on must be true or false")),
                    None => Err(HttpResponse::bad_request("missing on")),
                }
            }
            "/store" => Ok(PortalRequest::Store(ConfigUpdate::from_query(
                req.query_str(),
            ))),
            "/reboot" => Ok(PortalRequest::Reboot),
            _ => Err(HttpResponse::not_found()),
        }
    }
}

/// Outcome of a handled [`PortalRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortalReply {
    /// Current status.
    Status(DeviceStatus),
    /// Relay switch result.
    Switched {
        /// Logical relay state after the request
        on: bool,
        /// Whether the pin changed
        changed: bool,
    },
    /// Configuration saved.
    Stored {
        /// Restart requested with the update
        reboot: bool,
    },
    /// Restart scheduled.
    Rebooting,
}

impl PortalReply {
    /// Build the reply for a relay switch.
    pub fn switched(on: bool, outcome: SwitchOutcome) -> Self {
        PortalReply::Switched {
            on,
            changed: outcome.changed(),
        }
    }

    /// True if the device should restart after sending this reply.
    pub fn requests_restart(&self) -> bool {
        matches!(
            self,
            PortalReply::Rebooting | PortalReply::Stored { reboot: true }
        )
    }
}
