//! Network abstraction traits for WiFi, MQTT and the configuration portal.
//!
//! This module defines the seams between the platform-independent state
//! machines and the platform network stacks.
//!
//! # Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`WifiDriver`] | Station association, fallback access point, mDNS |
//! | [`MqttClient`] | Broker connect, pub/sub, inbound polling |
//!
//! # MQTT Topic
//!
//! The device uses a single topic for commands and state:
//!
//! ```text
//! /<client id><suffix>   e.g. /ESP_Relay/Relay
//!   inbound:  "0" = off, "1" = on, anything else = query
//!   outbound: "0" / "1"
//! ```
//!
//! # Portal Routes
//!
//! ```text
//! GET /status             - Device status (JSON)
//! GET /switch?on=true     - Switch relay
//! GET /store?ssid=...     - Save configuration fields
//! GET /reboot             - Restart the device
//! ```

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;
use core::net::Ipv4Addr;

// ============================================================================
// WiFi Driver Trait
// ============================================================================

/// A service advertised over mDNS.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceAdvert {
    /// Service type without leading underscore, e.g. `"http"`.
    pub service: &'static str,
    /// Protocol without leading underscore, e.g. `"tcp"`.
    pub proto: &'static str,
    /// Port the service listens on.
    pub port: u16,
}

/// The configuration portal as advertised on the local network.
pub const PORTAL_SERVICE: ServiceAdvert = ServiceAdvert {
    service: "http",
    proto: "tcp",
    port: 80,
};

/// WiFi driver trait.
///
/// All methods must return promptly. Association progress is observed by
/// polling [`is_link_up`](Self::is_link_up) from the scheduler, never by
/// blocking inside the driver.
pub trait WifiDriver {
    /// Error type for WiFi operations.
    type Error: core::fmt::Debug;

    /// Switch to station mode and start associating with `ssid`.
    fn begin_station(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error>;

    /// Returns true once the station is associated and has an IP address.
    fn is_link_up(&self) -> bool;

    /// Switch to access-point mode broadcasting `ssid`.
    fn start_access_point(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error>;

    /// Register `hostname` on mDNS and advertise `service`.
    fn advertise(&mut self, hostname: &str, service: &ServiceAdvert) -> Result<(), Self::Error>;

    /// Current IP address of the active interface, if any.
    fn ip_addr(&self) -> Option<Ipv4Addr>;
}

// ============================================================================
// MQTT Client Trait (Sync-First Design)
// ============================================================================

/// Broker credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Credentials<'a> {
    /// User name
    pub user: &'a str,
    /// Password
    pub password: &'a str,
}

/// Parameters of one broker connect attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectOptions<'a> {
    /// Broker hostname or IP
    pub server: &'a str,
    /// Broker port
    pub port: u16,
    /// Client id
    pub client_id: &'a str,
    /// Credentials, `None` for anonymous connect
    pub credentials: Option<Credentials<'a>>,
}

/// MQTT client trait for pub/sub messaging.
///
/// This trait uses a **sync-first design** that works on both ESP32 (blocking I/O)
/// and desktop (rumqttc's blocking client).
///
/// # Implementation Notes
///
/// - `connect` starts a new session, replacing any previous one; it may
///   return before the broker acknowledged, in which case `is_connected`
///   turns true later
/// - `try_recv` is non-blocking and also drives outbound traffic for
///   clients that need polling
/// - Reconnection policy belongs to the caller, see
///   [`MessagingSession`](crate::messaging::MessagingSession)
///
/// # Example
///
/// ```rust,ignore
/// use esp_relay::traits::MqttClient;
///
/// fn publish_state<M: MqttClient>(client: &mut M, on: bool) {
///     let payload: &[u8] = if on { b"1" } else { b"0" };
///     client.publish("/ESP_Relay/Relay", payload, false).unwrap();
/// }
/// ```
pub trait MqttClient {
    /// Error type for MQTT operations.
    type Error: core::fmt::Debug;

    /// Open a broker session.
    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), Self::Error>;

    /// Publish a message to a topic.
    ///
    /// # Arguments
    /// - `topic`: MQTT topic path
    /// - `payload`: Message bytes
    /// - `retain`: If true, broker keeps message for new subscribers
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Subscribe to a topic.
    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Try to receive the next message (non-blocking).
    ///
    /// Returns `None` if no message is available. This should never block.
    fn try_recv(&mut self) -> Option<MqttMessage>;

    /// Check if connected to broker.
    fn is_connected(&self) -> bool;
}

/// An MQTT message received from a subscription.
///
/// Contains the topic and payload of a published message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MqttMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Message payload as raw bytes.
    pub payload: Vec<u8>,
}

impl MqttMessage {
    /// Create a new MQTT message.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP request methods accepted by the portal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// HTTP GET request.
    Get,
    /// HTTP POST request.
    Post,
}

/// An HTTP request received by the portal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method (GET, POST).
    pub method: HttpMethod,
    /// Request path without query (e.g., "/switch").
    pub path: String,
    /// Raw query string without the leading `?`, if present.
    pub query: Option<String>,
}

impl HttpRequest {
    /// Split a request URI such as `/switch?on=true` into path and query.
    pub fn from_uri(method: HttpMethod, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(String::from(query))),
            None => (uri, None),
        };
        Self {
            method,
            path: String::from(path),
            query,
        }
    }

    /// Returns the query string, or an empty string if none.
    pub fn query_str(&self) -> &str {
        self.query.as_deref().unwrap_or("")
    }
}

/// An HTTP response to send to the client.
///
/// Helper methods are provided for common response types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status: u16,
    /// Content-Type header value.
    pub content_type: &'static str,
    /// Response body as bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a 200 OK response with JSON content.
    pub fn ok_json(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    /// Creates an error response with the given status code.
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: alloc::format!(r#"{{"error":"{}"}}"#, message).into_bytes(),
        }
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::error(404, "not found")
    }

    /// Creates a 400 Bad Request response.
    pub fn bad_request(message: &str) -> Self {
        Self::error(400, message)
    }
}
