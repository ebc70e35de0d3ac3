//! Persistent device configuration.
//!
//! Uses `heapless::String` for `no_std` compatibility. Every text field has the
//! same fixed capacity as its slot in the persisted record (see [`crate::store`]),
//! so a value that fits in memory always fits on flash.
//!
//! # Example
//!
//! ```rust
//! use esp_relay::config::DeviceConfig;
//!
//! let config = DeviceConfig::default()
//!     .with_wifi("HomeNetwork", "secret123")
//!     .with_mqtt_server("192.168.1.10", 1883);
//!
//! assert!(config.has_station_credentials());
//! assert!(config.messaging_enabled());
//! assert_eq!(config.control_topic().as_str(), "/ESP_Relay/Relay");
//! ```

use heapless::String as HString;

/// Maximum length in bytes of every text field.
pub const MAX_FIELD_LEN: usize = 32;

/// Maximum length of a control topic: `'/'` plus client id plus suffix.
pub const MAX_TOPIC_LEN: usize = 1 + 2 * MAX_FIELD_LEN;

/// Bounded text field of the configuration record.
pub type FieldString = HString<MAX_FIELD_LEN>;

/// Control/status topic string.
pub type TopicString = HString<MAX_TOPIC_LEN>;

/// Default broker client id.
pub const DEFAULT_CLIENT_ID: &str = "ESP_Relay";

/// Default topic suffix appended to the client id.
pub const DEFAULT_TOPIC_SUFFIX: &str = "/Relay";

/// Default broker port.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Default relay GPIO.
pub const DEFAULT_RELAY_PIN: u8 = 5;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a FieldString from a &str, truncating if too long.
///
/// Truncation stops at the last character boundary that fits, so the result
/// is always valid UTF-8.
pub fn field_string(s: &str) -> FieldString {
    let mut hs = FieldString::new();
    let take = s.len().min(MAX_FIELD_LEN);
    let valid_end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= take)
        .last()
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Device Config
// ============================================================================

/// Complete persisted configuration of the relay device.
///
/// Empty strings carry meaning:
/// - empty `ssid`: no station credentials, go straight to the fallback access point
/// - empty `mqtt_server`: messaging disabled
/// - empty `mqtt_user`: anonymous broker connect
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// WiFi network to join in station mode
    pub ssid: FieldString,
    /// WiFi password
    pub password: FieldString,
    /// mDNS host name (without `.local`)
    pub mdns_domain: FieldString,
    /// Broker hostname or IP
    pub mqtt_server: FieldString,
    /// Broker port
    pub mqtt_port: u16,
    /// Broker user name (empty = no auth)
    pub mqtt_user: FieldString,
    /// Broker password
    pub mqtt_password: FieldString,
    /// Broker client id, also the first topic segment
    pub mqtt_client_id: FieldString,
    /// Suffix appended to `/<client id>` to form the control topic
    pub mqtt_topic_suffix: FieldString,
    /// GPIO number driving the relay
    pub relay_pin: u8,
    /// True if a high output level switches the relay on
    pub relay_active_high: bool,
    /// Logical relay state applied at power-up
    pub relay_on_boot: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            ssid: FieldString::new(),
            password: FieldString::new(),
            mdns_domain: FieldString::new(),
            mqtt_server: FieldString::new(),
            mqtt_port: DEFAULT_MQTT_PORT,
            mqtt_user: FieldString::new(),
            mqtt_password: FieldString::new(),
            mqtt_client_id: field_string(DEFAULT_CLIENT_ID),
            mqtt_topic_suffix: field_string(DEFAULT_TOPIC_SUFFIX),
            relay_pin: DEFAULT_RELAY_PIN,
            relay_active_high: false,
            relay_on_boot: false,
        }
    }
}

impl DeviceConfig {
    /// Set station credentials
    pub fn with_wifi(mut self, ssid: &str, password: &str) -> Self {
        self.ssid = field_string(ssid);
        self.password = field_string(password);
        self
    }

    /// Set the mDNS host name
    pub fn with_mdns_domain(mut self, domain: &str) -> Self {
        self.mdns_domain = field_string(domain);
        self
    }

    /// Set the broker address
    pub fn with_mqtt_server(mut self, server: &str, port: u16) -> Self {
        self.mqtt_server = field_string(server);
        self.mqtt_port = port;
        self
    }

    /// Set broker authentication credentials
    pub fn with_mqtt_auth(mut self, user: &str, password: &str) -> Self {
        self.mqtt_user = field_string(user);
        self.mqtt_password = field_string(password);
        self
    }

    /// Set the broker client id
    pub fn with_client_id(mut self, id: &str) -> Self {
        self.mqtt_client_id = field_string(id);
        self
    }

    /// Set the topic suffix
    pub fn with_topic_suffix(mut self, suffix: &str) -> Self {
        self.mqtt_topic_suffix = field_string(suffix);
        self
    }

    /// Set the relay GPIO and which level means "on"
    pub fn with_relay(mut self, pin: u8, active_high: bool) -> Self {
        self.relay_pin = pin;
        self.relay_active_high = active_high;
        self
    }

    /// Set the logical relay state applied at power-up
    pub fn with_relay_on_boot(mut self, on: bool) -> Self {
        self.relay_on_boot = on;
        self
    }

    /// Check if station credentials are configured
    pub fn has_station_credentials(&self) -> bool {
        !self.ssid.is_empty()
    }

    /// Check if a broker is configured
    pub fn messaging_enabled(&self) -> bool {
        !self.mqtt_server.is_empty()
    }

    /// Check if broker authentication is configured
    pub fn has_auth(&self) -> bool {
        !self.mqtt_user.is_empty()
    }

    /// Build the control/status topic: `"/" + client_id + topic_suffix`
    pub fn control_topic(&self) -> TopicString {
        let mut topic = TopicString::new();
        let _ = topic.push('/');
        let _ = topic.push_str(self.mqtt_client_id.as_str());
        let _ = topic.push_str(self.mqtt_topic_suffix.as_str());
        topic
    }
}

// ============================================================================
// Tests
// ============================================================================
