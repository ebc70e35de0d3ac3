//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware and network traits,
//! enabling development and testing on desktop without physical hardware.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockRelayPin`] | [`RelayPin`] | Tracks level, output enable and writes |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MockStatusLed`] | [`StatusLed`] | Records every LED level written |
//! | [`MockStorage`] | [`NvStorage`] | In-memory region with staged commits |
//! | [`MockWifi`] | [`WifiDriver`] | Scriptable association outcome |
//! | [`MockMqtt`] | [`MqttClient`] | Captures connect/pub/sub operations |
//!
//! # Example
//!
//! ```rust
//! use esp_relay::config::DeviceConfig;
//! use esp_relay::hal::MockRelayPin;
//! use esp_relay::relay::RelayController;
//!
//! let config = DeviceConfig::default();
//! let mut relay = RelayController::new(MockRelayPin::new(), &config);
//! relay.initialize(false).unwrap();
//!
//! relay.set_relay(true).unwrap();
//! assert!(relay.current_state());
//! // Active-low by default: "on" drives the pin low
//! assert!(!relay.pin().high);
//! ```
//!
//! [`RelayPin`]: crate::traits::RelayPin
//! [`Clock`]: crate::traits::Clock
//! [`StatusLed`]: crate::traits::StatusLed
//! [`NvStorage`]: crate::traits::NvStorage
//! [`WifiDriver`]: crate::traits::WifiDriver
//! [`MqttClient`]: crate::traits::MqttClient

extern crate alloc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::net::Ipv4Addr;

use crate::traits::{
    Clock, ConnectOptions, MqttClient, MqttMessage, NvStorage, RelayPin, ServiceAdvert,
    StatusLed, WifiDriver,
};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock relay output pin.
///
/// Records the level and how it got there. Use the public fields to
/// inspect state after test operations.
///
/// # Example
///
/// ```rust
/// use esp_relay::hal::MockRelayPin;
/// use esp_relay::traits::RelayPin;
///
/// let mut pin = MockRelayPin::new();
/// pin.configure_output(true).unwrap();
/// pin.set_high(false).unwrap();
///
/// assert!(pin.output_enabled);
/// assert_eq!(pin.level_at_enable, Some(true));
/// assert_eq!(pin.writes, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockRelayPin {
    /// Current output level.
    pub high: bool,
    /// Whether `configure_output` was called.
    pub output_enabled: bool,
    /// Level latched at the moment the output driver was enabled.
    pub level_at_enable: Option<bool>,
    /// Number of `set_high` calls.
    pub writes: usize,
}

impl MockRelayPin {
    /// Creates a new pin, floating low with output disabled.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelayPin for MockRelayPin {
    type Error = ();

    fn configure_output(&mut self, initial_high: bool) -> Result<(), ()> {
        self.high = initial_high;
        self.level_at_enable = Some(self.high);
        self.output_enabled = true;
        Ok(())
    }

    fn set_high(&mut self, high: bool) -> Result<(), ()> {
        self.high = high;
        self.writes += 1;
        Ok(())
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// Mock indicator LED.
#[derive(Debug, Default)]
pub struct MockStatusLed {
    /// Current level.
    pub lit: bool,
    /// Every level written, in order.
    pub history: Vec<bool>,
    /// Make `set_lit` fail.
    pub fail_writes: bool,
}

impl MockStatusLed {
    /// Creates an LED that is off with no history.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusLed for MockStatusLed {
    type Error = ();

    fn set_lit(&mut self, lit: bool) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.lit = lit;
        self.history.push(lit);
        Ok(())
    }
}

/// Mock clock for testing.
///
/// Provides a controllable time source for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use esp_relay::hal::MockClock;
/// use esp_relay::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

// ============================================================================
// Storage Mock
// ============================================================================

/// Size of the simulated EEPROM region.
pub const MOCK_REGION_LEN: usize = 512;

/// Mock non-volatile storage.
///
/// Writes land in `staged` and are copied into `region` on commit, so a
/// test can observe an uncommitted write being lost.
#[derive(Debug)]
pub struct MockStorage {
    /// Durable contents.
    pub region: Vec<u8>,
    /// Pending write, applied on commit.
    pub staged: Option<Vec<u8>>,
    /// Number of successful commits.
    pub commits: usize,
    /// Number of successful writes.
    pub write_count: usize,
    /// Fail every read.
    pub fail_reads: bool,
    /// Fail every write and commit.
    pub fail_writes: bool,
}

impl MockStorage {
    /// A zero-filled region.
    pub fn new() -> Self {
        Self::filled(0)
    }

    /// A region with every byte set to `byte` (`0xFF` for erased flash).
    pub fn filled(byte: u8) -> Self {
        Self {
            region: vec![byte; MOCK_REGION_LEN],
            staged: None,
            commits: 0,
            write_count: 0,
            fail_reads: false,
            fail_writes: false,
        }
    }

    /// A zero-filled region starting with `contents`.
    pub fn with_contents(contents: &[u8]) -> Self {
        let mut storage = Self::new();
        let len = contents.len().min(MOCK_REGION_LEN);
        storage.region[..len].copy_from_slice(&contents[..len]);
        storage
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl NvStorage for MockStorage {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        if self.fail_reads {
            return Err(());
        }
        let len = buf.len().min(self.region.len());
        buf[..len].copy_from_slice(&self.region[..len]);
        Ok(len)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), ()> {
        if self.fail_writes || data.len() > MOCK_REGION_LEN {
            return Err(());
        }
        self.staged = Some(data.to_vec());
        self.write_count += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        if let Some(data) = self.staged.take() {
            self.region[..data.len()].copy_from_slice(&data);
        }
        self.commits += 1;
        Ok(())
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Mock WiFi driver.
///
/// With `reachable` set, `begin_station` brings the link up immediately
/// when `ssid` matches. Tests can also flip `link_up` directly to simulate
/// a late association or a dropped link.
///
/// # Example
///
/// ```rust
/// use esp_relay::hal::MockWifi;
/// use esp_relay::traits::WifiDriver;
///
/// let mut wifi = MockWifi::new().with_network("HomeNetwork");
/// wifi.begin_station("HomeNetwork", "secret").unwrap();
/// assert!(wifi.is_link_up());
/// assert_eq!(wifi.station_attempts, vec!["HomeNetwork".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct MockWifi {
    /// Network that associates instantly, if any.
    pub reachable: Option<String>,
    /// Current link state.
    pub link_up: bool,
    /// SSIDs passed to `begin_station`, in order.
    pub station_attempts: Vec<String>,
    /// `(ssid, password)` of the started access point.
    pub access_point: Option<(String, String)>,
    /// mDNS registrations `(hostname, service)`.
    pub advertised: Vec<(String, ServiceAdvert)>,
    /// Make `begin_station` return an error.
    pub fail_begin: bool,
}

impl MockWifi {
    /// Creates a driver with no reachable networks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `ssid` associate instantly.
    pub fn with_network(mut self, ssid: &str) -> Self {
        self.reachable = Some(ssid.into());
        self
    }
}

impl WifiDriver for MockWifi {
    type Error = ();

    fn begin_station(&mut self, ssid: &str, _password: &str) -> Result<(), ()> {
        self.station_attempts.push(ssid.into());
        if self.fail_begin {
            return Err(());
        }
        self.access_point = None;
        self.link_up = self.reachable.as_deref() == Some(ssid);
        Ok(())
    }

    fn is_link_up(&self) -> bool {
        self.link_up
    }

    fn start_access_point(&mut self, ssid: &str, password: &str) -> Result<(), ()> {
        self.link_up = false;
        self.access_point = Some((ssid.into(), password.into()));
        Ok(())
    }

    fn advertise(&mut self, hostname: &str, service: &ServiceAdvert) -> Result<(), ()> {
        self.advertised.push((hostname.into(), *service));
        Ok(())
    }

    fn ip_addr(&self) -> Option<Ipv4Addr> {
        if self.link_up {
            Some(Ipv4Addr::new(192, 168, 1, 50))
        } else if self.access_point.is_some() {
            Some(Ipv4Addr::new(192, 168, 4, 1))
        } else {
            None
        }
    }
}

/// One recorded broker connect attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectRecord {
    /// Broker host
    pub server: String,
    /// Broker port
    pub port: u16,
    /// Client id
    pub client_id: String,
    /// User name, if credentials were sent
    pub user: Option<String>,
}

/// Mock MQTT client for testing.
///
/// Records all connect/publish/subscribe operations and allows injecting
/// incoming messages for testing message handling. A connect succeeds
/// only while `reachable` is set.
///
/// # Example
///
/// ```rust
/// use esp_relay::hal::MockMqtt;
/// use esp_relay::traits::MqttClient;
///
/// let mut mqtt = MockMqtt::new();
///
/// // Queue incoming message
/// mqtt.queue_message("/ESP_Relay/Relay", b"1".to_vec());
/// assert_eq!(mqtt.try_recv().unwrap().payload, b"1");
///
/// // Check published messages
/// mqtt.published.push(("/ESP_Relay/Relay".into(), b"0".to_vec(), false));
/// assert_eq!(mqtt.published_to("/ESP_Relay/Relay").len(), 1);
/// ```
#[derive(Debug)]
pub struct MockMqtt {
    /// Whether connect attempts succeed.
    pub reachable: bool,
    /// Whether the client is connected.
    pub connected: bool,
    /// Every connect attempt, successful or not.
    pub connect_attempts: Vec<ConnectRecord>,
    /// Messages that have been published (topic, payload, retain).
    pub published: Vec<(String, Vec<u8>, bool)>,
    /// Topics that have been subscribed to.
    pub subscriptions: Vec<String>,
    /// Queue of incoming messages to be returned by `try_recv()`.
    pub incoming: Vec<MqttMessage>,
    /// Make `subscribe` return an error.
    pub fail_subscribe: bool,
}

impl MockMqtt {
    /// Creates a client whose broker accepts connections.
    pub fn new() -> Self {
        Self {
            reachable: true,
            connected: false,
            connect_attempts: Vec::new(),
            published: Vec::new(),
            subscriptions: Vec::new(),
            incoming: Vec::new(),
            fail_subscribe: false,
        }
    }

    /// Creates a client whose broker refuses connections.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    /// Queue an incoming message
    pub fn queue_message(&mut self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.incoming.push(MqttMessage::new(topic, payload));
    }

    /// Check if a topic was subscribed to
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.iter().any(|t| t == topic)
    }

    /// Get published messages for a topic
    pub fn published_to(&self, topic: &str) -> Vec<&(String, Vec<u8>, bool)> {
        self.published
            .iter()
            .filter(|(t, _, _)| t == topic)
            .collect()
    }

    /// Simulate the broker dropping the session.
    pub fn drop_connection(&mut self) {
        self.connected = false;
    }
}

impl Default for MockMqtt {
    fn default() -> Self {
        Self::new()
    }
}

impl MqttClient for MockMqtt {
    type Error = ();

    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), ()> {
        self.connect_attempts.push(ConnectRecord {
            server: options.server.into(),
            port: options.port,
            client_id: options.client_id.into(),
            user: options.credentials.map(|c| c.user.into()),
        });
        self.connected = self.reachable;
        if self.connected {
            Ok(())
        } else {
            Err(())
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), ()> {
        if !self.connected {
            return Err(());
        }
        self.published.push((topic.into(), payload.to_vec(), retain));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), ()> {
        if !self.connected || self.fail_subscribe {
            return Err(());
        }
        self.subscriptions.push(topic.into());
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        if self.incoming.is_empty() {
            None
        } else {
            Some(self.incoming.remove(0))
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ============================================================================
// Tests
// ============================================================================
