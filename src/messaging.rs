//! MQTT broker session management.
//!
//! [`MessagingSession`] owns an [`MqttClient`] and adds the policy the
//! client itself does not have: a reconnect attempt at most every 30
//! seconds, a subscription to the control topic after every connect, and
//! typed publication of the relay state.
//!
//! # Scheduling
//!
//! The session is driven from the control loop:
//!
//! ```rust,ignore
//! loop {
//!     let now = clock.now_ms();
//!     if session.tick(now) == SessionState::Connected {
//!         if let Some(msg) = session.pump() {
//!             if let Some(cmd) = session.interpret(&msg) {
//!                 // act on cmd
//!             }
//!         }
//!     }
//! }
//! ```

use log::{info, warn};

use crate::commands::{self, RelayCommand};
use crate::config::{DeviceConfig, FieldString, TopicString};
use crate::traits::{ConnectOptions, Credentials, MqttClient, MqttMessage};

/// Minimum time between two broker connect attempts.
pub const RECONNECT_INTERVAL_MS: u64 = 30_000;

/// Broker session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No broker configured.
    #[default]
    Disabled,
    /// Configured but not connected.
    Disconnected,
    /// Connect issued, waiting for the broker to acknowledge.
    Connecting,
    /// Connected to the broker.
    Connected,
}

impl SessionState {
    /// Short label used in logs and the status endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Disabled => "disabled",
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
        }
    }
}

/// Error returned by [`MessagingSession::publish`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionError<E> {
    /// The session is not connected to a broker.
    NotConnected,
    /// The client rejected the operation.
    Client(E),
}

impl<E: core::fmt::Debug> core::fmt::Display for SessionError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SessionError::NotConnected => write!(f, "not connected to broker"),
            SessionError::Client(e) => write!(f, "MQTT client error: {:?}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for SessionError<E> {}

#[derive(Debug, Default)]
struct BrokerSettings {
    server: FieldString,
    port: u16,
    client_id: FieldString,
    user: FieldString,
    password: FieldString,
}

/// Broker session with reconnect gating.
///
/// # Type Parameters
///
/// - `C`: MQTT client implementing [`MqttClient`]
///
/// # Example
///
/// ```rust
/// use esp_relay::config::DeviceConfig;
/// use esp_relay::hal::MockMqtt;
/// use esp_relay::messaging::{MessagingSession, SessionState};
///
/// let config = DeviceConfig::default().with_mqtt_server("broker.local", 1883);
/// let mut session = MessagingSession::new(MockMqtt::new());
/// session.configure(&config);
///
/// assert_eq!(session.tick(0), SessionState::Connected);
/// assert!(session.client().is_subscribed("/ESP_Relay/Relay"));
/// ```
pub struct MessagingSession<C: MqttClient> {
    client: C,
    state: SessionState,
    settings: BrokerSettings,
    topic: TopicString,
    last_attempt_ms: Option<u64>,
    subscribed: bool,
}

impl<C: MqttClient> MessagingSession<C> {
    /// Wrap a client. The session stays disabled until configured.
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: SessionState::Disabled,
            settings: BrokerSettings::default(),
            topic: TopicString::new(),
            last_attempt_ms: None,
            subscribed: false,
        }
    }

    /// Take broker settings from `config`.
    ///
    /// Leaves the session disabled when no broker server is configured.
    pub fn configure(&mut self, config: &DeviceConfig) {
        if !config.messaging_enabled() {
            info!("[MQTT] No broker configured, messaging disabled");
            self.state = SessionState::Disabled;
            return;
        }

        self.settings = BrokerSettings {
            server: config.mqtt_server.clone(),
            port: config.mqtt_port,
            client_id: config.mqtt_client_id.clone(),
            user: config.mqtt_user.clone(),
            password: config.mqtt_password.clone(),
        };
        self.topic = config.control_topic();
        self.state = SessionState::Disconnected;
        self.subscribed = false;
        info!(
            "[MQTT] Broker {}:{} as '{}', topic {}",
            self.settings.server, self.settings.port, self.settings.client_id, self.topic
        );
    }

    /// Service the session: reconnect when allowed and keep the control
    /// topic subscribed.
    pub fn tick(&mut self, now_ms: u64) -> SessionState {
        if self.state == SessionState::Disabled {
            return self.state;
        }

        if self.client.is_connected() {
            if self.state != SessionState::Connected {
                info!("[MQTT] Connected");
                self.state = SessionState::Connected;
            }
            if !self.subscribed {
                self.subscribe();
            }
            return self.state;
        }

        if self.state == SessionState::Connected {
            warn!("[MQTT] Connection lost");
            self.state = SessionState::Disconnected;
        }
        self.subscribed = false;

        if self.reconnect_due(now_ms) {
            self.connect(now_ms);
        }
        self.state
    }

    /// Track a lost session without attempting to reconnect.
    ///
    /// Used while the station link is down, so the reported state follows
    /// the client even when `tick` is not running.
    pub fn refresh(&mut self) -> SessionState {
        if self.state == SessionState::Disabled || self.client.is_connected() {
            return self.state;
        }
        if self.state == SessionState::Connected {
            warn!("[MQTT] Connection lost");
        }
        self.state = SessionState::Disconnected;
        self.subscribed = false;
        self.state
    }

    /// True if the next `tick` will attempt a connect.
    pub fn attempt_due(&self, now_ms: u64) -> bool {
        self.state != SessionState::Disabled
            && !self.client.is_connected()
            && self.reconnect_due(now_ms)
    }

    /// Receive at most one inbound message.
    pub fn pump(&mut self) -> Option<MqttMessage> {
        if self.state != SessionState::Connected {
            return None;
        }
        self.client.try_recv()
    }

    /// Publish a relay state as `"0"`/`"1"` (not retained).
    pub fn publish(&mut self, topic: &str, value: bool) -> Result<(), SessionError<C::Error>> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        self.client
            .publish(topic, commands::state_payload(value), false)
            .map_err(SessionError::Client)
    }

    /// Decode a message into a relay command.
    ///
    /// Returns `None` for messages on any topic other than the control topic.
    pub fn interpret(&self, msg: &MqttMessage) -> Option<RelayCommand> {
        let cmd = commands::interpret(&self.topic, &msg.topic, &msg.payload);
        if cmd.is_none() {
            warn!("[MQTT] Unexpected topic: {}", msg.topic);
        }
        cmd
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True if a broker is configured.
    pub fn is_enabled(&self) -> bool {
        self.state != SessionState::Disabled
    }

    /// True if connected to the broker.
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected && self.client.is_connected()
    }

    /// The control/status topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Get a reference to the client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Get a mutable reference to the client.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    fn reconnect_due(&self, now_ms: u64) -> bool {
        match self.last_attempt_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= RECONNECT_INTERVAL_MS,
        }
    }

    fn connect(&mut self, now_ms: u64) {
        self.last_attempt_ms = Some(now_ms);

        let credentials = if self.settings.user.is_empty() {
            None
        } else {
            Some(Credentials {
                user: &self.settings.user,
                password: &self.settings.password,
            })
        };
        let options = ConnectOptions {
            server: &self.settings.server,
            port: self.settings.port,
            client_id: &self.settings.client_id,
            credentials,
        };

        info!(
            "[MQTT] Connecting to {}:{}...",
            self.settings.server, self.settings.port
        );
        match self.client.connect(&options) {
            Ok(()) if self.client.is_connected() => {
                info!("[MQTT] Connected");
                self.state = SessionState::Connected;
                self.subscribe();
            }
            Ok(()) => self.state = SessionState::Connecting,
            Err(e) => {
                warn!(
                    "[MQTT] Connect failed ({:?}), retry in {} s",
                    e,
                    RECONNECT_INTERVAL_MS / 1000
                );
                self.state = SessionState::Disconnected;
            }
        }
    }

    fn subscribe(&mut self) {
        match self.client.subscribe(&self.topic) {
            Ok(()) => info!("[MQTT] Subscribed to {}", self.topic),
            // Stays connected; retried after the next reconnect
            Err(e) => warn!("[MQTT] Subscribe to {} failed: {:?}", self.topic, e),
        }
        self.subscribed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockMqtt;

    const TOPIC: &str = "/ESP_Relay/Relay";

    fn broker_config() -> DeviceConfig {
        DeviceConfig::default().with_mqtt_server("broker.local", 1883)
    }

    fn session(client: MockMqtt) -> MessagingSession<MockMqtt> {
        let mut session = MessagingSession::new(client);
        session.configure(&broker_config());
        session
    }

    // =========================================================================
    // Configuration Tests
    // =========================================================================

    #[test]
    fn disabled_without_server() {
        let mut session = MessagingSession::new(MockMqtt::new());
        session.configure(&DeviceConfig::default());

        assert_eq!(session.tick(0), SessionState::Disabled);
        assert_eq!(session.tick(100_000), SessionState::Disabled);
        assert!(session.client().connect_attempts.is_empty());
        assert!(!session.is_enabled());
    }

    #[test]
    fn configure_builds_topic() {
        let config = broker_config().with_client_id("Garage").with_topic_suffix("/Door");
        let mut session = MessagingSession::new(MockMqtt::new());
        session.configure(&config);
        assert_eq!(session.topic(), "/Garage/Door");
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    // =========================================================================
    // Connect Tests
    // =========================================================================

    #[test]
    fn first_tick_connects_and_subscribes() {
        let mut session = session(MockMqtt::new());
        assert_eq!(session.tick(0), SessionState::Connected);

        let attempt = &session.client().connect_attempts[0];
        assert_eq!(attempt.server, "broker.local");
        assert_eq!(attempt.port, 1883);
        assert_eq!(attempt.client_id, "ESP_Relay");
        assert!(session.client().is_subscribed(TOPIC));
    }

    #[test]
    fn anonymous_without_user() {
        let mut session = session(MockMqtt::new());
        session.tick(0);
        assert_eq!(session.client().connect_attempts[0].user, None);
    }

    #[test]
    fn credentials_with_user() {
        let mut session = MessagingSession::new(MockMqtt::new());
        session.configure(&broker_config().with_mqtt_auth("mqttuser", "mqttpass"));
        session.tick(0);
        assert_eq!(
            session.client().connect_attempts[0].user.as_deref(),
            Some("mqttuser")
        );
    }

    // =========================================================================
    // Reconnect Gating Tests
    // =========================================================================

    #[test]
    fn reconnect_gated_to_30_seconds() {
        let mut session = session(MockMqtt::unreachable());

        assert_eq!(session.tick(0), SessionState::Disconnected);
        session.tick(10_000);
        session.tick(29_999);
        assert_eq!(session.client().connect_attempts.len(), 1);

        session.tick(30_000);
        assert_eq!(session.client().connect_attempts.len(), 2);

        session.tick(59_999);
        assert_eq!(session.client().connect_attempts.len(), 2);
        session.tick(60_000);
        assert_eq!(session.client().connect_attempts.len(), 3);
    }

    #[test]
    fn drop_and_reconnect_resubscribes() {
        let mut session = session(MockMqtt::new());
        session.tick(0);

        session.client_mut().drop_connection();
        // Last attempt was at 0, so the gate is already open
        assert_eq!(session.tick(45_000), SessionState::Connected);
        assert_eq!(session.client().connect_attempts.len(), 2);
        assert_eq!(session.client().subscriptions.len(), 2);
    }

    #[test]
    fn drop_within_gate_waits() {
        let mut session = session(MockMqtt::new());
        session.tick(0);

        session.client_mut().drop_connection();
        assert_eq!(session.tick(5_000), SessionState::Disconnected);
        assert_eq!(session.client().connect_attempts.len(), 1);
        assert_eq!(session.tick(30_000), SessionState::Connected);
    }

    #[test]
    fn subscribe_failure_keeps_connection() {
        let mut client = MockMqtt::new();
        client.fail_subscribe = true;
        let mut session = session(client);

        assert_eq!(session.tick(0), SessionState::Connected);
        assert!(session.client().subscriptions.is_empty());
        // Not retried while connected
        session.client_mut().fail_subscribe = false;
        session.tick(1_000);
        assert!(session.client().subscriptions.is_empty());
    }

    #[test]
    fn refresh_tracks_drop_without_connecting() {
        let mut session = session(MockMqtt::new());
        session.tick(0);

        session.client_mut().drop_connection();
        assert_eq!(session.refresh(), SessionState::Disconnected);
        assert_eq!(session.refresh(), SessionState::Disconnected);
        assert_eq!(session.client().connect_attempts.len(), 1);
        assert!(!session.is_connected());
    }

    #[test]
    fn refresh_leaves_disabled_and_live_sessions() {
        let mut disabled = MessagingSession::new(MockMqtt::new());
        disabled.configure(&DeviceConfig::default());
        assert_eq!(disabled.refresh(), SessionState::Disabled);

        let mut live = session(MockMqtt::new());
        live.tick(0);
        assert_eq!(live.refresh(), SessionState::Connected);
    }

    #[test]
    fn attempt_due_follows_gate() {
        let mut session = session(MockMqtt::unreachable());
        assert!(session.attempt_due(0));
        session.tick(0);
        assert!(!session.attempt_due(RECONNECT_INTERVAL_MS - 1));
        assert!(session.attempt_due(RECONNECT_INTERVAL_MS));

        let mut disabled = MessagingSession::new(MockMqtt::new());
        disabled.configure(&DeviceConfig::default());
        assert!(!disabled.attempt_due(0));
    }

    // =========================================================================
    // Publish / Pump Tests
    // =========================================================================

    #[test]
    fn publish_requires_connection() {
        let mut session = session(MockMqtt::unreachable());
        session.tick(0);
        assert_eq!(session.publish(TOPIC, true), Err(SessionError::NotConnected));
    }

    #[test]
    fn publish_sends_text_not_retained() {
        let mut session = session(MockMqtt::new());
        session.tick(0);
        session.publish(TOPIC, true).unwrap();
        session.publish(TOPIC, false).unwrap();

        let published = session.client().published_to(TOPIC);
        assert_eq!(published[0], &(TOPIC.to_string(), b"1".to_vec(), false));
        assert_eq!(published[1].1, b"0");
    }

    #[test]
    fn pump_returns_one_message() {
        let mut session = session(MockMqtt::new());
        session.client_mut().queue_message(TOPIC, b"1".to_vec());
        session.client_mut().queue_message(TOPIC, b"0".to_vec());

        assert!(session.pump().is_none());
        session.tick(0);
        assert_eq!(session.pump().unwrap().payload, b"1");
        assert_eq!(session.client().incoming.len(), 1);
    }

    #[test]
    fn interpret_filters_topic() {
        let session = session(MockMqtt::new());
        let on = MqttMessage::new(TOPIC, b"1".to_vec());
        let stray = MqttMessage::new("/other", b"1".to_vec());

        assert_eq!(session.interpret(&on), Some(RelayCommand::On));
        assert_eq!(session.interpret(&stray), None);
    }

    #[test]
    fn error_display() {
        let err: SessionError<()> = SessionError::NotConnected;
        assert_eq!(err.to_string(), "not connected to broker");
    }
}
