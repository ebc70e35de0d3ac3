//! Desktop MQTT client built on `rumqttc`.
//!
//! [`RumqttClient`] implements [`MqttClient`] over rumqttc's blocking
//! `Client`/`Connection` pair. The event loop is never driven from a
//! background task: every [`try_recv`](MqttClient::try_recv) call drains
//! whatever the connection has ready, so the scheduler stays in control of
//! all network I/O.
//!
//! The blocking connection owns a private tokio runtime, so this client
//! must be used from a plain thread, not from inside an async task.
//!
//! ```ignore
//! let mut client = RumqttClient::new().with_connect_timeout(Duration::from_secs(2));
//! client.connect(&ConnectOptions {
//!     server: "localhost",
//!     port: 1883,
//!     client_id: "ESP_Relay",
//!     credentials: None,
//! })?;
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, warn};
use rumqttc::{Client, ConnectReturnCode, Connection, Event, MqttOptions, Packet, QoS};

use crate::traits::{ConnectOptions, MqttClient, MqttMessage};

/// Events drained per `try_recv` call before yielding back.
const MAX_EVENTS_PER_POLL: usize = 16;

// ============================================================================
// Errors
// ============================================================================

/// MQTT client errors
#[derive(Debug)]
pub enum MqttError {
    /// Failed to connect to broker
    Connect(String),
    /// Failed to subscribe to topic
    Subscribe(String),
    /// Failed to publish message
    Publish(String),
    /// No broker session
    NotConnected,
}

impl std::fmt::Display for MqttError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MqttError::Connect(e) => write!(f, "MQTT connect error: {}", e),
            MqttError::Subscribe(e) => write!(f, "MQTT subscribe error: {}", e),
            MqttError::Publish(e) => write!(f, "MQTT publish error: {}", e),
            MqttError::NotConnected => write!(f, "MQTT not connected"),
        }
    }
}

impl std::error::Error for MqttError {}

// ============================================================================
// Client
// ============================================================================

struct Session {
    client: Client,
    connection: Connection,
}

/// Blocking `rumqttc` client driven by polling.
pub struct RumqttClient {
    session: Option<Session>,
    connected: bool,
    inbox: VecDeque<MqttMessage>,
    keep_alive: Duration,
    connect_timeout: Duration,
}

impl Default for RumqttClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RumqttClient {
    /// Client with a 15 s keep-alive and a 5 s connect timeout.
    pub fn new() -> Self {
        Self {
            session: None,
            connected: false,
            inbox: VecDeque::new(),
            keep_alive: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Set the keep-alive interval.
    pub fn with_keep_alive_secs(mut self, secs: u64) -> Self {
        self.keep_alive = Duration::from_secs(secs);
        self
    }

    /// Set how long `connect` waits for the broker's acknowledgement.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn drop_session(&mut self) {
        self.session = None;
        self.connected = false;
    }

    /// Route one event. Returns false when the session is gone.
    fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                self.connected = ack.code == ConnectReturnCode::Success;
                self.connected
            }
            Event::Incoming(Packet::Publish(publish)) => {
                self.inbox
                    .push_back(MqttMessage::new(publish.topic, publish.payload.to_vec()));
                true
            }
            Event::Incoming(Packet::Disconnect) => false,
            _ => true,
        }
    }
}

impl MqttClient for RumqttClient {
    type Error = MqttError;

    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), Self::Error> {
        self.drop_session();
        self.inbox.clear();

        let mut mqtt_options = MqttOptions::new(options.client_id, options.server, options.port);
        mqtt_options.set_keep_alive(self.keep_alive);
        if let Some(creds) = options.credentials {
            mqtt_options.set_credentials(creds.user, creds.password);
        }

        let (client, mut connection) = Client::new(mqtt_options, 10);
        let deadline = Instant::now() + self.connect_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(MqttError::Connect("timed out waiting for CONNACK".into()));
            }
            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(MqttError::Connect(format!("{:?}", ack.code)));
                    }
                    break;
                }
                Ok(Ok(event)) => debug!("[MQTT] Event before CONNACK: {:?}", event),
                Ok(Err(e)) => return Err(MqttError::Connect(e.to_string())),
                Err(_) => return Err(MqttError::Connect("timed out waiting for CONNACK".into())),
            }
        }

        self.session = Some(Session { client, connection });
        self.connected = true;
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error> {
        let session = match (&mut self.session, self.connected) {
            (Some(session), true) => session,
            _ => return Err(MqttError::NotConnected),
        };
        session
            .client
            .try_publish(topic, QoS::AtMostOnce, retain, payload.to_vec())
            .map_err(|e| MqttError::Publish(e.to_string()))
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error> {
        let session = match (&mut self.session, self.connected) {
            (Some(session), true) => session,
            _ => return Err(MqttError::NotConnected),
        };
        session
            .client
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| MqttError::Subscribe(e.to_string()))
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        for _ in 0..MAX_EVENTS_PER_POLL {
            let polled = match self.session.as_mut() {
                Some(session) => session.connection.try_recv(),
                None => break,
            };
            match polled {
                Ok(Ok(event)) => {
                    if !self.handle_event(event) {
                        warn!("[MQTT] Broker closed the session");
                        self.drop_session();
                        break;
                    }
                }
                Ok(Err(e)) => {
                    warn!("[MQTT] Connection lost: {}", e);
                    self.drop_session();
                    break;
                }
                // Nothing ready
                Err(_) => break,
            }
        }
        self.inbox.pop_front()
    }

    fn is_connected(&self) -> bool {
        self.session.is_some() && self.connected
    }
}
