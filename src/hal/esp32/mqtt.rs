//! MQTT client for ESP32.
//!
//! Wraps `EspMqttClient` behind the [`MqttClient`] trait. The ESP-IDF client
//! runs its own task; a small thread forwards its events into a channel so
//! that [`try_recv`](MqttClient::try_recv) never blocks the scheduler.
//!
//! `connect` returns as soon as the client is created. The session counts
//! as connected once the broker's acknowledgement arrives on the event
//! thread.
//!
//! # Example
//!
//! ```ignore
//! use esp_relay::hal::esp32::Esp32Mqtt;
//! use esp_relay::traits::{ConnectOptions, MqttClient};
//!
//! let mut mqtt = Esp32Mqtt::new();
//! mqtt.connect(&ConnectOptions {
//!     server: "192.168.1.10",
//!     port: 1883,
//!     client_id: "ESP_Relay",
//!     credentials: None,
//! })?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esp_idf_svc::mqtt::client::{
    EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};
use log::{info, warn};

use crate::traits::{ConnectOptions, MqttClient, MqttMessage};

/// Stack size of the event forwarding thread.
const EVENT_THREAD_STACK: usize = 6 * 1024;

/// MQTT client over ESP-IDF.
pub struct Esp32Mqtt {
    client: Option<EspMqttClient<'static>>,
    message_rx: Option<Receiver<MqttMessage>>,
    /// Connection flag of the current session, owned with its event thread
    connected: Option<Arc<AtomicBool>>,
    keep_alive: Duration,
}

impl Default for Esp32Mqtt {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32Mqtt {
    /// Create a client with no session.
    pub fn new() -> Self {
        Self {
            client: None,
            message_rx: None,
            connected: None,
            keep_alive: Duration::from_secs(15),
        }
    }

    /// Set the keep-alive interval used by later sessions.
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    fn drop_session(&mut self) {
        // Dropping the client stops the ESP-IDF task and ends the event thread
        self.client = None;
        self.message_rx = None;
        self.connected = None;
    }
}

// ============================================================================
// MqttClient Trait Implementation
// ============================================================================

/// Error type for ESP32 MQTT operations.
#[derive(Debug)]
pub struct Esp32MqttError(pub String);

impl core::fmt::Display for Esp32MqttError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "MQTT error: {}", self.0)
    }
}

impl std::error::Error for Esp32MqttError {}

impl MqttClient for Esp32Mqtt {
    type Error = Esp32MqttError;

    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), Self::Error> {
        self.drop_session();

        let broker_url = format!("mqtt://{}:{}", options.server, options.port);
        let mqtt_config = MqttClientConfiguration {
            client_id: Some(options.client_id),
            username: options.credentials.map(|c| c.user),
            password: options.credentials.map(|c| c.password),
            keep_alive_interval: Some(self.keep_alive),
            ..Default::default()
        };

        let (client, mut connection) = EspMqttClient::new(&broker_url, &mqtt_config)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;

        let (message_tx, message_rx) = channel::<MqttMessage>();
        let connected = Arc::new(AtomicBool::new(false));
        let session_flag = Arc::clone(&connected);
        thread::Builder::new()
            .stack_size(EVENT_THREAD_STACK)
            .spawn(move || handle_mqtt_events(&mut connection, message_tx, session_flag))
            .map_err(|e| Esp32MqttError(e.to_string()))?;

        info!("[MQTT] Connecting to {}", broker_url);
        self.client = Some(client);
        self.message_rx = Some(message_rx);
        self.connected = Some(connected);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| Esp32MqttError("not connected".into()))?;
        client
            .publish(topic, QoS::AtMostOnce, retain, payload)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| Esp32MqttError("not connected".into()))?;
        client
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| Esp32MqttError(format!("{:?}", e)))?;
        Ok(())
    }

    fn try_recv(&mut self) -> Option<MqttMessage> {
        let rx = self.message_rx.as_ref()?;
        match rx.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.drop_session();
                None
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
            && self
                .connected
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn handle_mqtt_events(
    connection: &mut EspMqttConnection,
    message_tx: Sender<MqttMessage>,
    connected: Arc<AtomicBool>,
) {
    loop {
        match connection.next() {
            Err(e) => {
                // The client was dropped or the task died
                warn!("[MQTT] Event loop ended: {:?}", e);
                connected.store(false, Ordering::SeqCst);
                return;
            }
            Ok(event) => match event.payload() {
                EventPayload::Connected(_) => connected.store(true, Ordering::SeqCst),
                EventPayload::Disconnected => connected.store(false, Ordering::SeqCst),
                EventPayload::Received {
                    topic: Some(topic),
                    data,
                    ..
                } => {
                    let msg = MqttMessage::new(topic.to_string(), data.to_vec());
                    if message_tx.send(msg).is_err() {
                        return;
                    }
                }
                _ => {}
            },
        }
    }
}
