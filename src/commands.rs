//! Relay commands carried over MQTT.
//!
//! Inbound messages are reduced to a [`RelayCommand`] by a pure function of
//! `(topic, payload)`, so command handling can be tested without a broker.
//!
//! # Payload Convention
//!
//! Only the first byte of the payload is inspected:
//!
//! | First byte | Command |
//! |------------|---------|
//! | `'0'` | [`RelayCommand::Off`] |
//! | `'1'` | [`RelayCommand::On`] |
//! | anything else, or empty | [`RelayCommand::Query`] |
//!
//! A malformed payload is never an error; it asks for the current state.
//!
//! # Example
//!
//! ```rust
//! use esp_relay::commands::{interpret, RelayCommand};
//!
//! let topic = "/ESP_Relay/Relay";
//! assert_eq!(interpret(topic, topic, b"1"), Some(RelayCommand::On));
//! assert_eq!(interpret(topic, topic, b"?"), Some(RelayCommand::Query));
//! assert_eq!(interpret(topic, "/other", b"1"), None);
//! ```

/// Command decoded from an inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayCommand {
    /// Switch the relay off.
    Off,
    /// Switch the relay on.
    On,
    /// Report the current state without switching.
    Query,
}

impl RelayCommand {
    /// Decode a payload by its first byte.
    pub fn from_payload(payload: &[u8]) -> Self {
        match payload.first() {
            Some(b'0') => RelayCommand::Off,
            Some(b'1') => RelayCommand::On,
            _ => RelayCommand::Query,
        }
    }

    /// The requested relay state, or `None` for a query.
    pub fn desired_state(self) -> Option<bool> {
        match self {
            RelayCommand::Off => Some(false),
            RelayCommand::On => Some(true),
            RelayCommand::Query => None,
        }
    }
}

/// Render a relay state as an outbound payload.
pub fn state_payload(on: bool) -> &'static [u8] {
    if on {
        b"1"
    } else {
        b"0"
    }
}

/// Interpret a message received on `topic`.
///
/// Returns `None` unless `topic` is exactly `control_topic`.
pub fn interpret(control_topic: &str, topic: &str, payload: &[u8]) -> Option<RelayCommand> {
    if topic != control_topic {
        return None;
    }
    Some(RelayCommand::from_payload(payload))
}
