//! Connectivity indicator on the on-board LED.
//!
//! | Condition | LED |
//! |-----------|-----|
//! | Station associating | Blinks, 500 ms lit / 500 ms off |
//! | Broker connect attempt in progress | Lit |
//! | Anything else | Off |
//!
//! # Example
//!
//! ```rust
//! use esp_relay::connectivity::WifiMode;
//! use esp_relay::indicator::{PinLed, StatusIndicator};
//! use esp_relay::hal::MockRelayPin;
//! use esp_relay::messaging::SessionState;
//!
//! // Active-low LED, like most ESP32 dev boards
//! let led = PinLed::new(MockRelayPin::new(), false).unwrap();
//! let mut indicator = StatusIndicator::new(led);
//!
//! indicator.update(WifiMode::StationConnecting, SessionState::Disconnected, 0);
//! assert!(indicator.is_lit());
//! assert!(!indicator.led().pin().high);
//! ```

use log::warn;

use crate::connectivity::WifiMode;
use crate::messaging::SessionState;
use crate::traits::{RelayPin, StatusLed};

/// Half period of the association blink.
pub const BLINK_HALF_PERIOD_MS: u64 = 500;

/// LED level for a connectivity state.
pub fn pattern(mode: WifiMode, session: SessionState, now_ms: u64) -> bool {
    match (mode, session) {
        (WifiMode::StationConnecting, _) => (now_ms / BLINK_HALF_PERIOD_MS) % 2 == 0,
        (WifiMode::StationConnected, SessionState::Connecting) => true,
        _ => false,
    }
}

/// Drives a [`StatusLed`], writing only on level changes.
pub struct StatusIndicator<L: StatusLed> {
    led: L,
    lit: Option<bool>,
}

impl<L: StatusLed> StatusIndicator<L> {
    /// Wrap an LED. Nothing is written until the first update.
    pub fn new(led: L) -> Self {
        Self { led, lit: None }
    }

    /// Set the LED level.
    pub fn show(&mut self, lit: bool) {
        if self.lit == Some(lit) {
            return;
        }
        match self.led.set_lit(lit) {
            Ok(()) => self.lit = Some(lit),
            Err(e) => warn!("[LED] Write failed: {:?}", e),
        }
    }

    /// Show the [`pattern`] for the given state.
    pub fn update(&mut self, mode: WifiMode, session: SessionState, now_ms: u64) {
        self.show(pattern(mode, session, now_ms));
    }

    /// True if the LED was last set lit.
    pub fn is_lit(&self) -> bool {
        self.lit == Some(true)
    }

    /// The LED.
    pub fn led(&self) -> &L {
        &self.led
    }
}

/// LED on a digital output pin.
pub struct PinLed<P: RelayPin> {
    pin: P,
    active_high: bool,
}

impl<P: RelayPin> PinLed<P> {
    /// Configure `pin` as an output with the LED off.
    pub fn new(mut pin: P, active_high: bool) -> Result<Self, P::Error> {
        pin.configure_output(!active_high)?;
        Ok(Self { pin, active_high })
    }

    /// The underlying pin.
    pub fn pin(&self) -> &P {
        &self.pin
    }
}

impl<P: RelayPin> StatusLed for PinLed<P> {
    type Error = P::Error;

    fn set_lit(&mut self, lit: bool) -> Result<(), P::Error> {
        self.pin.set_high(lit == self.active_high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockRelayPin, MockStatusLed};

    // =========================================================================
    // Pattern Tests
    // =========================================================================

    #[test]
    fn blinks_while_associating() {
        let mode = WifiMode::StationConnecting;
        let session = SessionState::Disconnected;
        assert!(pattern(mode, session, 0));
        assert!(pattern(mode, session, 499));
        assert!(!pattern(mode, session, 500));
        assert!(!pattern(mode, session, 999));
        assert!(pattern(mode, session, 1_000));
    }

    #[test]
    fn lit_while_broker_connecting() {
        assert!(pattern(
            WifiMode::StationConnected,
            SessionState::Connecting,
            700
        ));
        assert!(!pattern(
            WifiMode::StationConnected,
            SessionState::Connected,
            0
        ));
        assert!(!pattern(
            WifiMode::StationConnected,
            SessionState::Disconnected,
            0
        ));
    }

    #[test]
    fn off_in_access_point_mode() {
        for now in [0, 250, 500, 750] {
            assert!(!pattern(
                WifiMode::AccessPointFallback,
                SessionState::Disabled,
                now
            ));
        }
    }

    // =========================================================================
    // Indicator Tests
    // =========================================================================

    #[test]
    fn writes_only_on_change() {
        let mut indicator = StatusIndicator::new(MockStatusLed::new());
        indicator.show(true);
        indicator.show(true);
        indicator.show(false);
        indicator.show(false);
        assert_eq!(indicator.led().history, vec![true, false]);
        assert!(!indicator.is_lit());
    }

    #[test]
    fn failed_write_is_retried() {
        let mut led = MockStatusLed::new();
        led.fail_writes = true;
        let mut indicator = StatusIndicator::new(led);

        indicator.show(true);
        assert!(!indicator.is_lit());
        assert!(indicator.led().history.is_empty());
    }

    // =========================================================================
    // Pin LED Tests
    // =========================================================================

    #[test]
    fn pin_led_starts_off() {
        let low = PinLed::new(MockRelayPin::new(), false).unwrap();
        assert_eq!(low.pin().level_at_enable, Some(true));

        let high = PinLed::new(MockRelayPin::new(), true).unwrap();
        assert_eq!(high.pin().level_at_enable, Some(false));
    }

    #[test]
    fn pin_led_maps_active_level() {
        let mut low = PinLed::new(MockRelayPin::new(), false).unwrap();
        low.set_lit(true).unwrap();
        assert!(!low.pin().high);
        low.set_lit(false).unwrap();
        assert!(low.pin().high);

        let mut high = PinLed::new(MockRelayPin::new(), true).unwrap();
        high.set_lit(true).unwrap();
        assert!(high.pin().high);
    }
}
