//! Relay output control.
//!
//! [`RelayController`] owns the output pin and maps between the logical
//! relay state ("on"/"off") and the electrical level using the configured
//! active level. Switching is edge-triggered: requesting the state the relay
//! is already in does nothing, so callers can use [`SwitchOutcome`] to decide
//! whether a state change must be announced.
//!
//! # Level Mapping
//!
//! ```text
//! relay_active_high | logical on | logical off
//! ------------------+------------+------------
//!       true        |    high    |    low
//!       false       |    low     |    high
//! ```

use log::info;

use crate::config::DeviceConfig;
use crate::traits::RelayPin;

/// Result of a [`RelayController::set_relay`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The relay was already in the requested state; the pin was not touched.
    Unchanged,
    /// The pin was driven to a new level.
    Switched {
        /// New logical state
        on: bool,
    },
}

impl SwitchOutcome {
    /// Returns true if the relay changed state.
    pub fn changed(&self) -> bool {
        matches!(self, SwitchOutcome::Switched { .. })
    }
}

/// Drives the relay output pin.
///
/// # Type Parameters
///
/// - `P`: Output pin implementing [`RelayPin`]
///
/// # Example
///
/// ```rust
/// use esp_relay::config::DeviceConfig;
/// use esp_relay::hal::MockRelayPin;
/// use esp_relay::relay::{RelayController, SwitchOutcome};
///
/// let config = DeviceConfig::default().with_relay(5, true);
/// let mut relay = RelayController::new(MockRelayPin::new(), &config);
/// relay.initialize(false).unwrap();
///
/// assert_eq!(relay.set_relay(true).unwrap(), SwitchOutcome::Switched { on: true });
/// assert_eq!(relay.set_relay(true).unwrap(), SwitchOutcome::Unchanged);
/// ```
pub struct RelayController<P: RelayPin> {
    pin: P,
    active_high: bool,
    gpio: u8,
}

impl<P: RelayPin> RelayController<P> {
    /// Take ownership of `pin`, using the active level from `config`.
    pub fn new(pin: P, config: &DeviceConfig) -> Self {
        Self {
            pin,
            active_high: config.relay_active_high,
            gpio: config.relay_pin,
        }
    }

    /// Configure the pin as output with the level for `on_boot`.
    ///
    /// The level is latched before the output driver is enabled, so the
    /// relay never passes through the opposite state at power-up.
    pub fn initialize(&mut self, on_boot: bool) -> Result<(), P::Error> {
        self.pin.configure_output(self.level_for(on_boot))?;
        info!(
            "[Relay] GPIO{} active {} initialized {}",
            self.gpio,
            if self.active_high { "high" } else { "low" },
            if on_boot { "on" } else { "off" }
        );
        Ok(())
    }

    /// Switch the relay to `desired`.
    ///
    /// Returns [`SwitchOutcome::Unchanged`] without writing the pin if the
    /// relay is already in that state.
    pub fn set_relay(&mut self, desired: bool) -> Result<SwitchOutcome, P::Error> {
        if self.current_state() == desired {
            return Ok(SwitchOutcome::Unchanged);
        }
        self.pin.set_high(self.level_for(desired))?;
        info!("[Relay] Switched {}", if desired { "on" } else { "off" });
        Ok(SwitchOutcome::Switched { on: desired })
    }

    /// Current logical state, derived from the driven pin level.
    pub fn current_state(&self) -> bool {
        self.pin.is_set_high() == self.active_high
    }

    /// True if a high level means "on".
    pub fn active_high(&self) -> bool {
        self.active_high
    }

    /// GPIO number the relay is wired to.
    pub fn gpio(&self) -> u8 {
        self.gpio
    }

    /// Get a reference to the pin.
    pub fn pin(&self) -> &P {
        &self.pin
    }

    fn level_for(&self, on: bool) -> bool {
        on == self.active_high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockRelayPin;

    fn controller(active_high: bool, on_boot: bool) -> RelayController<MockRelayPin> {
        let config = DeviceConfig::default().with_relay(5, active_high);
        let mut relay = RelayController::new(MockRelayPin::new(), &config);
        relay.initialize(on_boot).unwrap();
        relay
    }

    // =========================================================================
    // Initialization Tests
    // =========================================================================

    #[test]
    fn active_low_boot_off_drives_high() {
        let relay = controller(false, false);
        assert!(relay.pin().high);
        assert!(!relay.current_state());
    }

    #[test]
    fn active_high_boot_on_drives_high() {
        let relay = controller(true, true);
        assert!(relay.pin().high);
        assert!(relay.current_state());
    }

    #[test]
    fn level_latched_before_output_enabled() {
        let relay = controller(false, true);
        assert!(relay.pin().output_enabled);
        assert_eq!(relay.pin().level_at_enable, Some(false));
        assert_eq!(relay.pin().writes, 0);
    }

    // =========================================================================
    // Mapping Tests
    // =========================================================================

    #[test]
    fn mapping_table() {
        for active_high in [false, true] {
            for on in [false, true] {
                let mut relay = controller(active_high, !on);
                relay.set_relay(on).unwrap();
                assert_eq!(relay.pin().high, on == active_high);
                assert_eq!(relay.current_state(), on);
            }
        }
    }

    // =========================================================================
    // Idempotence Tests
    // =========================================================================

    #[test]
    fn same_state_does_not_touch_pin() {
        let mut relay = controller(true, false);

        assert_eq!(relay.set_relay(false).unwrap(), SwitchOutcome::Unchanged);
        assert_eq!(relay.pin().writes, 0);

        assert!(relay.set_relay(true).unwrap().changed());
        assert_eq!(relay.set_relay(true).unwrap(), SwitchOutcome::Unchanged);
        assert_eq!(relay.pin().writes, 1);
    }

    #[test]
    fn toggle_reports_new_state() {
        let mut relay = controller(false, true);
        assert_eq!(
            relay.set_relay(false).unwrap(),
            SwitchOutcome::Switched { on: false }
        );
        assert!(relay.pin().high);
    }

    #[test]
    fn accessors() {
        let relay = controller(true, false);
        assert!(relay.active_high());
        assert_eq!(relay.gpio(), 5);
    }
}
