//! Hardware abstraction traits for the relay output and time source.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`RelayPin`] | Digital output driving the relay coil |
//! | [`Clock`] | Monotonic millisecond time source |
//! | [`StatusLed`] | On-board connectivity indicator |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use esp_relay::traits::RelayPin;
//! use esp_relay::hal::MockRelayPin;
//!
//! let mut pin = MockRelayPin::new();
//! pin.configure_output(true).unwrap();
//! assert!(pin.is_set_high());
//!
//! pin.set_high(false).unwrap();
//! assert!(!pin.is_set_high());
//! ```

/// Digital output pin driving the relay.
///
/// The pin only knows electrical levels. Mapping between "relay on" and
/// high/low is done by [`RelayController`](crate::relay::RelayController)
/// using the configured active level.
///
/// # Implementation Notes
///
/// - `configure_output` must latch `initial_high` *before* enabling the
///   output driver, otherwise the relay may click to the opposite state
///   for a moment during boot
/// - `is_set_high` reports the level the pin is currently driving; it is
///   read back from the hardware, not cached, where the hardware allows it
///
/// # Example Implementation
///
/// ```rust,ignore
/// use esp_relay::traits::RelayPin;
///
/// struct MyPin { /* hardware handle */ }
///
/// impl RelayPin for MyPin {
///     type Error = ();
///
///     fn configure_output(&mut self, initial_high: bool) -> Result<(), ()> {
///         // write level register, then set direction register
///         Ok(())
///     }
///
///     fn set_high(&mut self, high: bool) -> Result<(), ()> {
///         Ok(())
///     }
///
///     fn is_set_high(&self) -> bool {
///         false
///     }
/// }
/// ```
pub trait RelayPin {
    /// Error type for pin operations.
    type Error: core::fmt::Debug;

    /// Latch the initial level, then switch the pin to output mode.
    fn configure_output(&mut self, initial_high: bool) -> Result<(), Self::Error>;

    /// Drive the pin high (`true`) or low (`false`).
    fn set_high(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Returns true if the pin is currently driven high.
    fn is_set_high(&self) -> bool;
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for reconnect gating and
/// association deadlines. On desktop, this can wrap `std::time::Instant`.
/// On embedded, use a hardware timer.
///
/// # Example
///
/// ```rust
/// use esp_relay::traits::Clock;
/// use esp_relay::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

/// On-board indicator LED.
///
/// Blinks while the station associates and lights during broker connect
/// attempts. See [`StatusIndicator`](crate::indicator::StatusIndicator).
pub trait StatusLed {
    /// Error type for LED operations.
    type Error: core::fmt::Debug;

    /// Light the LED (`true`) or turn it off.
    fn set_lit(&mut self, lit: bool) -> Result<(), Self::Error>;
}

/// Board without an indicator LED.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoLed;

impl StatusLed for NoLed {
    type Error = core::convert::Infallible;

    fn set_lit(&mut self, _lit: bool) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<L: StatusLed> StatusLed for Option<L> {
    type Error = L::Error;

    fn set_lit(&mut self, lit: bool) -> Result<(), Self::Error> {
        match self {
            Some(led) => led.set_lit(lit),
            None => Ok(()),
        }
    }
}
