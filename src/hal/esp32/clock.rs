//! Scheduler time base from the ESP-IDF high resolution timer.

use crate::traits::Clock;

/// Milliseconds since boot.
///
/// Every deadline in the device (station timeout, broker reconnect gate,
/// uptime) is measured against this clock.
///
/// ```ignore
/// use esp_relay::hal::esp32::Esp32Clock;
/// use esp_relay::traits::Clock;
///
/// let clock = Esp32Clock;
/// device.run_once(clock.now_ms());
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32Clock;

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        // Microseconds since boot, never negative
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        (micros / 1000) as u64
    }
}
