//! Relay output on a runtime-selected GPIO.
//!
//! The relay pin number comes from the stored configuration, so it cannot
//! be a typed `esp_idf_hal` pin. The raw GPIO driver is used instead.

use esp_idf_hal::sys::{
    esp, gpio_get_level, gpio_mode_t_GPIO_MODE_INPUT_OUTPUT, gpio_reset_pin, gpio_set_direction,
    gpio_set_level, EspError,
};
use log::debug;

use crate::traits::RelayPin;

/// Relay driven through the ESP-IDF GPIO driver.
pub struct Esp32RelayPin {
    gpio: i32,
}

impl Esp32RelayPin {
    /// Wrap GPIO `gpio`. The pin is untouched until `configure_output`.
    pub fn new(gpio: u8) -> Self {
        Self {
            gpio: i32::from(gpio),
        }
    }
}

impl RelayPin for Esp32RelayPin {
    type Error = EspError;

    fn configure_output(&mut self, initial_high: bool) -> Result<(), EspError> {
        // Level is latched before the output driver is enabled
        unsafe {
            esp!(gpio_reset_pin(self.gpio))?;
            esp!(gpio_set_level(self.gpio, u32::from(initial_high)))?;
            esp!(gpio_set_direction(
                self.gpio,
                gpio_mode_t_GPIO_MODE_INPUT_OUTPUT
            ))?;
        }
        debug!("[Relay] GPIO{} output, level {}", self.gpio, initial_high);
        Ok(())
    }

    fn set_high(&mut self, high: bool) -> Result<(), EspError> {
        unsafe { esp!(gpio_set_level(self.gpio, u32::from(high))) }
    }

    fn is_set_high(&self) -> bool {
        // INPUT_OUTPUT mode reads back the driven level
        unsafe { gpio_get_level(self.gpio) != 0 }
    }
}
