//! Indicator panel: the three discrete LEDs and the piezo.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the LED GPIOs and the piezo LEDC channel via hw_init.
//! On host/test: tracks state in-memory only.

use super::led_patterns::LedMask;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

/// Output side of the indicator task.
pub trait IndicatorOutput {
    fn set_leds(&mut self, leds: LedMask);

    /// Sound `hz`, or silence the piezo for `0`.
    fn tone(&mut self, hz: u32);
}

#[derive(Debug, Default)]
pub struct StatusPanel {
    leds: LedMask,
    tone_hz: u32,
}

impl StatusPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn off(&mut self) {
        self.set_leds(LedMask::NONE);
        self.tone(0);
    }

    pub fn current_leds(&self) -> LedMask {
        self.leds
    }

    pub fn current_tone(&self) -> u32 {
        self.tone_hz
    }
}

impl IndicatorOutput for StatusPanel {
    fn set_leds(&mut self, leds: LedMask) {
        #[cfg(target_os = "espidf")]
        {
            hw_init::gpio_write(pins::RED_LED_GPIO, leds.red());
            hw_init::gpio_write(pins::YELLOW_LED_GPIO, leds.yellow());
            hw_init::gpio_write(pins::GREEN_LED_GPIO, leds.green());
        }
        self.leds = leds;
    }

    fn tone(&mut self, hz: u32) {
        #[cfg(target_os = "espidf")]
        {
            if hz == 0 {
                hw_init::piezo_off();
            } else {
                hw_init::piezo_tone(hz);
            }
        }
        self.tone_hz = hz;
    }
}
