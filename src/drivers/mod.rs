//! Button, indicator and peripheral drivers.

pub mod button;
pub mod debounce;
pub mod hw_init;
pub mod indicator;
pub mod led_patterns;
pub mod status_led;
pub mod task_pin;
pub mod tones;
