//! GPIO / peripheral pin assignments for the logger board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Analog inputs (ADC1, 12 dB attenuation → 0 – 3.3 V)
// ---------------------------------------------------------------------------

/// Track supply voltage through a 17.966 : 3.3 divider.
/// ADC1 channel 3 (GPIO 4 on ESP32-S3).
pub const TRACK_VOLTAGE_GPIO: i32 = 4;
/// Controller output voltage through the same divider.
/// ADC1 channel 4 (GPIO 5).
pub const CONTROLLER_VOLTAGE_GPIO: i32 = 5;
/// Hall-effect current sensor, 25 mV/A around mid-rail.
/// ADC1 channel 5 (GPIO 6).
pub const CONTROLLER_CURRENT_GPIO: i32 = 6;

pub const ADC1_CH_TRACK_VOLTAGE: u32 = 3;
pub const ADC1_CH_CONTROLLER_VOLTAGE: u32 = 4;
pub const ADC1_CH_CONTROLLER_CURRENT: u32 = 5;

// ---------------------------------------------------------------------------
// Buttons (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// Yellow button: counting presses, lap marks.
pub const YELLOW_BUTTON_GPIO: i32 = 15;
/// Black button: capture restart, recording toggle.
pub const BLACK_BUTTON_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

pub const RED_LED_GPIO: i32 = 11;
pub const YELLOW_LED_GPIO: i32 = 12;
pub const GREEN_LED_GPIO: i32 = 13;

/// Piezo sounder, driven by LEDC at a variable frequency.
pub const PIEZO_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution for the piezo (bits).  50 % duty = half scale.
pub const PIEZO_PWM_RESOLUTION_BITS: u32 = 10;
/// Initial piezo frequency; every note retunes the timer.
pub const PIEZO_BASE_FREQ_HZ: u32 = 440;
