//! System configuration parameters
//!
//! All tunable parameters for the logger.  Defaults are compiled in; the
//! NVS adapter can override them with a stored blob.

use serde::{Deserialize, Serialize};

use crate::app::counter::LongPressPolicy;
use crate::error::ConfigError;

/// Build-time network defaults, overridable through the environment.
const DEFAULT_SSID: &str = match option_env!("SLOTLOGGER_WIFI_SSID") {
    Some(s) => s,
    None => "slot-car-logger",
};
const DEFAULT_PASSWORD: &str = match option_env!("SLOTLOGGER_WIFI_PASSWORD") {
    Some(s) => s,
    None => "sl0tc1r0",
};

/// Copy `s` into a fixed-capacity string, truncating at capacity.
pub fn hstr<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Station credentials for the track-side access point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: hstr(DEFAULT_SSID),
            password: hstr(DEFAULT_PASSWORD),
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Buttons ---
    /// Raw level must hold this long before an edge is reported (ms)
    pub debounce_ms: u32,
    /// Presses up to and including this duration are short (ms)
    pub short_press_ms: u32,
    /// Idle poll ticks between reminder signals during capture
    pub reminder_ticks: u32,
    /// How a long press treats the running count
    pub long_press_policy: LongPressPolicy,

    // --- Calibration ---
    /// Current-channel samples averaged into the zero baseline
    pub calibration_samples: u8,

    // --- Telemetry ---
    /// Interval between published records (ms)
    pub telemetry_interval_ms: u32,
    /// Record log size limit; appends past it report the store as full
    pub record_log_max_bytes: u32,

    // --- Session ---
    /// Pause between the failure signal and the cold restart (ms)
    pub restart_delay_ms: u32,
    /// Hostname stem; the lane colour is appended after a dash
    pub hostname_prefix: heapless::String<16>,
    /// Track name stored with each profile
    pub track_name: heapless::String<24>,

    // --- Network ---
    pub network: NetworkConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 10,
            short_press_ms: 500,
            reminder_ticks: 50_000,
            long_press_policy: LongPressPolicy::Keep,

            calibration_samples: 10,

            telemetry_interval_ms: 200,     // 5 Hz
            record_log_max_bytes: 1 << 20, // 1 MiB

            restart_delay_ms: 5_000,
            hostname_prefix: hstr("logger"),
            track_name: hstr("home"),

            network: NetworkConfig::default(),
        }
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn is_hostname_label(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('-')
        && s.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Range-check every field.  Out-of-range values are rejected, not clamped.
pub fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !(1..=100).contains(&cfg.debounce_ms) {
        return Err(ConfigError::ValidationFailed("debounce_ms must be 1–100"));
    }
    if !(100..=2_000).contains(&cfg.short_press_ms) {
        return Err(ConfigError::ValidationFailed("short_press_ms must be 100–2000"));
    }
    if cfg.short_press_ms <= cfg.debounce_ms {
        return Err(ConfigError::ValidationFailed(
            "short_press_ms must be > debounce_ms",
        ));
    }
    if cfg.reminder_ticks == 0 {
        return Err(ConfigError::ValidationFailed("reminder_ticks must be > 0"));
    }
    if !(1..=64).contains(&cfg.calibration_samples) {
        return Err(ConfigError::ValidationFailed("calibration_samples must be 1–64"));
    }
    if !(50..=5_000).contains(&cfg.telemetry_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "telemetry_interval_ms must be 50–5000",
        ));
    }
    if cfg.record_log_max_bytes < 4_096 {
        return Err(ConfigError::ValidationFailed(
            "record_log_max_bytes must be >= 4096",
        ));
    }
    if !(1_000..=60_000).contains(&cfg.restart_delay_ms) {
        return Err(ConfigError::ValidationFailed(
            "restart_delay_ms must be 1000–60000",
        ));
    }
    if !is_hostname_label(&cfg.hostname_prefix) {
        return Err(ConfigError::ValidationFailed(
            "hostname_prefix must be lowercase letters, digits or dashes",
        ));
    }
    if cfg.track_name.is_empty() || !is_printable_ascii(&cfg.track_name) {
        return Err(ConfigError::ValidationFailed(
            "track_name must be printable ASCII",
        ));
    }
    let ssid = cfg.network.ssid.as_str();
    if ssid.is_empty() || !is_printable_ascii(ssid) {
        return Err(ConfigError::ValidationFailed(
            "ssid must be 1–32 printable ASCII bytes",
        ));
    }
    let password = cfg.network.password.as_str();
    if !password.is_empty() && password.len() < 8 {
        return Err(ConfigError::ValidationFailed(
            "password must be empty or 8–64 bytes",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&SystemConfig::default()).is_ok());
    }

    #[test]
    fn defaults_match_logger_behaviour() {
        let c = SystemConfig::default();
        assert_eq!(c.short_press_ms, 500);
        assert_eq!(c.reminder_ticks, 50_000);
        assert_eq!(c.calibration_samples, 10);
        assert_eq!(c.telemetry_interval_ms, 200);
        assert_eq!(c.restart_delay_ms, 5_000);
        assert_eq!(c.hostname_prefix.as_str(), "logger");
        assert_eq!(c.long_press_policy, LongPressPolicy::Keep);
    }

    #[test]
    fn rejects_zero_debounce() {
        let cfg = SystemConfig {
            debounce_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&cfg),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn rejects_uppercase_hostname_prefix() {
        let cfg = SystemConfig {
            hostname_prefix: hstr("Logger"),
            ..Default::default()
        };
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn rejects_short_password() {
        let mut cfg = SystemConfig::default();
        cfg.network.password = hstr("short");
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn accepts_open_network() {
        let mut cfg = SystemConfig::default();
        cfg.network.password = hstr("");
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn hstr_truncates_at_capacity() {
        let s: heapless::String<4> = hstr("abcdef");
        assert_eq!(s.as_str(), "abcd");
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn postcard_roundtrip() {
        let c = SystemConfig {
            long_press_policy: LongPressPolicy::GiveBack,
            ..Default::default()
        };
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: SystemConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c, c2);
    }
}
