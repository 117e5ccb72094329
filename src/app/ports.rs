//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Session / capture / serve loop (domain)
//! ```
//!
//! Driven adapters (sensors, buttons, indicators, network, event stream,
//! storage) implement these traits.  The session consumes them through a
//! single [`Platform`] bundle, so the domain core never touches hardware
//! directly and every phase runs against mocks on the host.
//!
//! ## Contract notes
//!
//! - **FeedbackPort** never blocks; playback happens elsewhere.
//! - **ConfigPort** implementations MUST validate before persisting.
//! - All port errors are typed: callers must handle every variant explicitly.

use core::net::Ipv4Addr;

use crate::app::events::Feedback;
use crate::config::SystemConfig;
use crate::error::{ConfigError, NetworkError, StorageError};
use crate::sensors::Channel;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the three analog channels.
pub trait SensorPort {
    /// Raw ADC counts for one channel.
    fn read_raw(&mut self, channel: Channel) -> u16;

    /// Channel voltage at the ADC pin, in `[0.0, 3.3]`.
    fn read_volts(&mut self, channel: Channel) -> f32 {
        crate::sensors::raw_to_volts(self.read_raw(channel))
    }
}

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: buttons → domain)
// ───────────────────────────────────────────────────────────────

/// The two operator buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    Yellow,
    Black,
}

/// Raw button levels.  Debouncing happens in the domain.
pub trait InputPort {
    /// `true` when the pin reads high (button released, pull-up).
    fn level(&mut self, button: ButtonId) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Feedback port (domain → LEDs / piezo)
// ───────────────────────────────────────────────────────────────

pub trait FeedbackPort {
    /// Queue a signal for the operator.  Must not block.
    fn signal(&mut self, feedback: Feedback);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Monotonic milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Monotonic nanoseconds since boot (telemetry timestamps).
    fn now_ns(&self) -> u64;

    /// Cooperative pause between polls.
    fn delay_ms(&mut self, ms: u32);

    /// Set when the serve loop should hand control back (restart request
    /// on target, end of script in simulation).
    fn shutdown_requested(&self) -> bool {
        false
    }
}

/// Everything on the logger board itself.
pub trait Board: SensorPort + InputPort + FeedbackPort + ClockPort {}

impl<T: SensorPort + InputPort + FeedbackPort + ClockPort> Board for T {}

// ───────────────────────────────────────────────────────────────
// Network port (domain → WiFi station / mDNS)
// ───────────────────────────────────────────────────────────────

pub trait NetworkPort {
    /// Whether `ssid` is visible.
    fn scan(&mut self, ssid: &str) -> Result<bool, NetworkError>;

    /// Join `ssid`.  Authentication failures are reported as
    /// [`NetworkError::AuthFailed`].
    fn associate(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError>;

    /// Leave the current association.  No-op when not associated.
    fn disconnect(&mut self);

    /// Look `hostname` up on the local network; `Ok(None)` when nobody
    /// answers to it.
    fn resolve(&mut self, hostname: &str) -> Result<Option<Ipv4Addr>, NetworkError>;

    /// Hostname to present on the next association.
    fn set_hostname(&mut self, name: &str) -> Result<(), NetworkError>;

    /// Address held by this device, if associated.
    fn current_ip(&self) -> Option<Ipv4Addr>;

    /// Announce `hostname` over mDNS.
    fn advertise(&mut self, hostname: &str) -> Result<(), NetworkError>;
}

// ───────────────────────────────────────────────────────────────
// Event stream port (domain → browser)
// ───────────────────────────────────────────────────────────────

/// Opaque handle for one event-stream subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// The subscriber has gone away.
    Disconnected,
    /// Socket-level failure.
    Io,
}

impl core::fmt::Display for StreamError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "subscriber disconnected"),
            Self::Io => write!(f, "stream I/O error"),
        }
    }
}

/// Transport under the telemetry feed.
pub trait EventStreamPort {
    /// Start listening.  Called once when serving begins; `identity` is
    /// what the device answers to on its identification route.
    fn start(&mut self, identity: &str) -> Result<(), StreamError>;

    /// Accept a waiting subscriber, if any.  Never blocks.
    fn accept(&mut self) -> Option<SubscriptionHandle>;

    /// Close a subscriber.  Unknown handles are ignored.
    fn close(&mut self, handle: SubscriptionHandle);

    /// Send one event payload.
    fn send(&mut self, handle: SubscriptionHandle, data: &str) -> Result<(), StreamError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Keys are namespaced to prevent collisions between subsystems.  Writes
/// MUST be atomic: no partial writes on power loss.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Record log port (domain → flash filesystem)
// ───────────────────────────────────────────────────────────────

/// Append-only log of telemetry records.
pub trait RecordLogPort {
    /// Start a new log.  [`StorageError::Full`] when there is no room.
    fn open(&mut self) -> Result<(), StorageError>;

    /// Append one record line.  [`StorageError::Full`] once the store is
    /// full; the caller stops writing from then on.
    fn append(&mut self, line: &str) -> Result<(), StorageError>;

    /// Flush and close the current log.  No-op when nothing is open.
    fn close(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Platform bundle
// ───────────────────────────────────────────────────────────────

/// Binds one concrete adapter to each port for a session.
pub trait Platform {
    type Board: Board;
    type Net: NetworkPort;
    type Stream: EventStreamPort;
    type Store: StoragePort;
    type Log: RecordLogPort;
}
