//! Unified error types for the slot-car logger firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the session
//! runner and `main` handle failures uniformly.  All variants are `Copy` so
//! they can travel through the feedback channel without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bring-up phase failed; the session cannot continue.
    Session(SessionError),
    /// The network provider reported a failure.
    Network(NetworkError),
    /// Persistent storage failed.
    Storage(StorageError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(e) => write!(f, "session: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Session errors (fatal: abort, signal, restart)
// ---------------------------------------------------------------------------

/// Fatal bring-up failures.  Each one has its own failure signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The configured SSID did not show up in the scan.
    NoSuchNetwork,
    /// The access point rejected the credentials.
    BadCredentials,
    /// Every palette-suffixed hostname is taken by another device.
    NoAvailableHostname,
    /// Re-association under the negotiated hostname failed.
    AssociationFailed,
    /// A lane count with no colour palette was entered.
    UnsupportedLaneCount(u8),
    /// The telemetry server could not be started.
    ServeFailed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchNetwork => write!(f, "configured network not found"),
            Self::BadCredentials => write!(f, "network rejected credentials"),
            Self::NoAvailableHostname => write!(f, "no available hostname"),
            Self::AssociationFailed => write!(f, "association under negotiated hostname failed"),
            Self::UnsupportedLaneCount(n) => write!(f, "no palette for {n} lanes"),
            Self::ServeFailed => write!(f, "telemetry server failed to start"),
        }
    }
}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Network errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// Authentication with the access point failed.
    AuthFailed,
    /// Association failed for a reason other than authentication.
    ConnectFailed,
    /// A hostname lookup could not be completed.
    ResolveFailed,
    /// The hostname is empty, too long or contains invalid characters.
    InvalidHostname,
    /// The operation needs an active association.
    NotConnected,
    /// The driver rejected the request.
    Driver(i32),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthFailed => write!(f, "authentication failed"),
            Self::ConnectFailed => write!(f, "connection failed"),
            Self::ResolveFailed => write!(f, "hostname lookup failed"),
            Self::InvalidHostname => write!(f, "invalid hostname"),
            Self::NotConnected => write!(f, "not connected"),
            Self::Driver(rc) => write!(f, "driver error (rc={rc})"),
        }
    }
}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key or file does not exist.
    NotFound,
    /// Storage is full; further writes are refused.
    Full,
    /// Stored bytes could not be decoded.
    Corrupted,
    /// Generic I/O error.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Full => write!(f, "storage full"),
            Self::Corrupted => write!(f, "stored data corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` names the field and the accepted range.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
