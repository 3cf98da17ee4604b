//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BoilerService / supervisor (domain)
//! ```
//!
//! Driven adapters (boiler link, WiFi driver, clock, event sinks, storage,
//! web request queue) implement these traits.  The domain consumes them via
//! generics, so the control core never touches a peripheral directly.
//!
//! ## Timing contract
//!
//! Every port call is made from the single main-loop thread and must return
//! within a fraction of the control tick.  Nothing here may sleep.

use serde::Serialize;

use super::commands::{InboundRequest, Response};
use crate::config::{BoilerConfig, Credentials};

// ───────────────────────────────────────────────────────────────
// Boiler link (driven adapter: domain ↔ boiler)
// ───────────────────────────────────────────────────────────────

/// Outcome of the most recent boiler exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LinkStatus {
    Success,
    #[default]
    Failure,
}

/// Services the node asks the boiler to provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusRequest {
    pub central_heating: bool,
    pub hot_water: bool,
    pub cooling: bool,
}

/// Services the boiler reports as currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ActivityFlags {
    pub central_heating: bool,
    pub hot_water: bool,
    pub cooling: bool,
    pub flame: bool,
}

/// Synchronous request/response exchange with the boiler.
///
/// Framing and the master/slave handshake live behind this trait.
pub trait BoilerLinkPort {
    /// Send the requested enables; returns the boiler's activity flags and
    /// the exchange status.  Flags are all-false on failure.
    fn set_status(&mut self, request: StatusRequest) -> (ActivityFlags, LinkStatus);

    /// Write the commanded water temperature.  `true` if the boiler
    /// accepted it.
    fn set_temperature(&mut self, celsius: f32) -> bool;

    /// Read back the actual water temperature.
    fn get_temperature(&mut self) -> f32;

    /// Status of the last exchange made through any of the calls above.
    fn last_status(&self) -> LinkStatus;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (driven adapter: domain → WiFi driver)
// ───────────────────────────────────────────────────────────────

/// Raw station-mode WiFi driver.  Calls must not block: `begin` starts an
/// association and returns, `is_connected` only inspects driver state.
pub trait ConnectivityPort {
    /// Start associating with the given network.
    fn begin(&mut self, credentials: &Credentials) -> Result<(), ConnectivityError>;

    /// Drop the current association (no-op when not associated).
    fn disconnect(&mut self);

    /// Whether the station currently holds an IP lease.
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  Wraps at `u32::MAX` like the hardware
/// tick counter; consumers use wrapping arithmetic.
pub trait TimePort {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the operator configuration.
///
/// `save` writes the whole record atomically; a power cut never leaves a
/// half-written configuration behind.
pub trait ConfigPort {
    /// Load configuration.  Returns [`BoilerConfig::default()`] if no
    /// record exists yet.
    fn load(&self) -> Result<BoilerConfig, ConfigError>;

    /// Persist configuration.
    fn save(&mut self, config: &BoilerConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Write operations MUST be atomic: no partial writes on power loss.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Request port (driving adapter: web page → domain)
// ───────────────────────────────────────────────────────────────

/// Pending requests from the local configuration page.
///
/// The HTTP server parses forms and renders pages; the domain only sees
/// decoded [`InboundRequest`]s and answers each with one [`Response`].
pub trait RequestPort {
    /// Take the next pending request, if any.
    fn next_request(&mut self) -> Option<InboundRequest>;

    /// Answer the request most recently returned by `next_request`.
    fn respond(&mut self, response: Response);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored record failed integrity / deserialization check.
    Corrupted,
    /// A config field failed validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage failed.
    Storage(StorageError),
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

/// Errors from [`ConnectivityPort`] and credential validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    DriverRejected,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-24 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-24 bytes for WPA2, or empty for open)")
            }
            Self::DriverRejected => write!(f, "WiFi driver rejected the request"),
        }
    }
}
