//! Unified error types for the boiler node firmware.
//!
//! Nothing in the control core is fatal: a failed boiler exchange is
//! recorded and retried by the next cycle, an exhausted WiFi retry budget
//! restarts the connect sequence, and malformed numeric input degrades to
//! `0.0`.  These types exist so that every subsystem reports failures the
//! same way to logs and the event sink.  All variants are `Copy`.

use core::fmt;

use crate::app::ports::ConfigError;
use crate::update::UpdateError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A boiler link exchange failed or was rejected.
    Link(LinkStep),
    /// The WiFi supervisor used up its retry budget.
    ConnectivityExhausted,
    /// Configuration rejected or could not be persisted.
    Config(ConfigError),
    /// Wireless update reported an error.
    Update(UpdateError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(step) => write!(f, "boiler link: {step} failed"),
            Self::ConnectivityExhausted => write!(f, "WiFi retry budget exhausted"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Update(e) => write!(f, "update: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Boiler link
// ---------------------------------------------------------------------------

/// Which exchange of the control cycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStep {
    /// Status flags write / activity flags read.
    SetStatus,
    /// Commanded boiler temperature write.
    SetTemperature,
    /// Actual boiler temperature read-back.
    ReadTemperature,
}

impl fmt::Display for LinkStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetStatus => write!(f, "set status"),
            Self::SetTemperature => write!(f, "set temperature"),
            Self::ReadTemperature => write!(f, "read temperature"),
        }
    }
}

impl From<LinkStep> for Error {
    fn from(step: LinkStep) -> Self {
        Self::Link(step)
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<UpdateError> for Error {
    fn from(e: UpdateError) -> Self {
        Self::Update(e)
    }
}
