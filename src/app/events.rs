//! Outbound application events.
//!
//! The domain emits these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them: log to
//! serial, forward to a dashboard, etc.

use super::ports::{ActivityFlags, ConfigError, LinkStatus};
use crate::error::{Error, LinkStep};
use crate::supervisor::WifiStatus;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started with the loaded configuration.
    Started { desired_temp: f32, manual: bool },

    /// One control cycle finished (successfully or not).
    CycleCompleted(CycleReport),

    /// A boiler exchange failed; the next cycle retries.
    LinkFailure(LinkStep),

    /// The WiFi supervisor changed state.
    ConnectivityChanged(WifiStatus),

    /// The WiFi retry budget ran out; the supervisor starts over.
    ConnectivityExhausted { attempts: u16 },

    /// An operator update was accepted and persisted.
    ConfigApplied { credentials_changed: bool },

    /// An operator update was applied but could not be persisted.
    ConfigSaveFailed(ConfigError),

    /// A new external room temperature sample arrived.
    TelemetryReceived { celsius: f32 },
}

impl AppEvent {
    /// The failure this event reports, if it reports one.
    pub fn error(&self) -> Option<Error> {
        match self {
            Self::LinkFailure(step) => Some((*step).into()),
            Self::ConnectivityExhausted { .. } => Some(Error::ConnectivityExhausted),
            Self::ConfigSaveFailed(e) => Some((*e).into()),
            _ => None,
        }
    }
}

/// Outcome of one control cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub commanded_boiler_temp: f32,
    pub actual_boiler_temp: f32,
    /// `true` when the manual override supplied the command.
    pub manual: bool,
    pub activity: ActivityFlags,
    pub status_link: LinkStatus,
    pub command_accepted: bool,
}
