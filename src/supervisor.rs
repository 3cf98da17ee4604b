//! WiFi station connectivity supervisor.
//!
//! Bounded-retry state machine that brings the station connection up
//! without ever blocking the main loop.  Each [`poll`] does a constant
//! amount of work and returns; the control tick and request servicing are
//! never starved by a slow or absent access point.
//!
//! ```text
//!            fresh connect                 link reports up
//!   ┌──────┐ ───────────▶ ┌────────────┐ ─────────────▶ ┌───────────┐
//!   │ Idle │              │ Connecting │                │ Connected │
//!   └──────┘ ◀─────────── └────────────┘                └───────────┘
//!      ▲    attempts > max                                    │
//!      └────────────── link lost: fresh connect ──────────────┘
//! ```
//!
//! Connection loss is never trusted from cached state: every poll asks the
//! driver first.  Forcing [`Idle`](WifiStatus::Idle) (after a credential
//! change) always results in a disconnect and a fresh association, even if
//! the driver still reports the old network as up.
//!
//! [`poll`]: ConnectivitySupervisor::poll

use log::{info, warn};
use serde::Serialize;

use crate::app::events::AppEvent;
use crate::app::ports::{ConnectivityPort, EventSink};
use crate::config::{ConnectivityTuning, Credentials};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum WifiStatus {
    #[default]
    Idle,
    Connecting,
    Connected,
}

/// Supervisor bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectivityState {
    pub status: WifiStatus,
    /// Checks made during the current connect sequence.
    pub attempt_count: u16,
    /// Monotonic ms of the last check (or of the connect request).
    pub last_attempt_ms: u32,
}

pub struct ConnectivitySupervisor {
    state: ConnectivityState,
    tuning: ConnectivityTuning,
}

impl ConnectivitySupervisor {
    pub fn new(tuning: ConnectivityTuning) -> Self {
        Self {
            state: ConnectivityState::default(),
            tuning,
        }
    }

    pub fn state(&self) -> &ConnectivityState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.status == WifiStatus::Connected
    }

    /// Drop back to `Idle` so the next poll reconnects with fresh
    /// credentials.
    pub fn force_idle(&mut self) {
        if self.state.status != WifiStatus::Idle {
            info!("WiFi: reset to idle, reconnect pending");
        }
        self.state.status = WifiStatus::Idle;
    }

    /// Advance the state machine by one step.  Returns `true` while the
    /// station is connected.
    pub fn poll(
        &mut self,
        now_ms: u32,
        wifi: &mut impl ConnectivityPort,
        credentials: &Credentials,
        sink: &mut impl EventSink,
    ) -> bool {
        if self.state.status != WifiStatus::Idle && wifi.is_connected() {
            if self.state.status != WifiStatus::Connected {
                self.state.status = WifiStatus::Connected;
                info!(
                    "WiFi: connected to '{}' after {} checks",
                    credentials.ssid, self.state.attempt_count
                );
                sink.emit(&AppEvent::ConnectivityChanged(WifiStatus::Connected));
            }
            return true;
        }

        if self.state.status == WifiStatus::Connecting {
            if now_ms.wrapping_sub(self.state.last_attempt_ms) > self.tuning.min_check_timeout_ms {
                self.state.attempt_count += 1;
                info!("WiFi: connection check #{}", self.state.attempt_count);

                if self.state.attempt_count > u16::from(self.tuning.max_attempts) {
                    warn!(
                        "WiFi: no connection after {} checks, starting over",
                        self.state.attempt_count
                    );
                    self.state.status = WifiStatus::Idle;
                    sink.emit(&AppEvent::ConnectivityExhausted {
                        attempts: self.state.attempt_count,
                    });
                    sink.emit(&AppEvent::ConnectivityChanged(WifiStatus::Idle));
                }
                self.state.last_attempt_ms = now_ms;
            }
            return false;
        }

        if self.state.status == WifiStatus::Connected {
            warn!("WiFi: connection lost");
        }

        info!("WiFi: connecting to '{}'", credentials.ssid);
        self.state.status = WifiStatus::Connecting;
        self.state.attempt_count = 0;
        self.state.last_attempt_ms = now_ms;
        wifi.disconnect();
        if let Err(e) = wifi.begin(credentials) {
            warn!("WiFi: connect request rejected: {}", e);
        }
        sink.emit(&AppEvent::ConnectivityChanged(WifiStatus::Connecting));
        wifi.is_connected()
    }
}
