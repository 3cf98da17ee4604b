//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production), and
//! [`UpdateHandler`] for wireless update progress.
//! A dashboard or MQTT adapter would implement the same traits.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, LinkStatus};
use crate::error::Error;
use crate::update::{UpdateEvent, UpdateHandler, progress_percent};

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events logged so far.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            AppEvent::Started { desired_temp, manual } => {
                info!("START | desired={:.1}\u{00b0}C manual={}", desired_temp, manual);
            }
            AppEvent::CycleCompleted(r) => {
                info!(
                    "CYCLE | cmd={:.2}\u{00b0}C{} actual={:.2}\u{00b0}C | CH={} DHW={} cool={} flame={} | \
                     status={} accepted={}",
                    r.commanded_boiler_temp,
                    if r.manual { " (manual)" } else { "" },
                    r.actual_boiler_temp,
                    r.activity.central_heating,
                    r.activity.hot_water,
                    r.activity.cooling,
                    r.activity.flame,
                    if r.status_link == LinkStatus::Success { "OK" } else { "FAIL" },
                    r.command_accepted,
                );
            }
            AppEvent::LinkFailure(_) => {
                if let Some(e) = event.error() {
                    warn!("LINK | {}", e);
                }
            }
            AppEvent::ConnectivityChanged(status) => {
                info!("WIFI | {:?}", status);
            }
            AppEvent::ConnectivityExhausted { attempts } => {
                warn!("WIFI | gave up after {} checks, restarting", attempts);
            }
            AppEvent::ConfigApplied { credentials_changed } => {
                info!("CONFIG | saved, credentials_changed={}", credentials_changed);
            }
            AppEvent::ConfigSaveFailed(_) => {
                if let Some(e) = event.error() {
                    error!("CONFIG | not persisted: {}", e);
                }
            }
            AppEvent::TelemetryReceived { celsius } => {
                info!("TELEM | room={:.2}\u{00b0}C", celsius);
            }
        }
    }
}

/// Update-channel handler that logs progress as a percentage.
#[derive(Default)]
pub struct LogUpdateHandler {
    last_percent: Option<u8>,
}

impl LogUpdateHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UpdateHandler for LogUpdateHandler {
    fn on_update_event(&mut self, event: &UpdateEvent) {
        match event {
            UpdateEvent::Start(target) => {
                self.last_percent = None;
                info!("OTA | start updating {}", target);
            }
            UpdateEvent::Progress { done, total } => {
                let pct = progress_percent(*done, *total);
                if self.last_percent != Some(pct) {
                    self.last_percent = Some(pct);
                    info!("OTA | progress {}%", pct);
                }
            }
            UpdateEvent::End => info!("OTA | end"),
            UpdateEvent::Error(e) => error!("OTA | {}", Error::from(*e)),
        }
    }
}
