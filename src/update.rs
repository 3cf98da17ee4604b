//! Wireless firmware update notifications.
//!
//! The transport (network listener, image writes, partition switch) lives
//! outside the node.  What the node sees is a stream of lifecycle events
//! polled from an [`UpdateChannelPort`] each main-loop iteration and fanned
//! out synchronously to the registered [`UpdateHandler`]s.
//!
//! Flow: `Start` → N × `Progress` → `End` | `Error`

use core::fmt;
use log::{info, warn};

/// Maximum events dispatched per [`UpdateNotifier::service`] call.
pub const MAX_EVENTS_PER_SERVICE: usize = 8;

// ── Events ────────────────────────────────────────────────────

/// What is being replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTarget {
    Firmware,
    Filesystem,
}

impl fmt::Display for UpdateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Firmware => write!(f, "sketch"),
            Self::Filesystem => write!(f, "filesystem"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError {
    Auth,
    Begin,
    Connect,
    Receive,
    End,
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth => write!(f, "Auth Failed"),
            Self::Begin => write!(f, "Begin Failed"),
            Self::Connect => write!(f, "Connect Failed"),
            Self::Receive => write!(f, "Receive Failed"),
            Self::End => write!(f, "End Failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEvent {
    Start(UpdateTarget),
    Progress { done: u32, total: u32 },
    End,
    Error(UpdateError),
}

/// Integer percentage of `done` over `total`; 0 when `total` is 0.
pub fn progress_percent(done: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (u64::from(done.min(total)) * 100) / u64::from(total);
    pct as u8
}

// ── Ports ─────────────────────────────────────────────────────

/// Observer of update lifecycle events.
pub trait UpdateHandler {
    fn on_update_event(&mut self, event: &UpdateEvent);
}

/// Source of update lifecycle events.  Must not block.
pub trait UpdateChannelPort {
    fn poll_event(&mut self) -> Option<UpdateEvent>;
}

// ── Notifier ──────────────────────────────────────────────────

/// Handler registry plus minimal session tracking.
#[derive(Default)]
pub struct UpdateNotifier {
    handlers: Vec<Box<dyn UpdateHandler>>,
    in_progress: bool,
}

impl UpdateNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handlers are invoked in registration order.
    pub fn register(&mut self, handler: Box<dyn UpdateHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// `true` between `Start` and `End`/`Error`.
    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Drain up to [`MAX_EVENTS_PER_SERVICE`] pending events.  Returns the
    /// number dispatched.
    pub fn service(&mut self, channel: &mut impl UpdateChannelPort) -> usize {
        let mut n = 0;
        while n < MAX_EVENTS_PER_SERVICE {
            let Some(event) = channel.poll_event() else {
                break;
            };
            self.dispatch(&event);
            n += 1;
        }
        n
    }

    pub fn dispatch(&mut self, event: &UpdateEvent) {
        match event {
            UpdateEvent::Start(target) => {
                if self.in_progress {
                    warn!("OTA: start ({}) while a session is already running", target);
                }
                self.in_progress = true;
            }
            UpdateEvent::End | UpdateEvent::Error(_) => self.in_progress = false,
            UpdateEvent::Progress { .. } => {}
        }
        for handler in &mut self.handlers {
            handler.on_update_event(event);
        }
    }
}

// ── Boot validation ───────────────────────────────────────────

/// Mark the running image valid so the bootloader does not roll back.
#[cfg(target_os = "espidf")]
pub fn check_rollback() {
    match esp_ota::mark_app_valid() {
        Ok(()) => info!("OTA: firmware marked valid (rollback cancelled)"),
        Err(e) => warn!("OTA: mark_app_valid failed: {:?}", e),
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn check_rollback() {
    info!("OTA rollback check (simulation): skipped");
}
