//! Fixed-period control tick scheduler.
//!
//! The main loop polls [`TickScheduler::poll`] every iteration with the
//! current monotonic time; when more than one period has elapsed since the
//! last tick it reports "due" and the caller runs one control cycle.
//!
//! ```text
//!   last_tick ──────────── period ────────────▶│ due
//!   ──┬──────────────────────────────────────────┬──▶ now
//!     │◀────── elapsed (wrapping u32 ms) ──────▶│
//! ```
//!
//! Missed ticks are **not** caught up: after a long stall the next poll
//! fires once and the period restarts from `now`.  The boiler only ever
//! needs the latest setpoint, so replaying old ticks has no value.

use log::debug;

pub struct TickScheduler {
    period_ms: u32,
    last_tick_ms: u32,
    ticks: u64,
}

impl TickScheduler {
    /// First tick is due one period after `now_ms`.
    pub fn new(period_ms: u32, now_ms: u32) -> Self {
        Self {
            period_ms,
            last_tick_ms: now_ms,
            ticks: 0,
        }
    }

    /// `true` if a control cycle is due; records the tick when it is.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        let elapsed = now_ms.wrapping_sub(self.last_tick_ms);
        if elapsed <= self.period_ms {
            return false;
        }
        if elapsed > self.period_ms.saturating_mul(2) {
            debug!("Scheduler: {} ms since last tick, skipping missed ticks", elapsed);
        }
        self.last_tick_ms = now_ms;
        self.ticks += 1;
        true
    }

    /// Ticks fired since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }
}
