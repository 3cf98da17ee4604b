//! Update-channel event queue.
//!
//! The update listener pushes lifecycle events as they happen; the main
//! loop drains them through [`UpdateChannelPort`].  Progress events are
//! coalesced when the queue is full so `Start`/`End`/`Error` are never lost.

use heapless::Deque;
use log::warn;

use crate::update::{UpdateChannelPort, UpdateEvent};

pub const UPDATE_QUEUE_DEPTH: usize = 16;

#[derive(Default)]
pub struct UpdateEventQueue {
    events: Deque<UpdateEvent, UPDATE_QUEUE_DEPTH>,
}

impl UpdateEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event.  Returns `false` if it had to be dropped.
    pub fn push(&mut self, event: UpdateEvent) -> bool {
        if self.events.is_full() {
            if let (UpdateEvent::Progress { .. }, Some(UpdateEvent::Progress { .. })) =
                (event, self.events.back())
            {
                self.events.pop_back();
            } else {
                warn!("OTA: event queue full, dropping {:?}", event);
                return false;
            }
        }
        self.events.push_back(event).is_ok()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl UpdateChannelPort for UpdateEventQueue {
    fn poll_event(&mut self) -> Option<UpdateEvent> {
        self.events.pop_front()
    }
}
