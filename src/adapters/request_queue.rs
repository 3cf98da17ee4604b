//! Bounded hand-off between the web collaborator and the domain.
//!
//! The HTTP side decodes each request and [`submit`](RequestQueue::submit)s
//! it, receiving a [`Ticket`]; the main loop drains the queue through
//! [`RequestPort`] and the answer is collected with
//! [`take_response_for`](RequestQueue::take_response_for).
//! Fixed capacity: a full queue rejects new requests instead of allocating.
//!
//! [`SharedRequestQueue`] wraps the queue for the HTTP server task, which
//! runs on its own thread and blocks until the main loop has answered.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use heapless::Deque;
use log::warn;

use crate::app::commands::{InboundRequest, Response};
use crate::app::ports::RequestPort;

pub const REQUEST_QUEUE_DEPTH: usize = 8;

/// Poll interval while a submitter waits for its answer.
const ANSWER_POLL: Duration = Duration::from_millis(5);

/// Identifies one submitted request and its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u32);

#[derive(Default)]
pub struct RequestQueue {
    pending: Deque<(Ticket, InboundRequest), REQUEST_QUEUE_DEPTH>,
    answered: Deque<(Ticket, Response), REQUEST_QUEUE_DEPTH>,
    next_ticket: u32,
    /// Ticket of the request handed out by the last `next_request`.
    in_service: Option<Ticket>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a decoded request.  Hands it back when the queue is full.
    pub fn submit(&mut self, request: InboundRequest) -> Result<Ticket, InboundRequest> {
        let ticket = Ticket(self.next_ticket);
        match self.pending.push_back((ticket, request)) {
            Ok(()) => {
                self.next_ticket = self.next_ticket.wrapping_add(1);
                Ok(ticket)
            }
            Err((_, request)) => {
                warn!("Requests: queue full, rejecting");
                Err(request)
            }
        }
    }

    /// Oldest unread answer, whoever asked.
    pub fn take_response(&mut self) -> Option<Response> {
        self.answered.pop_front().map(|(_, response)| response)
    }

    /// Answer for `ticket`, if the main loop has produced it.
    pub fn take_response_for(&mut self, ticket: Ticket) -> Option<Response> {
        if !self.answered.iter().any(|(t, _)| *t == ticket) {
            return None;
        }
        // Pull the match out, keeping the others in order.
        let mut kept = Deque::<(Ticket, Response), REQUEST_QUEUE_DEPTH>::new();
        let mut found = None;
        while let Some((t, response)) = self.answered.pop_front() {
            if found.is_none() && t == ticket {
                found = Some(response);
            } else {
                // Same capacity as the source, cannot overflow.
                let _ = kept.push_back((t, response));
            }
        }
        self.answered = kept;
        found
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl RequestPort for RequestQueue {
    fn next_request(&mut self) -> Option<InboundRequest> {
        let (ticket, request) = self.pending.pop_front()?;
        self.in_service = Some(ticket);
        Some(request)
    }

    fn respond(&mut self, response: Response) {
        let Some(ticket) = self.in_service.take() else {
            warn!("Requests: answer without a request in service, dropped");
            return;
        };
        if self.answered.is_full() {
            // Nobody collected the oldest answer.
            self.answered.pop_front();
        }
        // Cannot fail: a slot was freed above if needed.
        let _ = self.answered.push_back((ticket, response));
    }
}

/// [`RequestQueue`] shared between the HTTP server task and the main loop.
#[derive(Clone, Default)]
pub struct SharedRequestQueue {
    inner: Arc<Mutex<RequestQueue>>,
}

impl SharedRequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A panic while holding the lock cannot leave the queue half-updated,
    /// so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, RequestQueue> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Submit `request` and block until the main loop answers it or
    /// `timeout` elapses.  `None` means the queue was full or the answer
    /// did not arrive in time.
    pub fn submit_and_wait(&self, request: InboundRequest, timeout: Duration) -> Option<Response> {
        let ticket = self.lock().submit(request).ok()?;
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(response) = self.lock().take_response_for(ticket) {
                return Some(response);
            }
            if Instant::now() >= deadline {
                warn!("Requests: no answer within {} ms", timeout.as_millis());
                return None;
            }
            std::thread::sleep(ANSWER_POLL);
        }
    }

    pub fn pending(&self) -> usize {
        self.lock().pending()
    }
}

impl RequestPort for SharedRequestQueue {
    fn next_request(&mut self) -> Option<InboundRequest> {
        self.lock().next_request()
    }

    fn respond(&mut self, response: Response) {
        self.lock().respond(response);
    }
}
