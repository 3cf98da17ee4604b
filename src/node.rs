//! One iteration of the node's cooperative main loop.
//!
//! ```text
//!   TimePort ──▶ TickScheduler ──due──▶ BoilerService::run_cycle ──▶ BoilerLinkPort
//!            ──▶ ConnectivitySupervisor::poll ──────────────────────▶ ConnectivityPort
//!            ──▶ RequestPort ──▶ BoilerService::handle_request ─────▶ ConfigPort
//!            ──▶ UpdateChannelPort ──▶ UpdateNotifier ──────────────▶ UpdateHandler*
//! ```
//!
//! Every stage does bounded work and returns; [`BoilerNode::step`] never
//! blocks, so the binary only needs to call it in a loop with a short yield.

use log::info;

use crate::app::events::CycleReport;
use crate::app::ports::{BoilerLinkPort, ConfigPort, ConnectivityPort, EventSink, RequestPort, TimePort};
use crate::app::service::BoilerService;
use crate::config::{BoilerConfig, NodeSettings};
use crate::scheduler::TickScheduler;
use crate::supervisor::ConnectivitySupervisor;
use crate::update::{UpdateChannelPort, UpdateHandler, UpdateNotifier};

/// Maximum inbound requests serviced per step.
pub const MAX_REQUESTS_PER_STEP: usize = 4;

/// Everything the node talks to, injected per step.
pub struct NodePorts<'a, C, L, W, S, R, U, E> {
    pub clock: &'a C,
    pub link: &'a mut L,
    pub wifi: &'a mut W,
    pub store: &'a mut S,
    pub requests: &'a mut R,
    pub updates: &'a mut U,
    pub sink: &'a mut E,
}

/// What happened during one [`BoilerNode::step`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepSummary {
    /// Present when a control cycle ran.
    pub cycle: Option<CycleReport>,
    pub wifi_connected: bool,
    pub requests_handled: usize,
    pub update_events: usize,
}

pub struct BoilerNode {
    scheduler: TickScheduler,
    service: BoilerService,
    supervisor: ConnectivitySupervisor,
    notifier: UpdateNotifier,
}

impl BoilerNode {
    pub fn new(config: BoilerConfig, settings: &NodeSettings, now_ms: u32) -> Self {
        Self {
            scheduler: TickScheduler::new(settings.tick_period_ms, now_ms),
            service: BoilerService::new(config, settings),
            supervisor: ConnectivitySupervisor::new(settings.connectivity),
            notifier: UpdateNotifier::new(),
        }
    }

    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.service.start(sink);
        info!(
            "Node ready: tick every {} ms, {} update handler(s)",
            self.scheduler.period_ms(),
            self.notifier.handler_count()
        );
    }

    pub fn register_update_handler(&mut self, handler: Box<dyn UpdateHandler>) {
        self.notifier.register(handler);
    }

    /// Run one main-loop iteration.
    pub fn step<C, L, W, S, R, U, E>(&mut self, ports: &mut NodePorts<'_, C, L, W, S, R, U, E>) -> StepSummary
    where
        C: TimePort,
        L: BoilerLinkPort,
        W: ConnectivityPort,
        S: ConfigPort,
        R: RequestPort,
        U: UpdateChannelPort,
        E: EventSink,
    {
        let mut summary = StepSummary::default();

        // 1. Control tick
        if self.scheduler.poll(ports.clock.now_ms()) {
            summary.cycle = Some(self.service.run_cycle(ports.link, ports.sink));
        }

        // 2. Connectivity
        summary.wifi_connected = self.supervisor.poll(
            ports.clock.now_ms(),
            ports.wifi,
            &self.service.config().credentials,
            ports.sink,
        );

        // 3. Inbound requests
        while summary.requests_handled < MAX_REQUESTS_PER_STEP {
            let Some(request) = ports.requests.next_request() else {
                break;
            };
            let handled = self.service.handle_request(
                request,
                ports.clock.now_ms(),
                self.supervisor.state(),
                ports.store,
                ports.sink,
            );
            if handled.credentials_changed {
                self.supervisor.force_idle();
            }
            ports.requests.respond(handled.response);
            summary.requests_handled += 1;
        }

        // 4. Update channel
        summary.update_events = self.notifier.service(ports.updates);

        summary
    }

    pub fn service(&self) -> &BoilerService {
        &self.service
    }

    pub fn supervisor(&self) -> &ConnectivitySupervisor {
        &self.supervisor
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    pub fn update_in_progress(&self) -> bool {
        self.notifier.is_in_progress()
    }
}
