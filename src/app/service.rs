//! Application service: the hexagonal core.
//!
//! [`BoilerService`] owns the live configuration, the control state and
//! the PID controller.  It exposes a hardware-agnostic API; all I/O flows
//! through port traits injected at call sites, so the whole service is
//! testable with mock adapters.
//!
//! ```text
//!  RequestPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                  │      BoilerService     │
//! BoilerLinkPort ◀─│  Config · State · PID  │──▶ ConfigPort
//!                  └────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::{BoilerConfig, Credentials, NodeSettings};
use crate::control::pid::PidController;
use crate::error::LinkStep;
use crate::supervisor::ConnectivityState;

use super::commands::{FormData, InboundRequest, Method, Response, field, parse_decimal};
use super::events::{AppEvent, CycleReport};
use super::ports::{BoilerLinkPort, ConfigPort, EventSink, LinkStatus, StatusRequest};
use super::state::{ControlState, StatusReport};

/// Result of servicing one inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct Handled {
    pub response: Response,
    /// The station credentials were replaced; the caller must force the
    /// connectivity supervisor back to idle.
    pub credentials_changed: bool,
}

impl Handled {
    fn respond(response: Response) -> Self {
        Self {
            response,
            credentials_changed: false,
        }
    }
}

/// The application service orchestrates all domain logic.
pub struct BoilerService {
    config: BoilerConfig,
    state: ControlState,
    pid: PidController,
    cycle_count: u64,
}

impl BoilerService {
    /// Construct the service from the loaded configuration.
    pub fn new(config: BoilerConfig, settings: &NodeSettings) -> Self {
        let state = ControlState::new(config.desired_temp);
        Self {
            config,
            state,
            pid: PidController::new(settings.pid),
            cycle_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        info!(
            "BoilerService started: desired {:.1} C, manual override {}",
            self.config.desired_temp, self.config.manual_boiler_temp
        );
        sink.emit(&AppEvent::Started {
            desired_temp: self.config.desired_temp,
            manual: self.config.manual_boiler_temp,
        });
    }

    // ── Control cycle ─────────────────────────────────────────

    /// Run one control cycle: status exchange → command → send → read back.
    ///
    /// A failed exchange is recorded and reported but never aborts the
    /// cycle; the next tick simply tries again.
    pub fn run_cycle(&mut self, link: &mut impl BoilerLinkPort, sink: &mut impl EventSink) -> CycleReport {
        self.cycle_count += 1;

        // 1. Status exchange
        let request = StatusRequest {
            central_heating: self.config.central_heating,
            hot_water: self.config.hot_water,
            cooling: self.config.cooling,
        };
        let (activity, status_link) = link.set_status(request);
        self.state.activity = activity;
        if status_link != LinkStatus::Success {
            warn!("Cycle {}: status exchange failed", self.cycle_count);
            sink.emit(&AppEvent::LinkFailure(LinkStep::SetStatus));
        }

        // 2. Commanded water temperature
        let manual = self.config.manual_boiler_temp;
        let commanded = if manual {
            self.config.desired_boiler_temp
        } else {
            let dt = self.state.sample_dt_secs();
            self.pid.compute(
                self.state.desired_room_temp,
                self.state.external_room_temp,
                self.state.prior_external_room_temp,
                &mut self.state.integral_error,
                dt,
            )
        };
        self.state.commanded_boiler_temp = commanded;

        // 3. Send it
        let accepted = link.set_temperature(commanded);
        self.state.last_command_accepted = accepted;
        if !accepted {
            warn!("Cycle {}: boiler rejected setpoint {:.2}", self.cycle_count, commanded);
            sink.emit(&AppEvent::LinkFailure(LinkStep::SetTemperature));
        }

        // 4. Read back; keep the previous reading if the exchange failed
        let actual = link.get_temperature();
        if link.last_status() == LinkStatus::Success {
            self.state.actual_boiler_temp = actual;
        } else {
            sink.emit(&AppEvent::LinkFailure(LinkStep::ReadTemperature));
        }
        self.state.last_link_status = link.last_status();

        let report = CycleReport {
            commanded_boiler_temp: commanded,
            actual_boiler_temp: self.state.actual_boiler_temp,
            manual,
            activity,
            status_link,
            command_accepted: accepted,
        };
        sink.emit(&AppEvent::CycleCompleted(report));
        report
    }

    // ── Inbound requests ──────────────────────────────────────

    /// Service one request from the configuration page.
    pub fn handle_request(
        &mut self,
        request: InboundRequest,
        now_ms: u32,
        connectivity: &ConnectivityState,
        store: &mut impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> Handled {
        match request {
            InboundRequest::Config {
                method: Method::Post,
                form,
            } => self.apply_form(&form, now_ms, connectivity, store, sink),
            InboundRequest::Config { .. } | InboundRequest::Status => {
                Handled::respond(Response::Status(self.status(connectivity, now_ms)))
            }
            InboundRequest::Telemetry {
                method: Method::Post,
                form,
            } => match form.value(field::TEMP) {
                Some(raw) => {
                    let celsius = parse_decimal(raw);
                    self.state.record_external_temp(celsius, now_ms);
                    sink.emit(&AppEvent::TelemetryReceived { celsius });
                    Handled::respond(Response::Ok)
                }
                None => {
                    warn!("Telemetry: missing '{}' field", field::TEMP);
                    Handled::respond(Response::BadRequest)
                }
            },
            InboundRequest::Telemetry { method: Method::Get, .. } => {
                warn!("Telemetry: GET is not accepted");
                Handled::respond(Response::BadRequest)
            }
        }
    }

    fn apply_form(
        &mut self,
        form: &FormData,
        now_ms: u32,
        connectivity: &ConnectivityState,
        store: &mut impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> Handled {
        let mut next = self.config.clone();
        let mut applied = false;

        if let (Some(ssid), Some(pass)) = (form.value(field::SSID), form.value(field::PASS)) {
            match Credentials::new(ssid, pass) {
                Ok(credentials) => {
                    next.credentials = credentials;
                    applied = true;
                }
                Err(e) => {
                    warn!("Config: credentials rejected: {}", e);
                    return Handled::respond(Response::BadRequest);
                }
            }
        }

        if let Some(desired) = form.value(field::DESIRED_TEMP) {
            next.desired_temp = parse_decimal(desired);
            next.desired_boiler_temp = form.value(field::BOILER_TEMP).map_or(0.0, parse_decimal);
            next.central_heating = form.flag(field::HEAT);
            next.hot_water = form.flag(field::WATER);
            next.cooling = form.flag(field::COOLING);
            next.manual_boiler_temp = form.flag(field::MANUAL);
            applied = true;
        }

        if !applied {
            return Handled::respond(Response::Status(self.status(connectivity, now_ms)));
        }

        let credentials_changed = next.credentials != self.config.credentials;
        self.replace_config(next);

        let response = match store.save(&self.config) {
            Ok(()) => {
                sink.emit(&AppEvent::ConfigApplied { credentials_changed });
                Response::Redirect("/")
            }
            Err(e) => {
                warn!("Config: persist failed: {}", e);
                sink.emit(&AppEvent::ConfigSaveFailed(e));
                Response::InternalError
            }
        };
        Handled {
            response,
            credentials_changed,
        }
    }

    /// Swap in a new configuration wholesale.
    pub fn replace_config(&mut self, config: BoilerConfig) {
        self.state.desired_room_temp = config.desired_temp;
        self.config = config;
        info!(
            "Config: desired {:.1} C, heat={} water={} cooling={} manual={} ({:.1} C)",
            self.config.desired_temp,
            self.config.central_heating,
            self.config.hot_water,
            self.config.cooling,
            self.config.manual_boiler_temp,
            self.config.desired_boiler_temp
        );
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self, connectivity: &ConnectivityState, now_ms: u32) -> StatusReport {
        StatusReport::build(&self.state, &self.config, connectivity, now_ms)
    }

    pub fn config(&self) -> &BoilerConfig {
        &self.config
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    /// Control cycles executed since startup.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }
}
