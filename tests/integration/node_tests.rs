//! Integration tests for the full main-loop step with simulated adapters.

use std::cell::RefCell;
use std::rc::Rc;

use boilernode::adapters::boiler_link::SimulatedBoiler;
use boilernode::adapters::log_sink::LogUpdateHandler;
use boilernode::adapters::nvs::NvsAdapter;
use boilernode::adapters::request_queue::RequestQueue;
use boilernode::adapters::update_channel::UpdateEventQueue;
use boilernode::adapters::wifi::WifiAdapter;
use boilernode::app::commands::{FormData, InboundRequest, Method, Response};
use boilernode::app::events::AppEvent;
use boilernode::app::ports::{ConfigPort, TimePort};
use boilernode::config::{BoilerConfig, Credentials, NodeSettings};
use boilernode::node::{BoilerNode, MAX_REQUESTS_PER_STEP, NodePorts, StepSummary};
use boilernode::update::{MAX_EVENTS_PER_SERVICE, UpdateEvent, UpdateHandler, UpdateTarget};

use super::mock_hw::{ManualClock, RecordingSink};

struct Rig {
    clock: ManualClock,
    boiler: SimulatedBoiler,
    wifi: WifiAdapter,
    store: NvsAdapter,
    requests: RequestQueue,
    updates: UpdateEventQueue,
    sink: RecordingSink,
    node: BoilerNode,
}

impl Rig {
    fn new(config: BoilerConfig, start_ms: u32) -> Self {
        let mut rig = Self {
            clock: ManualClock::at(start_ms),
            boiler: SimulatedBoiler::default(),
            wifi: WifiAdapter::new(),
            store: NvsAdapter::new().unwrap(),
            requests: RequestQueue::new(),
            updates: UpdateEventQueue::new(),
            sink: RecordingSink::new(),
            node: BoilerNode::new(config, &NodeSettings::default(), start_ms),
        };
        rig.node.start(&mut rig.sink);
        rig
    }

    fn step(&mut self) -> StepSummary {
        let mut ports = NodePorts {
            clock: &self.clock,
            link: &mut self.boiler,
            wifi: &mut self.wifi,
            store: &mut self.store,
            requests: &mut self.requests,
            updates: &mut self.updates,
            sink: &mut self.sink,
        };
        self.node.step(&mut ports)
    }

    fn step_at(&mut self, now_ms: u32) -> StepSummary {
        self.clock.set(now_ms);
        self.step()
    }
}

#[test]
fn start_emits_started_event() {
    let rig = Rig::new(BoilerConfig::default(), 0);
    assert!(rig.sink.contains(&AppEvent::Started {
        desired_temp: 22.0,
        manual: false,
    }));
}

#[test]
fn cycle_runs_once_per_period() {
    let mut rig = Rig::new(BoilerConfig::default(), 0);
    assert!(rig.step_at(500).cycle.is_none());
    assert!(rig.step_at(1_000).cycle.is_none());
    assert!(rig.step_at(1_001).cycle.is_some());
    assert!(rig.step_at(1_500).cycle.is_none());
    assert!(rig.step_at(2_002).cycle.is_some());
    assert_eq!(rig.node.service().cycle_count(), 2);
}

#[test]
fn missed_ticks_are_not_replayed() {
    let mut rig = Rig::new(BoilerConfig::default(), 0);
    assert!(rig.step_at(30_000).cycle.is_some());
    assert!(rig.step().cycle.is_none());
    assert!(rig.step_at(30_500).cycle.is_none());
    assert_eq!(rig.node.scheduler().ticks(), 1);
}

#[test]
fn ticks_across_clock_wrap() {
    let mut rig = Rig::new(BoilerConfig::default(), u32::MAX - 400);
    assert!(rig.step_at(u32::MAX).cycle.is_none());
    assert!(rig.step_at(600).cycle.is_some());
    assert_eq!(rig.clock.now_ms(), 600);
}

#[test]
fn requests_are_bounded_per_step() {
    let mut rig = Rig::new(BoilerConfig::default(), 0);
    for _ in 0..6 {
        rig.requests.submit(InboundRequest::Status).unwrap();
    }
    assert_eq!(rig.step().requests_handled, MAX_REQUESTS_PER_STEP);
    assert_eq!(rig.requests.pending(), 2);
    assert_eq!(rig.step().requests_handled, 2);
    for _ in 0..6 {
        assert!(matches!(rig.requests.take_response(), Some(Response::Status(_))));
    }
}

#[test]
fn manual_override_reaches_the_boiler() {
    let mut rig = Rig::new(BoilerConfig::default(), 0);
    rig.requests
        .submit(InboundRequest::Config {
            method: Method::Post,
            form: FormData::new()
                .with("desiredTemp", "21")
                .with("boilerTemp", "45.0")
                .with("heat", "on")
                .with("manual", "on"),
        })
        .unwrap();
    rig.step_at(10);
    assert_eq!(rig.requests.take_response(), Some(Response::Redirect("/")));

    let first = rig.step_at(1_100).cycle.unwrap();
    assert_eq!(first.commanded_boiler_temp, 45.0);
    assert!(first.manual);
    assert_eq!(rig.boiler.setpoint(), 45.0);

    // Status is exchanged before the new setpoint lands, so the flame shows
    // up one cycle later.
    let second = rig.step_at(2_200).cycle.unwrap();
    assert!(second.activity.flame);
    assert!(second.actual_boiler_temp > 20.0);
}

#[test]
fn config_survives_restart() {
    let mut rig = Rig::new(BoilerConfig::default(), 0);
    rig.requests
        .submit(InboundRequest::Config {
            method: Method::Post,
            form: FormData::new()
                .with("ssid", "Cellar")
                .with("pass", "")
                .with("desiredTemp", "19,5")
                .with("water", "on"),
        })
        .unwrap();
    rig.step_at(10);

    let reloaded = rig.store.load().unwrap();
    assert_eq!(&reloaded, rig.node.service().config());
    assert_eq!(reloaded.desired_temp, 19.5);
    assert!(reloaded.hot_water);
    // Empty password means the credentials block was skipped
    assert_eq!(reloaded.credentials, Credentials::default());

    let restarted = BoilerNode::new(reloaded, &NodeSettings::default(), 0);
    assert_eq!(restarted.service().state().desired_room_temp, 19.5);
}

#[test]
fn telemetry_drives_pid_output() {
    let mut rig = Rig::new(BoilerConfig::default(), 0);
    for (t, temp) in [(100, "19.5"), (5_100, "20.0")] {
        rig.requests
            .submit(InboundRequest::Telemetry {
                method: Method::Post,
                form: FormData::new().with("temp", temp),
            })
            .unwrap();
        rig.step_at(t);
    }
    // The cycle at t=5100 ran on a single sample: proportional term only
    assert_eq!(rig.node.service().state().integral_error, 0.0);
    assert_eq!(rig.node.service().state().commanded_boiler_temp, 30.0);

    let cycle = rig.step_at(6_200).cycle.unwrap();
    assert!((cycle.commanded_boiler_temp - 25.2).abs() < 1e-4);
    assert!((rig.node.service().state().integral_error - 2.4).abs() < 1e-5);
}

struct Counter(Rc<RefCell<Vec<UpdateEvent>>>);

impl UpdateHandler for Counter {
    fn on_update_event(&mut self, event: &UpdateEvent) {
        self.0.borrow_mut().push(*event);
    }
}

#[test]
fn update_events_reach_handlers_in_bounded_batches() {
    let mut rig = Rig::new(BoilerConfig::default(), 0);
    let seen = Rc::new(RefCell::new(Vec::new()));
    rig.node.register_update_handler(Box::new(LogUpdateHandler::new()));
    rig.node.register_update_handler(Box::new(Counter(seen.clone())));

    rig.updates.push(UpdateEvent::Start(UpdateTarget::Firmware));
    for i in 1..=10 {
        rig.updates.push(UpdateEvent::Progress { done: i * 10, total: 100 });
    }
    rig.updates.push(UpdateEvent::End);

    assert_eq!(rig.step().update_events, MAX_EVENTS_PER_SERVICE);
    assert!(rig.node.update_in_progress());
    assert_eq!(rig.step().update_events, 12 - MAX_EVENTS_PER_SERVICE);
    assert!(!rig.node.update_in_progress());
    assert_eq!(seen.borrow().len(), 12);
    assert_eq!(seen.borrow()[0], UpdateEvent::Start(UpdateTarget::Firmware));
}
