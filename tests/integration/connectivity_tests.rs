//! Integration tests for WiFi supervision driven through the node loop.

use boilernode::adapters::boiler_link::SimulatedBoiler;
use boilernode::adapters::nvs::NvsAdapter;
use boilernode::adapters::request_queue::RequestQueue;
use boilernode::adapters::update_channel::UpdateEventQueue;
use boilernode::adapters::wifi::WifiAdapter;
use boilernode::app::commands::{FormData, InboundRequest, Method, Response};
use boilernode::app::events::AppEvent;
use boilernode::config::{BoilerConfig, Credentials, NodeSettings};
use boilernode::node::{BoilerNode, NodePorts};
use boilernode::supervisor::WifiStatus;

use super::mock_hw::{ManualClock, MockWifi, RecordingSink};

struct Rig<W> {
    clock: ManualClock,
    boiler: SimulatedBoiler,
    wifi: W,
    store: NvsAdapter,
    requests: RequestQueue,
    updates: UpdateEventQueue,
    sink: RecordingSink,
    node: BoilerNode,
}

impl<W: boilernode::app::ports::ConnectivityPort> Rig<W> {
    fn new(wifi: W) -> Self {
        let config = BoilerConfig {
            credentials: Credentials::new("HomeNet", "hunter2hunter2").unwrap(),
            ..Default::default()
        };
        Self {
            clock: ManualClock::at(0),
            boiler: SimulatedBoiler::default(),
            wifi,
            store: NvsAdapter::new().unwrap(),
            requests: RequestQueue::new(),
            updates: UpdateEventQueue::new(),
            sink: RecordingSink::new(),
            node: BoilerNode::new(config, &NodeSettings::default(), 0),
        }
    }

    fn step_at(&mut self, now_ms: u32) {
        self.clock.set(now_ms);
        let mut ports = NodePorts {
            clock: &self.clock,
            link: &mut self.boiler,
            wifi: &mut self.wifi,
            store: &mut self.store,
            requests: &mut self.requests,
            updates: &mut self.updates,
            sink: &mut self.sink,
        };
        self.node.step(&mut ports);
    }

    fn status(&self) -> WifiStatus {
        self.node.supervisor().state().status
    }
}

fn change_credentials(ssid: &str, pass: &str) -> InboundRequest {
    InboundRequest::Config {
        method: Method::Post,
        form: FormData::new().with("ssid", ssid).with("pass", pass),
    }
}

#[test]
fn unreachable_network_cycles_back_to_idle() {
    let mut rig = Rig::new(MockWifi::new());
    rig.step_at(0);
    assert_eq!(rig.status(), WifiStatus::Connecting);

    let mut now = 0;
    for _ in 0..21 {
        now += 501;
        rig.step_at(now);
    }
    assert_eq!(rig.status(), WifiStatus::Idle);
    assert!(rig.sink.contains(&AppEvent::ConnectivityExhausted { attempts: 21 }));

    // Next poll starts a fresh attempt
    rig.step_at(now + 1);
    assert_eq!(rig.status(), WifiStatus::Connecting);
    assert_eq!(rig.node.supervisor().state().attempt_count, 0);
    assert_eq!(rig.wifi.begun_with.len(), 2);
}

#[test]
fn connects_when_access_point_appears() {
    let mut rig = Rig::new(MockWifi::new());
    rig.step_at(0);
    rig.step_at(600);
    rig.wifi.up = true;
    rig.step_at(700);
    assert_eq!(rig.status(), WifiStatus::Connected);
    assert_eq!(
        rig.sink.count(|e| *e == AppEvent::ConnectivityChanged(WifiStatus::Connected)),
        1
    );
}

#[test]
fn credential_change_forces_reconnect() {
    let mut rig = Rig::new(MockWifi::instant());
    rig.step_at(0);
    rig.step_at(10);
    assert_eq!(rig.status(), WifiStatus::Connected);

    rig.requests
        .submit(change_credentials("Garage", "0123456789"))
        .unwrap();
    rig.step_at(20);
    assert_eq!(rig.requests.take_response(), Some(Response::Redirect("/")));
    assert_eq!(rig.status(), WifiStatus::Idle);

    rig.step_at(30);
    assert_eq!(rig.wifi.begun_with, vec!["HomeNet".to_owned(), "Garage".to_owned()]);
    rig.step_at(40);
    assert_eq!(rig.status(), WifiStatus::Connected);
}

#[test]
fn unchanged_credentials_keep_connection() {
    let mut rig = Rig::new(MockWifi::instant());
    rig.step_at(0);
    rig.step_at(10);

    rig.requests
        .submit(change_credentials("HomeNet", "hunter2hunter2"))
        .unwrap();
    rig.step_at(20);
    rig.step_at(30);

    assert_eq!(rig.status(), WifiStatus::Connected);
    assert_eq!(rig.wifi.begun_with.len(), 1);
}

#[test]
fn lost_link_reconnects_with_simulated_driver() {
    let mut rig = Rig::new(WifiAdapter::new());
    rig.step_at(0);
    rig.step_at(10);
    assert_eq!(rig.status(), WifiStatus::Connected);

    rig.wifi.set_reachable(false);
    rig.step_at(20);
    assert_eq!(rig.status(), WifiStatus::Connecting);

    rig.wifi.set_reachable(true);
    rig.step_at(30);
    // Association was dropped; the next fresh connect happens only after
    // the retry budget runs out, so the station stays connecting here.
    assert_eq!(rig.status(), WifiStatus::Connecting);
    assert_eq!(rig.wifi.begin_count(), 2);
}
