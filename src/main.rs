//! Boiler node firmware: main entry point.
//!
//! Hexagonal architecture with a single cooperative main loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  BoilerLinkAdapter  LogEventSink   NvsAdapter   Esp32Time      │
//! │  (BoilerLink)       (EventSink)    (Config+NVS) (TimePort)     │
//! │  WifiAdapter        HttpServer ──▶ SharedRequestQueue          │
//! │  (Connectivity)                    (Requests)                  │
//! │  UpdateEventQueue                                              │
//! │  (Update channel)                                              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  BoilerNode: TickScheduler · BoilerService (PID)       │    │
//! │  │              ConnectivitySupervisor · UpdateNotifier   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::EspWifi;
use log::{info, warn};

use boilernode::adapters::boiler_link::{BoilerLinkAdapter, report_link_activity};
use boilernode::adapters::log_sink::{LogEventSink, LogUpdateHandler};
use boilernode::adapters::nvs::NvsAdapter;
use boilernode::adapters::http::HttpServerAdapter;
use boilernode::adapters::request_queue::SharedRequestQueue;
use boilernode::adapters::time::Esp32TimeAdapter;
use boilernode::adapters::update_channel::UpdateEventQueue;
use boilernode::adapters::wifi::WifiAdapter;
use boilernode::app::ports::{ConfigPort, TimePort};
use boilernode::config::{BoilerConfig, NodeSettings};
use boilernode::node::{BoilerNode, NodePorts};
use boilernode::update;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  BoilerNode v{}                   ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 1b. OTA rollback check ────────────────────────────────
    update::check_rollback();

    let settings = NodeSettings::default();

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            BoilerConfig::default()
        }
    };

    // ── 3. Construct adapters ─────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let mut wifi = WifiAdapter::new(EspWifi::new(peripherals.modem, sysloop, None)?);
    wifi.start_access_point(&settings.access_point);

    let mut link = BoilerLinkAdapter::new()?;
    let clock = Esp32TimeAdapter::new();
    let mut requests = SharedRequestQueue::new();
    let _http = HttpServerAdapter::start(&requests, settings.http_port)?;
    let mut updates = UpdateEventQueue::new();
    let mut log_sink = LogEventSink::new();

    info!(
        "Update listener: {}:{} (transport external)",
        settings.update.hostname, settings.update.port
    );

    // ── 4. Construct the node ─────────────────────────────────
    let mut node = BoilerNode::new(config, &settings, clock.now_ms());
    node.register_update_handler(Box::new(LogUpdateHandler::new()));
    node.start(&mut log_sink);

    let mut ports = NodePorts {
        clock: &clock,
        link: &mut link,
        wifi: &mut wifi,
        store: &mut nvs,
        requests: &mut requests,
        updates: &mut updates,
        sink: &mut log_sink,
    };

    info!("System ready. Entering main loop.");

    // ── 5. Main loop ──────────────────────────────────────────
    loop {
        let summary = node.step(&mut ports);
        if summary.cycle.is_some() {
            report_link_activity(ports.link.expects_edges());
        }
        // Yield to the idle task so the task watchdog stays fed.
        FreeRtos::delay_ms(1);
    }
}
