//! Integration tests for configuration-page requests: form handling,
//! telemetry ingestion, persistence and the status view.

use boilernode::adapters::nvs::NvsAdapter;
use boilernode::app::commands::{FormData, InboundRequest, Method, Response};
use boilernode::app::events::AppEvent;
use boilernode::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use boilernode::app::service::{BoilerService, Handled};
use boilernode::config::{BoilerConfig, Credentials, NodeSettings};
use boilernode::supervisor::ConnectivityState;

use super::mock_hw::RecordingSink;

struct Harness {
    svc: BoilerService,
    store: NvsAdapter,
    sink: RecordingSink,
}

impl Harness {
    fn new() -> Self {
        Self {
            svc: BoilerService::new(BoilerConfig::default(), &NodeSettings::default()),
            store: NvsAdapter::new().unwrap(),
            sink: RecordingSink::new(),
        }
    }

    fn send(&mut self, request: InboundRequest, now_ms: u32) -> Handled {
        self.svc.handle_request(
            request,
            now_ms,
            &ConnectivityState::default(),
            &mut self.store,
            &mut self.sink,
        )
    }

    fn post_config(&mut self, form: FormData) -> Handled {
        self.send(InboundRequest::Config { method: Method::Post, form }, 0)
    }

    fn post_temp(&mut self, raw: &str, now_ms: u32) -> Handled {
        self.send(
            InboundRequest::Telemetry {
                method: Method::Post,
                form: FormData::new().with("temp", raw),
            },
            now_ms,
        )
    }
}

fn settings_form() -> FormData {
    FormData::new()
        .with("desiredTemp", "20,5")
        .with("boilerTemp", "48")
        .with("heat", "on")
        .with("manual", "on")
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_accepts_comma_decimal() {
    let mut h = Harness::new();
    assert_eq!(h.post_temp("21,5", 1_000).response, Response::Ok);
    assert_eq!(h.svc.state().external_room_temp, 21.5);
    assert_eq!(h.svc.state().external_temp_timestamp, Some(1_000));
    assert!(h.sink.contains(&AppEvent::TelemetryReceived { celsius: 21.5 }));
}

#[test]
fn telemetry_garbage_becomes_zero() {
    let mut h = Harness::new();
    assert_eq!(h.post_temp("abc", 1_000).response, Response::Ok);
    assert_eq!(h.svc.state().external_room_temp, 0.0);
}

#[test]
fn telemetry_shifts_previous_sample() {
    let mut h = Harness::new();
    h.post_temp("19.0", 1_000);
    h.post_temp("19.5", 4_000);
    let s = h.svc.state();
    assert_eq!(s.prior_external_room_temp, 19.0);
    assert_eq!(s.prior_external_temp_timestamp, Some(1_000));
    assert_eq!(s.sample_dt_secs(), 3.0);
}

#[test]
fn telemetry_rejects_get_and_missing_field() {
    let mut h = Harness::new();
    let get = h.send(
        InboundRequest::Telemetry {
            method: Method::Get,
            form: FormData::new().with("temp", "20"),
        },
        0,
    );
    assert_eq!(get.response, Response::BadRequest);
    assert_eq!(h.post_temp("", 0).response, Response::BadRequest);
    assert_eq!(h.svc.state().external_temp_timestamp, None);
}

// ── Configuration form ────────────────────────────────────────

#[test]
fn settings_update_persists_and_reloads() {
    let mut h = Harness::new();
    let handled = h.post_config(settings_form());
    assert_eq!(handled.response, Response::Redirect("/"));
    assert!(!handled.credentials_changed);

    let cfg = h.svc.config().clone();
    assert_eq!(cfg.desired_temp, 20.5);
    assert_eq!(cfg.desired_boiler_temp, 48.0);
    assert!(cfg.central_heating);
    assert!(!cfg.hot_water);
    assert!(!cfg.cooling);
    assert!(cfg.manual_boiler_temp);
    assert_eq!(h.svc.state().desired_room_temp, 20.5);

    assert_eq!(h.store.load().unwrap(), cfg);
    assert!(h.sink.contains(&AppEvent::ConfigApplied { credentials_changed: false }));
}

#[test]
fn empty_boiler_temp_becomes_zero() {
    let mut h = Harness::new();
    h.post_config(FormData::new().with("desiredTemp", "21"));
    assert_eq!(h.svc.config().desired_boiler_temp, 0.0);
    assert!(!h.svc.config().central_heating);
}

#[test]
fn credentials_update_reports_change() {
    let mut h = Harness::new();
    let handled = h.post_config(FormData::new().with("ssid", "Attic").with("pass", "correcthorse"));
    assert_eq!(handled.response, Response::Redirect("/"));
    assert!(handled.credentials_changed);
    assert_eq!(h.svc.config().credentials, Credentials::new("Attic", "correcthorse").unwrap());
    // Settings block untouched
    assert_eq!(h.svc.config().desired_temp, 22.0);

    let again = h.post_config(FormData::new().with("ssid", "Attic").with("pass", "correcthorse"));
    assert!(!again.credentials_changed);
}

#[test]
fn credentials_need_both_fields() {
    let mut h = Harness::new();
    let handled = h.post_config(FormData::new().with("ssid", "Attic"));
    assert!(matches!(handled.response, Response::Status(_)));
    assert!(!handled.credentials_changed);
    assert!(!h.svc.config().credentials.is_configured());
}

#[test]
fn invalid_credentials_are_rejected_without_saving() {
    let mut h = Harness::new();
    let handled = h.post_config(
        FormData::new()
            .with("ssid", "Attic")
            .with("pass", "this-password-is-longer-than-24")
            .with("desiredTemp", "18"),
    );
    assert_eq!(handled.response, Response::BadRequest);
    assert_eq!(h.svc.config(), &BoilerConfig::default());
    assert_eq!(
        h.store.read("boiler", "cfg", &mut [0u8; 64]),
        Err(StorageError::NotFound)
    );
}

#[test]
fn get_shows_status_without_mutation() {
    let mut h = Harness::new();
    let handled = h.send(
        InboundRequest::Config {
            method: Method::Get,
            form: settings_form(),
        },
        0,
    );
    assert!(matches!(handled.response, Response::Status(_)));
    assert_eq!(h.svc.config(), &BoilerConfig::default());
}

#[test]
fn save_failure_answers_internal_error() {
    let mut h = Harness::new();
    h.store.set_fail_writes(true);
    let handled = h.post_config(settings_form());
    assert_eq!(handled.response, Response::InternalError);
    assert_eq!(h.svc.config().desired_temp, 20.5);
    assert!(h.sink.contains(&AppEvent::ConfigSaveFailed(ConfigError::Storage(
        StorageError::IoError
    ))));
}

// ── Status ────────────────────────────────────────────────────

#[test]
fn status_reports_telemetry_age_and_hides_password() {
    let mut h = Harness::new();
    h.post_config(FormData::new().with("ssid", "Attic").with("pass", "correcthorse"));
    h.post_temp("20.25", 10_000);

    let handled = h.send(InboundRequest::Status, 25_500);
    let Response::Status(report) = handled.response else {
        panic!("expected status");
    };
    assert_eq!(report.external_temp, 20.25);
    assert_eq!(report.secs_since_telemetry, Some(15));
    assert_eq!(report.ssid.as_str(), "Attic");

    let json = report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["ssid"], "Attic");
    assert!(!json.contains("correcthorse"));
}
