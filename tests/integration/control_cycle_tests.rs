//! Integration tests for the control cycle: BoilerService → PID → boiler link.

use boilernode::adapters::nvs::NvsAdapter;
use boilernode::app::commands::{FormData, InboundRequest, Method, Response};
use boilernode::app::events::AppEvent;
use boilernode::app::ports::LinkStatus;
use boilernode::app::service::BoilerService;
use boilernode::config::{BoilerConfig, NodeSettings};
use boilernode::error::LinkStep;
use boilernode::supervisor::ConnectivityState;

use super::mock_hw::{LinkCall, RecordingSink, ScriptedBoiler};

fn service(config: BoilerConfig) -> BoilerService {
    BoilerService::new(config, &NodeSettings::default())
}

fn report_temp(svc: &mut BoilerService, raw: &str, now_ms: u32) {
    let mut store = NvsAdapter::new().unwrap();
    let handled = svc.handle_request(
        InboundRequest::Telemetry {
            method: Method::Post,
            form: FormData::new().with("temp", raw),
        },
        now_ms,
        &ConnectivityState::default(),
        &mut store,
        &mut RecordingSink::new(),
    );
    assert_eq!(handled.response, Response::Ok);
}

#[test]
fn reference_scenario_commands_25_2() {
    let mut svc = service(BoilerConfig::default());
    report_temp(&mut svc, "19.5", 1_000);
    report_temp(&mut svc, "20.0", 6_000);

    let mut boiler = ScriptedBoiler::new();
    let report = svc.run_cycle(&mut boiler, &mut RecordingSink::new());

    assert!((report.commanded_boiler_temp - 25.2).abs() < 1e-4);
    assert!((svc.state().integral_error - 2.4).abs() < 1e-5);
    assert_eq!(boiler.setpoints(), vec![report.commanded_boiler_temp]);
}

#[test]
fn reference_scenario_is_reproducible() {
    let run = || {
        let mut svc = service(BoilerConfig::default());
        report_temp(&mut svc, "19.5", 1_000);
        report_temp(&mut svc, "20.0", 6_000);
        svc.run_cycle(&mut ScriptedBoiler::new(), &mut RecordingSink::new())
            .commanded_boiler_temp
    };
    assert_eq!(run().to_bits(), run().to_bits());
}

#[test]
fn manual_override_bypasses_pid() {
    let cfg = BoilerConfig {
        manual_boiler_temp: true,
        desired_boiler_temp: 45.0,
        ..Default::default()
    };
    let mut svc = service(cfg);
    report_temp(&mut svc, "10.0", 1_000);
    report_temp(&mut svc, "10.0", 2_000);

    let mut boiler = ScriptedBoiler::new();
    let report = svc.run_cycle(&mut boiler, &mut RecordingSink::new());

    assert_eq!(report.commanded_boiler_temp, 45.0);
    assert!(report.manual);
    assert_eq!(boiler.setpoints(), vec![45.0]);
    assert_eq!(svc.state().integral_error, 0.0);
}

#[test]
fn cycle_exchanges_in_order() {
    let mut svc = service(BoilerConfig::default());
    let mut boiler = ScriptedBoiler::new();
    svc.run_cycle(&mut boiler, &mut RecordingSink::new());

    assert_eq!(boiler.calls.len(), 3);
    assert!(matches!(boiler.calls[0], LinkCall::SetStatus(r) if r.central_heating && r.hot_water && !r.cooling));
    assert!(matches!(boiler.calls[1], LinkCall::SetTemperature(_)));
    assert_eq!(boiler.calls[2], LinkCall::GetTemperature);
    assert_eq!(svc.state().actual_boiler_temp, 38.5);
    assert!(svc.state().activity.flame);
}

#[test]
fn status_failure_does_not_abort_cycle() {
    let mut svc = service(BoilerConfig::default());
    let mut boiler = ScriptedBoiler::new();
    boiler.fail_status = true;
    let mut sink = RecordingSink::new();

    let report = svc.run_cycle(&mut boiler, &mut sink);

    assert_eq!(report.status_link, LinkStatus::Failure);
    assert_eq!(boiler.calls.len(), 3);
    assert!(sink.contains(&AppEvent::LinkFailure(LinkStep::SetStatus)));
    assert!(!svc.state().activity.flame);
}

#[test]
fn rejected_setpoint_is_recorded() {
    let mut svc = service(BoilerConfig::default());
    let mut boiler = ScriptedBoiler::new();
    boiler.reject_setpoint = true;
    let mut sink = RecordingSink::new();

    let report = svc.run_cycle(&mut boiler, &mut sink);

    assert!(!report.command_accepted);
    assert!(!svc.state().last_command_accepted);
    assert!(sink.contains(&AppEvent::LinkFailure(LinkStep::SetTemperature)));
}

#[test]
fn failed_readback_keeps_previous_reading() {
    let mut svc = service(BoilerConfig::default());
    let mut boiler = ScriptedBoiler::new();
    svc.run_cycle(&mut boiler, &mut RecordingSink::new());
    assert_eq!(svc.state().actual_boiler_temp, 38.5);

    boiler.fail_read = true;
    boiler.reading = 99.0;
    let mut sink = RecordingSink::new();
    svc.run_cycle(&mut boiler, &mut sink);

    assert_eq!(svc.state().actual_boiler_temp, 38.5);
    assert_eq!(svc.state().last_link_status, LinkStatus::Failure);
    assert!(sink.contains(&AppEvent::LinkFailure(LinkStep::ReadTemperature)));
}

#[test]
fn saturated_output_keeps_integral() {
    let cfg = BoilerConfig {
        desired_temp: 30.0,
        ..Default::default()
    };
    let mut svc = service(cfg);
    report_temp(&mut svc, "5.0", 1_000);
    report_temp(&mut svc, "5.0", 61_000);

    let report = svc.run_cycle(&mut ScriptedBoiler::new(), &mut RecordingSink::new());

    assert_eq!(report.commanded_boiler_temp, 55.0);
    assert_eq!(svc.state().integral_error, 0.0);
}

#[test]
fn every_cycle_reports_completion() {
    let mut svc = service(BoilerConfig::default());
    let mut boiler = ScriptedBoiler::new();
    let mut sink = RecordingSink::new();
    for _ in 0..3 {
        svc.run_cycle(&mut boiler, &mut sink);
    }
    assert_eq!(sink.count(|e| matches!(e, AppEvent::CycleCompleted(_))), 3);
    assert_eq!(svc.cycle_count(), 3);
}
