//! Control-loop state and the read-only status view.

use serde::Serialize;

use super::ports::{ActivityFlags, LinkStatus};
use crate::config::{BoilerConfig, CredentialString};
use crate::supervisor::{ConnectivityState, WifiStatus};

/// Room temperature assumed until the first telemetry sample arrives (°C).
pub const DEFAULT_EXTERNAL_TEMP_C: f32 = 25.0;

/// Mutable control state, updated once per control tick and on telemetry.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    pub desired_room_temp: f32,
    pub external_room_temp: f32,
    pub prior_external_room_temp: f32,
    /// Monotonic ms of the latest telemetry sample (`None` = never).
    pub external_temp_timestamp: Option<u32>,
    /// Monotonic ms of the sample before that.
    pub prior_external_temp_timestamp: Option<u32>,
    /// PID integral accumulator.
    pub integral_error: f32,
    pub commanded_boiler_temp: f32,
    pub actual_boiler_temp: f32,
    pub activity: ActivityFlags,
    pub last_command_accepted: bool,
    pub last_link_status: LinkStatus,
}

impl ControlState {
    pub fn new(desired_room_temp: f32) -> Self {
        Self {
            desired_room_temp,
            external_room_temp: DEFAULT_EXTERNAL_TEMP_C,
            prior_external_room_temp: DEFAULT_EXTERNAL_TEMP_C,
            external_temp_timestamp: None,
            prior_external_temp_timestamp: None,
            integral_error: 0.0,
            commanded_boiler_temp: 0.0,
            actual_boiler_temp: 0.0,
            activity: ActivityFlags::default(),
            last_command_accepted: false,
            last_link_status: LinkStatus::Failure,
        }
    }

    /// Shift the current sample to "prior" and record a new one.
    pub fn record_external_temp(&mut self, celsius: f32, now_ms: u32) {
        self.prior_external_room_temp = self.external_room_temp;
        self.prior_external_temp_timestamp = self.external_temp_timestamp;
        self.external_room_temp = celsius;
        self.external_temp_timestamp = Some(now_ms);
    }

    /// Seconds between the two latest samples.
    ///
    /// Signed: a counter wrap between samples yields a negative value,
    /// which the PID treats as no elapsed time.  Zero until two samples
    /// exist.
    pub fn sample_dt_secs(&self) -> f32 {
        match (self.external_temp_timestamp, self.prior_external_temp_timestamp) {
            (Some(now), Some(prev)) => (i64::from(now) - i64::from(prev)) as f32 / 1000.0,
            _ => 0.0,
        }
    }

    /// Whole seconds since the latest sample, `None` if none received yet.
    pub fn secs_since_telemetry(&self, now_ms: u32) -> Option<u32> {
        self.external_temp_timestamp
            .map(|ts| now_ms.wrapping_sub(ts) / 1000)
    }
}

/// Snapshot returned by a status query.  Never contains the password.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub external_temp: f32,
    pub prior_external_temp: f32,
    pub external_temp_timestamp: Option<u32>,
    pub prior_external_temp_timestamp: Option<u32>,
    pub secs_since_telemetry: Option<u32>,
    pub integral_error: f32,
    pub actual_boiler_temp: f32,
    pub commanded_boiler_temp: f32,
    pub activity: ActivityFlags,
    pub last_link_status: LinkStatus,
    pub last_command_accepted: bool,
    pub desired_temp: f32,
    pub central_heating: bool,
    pub hot_water: bool,
    pub cooling: bool,
    pub manual_boiler_temp: bool,
    pub desired_boiler_temp: f32,
    pub ssid: CredentialString,
    pub wifi_status: WifiStatus,
    pub wifi_attempts: u16,
    pub wifi_last_attempt_ms: u32,
}

impl StatusReport {
    pub fn build(
        state: &ControlState,
        config: &BoilerConfig,
        connectivity: &ConnectivityState,
        now_ms: u32,
    ) -> Self {
        Self {
            external_temp: state.external_room_temp,
            prior_external_temp: state.prior_external_room_temp,
            external_temp_timestamp: state.external_temp_timestamp,
            prior_external_temp_timestamp: state.prior_external_temp_timestamp,
            secs_since_telemetry: state.secs_since_telemetry(now_ms),
            integral_error: state.integral_error,
            actual_boiler_temp: state.actual_boiler_temp,
            commanded_boiler_temp: state.commanded_boiler_temp,
            activity: state.activity,
            last_link_status: state.last_link_status,
            last_command_accepted: state.last_command_accepted,
            desired_temp: config.desired_temp,
            central_heating: config.central_heating,
            hot_water: config.hot_water,
            cooling: config.cooling,
            manual_boiler_temp: config.manual_boiler_temp,
            desired_boiler_temp: config.desired_boiler_temp,
            ssid: config.credentials.ssid.clone(),
            wifi_status: connectivity.status,
            wifi_attempts: connectivity.attempt_count,
            wifi_last_attempt_ms: connectivity.last_attempt_ms,
        }
    }

    /// JSON body for the status endpoint.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
