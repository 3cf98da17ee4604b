//! Node configuration
//!
//! Two layers:
//!
//! - [`BoilerConfig`]: operator settings edited from the local web page and
//!   persisted through the [`ConfigPort`](crate::app::ports::ConfigPort).
//! - [`NodeSettings`]: build-time tunables (timing, PID gains, retry
//!   bounds, access point, update channel).  Never persisted.
//!
//! The persisted form is a fixed-width [`ConfigRecord`]: credentials are
//! zero-padded byte arrays so the record is always [`CONFIG_RECORD_LEN`]
//! bytes when encoded with postcard.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConnectivityError;

/// Fixed width of the persisted SSID / password fields.
pub const CREDENTIAL_LEN: usize = 24;

/// Encoded size of a [`ConfigRecord`]:
/// 2 × 24 credential bytes, 2 × f32, 4 × bool.
pub const CONFIG_RECORD_LEN: usize = 2 * CREDENTIAL_LEN + 2 * 4 + 4;

/// Credential string with the same capacity as the persisted field.
pub type CredentialString = heapless::String<CREDENTIAL_LEN>;

// ═══════════════════════════════════════════════════════════════
//  Operator configuration
// ═══════════════════════════════════════════════════════════════

/// Station credentials for the home WiFi network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub ssid: CredentialString,
    pub pass: CredentialString,
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

impl Credentials {
    /// Validate and build station credentials.
    ///
    /// SSID: 1–24 printable ASCII bytes.  Password: empty (open network)
    /// or 8–24 bytes (WPA2, limited by the persisted field width).
    pub fn new(ssid: &str, pass: &str) -> Result<Self, ConnectivityError> {
        if ssid.is_empty() || ssid.len() > CREDENTIAL_LEN || !is_printable_ascii(ssid) {
            return Err(ConnectivityError::InvalidSsid);
        }
        if !pass.is_empty() && !(8..=CREDENTIAL_LEN).contains(&pass.len()) {
            return Err(ConnectivityError::InvalidPassword);
        }
        let mut out = Self::default();
        out.ssid.push_str(ssid).map_err(|()| ConnectivityError::InvalidSsid)?;
        out.pass.push_str(pass).map_err(|()| ConnectivityError::InvalidPassword)?;
        Ok(out)
    }

    /// `true` once an SSID has been configured.
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

/// Operator settings (desired temperatures, boiler enables, credentials).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoilerConfig {
    pub credentials: Credentials,
    /// Desired room temperature (°C): the PID setpoint.
    pub desired_temp: f32,
    /// Request central heating from the boiler.
    pub central_heating: bool,
    /// Request domestic hot water from the boiler.
    pub hot_water: bool,
    /// Request cooling from the boiler.
    pub cooling: bool,
    /// Bypass the PID and command `desired_boiler_temp` directly.
    pub manual_boiler_temp: bool,
    /// Manual boiler water temperature (°C).
    pub desired_boiler_temp: f32,
}

impl Default for BoilerConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            desired_temp: 22.0,
            central_heating: true,
            hot_water: true,
            cooling: false,
            manual_boiler_temp: false,
            desired_boiler_temp: 45.0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Persisted record
// ═══════════════════════════════════════════════════════════════

/// Fixed-layout image of [`BoilerConfig`] as stored in NVS.
///
/// Field order is the on-flash order; do not reorder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub ssid: [u8; CREDENTIAL_LEN],
    pub pass: [u8; CREDENTIAL_LEN],
    pub desired_temp: f32,
    pub central_heating: bool,
    pub hot_water: bool,
    pub cooling: bool,
    pub manual_boiler_temp: bool,
    pub desired_boiler_temp: f32,
}

fn pad(s: &str) -> [u8; CREDENTIAL_LEN] {
    let mut out = [0u8; CREDENTIAL_LEN];
    let bytes = s.as_bytes();
    let len = bytes.len().min(CREDENTIAL_LEN);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

fn unpad(raw: &[u8; CREDENTIAL_LEN]) -> Option<CredentialString> {
    let len = raw.iter().position(|&b| b == 0).unwrap_or(CREDENTIAL_LEN);
    let s = core::str::from_utf8(&raw[..len]).ok()?;
    let mut out = CredentialString::new();
    out.push_str(s).ok()?;
    Some(out)
}

impl From<&BoilerConfig> for ConfigRecord {
    fn from(cfg: &BoilerConfig) -> Self {
        Self {
            ssid: pad(&cfg.credentials.ssid),
            pass: pad(&cfg.credentials.pass),
            desired_temp: cfg.desired_temp,
            central_heating: cfg.central_heating,
            hot_water: cfg.hot_water,
            cooling: cfg.cooling,
            manual_boiler_temp: cfg.manual_boiler_temp,
            desired_boiler_temp: cfg.desired_boiler_temp,
        }
    }
}

impl ConfigRecord {
    /// Convert back into a [`BoilerConfig`].  `None` if a credential field
    /// is not valid UTF-8.
    pub fn to_config(&self) -> Option<BoilerConfig> {
        Some(BoilerConfig {
            credentials: Credentials {
                ssid: unpad(&self.ssid)?,
                pass: unpad(&self.pass)?,
            },
            desired_temp: self.desired_temp,
            central_heating: self.central_heating,
            hot_water: self.hot_water,
            cooling: self.cooling,
            manual_boiler_temp: self.manual_boiler_temp,
            desired_boiler_temp: self.desired_boiler_temp,
        })
    }

    /// Encode to the fixed-width on-flash image.
    pub fn encode(&self) -> Result<[u8; CONFIG_RECORD_LEN], postcard::Error> {
        let mut buf = [0u8; CONFIG_RECORD_LEN];
        let used = postcard::to_slice(self, &mut buf)?.len();
        debug_assert_eq!(used, CONFIG_RECORD_LEN);
        Ok(buf)
    }

    /// Decode an on-flash image.  Short or trailing bytes are rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self, postcard::Error> {
        if bytes.len() != CONFIG_RECORD_LEN {
            return Err(postcard::Error::DeserializeUnexpectedEnd);
        }
        postcard::from_bytes(bytes)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Build-time tunables
// ═══════════════════════════════════════════════════════════════

/// PID gains and output bounds for the boiler flow temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidTuning {
    /// Controller gain `Kc`.
    pub kc: f32,
    /// Integral time constant `tauI` (seconds).
    pub tau_i: f32,
    /// Derivative time constant `tauD` (seconds).
    pub tau_d: f32,
    /// Lowest boiler temperature the controller may command (°C).
    pub output_low: f32,
    /// Highest boiler temperature the controller may command (°C).
    pub output_high: f32,
}

impl Default for PidTuning {
    fn default() -> Self {
        Self {
            kc: 12.0,
            tau_i: 50.0,
            tau_d: 1.0,
            output_low: 20.0,
            output_high: 55.0,
        }
    }
}

/// Retry bounds for the WiFi station supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityTuning {
    pub max_attempts: u8,
    pub min_check_timeout_ms: u32,
}

impl Default for ConnectivityTuning {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            min_check_timeout_ms: 500,
        }
    }
}

/// Soft access point kept up alongside the station connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPointSettings {
    pub ssid: &'static str,
    pub pass: &'static str,
    pub ip: [u8; 4],
    pub gateway: [u8; 4],
    pub netmask: [u8; 4],
}

impl Default for AccessPointSettings {
    fn default() -> Self {
        Self {
            ssid: "Boiler01",
            pass: "boiler-server",
            ip: [192, 168, 4, 11],
            gateway: [192, 168, 4, 1],
            netmask: [255, 255, 255, 0],
        }
    }
}

/// Wireless update listener parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSettings {
    pub port: u16,
    pub hostname: &'static str,
    pub password: &'static str,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            port: 8232,
            hostname: "esp-boiler",
            password: "boiler-esp",
        }
    }
}

/// All build-time tunables for the node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeSettings {
    /// Control loop period (milliseconds).
    pub tick_period_ms: u32,
    pub pid: PidTuning,
    pub connectivity: ConnectivityTuning,
    pub access_point: AccessPointSettings,
    pub update: UpdateSettings,
    /// HTTP listener port for the configuration page.
    pub http_port: u16,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            tick_period_ms: 1000,
            pid: PidTuning::default(),
            connectivity: ConnectivityTuning::default(),
            access_point: AccessPointSettings::default(),
            update: UpdateSettings::default(),
            http_port: 80,
        }
    }
}
