//! WiFi adapter: station connection plus the always-on soft AP.
//!
//! Implements [`ConnectivityPort`] for the
//! [`ConnectivitySupervisor`](crate::supervisor::ConnectivitySupervisor).
//! Every call returns immediately: `begin` only starts an association and
//! `is_connected` only inspects driver state.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi` in mixed
//!   (AP + STA) mode.  The AP keeps the configuration page reachable while
//!   the station retries.
//! - **all other targets**: simulation with a switchable "access point in
//!   range" flag for host-side tests.

use log::{info, warn};

use crate::app::ports::{ConnectivityError, ConnectivityPort};
use crate::config::{AccessPointSettings, Credentials};

/// Prefix length of a dotted netmask (`255.255.255.0` → 24).
pub fn netmask_prefix(mask: [u8; 4]) -> u8 {
    u32::from_be_bytes(mask).leading_ones() as u8
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use core::net::Ipv4Addr;

    use esp_idf_svc::ipv4::{
        Configuration as IpConfiguration, Mask, RouterConfiguration, Subnet,
    };
    use esp_idf_svc::netif::{EspNetif, NetifConfiguration};
    use esp_idf_svc::sys::EspError;
    use esp_idf_svc::wifi::{
        AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
    };
    use log::{info, warn};

    use super::netmask_prefix;
    use crate::app::ports::ConnectivityError;
    use crate::config::{AccessPointSettings, Credentials};

    pub struct Driver {
        wifi: EspWifi<'static>,
        ap: AccessPointConfiguration,
    }

    impl Driver {
        pub fn new(wifi: EspWifi<'static>) -> Self {
            Self {
                wifi,
                ap: AccessPointConfiguration::default(),
            }
        }

        pub fn start_access_point(&mut self, settings: &AccessPointSettings) -> Result<(), EspError> {
            let mut conf = NetifConfiguration::wifi_default_router();
            conf.ip_configuration = Some(IpConfiguration::Router(RouterConfiguration {
                subnet: Subnet {
                    gateway: Ipv4Addr::from(settings.ip),
                    mask: Mask(netmask_prefix(settings.netmask)),
                },
                dhcp_enabled: true,
                dns: None,
                secondary_dns: None,
            }));
            let netif = EspNetif::new_with_conf(&conf)?;
            self.wifi.swap_netif_ap(netif)?;

            self.ap = AccessPointConfiguration {
                ssid: settings.ssid.try_into().unwrap_or_default(),
                password: settings.pass.try_into().unwrap_or_default(),
                auth_method: AuthMethod::WPA2Personal,
                channel: 1,
                ..Default::default()
            };
            self.wifi
                .set_configuration(&Configuration::AccessPoint(self.ap.clone()))?;
            self.wifi.start()?;
            info!("WiFi(espidf): soft AP '{}' up at {}", settings.ssid, Ipv4Addr::from(settings.ip));
            Ok(())
        }

        pub fn begin(&mut self, credentials: &Credentials) -> Result<(), ConnectivityError> {
            let auth_method = if credentials.pass.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            let client = ClientConfiguration {
                ssid: credentials
                    .ssid
                    .as_str()
                    .try_into()
                    .map_err(|()| ConnectivityError::InvalidSsid)?,
                password: credentials
                    .pass
                    .as_str()
                    .try_into()
                    .map_err(|()| ConnectivityError::InvalidPassword)?,
                auth_method,
                ..Default::default()
            };
            self.wifi
                .set_configuration(&Configuration::Mixed(client, self.ap.clone()))
                .map_err(|e| {
                    warn!("WiFi(espidf): set_configuration failed: {}", e);
                    ConnectivityError::DriverRejected
                })?;
            if !self.wifi.is_started().unwrap_or(false) {
                self.wifi.start().map_err(|_| ConnectivityError::DriverRejected)?;
            }
            self.wifi.connect().map_err(|e| {
                warn!("WiFi(espidf): connect failed: {}", e);
                ConnectivityError::DriverRejected
            })
        }

        pub fn disconnect(&mut self) {
            if let Err(e) = self.wifi.disconnect() {
                warn!("WiFi(espidf): disconnect failed: {}", e);
            }
        }

        pub fn is_connected(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false) && self.wifi.sta_netif().is_up().unwrap_or(false)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod platform {
    use log::info;

    use crate::app::ports::ConnectivityError;
    use crate::config::{AccessPointSettings, Credentials};

    pub struct Driver {
        pub reachable: bool,
        pub associated: bool,
        pub ap_started: bool,
        pub begin_count: u32,
        pub last_ssid: heapless::String<24>,
    }

    impl Driver {
        pub fn new() -> Self {
            Self {
                reachable: true,
                associated: false,
                ap_started: false,
                begin_count: 0,
                last_ssid: heapless::String::new(),
            }
        }

        pub fn start_access_point(&mut self, settings: &AccessPointSettings) -> Result<(), ConnectivityError> {
            self.ap_started = true;
            info!("WiFi(sim): soft AP '{}' up", settings.ssid);
            Ok(())
        }

        pub fn begin(&mut self, credentials: &Credentials) -> Result<(), ConnectivityError> {
            self.begin_count += 1;
            self.last_ssid = credentials.ssid.clone();
            if !credentials.is_configured() {
                return Err(ConnectivityError::NoCredentials);
            }
            self.associated = self.reachable;
            Ok(())
        }

        pub fn disconnect(&mut self) {
            self.associated = false;
        }

        pub fn is_connected(&self) -> bool {
            self.associated && self.reachable
        }
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    driver: platform::Driver,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: esp_idf_svc::wifi::EspWifi<'static>) -> Self {
        Self {
            driver: platform::Driver::new(wifi),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            driver: platform::Driver::new(),
        }
    }

    /// Bring up the soft AP.  Failure is logged; the node keeps running
    /// without it.
    pub fn start_access_point(&mut self, settings: &AccessPointSettings) -> bool {
        match self.driver.start_access_point(settings) {
            Ok(()) => true,
            Err(e) => {
                warn!("WiFi: soft AP start failed: {}", e);
                false
            }
        }
    }

    // ── Simulation controls ───────────────────────────────────

    /// Whether the configured access point is in range.  Going out of
    /// range drops an existing association.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_reachable(&mut self, reachable: bool) {
        self.driver.reachable = reachable;
        if !reachable {
            self.driver.associated = false;
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn begin_count(&self) -> u32 {
        self.driver.begin_count
    }

    /// SSID passed to the most recent `begin`.
    #[cfg(not(target_os = "espidf"))]
    pub fn last_ssid(&self) -> &str {
        self.driver.last_ssid.as_str()
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn access_point_started(&self) -> bool {
        self.driver.ap_started
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityPort for WifiAdapter {
    fn begin(&mut self, credentials: &Credentials) -> Result<(), ConnectivityError> {
        if !credentials.is_configured() {
            return Err(ConnectivityError::NoCredentials);
        }
        info!("WiFi: associating with '{}'", credentials.ssid);
        self.driver.begin(credentials)
    }

    fn disconnect(&mut self) {
        self.driver.disconnect();
    }

    fn is_connected(&self) -> bool {
        self.driver.is_connected()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
