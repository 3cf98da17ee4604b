//! Boiler link adapters.
//!
//! Implements [`BoilerLinkPort`]: the synchronous master/slave exchange
//! with the boiler.
//!
//! - **`target_os = "espidf"`**: [`BoilerLinkAdapter`] owns the two link
//!   GPIOs and the edge ISR.  Bit-level framing is supplied by an external
//!   driver; until one is attached every exchange reports
//!   [`LinkStatus::Failure`] and the control cycle carries on.
//! - **all targets**: [`SimulatedBoiler`], a first-order water temperature
//!   model used by host tests and the simulation build.
//!
//! The link ISR does O(1) work: it bumps an atomic edge counter that the
//! main loop drains with [`take_link_edges`].

use core::sync::atomic::{AtomicU32, Ordering};

use log::{debug, warn};

use crate::app::ports::{ActivityFlags, BoilerLinkPort, LinkStatus, StatusRequest};

/// Edges seen on the link input since the last drain.
/// `static` because ESP-IDF ISR callbacks cannot capture state.
static LINK_EDGE_COUNT: AtomicU32 = AtomicU32::new(0);

/// Called from the GPIO ISR on every link input edge.
pub fn record_link_edge() {
    LINK_EDGE_COUNT.fetch_add(1, Ordering::Relaxed);
}

/// Read and reset the edge counter (main loop only).
pub fn take_link_edges() -> u32 {
    LINK_EDGE_COUNT.swap(0, Ordering::Relaxed)
}

// ───────────────────────────────────────────────────────────────
// Simulated boiler
// ───────────────────────────────────────────────────────────────

/// Highest setpoint the simulated boiler accepts (°C).
pub const SIM_MAX_SETPOINT: f32 = 100.0;

/// First-order boiler model.
///
/// Each `get_temperature` advances the model one step: with the flame on
/// the water approaches the setpoint, otherwise it decays towards ambient.
#[derive(Debug, Clone)]
pub struct SimulatedBoiler {
    water_temp: f32,
    setpoint: f32,
    ambient: f32,
    /// Fraction of the remaining gap closed per step.
    response: f32,
    request: StatusRequest,
    fail: bool,
    last_status: LinkStatus,
    exchanges: u32,
}

impl Default for SimulatedBoiler {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl SimulatedBoiler {
    pub fn new(ambient: f32) -> Self {
        Self {
            water_temp: ambient,
            setpoint: ambient,
            ambient,
            response: 0.1,
            request: StatusRequest::default(),
            fail: false,
            last_status: LinkStatus::Failure,
            exchanges: 0,
        }
    }

    /// Make every subsequent exchange fail (cable pulled).
    pub fn set_fail(&mut self, fail: bool) {
        self.fail = fail;
    }

    pub fn water_temp(&self) -> f32 {
        self.water_temp
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    /// Exchanges attempted so far (successful or not).
    pub fn exchanges(&self) -> u32 {
        self.exchanges
    }

    fn exchange(&mut self) -> bool {
        self.exchanges += 1;
        self.last_status = if self.fail {
            LinkStatus::Failure
        } else {
            LinkStatus::Success
        };
        !self.fail
    }

    fn flame(&self) -> bool {
        (self.request.central_heating || self.request.hot_water) && self.water_temp < self.setpoint
    }
}

impl BoilerLinkPort for SimulatedBoiler {
    fn set_status(&mut self, request: StatusRequest) -> (ActivityFlags, LinkStatus) {
        if !self.exchange() {
            return (ActivityFlags::default(), LinkStatus::Failure);
        }
        self.request = request;
        let flags = ActivityFlags {
            central_heating: request.central_heating,
            hot_water: request.hot_water,
            cooling: request.cooling,
            flame: self.flame(),
        };
        (flags, LinkStatus::Success)
    }

    fn set_temperature(&mut self, celsius: f32) -> bool {
        if !self.exchange() {
            return false;
        }
        if !(0.0..=SIM_MAX_SETPOINT).contains(&celsius) {
            debug!("Boiler(sim): setpoint {:.2} out of range", celsius);
            return false;
        }
        self.setpoint = celsius;
        true
    }

    fn get_temperature(&mut self) -> f32 {
        if !self.exchange() {
            return 0.0;
        }
        let target = if self.flame() { self.setpoint } else { self.ambient };
        self.water_temp += (target - self.water_temp) * self.response;
        self.water_temp
    }

    fn last_status(&self) -> LinkStatus {
        self.last_status
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF link pins
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use espidf::BoilerLinkAdapter;

#[cfg(target_os = "espidf")]
mod espidf {
    use esp_idf_svc::sys::*;
    use log::{info, warn};

    use super::record_link_edge;
    use crate::app::ports::{ActivityFlags, BoilerLinkPort, LinkStatus, StatusRequest};
    use crate::pins;

    unsafe extern "C" fn link_gpio_isr(_arg: *mut core::ffi::c_void) {
        record_link_edge();
    }

    pub struct BoilerLinkAdapter {
        warned: bool,
    }

    impl BoilerLinkAdapter {
        /// Configure the link pins and attach the edge ISR.
        pub fn new() -> Result<Self, EspError> {
            let input = gpio_config_t {
                pin_bit_mask: 1u64 << pins::BOILER_LINK_IN_GPIO,
                mode: gpio_mode_t_GPIO_MODE_INPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
                ..Default::default()
            };
            let output = gpio_config_t {
                pin_bit_mask: 1u64 << pins::BOILER_LINK_OUT_GPIO,
                mode: gpio_mode_t_GPIO_MODE_OUTPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
                ..Default::default()
            };
            // SAFETY: called once from the main task before the loop starts;
            // the ISR only touches an atomic counter.
            unsafe {
                esp!(gpio_config(&input))?;
                esp!(gpio_config(&output))?;
                esp!(gpio_set_level(pins::BOILER_LINK_OUT_GPIO, 1))?;

                // ESP_ERR_INVALID_STATE: service already installed.
                let ret = gpio_install_isr_service(0);
                if ret != ESP_ERR_INVALID_STATE as esp_err_t {
                    esp!(ret)?;
                }
                esp!(gpio_isr_handler_add(
                    pins::BOILER_LINK_IN_GPIO,
                    Some(link_gpio_isr),
                    core::ptr::null_mut()
                ))?;
            }

            info!(
                "BoilerLink: pins in={} out={} configured",
                pins::BOILER_LINK_IN_GPIO,
                pins::BOILER_LINK_OUT_GPIO
            );
            Ok(Self { warned: false })
        }

        /// Whether exchanges drive the link lines.  Without a framing
        /// driver nothing toggles them, so silence is expected.
        pub fn expects_edges(&self) -> bool {
            false
        }

        fn no_framer(&mut self) {
            if !self.warned {
                warn!("BoilerLink: no framing driver attached, exchanges fail");
                self.warned = true;
            }
        }
    }

    impl BoilerLinkPort for BoilerLinkAdapter {
        fn set_status(&mut self, _request: StatusRequest) -> (ActivityFlags, LinkStatus) {
            self.no_framer();
            (ActivityFlags::default(), LinkStatus::Failure)
        }

        fn set_temperature(&mut self, _celsius: f32) -> bool {
            self.no_framer();
            false
        }

        fn get_temperature(&mut self) -> f32 {
            self.no_framer();
            0.0
        }

        fn last_status(&self) -> LinkStatus {
            LinkStatus::Failure
        }
    }
}

/// `true` when a cycle that should have toggled the link saw no edges.
pub fn link_silent(edges: u32, expected: bool) -> bool {
    expected && edges == 0
}

/// Log link activity drained since the last call; warns when a cycle saw
/// no edges at all while exchanges were expected.
pub fn report_link_activity(expected: bool) -> u32 {
    let edges = take_link_edges();
    if link_silent(edges, expected) {
        warn!("BoilerLink: no edges on the link input since last cycle");
    } else {
        debug!("BoilerLink: {} edges", edges);
    }
    edges
}
