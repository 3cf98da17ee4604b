//! PID controller for the boiler flow temperature
//!
//! Position-form PID with the derivative taken on the process variable
//! (backward difference over the two most recent room-temperature samples)
//! and conditional-integration anti-reset-windup.
//!
//! The controller itself is stateless: the integral accumulator is owned
//! by the caller and passed in on every call, so the whole control state
//! lives in one place ([`ControlState`](crate::app::state::ControlState)).

use crate::config::PidTuning;

/// PID controller
#[derive(Debug, Clone, Copy)]
pub struct PidController {
    kc: f32,
    /// `Kc / tauI`, zero when integral action is disabled.
    ki: f32,
    tau_d: f32,
    output_low: f32,
    output_high: f32,
}

impl PidController {
    pub fn new(tuning: PidTuning) -> Self {
        let ki = if tuning.tau_i > 0.0 {
            tuning.kc / tuning.tau_i
        } else {
            0.0
        };
        Self {
            kc: tuning.kc,
            ki,
            tau_d: tuning.tau_d,
            output_low: tuning.output_low,
            output_high: tuning.output_high,
        }
    }

    /// Output bounds `(low, high)`.
    pub fn limits(&self) -> (f32, f32) {
        (self.output_low, self.output_high)
    }

    /// Compute the boiler temperature for one control tick.
    ///
    /// * `setpoint`: desired room temperature.
    /// * `pv` / `prev_pv`: latest and previous room temperature samples.
    /// * `integral`: accumulator carried between calls.
    /// * `dt_secs`: time between the two samples.  Zero, negative (clock
    ///   wrap) and non-finite values all mean "no elapsed time": no
    ///   integration step and no derivative contribution.
    ///
    /// When the unclamped output leaves the bounds, this call's integral
    /// step is undone before clamping.
    pub fn compute(&self, setpoint: f32, pv: f32, prev_pv: f32, integral: &mut f32, dt_secs: f32) -> f32 {
        let dt = if dt_secs.is_finite() && dt_secs > 0.0 {
            dt_secs
        } else {
            0.0
        };

        let error = setpoint - pv;

        // Integral (tentative)
        let previous_integral = *integral;
        *integral += self.ki * error * dt;

        // Derivative on measurement
        let derivative = if dt > 0.0 { (pv - prev_pv) / dt } else { 0.0 };

        let output = self.kc * error + *integral - self.kc * self.tau_d * derivative;

        if output.is_nan() {
            *integral = previous_integral;
            return self.output_low;
        }

        // Anti-reset-windup
        if output < self.output_low || output > self.output_high {
            *integral = previous_integral;
            return output.clamp(self.output_low, self.output_high);
        }

        output
    }
}
