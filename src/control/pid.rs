//! PID controller for the coolant temperature loop.
//!
//! Proportional-integral-derivative control law with output clamping and
//! an accumulator-side anti-windup: the raw integral accumulator is
//! bounded by `|max - min| / (2 * |ki|)` on every compute, and re-bounded
//! whenever the output limits change.  This bounds the integral *before*
//! the gain is applied rather than conditionally halting integration at
//! output saturation, so the loop recovers from saturation without the
//! accumulator ever running away.

use crate::error::PidError;

pub const DEFAULT_KP: f32 = 1.0;
pub const DEFAULT_KI: f32 = 0.1;
pub const DEFAULT_KD: f32 = 0.01;
pub const DEFAULT_SETPOINT: f32 = 25.0;
pub const DEFAULT_OUTPUT_MIN: f32 = -100.0;
pub const DEFAULT_OUTPUT_MAX: f32 = 100.0;

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    output_min: f32,
    output_max: f32,
    prev_error: f32,
    integral: f32,
    output: f32,
}

impl Default for PidController {
    fn default() -> Self {
        Self::new()
    }
}

impl PidController {
    pub fn new() -> Self {
        Self {
            kp: DEFAULT_KP,
            ki: DEFAULT_KI,
            kd: DEFAULT_KD,
            setpoint: DEFAULT_SETPOINT,
            output_min: DEFAULT_OUTPUT_MIN,
            output_max: DEFAULT_OUTPUT_MAX,
            prev_error: 0.0,
            integral: 0.0,
            output: 0.0,
        }
    }

    /// Overwrite the gains.  Does not reset runtime state.
    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    pub fn gains(&self) -> (f32, f32, f32) {
        (self.kp, self.ki, self.kd)
    }

    /// Overwrite the target value.
    pub fn set_setpoint(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    /// Replace the output limits.  Rejects a degenerate pair (`min >= max`)
    /// without mutating anything.  On success the integral accumulator is
    /// re-bounded into `±(max - min) / (2 * ki)` derived from the new
    /// limits, so a tighter output range immediately tightens the stored
    /// windup as well.  Skipped when `ki` is zero (the bound is undefined
    /// and the integral term contributes nothing).
    pub fn set_output_limits(&mut self, min: f32, max: f32) -> Result<(), PidError> {
        if min >= max {
            return Err(PidError::InvalidLimits);
        }

        self.output_min = min;
        self.output_max = max;

        if self.ki != 0.0 {
            let max_integral = (max - min) / (2.0 * self.ki);
            if self.integral > max_integral {
                self.integral = max_integral;
            } else if self.integral < -max_integral {
                self.integral = -max_integral;
            }
        }

        Ok(())
    }

    pub fn output_limits(&self) -> (f32, f32) {
        (self.output_min, self.output_max)
    }

    /// Run one control step against the sampled process value and return
    /// the clamped output.
    pub fn compute(&mut self, process_value: f32) -> f32 {
        let error = self.setpoint - process_value;
        let proportional = self.kp * error;

        self.integral += error;
        if self.ki != 0.0 {
            let max_integral = (self.output_max - self.output_min).abs() / (2.0 * self.ki.abs());
            if self.integral > max_integral {
                self.integral = max_integral;
            } else if self.integral < -max_integral {
                self.integral = -max_integral;
            }
        }
        let integral_term = self.ki * self.integral;

        let derivative = self.kd * (error - self.prev_error);

        let mut output = proportional + integral_term + derivative;
        if output > self.output_max {
            output = self.output_max;
        } else if output < self.output_min {
            output = self.output_min;
        }

        self.prev_error = error;
        self.output = output;

        output
    }

    /// Zero the runtime state (previous error, integral accumulator and
    /// last output).  Gains, setpoint and limits are untouched.
    pub fn reset(&mut self) {
        self.prev_error = 0.0;
        self.integral = 0.0;
        self.output = 0.0;
    }

    /// Last computed output.
    pub fn output(&self) -> f32 {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_proportional_has_no_memory() {
        let mut pid = PidController::new();
        pid.set_gains(1.0, 0.0, 0.0);
        pid.set_setpoint(100.0);

        assert_eq!(pid.compute(90.0), 10.0);
        assert_eq!(pid.compute(80.0), 20.0);
    }

    #[test]
    fn defaults_match_documented_values() {
        let pid = PidController::new();
        assert_eq!(pid.gains(), (1.0, 0.1, 0.01));
        assert_eq!(pid.setpoint(), 25.0);
        assert_eq!(pid.output_limits(), (-100.0, 100.0));
        assert_eq!(pid.output(), 0.0);
    }

    #[test]
    fn output_is_clamped_to_limits() {
        let mut pid = PidController::new();
        pid.set_gains(100.0, 0.0, 0.0);
        pid.set_setpoint(50.0);

        assert_eq!(pid.compute(0.0), 100.0);
        assert_eq!(pid.compute(200.0), -100.0);
    }

    #[test]
    fn degenerate_limits_rejected_without_mutation() {
        let mut pid = PidController::new();
        assert_eq!(pid.set_output_limits(50.0, 50.0), Err(PidError::InvalidLimits));
        assert_eq!(pid.set_output_limits(60.0, 50.0), Err(PidError::InvalidLimits));
        assert_eq!(pid.output_limits(), (-100.0, 100.0));
    }

    #[test]
    fn limit_change_rebounds_integral() {
        let mut pid = PidController::new();
        pid.set_gains(0.0, 1.0, 0.0);
        pid.set_setpoint(100.0);

        // Default bound is |200| / (2 * 1) = 100; wind up to it.
        for _ in 0..20 {
            pid.compute(0.0);
        }

        // Tightening the limits to [-10, 10] re-bounds to 10 / 1 = 10.
        pid.set_output_limits(-10.0, 10.0).unwrap();
        assert_eq!(pid.compute(100.0), 10.0); // error 0, pure integral term
    }

    #[test]
    fn zero_ki_skips_integral_clamp() {
        let mut pid = PidController::new();
        pid.set_gains(1.0, 0.0, 0.0);
        pid.set_setpoint(10.0);

        // Would divide by zero in the anti-windup bound if unguarded.
        for _ in 0..1000 {
            pid.compute(0.0);
        }
        assert_eq!(pid.compute(0.0), 10.0);
        assert!(pid.set_output_limits(-5.0, 5.0).is_ok());
    }

    #[test]
    fn reset_clears_runtime_but_not_config() {
        let mut pid = PidController::new();
        pid.set_gains(2.0, 0.5, 0.1);
        pid.set_setpoint(30.0);
        pid.compute(10.0);
        assert!(pid.output() != 0.0);

        pid.reset();
        assert_eq!(pid.output(), 0.0);
        assert_eq!(pid.gains(), (2.0, 0.5, 0.1));
        assert_eq!(pid.setpoint(), 30.0);
    }

    #[test]
    fn set_gains_preserves_runtime_state() {
        let mut pid = PidController::new();
        pid.set_setpoint(50.0);
        pid.compute(40.0);
        let before = pid.output();

        pid.set_gains(1.0, 0.1, 0.01);
        assert_eq!(pid.output(), before);
    }

    #[test]
    fn derivative_acts_on_error_change() {
        let mut pid = PidController::new();
        pid.set_gains(0.0, 0.0, 1.0);
        pid.set_setpoint(0.0);

        assert_eq!(pid.compute(-10.0), 10.0); // prev_error was 0
        assert_eq!(pid.compute(-10.0), 0.0); // error unchanged
        assert_eq!(pid.compute(-5.0), -5.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn output_never_leaves_limits(
            samples in proptest::collection::vec(-500.0f32..500.0, 1..200),
            kp in 0.0f32..10.0,
            ki in 0.0f32..2.0,
            kd in 0.0f32..1.0,
        ) {
            let mut pid = PidController::new();
            pid.set_gains(kp, ki, kd);
            pid.set_setpoint(35.0);
            pid.set_output_limits(-100.0, 100.0).unwrap();

            for s in samples {
                let out = pid.compute(s);
                prop_assert!((-100.0..=100.0).contains(&out), "output {out} escaped limits");
                prop_assert_eq!(out, pid.output());
            }
        }

        #[test]
        fn saturation_recovers_after_sign_flip(bias in 50.0f32..400.0) {
            let mut pid = PidController::new();
            pid.set_gains(0.0, 1.0, 0.0);
            pid.set_setpoint(0.0);

            // Drive hard negative: accumulator pins at its windup bound.
            for _ in 0..50 {
                pid.compute(bias);
            }
            prop_assert_eq!(pid.output(), -100.0);

            // One bounded accumulator means the flip back is equally bounded:
            // each opposite-sign error of `bias` unwinds at least that much.
            let steps = (200.0 / bias).ceil() as usize + 1;
            for _ in 0..steps {
                pid.compute(-bias);
            }
            prop_assert_eq!(pid.output(), 100.0);
        }
    }
}
