//! PWM output channel stub.
//!
//! The real apparatus drives the pump and fan through hardware PWM; this
//! build tracks the commanded state in memory only.  The channel is
//! infallible and exposes the `embedded-hal` [`SetDutyCycle`] trait so a
//! hardware-backed channel can slot in behind the same interface.

use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};

/// Duty resolution: the channel is commanded in whole percent.
const MAX_DUTY: u16 = 100;

/// In-memory PWM channel.
#[derive(Debug, Clone, Copy)]
pub struct PwmChannel {
    duty_percent: u16,
    running: bool,
}

impl PwmChannel {
    pub fn new() -> Self {
        Self {
            duty_percent: 0,
            running: false,
        }
    }

    /// Begin emitting the commanded duty cycle.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop emitting.  The commanded duty is retained.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Command a duty cycle in percent; values above 100 saturate.
    pub fn set_percent(&mut self, percent: u16) {
        self.duty_percent = percent.min(MAX_DUTY);
    }

    pub fn percent(&self) -> u16 {
        self.duty_percent
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for PwmChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorType for PwmChannel {
    type Error = Infallible;
}

impl SetDutyCycle for PwmChannel {
    fn max_duty_cycle(&self) -> u16 {
        MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.set_percent(duty);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_stopped_at_zero() {
        let pwm = PwmChannel::new();
        assert_eq!(pwm.percent(), 0);
        assert!(!pwm.is_running());
    }

    #[test]
    fn duty_saturates_at_max() {
        let mut pwm = PwmChannel::new();
        pwm.set_percent(250);
        assert_eq!(pwm.percent(), 100);
    }

    #[test]
    fn stop_retains_commanded_duty() {
        let mut pwm = PwmChannel::new();
        pwm.start();
        pwm.set_percent(55);
        pwm.stop();
        assert!(!pwm.is_running());
        assert_eq!(pwm.percent(), 55);
    }

    #[test]
    fn usable_through_hal_trait() {
        fn drive(ch: &mut impl SetDutyCycle) {
            ch.set_duty_cycle_fraction(1, 2).unwrap();
        }

        let mut pwm = PwmChannel::new();
        drive(&mut pwm);
        assert_eq!(pwm.percent(), 50);
    }
}
