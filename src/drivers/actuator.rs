//! Generic duty-cycle actuator controller.
//!
//! One abstraction covers both the coolant pump and the radiator fan; the
//! two instances differ only in identity.  The controller converts a
//! control-output scalar into an enforced duty cycle on its PWM channel
//! and tracks an externally readable status snapshot.
//!
//! ## Enable gate asymmetry
//!
//! `update_speed` respects the enable flag: a disabled actuator stays at
//! zero duty no matter what the control loop commands.  `set_max_speed`
//! does **not** — it drives the channel to 100% even while disabled.
//! Emergency paths (critical temperature, fault handling) rely on that
//! override to guarantee full cooling regardless of gating state.

use log::{info, warn};

use crate::drivers::pwm::PwmChannel;

const MIN_DUTY: f32 = 0.0;
const MAX_DUTY: f32 = 100.0;

/// Which physical actuator this controller drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorId {
    Pump,
    Fan,
}

impl ActuatorId {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pump => "pump",
            Self::Fan => "fan",
        }
    }
}

/// Operating mode reported in the status snapshot.
///
/// `Fault` is never set by this controller itself; it exists for external
/// fault injection and is consumed by the supervisor's fault aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActuatorMode {
    Off = 0,
    SpeedControl = 1,
    Max = 2,
    Fault = 3,
}

impl ActuatorMode {
    /// Wire code used in the status telemetry frames.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Point-in-time actuator status, read by the supervisor and telemetry.
#[derive(Debug, Clone, Copy)]
pub struct ActuatorStatus {
    /// Commanded duty cycle, 0–100 percent.
    pub duty_cycle: f32,
    pub enabled: bool,
    pub mode: ActuatorMode,
}

impl Default for ActuatorStatus {
    fn default() -> Self {
        Self {
            duty_cycle: 0.0,
            enabled: false,
            mode: ActuatorMode::Off,
        }
    }
}

/// Duty-cycle actuator controller; instantiate once per [`ActuatorId`].
#[derive(Debug)]
pub struct Actuator {
    id: ActuatorId,
    status: ActuatorStatus,
    pwm: PwmChannel,
}

impl Actuator {
    pub fn new(id: ActuatorId) -> Self {
        Self {
            id,
            status: ActuatorStatus::default(),
            pwm: PwmChannel::new(),
        }
    }

    /// Reset to the safe initial state: zero duty, disabled, mode Off.
    /// The PWM shim is infallible, so initialisation always succeeds.
    pub fn init(&mut self) -> bool {
        self.status = ActuatorStatus::default();
        self.pwm.set_percent(0);
        self.pwm.stop();
        info!("{} control initialized", self.id.label());
        true
    }

    /// Set the enable gate.  Enabling starts the PWM channel without
    /// forcing a duty change; disabling immediately zeroes the duty and
    /// drops to mode Off, overriding any speed command in flight.
    pub fn enable(&mut self, enable: bool) {
        self.status.enabled = enable;
        if enable {
            self.pwm.start();
        } else {
            self.status.mode = ActuatorMode::Off;
            self.status.duty_cycle = MIN_DUTY;
            self.pwm.set_percent(0);
            self.pwm.stop();
        }
    }

    /// Apply a control-loop output.  A disabled actuator ignores the
    /// commanded value and holds zero duty; an enabled one clamps the
    /// output into [0, 100] and enters speed-control mode.
    pub fn update_speed(&mut self, control_output: f32) {
        if !self.status.enabled {
            self.status.mode = ActuatorMode::Off;
            self.status.duty_cycle = MIN_DUTY;
            self.pwm.set_percent(0);
            self.pwm.stop();
            return;
        }

        self.status.duty_cycle = control_output.clamp(MIN_DUTY, MAX_DUTY);
        self.pwm.set_percent(self.status.duty_cycle as u16);
        self.status.mode = ActuatorMode::SpeedControl;
    }

    /// Force full duty, bypassing the enable gate.
    pub fn set_max_speed(&mut self) {
        warn!("{} forced to max speed", self.id.label());
        self.status.duty_cycle = MAX_DUTY;
        self.status.mode = ActuatorMode::Max;
        self.pwm.set_percent(MAX_DUTY as u16);
    }

    /// Diagnostic hook: mark this actuator faulted.  The controller never
    /// enters `Fault` on its own; the supervisor reads it back through
    /// the status snapshot.
    pub fn inject_fault(&mut self) {
        self.status.mode = ActuatorMode::Fault;
    }

    /// Snapshot read, no side effects.
    pub fn status(&self) -> ActuatorStatus {
        self.status
    }

    pub fn id(&self) -> ActuatorId {
        self.id
    }
}
