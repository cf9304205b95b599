//! Digital switch inputs: ignition and coolant-level.
//!
//! Both are single GPIO reads on real hardware.  The simulated build
//! holds the pin states in memory; tests flip them through the `sim_*`
//! hooks.  `Unknown` covers a pin that cannot be read — the supervisor
//! treats an unknown ignition state as a fault condition.

use log::info;

/// Ignition switch position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IgnitionState {
    Off = 0,
    On = 1,
    Unknown = 2,
}

impl IgnitionState {
    /// Wire code used in the system-status frame.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Coolant reservoir level switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CoolantLevel {
    Low = 0,
    Normal = 1,
    Unknown = 2,
}

impl CoolantLevel {
    /// Wire code used in the system-status frame.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Digital input manager for the two switches.
pub struct DioManager {
    sim_ignition: IgnitionState,
    sim_level: CoolantLevel,
}

impl DioManager {
    pub fn new() -> Self {
        Self {
            // Simulation defaults: engine running, reservoir full.
            sim_ignition: IgnitionState::On,
            sim_level: CoolantLevel::Normal,
        }
    }

    /// Configure the input pins.  Nothing to do for the simulated build.
    pub fn init(&mut self) -> bool {
        info!("digital input manager initialized");
        true
    }

    pub fn read_ignition(&self) -> IgnitionState {
        self.sim_ignition
    }

    pub fn read_level(&self) -> CoolantLevel {
        self.sim_level
    }

    pub fn sim_set_ignition(&mut self, state: IgnitionState) {
        self.sim_ignition = state;
    }

    pub fn sim_set_level(&mut self, level: CoolantLevel) {
        self.sim_level = level;
    }
}

impl Default for DioManager {
    fn default() -> Self {
        Self::new()
    }
}
