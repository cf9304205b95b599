//! Table-driven supervisory state machine.
//!
//! Six states govern the cooling system: `Init`, `Off`, `Standby`,
//! `Cooling`, `CriticalTemp` and `Fault`.  Each is a [`StateDescriptor`]
//! of plain function pointers over the shared [`context::SmContext`]
//! blackboard; the [`Supervisor`] engine runs the same tick discipline
//! for all of them.
//!
//! ## Tick discipline
//!
//! Transitions are two-phase.  On each [`Supervisor::update`]:
//!
//! 1. refresh the input snapshot;
//! 2. if the current state has not been entered yet, run the previous
//!    state's exit, then the current state's entry, and publish a
//!    system-status frame;
//! 3. run the current state's handler;
//! 4. ask the current state's transition function for a successor and
//!    adopt it.
//!
//! A successor adopted in step 4 has its entry run at the top of the
//! *next* tick, so entry and exit each run exactly once per visit no
//! matter how long the machine parks in a state.

pub mod context;
pub mod states;

use log::info;

use context::SmContext;

/// Supervisory control states, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControlState {
    Init = 0,
    Off = 1,
    Standby = 2,
    Cooling = 3,
    CriticalTemp = 4,
    Fault = 5,
}

impl ControlState {
    pub const COUNT: usize = 6;

    /// Wire code used in the system-status frame.
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Init),
            1 => Some(Self::Off),
            2 => Some(Self::Standby),
            3 => Some(Self::Cooling),
            4 => Some(Self::CriticalTemp),
            5 => Some(Self::Fault),
            _ => None,
        }
    }
}

/// Per-state behaviour table entry.
///
/// `on_transition` is mandatory and side-effect free; the optional
/// callbacks carry all the side effects.
pub struct StateDescriptor {
    pub id: ControlState,
    pub name: &'static str,
    pub on_entry: Option<fn(&mut SmContext)>,
    pub on_handler: Option<fn(&mut SmContext)>,
    pub on_transition: fn(&SmContext) -> Option<ControlState>,
    pub on_exit: Option<fn(&mut SmContext)>,
}

/// The state-machine engine.  Owns the table and the current/entered
/// bookkeeping; all domain data lives in the [`SmContext`] it is driven
/// with.
pub struct Supervisor {
    table: [StateDescriptor; ControlState::COUNT],
    current: ControlState,
    /// The state whose entry has run.  `None` until the first tick;
    /// lagging `current` by one tick across a transition.
    applied: Option<ControlState>,
    tick_count: u64,
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            table: states::build_state_table(),
            current: ControlState::Init,
            applied: None,
            tick_count: 0,
        }
    }

    pub fn current_state(&self) -> ControlState {
        self.current
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Human-readable name of the current state.
    pub fn state_name(&self) -> &'static str {
        self.table[self.current as usize].name
    }

    /// Run one supervisory tick.
    pub fn update(&mut self, ctx: &mut SmContext) {
        ctx.refresh_inputs();

        if self.applied != Some(self.current) {
            if let Some(previous) = self.applied {
                if let Some(exit) = self.table[previous as usize].on_exit {
                    exit(ctx);
                }
            }
            if let Some(entry) = self.table[self.current as usize].on_entry {
                entry(ctx);
            }
            self.applied = Some(self.current);
            ctx.publish_system_status(self.current);
        }

        if let Some(handler) = self.table[self.current as usize].on_handler {
            handler(ctx);
        }

        if let Some(next) = (self.table[self.current as usize].on_transition)(ctx) {
            if next != self.current {
                info!(
                    "state transition: {} -> {}",
                    self.table[self.current as usize].name, self.table[next as usize].name
                );
                self.current = next;
            }
        }

        self.tick_count += 1;
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemConfig;
    use crate::drivers::actuator::ActuatorMode;
    use crate::safety::FaultFlag;
    use crate::sensors::switches::{CoolantLevel, IgnitionState};

    fn setup() -> (Supervisor, SmContext) {
        (Supervisor::new(), SmContext::new(SystemConfig::default()))
    }

    fn tick_n(sup: &mut Supervisor, ctx: &mut SmContext, n: usize) {
        for _ in 0..n {
            sup.update(ctx);
        }
    }

    #[test]
    fn boots_through_standby_to_cooling() {
        let (mut sup, mut ctx) = setup();
        assert_eq!(sup.current_state(), ControlState::Init);

        sup.update(&mut ctx);
        assert!(ctx.init_ok);
        assert_eq!(sup.current_state(), ControlState::Standby);

        sup.update(&mut ctx);
        assert_eq!(sup.current_state(), ControlState::Cooling);
        assert!(ctx.pump.status().enabled);
        assert!(ctx.fan.status().enabled);
    }

    #[test]
    fn ignition_off_at_boot_parks_in_off() {
        let (mut sup, mut ctx) = setup();
        ctx.dio.sim_set_ignition(IgnitionState::Off);

        tick_n(&mut sup, &mut ctx, 3);
        assert_eq!(sup.current_state(), ControlState::Off);
        assert!(!ctx.pump.status().enabled);
        assert!(!ctx.fan.status().enabled);
    }

    #[test]
    fn unknown_ignition_at_boot_faults() {
        let (mut sup, mut ctx) = setup();
        ctx.dio.sim_set_ignition(IgnitionState::Unknown);

        sup.update(&mut ctx);
        assert_eq!(sup.current_state(), ControlState::Fault);
    }

    #[test]
    fn sustained_demand_saturates_pump_and_engages_fan() {
        let (mut sup, mut ctx) = setup();
        tick_n(&mut sup, &mut ctx, 3);
        assert_eq!(sup.current_state(), ControlState::Cooling);

        // ~16 C against the 25 C setpoint holds a positive error, so the
        // integral term winds the output up to the +100 clamp.
        tick_n(&mut sup, &mut ctx, 200);
        let pump = ctx.pump.status();
        let fan = ctx.fan.status();
        assert_eq!(pump.mode, ActuatorMode::SpeedControl);
        assert_eq!(pump.duty_cycle, 100.0);
        // Fan takes the excess above the assist threshold.
        assert_eq!(fan.duty_cycle, 100.0 - ctx.config.fan_assist_threshold);
    }

    #[test]
    fn mild_demand_runs_pump_only() {
        let (mut sup, mut ctx) = setup();
        tick_n(&mut sup, &mut ctx, 4);
        assert_eq!(sup.current_state(), ControlState::Cooling);

        // Early in the wind-up the output is below the assist threshold:
        // the pump carries it alone.
        let pump = ctx.pump.status();
        assert_eq!(pump.mode, ActuatorMode::SpeedControl);
        assert!(pump.duty_cycle > 0.0);
        assert!(pump.duty_cycle < ctx.config.fan_assist_threshold);
        assert_eq!(ctx.fan.status().duty_cycle, 0.0);
    }

    #[test]
    fn readings_above_setpoint_floor_the_pump_at_zero() {
        let (mut sup, mut ctx) = setup();
        // error = setpoint - temperature: ~66 C against 25 C saturates the
        // controller at the lower clamp, which the actuator floors at 0.
        ctx.temp_sensor.sim_set_adc(3600);
        tick_n(&mut sup, &mut ctx, 4);

        assert_eq!(sup.current_state(), ControlState::Cooling);
        assert_eq!(ctx.pump.status().duty_cycle, 0.0);
        assert_eq!(ctx.fan.status().duty_cycle, 0.0);
    }

    #[test]
    fn critical_temperature_forces_max_cooling() {
        let (mut sup, mut ctx) = setup();
        tick_n(&mut sup, &mut ctx, 3);
        assert_eq!(sup.current_state(), ControlState::Cooling);

        ctx.temp_sensor.sim_set_adc(4050); // ~80.9 C
        sup.update(&mut ctx);
        assert_eq!(sup.current_state(), ControlState::CriticalTemp);

        // Entry runs on the next tick and slams both actuators; a reading
        // still critical after that tick escalates to Fault.
        sup.update(&mut ctx);
        assert_eq!(ctx.pump.status().mode, ActuatorMode::Max);
        assert_eq!(ctx.fan.status().mode, ActuatorMode::Max);
        assert!(ctx.faults.is_set(FaultFlag::CriticalTemp));
        assert_eq!(sup.current_state(), ControlState::Fault);
    }

    #[test]
    fn critical_recovers_to_cooling_when_temperature_drops() {
        let (mut sup, mut ctx) = setup();
        tick_n(&mut sup, &mut ctx, 3);
        assert_eq!(sup.current_state(), ControlState::Cooling);

        ctx.temp_sensor.sim_set_adc(4050);
        sup.update(&mut ctx);
        assert_eq!(sup.current_state(), ControlState::CriticalTemp);

        // Max cooling works: the next reading is merely High, so the
        // machine drops back into closed-loop cooling.
        ctx.temp_sensor.sim_set_adc(3600);
        sup.update(&mut ctx);
        assert_eq!(sup.current_state(), ControlState::Cooling);

        // Sticky record of the excursion survives recovery.
        assert!(ctx.faults.is_set(FaultFlag::CriticalTemp));
    }

    #[test]
    fn low_coolant_faults_within_one_tick_and_maxes_actuators() {
        let (mut sup, mut ctx) = setup();
        tick_n(&mut sup, &mut ctx, 3);
        assert_eq!(sup.current_state(), ControlState::Cooling);

        ctx.dio.sim_set_level(CoolantLevel::Low);
        sup.update(&mut ctx);
        assert_eq!(sup.current_state(), ControlState::Fault);

        sup.update(&mut ctx);
        assert_eq!(ctx.pump.status().mode, ActuatorMode::Max);
        assert_eq!(ctx.fan.status().mode, ActuatorMode::Max);
        assert!(ctx.faults.is_set(FaultFlag::LowCoolant));
    }

    #[test]
    fn invalid_temperature_faults_from_cooling() {
        let (mut sup, mut ctx) = setup();
        tick_n(&mut sup, &mut ctx, 3);

        ctx.temp_sensor.sim_set_adc(4095);
        sup.update(&mut ctx);
        assert_eq!(sup.current_state(), ControlState::Fault);
        assert!(ctx.faults.is_set(FaultFlag::TempInvalid));
    }

    #[test]
    fn actuator_fault_routes_to_fault_state() {
        let (mut sup, mut ctx) = setup();
        tick_n(&mut sup, &mut ctx, 3);

        ctx.pump.inject_fault();
        sup.update(&mut ctx);
        assert_eq!(sup.current_state(), ControlState::Fault);
        assert!(ctx.faults.is_set(FaultFlag::PumpFault));
    }

    #[test]
    fn fault_recovers_to_standby_once_conditions_clear() {
        let (mut sup, mut ctx) = setup();
        tick_n(&mut sup, &mut ctx, 3);
        ctx.dio.sim_set_level(CoolantLevel::Low);
        tick_n(&mut sup, &mut ctx, 2);
        assert_eq!(sup.current_state(), ControlState::Fault);

        // Still Low: parked.
        tick_n(&mut sup, &mut ctx, 5);
        assert_eq!(sup.current_state(), ControlState::Fault);

        ctx.dio.sim_set_level(CoolantLevel::Normal);
        sup.update(&mut ctx);
        assert_eq!(sup.current_state(), ControlState::Standby);
        sup.update(&mut ctx);
        assert_eq!(sup.current_state(), ControlState::Cooling);

        // The sticky byte still carries the history.
        assert!(ctx.faults.is_set(FaultFlag::LowCoolant));
    }

    #[test]
    fn off_returns_to_standby_when_ignition_restored() {
        let (mut sup, mut ctx) = setup();
        tick_n(&mut sup, &mut ctx, 3);

        ctx.dio.sim_set_ignition(IgnitionState::Off);
        sup.update(&mut ctx);
        assert_eq!(sup.current_state(), ControlState::Off);
        sup.update(&mut ctx);
        assert!(!ctx.pump.status().enabled);

        ctx.dio.sim_set_ignition(IgnitionState::On);
        sup.update(&mut ctx);
        assert_eq!(sup.current_state(), ControlState::Standby);
    }

    #[test]
    fn entry_runs_once_while_parked() {
        let (mut sup, mut ctx) = setup();
        ctx.dio.sim_set_ignition(IgnitionState::Off);
        tick_n(&mut sup, &mut ctx, 2);
        assert_eq!(sup.current_state(), ControlState::Off);

        // Entry published one status frame; ten parked ticks add none.
        sup.update(&mut ctx);
        let tx_after_entry = ctx.bus.stats().tx_count;
        tick_n(&mut sup, &mut ctx, 10);
        assert_eq!(ctx.bus.stats().tx_count, tx_after_entry);
    }

    #[test]
    fn state_table_order_matches_ids() {
        let table = states::build_state_table();
        for (index, descriptor) in table.iter().enumerate() {
            assert_eq!(ControlState::from_index(index), Some(descriptor.id));
            assert_eq!(descriptor.id as usize, index);
        }
    }

    #[test]
    fn state_codes_are_stable() {
        assert_eq!(ControlState::Init.code(), 0);
        assert_eq!(ControlState::Off.code(), 1);
        assert_eq!(ControlState::Standby.code(), 2);
        assert_eq!(ControlState::Cooling.code(), 3);
        assert_eq!(ControlState::CriticalTemp.code(), 4);
        assert_eq!(ControlState::Fault.code(), 5);
        assert_eq!(ControlState::from_index(6), None);
    }
}
