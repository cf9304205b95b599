//! Shared blackboard for the supervisory state machine.
//!
//! `SmContext` owns every subsystem the states touch — PID controller,
//! both actuators, bus manager, sensors — plus the per-tick input
//! snapshot and the sticky fault register.  State functions receive a
//! mutable borrow of the whole context and communicate only through it.

use log::{error, info, warn};

use crate::bus::{BusConfig, BusManager};
use crate::config::SystemConfig;
use crate::control::pid::PidController;
use crate::drivers::actuator::{Actuator, ActuatorId, ActuatorMode, ActuatorStatus};
use crate::fsm::ControlState;
use crate::safety::{FaultFlag, FaultRegister};
use crate::sensors::switches::{CoolantLevel, DioManager, IgnitionState};
use crate::sensors::temperature::{TempReading, TempStatus, TemperatureSensor};

/// Inputs sampled once at the top of each tick.  State functions read
/// this snapshot instead of the devices, so every decision within a tick
/// sees one consistent view.
#[derive(Debug, Clone, Copy)]
pub struct InputSnapshot {
    pub temp: TempReading,
    pub ignition: IgnitionState,
    pub coolant: CoolantLevel,
    pub pump: ActuatorStatus,
    pub fan: ActuatorStatus,
    /// Aggregate fault over the *current* readings: invalid or critical
    /// temperature, low coolant, or a faulted actuator.  Unlike the
    /// sticky register this clears when the condition clears.
    pub system_fault: bool,
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self {
            temp: TempReading::default(),
            ignition: IgnitionState::Unknown,
            coolant: CoolantLevel::Unknown,
            pump: ActuatorStatus::default(),
            fan: ActuatorStatus::default(),
            system_fault: false,
        }
    }
}

/// State-machine blackboard: owns the subsystems and the tick snapshot.
pub struct SmContext {
    pub config: SystemConfig,
    pub inputs: InputSnapshot,
    pub faults: FaultRegister,
    pub init_ok: bool,
    /// Last PID output applied by the cooling handler.
    pub pid_output: f32,

    pub pid: PidController,
    pub pump: Actuator,
    pub fan: Actuator,
    pub bus: BusManager,
    pub temp_sensor: TemperatureSensor,
    pub dio: DioManager,
}

impl SmContext {
    pub fn new(config: SystemConfig) -> Self {
        let bus = BusManager::new(config.control_loop_interval_ms, config.telemetry_interval_ms);
        let temp_sensor =
            TemperatureSensor::new(config.temp_high_threshold_c, config.temp_critical_threshold_c);
        Self {
            config,
            inputs: InputSnapshot::default(),
            faults: FaultRegister::new(),
            init_ok: false,
            pid_output: 0.0,
            pid: PidController::new(),
            pump: Actuator::new(ActuatorId::Pump),
            fan: Actuator::new(ActuatorId::Fan),
            bus,
            temp_sensor,
            dio: DioManager::new(),
        }
    }

    /// Bring up every subsystem.  A failure latches `InitFailed` and
    /// leaves `init_ok` false, which routes the machine to Fault.
    pub fn initialize(&mut self) -> bool {
        info!("initializing subsystems");

        let mut ok = true;
        ok &= self.pump.init();
        ok &= self.fan.init();
        ok &= self.temp_sensor.init();
        ok &= self.dio.init();
        self.bus.init(Some(BusConfig {
            baudrate: self.config.bus_baudrate,
        }));

        if !ok {
            self.faults.record(FaultFlag::InitFailed);
            error!("subsystem initialization failed");
        }
        self.init_ok = ok;
        ok
    }

    /// Sample all inputs, recompute the aggregate fault and latch the
    /// sticky flags for anything currently wrong.
    pub fn refresh_inputs(&mut self) {
        let temp = self.temp_sensor.read();
        let ignition = self.dio.read_ignition();
        let coolant = self.dio.read_level();
        let pump = self.pump.status();
        let fan = self.fan.status();

        let temp_invalid = temp.status == TempStatus::Invalid;
        let temp_critical = temp.status == TempStatus::CriticalHigh;
        let coolant_low = coolant == CoolantLevel::Low;
        let pump_fault = pump.mode == ActuatorMode::Fault;
        let fan_fault = fan.mode == ActuatorMode::Fault;

        if temp_invalid {
            self.faults.record(FaultFlag::TempInvalid);
        }
        if temp_critical {
            self.faults.record(FaultFlag::CriticalTemp);
        }
        if coolant_low {
            self.faults.record(FaultFlag::LowCoolant);
        }
        if pump_fault {
            self.faults.record(FaultFlag::PumpFault);
        }
        if fan_fault {
            self.faults.record(FaultFlag::FanFault);
        }

        self.inputs = InputSnapshot {
            temp,
            ignition,
            coolant,
            pump,
            fan,
            system_fault: temp_invalid || temp_critical || coolant_low || pump_fault || fan_fault,
        };
    }

    /// Emit a system-status frame for the given state.  Telemetry is
    /// best-effort; a transmit error is logged and swallowed.
    pub fn publish_system_status(&mut self, state: ControlState) {
        if let Err(err) = self.bus.send_system_status(
            state.code(),
            self.inputs.ignition.code(),
            self.inputs.coolant.code(),
            self.faults.packed(),
        ) {
            warn!("system status transmit failed: {err}");
        }
    }

    /// True when any of the conditions that force the Fault state holds:
    /// invalid temperature, low coolant, or a faulted actuator.  Critical
    /// temperature is deliberately *not* in this set — it has its own
    /// state.
    pub fn blocking_fault(&self) -> bool {
        self.inputs.temp.status == TempStatus::Invalid
            || self.inputs.coolant == CoolantLevel::Low
            || self.inputs.pump.mode == ActuatorMode::Fault
            || self.inputs.fan.mode == ActuatorMode::Fault
    }
}
