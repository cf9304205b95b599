//! State behaviour: the entry/handler/transition/exit functions wired
//! into the supervisor's state table.
//!
//! Transition functions only *decide*; they never touch hardware.  All
//! side effects live in entry, handler and exit functions, so a state
//! change observed in the table is always the full story of what ran.

use log::{error, info, trace};

use crate::fsm::context::SmContext;
use crate::fsm::{ControlState, StateDescriptor};
use crate::sensors::switches::IgnitionState;
use crate::sensors::temperature::TempStatus;

/// Build the supervisor's state table, indexed by [`ControlState`].
pub const fn build_state_table() -> [StateDescriptor; ControlState::COUNT] {
    [
        StateDescriptor {
            id: ControlState::Init,
            name: "INIT",
            on_entry: Some(init_entry),
            on_handler: None,
            on_transition: init_transition,
            on_exit: None,
        },
        StateDescriptor {
            id: ControlState::Off,
            name: "OFF",
            on_entry: Some(off_entry),
            on_handler: None,
            on_transition: off_transition,
            on_exit: None,
        },
        StateDescriptor {
            id: ControlState::Standby,
            name: "STANDBY",
            on_entry: Some(standby_entry),
            on_handler: None,
            on_transition: standby_transition,
            on_exit: None,
        },
        StateDescriptor {
            id: ControlState::Cooling,
            name: "COOLING",
            on_entry: None,
            on_handler: Some(cooling_handler),
            on_transition: cooling_transition,
            on_exit: None,
        },
        StateDescriptor {
            id: ControlState::CriticalTemp,
            name: "CRITICAL_TEMP",
            on_entry: Some(critical_entry),
            on_handler: None,
            on_transition: critical_transition,
            on_exit: Some(critical_exit),
        },
        StateDescriptor {
            id: ControlState::Fault,
            name: "FAULT",
            on_entry: Some(fault_entry),
            on_handler: None,
            on_transition: fault_transition,
            on_exit: Some(fault_exit),
        },
    ]
}

// ---------------------------------------------------------------------------
// INIT
// ---------------------------------------------------------------------------

fn init_entry(ctx: &mut SmContext) {
    ctx.initialize();
}

fn init_transition(ctx: &SmContext) -> Option<ControlState> {
    if !ctx.init_ok || ctx.inputs.system_fault {
        return Some(ControlState::Fault);
    }
    match ctx.inputs.ignition {
        IgnitionState::On => Some(ControlState::Standby),
        IgnitionState::Off => Some(ControlState::Off),
        IgnitionState::Unknown => Some(ControlState::Fault),
    }
}

// ---------------------------------------------------------------------------
// OFF
// ---------------------------------------------------------------------------

fn off_entry(ctx: &mut SmContext) {
    info!("ignition off, actuators disabled");
    ctx.pump.enable(false);
    ctx.fan.enable(false);
}

fn off_transition(ctx: &SmContext) -> Option<ControlState> {
    if ctx.inputs.system_fault {
        return Some(ControlState::Fault);
    }
    match ctx.inputs.ignition {
        IgnitionState::On => Some(ControlState::Standby),
        IgnitionState::Off => None,
        IgnitionState::Unknown => Some(ControlState::Fault),
    }
}

// ---------------------------------------------------------------------------
// STANDBY
// ---------------------------------------------------------------------------

fn standby_entry(ctx: &mut SmContext) {
    ctx.pid.reset();
    ctx.pump.enable(true);
    ctx.fan.enable(true);
}

fn standby_transition(ctx: &SmContext) -> Option<ControlState> {
    if ctx.inputs.system_fault {
        return Some(ControlState::Fault);
    }
    if ctx.inputs.ignition == IgnitionState::Off {
        return Some(ControlState::Off);
    }
    // Standby is a staging state: with everything healthy, cooling
    // starts on the next tick.
    Some(ControlState::Cooling)
}

// ---------------------------------------------------------------------------
// COOLING
// ---------------------------------------------------------------------------

fn cooling_handler(ctx: &mut SmContext) {
    let output = ctx.pid.compute(ctx.inputs.temp.celsius);
    ctx.pid_output = output;
    trace!(
        "cooling: temp {:.1} C, pid output {:.1}",
        ctx.inputs.temp.celsius,
        output
    );

    // Demand split: the pump carries the full control output; the fan
    // assists only with the excess above the threshold.
    ctx.pump.update_speed(output);
    if output < ctx.config.fan_assist_threshold {
        ctx.fan.update_speed(0.0);
    } else {
        ctx.fan.update_speed(output - ctx.config.fan_assist_threshold);
    }
}

fn cooling_transition(ctx: &SmContext) -> Option<ControlState> {
    // Critical temperature is excluded from the blocking set here so the
    // dedicated max-cooling state stays reachable.
    if ctx.blocking_fault() {
        return Some(ControlState::Fault);
    }
    if ctx.inputs.ignition == IgnitionState::Off {
        return Some(ControlState::Off);
    }
    if ctx.inputs.temp.status == TempStatus::CriticalHigh {
        return Some(ControlState::CriticalTemp);
    }
    None
}

// ---------------------------------------------------------------------------
// CRITICAL_TEMP
// ---------------------------------------------------------------------------

fn critical_entry(ctx: &mut SmContext) {
    error!(
        "CRITICAL temperature {:.1} C, forcing maximum cooling",
        ctx.inputs.temp.celsius
    );
    ctx.pid.reset();
    ctx.pump.set_max_speed();
    ctx.fan.set_max_speed();
}

fn critical_transition(ctx: &SmContext) -> Option<ControlState> {
    if ctx.blocking_fault() {
        return Some(ControlState::Fault);
    }
    // Max cooling gets exactly one tick to bring the temperature down;
    // a reading still critical after that escalates to Fault.
    match ctx.inputs.temp.status {
        TempStatus::CriticalHigh => return Some(ControlState::Fault),
        TempStatus::Ok | TempStatus::High => return Some(ControlState::Cooling),
        TempStatus::Invalid => {}
    }
    if ctx.inputs.ignition == IgnitionState::Off {
        return Some(ControlState::Off);
    }
    None
}

fn critical_exit(ctx: &mut SmContext) {
    info!(
        "leaving critical-temperature state at {:.1} C",
        ctx.inputs.temp.celsius
    );
}

// ---------------------------------------------------------------------------
// FAULT
// ---------------------------------------------------------------------------

fn fault_entry(ctx: &mut SmContext) {
    error!(
        "entering fault state (fault byte 0x{:02X}), actuators forced to maximum",
        ctx.faults.packed()
    );
    // Fail safe for a liquid-cooled system means full cooling, not
    // shutdown: a stopped pump under heat load is the worst case.
    ctx.pump.set_max_speed();
    ctx.fan.set_max_speed();
    ctx.publish_system_status(ControlState::Fault);
}

fn fault_transition(ctx: &SmContext) -> Option<ControlState> {
    // Recovery requires every live condition to have cleared; the sticky
    // register keeps the history but does not block recovery.  A failed
    // initialisation is not recoverable.
    if !ctx.init_ok || ctx.inputs.system_fault {
        return None;
    }
    if ctx.inputs.ignition == IgnitionState::On {
        return Some(ControlState::Standby);
    }
    None
}

fn fault_exit(ctx: &mut SmContext) {
    info!("fault conditions cleared");
    ctx.pid.reset();
}
