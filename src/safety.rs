//! Sticky fault register.
//!
//! The register accumulates every fault condition ever observed as a
//! bitmask and packs it into one byte for the system-status telemetry
//! frame.  Bits are **set-only**: nothing in the system clears them, so
//! the transmitted fault byte can only grow over process lifetime.  This
//! is intentional — the byte is a "what has ever gone wrong" record, not
//! the live fault picture.  Transition decisions use the per-tick
//! aggregate fault boolean recomputed from current readings instead
//! (see `fsm::context`).

use core::fmt;
use log::error;

/// Individual sticky fault flags, one bit each.
///
/// Bit 0 is reserved (historically a "no fault" marker that was never
/// written); the wire layout keeps it free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultFlag {
    /// Subsystem initialisation failed.
    InitFailed = 0b0000_0010,
    /// Coolant level read Low.
    LowCoolant = 0b0000_0100,
    /// Temperature classified CriticalHigh.
    CriticalTemp = 0b0000_1000,
    /// Fan reported mode Fault.
    FanFault = 0b0001_0000,
    /// Pump reported mode Fault.
    PumpFault = 0b0010_0000,
    /// Temperature reading classified Invalid.
    TempInvalid = 0b0100_0000,
}

impl FaultFlag {
    /// Return the bitmask for this flag.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for FaultFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed => write!(f, "initialisation failed"),
            Self::LowCoolant => write!(f, "coolant level low"),
            Self::CriticalTemp => write!(f, "critical temperature"),
            Self::FanFault => write!(f, "fan fault"),
            Self::PumpFault => write!(f, "pump fault"),
            Self::TempInvalid => write!(f, "temperature invalid"),
        }
    }
}

/// Accumulate-only fault record, packed into one byte for telemetry.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultRegister {
    bits: u8,
}

impl FaultRegister {
    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    /// Latch a fault flag.  Logs on the first occurrence only.
    pub fn record(&mut self, flag: FaultFlag) {
        if self.bits & flag.mask() == 0 {
            error!("FAULT LATCHED: {flag}");
        }
        self.bits |= flag.mask();
    }

    /// Check whether a specific flag has ever been latched.
    pub fn is_set(&self, flag: FaultFlag) -> bool {
        self.bits & flag.mask() != 0
    }

    /// True if any fault has ever been latched.
    pub fn any_recorded(&self) -> bool {
        self.bits != 0
    }

    /// The packed byte transmitted in the system-status frame.
    pub fn packed(&self) -> u8 {
        self.bits
    }
}
