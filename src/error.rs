//! Unified error types for the coolant controller.
//!
//! Follows embedded practice: small `Copy` enums per subsystem that every
//! caller can match on cheaply, funnelled into a single top-level `Error`
//! so the driving loop's error handling stays uniform.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A field-bus operation failed.
    Bus(BusError),
    /// A PID configuration mutation was rejected.
    Pid(PidError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Pid(e) => write!(f, "pid: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Field-bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Payload longer than the 8-byte frame limit.
    FrameTooLong,
    /// RX queue is empty.  Expected and non-fatal: poll again next tick.
    Timeout,
    /// RX queue at capacity; the offered frame was dropped.
    QueueFull,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameTooLong => write!(f, "frame payload exceeds 8 bytes"),
            Self::Timeout => write!(f, "no frame available"),
            Self::QueueFull => write!(f, "RX queue full, frame dropped"),
        }
    }
}

impl std::error::Error for BusError {}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// PID errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidError {
    /// Output limits rejected because `min >= max`.
    InvalidLimits,
}

impl fmt::Display for PidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLimits => write!(f, "output limits must satisfy min < max"),
        }
    }
}

impl std::error::Error for PidError {}

impl From<PidError> for Error {
    fn from(e: PidError) -> Self {
        Self::Pid(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
