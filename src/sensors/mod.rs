//! Simulated sensor and switch inputs.
//!
//! These are the boundary collaborators of the control core: a simulated
//! analog temperature source and simulated digital ignition/coolant-level
//! inputs.  Each exposes `sim_*` injection hooks so host tests can drive
//! the supervisor deterministically.

pub mod switches;
pub mod temperature;
