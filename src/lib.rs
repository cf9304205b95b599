//! Coolantctl library.
//!
//! Supervisory controller for a liquid-cooling loop: a PID temperature
//! controller feeding pump and fan actuators, a CAN-style field-bus
//! manager for commands and telemetry, and a table-driven supervisory
//! state machine tying them together.  All hardware boundaries are
//! simulated shims with injection hooks, so the whole control core runs
//! and tests on the host.

#![deny(unused_must_use)]

pub mod bus;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod safety;
pub mod sensors;
