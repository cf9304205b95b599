//! Actuator drivers and their hardware shims.

pub mod actuator;
pub mod pwm;
