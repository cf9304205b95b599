//! System configuration parameters
//!
//! All tunable parameters for the coolant controller.  Values are plain
//! data with documented defaults; the binary applies CLI overrides for
//! setpoint and gains through the same PID setters the bus command path
//! uses.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Field bus ---
    /// Bus baud rate (bit/s)
    pub bus_baudrate: u32,

    // --- Timing ---
    /// Control loop tick period (milliseconds of logical time)
    pub control_loop_interval_ms: u32,
    /// Telemetry transmit interval (milliseconds of logical time)
    pub telemetry_interval_ms: u32,

    // --- Setpoint limits (CLI validation) ---
    /// Lowest accepted coolant setpoint (Celsius)
    pub setpoint_min_c: f32,
    /// Highest accepted coolant setpoint (Celsius)
    pub setpoint_max_c: f32,

    // --- Temperature classification ---
    /// Reading above this is classified High (Celsius)
    pub temp_high_threshold_c: f32,
    /// Reading above this is classified CriticalHigh (Celsius)
    pub temp_critical_threshold_c: f32,

    // --- Control split ---
    /// PID output level below which the fan stays off and the pump
    /// handles the full demand; above it the fan takes the excess.
    pub fan_assist_threshold: f32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            bus_baudrate: 250_000,

            control_loop_interval_ms: 100,
            telemetry_interval_ms: 1000,

            setpoint_min_c: 25.0,
            setpoint_max_c: 40.0,

            temp_high_threshold_c: 60.0,
            temp_critical_threshold_c: 80.0,

            fan_assist_threshold: 40.0,
        }
    }
}
