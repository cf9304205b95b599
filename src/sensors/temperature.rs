//! Coolant temperature sensor backed by a simulated ADC.
//!
//! The simulated converter idles near mid-scale and wanders in a small
//! sawtooth, standing in for a real analog front end.  Readings are
//! converted linearly to Celsius and classified against the configured
//! High/CriticalHigh thresholds; rail-clipped ADC samples (0 or
//! full-scale) classify as Invalid.

use log::info;

const ADC_MAX: u16 = 4095;
const ADC_MIN: u16 = 0;
const ADC_VREF_VOLTS: f32 = 3.3;
/// Degrees Celsius per volt of the linear front end.
const SENSOR_SLOPE: f32 = 40.0;
/// Celsius reading at zero volts.
const SENSOR_OFFSET: f32 = -50.0;

/// Classification of a temperature reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TempStatus {
    Ok = 0,
    High = 1,
    CriticalHigh = 2,
    Invalid = 3,
}

impl TempStatus {
    /// Wire code used in the temperature telemetry frame.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// One temperature sample.
#[derive(Debug, Clone, Copy)]
pub struct TempReading {
    pub celsius: f32,
    pub status: TempStatus,
}

impl Default for TempReading {
    fn default() -> Self {
        Self {
            celsius: 0.0,
            status: TempStatus::Invalid,
        }
    }
}

/// Simulated-ADC temperature source.
pub struct TemperatureSensor {
    high_threshold_c: f32,
    critical_threshold_c: f32,
    sim_adc: u16,
    /// While true, the simulated ADC advances its sawtooth on every read.
    /// Cleared by `sim_set_adc` so injected values hold steady.
    sim_auto: bool,
}

impl TemperatureSensor {
    pub fn new(high_threshold_c: f32, critical_threshold_c: f32) -> Self {
        Self {
            high_threshold_c,
            critical_threshold_c,
            sim_adc: 2048,
            sim_auto: true,
        }
    }

    /// Prepare the sensor front end.  The simulated converter needs no
    /// setup; a hardware build would configure the ADC channel here.
    pub fn init(&mut self) -> bool {
        info!("temperature sensor initialized");
        true
    }

    /// Sample, convert and classify the current temperature.
    pub fn read(&mut self) -> TempReading {
        let raw = self.read_adc();

        if raw <= ADC_MIN || raw >= ADC_MAX {
            return TempReading {
                celsius: 0.0,
                status: TempStatus::Invalid,
            };
        }

        let voltage = (f32::from(raw) / f32::from(ADC_MAX)) * ADC_VREF_VOLTS;
        let celsius = voltage * SENSOR_SLOPE + SENSOR_OFFSET;

        let status = if celsius > self.critical_threshold_c {
            TempStatus::CriticalHigh
        } else if celsius > self.high_threshold_c {
            TempStatus::High
        } else {
            TempStatus::Ok
        };

        TempReading { celsius, status }
    }

    /// Pin the simulated ADC to a fixed raw value (stops the sawtooth).
    pub fn sim_set_adc(&mut self, raw: u16) {
        self.sim_adc = raw;
        self.sim_auto = false;
    }

    fn read_adc(&mut self) -> u16 {
        let raw = self.sim_adc;
        if self.sim_auto {
            // Sawtooth around mid-scale: drift up to ~2100, then back down.
            self.sim_adc = if self.sim_adc > 2100 {
                self.sim_adc - 10
            } else {
                self.sim_adc + 10
            };
        }
        raw
    }
}
