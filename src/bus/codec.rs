//! Payload encodings for the field-bus frames.
//!
//! Two encodings are in use:
//!
//! - **Float fields** (temperature, duty cycle, setpoint command) travel
//!   as 4-byte little-endian IEEE-754 single precision and round-trip
//!   byte-for-byte.
//! - **PID parameters** travel as scaled fixed point: gains ×1000 and
//!   setpoint ×10, each truncated into an unsigned 16-bit field, packed
//!   little-endian.  Lossy by design (≈0.001 resolution for gains, 0.1
//!   for the setpoint) and silently saturated outside the representable
//!   range — a boundary condition of the protocol, not a defect.

/// Scale factor for kp/ki/kd in the PID-parameters frame.
pub const GAIN_SCALE: f32 = 1000.0;
/// Scale factor for the setpoint in the PID-parameters frame.
pub const SETPOINT_SCALE: f32 = 10.0;

/// Encode a float as 4 little-endian IEEE-754 bytes.
pub fn float_to_bytes(value: f32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Decode 4 little-endian IEEE-754 bytes back to a float.
pub fn bytes_to_float(data: &[u8; 4]) -> f32 {
    f32::from_le_bytes(*data)
}

/// Scale a gain into its 16-bit wire field.
pub fn encode_gain(value: f32) -> u16 {
    (value * GAIN_SCALE) as u16
}

/// Recover a gain from its 16-bit wire field.
pub fn decode_gain(raw: u16) -> f32 {
    f32::from(raw) / GAIN_SCALE
}

/// Scale a setpoint into its 16-bit wire field.
pub fn encode_setpoint(value: f32) -> u16 {
    (value * SETPOINT_SCALE) as u16
}

/// Recover a setpoint from its 16-bit wire field.
pub fn decode_setpoint(raw: u16) -> f32 {
    f32::from(raw) / SETPOINT_SCALE
}

/// Read a little-endian u16 from the first two bytes of a slice.
pub fn u16_from_le(data: &[u8]) -> u16 {
    u16::from_le_bytes([data[0], data[1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_roundtrip_exact() {
        for v in [0.0_f32, 1.234, -5.678, 100.5, -0.001, f32::MIN, f32::MAX] {
            assert_eq!(bytes_to_float(&float_to_bytes(v)), v);
        }
    }

    #[test]
    fn float_bytes_are_little_endian() {
        assert_eq!(float_to_bytes(1.0), [0x00, 0x00, 0x80, 0x3F]);
    }

    #[test]
    fn gain_encoding_resolution() {
        assert_eq!(encode_gain(1.234), 1234);
        assert!((decode_gain(1234) - 1.234).abs() < 1e-6);
        // Below one millistep truncates to zero.
        assert_eq!(encode_gain(0.0004), 0);
    }

    #[test]
    fn setpoint_encoding_resolution() {
        assert_eq!(encode_setpoint(45.6), 455); // f32 45.6 is just under 45.6
        assert_eq!(encode_setpoint(45.5), 455);
        assert!((decode_setpoint(456) - 45.6).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_values_saturate() {
        assert_eq!(encode_gain(70.0), u16::MAX); // 70 000 > 65 535
        assert_eq!(encode_gain(-1.0), 0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn float_roundtrip_for_all_finite(v in any::<f32>().prop_filter("finite", |f| f.is_finite())) {
            prop_assert_eq!(bytes_to_float(&float_to_bytes(v)), v);
        }

        #[test]
        fn gain_roundtrip_within_resolution(v in 0.0f32..60.0) {
            let back = decode_gain(encode_gain(v));
            // Truncation: the recovered value is within one scale step below.
            prop_assert!(back <= v + 1e-6);
            prop_assert!(v - back < 1.0 / GAIN_SCALE + 1e-4);
        }
    }
}
