//! Conversions between raw MCP9808 register bytes and degrees Celsius.
//!
//! Temperatures and limits are sign-magnitude values. Limits are stored with
//! quarter-degree precision; the fraction of a requested limit is bucketed by
//! [`quantize_fraction`] rather than rounded.

/// Limits must stay strictly inside this magnitude to fit the 8-bit integer part.
pub const THRESHOLD_MAGNITUDE_MAX: f32 = 256.0;

const SIGN: u8 = 0x10;
const FRACTION_MASK: u8 = 0x0c;

/// Decode the ambient temperature register.
///
/// The three alert status bits in the top of `msb` are discarded. A set sign
/// bit yields `256 - magnitude`, which is the device's documented formula.
pub fn decode_temperature(msb: u8, lsb: u8) -> f32 {
    let msb = msb & 0x1f;

    if msb & SIGN == SIGN {
        256.0 - (f32::from(msb & 0x0f) * 16.0 + f32::from(lsb) / 16.0)
    } else {
        f32::from(msb) * 16.0 + f32::from(lsb) / 16.0
    }
}

/// Map the hundredths of a non-negative `value` onto a quarter-degree code.
///
/// | hundredths | code   | fraction |
/// |------------|--------|----------|
/// | 0          | `0x00` | .00      |
/// | 1 ..= 25   | `0x04` | .25      |
/// | 26 ..= 50  | `0x08` | .50      |
/// | 51 ..= 99  | `0x0c` | .75      |
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quantize_fraction(value: f32) -> u8 {
    let cents = hundredths(value).saturating_sub((value as u32).saturating_mul(100));

    match cents {
        0 => 0x00,
        1..=25 => 0x04,
        26..=50 => 0x08,
        _ => 0x0c,
    }
}

/// `trunc(value * 100)` for a non-negative `value`. Products within f32
/// rounding error of a whole count snap to it, so `33.01` gives 3301 rather
/// than 3300.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn hundredths(value: f32) -> u32 {
    let scaled = value * 100.0;
    let nearest = (scaled + 0.5) as u32;
    let distance = if scaled > nearest as f32 {
        scaled - nearest as f32
    } else {
        nearest as f32 - scaled
    };

    if distance <= scaled * f32::EPSILON * 2.0 {
        nearest
    } else {
        scaled as u32
    }
}

/// Encode a limit temperature into the T_UPPER/T_LOWER/T_CRIT layout.
///
/// Callers are expected to have checked that `value` is finite and its
/// magnitude is below [`THRESHOLD_MAGNITUDE_MAX`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn encode_threshold(value: f32) -> [u8; 2] {
    let sign = if value < 0.0 { SIGN } else { 0 };
    let magnitude = if value < 0.0 { -value } else { value };
    let integer = magnitude as u8;

    [
        sign | (integer >> 4),
        ((integer & 0x0f) << 4) | quantize_fraction(magnitude),
    ]
}

/// Decode a limit register back into degrees Celsius.
pub fn decode_threshold(msb: u8, lsb: u8) -> f32 {
    let integer = ((msb & 0x0f) << 4) | (lsb >> 4);
    let magnitude = f32::from(integer) + f32::from(lsb & FRACTION_MASK) * 0.0625;

    if msb & SIGN == SIGN {
        -magnitude
    } else {
        magnitude
    }
}

/// Whether `value` can be represented in a limit register.
pub fn is_valid_threshold(value: f32) -> bool {
    value.is_finite() && value > -THRESHOLD_MAGNITUDE_MAX && value < THRESHOLD_MAGNITUDE_MAX
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn decode_positive_temperature() {
        assert_approx_eq!(decode_temperature(0x01, 0x90), 25.0, 1e-4);
        assert_approx_eq!(decode_temperature(0x00, 0x00), 0.0, 1e-4);
        assert_approx_eq!(decode_temperature(0x00, 0x04), 0.25, 1e-4);
        assert_approx_eq!(decode_temperature(0x0f, 0xff), 255.9375, 1e-4);
    }

    #[test]
    fn decode_ignores_alert_status_bits() {
        assert_approx_eq!(decode_temperature(0xe1, 0x90), 25.0, 1e-4);
        assert_approx_eq!(decode_temperature(0x41, 0x90), 25.0, 1e-4);
    }

    #[test]
    fn decode_sign_bit_set() {
        assert_approx_eq!(decode_temperature(0x13, 0x80), 200.0, 1e-4);
        assert_approx_eq!(decode_temperature(0xf3, 0x80), 200.0, 1e-4);
        assert_approx_eq!(decode_temperature(0x1f, 0xf0), 1.0, 1e-4);
    }

    #[test]
    fn quantize_buckets() {
        assert_eq!(quantize_fraction(0.0), 0x00);
        assert_eq!(quantize_fraction(0.10), 0x04);
        assert_eq!(quantize_fraction(0.30), 0x08);
        assert_eq!(quantize_fraction(0.60), 0x0c);
        assert_eq!(quantize_fraction(20.25), 0x04);
        assert_eq!(quantize_fraction(20.5), 0x08);
        assert_eq!(quantize_fraction(0.99), 0x0c);
        assert_eq!(quantize_fraction(35.0), 0x00);
        assert_eq!(quantize_fraction(33.01), 0x04);
        assert_eq!(quantize_fraction(32.26), 0x08);
        assert_eq!(quantize_fraction(32.51), 0x0c);
        assert_eq!(quantize_fraction(150.26), 0x08);
        assert_eq!(quantize_fraction(33.009), 0x00);
        assert_eq!(quantize_fraction(32.999), 0x0c);
    }

    #[test]
    fn encode_positive_threshold() {
        assert_eq!(encode_threshold(30.0), [0x01, 0xe0]);
        assert_eq!(encode_threshold(20.0), [0x01, 0x40]);
        assert_eq!(encode_threshold(35.0), [0x02, 0x30]);
        assert_eq!(encode_threshold(25.5), [0x01, 0x98]);
        assert_eq!(encode_threshold(100.75), [0x06, 0x4c]);
        assert_eq!(encode_threshold(33.01), [0x02, 0x14]);
        assert_eq!(encode_threshold(32.26), [0x02, 0x08]);
        assert_eq!(encode_threshold(32.51), [0x02, 0x0c]);
        assert_eq!(encode_threshold(150.26), [0x09, 0x68]);
    }

    #[test]
    fn encode_negative_threshold() {
        assert_eq!(encode_threshold(-10.0), [0x10, 0xa0]);
        assert_eq!(encode_threshold(-0.25), [0x10, 0x04]);
    }

    #[test]
    fn tiny_positive_threshold_is_not_negative() {
        assert_eq!(encode_threshold(0.000_001), [0x00, 0x00]);
    }

    #[test]
    fn threshold_round_trip_is_bucketed() {
        for (value, expected) in [
            (30.0, 30.0),
            (25.1, 25.25),
            (25.3, 25.5),
            (25.5, 25.5),
            (25.6, 25.75),
            (25.99, 25.75),
            (-10.1, -10.25),
            (-40.0, -40.0),
        ] {
            let [msb, lsb] = encode_threshold(value);
            assert_approx_eq!(decode_threshold(msb, lsb), expected, 1e-4);
        }
    }

    #[test]
    fn threshold_range() {
        assert!(is_valid_threshold(255.75));
        assert!(is_valid_threshold(-255.75));
        assert!(!is_valid_threshold(256.0));
        assert!(!is_valid_threshold(-256.0));
        assert!(!is_valid_threshold(f32::NAN));
        assert!(!is_valid_threshold(f32::INFINITY));
    }
}
