//! Gamma 2.2 transform between stored and display color intensities.
//!
//! Colors are held in memory as 8-bit intensities (0–255). On the way into a
//! point-cloud file they are gamma *encoded*; on the way back they are gamma
//! *decoded*. The transform is the classic power curve with γ = 2.2, applied
//! per channel. Quantization to 8 bits truncates, so a full round trip may
//! drift by at most one intensity step.

/// Gamma exponent used for both directions of the transform.
pub const GAMMA: f64 = 2.2;

/// Gamma-encodes a stored 8-bit channel into the 0–255 display domain.
///
/// Computes `(c/255)^(1/2.2) * 255` without quantizing; the writer decides
/// whether to truncate to an integer or normalize to `[0, 1]`.
pub fn encode(channel: u8) -> f64 {
    (channel as f64 / 255.0).powf(1.0 / GAMMA) * 255.0
}

/// Gamma-decodes a normalized `[0, 1]` file value back to a stored 8-bit
/// channel.
///
/// Computes `v^2.2 * 255` truncated to an integer, clamped into range so a
/// file carrying slightly out-of-range values cannot wrap.
pub fn decode(normalized: f64) -> u8 {
    let raw = normalized.powf(GAMMA) * 255.0;
    if raw <= 0.0 {
        0
    } else if raw >= 255.0 {
        255
    } else {
        raw as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_fixed() {
        assert_eq!(encode(0), 0.0);
        assert!((encode(255) - 255.0).abs() < 1e-9);
        assert_eq!(decode(0.0), 0);
        assert_eq!(decode(1.0), 255);
    }

    #[test]
    fn test_round_trip_within_one_step() {
        for c in 0..=255u8 {
            let encoded = encode(c);
            let back = decode(encoded / 255.0);
            assert!(
                (back as i16 - c as i16).abs() <= 1,
                "channel {} round-tripped to {}",
                c,
                back
            );
        }
    }

    #[test]
    fn test_encode_monotonic() {
        let mut prev = encode(0);
        for c in 1..=255u8 {
            let next = encode(c);
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn test_decode_clamps_out_of_range() {
        assert_eq!(decode(-0.5), 0);
        assert_eq!(decode(1.5), 255);
    }
}
