//! Divisor-based sample-rate model
//!
//! Source rates are expressed as `FIXED_SAMPLE_RATE_DIVIDEND / divisor`,
//! matching hardware that derives its audio clock by dividing a fixed
//! system clock. The two divisors produced by real hardware yield exactly
//! 48000 Hz and 32000 Hz, but any positive divisor is accepted.

/// Fixed dividend for divisor-based sample rates (54 MHz system clock, doubled).
pub const FIXED_SAMPLE_RATE_DIVIDEND: u32 = 54_000_000 * 2;

/// Divisor yielding exactly 48000 Hz.
pub const DIVISOR_48KHZ: u32 = 2250;

/// Divisor yielding exactly 32000 Hz.
pub const DIVISOR_32KHZ: u32 = 3375;

/// Convert a rate divisor to a sample rate in Hz (integer division).
///
/// Divisors that do not divide the dividend evenly are truncated; callers
/// that care about the exact rational use the dividend/divisor pair directly
/// (see the extended-float encoder).
pub fn sample_rate_hz(divisor: u32) -> u32 {
    debug_assert!(divisor > 0, "sample rate divisor must be non-zero");
    FIXED_SAMPLE_RATE_DIVIDEND / divisor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_divisors() {
        assert_eq!(sample_rate_hz(DIVISOR_48KHZ), 48_000);
        assert_eq!(sample_rate_hz(DIVISOR_32KHZ), 32_000);
    }

    #[test]
    fn odd_divisor_truncates() {
        // 108000000 / 7 = 15428571.43, integer division truncates
        assert_eq!(sample_rate_hz(7), 15_428_571);
    }
}
