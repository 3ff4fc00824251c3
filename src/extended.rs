//! 80-bit extended-precision float encoding
//!
//! The AIFF `COMM` chunk stores the sample rate as an 80-bit IEEE-754
//! extended-precision float: a 16-bit biased exponent (bias 16383, sign bit
//! folded into the top bit) followed by a 64-bit significand with an
//! *explicit* leading integer bit, unlike binary64's implicit one.
//!
//! Rust has no extended float type, so two pure strategies cover every host:
//! re-biasing the bits of an f64 (always available, f64 is IEEE-754
//! binary64), and normalizing the exact integer quotient by left shifts.
//! [`encode`] dispatches on exactness; both produce bit-identical results
//! for exactly representable rates.
//!
//! Bit access goes through [`f64::to_bits`], never overlapping storage.

/// An encoded 80-bit extended-precision value, split into the two fields the
/// AIFF header writes (both big-endian on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedRate {
    /// Sign bit plus 15-bit biased exponent (bias 16383).
    pub exponent: u16,
    /// 64-bit significand; bit 63 is the explicit leading integer bit.
    pub significand: u64,
}

impl ExtendedRate {
    /// Positive zero.
    pub const ZERO: ExtendedRate = ExtendedRate {
        exponent: 0,
        significand: 0,
    };
}

const EXTENDED_BIAS: i32 = 0x3FFF;
const F64_BIAS: i32 = 0x3FF;
const F64_MANTISSA_BITS: u32 = 52;

/// Encode `dividend / divisor` as an 80-bit extended float.
///
/// Exact integer quotients take the integer-normalization path; everything
/// else rounds through f64 first. For rates that are exact the two paths
/// agree bit for bit.
pub fn encode(dividend: u32, divisor: u32) -> ExtendedRate {
    if divisor == 0 {
        return ExtendedRate::ZERO;
    }
    if dividend % divisor == 0 {
        encode_exact(u64::from(dividend / divisor))
    } else {
        encode_f64(f64::from(dividend) / f64::from(divisor))
    }
}

/// Encode a positive f64 by re-biasing its exponent and widening its
/// mantissa.
///
/// The 11-bit exponent moves to the 15-bit bias (`0x3FFF + (e - 0x3FF)`),
/// the 52-bit mantissa shifts into the top 63 bits, and the explicit
/// integer bit is forced to 1.
pub fn encode_f64(rate: f64) -> ExtendedRate {
    if rate <= 0.0 || !rate.is_normal() {
        return ExtendedRate::ZERO;
    }

    let bits = rate.to_bits();
    let exp11 = ((bits >> F64_MANTISSA_BITS) & 0x7FF) as i32;
    let mantissa = bits & ((1u64 << F64_MANTISSA_BITS) - 1);

    let exponent = (EXTENDED_BIAS + (exp11 - F64_BIAS)) as u16;
    let significand = (mantissa << (63 - F64_MANTISSA_BITS)) | (1u64 << 63);

    ExtendedRate {
        exponent,
        significand,
    }
}

/// Encode an exact integer value by shift normalization: start with the
/// value itself as the significand and exponent `0x3FFF + 63`, then shift
/// left until the explicit integer bit lands at bit 63.
pub fn encode_exact(value: u64) -> ExtendedRate {
    if value == 0 {
        return ExtendedRate::ZERO;
    }

    let mut significand = value;
    let mut exponent = (EXTENDED_BIAS + 63) as u16;
    while significand & (1u64 << 63) == 0 {
        significand <<= 1;
        exponent -= 1;
    }

    ExtendedRate {
        exponent,
        significand,
    }
}
