// src/normalization.rs
//
// Fixed-point normalization of chain-reported balances. Amounts arrive as integer strings
// in the smallest denomination (uatom, lamports, MIST, yoctoNEAR, wei) and are converted
// to human-scale f64 only at the very end.

use crate::types::conversions::{parse_dec_u256, ConversionError};
use ethers::types::U256;

/// Largest power of ten applied through big-integer division. The remainder that is
/// left over after dividing by 10^15 is always < 2^53 and therefore exact in f64.
pub const MAX_SAFE_EXPONENT: u8 = 15;

/// Converts a raw integer string in the chain's smallest unit into a token amount.
///
/// The exponent is split into a safe portion (≤ 15 digits) applied with U256 integer
/// division and a remainder applied with float division at the end, so precision loss
/// is bounded to the trailing digits.
///
/// # Errors
///
/// `ConversionError::MalformedAmount` when `raw` is empty, signed or has non-digit characters.
pub fn to_decimal(raw: &str, exponent: u8) -> Result<f64, ConversionError> {
    let value = parse_dec_u256(raw)?;
    Ok(u256_to_f64(value, exponent))
}

/// Same as [`to_decimal`] for a value that is already parsed.
pub fn u256_to_f64(value: U256, exponent: u8) -> f64 {
    if value.is_zero() {
        return 0.0;
    }
    let safe = exponent.min(MAX_SAFE_EXPONENT);
    let rest = exponent - safe;

    let divisor = U256::exp10(safe as usize);
    let (quotient, remainder) = value.div_mod(divisor);

    // quotient can exceed u128 for 24-decimal chains with huge supplies; the decimal string
    // parse is correctly rounded
    let whole = u256_to_f64_lossy(quotient);
    let fraction = remainder.as_u64() as f64 / pow10_f64(safe);

    (whole + fraction) / pow10_f64(rest)
}

/// Nearest f64 to an integer U256.
pub fn u256_to_f64_lossy(value: U256) -> f64 {
    if value <= U256::from(u64::MAX) {
        return value.as_u64() as f64;
    }
    value.to_string().parse::<f64>().unwrap_or(f64::MAX)
}

#[inline]
fn pow10_f64(n: u8) -> f64 {
    10f64.powi(n as i32)
}
