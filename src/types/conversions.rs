use ethers::types::{Address, U256};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

// Non-negative base-10 integer as reported by chain APIs, e.g. "1500000000"
pub fn parse_dec_u256(raw: &str) -> Result<U256, ConversionError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConversionError::MalformedAmount(raw.to_string()));
    }
    U256::from_dec_str(raw).map_err(|_| ConversionError::MalformedAmount(raw.to_string()))
}

// eth_call results are 0x-prefixed hex quantities; "0x" alone means an empty return
pub fn parse_hex_u256(raw: &str) -> Result<U256, ConversionError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| ConversionError::InvalidHex(raw.to_string()))?;
    if digits.is_empty() {
        return Err(ConversionError::InvalidHex(raw.to_string()));
    }
    U256::from_str_radix(digits, 16).map_err(|_| ConversionError::InvalidHex(raw.to_string()))
}

/// Cosmos commission rates are decimal fractions ("0.050000000000000000" = 5%).
pub fn fraction_str_to_percent(rate: &str) -> Result<f64, ConversionError> {
    let value = Decimal::from_str(rate.trim())
        .map_err(|e| ConversionError::InvalidDecimal(format!("{rate}: {e}")))?;
    (value * Decimal::ONE_HUNDRED)
        .to_f64()
        .ok_or_else(|| ConversionError::InvalidDecimal(rate.to_string()))
}

/// Sui reports commission and voting power in basis points ("200" = 2%).
pub fn basis_points_to_percent(bps: &str) -> Result<f64, ConversionError> {
    let value = Decimal::from_str(bps.trim())
        .map_err(|e| ConversionError::InvalidDecimal(format!("{bps}: {e}")))?;
    (value / Decimal::ONE_HUNDRED)
        .to_f64()
        .ok_or_else(|| ConversionError::InvalidDecimal(bps.to_string()))
}

/// Near reward fee is a {numerator, denominator} pair.
pub fn ratio_to_percent(numerator: u64, denominator: u64) -> Result<f64, ConversionError> {
    if denominator == 0 {
        return Err(ConversionError::DivisionByZero);
    }
    let value = Decimal::from(numerator) * Decimal::ONE_HUNDRED / Decimal::from(denominator);
    value
        .to_f64()
        .ok_or_else(|| ConversionError::InvalidDecimal(format!("{numerator}/{denominator}")))
}

pub fn address_to_string(addr: Address) -> String {
    format!("{:?}", addr).to_lowercase()
}

pub fn string_to_address(s: &str) -> Result<Address, ConversionError> {
    Address::from_str(s).map_err(|e| ConversionError::InvalidAddress(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("Malformed amount: {0}")]
    MalformedAmount(String),
    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),
    #[error("Invalid hex quantity: {0}")]
    InvalidHex(String),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}
