//! Decimal helpers shared by pricing and coupons.
//!
//! Money is kept at two decimal places and rounded half-up at the cent
//! boundary. Quantities (fabric is sold by fractional meters) keep three.

use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode, Zero};

use super::errors::DomainError;

pub const MONEY_SCALE: i64 = 2;
pub const QUANTITY_SCALE: i64 = 3;

/// Exclusive upper bounds of the stored columns: quantities are
/// `NUMERIC(12,3)`, amounts `NUMERIC(12,2)`.
pub const QUANTITY_LIMIT: i64 = 1_000_000_000;
pub const AMOUNT_LIMIT: i64 = 10_000_000_000;

pub fn round_money(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(MONEY_SCALE, RoundingMode::HalfUp)
}

pub fn zero() -> BigDecimal {
    BigDecimal::zero()
}

/// Whether `value` is exact at `scale` decimal places.
pub fn fits_scale(value: &BigDecimal, scale: i64) -> bool {
    &value.with_scale_round(scale, RoundingMode::Down) == value
}

/// Parse a decimal sent as a string, naming the field in the error.
pub fn parse_decimal(field: &str, raw: &str) -> Result<BigDecimal, DomainError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|_| DomainError::bad_request(format!("Invalid {field} '{raw}'")))
}

/// Render a money amount with exactly two decimals, e.g. `500.00`.
pub fn format_money(value: &BigDecimal) -> String {
    round_money(value).to_string()
}

/// Render a quantity without trailing zeros, e.g. `2.5` or `3`.
pub fn format_quantity(value: &BigDecimal) -> String {
    let text = value
        .with_scale_round(QUANTITY_SCALE, RoundingMode::HalfUp)
        .to_string();
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}
