//! Decimal rules for quantities and amounts.

use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};

use super::errors::ValidationError;

/// Decimal places kept for quantities and amounts.
pub const SCALE: i64 = 2;

/// Parses a quantity typed by the user, dropping digits past the second
/// decimal (`2.345` becomes `2.34`).
pub fn parse_quantity(input: &str) -> Result<BigDecimal, ValidationError> {
    let trimmed = input.trim().replace(',', ".");
    let value = BigDecimal::from_str(&trimmed)
        .map_err(|_| ValidationError::UnparsableQuantity(input.to_string()))?;
    Ok(truncate(&value))
}

pub fn truncate(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(SCALE, RoundingMode::Down)
}

pub fn round(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(SCALE, RoundingMode::HalfUp)
}

/// `true` when the value carries no significant digit past the second decimal.
pub fn has_valid_scale(value: &BigDecimal) -> bool {
    truncate(value) == *value
}

pub fn zero() -> BigDecimal {
    BigDecimal::from(0)
}

pub fn line_amount(quantity: &BigDecimal, price: &BigDecimal) -> BigDecimal {
    quantity * price
}

/// Sum of `quantity * price`, rounded half-up to two decimals.
pub fn order_total<'a, I>(lines: I) -> BigDecimal
where
    I: IntoIterator<Item = (&'a BigDecimal, &'a BigDecimal)>,
{
    let sum = lines
        .into_iter()
        .fold(zero(), |acc, (quantity, price)| acc + line_amount(quantity, price));
    round(&sum)
}
