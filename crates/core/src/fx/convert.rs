//! Price normalization arithmetic.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::DISPLAY_DECIMAL_PRECISION;

use super::fx_errors::FxError;

/// Round to display precision, ties to even.
pub fn round_half_even(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DISPLAY_DECIMAL_PRECISION, RoundingStrategy::MidpointNearestEven)
}

/// Multiply `amount` by an `f64` rate and round.
///
/// The product is taken in floating point and the exact binary result is
/// kept before rounding, so ties are decided on the value the rate produced.
pub fn apply_rate(amount: Decimal, rate: f64) -> Result<Decimal, FxError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(FxError::InvalidRate(rate.to_string()));
    }
    if rate == 1.0 {
        return Ok(round_half_even(amount));
    }

    let amount_f64 = amount
        .to_f64()
        .ok_or_else(|| FxError::InvalidAmount(amount.to_string()))?;
    let product = Decimal::from_f64_retain(amount_f64 * rate)
        .ok_or_else(|| FxError::InvalidAmount(format!("{} x {} overflows", amount, rate)))?;
    Ok(round_half_even(product))
}

pub(crate) fn validate_amount(amount: Decimal) -> Result<(), FxError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(FxError::InvalidAmount(format!(
            "amount must not be negative: {}",
            amount
        )));
    }
    Ok(())
}
