//! Discount arithmetic for ledger postings.
//!
//! After-discount values are computed with exact decimal multiplication and
//! rounded half-up to two fractional digits before they are stored. Totals add
//! the already-rounded values and any undiscounted add-ons without rounding again.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{AppError, AppResult};
use crate::utils::validators::{validate_money, validate_pct};

/// `amount * (1 - pct / 100)`, rounded half-up to 2 decimals.
pub fn apply_discount(amount: Decimal, pct: Decimal) -> Decimal {
    let factor = Decimal::ONE - pct / Decimal::ONE_HUNDRED;
    (amount * factor).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Sums the parts of a posting; the total must fit a money column too.
fn total_of(parts: &[Decimal]) -> AppResult<Decimal> {
    let total = parts
        .iter()
        .try_fold(Decimal::ZERO, |acc, part| acc.checked_add(*part))
        .ok_or_else(|| AppError::validation("total_amount", "total is out of range"))?;
    validate_money("total_amount", total)?;
    Ok(total)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationFeeBreakdown {
    pub deposit_after: Decimal,
    pub initial_fee_after: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentBreakdown {
    pub rent_after: Decimal,
    pub total: Decimal,
}

pub fn registration_fee_breakdown(
    deposit: Decimal,
    deposit_discount_pct: Decimal,
    initial_fee: Decimal,
    initial_fee_discount_pct: Decimal,
) -> AppResult<RegistrationFeeBreakdown> {
    validate_money("deposit", deposit)?;
    validate_pct("deposit_discount_pct", deposit_discount_pct)?;
    validate_money("initial_fee", initial_fee)?;
    validate_pct("initial_fee_discount_pct", initial_fee_discount_pct)?;

    let deposit_after = apply_discount(deposit, deposit_discount_pct);
    let initial_fee_after = apply_discount(initial_fee, initial_fee_discount_pct);

    Ok(RegistrationFeeBreakdown {
        deposit_after,
        initial_fee_after,
        total: total_of(&[deposit_after, initial_fee_after])?,
    })
}

pub fn rent_breakdown(
    rent: Decimal,
    rent_discount_pct: Decimal,
    internet: Decimal,
    utilities: Decimal,
) -> AppResult<RentBreakdown> {
    validate_money("rent", rent)?;
    validate_pct("rent_discount_pct", rent_discount_pct)?;
    validate_money("internet", internet)?;
    validate_money("utilities", utilities)?;

    let rent_after = apply_discount(rent, rent_discount_pct);

    Ok(RentBreakdown {
        rent_after,
        total: total_of(&[rent_after, internet, utilities])?,
    })
}
