use rust_decimal::Decimal;

use crate::error::VorsorgeError;
use crate::types::{Money, Rate};
use crate::VorsorgeResult;

pub const MONTHS_PER_YEAR: u32 = 12;

pub(crate) fn out_of_range(context: &str) -> VorsorgeError {
    VorsorgeError::invalid(
        "horizon_years",
        format!("{context} exceeds the representable value range"),
    )
}

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
pub fn compound(rate: Rate, periods: u32) -> VorsorgeResult<Decimal> {
    let factor = Decimal::ONE + rate;
    let mut result = Decimal::ONE;
    for _ in 0..periods {
        result = result
            .checked_mul(factor)
            .ok_or_else(|| out_of_range("compounding factor"))?;
    }
    Ok(result)
}

/// Future value of a monthly savings plan with payments at month end:
/// FV = m * [((1 + r/12)^(12t) - 1) / (r/12)], and FV = m * 12t for r = 0.
pub fn future_value_annuity(
    monthly_contribution: Money,
    annual_net_rate: Rate,
    years: u32,
) -> VorsorgeResult<Money> {
    let months = years * MONTHS_PER_YEAR;
    if annual_net_rate.is_zero() {
        return Ok(monthly_contribution * Decimal::from(months));
    }

    let monthly_rate = annual_net_rate / Decimal::from(MONTHS_PER_YEAR);
    let growth = compound(monthly_rate, months)?;
    let annuity_factor = (growth - Decimal::ONE) / monthly_rate;
    monthly_contribution
        .checked_mul(annuity_factor)
        .ok_or_else(|| out_of_range("annuity value"))
}

/// Future value of a one-off payment compounded annually.
/// `adjustment` is a multiplicative haircut taken at purchase (e.g. 1 - spread).
pub fn future_value_lump_sum(
    initial: Money,
    annual_net_rate: Rate,
    years: u32,
    adjustment: Decimal,
) -> VorsorgeResult<Money> {
    let growth = compound(annual_net_rate, years)?;
    (initial * adjustment)
        .checked_mul(growth)
        .ok_or_else(|| out_of_range("lump-sum value"))
}

/// One month of growth followed by a month-end payment.
pub(crate) fn monthly_step(balance: Money, growth: Decimal, payment: Money) -> VorsorgeResult<Money> {
    balance
        .checked_mul(growth)
        .and_then(|grown| grown.checked_add(payment))
        .ok_or_else(|| out_of_range("monthly balance"))
}

/// Year-end values of a savings plan whose monthly contribution rises by
/// `dynamics` at the start of every year after the first. Steps month by
/// month; `initial` is invested at month 0 and compounds monthly.
pub fn dynamic_plan_values(
    monthly_contribution: Money,
    dynamics: Rate,
    initial: Money,
    annual_net_rate: Rate,
    years: u32,
) -> VorsorgeResult<Vec<Money>> {
    let growth = Decimal::ONE + annual_net_rate / Decimal::from(MONTHS_PER_YEAR);
    let mut balance = initial;
    let mut payment = monthly_contribution;
    let mut values = Vec::with_capacity(years as usize);

    for _ in 0..years {
        for _ in 0..MONTHS_PER_YEAR {
            balance = monthly_step(balance, growth, payment)?;
        }
        values.push(balance);
        payment = raise(payment, dynamics)?;
    }
    Ok(values)
}

/// Own money paid in after `years` with yearly contribution dynamics,
/// lump sum included.
pub fn dynamic_contributions(
    monthly_contribution: Money,
    dynamics: Rate,
    initial: Money,
    years: u32,
) -> VorsorgeResult<Money> {
    let mut total = initial;
    let mut payment = monthly_contribution;
    for _ in 0..years {
        total = payment
            .checked_mul(Decimal::from(MONTHS_PER_YEAR))
            .and_then(|yearly| total.checked_add(yearly))
            .ok_or_else(|| out_of_range("contribution total"))?;
        payment = raise(payment, dynamics)?;
    }
    Ok(total)
}

fn raise(payment: Money, dynamics: Rate) -> VorsorgeResult<Money> {
    payment
        .checked_mul(Decimal::ONE + dynamics)
        .ok_or_else(|| out_of_range("dynamic contribution"))
}
