use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::{IncomeTaxSchedule, RuleSet};
use crate::params::FilingStatus;
use crate::types::{ensure_fraction, ensure_non_negative, Money, Rate};
use crate::VorsorgeResult;

/// Income share of a life annuity by age at first payment (§ 22 EStG), ages 50..=70.
const ANNUITY_INCOME_SHARE: [(u32, u32); 21] = [
    (50, 30),
    (51, 29),
    (52, 28),
    (53, 27),
    (54, 27),
    (55, 26),
    (56, 25),
    (57, 25),
    (58, 24),
    (59, 23),
    (60, 22),
    (61, 22),
    (62, 21),
    (63, 20),
    (64, 19),
    (65, 18),
    (66, 18),
    (67, 17),
    (68, 16),
    (69, 16),
    (70, 15),
];

/// Flat capital-gains tax on a single sale event.
///
/// The saver's allowance for the filing status is consumed here and only
/// here; allowances of earlier years are never carried forward.
pub fn capital_gains_tax(
    gross_gain: Money,
    filing_status: FilingStatus,
    rules: &RuleSet,
) -> VorsorgeResult<Money> {
    ensure_non_negative("gross_gain", gross_gain)?;
    let allowance = rules.saver_allowance(filing_status);
    let taxable = (gross_gain - allowance).max(Decimal::ZERO);
    Ok(taxable * rules.capital_gains_tax_rate)
}

/// Income tax on a deferred payout of which only `taxable_fraction` is taxable.
pub fn deferred_income_tax(
    gross_payout: Money,
    taxable_fraction: Rate,
    rate: Rate,
) -> VorsorgeResult<Money> {
    ensure_non_negative("gross_payout", gross_payout)?;
    ensure_fraction("taxable_fraction", taxable_fraction)?;
    ensure_fraction("rate", rate)?;
    Ok(gross_payout * taxable_fraction * rate)
}

/// Favorable-treatment test (Günstigerprüfung).
///
/// The state grants the larger of subsidy and deduction. The subsidy already
/// sits in the contract, so only the excess of the deduction is extra benefit.
pub fn favorable_treatment_delta(
    subsidy_amount: Money,
    deduction_amount: Money,
) -> VorsorgeResult<Money> {
    ensure_non_negative("subsidy_amount", subsidy_amount)?;
    ensure_non_negative("deduction_amount", deduction_amount)?;
    Ok((deduction_amount - subsidy_amount).max(Decimal::ZERO))
}

/// Approximate marginal income-tax rate for a yearly taxable income.
pub fn marginal_income_tax_rate(
    yearly_income: Money,
    schedule: &IncomeTaxSchedule,
) -> VorsorgeResult<Rate> {
    ensure_non_negative("yearly_income", yearly_income)?;
    schedule.validate()?;

    let rate = if yearly_income <= schedule.basic_allowance {
        Decimal::ZERO
    } else if yearly_income <= schedule.entry_zone_end {
        schedule.entry_rate
    } else if yearly_income <= schedule.progression_zone_end {
        let span = schedule.progression_zone_end - schedule.entry_zone_end;
        let position = (yearly_income - schedule.entry_zone_end) / span;
        schedule.entry_rate + position * (schedule.top_rate - schedule.entry_rate)
    } else if yearly_income <= schedule.wealth_threshold {
        schedule.top_rate
    } else {
        schedule.wealth_rate
    };
    Ok(rate)
}

/// Taxable income share of a private life annuity starting at `age`.
/// Ages outside the table use its nearest end.
pub fn annuity_income_share(age: u32) -> Rate {
    let (first_age, first_pct) = ANNUITY_INCOME_SHARE[0];
    let (last_age, last_pct) = ANNUITY_INCOME_SHARE[ANNUITY_INCOME_SHARE.len() - 1];
    let pct = if age <= first_age {
        first_pct
    } else if age >= last_age {
        last_pct
    } else {
        ANNUITY_INCOME_SHARE
            .iter()
            .find(|(a, _)| *a == age)
            .map(|(_, p)| *p)
            .unwrap_or(last_pct)
    };
    Decimal::from(pct) / dec!(100)
}
