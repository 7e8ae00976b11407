use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::compounding::future_value_annuity;
use crate::error::VorsorgeError;
use crate::outcome::{CostBreakdown, FinalValues, YearSnapshot};
use crate::params::{ProductKind, RiesterParameters};
use crate::products::{return_drag, terminal_values, CalculationContext, ProductCalculator};
use crate::tax::{deferred_income_tax, favorable_treatment_delta};
use crate::types::{ensure_fraction, Money, Rate};
use crate::VorsorgeResult;

/// Riester pension: state subsidies paid into the contract, a deduction
/// where it beats the subsidy, and full taxation at payout.
pub struct RiesterCalculator<'a> {
    params: &'a RiesterParameters,
}

impl<'a> RiesterCalculator<'a> {
    pub fn new(params: &'a RiesterParameters) -> Self {
        Self { params }
    }

    /// Yearly subsidy actually granted. Below the minimum own contribution
    /// the subsidy shrinks in proportion; no own money means no subsidy.
    fn yearly_subsidy(&self, ctx: &CalculationContext<'_>) -> Money {
        let rules = ctx.rules;
        let full = rules.riester_base_subsidy
            + rules.riester_child_subsidy * Decimal::from(self.params.children);
        let own = ctx.global.yearly_contribution();
        let minimum = rules.riester_minimum_own_contribution;
        if minimum.is_zero() {
            return if own.is_zero() { Decimal::ZERO } else { full };
        }
        full * (own / minimum).min(Decimal::ONE)
    }

    fn yearly_deduction_benefit(&self, ctx: &CalculationContext<'_>) -> Money {
        ctx.global
            .yearly_contribution()
            .min(ctx.rules.riester_max_deductible)
            * ctx.global.accumulation_tax_rate
    }

    /// Extra tax refund per year on top of the subsidy.
    fn yearly_additional_benefit(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<Money> {
        favorable_treatment_delta(self.yearly_subsidy(ctx), self.yearly_deduction_benefit(ctx))
    }

    fn augmented_monthly(&self, ctx: &CalculationContext<'_>) -> Money {
        ctx.global.monthly_contribution + self.yearly_subsidy(ctx) / dec!(12)
    }
}

impl ProductCalculator for RiesterCalculator<'_> {
    fn kind(&self) -> ProductKind {
        ProductKind::Riester
    }

    fn gross_return(&self) -> Rate {
        self.params.gross_return
    }

    fn effective_cost(&self) -> Rate {
        self.params.effective_cost
    }

    fn validate(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<()> {
        ensure_fraction("riester.gross_return", self.params.gross_return)?;
        ensure_fraction("riester.effective_cost", self.params.effective_cost)?;
        ensure_fraction("riester.lump_sum_fraction", self.params.lump_sum_fraction)?;
        let max = ctx.rules.riester_max_lump_sum_fraction;
        if self.params.lump_sum_fraction > max {
            return Err(VorsorgeError::invalid(
                "riester.lump_sum_fraction",
                format!(
                    "at most {max} of the capital may be paid out as a lump sum, got {}",
                    self.params.lump_sum_fraction
                ),
            ));
        }
        Ok(())
    }

    fn compute_trajectory(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<Vec<YearSnapshot>> {
        let global = ctx.global;
        let horizon = global.horizon_years;
        let net = self.net_rate();
        let monthly = self.augmented_monthly(ctx);
        let subsidy = self.yearly_subsidy(ctx);
        let additional = self.yearly_additional_benefit(ctx)?;
        let mut trajectory = Vec::with_capacity(horizon as usize);

        for year in 1..=horizon {
            let years = Decimal::from(year);
            // Subsidies sit inside the compounded stream.
            let gross = future_value_annuity(monthly, net, year)?;
            let extra_refund = additional * years;
            let tax_due = if year == horizon {
                deferred_income_tax(
                    gross.max(Decimal::ZERO),
                    Decimal::ONE,
                    global.retirement_tax_rate,
                )?
            } else {
                Decimal::ZERO
            };

            trajectory.push(YearSnapshot {
                year,
                contributions: global.yearly_contribution() * years,
                gross_value: gross,
                state_subsidies: subsidy * years,
                tax_savings: extra_refund,
                tax_due,
                net_value: gross - tax_due + extra_refund,
            });
        }

        Ok(trajectory)
    }

    fn compute_final_values(
        &self,
        _ctx: &CalculationContext<'_>,
        trajectory: &[YearSnapshot],
    ) -> VorsorgeResult<FinalValues> {
        let mut finals = terminal_values(trajectory)?;
        if !self.params.lump_sum_fraction.is_zero() {
            finals.lump_sum_payout = Some(finals.gross_value * self.params.lump_sum_fraction);
        }
        Ok(finals)
    }

    fn cost_breakdown(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<CostBreakdown> {
        let drag = return_drag(
            self.augmented_monthly(ctx),
            Decimal::ZERO,
            self.params.gross_return,
            self.net_rate(),
            ctx.global.horizon_years,
            Decimal::ZERO,
        )?;
        Ok(CostBreakdown {
            return_drag: drag,
            ..CostBreakdown::default()
        }
        .with_total())
    }

    fn warnings(&self, ctx: &CalculationContext<'_>) -> Vec<String> {
        let mut warnings = Vec::new();
        if !ctx.global.initial_investment.is_zero() {
            warnings.push(format!(
                "Riester pension: the lump sum of {} is not paid into the contract",
                ctx.global.initial_investment
            ));
        }
        let own = ctx.global.yearly_contribution();
        if !own.is_zero() && own < ctx.rules.riester_minimum_own_contribution {
            warnings.push(format!(
                "Riester pension: yearly contribution {} is below the minimum own contribution of {}; subsidies are reduced",
                own, ctx.rules.riester_minimum_own_contribution
            ));
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSet;
    use crate::params::{FilingStatus, GlobalParameters};

    fn global(monthly: Decimal, acc_rate: Decimal) -> GlobalParameters {
        GlobalParameters {
            monthly_contribution: monthly,
            initial_investment: Decimal::ZERO,
            horizon_years: 10,
            accumulation_tax_rate: acc_rate,
            retirement_tax_rate: dec!(0.30),
            filing_status: FilingStatus::Single,
            selected_products: vec![ProductKind::Riester],
            priorities: Vec::new(),
        }
    }

    #[test]
    fn test_no_additional_benefit_when_subsidy_wins() {
        let rules = RuleSet::default();
        let g = global(dec!(50), dec!(0.20));
        let ctx = CalculationContext {
            global: &g,
            rules: &rules,
        };
        let params = RiesterParameters::default();
        let calc = RiesterCalculator::new(&params);
        assert_eq!(calc.yearly_deduction_benefit(&ctx), dec!(120));
        assert_eq!(calc.yearly_subsidy(&ctx), dec!(175));
        assert_eq!(calc.yearly_additional_benefit(&ctx).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_deduction_capped() {
        let rules = RuleSet::default();
        let g = global(dec!(300), dec!(0.42));
        let ctx = CalculationContext {
            global: &g,
            rules: &rules,
        };
        let params = RiesterParameters::default();
        let calc = RiesterCalculator::new(&params);
        // min(3600, 2100) * 0.42 = 882, minus 175
        assert_eq!(calc.yearly_additional_benefit(&ctx).unwrap(), dec!(707));
    }

    #[test]
    fn test_children_raise_subsidy() {
        let rules = RuleSet::default();
        let g = global(dec!(100), dec!(0.30));
        let ctx = CalculationContext {
            global: &g,
            rules: &rules,
        };
        let params = RiesterParameters {
            children: 2,
            ..RiesterParameters::default()
        };
        assert_eq!(RiesterCalculator::new(&params).yearly_subsidy(&ctx), dec!(775));
    }

    #[test]
    fn test_subsidy_reduced_below_minimum_contribution() {
        let rules = RuleSet::default();
        let g = global(dec!(2.5), dec!(0.30));
        let ctx = CalculationContext {
            global: &g,
            rules: &rules,
        };
        let params = RiesterParameters::default();
        let calc = RiesterCalculator::new(&params);
        // 30 of 60 paid => half the subsidy
        assert_eq!(calc.yearly_subsidy(&ctx), dec!(87.5));
        assert_eq!(calc.warnings(&ctx).len(), 1);
    }

    #[test]
    fn test_subsidies_compound_inside_contract() {
        let rules = RuleSet::default();
        let g = global(dec!(100), dec!(0.20));
        let ctx = CalculationContext {
            global: &g,
            rules: &rules,
        };
        let params = RiesterParameters::default();
        let traj = RiesterCalculator::new(&params)
            .compute_trajectory(&ctx)
            .unwrap();
        let last = &traj[9];
        assert_eq!(last.contributions, dec!(12_000));
        assert_eq!(last.state_subsidies, dec!(1_750));
        // net rate 1% > 0, so the value exceeds what was paid in
        assert!(last.gross_value > dec!(13_750));
        assert_eq!(last.tax_due, last.gross_value * dec!(0.30));
    }

    #[test]
    fn test_lump_sum_fraction_limited_and_reported() {
        let rules = RuleSet::default();
        let g = global(dec!(100), dec!(0.20));
        let ctx = CalculationContext {
            global: &g,
            rules: &rules,
        };
        let too_much = RiesterParameters {
            lump_sum_fraction: dec!(0.31),
            ..RiesterParameters::default()
        };
        assert!(RiesterCalculator::new(&too_much).validate(&ctx).is_err());

        let params = RiesterParameters {
            lump_sum_fraction: dec!(0.30),
            ..RiesterParameters::default()
        };
        let calc = RiesterCalculator::new(&params);
        let traj = calc.compute_trajectory(&ctx).unwrap();
        let finals = calc.compute_final_values(&ctx, &traj).unwrap();
        assert_eq!(
            finals.lump_sum_payout,
            Some(finals.gross_value * dec!(0.30))
        );
    }
}
