use rust_decimal::Decimal;

use crate::outcome::{CostBreakdown, FinalValues, YearSnapshot};
use crate::params::{validate_policy_fee, PayoutOption, PolicyType, PrivatrenteParameters, ProductKind};
use crate::products::{
    insurance_contract_value, return_drag, terminal_values, CalculationContext, ProductCalculator,
};
use crate::tax::{annuity_income_share, deferred_income_tax};
use crate::types::{ensure_fraction, Money, Rate};
use crate::VorsorgeResult;

/// Private pension insurance without state funding. Payout is taxed
/// favourably: by income share for an annuity, on half the gain for a lump sum.
pub struct PrivatrenteCalculator<'a> {
    params: &'a PrivatrenteParameters,
}

impl<'a> PrivatrenteCalculator<'a> {
    pub fn new(params: &'a PrivatrenteParameters) -> Self {
        Self { params }
    }

    fn payout_tax(
        &self,
        ctx: &CalculationContext<'_>,
        gross: Money,
        contributions: Money,
    ) -> VorsorgeResult<Money> {
        let rate = ctx.global.retirement_tax_rate;
        match self.params.payout {
            PayoutOption::Annuity { retirement_age } => deferred_income_tax(
                gross.max(Decimal::ZERO),
                annuity_income_share(retirement_age),
                rate,
            ),
            PayoutOption::LumpSum => deferred_income_tax(
                (gross - contributions).max(Decimal::ZERO),
                ctx.rules.privatrente_lump_sum_taxable_share,
                rate,
            ),
        }
    }
}

impl ProductCalculator for PrivatrenteCalculator<'_> {
    fn kind(&self) -> ProductKind {
        ProductKind::Privatrente
    }

    fn gross_return(&self) -> Rate {
        self.params.gross_return
    }

    fn effective_cost(&self) -> Rate {
        self.params.effective_cost
    }

    fn validate(&self, _ctx: &CalculationContext<'_>) -> VorsorgeResult<()> {
        ensure_fraction("privatrente.gross_return", self.params.gross_return)?;
        ensure_fraction("privatrente.effective_cost", self.params.effective_cost)?;
        validate_policy_fee("privatrente", self.params.policy_type, self.params.advisor_fee)
    }

    fn compute_trajectory(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<Vec<YearSnapshot>> {
        let global = ctx.global;
        let horizon = global.horizon_years;
        let net = self.net_rate();
        let mut trajectory = Vec::with_capacity(horizon as usize);

        for year in 1..=horizon {
            let gross = insurance_contract_value(
                global,
                net,
                self.params.policy_type,
                self.params.advisor_fee,
                year,
            )?;
            let contributions = global.contributions_after(year);
            let tax_due = if year == horizon {
                self.payout_tax(ctx, gross, contributions)?
            } else {
                Decimal::ZERO
            };

            trajectory.push(YearSnapshot {
                year,
                contributions,
                gross_value: gross,
                state_subsidies: Decimal::ZERO,
                tax_savings: Decimal::ZERO,
                tax_due,
                net_value: gross - tax_due,
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
        if self.params.payout == PayoutOption::LumpSum {
            finals.lump_sum_payout = Some(finals.net_value);
        }
        Ok(finals)
    }

    fn cost_breakdown(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<CostBreakdown> {
        let global = ctx.global;
        let drag = return_drag(
            global.monthly_contribution,
            global.initial_investment,
            self.params.gross_return,
            self.net_rate(),
            global.horizon_years,
            Decimal::ZERO,
        )?;
        let advisor_fee = match self.params.policy_type {
            PolicyType::Net => self.params.advisor_fee,
            PolicyType::Gross => Decimal::ZERO,
        };
        Ok(CostBreakdown {
            return_drag: drag,
            advisor_fee,
            ..CostBreakdown::default()
        }
        .with_total())
    }
}
