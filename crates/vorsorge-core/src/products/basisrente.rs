use rust_decimal::Decimal;

use crate::outcome::{CostBreakdown, YearSnapshot};
use crate::params::{validate_policy_fee, BasisrenteParameters, PolicyType, ProductKind};
use crate::products::{
    insurance_contract_values, return_drag, CalculationContext, ProductCalculator,
};
use crate::tax::deferred_income_tax;
use crate::types::{ensure_fraction, Money, Rate};
use crate::VorsorgeResult;

/// Basisrente (Rürup): deductible contributions, taxed as income at payout.
pub struct BasisrenteCalculator<'a> {
    params: &'a BasisrenteParameters,
}

impl<'a> BasisrenteCalculator<'a> {
    pub fn new(params: &'a BasisrenteParameters) -> Self {
        Self { params }
    }

    /// Tax refunded while saving on contributions made so far. The statutory
    /// contribution cap is resolved by the caller, not enforced here.
    fn tax_saving(contributions: Money, ctx: &CalculationContext<'_>) -> Money {
        contributions * ctx.rules.basisrente_deductible_fraction * ctx.global.accumulation_tax_rate
    }
}

impl ProductCalculator for BasisrenteCalculator<'_> {
    fn kind(&self) -> ProductKind {
        ProductKind::Basisrente
    }

    fn gross_return(&self) -> Rate {
        self.params.gross_return
    }

    fn effective_cost(&self) -> Rate {
        self.params.effective_cost
    }

    fn validate(&self, _ctx: &CalculationContext<'_>) -> VorsorgeResult<()> {
        ensure_fraction("basisrente.gross_return", self.params.gross_return)?;
        ensure_fraction("basisrente.effective_cost", self.params.effective_cost)?;
        ensure_fraction(
            "basisrente.contribution_dynamics",
            self.params.contribution_dynamics,
        )?;
        validate_policy_fee("basisrente", self.params.policy_type, self.params.advisor_fee)
    }

    fn compute_trajectory(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<Vec<YearSnapshot>> {
        let global = ctx.global;
        let horizon = global.horizon_years;
        let dynamics = self.params.contribution_dynamics;
        let values = insurance_contract_values(
            global,
            self.net_rate(),
            self.params.policy_type,
            self.params.advisor_fee,
            dynamics,
        )?;
        let mut trajectory = Vec::with_capacity(horizon as usize);

        for (year, gross) in (1..=horizon).zip(values) {
            let contributions = global.contributions_with_dynamics(year, dynamics)?;
            let saving = Self::tax_saving(contributions, ctx);
            let tax_due = if year == horizon {
                deferred_income_tax(
                    gross.max(Decimal::ZERO),
                    ctx.rules.basisrente_taxable_fraction,
                    global.retirement_tax_rate,
                )?
            } else {
                Decimal::ZERO
            };

            trajectory.push(YearSnapshot {
                year,
                contributions,
                gross_value: gross,
                state_subsidies: Decimal::ZERO,
                tax_savings: saving,
                tax_due,
                // Refunds went to the saver in cash, so they count on top.
                net_value: gross - tax_due + saving,
            });
        }

        Ok(trajectory)
    }

    fn cost_breakdown(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<CostBreakdown> {
        let global = ctx.global;
        let drag = return_drag(
            global.monthly_contribution,
            global.initial_investment,
            self.params.gross_return,
            self.net_rate(),
            global.horizon_years,
            self.params.contribution_dynamics,
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
