use rust_decimal::Decimal;

use crate::compounding::{
    dynamic_plan_values, future_value_annuity, future_value_lump_sum, monthly_step, out_of_range,
    MONTHS_PER_YEAR,
};
use crate::error::VorsorgeError;
use crate::outcome::{CostBreakdown, YearSnapshot};
use crate::params::{EtfParameters, GlobalParameters, ProductKind};
use crate::products::{return_drag, CalculationContext, ProductCalculator};
use crate::tax::capital_gains_tax;
use crate::types::{ensure_fraction, ensure_non_negative, Money, Rate};
use crate::VorsorgeResult;

/// Unrestricted index-fund savings plan.
///
/// No tax benefit while saving; the whole gain is taxed at the flat
/// capital-gains rate on sale, with one year's saver's allowance.
pub struct EtfCalculator<'a> {
    params: &'a EtfParameters,
}

/// Month-by-month run used when the position is rebalanced.
struct RebalancingRun {
    trajectory: Vec<YearSnapshot>,
    rebalancing_costs: Money,
}

impl<'a> EtfCalculator<'a> {
    pub fn new(params: &'a EtfParameters) -> Self {
        Self { params }
    }

    /// Orders only run while there is a monthly contribution to invest.
    fn order_fees(&self, global: &GlobalParameters, years: u32) -> VorsorgeResult<Money> {
        if global.monthly_contribution.is_zero() {
            return Ok(Decimal::ZERO);
        }
        self.params
            .order_fee
            .checked_mul(Decimal::from(self.params.orders_per_year) * Decimal::from(years))
            .ok_or_else(|| out_of_range("order fees"))
    }

    /// Custody is charged only on a non-empty depot.
    fn custody_fees(&self, global: &GlobalParameters, years: u32) -> VorsorgeResult<Money> {
        if global.monthly_contribution.is_zero() && global.initial_investment.is_zero() {
            return Ok(Decimal::ZERO);
        }
        self.params
            .custody_fee_yearly
            .checked_mul(Decimal::from(years))
            .ok_or_else(|| out_of_range("custody fees"))
    }

    fn running_fees(&self, global: &GlobalParameters, years: u32) -> VorsorgeResult<Money> {
        self.order_fees(global, years)?
            .checked_add(self.custody_fees(global, years)?)
            .ok_or_else(|| out_of_range("running fees"))
    }

    /// Position value at the end of every year, before running fees.
    fn position_values(&self, global: &GlobalParameters) -> VorsorgeResult<Vec<Money>> {
        let net = self.net_rate();
        let keep = Decimal::ONE - self.params.spread;
        let dynamics = self.params.contribution_dynamics;
        if !dynamics.is_zero() {
            return dynamic_plan_values(
                global.monthly_contribution,
                dynamics,
                global.initial_investment * keep,
                net,
                global.horizon_years,
            );
        }

        (1..=global.horizon_years)
            .map(|year| {
                let plan = future_value_annuity(global.monthly_contribution, net, year)?;
                let lump = future_value_lump_sum(global.initial_investment, net, year, keep)?;
                plan.checked_add(lump)
                    .ok_or_else(|| out_of_range("position value"))
            })
            .collect()
    }

    /// Years in which a rebalancing sale happens, spread evenly and never
    /// falling on the final year.
    fn rebalancing_years(&self, horizon: u32) -> Vec<u32> {
        let count = self.params.rebalancing_count;
        (1..=count).map(|i| i * horizon / (count + 1)).collect()
    }

    fn buy_and_hold_trajectory(
        &self,
        ctx: &CalculationContext<'_>,
    ) -> VorsorgeResult<Vec<YearSnapshot>> {
        let global = ctx.global;
        let horizon = global.horizon_years;
        let values = self.position_values(global)?;
        let mut trajectory = Vec::with_capacity(horizon as usize);

        for (year, position) in (1..=horizon).zip(values) {
            let gross = position - self.running_fees(global, year)?;
            let contributions =
                global.contributions_with_dynamics(year, self.params.contribution_dynamics)?;
            // Single sale at the end; earlier years stay untaxed.
            let tax_due = if year == horizon {
                let gain = (gross - contributions).max(Decimal::ZERO);
                capital_gains_tax(gain, global.filing_status, ctx.rules)?
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

    fn run_with_rebalancing(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<RebalancingRun> {
        let global = ctx.global;
        let horizon = global.horizon_years;
        let keep = Decimal::ONE - self.params.spread;
        let growth = Decimal::ONE + self.net_rate() / Decimal::from(MONTHS_PER_YEAR);
        let raise = Decimal::ONE + self.params.contribution_dynamics;
        let events = self.rebalancing_years(horizon);
        let overflow = || out_of_range("rebalancing simulation");

        let mut balance = global.initial_investment * keep;
        let mut cost_basis = global.initial_investment;
        let mut paid_in = global.initial_investment;
        let mut payment = global.monthly_contribution;
        let mut rebalancing_costs = Decimal::ZERO;
        let mut trajectory = Vec::with_capacity(horizon as usize);

        for year in 1..=horizon {
            for _ in 0..MONTHS_PER_YEAR {
                balance = monthly_step(balance, growth, payment)?;
            }
            let yearly = payment
                .checked_mul(Decimal::from(MONTHS_PER_YEAR))
                .ok_or_else(overflow)?;
            cost_basis = cost_basis.checked_add(yearly).ok_or_else(overflow)?;
            paid_in = paid_in.checked_add(yearly).ok_or_else(overflow)?;
            payment = payment.checked_mul(raise).ok_or_else(overflow)?;

            let mut tax_due = Decimal::ZERO;
            if events.contains(&year) {
                // Sell everything, pay tax with this year's allowance, buy back.
                let proceeds = balance * keep;
                let gain = (proceeds - cost_basis).max(Decimal::ZERO);
                let tax = capital_gains_tax(gain, global.filing_status, ctx.rules)?;
                let order_fee = self.params.order_fee.min(proceeds - tax);
                let reinvested = proceeds - tax - order_fee;
                let rebought = reinvested * keep;

                rebalancing_costs = rebalancing_costs
                    .checked_add(balance - proceeds)
                    .and_then(|c| c.checked_add(order_fee))
                    .and_then(|c| c.checked_add(reinvested - rebought))
                    .ok_or_else(overflow)?;
                balance = rebought;
                cost_basis = reinvested;
                tax_due = tax;
            }

            let gross = balance - self.running_fees(global, year)?;
            let net = if year == horizon {
                let gain = (gross - cost_basis).max(Decimal::ZERO);
                tax_due = capital_gains_tax(gain, global.filing_status, ctx.rules)?;
                gross - tax_due
            } else {
                gross
            };

            trajectory.push(YearSnapshot {
                year,
                contributions: paid_in,
                gross_value: gross,
                state_subsidies: Decimal::ZERO,
                tax_savings: Decimal::ZERO,
                tax_due,
                net_value: net,
            });
        }

        Ok(RebalancingRun {
            trajectory,
            rebalancing_costs,
        })
    }

    fn costs(
        &self,
        ctx: &CalculationContext<'_>,
        rebalancing_costs: Money,
    ) -> VorsorgeResult<CostBreakdown> {
        let global = ctx.global;
        let years = global.horizon_years;
        let net = self.net_rate();

        let drag = return_drag(
            global.monthly_contribution,
            global.initial_investment,
            self.params.gross_return,
            net,
            years,
            self.params.contribution_dynamics,
        )?;
        let purchase_spread =
            future_value_lump_sum(global.initial_investment, net, years, self.params.spread)?;

        Ok(CostBreakdown {
            return_drag: drag,
            purchase_spread,
            order_fees: self.order_fees(global, years)?,
            custody_fees: self.custody_fees(global, years)?,
            advisor_fee: Decimal::ZERO,
            rebalancing_costs,
            total: Decimal::ZERO,
        }
        .with_total())
    }
}

impl ProductCalculator for EtfCalculator<'_> {
    fn kind(&self) -> ProductKind {
        ProductKind::Etf
    }

    fn gross_return(&self) -> Rate {
        self.params.gross_return
    }

    fn effective_cost(&self) -> Rate {
        self.params.ter + self.params.spread
    }

    fn validate(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<()> {
        let p = self.params;
        ensure_fraction("etf.gross_return", p.gross_return)?;
        ensure_fraction("etf.ter", p.ter)?;
        ensure_fraction("etf.spread", p.spread)?;
        ensure_fraction("etf.ter + etf.spread", p.ter + p.spread)?;
        ensure_fraction("etf.contribution_dynamics", p.contribution_dynamics)?;
        ensure_non_negative("etf.order_fee", p.order_fee)?;
        ensure_non_negative("etf.custody_fee_yearly", p.custody_fee_yearly)?;
        if p.rebalancing_count >= ctx.global.horizon_years {
            return Err(VorsorgeError::invalid(
                "etf.rebalancing_count",
                format!(
                    "{} rebalancings do not fit into a horizon of {} years",
                    p.rebalancing_count, ctx.global.horizon_years
                ),
            ));
        }
        Ok(())
    }

    fn compute_trajectory(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<Vec<YearSnapshot>> {
        if self.params.rebalancing_count > 0 {
            return Ok(self.run_with_rebalancing(ctx)?.trajectory);
        }
        self.buy_and_hold_trajectory(ctx)
    }

    fn cost_breakdown(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<CostBreakdown> {
        let rebalancing_costs = if self.params.rebalancing_count > 0 {
            self.run_with_rebalancing(ctx)?.rebalancing_costs
        } else {
            Decimal::ZERO
        };
        self.costs(ctx, rebalancing_costs)
    }

    fn project(
        &self,
        ctx: &CalculationContext<'_>,
    ) -> VorsorgeResult<(Vec<YearSnapshot>, CostBreakdown)> {
        if self.params.rebalancing_count == 0 {
            return Ok((self.buy_and_hold_trajectory(ctx)?, self.costs(ctx, Decimal::ZERO)?));
        }
        let run = self.run_with_rebalancing(ctx)?;
        let costs = self.costs(ctx, run.rebalancing_costs)?;
        Ok((run.trajectory, costs))
    }
}
