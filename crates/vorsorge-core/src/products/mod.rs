pub mod basisrente;
pub mod etf;
pub mod privatrente;
pub mod riester;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::compounding::{
    dynamic_plan_values, future_value_annuity, future_value_lump_sum, out_of_range,
};
use crate::config::RuleSet;
use crate::error::VorsorgeError;
use crate::outcome::{CostBreakdown, FinalValues, ProductOutcome, YearSnapshot};
use crate::params::{GlobalParameters, PolicyType, ProductKind, ProductParameters};
use crate::types::{Money, Rate};
use crate::VorsorgeResult;

pub use basisrente::BasisrenteCalculator;
pub use etf::EtfCalculator;
pub use privatrente::PrivatrenteCalculator;
pub use riester::RiesterCalculator;

/// Everything a calculator may read besides its own parameters.
#[derive(Debug, Clone, Copy)]
pub struct CalculationContext<'a> {
    pub global: &'a GlobalParameters,
    pub rules: &'a RuleSet,
}

/// Common capability set of all product calculators.
///
/// Implementations are stateless views over their parameters; the same
/// calculator can be queried any number of times with the same result.
pub trait ProductCalculator {
    fn kind(&self) -> ProductKind;

    fn gross_return(&self) -> Rate;

    /// Aggregate yearly cost drag subtracted from the gross return.
    fn effective_cost(&self) -> Rate;

    /// Gross return minus costs. Not clamped: may be zero or negative.
    fn net_rate(&self) -> Rate {
        self.gross_return() - self.effective_cost()
    }

    fn validate(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<()>;

    /// One snapshot per contract year, 1..=horizon.
    fn compute_trajectory(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<Vec<YearSnapshot>>;

    fn compute_final_values(
        &self,
        _ctx: &CalculationContext<'_>,
        trajectory: &[YearSnapshot],
    ) -> VorsorgeResult<FinalValues> {
        terminal_values(trajectory)
    }

    fn cost_breakdown(&self, ctx: &CalculationContext<'_>) -> VorsorgeResult<CostBreakdown>;

    /// Trajectory and cost breakdown of one run. Calculators that derive
    /// costs from their own simulation override this to simulate once.
    fn project(
        &self,
        ctx: &CalculationContext<'_>,
    ) -> VorsorgeResult<(Vec<YearSnapshot>, CostBreakdown)> {
        Ok((self.compute_trajectory(ctx)?, self.cost_breakdown(ctx)?))
    }

    fn warnings(&self, _ctx: &CalculationContext<'_>) -> Vec<String> {
        Vec::new()
    }
}

impl ProductParameters {
    pub fn calculator(&self) -> Box<dyn ProductCalculator + '_> {
        match self {
            ProductParameters::Etf(p) => Box::new(EtfCalculator::new(p)),
            ProductParameters::Basisrente(p) => Box::new(BasisrenteCalculator::new(p)),
            ProductParameters::Riester(p) => Box::new(RiesterCalculator::new(p)),
            ProductParameters::Privatrente(p) => Box::new(PrivatrenteCalculator::new(p)),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Project one product over the horizon and assemble its outcome.
///
/// Fails with `InvalidParameter` before computing anything if an input is
/// out of range. A non-positive net rate is computed, not rejected, and
/// reported through `degenerate`.
pub fn calculate(
    global: &GlobalParameters,
    params: &ProductParameters,
    rules: &RuleSet,
) -> VorsorgeResult<ProductOutcome> {
    rules.validate()?;
    global.validate(rules)?;

    let ctx = CalculationContext { global, rules };
    let calculator = params.calculator();
    calculator.validate(&ctx)?;

    let (trajectory, costs) = calculator.project(&ctx)?;
    let finals = calculator.compute_final_values(&ctx, &trajectory)?;

    let kind = calculator.kind();
    let net_rate = calculator.net_rate();
    let degenerate = net_rate <= Decimal::ZERO;
    let mut warnings = calculator.warnings(&ctx);
    if degenerate {
        warn!(product = ?kind, %net_rate, "costs meet or exceed the gross return");
        warnings.push(format!(
            "{}: net return {} is not positive (gross {} minus costs {}); the projection shrinks in real terms",
            kind.label(),
            net_rate,
            calculator.gross_return(),
            calculator.effective_cost()
        ));
    }

    let total_benefits = finals.state_subsidies + finals.tax_savings;
    let net_own_investment = finals.contributions - finals.tax_savings;

    debug!(
        product = ?kind,
        years = global.horizon_years,
        gross = %finals.gross_value,
        net = %finals.net_value,
        "product calculated"
    );

    Ok(ProductOutcome {
        product: kind,
        gross_return: calculator.gross_return(),
        effective_cost: calculator.effective_cost(),
        net_rate,
        trajectory,
        gross_final_value: finals.gross_value,
        net_final_value: finals.net_value,
        total_contributions: finals.contributions,
        total_state_subsidies: finals.state_subsidies,
        total_tax_savings: finals.tax_savings,
        total_benefits,
        net_own_investment,
        profit: finals.net_value - net_own_investment,
        payout_tax: finals.payout_tax,
        lump_sum_payout: finals.lump_sum_payout,
        costs,
        degenerate,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(crate) fn terminal_values(trajectory: &[YearSnapshot]) -> VorsorgeResult<FinalValues> {
    let last = trajectory.last().ok_or_else(|| {
        VorsorgeError::invalid("global.horizon_years", "projection produced no years")
    })?;
    Ok(FinalValues {
        gross_value: last.gross_value,
        net_value: last.net_value,
        contributions: last.contributions,
        state_subsidies: last.state_subsidies,
        tax_savings: last.tax_savings,
        payout_tax: last.tax_due,
        lump_sum_payout: None,
    })
}

/// Compounded value of a net policy's advisor fee, taken from the principal
/// at year 0.
fn advisor_fee_value(
    policy_type: PolicyType,
    advisor_fee: Money,
    net_rate: Rate,
    years: u32,
) -> VorsorgeResult<Money> {
    match policy_type {
        PolicyType::Net => future_value_lump_sum(advisor_fee, net_rate, years, Decimal::ONE),
        PolicyType::Gross => Ok(Decimal::ZERO),
    }
}

/// Value of an insurance contract after `years`: monthly plan plus lump sum,
/// less the compounded advisor fee of a net policy.
pub(crate) fn insurance_contract_value(
    global: &GlobalParameters,
    net_rate: Rate,
    policy_type: PolicyType,
    advisor_fee: Money,
    years: u32,
) -> VorsorgeResult<Money> {
    let plan = plan_value(
        global.monthly_contribution,
        global.initial_investment,
        net_rate,
        years,
        Decimal::ZERO,
    )?;
    Ok(plan - advisor_fee_value(policy_type, advisor_fee, net_rate, years)?)
}

/// Contract values for every year of the horizon. With contribution
/// dynamics the plan is stepped month by month.
pub(crate) fn insurance_contract_values(
    global: &GlobalParameters,
    net_rate: Rate,
    policy_type: PolicyType,
    advisor_fee: Money,
    dynamics: Rate,
) -> VorsorgeResult<Vec<Money>> {
    let horizon = global.horizon_years;
    if dynamics.is_zero() {
        return (1..=horizon)
            .map(|year| insurance_contract_value(global, net_rate, policy_type, advisor_fee, year))
            .collect();
    }

    let plan = dynamic_plan_values(
        global.monthly_contribution,
        dynamics,
        global.initial_investment,
        net_rate,
        horizon,
    )?;
    plan.into_iter()
        .zip(1..=horizon)
        .map(|(value, year)| -> VorsorgeResult<Money> {
            Ok(value - advisor_fee_value(policy_type, advisor_fee, net_rate, year)?)
        })
        .collect()
}

/// Final value of monthly plan plus lump sum at `rate`.
fn plan_value(
    monthly: Money,
    initial: Money,
    rate: Rate,
    years: u32,
    dynamics: Rate,
) -> VorsorgeResult<Money> {
    if dynamics.is_zero() {
        let plan = future_value_annuity(monthly, rate, years)?;
        let lump = future_value_lump_sum(initial, rate, years, Decimal::ONE)?;
        return plan
            .checked_add(lump)
            .ok_or_else(|| out_of_range("plan value"));
    }
    let values = dynamic_plan_values(monthly, dynamics, initial, rate, years)?;
    Ok(values.last().copied().unwrap_or(Decimal::ZERO))
}

/// Final value lost because the plan grew at `net_rate` instead of `gross_rate`.
pub(crate) fn return_drag(
    monthly: Money,
    initial: Money,
    gross_rate: Rate,
    net_rate: Rate,
    years: u32,
    dynamics: Rate,
) -> VorsorgeResult<Money> {
    let without_costs = plan_value(monthly, initial, gross_rate, years, dynamics)?;
    let with_costs = plan_value(monthly, initial, net_rate, years, dynamics)?;
    Ok(without_costs - with_costs)
}
