use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::compounding::dynamic_contributions;
use crate::config::RuleSet;
use crate::error::VorsorgeError;
use crate::types::{ensure_fraction, ensure_non_negative, Money, Rate};
use crate::VorsorgeResult;

// ---------------------------------------------------------------------------
// Shared inputs
// ---------------------------------------------------------------------------

/// Joint assessment doubles the saver's allowance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    #[default]
    Single,
    Couple,
}

/// What the saver cares about besides the final number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsPriority {
    /// Access to the money before retirement.
    Flexibility,
    /// Contributions guaranteed at payout start.
    Guarantee,
    /// State subsidies or tax deductions.
    Funding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Etf,
    Basisrente,
    Riester,
    Privatrente,
}

/// Qualitative attributes that drive the advisory notes, never the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTraits {
    pub freely_accessible: bool,
    pub capital_guarantee: bool,
    pub state_funded: bool,
}

impl ProductKind {
    pub const ALL: [ProductKind; 4] = [
        ProductKind::Etf,
        ProductKind::Basisrente,
        ProductKind::Riester,
        ProductKind::Privatrente,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProductKind::Etf => "ETF savings plan",
            ProductKind::Basisrente => "Basisrente (Rürup)",
            ProductKind::Riester => "Riester pension",
            ProductKind::Privatrente => "Private pension insurance",
        }
    }

    pub fn traits(self) -> ProductTraits {
        match self {
            ProductKind::Etf => ProductTraits {
                freely_accessible: true,
                capital_guarantee: false,
                state_funded: false,
            },
            ProductKind::Basisrente => ProductTraits {
                freely_accessible: false,
                capital_guarantee: false,
                state_funded: true,
            },
            ProductKind::Riester => ProductTraits {
                freely_accessible: false,
                capital_guarantee: true,
                state_funded: true,
            },
            // Surrender is possible at any time, at a loss.
            ProductKind::Privatrente => ProductTraits {
                freely_accessible: true,
                capital_guarantee: false,
                state_funded: false,
            },
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parameters shared by every product in one calculation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalParameters {
    pub monthly_contribution: Money,
    #[serde(default)]
    pub initial_investment: Money,
    pub horizon_years: u32,
    /// Marginal income-tax rate while saving.
    pub accumulation_tax_rate: Rate,
    /// Marginal income-tax rate on retirement income.
    pub retirement_tax_rate: Rate,
    #[serde(default)]
    pub filing_status: FilingStatus,
    #[serde(default = "all_products")]
    pub selected_products: Vec<ProductKind>,
    #[serde(default)]
    pub priorities: Vec<SavingsPriority>,
}

fn all_products() -> Vec<ProductKind> {
    ProductKind::ALL.to_vec()
}

impl GlobalParameters {
    pub fn validate(&self, rules: &RuleSet) -> VorsorgeResult<()> {
        ensure_non_negative("global.monthly_contribution", self.monthly_contribution)?;
        ensure_non_negative("global.initial_investment", self.initial_investment)?;
        if self.horizon_years == 0 {
            return Err(VorsorgeError::invalid(
                "global.horizon_years",
                "horizon must be at least one year",
            ));
        }
        if self.horizon_years > rules.max_horizon_years {
            return Err(VorsorgeError::invalid(
                "global.horizon_years",
                format!(
                    "horizon of {} years exceeds the maximum of {}",
                    self.horizon_years, rules.max_horizon_years
                ),
            ));
        }
        ensure_fraction("global.accumulation_tax_rate", self.accumulation_tax_rate)?;
        ensure_fraction("global.retirement_tax_rate", self.retirement_tax_rate)?;
        Ok(())
    }

    pub fn yearly_contribution(&self) -> Money {
        self.monthly_contribution * dec!(12)
    }

    /// Own money paid in after `years` years, lump sum included.
    pub fn contributions_after(&self, years: u32) -> Money {
        self.yearly_contribution() * Decimal::from(years) + self.initial_investment
    }

    /// Own money paid in after `years` years when the monthly contribution
    /// rises by `dynamics` every year.
    pub fn contributions_with_dynamics(&self, years: u32, dynamics: Rate) -> VorsorgeResult<Money> {
        if dynamics.is_zero() {
            return Ok(self.contributions_after(years));
        }
        dynamic_contributions(
            self.monthly_contribution,
            dynamics,
            self.initial_investment,
            years,
        )
    }
}

// ---------------------------------------------------------------------------
// Product inputs
// ---------------------------------------------------------------------------

/// Cost structure of an insurance contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    /// Commission embedded in the running costs.
    #[default]
    Gross,
    /// Fee-based contract: lower running costs plus a one-time advisor fee.
    Net,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtfParameters {
    pub gross_return: Rate,
    pub ter: Rate,
    pub spread: Rate,
    pub order_fee: Money,
    pub custody_fee_yearly: Money,
    pub orders_per_year: u32,
    /// Number of sell-and-rebuy events spread over the horizon; 0 disables rebalancing.
    pub rebalancing_count: u32,
    /// Yearly increase of the monthly contribution (0.02 = 2 %).
    pub contribution_dynamics: Rate,
}

impl Default for EtfParameters {
    fn default() -> Self {
        Self {
            gross_return: dec!(0.07),
            ter: dec!(0.002),
            spread: dec!(0.002),
            order_fee: dec!(1.0),
            custody_fee_yearly: Decimal::ZERO,
            orders_per_year: 12,
            rebalancing_count: 0,
            contribution_dynamics: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasisrenteParameters {
    pub gross_return: Rate,
    pub effective_cost: Rate,
    pub advisor_fee: Money,
    pub policy_type: PolicyType,
    pub contribution_dynamics: Rate,
}

impl Default for BasisrenteParameters {
    fn default() -> Self {
        Self {
            gross_return: dec!(0.07),
            effective_cost: dec!(0.015),
            advisor_fee: Decimal::ZERO,
            policy_type: PolicyType::Gross,
            contribution_dynamics: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiesterParameters {
    pub gross_return: Rate,
    pub effective_cost: Rate,
    pub children: u32,
    /// Share of the capital paid out as a lump sum at retirement start.
    pub lump_sum_fraction: Rate,
}

impl Default for RiesterParameters {
    fn default() -> Self {
        Self {
            gross_return: dec!(0.03),
            effective_cost: dec!(0.02),
            children: 0,
            lump_sum_fraction: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayoutOption {
    /// Lifelong annuity; only the income share for the start age is taxed.
    Annuity { retirement_age: u32 },
    /// Capital payout; half of the gain is taxed.
    LumpSum,
}

impl Default for PayoutOption {
    fn default() -> Self {
        PayoutOption::Annuity { retirement_age: 67 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivatrenteParameters {
    pub gross_return: Rate,
    pub effective_cost: Rate,
    pub advisor_fee: Money,
    pub policy_type: PolicyType,
    pub payout: PayoutOption,
}

impl Default for PrivatrenteParameters {
    fn default() -> Self {
        Self {
            gross_return: dec!(0.05),
            effective_cost: dec!(0.018),
            advisor_fee: Decimal::ZERO,
            policy_type: PolicyType::Gross,
            payout: PayoutOption::default(),
        }
    }
}

/// Per-product parameters, tagged by product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "product", rename_all = "snake_case")]
pub enum ProductParameters {
    Etf(EtfParameters),
    Basisrente(BasisrenteParameters),
    Riester(RiesterParameters),
    Privatrente(PrivatrenteParameters),
}

impl ProductParameters {
    pub fn kind(&self) -> ProductKind {
        match self {
            ProductParameters::Etf(_) => ProductKind::Etf,
            ProductParameters::Basisrente(_) => ProductKind::Basisrente,
            ProductParameters::Riester(_) => ProductKind::Riester,
            ProductParameters::Privatrente(_) => ProductKind::Privatrente,
        }
    }

    /// Parameters with every field at its default for `kind`.
    pub fn default_for(kind: ProductKind) -> Self {
        match kind {
            ProductKind::Etf => ProductParameters::Etf(EtfParameters::default()),
            ProductKind::Basisrente => {
                ProductParameters::Basisrente(BasisrenteParameters::default())
            }
            ProductKind::Riester => ProductParameters::Riester(RiesterParameters::default()),
            ProductKind::Privatrente => {
                ProductParameters::Privatrente(PrivatrenteParameters::default())
            }
        }
    }
}

impl From<EtfParameters> for ProductParameters {
    fn from(p: EtfParameters) -> Self {
        ProductParameters::Etf(p)
    }
}

impl From<BasisrenteParameters> for ProductParameters {
    fn from(p: BasisrenteParameters) -> Self {
        ProductParameters::Basisrente(p)
    }
}

impl From<RiesterParameters> for ProductParameters {
    fn from(p: RiesterParameters) -> Self {
        ProductParameters::Riester(p)
    }
}

impl From<PrivatrenteParameters> for ProductParameters {
    fn from(p: PrivatrenteParameters) -> Self {
        ProductParameters::Privatrente(p)
    }
}

/// Advisor fees only exist on net policies.
pub(crate) fn validate_policy_fee(
    prefix: &str,
    policy_type: PolicyType,
    advisor_fee: Money,
) -> VorsorgeResult<()> {
    ensure_non_negative(&format!("{prefix}.advisor_fee"), advisor_fee)?;
    if policy_type == PolicyType::Gross && !advisor_fee.is_zero() {
        return Err(VorsorgeError::invalid(
            format!("{prefix}.advisor_fee"),
            "gross policies carry their costs in effective_cost; use policy_type net for a one-time fee",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global() -> GlobalParameters {
        GlobalParameters {
            monthly_contribution: dec!(100),
            initial_investment: Decimal::ZERO,
            horizon_years: 10,
            accumulation_tax_rate: dec!(0.42),
            retirement_tax_rate: dec!(0.30),
            filing_status: FilingStatus::Single,
            selected_products: ProductKind::ALL.to_vec(),
            priorities: Vec::new(),
        }
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let mut g = global();
        g.horizon_years = 0;
        assert!(g.validate(&RuleSet::default()).is_err());
    }

    #[test]
    fn test_horizon_above_rule_cap_rejected() {
        let mut g = global();
        g.horizon_years = 101;
        assert!(g.validate(&RuleSet::default()).is_err());
    }

    #[test]
    fn test_tax_rate_out_of_range_rejected() {
        let mut g = global();
        g.retirement_tax_rate = dec!(1.5);
        assert!(g.validate(&RuleSet::default()).is_err());
    }

    #[test]
    fn test_contributions_include_lump_sum() {
        let mut g = global();
        g.initial_investment = dec!(5_000);
        assert_eq!(g.contributions_after(10), dec!(17_000));
    }

    #[test]
    fn test_flat_dynamics_equal_plain_contributions() {
        let g = global();
        assert_eq!(
            g.contributions_with_dynamics(10, Decimal::ZERO).unwrap(),
            g.contributions_after(10)
        );
        // 1,200 + 1,224
        assert_eq!(
            g.contributions_with_dynamics(2, dec!(0.02)).unwrap(),
            dec!(2_424)
        );
    }

    #[test]
    fn test_product_parameters_tagged_deserialization() {
        let p: ProductParameters =
            serde_json::from_str(r#"{ "product": "riester", "children": 2 }"#).unwrap();
        match p {
            ProductParameters::Riester(r) => {
                assert_eq!(r.children, 2);
                assert_eq!(r.effective_cost, dec!(0.02));
            }
            other => panic!("unexpected variant {other:?}"),
        }
    }

    #[test]
    fn test_global_defaults_select_all_products() {
        let g: GlobalParameters = serde_json::from_str(
            r#"{ "monthly_contribution": "200", "horizon_years": 20,
                 "accumulation_tax_rate": "0.3", "retirement_tax_rate": "0.25" }"#,
        )
        .unwrap();
        assert_eq!(g.selected_products, ProductKind::ALL.to_vec());
        assert_eq!(g.filing_status, FilingStatus::Single);
        assert!(g.priorities.is_empty());
    }

    #[test]
    fn test_gross_policy_with_fee_rejected() {
        assert!(validate_policy_fee("basisrente", PolicyType::Gross, dec!(100)).is_err());
        assert!(validate_policy_fee("basisrente", PolicyType::Net, dec!(100)).is_ok());
        assert!(validate_policy_fee("basisrente", PolicyType::Gross, Decimal::ZERO).is_ok());
    }
}
