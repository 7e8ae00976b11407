use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::params::ProductKind;
use crate::types::{Money, Rate};

/// Snapshot at the end of one contract year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSnapshot {
    pub year: u32,
    /// Cumulative own contributions, lump sum included.
    pub contributions: Money,
    /// Contract value after fees, before any tax.
    pub gross_value: Money,
    /// Cumulative state subsidies paid into the contract.
    pub state_subsidies: Money,
    /// Cumulative tax refunds paid out to the saver.
    pub tax_savings: Money,
    /// Tax realised in this year (sale, rebalancing or payout).
    pub tax_due: Money,
    /// Spendable value had the contract ended in this year.
    pub net_value: Money,
}

/// Itemised costs over the full horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Final value lost to running costs (TER + spread, or effective cost).
    pub return_drag: Money,
    /// Purchase spread on the lump sum, compounded to the horizon.
    pub purchase_spread: Money,
    pub order_fees: Money,
    pub custody_fees: Money,
    pub advisor_fee: Money,
    pub rebalancing_costs: Money,
    pub total: Money,
}

impl CostBreakdown {
    pub(crate) fn with_total(mut self) -> Self {
        self.total = self.return_drag
            + self.purchase_spread
            + self.order_fees
            + self.custody_fees
            + self.advisor_fee
            + self.rebalancing_costs;
        self
    }
}

/// Terminal figures of a projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalValues {
    pub gross_value: Money,
    pub net_value: Money,
    pub contributions: Money,
    pub state_subsidies: Money,
    pub tax_savings: Money,
    pub payout_tax: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lump_sum_payout: Option<Money>,
}

/// Outcome of one product calculation. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductOutcome {
    pub product: ProductKind,
    pub gross_return: Rate,
    pub effective_cost: Rate,
    pub net_rate: Rate,
    pub trajectory: Vec<YearSnapshot>,
    pub gross_final_value: Money,
    pub net_final_value: Money,
    pub total_contributions: Money,
    pub total_state_subsidies: Money,
    pub total_tax_savings: Money,
    /// Subsidies plus tax savings.
    pub total_benefits: Money,
    /// Contributions minus tax refunds; subsidies are not own money.
    pub net_own_investment: Money,
    pub profit: Money,
    pub payout_tax: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lump_sum_payout: Option<Money>,
    pub costs: CostBreakdown,
    /// Costs meet or exceed the gross return.
    pub degenerate: bool,
    pub warnings: Vec<String>,
}

impl ProductOutcome {
    /// Profit relative to the net own investment; zero when nothing was invested.
    pub fn return_on_investment(&self) -> Rate {
        if self.net_own_investment <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.profit / self.net_own_investment
    }
}
