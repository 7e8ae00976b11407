use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use vorsorge_core::tax::marginal_income_tax_rate;
use vorsorge_core::{with_metadata, RuleSet};

/// Arguments for a marginal-rate lookup
#[derive(Args)]
pub struct MarginalRateArgs {
    /// Yearly taxable income in EUR
    #[arg(long)]
    pub income: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
struct MarginalRateOutput {
    income: Decimal,
    marginal_rate: Decimal,
}

pub fn run_marginal_rate(
    args: MarginalRateArgs,
    rules: &RuleSet,
) -> Result<Value, Box<dyn std::error::Error>> {
    let started = Instant::now();
    let rate = marginal_income_tax_rate(args.income, &rules.income_tax)?;
    let elapsed = started.elapsed().as_micros() as u64;

    let output = with_metadata(
        "Piecewise schedule: basic allowance, entry rate, linear progression to the \
         top rate, wealth rate above the threshold",
        &rules.income_tax,
        Vec::new(),
        elapsed,
        MarginalRateOutput {
            income: args.income,
            marginal_rate: rate,
        },
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_rules(rules: &RuleSet) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(rules)?)
}
