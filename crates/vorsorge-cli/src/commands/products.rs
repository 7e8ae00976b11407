use clap::Args;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use vorsorge_core::params::{
    BasisrenteParameters, EtfParameters, PayoutOption, PolicyType, PrivatrenteParameters,
    RiesterParameters,
};
use vorsorge_core::{calculate, with_metadata, GlobalParameters, ProductKind, ProductParameters, RuleSet};

use super::GlobalArgs;
use crate::input;

/// Arguments for an ETF savings-plan projection
#[derive(Args)]
pub struct EtfArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Expected gross annual return (e.g. 0.07)
    #[arg(long)]
    pub gross_return: Option<Decimal>,

    /// Total expense ratio per year
    #[arg(long)]
    pub ter: Option<Decimal>,

    /// Bid/ask spread paid on every purchase
    #[arg(long)]
    pub spread: Option<Decimal>,

    /// Fee per buy order in EUR
    #[arg(long)]
    pub order_fee: Option<Decimal>,

    /// Custody fee per year in EUR
    #[arg(long)]
    pub custody_fee: Option<Decimal>,

    /// Buy orders per year
    #[arg(long)]
    pub orders_per_year: Option<u32>,

    /// Number of full sell-and-rebuy events over the horizon
    #[arg(long)]
    pub rebalancing_count: Option<u32>,

    /// Yearly increase of the monthly contribution (e.g. 0.02)
    #[arg(long)]
    pub contribution_dynamics: Option<Decimal>,
}

/// Arguments for a Basisrente projection
#[derive(Args)]
pub struct BasisrenteArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Expected gross annual return
    #[arg(long)]
    pub gross_return: Option<Decimal>,

    /// Effective annual cost of the contract
    #[arg(long)]
    pub effective_cost: Option<Decimal>,

    /// One-time advisor fee in EUR (net policies only)
    #[arg(long)]
    pub advisor_fee: Option<Decimal>,

    /// Fee-based net policy instead of a commission-based gross policy
    #[arg(long)]
    pub net_policy: bool,

    /// Yearly increase of the monthly contribution (e.g. 0.02)
    #[arg(long)]
    pub contribution_dynamics: Option<Decimal>,
}

/// Arguments for a Riester projection
#[derive(Args)]
pub struct RiesterArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Expected gross annual return
    #[arg(long)]
    pub gross_return: Option<Decimal>,

    /// Effective annual cost of the contract
    #[arg(long)]
    pub effective_cost: Option<Decimal>,

    /// Children eligible for the child subsidy
    #[arg(long, default_value = "0")]
    pub children: u32,

    /// Share of the capital taken as a lump sum at retirement
    #[arg(long)]
    pub lump_sum_fraction: Option<Decimal>,
}

/// Arguments for a private pension insurance projection
#[derive(Args)]
pub struct PrivatrenteArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Expected gross annual return
    #[arg(long)]
    pub gross_return: Option<Decimal>,

    /// Effective annual cost of the contract
    #[arg(long)]
    pub effective_cost: Option<Decimal>,

    /// One-time advisor fee in EUR (net policies only)
    #[arg(long)]
    pub advisor_fee: Option<Decimal>,

    /// Fee-based net policy instead of a commission-based gross policy
    #[arg(long)]
    pub net_policy: bool,

    /// Take the capital as a lump sum instead of an annuity
    #[arg(long)]
    pub lump_sum: bool,

    /// Age at annuity start
    #[arg(long, default_value = "67")]
    pub retirement_age: u32,
}

/// Request body accepted from `--input` or stdin.
#[derive(Debug, Serialize, Deserialize)]
struct ProductRequest<P> {
    global: GlobalParameters,
    #[serde(default)]
    product: P,
}

fn policy_type(net_policy: bool) -> PolicyType {
    if net_policy {
        PolicyType::Net
    } else {
        PolicyType::Gross
    }
}

fn resolve_request<P>(
    global: &GlobalArgs,
    kind: ProductKind,
    from_flags: impl FnOnce() -> P,
) -> Result<ProductRequest<P>, Box<dyn std::error::Error>>
where
    P: DeserializeOwned + Default,
{
    if let Some(request) = input::read_request(global.input.as_deref())? {
        return Ok(request);
    }
    Ok(ProductRequest {
        global: global.to_global(vec![kind])?,
        product: from_flags(),
    })
}

fn run_product<P>(
    request: ProductRequest<P>,
    methodology: &str,
    rules: &RuleSet,
) -> Result<Value, Box<dyn std::error::Error>>
where
    P: Serialize + Clone + Into<ProductParameters>,
{
    let started = Instant::now();
    let params: ProductParameters = request.product.clone().into();
    let outcome = calculate(&request.global, &params, rules)?;
    let elapsed = started.elapsed().as_micros() as u64;

    let warnings = outcome.warnings.clone();
    let output = with_metadata(methodology, &request, warnings, elapsed, outcome);
    Ok(serde_json::to_value(output)?)
}

pub fn run_etf(args: EtfArgs, rules: &RuleSet) -> Result<Value, Box<dyn std::error::Error>> {
    let request = resolve_request(&args.global, ProductKind::Etf, || {
        let d = EtfParameters::default();
        EtfParameters {
            gross_return: args.gross_return.unwrap_or(d.gross_return),
            ter: args.ter.unwrap_or(d.ter),
            spread: args.spread.unwrap_or(d.spread),
            order_fee: args.order_fee.unwrap_or(d.order_fee),
            custody_fee_yearly: args.custody_fee.unwrap_or(d.custody_fee_yearly),
            orders_per_year: args.orders_per_year.unwrap_or(d.orders_per_year),
            rebalancing_count: args.rebalancing_count.unwrap_or(d.rebalancing_count),
            contribution_dynamics: args
                .contribution_dynamics
                .unwrap_or(d.contribution_dynamics),
        }
    })?;
    run_product(
        request,
        "ETF savings plan: monthly annuity at gross return minus TER and spread, \
         flat capital-gains tax on the final gain above the saver's allowance",
        rules,
    )
}

pub fn run_basisrente(
    args: BasisrenteArgs,
    rules: &RuleSet,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = resolve_request(&args.global, ProductKind::Basisrente, || {
        let d = BasisrenteParameters::default();
        BasisrenteParameters {
            gross_return: args.gross_return.unwrap_or(d.gross_return),
            effective_cost: args.effective_cost.unwrap_or(d.effective_cost),
            advisor_fee: args.advisor_fee.unwrap_or(d.advisor_fee),
            policy_type: policy_type(args.net_policy),
            contribution_dynamics: args
                .contribution_dynamics
                .unwrap_or(d.contribution_dynamics),
        }
    })?;
    run_product(
        request,
        "Basisrente: deductible contributions refunded at the accumulation tax rate, \
         payout taxed as income at the retirement tax rate",
        rules,
    )
}

pub fn run_riester(args: RiesterArgs, rules: &RuleSet) -> Result<Value, Box<dyn std::error::Error>> {
    let request = resolve_request(&args.global, ProductKind::Riester, || {
        let d = RiesterParameters::default();
        RiesterParameters {
            gross_return: args.gross_return.unwrap_or(d.gross_return),
            effective_cost: args.effective_cost.unwrap_or(d.effective_cost),
            children: args.children,
            lump_sum_fraction: args.lump_sum_fraction.unwrap_or(d.lump_sum_fraction),
        }
    })?;
    run_product(
        request,
        "Riester: subsidies paid into the contract, favorable-treatment test against \
         the special-expense deduction, payout fully taxed as income",
        rules,
    )
}

pub fn run_privatrente(
    args: PrivatrenteArgs,
    rules: &RuleSet,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = resolve_request(&args.global, ProductKind::Privatrente, || {
        let d = PrivatrenteParameters::default();
        PrivatrenteParameters {
            gross_return: args.gross_return.unwrap_or(d.gross_return),
            effective_cost: args.effective_cost.unwrap_or(d.effective_cost),
            advisor_fee: args.advisor_fee.unwrap_or(d.advisor_fee),
            policy_type: policy_type(args.net_policy),
            payout: if args.lump_sum {
                PayoutOption::LumpSum
            } else {
                PayoutOption::Annuity {
                    retirement_age: args.retirement_age,
                }
            },
        }
    })?;
    run_product(
        request,
        "Private pension insurance: no accumulation benefit; annuity taxed on the \
         income share for the start age, lump sum on half the gain",
        rules,
    )
}
