use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use vorsorge_core::params::RiesterParameters;
use vorsorge_core::{compare, with_metadata, GlobalParameters, ProductKind, ProductParameters, RuleSet};

use super::{GlobalArgs, PriorityArg, ProductArg};
use crate::input;

/// Arguments for a product comparison
#[derive(Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Products to compare (default: all)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub products: Vec<ProductArg>,

    /// Stated savings priorities, drive the advisory notes
    #[arg(long, value_enum, value_delimiter = ',')]
    pub priorities: Vec<PriorityArg>,

    /// Children eligible for the Riester child subsidy
    #[arg(long, default_value = "0")]
    pub children: u32,
}

/// Request body accepted from `--input` or stdin. Products without an
/// entry in `products` run with their default parameters.
#[derive(Debug, Serialize, Deserialize)]
struct ComparisonRequest {
    global: GlobalParameters,
    #[serde(default)]
    products: Vec<ProductParameters>,
}

impl ComparisonRequest {
    fn with_defaults(mut self) -> Self {
        for kind in &self.global.selected_products {
            if !self.products.iter().any(|p| p.kind() == *kind) {
                self.products.push(ProductParameters::default_for(*kind));
            }
        }
        self
    }
}

pub fn run_compare(args: CompareArgs, rules: &RuleSet) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ComparisonRequest = match input::read_request(args.global.input.as_deref())? {
        Some(request) => request,
        None => {
            let selected: Vec<ProductKind> = if args.products.is_empty() {
                ProductKind::ALL.to_vec()
            } else {
                args.products.iter().map(|p| (*p).into()).collect()
            };
            let mut global = args.global.to_global(selected)?;
            global.priorities = args.priorities.iter().map(|p| (*p).into()).collect();
            ComparisonRequest {
                global,
                products: vec![RiesterParameters {
                    children: args.children,
                    ..RiesterParameters::default()
                }
                .into()],
            }
        }
    };
    let request = request.with_defaults();

    let started = Instant::now();
    let result = compare(&request.global, &request.products, rules)?;
    let elapsed = started.elapsed().as_micros() as u64;

    let warnings: Vec<String> = result
        .ranking
        .iter()
        .flat_map(|r| r.outcome.warnings.iter().cloned())
        .chain(result.recommendation.notes.iter().map(|n| n.message()))
        .collect();
    tracing::debug!(
        leader = ?result.recommendation.leader,
        elapsed_us = elapsed,
        "comparison finished"
    );

    let output = with_metadata(
        "Ranking by final net value after costs, subsidies and taxes; \
         ties go to the lower effective cost",
        &request,
        warnings,
        elapsed,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
