use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use vorsorge_core::{GlobalParameters, ProductParameters, RuleSet};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Rule overrides are optional in every request.
fn rules_from(rules: Option<RuleSet>) -> RuleSet {
    rules.unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ProductRequest {
    global: GlobalParameters,
    product: ProductParameters,
    #[serde(default)]
    rules: Option<RuleSet>,
}

#[napi]
pub fn calculate_product(input_json: String) -> NapiResult<String> {
    let request: ProductRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let rules = rules_from(request.rules);
    let outcome = vorsorge_core::calculate(&request.global, &request.product, &rules)
        .map_err(to_napi_error)?;
    serde_json::to_string(&outcome).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ComparisonRequest {
    global: GlobalParameters,
    products: Vec<ProductParameters>,
    #[serde(default)]
    rules: Option<RuleSet>,
}

#[napi]
pub fn compare_products(input_json: String) -> NapiResult<String> {
    let request: ComparisonRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let rules = rules_from(request.rules);
    let result = vorsorge_core::compare(&request.global, &request.products, &rules)
        .map_err(to_napi_error)?;
    serde_json::to_string(&result).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Rules and tax
// ---------------------------------------------------------------------------

#[napi]
pub fn default_rules() -> NapiResult<String> {
    serde_json::to_string(&RuleSet::default()).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct MarginalRateRequest {
    income: Decimal,
    #[serde(default)]
    rules: Option<RuleSet>,
}

/// Returns the marginal rate as a decimal string, e.g. "0.42".
#[napi]
pub fn marginal_tax_rate(input_json: String) -> NapiResult<String> {
    let request: MarginalRateRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let rules = rules_from(request.rules);
    let rate = vorsorge_core::tax::marginal_income_tax_rate(request.income, &rules.income_tax)
        .map_err(to_napi_error)?;
    Ok(rate.to_string())
}
