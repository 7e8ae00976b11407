use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::VorsorgeError;
use crate::VorsorgeResult;

/// All monetary values in EUR. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Reject a value outside the closed unit interval.
pub(crate) fn ensure_fraction(field: &str, value: Rate) -> VorsorgeResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(VorsorgeError::invalid(
            field,
            format!("must lie in [0, 1], got {value}"),
        ));
    }
    Ok(())
}

/// Reject a negative amount.
pub(crate) fn ensure_non_negative(field: &str, value: Money) -> VorsorgeResult<()> {
    if value < Decimal::ZERO {
        return Err(VorsorgeError::invalid(
            field,
            format!("must be >= 0, got {value}"),
        ));
    }
    Ok(())
}
