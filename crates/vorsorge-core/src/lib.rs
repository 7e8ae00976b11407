pub mod comparison;
pub mod compounding;
pub mod config;
pub mod error;
pub mod outcome;
pub mod params;
pub mod products;
pub mod tax;
pub mod types;

pub use comparison::{compare, ComparisonResult};
pub use config::{IncomeTaxSchedule, RuleSet};
pub use error::VorsorgeError;
pub use outcome::{CostBreakdown, ProductOutcome, YearSnapshot};
pub use params::{GlobalParameters, ProductKind, ProductParameters};
pub use products::calculate;
pub use types::*;

/// Standard result type for all retirement-savings calculations
pub type VorsorgeResult<T> = Result<T, VorsorgeError>;
