pub mod comparison;
pub mod products;
pub mod tax;

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use vorsorge_core::params::{FilingStatus, SavingsPriority};
use vorsorge_core::{GlobalParameters, ProductKind};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FilingArg {
    Single,
    Couple,
}

impl From<FilingArg> for FilingStatus {
    fn from(arg: FilingArg) -> Self {
        match arg {
            FilingArg::Single => FilingStatus::Single,
            FilingArg::Couple => FilingStatus::Couple,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProductArg {
    Etf,
    Basisrente,
    Riester,
    Privatrente,
}

impl From<ProductArg> for ProductKind {
    fn from(arg: ProductArg) -> Self {
        match arg {
            ProductArg::Etf => ProductKind::Etf,
            ProductArg::Basisrente => ProductKind::Basisrente,
            ProductArg::Riester => ProductKind::Riester,
            ProductArg::Privatrente => ProductKind::Privatrente,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Flexibility,
    Guarantee,
    Funding,
}

impl From<PriorityArg> for SavingsPriority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Flexibility => SavingsPriority::Flexibility,
            PriorityArg::Guarantee => SavingsPriority::Guarantee,
            PriorityArg::Funding => SavingsPriority::Funding,
        }
    }
}

/// Savings-plan inputs shared by every product command
#[derive(Args)]
pub struct GlobalArgs {
    /// Path to a JSON request file (otherwise piped stdin or flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly contribution in EUR
    #[arg(long)]
    pub monthly: Option<Decimal>,

    /// One-off lump sum invested at the start, in EUR
    #[arg(long, default_value = "0")]
    pub initial: Decimal,

    /// Savings horizon in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Marginal income-tax rate while saving (e.g. 0.42)
    #[arg(long)]
    pub accumulation_tax_rate: Option<Decimal>,

    /// Marginal income-tax rate in retirement (e.g. 0.25)
    #[arg(long)]
    pub retirement_tax_rate: Option<Decimal>,

    /// Filing status, sets the saver's allowance
    #[arg(long, value_enum, default_value = "single")]
    pub filing_status: FilingArg,
}

impl GlobalArgs {
    pub fn to_global(
        &self,
        selected_products: Vec<ProductKind>,
    ) -> Result<GlobalParameters, Box<dyn std::error::Error>> {
        Ok(GlobalParameters {
            monthly_contribution: self
                .monthly
                .ok_or("--monthly is required (or provide --input)")?,
            initial_investment: self.initial,
            horizon_years: self
                .years
                .ok_or("--years is required (or provide --input)")?,
            accumulation_tax_rate: self
                .accumulation_tax_rate
                .ok_or("--accumulation-tax-rate is required (or provide --input)")?,
            retirement_tax_rate: self
                .retirement_tax_rate
                .ok_or("--retirement-tax-rate is required (or provide --input)")?,
            filing_status: self.filing_status.into(),
            selected_products,
            priorities: Vec::new(),
        })
    }
}
