use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::VorsorgeError;
use crate::params::FilingStatus;
use crate::types::{ensure_fraction, ensure_non_negative, Money, Rate};
use crate::VorsorgeResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Progressive income-tax schedule used for marginal-rate lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeTaxSchedule {
    /// Income up to this amount is untaxed (Grundfreibetrag).
    pub basic_allowance: Money,
    /// Upper end of the entry zone taxed at `entry_rate`.
    pub entry_zone_end: Money,
    pub entry_rate: Rate,
    /// Upper end of the linear progression zone reaching `top_rate`.
    pub progression_zone_end: Money,
    pub top_rate: Rate,
    /// Income above this amount is taxed at `wealth_rate` (Reichensteuer).
    pub wealth_threshold: Money,
    pub wealth_rate: Rate,
}

impl Default for IncomeTaxSchedule {
    fn default() -> Self {
        Self {
            basic_allowance: dec!(11_604),
            entry_zone_end: dec!(17_005),
            entry_rate: dec!(0.14),
            progression_zone_end: dec!(66_760),
            top_rate: dec!(0.42),
            wealth_threshold: dec!(277_825),
            wealth_rate: dec!(0.45),
        }
    }
}

/// Statutory constants for one tax year. Resolved once at the entry point and
/// passed down explicitly; no formula reads a hidden constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Flat withholding tax incl. solidarity surcharge (25% * 1.055).
    pub capital_gains_tax_rate: Rate,
    pub saver_allowance_single: Money,
    pub saver_allowance_couple: Money,
    /// Share of Basisrente contributions deductible during accumulation.
    pub basisrente_deductible_fraction: Rate,
    /// Share of the Basisrente payout subject to income tax (cohort phase-in).
    pub basisrente_taxable_fraction: Rate,
    pub riester_base_subsidy: Money,
    pub riester_child_subsidy: Money,
    /// Cap on Riester contributions eligible for the special-expense deduction.
    pub riester_max_deductible: Money,
    /// Yearly own contribution required for the full subsidy (Sockelbetrag).
    pub riester_minimum_own_contribution: Money,
    pub riester_max_lump_sum_fraction: Rate,
    /// Share of a Privatrente lump-sum gain subject to income tax.
    pub privatrente_lump_sum_taxable_share: Rate,
    pub max_horizon_years: u32,
    pub income_tax: IncomeTaxSchedule,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            capital_gains_tax_rate: dec!(0.26375),
            saver_allowance_single: dec!(1000),
            saver_allowance_couple: dec!(2000),
            basisrente_deductible_fraction: Decimal::ONE,
            basisrente_taxable_fraction: Decimal::ONE,
            riester_base_subsidy: dec!(175),
            riester_child_subsidy: dec!(300),
            riester_max_deductible: dec!(2100),
            riester_minimum_own_contribution: dec!(60),
            riester_max_lump_sum_fraction: dec!(0.30),
            privatrente_lump_sum_taxable_share: dec!(0.5),
            max_horizon_years: 100,
            income_tax: IncomeTaxSchedule::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Behaviour
// ---------------------------------------------------------------------------

impl RuleSet {
    /// Saver's allowance (Sparerpauschbetrag) for one sale year.
    pub fn saver_allowance(&self, filing_status: FilingStatus) -> Money {
        match filing_status {
            FilingStatus::Single => self.saver_allowance_single,
            FilingStatus::Couple => self.saver_allowance_couple,
        }
    }

    pub fn validate(&self) -> VorsorgeResult<()> {
        ensure_fraction("rules.capital_gains_tax_rate", self.capital_gains_tax_rate)?;
        ensure_non_negative("rules.saver_allowance_single", self.saver_allowance_single)?;
        ensure_non_negative("rules.saver_allowance_couple", self.saver_allowance_couple)?;
        ensure_fraction(
            "rules.basisrente_deductible_fraction",
            self.basisrente_deductible_fraction,
        )?;
        ensure_fraction(
            "rules.basisrente_taxable_fraction",
            self.basisrente_taxable_fraction,
        )?;
        ensure_non_negative("rules.riester_base_subsidy", self.riester_base_subsidy)?;
        ensure_non_negative("rules.riester_child_subsidy", self.riester_child_subsidy)?;
        ensure_non_negative("rules.riester_max_deductible", self.riester_max_deductible)?;
        ensure_non_negative(
            "rules.riester_minimum_own_contribution",
            self.riester_minimum_own_contribution,
        )?;
        ensure_fraction(
            "rules.riester_max_lump_sum_fraction",
            self.riester_max_lump_sum_fraction,
        )?;
        ensure_fraction(
            "rules.privatrente_lump_sum_taxable_share",
            self.privatrente_lump_sum_taxable_share,
        )?;
        if self.max_horizon_years == 0 {
            return Err(VorsorgeError::invalid(
                "rules.max_horizon_years",
                "must be > 0",
            ));
        }
        self.income_tax.validate()
    }
}

impl IncomeTaxSchedule {
    pub fn validate(&self) -> VorsorgeResult<()> {
        ensure_non_negative("rules.income_tax.basic_allowance", self.basic_allowance)?;
        ensure_fraction("rules.income_tax.entry_rate", self.entry_rate)?;
        ensure_fraction("rules.income_tax.top_rate", self.top_rate)?;
        ensure_fraction("rules.income_tax.wealth_rate", self.wealth_rate)?;

        let ordered = self.basic_allowance <= self.entry_zone_end
            && self.entry_zone_end < self.progression_zone_end
            && self.progression_zone_end <= self.wealth_threshold;
        if !ordered {
            return Err(VorsorgeError::invalid(
                "rules.income_tax",
                "zone boundaries must be ascending and the progression zone non-empty",
            ));
        }
        Ok(())
    }
}
