use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::config::RuleSet;
use crate::error::VorsorgeError;
use crate::outcome::ProductOutcome;
use crate::params::{GlobalParameters, ProductKind, ProductParameters, SavingsPriority};
use crate::products::calculate;
use crate::types::Money;
use crate::VorsorgeResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProduct {
    /// 1-based position in the ranking.
    pub rank: u32,
    pub product: ProductKind,
    pub outcome: ProductOutcome,
    /// Net final value the leader has on top of this product.
    pub shortfall_to_leader: Money,
}

/// Net values of every ranked product at the end of one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedYear {
    pub year: u32,
    pub net_values: BTreeMap<ProductKind, Money>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTag {
    Clear,
    WithCaveats,
}

/// Qualitative annotations next to the ranking. They never reorder it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdvisoryNote {
    /// Riester with two or more children collects sizeable child subsidies.
    ChildSubsidy {
        children: u32,
        yearly_child_subsidy: Money,
    },
    /// The leader locks the money until retirement.
    Illiquidity { product: ProductKind },
    NoCapitalGuarantee { product: ProductKind },
    NoStateFunding { product: ProductKind },
    /// Costs meet or exceed the gross return.
    DegenerateReturn { product: ProductKind },
}

impl AdvisoryNote {
    /// Informational notes do not turn a recommendation into one with caveats.
    pub fn is_caveat(&self) -> bool {
        !matches!(self, AdvisoryNote::ChildSubsidy { .. })
    }

    pub fn message(&self) -> String {
        match self {
            AdvisoryNote::ChildSubsidy {
                children,
                yearly_child_subsidy,
            } => format!(
                "With {children} children the Riester pension receives {yearly_child_subsidy} EUR child subsidies per year, whatever its rank."
            ),
            AdvisoryNote::Illiquidity { product } => format!(
                "{product} ranks first but the capital is locked until retirement, which conflicts with the wish for flexibility."
            ),
            AdvisoryNote::NoCapitalGuarantee { product } => format!(
                "{product} ranks first but does not guarantee the contributions paid in."
            ),
            AdvisoryNote::NoStateFunding { product } => format!(
                "{product} ranks first without any state subsidy or tax deduction."
            ),
            AdvisoryNote::DegenerateReturn { product } => format!(
                "{product}: costs eat the entire gross return; the projection loses value."
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub leader: ProductKind,
    pub leader_net_value: Money,
    pub tag: RecommendationTag,
    pub summary: String,
    pub notes: Vec<AdvisoryNote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub ranking: Vec<RankedProduct>,
    pub trajectories: Vec<AlignedYear>,
    pub recommendation: Recommendation,
}

impl ComparisonResult {
    pub fn leader(&self) -> Option<&RankedProduct> {
        self.ranking.first()
    }

    pub fn outcome(&self, product: ProductKind) -> Option<&ProductOutcome> {
        self.ranking
            .iter()
            .find(|r| r.product == product)
            .map(|r| &r.outcome)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Run every selected product with the shared global parameters and rank
/// the outcomes by net final value.
///
/// `products` must hold exactly one entry per selected product; entries for
/// products outside the selection are skipped.
pub fn compare(
    global: &GlobalParameters,
    products: &[ProductParameters],
    rules: &RuleSet,
) -> VorsorgeResult<ComparisonResult> {
    let selected = resolve_selection(global, products)?;

    let mut outcomes = Vec::with_capacity(selected.len());
    for params in &selected {
        outcomes.push(calculate(global, params, rules)?);
    }

    outcomes.sort_by(|a, b| {
        b.net_final_value
            .cmp(&a.net_final_value)
            .then_with(|| a.effective_cost.cmp(&b.effective_cost))
            .then_with(|| a.product.cmp(&b.product))
    });

    let leader_value = outcomes
        .first()
        .map(|o| o.net_final_value)
        .unwrap_or(Decimal::ZERO);

    let trajectories = align_trajectories(&outcomes, global.horizon_years);
    let ranking: Vec<RankedProduct> = outcomes
        .into_iter()
        .enumerate()
        .map(|(i, outcome)| RankedProduct {
            rank: i as u32 + 1,
            product: outcome.product,
            shortfall_to_leader: leader_value - outcome.net_final_value,
            outcome,
        })
        .collect();

    let recommendation = recommend(global, &selected, &ranking, rules)?;

    debug!(
        products = ranking.len(),
        leader = ?recommendation.leader,
        tag = ?recommendation.tag,
        "comparison ranked"
    );

    Ok(ComparisonResult {
        ranking,
        trajectories,
        recommendation,
    })
}

/// Parameters of the selected products, in selection order.
fn resolve_selection<'a>(
    global: &GlobalParameters,
    products: &'a [ProductParameters],
) -> VorsorgeResult<Vec<&'a ProductParameters>> {
    if global.selected_products.is_empty() {
        return Err(VorsorgeError::invalid(
            "global.selected_products",
            "select at least one product",
        ));
    }

    let mut seen = BTreeSet::new();
    for kind in &global.selected_products {
        if !seen.insert(*kind) {
            return Err(VorsorgeError::invalid(
                "global.selected_products",
                format!("{kind} is selected twice"),
            ));
        }
    }

    let mut supplied = BTreeSet::new();
    for params in products {
        if !supplied.insert(params.kind()) {
            return Err(VorsorgeError::invalid(
                "products",
                format!("parameters for {} given twice", params.kind()),
            ));
        }
    }

    global
        .selected_products
        .iter()
        .map(|kind| {
            products.iter().find(|p| p.kind() == *kind).ok_or_else(|| {
                VorsorgeError::invalid("products", format!("{kind} is selected but has no parameters"))
            })
        })
        .collect()
}

fn align_trajectories(outcomes: &[ProductOutcome], horizon: u32) -> Vec<AlignedYear> {
    (1..=horizon)
        .map(|year| AlignedYear {
            year,
            net_values: outcomes
                .iter()
                .filter_map(|o| {
                    o.trajectory
                        .iter()
                        .find(|s| s.year == year)
                        .map(|s| (o.product, s.net_value))
                })
                .collect(),
        })
        .collect()
}

fn recommend(
    global: &GlobalParameters,
    selected: &[&ProductParameters],
    ranking: &[RankedProduct],
    rules: &RuleSet,
) -> VorsorgeResult<Recommendation> {
    let leader = ranking.first().ok_or_else(|| {
        VorsorgeError::invalid("global.selected_products", "nothing to rank")
    })?;
    let mut notes = Vec::new();

    for params in selected {
        if let ProductParameters::Riester(r) = params {
            if r.children >= 2 {
                notes.push(AdvisoryNote::ChildSubsidy {
                    children: r.children,
                    yearly_child_subsidy: rules.riester_child_subsidy * Decimal::from(r.children),
                });
            }
        }
    }

    let traits = leader.product.traits();
    let wants = |p: SavingsPriority| global.priorities.contains(&p);
    if wants(SavingsPriority::Flexibility) && !traits.freely_accessible {
        notes.push(AdvisoryNote::Illiquidity {
            product: leader.product,
        });
    }
    if wants(SavingsPriority::Guarantee) && !traits.capital_guarantee {
        notes.push(AdvisoryNote::NoCapitalGuarantee {
            product: leader.product,
        });
    }
    if wants(SavingsPriority::Funding) && !traits.state_funded {
        notes.push(AdvisoryNote::NoStateFunding {
            product: leader.product,
        });
    }

    for ranked in ranking.iter().filter(|r| r.outcome.degenerate) {
        notes.push(AdvisoryNote::DegenerateReturn {
            product: ranked.product,
        });
    }

    let tag = if notes.iter().any(AdvisoryNote::is_caveat) {
        RecommendationTag::WithCaveats
    } else {
        RecommendationTag::Clear
    };

    let mut summary = format!(
        "{} yields the highest net value: {} EUR after {} years.",
        leader.product,
        leader.outcome.net_final_value.round_dp(2),
        global.horizon_years
    );
    if let Some(runner_up) = ranking.get(1) {
        summary.push_str(&format!(
            " {} follows, {} EUR behind.",
            runner_up.product,
            runner_up.shortfall_to_leader.round_dp(2)
        ));
    }

    Ok(Recommendation {
        leader: leader.product,
        leader_net_value: leader.outcome.net_final_value,
        tag,
        summary,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{
        BasisrenteParameters, EtfParameters, FilingStatus, PrivatrenteParameters,
        RiesterParameters,
    };
    use rust_decimal_macros::dec;

    fn global(selected: Vec<ProductKind>) -> GlobalParameters {
        GlobalParameters {
            monthly_contribution: dec!(200),
            initial_investment: Decimal::ZERO,
            horizon_years: 20,
            accumulation_tax_rate: dec!(0.35),
            retirement_tax_rate: dec!(0.25),
            filing_status: FilingStatus::Single,
            selected_products: selected,
            priorities: Vec::new(),
        }
    }

    fn all_params() -> Vec<ProductParameters> {
        ProductKind::ALL
            .iter()
            .map(|k| ProductParameters::default_for(*k))
            .collect()
    }

    #[test]
    fn test_ranking_sorted_by_net_value() {
        let result = compare(
            &global(ProductKind::ALL.to_vec()),
            &all_params(),
            &RuleSet::default(),
        )
        .unwrap();
        assert_eq!(result.ranking.len(), 4);
        for pair in result.ranking.windows(2) {
            assert!(pair[0].outcome.net_final_value >= pair[1].outcome.net_final_value);
        }
        assert_eq!(result.ranking[0].shortfall_to_leader, Decimal::ZERO);
        assert_eq!(result.recommendation.leader, result.ranking[0].product);
        assert_eq!(
            result.ranking.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn test_tie_broken_by_lower_cost() {
        // Nothing paid in: both end at exactly zero.
        let cheap = PrivatrenteParameters {
            gross_return: dec!(0.04),
            effective_cost: dec!(0.01),
            ..PrivatrenteParameters::default()
        };
        let pricey = BasisrenteParameters {
            gross_return: dec!(0.05),
            effective_cost: dec!(0.02),
            ..BasisrenteParameters::default()
        };
        let mut g = global(vec![ProductKind::Basisrente, ProductKind::Privatrente]);
        g.monthly_contribution = Decimal::ZERO;
        let result = compare(&g, &[pricey.into(), cheap.into()], &RuleSet::default()).unwrap();
        assert_eq!(
            result.ranking[0].outcome.net_final_value,
            result.ranking[1].outcome.net_final_value
        );
        assert_eq!(result.ranking[0].product, ProductKind::Privatrente);
    }

    #[test]
    fn test_unselected_parameters_ignored() {
        let result = compare(
            &global(vec![ProductKind::Etf]),
            &all_params(),
            &RuleSet::default(),
        )
        .unwrap();
        assert_eq!(result.ranking.len(), 1);
        assert_eq!(result.trajectories[0].net_values.len(), 1);
    }

    #[test]
    fn test_selection_errors() {
        let rules = RuleSet::default();
        assert!(compare(&global(Vec::new()), &all_params(), &rules).is_err());
        assert!(compare(
            &global(vec![ProductKind::Etf, ProductKind::Etf]),
            &all_params(),
            &rules
        )
        .is_err());
        assert!(compare(
            &global(vec![ProductKind::Riester]),
            &[EtfParameters::default().into()],
            &rules
        )
        .is_err());
        assert!(compare(
            &global(vec![ProductKind::Etf]),
            &[EtfParameters::default().into(), EtfParameters::default().into()],
            &rules
        )
        .is_err());
    }

    #[test]
    fn test_child_subsidy_note_is_informational() {
        let riester = RiesterParameters {
            children: 2,
            ..RiesterParameters::default()
        };
        let result = compare(
            &global(vec![ProductKind::Etf, ProductKind::Riester]),
            &[EtfParameters::default().into(), riester.into()],
            &RuleSet::default(),
        )
        .unwrap();
        assert!(result.recommendation.notes.contains(&AdvisoryNote::ChildSubsidy {
            children: 2,
            yearly_child_subsidy: dec!(600),
        }));
        assert_eq!(result.recommendation.tag, RecommendationTag::Clear);
    }

    #[test]
    fn test_illiquid_leader_with_flexibility_priority() {
        let mut g = global(vec![ProductKind::Basisrente]);
        g.priorities = vec![SavingsPriority::Flexibility];
        let result = compare(
            &g,
            &[BasisrenteParameters::default().into()],
            &RuleSet::default(),
        )
        .unwrap();
        assert!(result.recommendation.notes.contains(&AdvisoryNote::Illiquidity {
            product: ProductKind::Basisrente
        }));
        assert_eq!(result.recommendation.tag, RecommendationTag::WithCaveats);
    }

    #[test]
    fn test_aligned_table_covers_horizon() {
        let result = compare(
            &global(ProductKind::ALL.to_vec()),
            &all_params(),
            &RuleSet::default(),
        )
        .unwrap();
        assert_eq!(result.trajectories.len(), 20);
        assert!(result.trajectories.iter().all(|y| y.net_values.len() == 4));
    }
}
