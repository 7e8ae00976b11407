use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use vorsorge_core::comparison::{AdvisoryNote, RecommendationTag};
use vorsorge_core::params::{
    BasisrenteParameters, EtfParameters, FilingStatus, RiesterParameters, SavingsPriority,
};
use vorsorge_core::{
    calculate, compare, ComparisonResult, GlobalParameters, ProductKind, ProductParameters,
    RuleSet,
};

// ===========================================================================
// Comparison engine: ranking, alignment and advisory notes
// ===========================================================================

fn global(selected: &[ProductKind], priorities: &[SavingsPriority]) -> GlobalParameters {
    GlobalParameters {
        monthly_contribution: dec!(250),
        initial_investment: dec!(5_000),
        horizon_years: 25,
        accumulation_tax_rate: dec!(0.42),
        retirement_tax_rate: dec!(0.30),
        filing_status: FilingStatus::Single,
        selected_products: selected.to_vec(),
        priorities: priorities.to_vec(),
    }
}

fn defaults() -> Vec<ProductParameters> {
    ProductKind::ALL
        .iter()
        .map(|k| ProductParameters::default_for(*k))
        .collect()
}

#[test]
fn test_comparison_reuses_single_product_outcomes() {
    let g = global(&ProductKind::ALL, &[]);
    let rules = RuleSet::default();
    let result = compare(&g, &defaults(), &rules).unwrap();

    for params in defaults() {
        let single = calculate(&g, &params, &rules).unwrap();
        assert_eq!(result.outcome(params.kind()), Some(&single));
    }
}

#[test]
fn test_shortfall_measured_against_leader() {
    let result = compare(&global(&ProductKind::ALL, &[]), &defaults(), &RuleSet::default())
        .unwrap();
    let leader = result.leader().unwrap().outcome.net_final_value;
    for ranked in &result.ranking {
        assert_eq!(
            ranked.shortfall_to_leader,
            leader - ranked.outcome.net_final_value
        );
        assert!(ranked.shortfall_to_leader >= Decimal::ZERO);
    }
    assert_eq!(result.recommendation.leader_net_value, leader);
}

#[test]
fn test_aligned_table_matches_trajectories() {
    let result = compare(&global(&ProductKind::ALL, &[]), &defaults(), &RuleSet::default())
        .unwrap();
    let etf = result.outcome(ProductKind::Etf).unwrap();
    for (row, snapshot) in result.trajectories.iter().zip(&etf.trajectory) {
        assert_eq!(row.year, snapshot.year);
        assert_eq!(row.net_values[&ProductKind::Etf], snapshot.net_value);
    }
}

#[test]
fn test_priority_caveats_follow_leader_traits() {
    let selected = [ProductKind::Etf];
    let priorities = [
        SavingsPriority::Flexibility,
        SavingsPriority::Guarantee,
        SavingsPriority::Funding,
    ];
    let result = compare(
        &global(&selected, &priorities),
        &[EtfParameters::default().into()],
        &RuleSet::default(),
    )
    .unwrap();

    // The ETF plan is liquid, so only guarantee and funding are flagged.
    assert_eq!(
        result.recommendation.notes,
        vec![
            AdvisoryNote::NoCapitalGuarantee {
                product: ProductKind::Etf
            },
            AdvisoryNote::NoStateFunding {
                product: ProductKind::Etf
            },
        ]
    );
    assert_eq!(result.recommendation.tag, RecommendationTag::WithCaveats);
}

#[test]
fn test_no_priorities_no_caveats() {
    let result = compare(&global(&ProductKind::ALL, &[]), &defaults(), &RuleSet::default())
        .unwrap();
    assert_eq!(result.recommendation.tag, RecommendationTag::Clear);
    assert!(result.recommendation.notes.is_empty());
}

#[test]
fn test_child_note_even_when_riester_trails() {
    let selected = [ProductKind::Etf, ProductKind::Riester];
    let riester = RiesterParameters {
        children: 3,
        ..RiesterParameters::default()
    };
    let result = compare(
        &global(&selected, &[]),
        &[EtfParameters::default().into(), riester.into()],
        &RuleSet::default(),
    )
    .unwrap();
    assert_eq!(result.recommendation.leader, ProductKind::Etf);
    assert!(matches!(
        result.recommendation.notes.as_slice(),
        [AdvisoryNote::ChildSubsidy { children: 3, .. }]
    ));
}

#[test]
fn test_degenerate_product_adds_caveat() {
    let selected = [ProductKind::Etf, ProductKind::Basisrente];
    let costly = BasisrenteParameters {
        gross_return: dec!(0.02),
        effective_cost: dec!(0.03),
        ..BasisrenteParameters::default()
    };
    let result = compare(
        &global(&selected, &[]),
        &[EtfParameters::default().into(), costly.into()],
        &RuleSet::default(),
    )
    .unwrap();
    assert!(result
        .recommendation
        .notes
        .contains(&AdvisoryNote::DegenerateReturn {
            product: ProductKind::Basisrente
        }));
    assert_eq!(result.recommendation.tag, RecommendationTag::WithCaveats);
}

#[test]
fn test_comparison_result_round_trips() {
    let result = compare(&global(&ProductKind::ALL, &[]), &defaults(), &RuleSet::default())
        .unwrap();
    let json = serde_json::to_string(&result).unwrap();
    let back: ComparisonResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}
