use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use vorsorge_core::params::{
    BasisrenteParameters, EtfParameters, FilingStatus, PayoutOption, PolicyType,
    PrivatrenteParameters, RiesterParameters,
};
use vorsorge_core::{calculate, GlobalParameters, ProductKind, ProductOutcome, ProductParameters, RuleSet};

// ===========================================================================
// Single-product projections through the public entry point
// ===========================================================================

fn global(monthly: Decimal, initial: Decimal, years: u32) -> GlobalParameters {
    GlobalParameters {
        monthly_contribution: monthly,
        initial_investment: initial,
        horizon_years: years,
        accumulation_tax_rate: dec!(0.42),
        retirement_tax_rate: dec!(0.25),
        filing_status: FilingStatus::Single,
        selected_products: ProductKind::ALL.to_vec(),
        priorities: Vec::new(),
    }
}

fn fee_free_etf(gross_return: Decimal) -> EtfParameters {
    EtfParameters {
        gross_return,
        ter: dec!(0.002),
        spread: dec!(0.001),
        order_fee: Decimal::ZERO,
        custody_fee_yearly: Decimal::ZERO,
        orders_per_year: 12,
        rebalancing_count: 0,
        contribution_dynamics: Decimal::ZERO,
    }
}

fn run(global: &GlobalParameters, params: impl Into<ProductParameters>) -> ProductOutcome {
    calculate(global, &params.into(), &RuleSet::default()).unwrap()
}

// ---------------------------------------------------------------------------
// ETF
// ---------------------------------------------------------------------------

#[test]
fn test_etf_thirty_year_savings_plan() {
    // 500/month, 30 years at 6.7% net:
    // gross = 500 * ((1 + 0.067/12)^360 - 1) / (0.067/12) = 575,078.55
    // tax   = (575,078.55 - 180,000 - 1,000) * 0.26375 = 103,938.22
    let outcome = run(&global(dec!(500), Decimal::ZERO, 30), fee_free_etf(dec!(0.07)));

    assert_eq!(outcome.net_rate, dec!(0.067));
    assert_eq!(outcome.total_contributions, dec!(180_000));
    assert!(
        (outcome.gross_final_value - dec!(575_078.55)).abs() < dec!(1),
        "gross={}",
        outcome.gross_final_value
    );
    assert!(
        (outcome.payout_tax - dec!(103_938.22)).abs() < dec!(1),
        "tax={}",
        outcome.payout_tax
    );
    assert!(
        (outcome.net_final_value - dec!(471_140.33)).abs() < dec!(1),
        "net={}",
        outcome.net_final_value
    );
    assert!(!outcome.degenerate);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_etf_net_value_rises_with_return() {
    let g = global(dec!(300), dec!(2_000), 25);
    let mut last = Decimal::MIN;
    for r in [dec!(0.00), dec!(0.02), dec!(0.04), dec!(0.06), dec!(0.08)] {
        let net = run(&g, fee_free_etf(r)).net_final_value;
        assert!(net >= last, "net value fell at return {r}: {net} < {last}");
        last = net;
    }
}

#[test]
fn test_etf_net_value_falls_with_costs() {
    let g = global(dec!(300), dec!(2_000), 25);
    let base = run(&g, fee_free_etf(dec!(0.07))).net_final_value;

    let higher_ter = EtfParameters {
        ter: dec!(0.01),
        ..fee_free_etf(dec!(0.07))
    };
    let wider_spread = EtfParameters {
        spread: dec!(0.005),
        ..fee_free_etf(dec!(0.07))
    };
    let with_fees = EtfParameters {
        order_fee: dec!(1.5),
        custody_fee_yearly: dec!(20),
        ..fee_free_etf(dec!(0.07))
    };

    assert!(run(&g, higher_ter).net_final_value <= base);
    assert!(run(&g, wider_spread).net_final_value <= base);
    assert!(run(&g, with_fees).net_final_value <= base);
}

#[test]
fn test_gain_within_allowance_is_untaxed() {
    let outcome = run(&global(Decimal::ZERO, dec!(900), 10), fee_free_etf(Decimal::ZERO));
    assert_eq!(outcome.payout_tax, Decimal::ZERO);
}

#[test]
fn test_couple_allowance_lowers_tax() {
    let single = global(dec!(200), Decimal::ZERO, 20);
    let couple = GlobalParameters {
        filing_status: FilingStatus::Couple,
        ..single.clone()
    };
    let a = run(&single, fee_free_etf(dec!(0.07)));
    let b = run(&couple, fee_free_etf(dec!(0.07)));
    // Second 1,000 of allowance at 26.375%
    let saved = a.payout_tax - b.payout_tax;
    assert!((saved - dec!(263.75)).abs() < dec!(0.000001), "saved={saved}");
}

// ---------------------------------------------------------------------------
// Cross-product properties
// ---------------------------------------------------------------------------

#[test]
fn test_nothing_paid_in_yields_nothing() {
    let g = global(Decimal::ZERO, Decimal::ZERO, 15);
    let products: Vec<ProductParameters> = vec![
        EtfParameters::default().into(),
        EtfParameters {
            custody_fee_yearly: dec!(24),
            rebalancing_count: 2,
            ..EtfParameters::default()
        }
        .into(),
        BasisrenteParameters::default().into(),
        RiesterParameters {
            children: 3,
            ..RiesterParameters::default()
        }
        .into(),
        PrivatrenteParameters::default().into(),
    ];
    for params in products {
        let outcome = calculate(&g, &params, &RuleSet::default()).unwrap();
        assert_eq!(outcome.net_final_value, Decimal::ZERO, "{}", outcome.product);
        assert_eq!(outcome.total_benefits, Decimal::ZERO, "{}", outcome.product);
    }
}

#[test]
fn test_out_of_range_input_rejected() {
    let mut g = global(dec!(100), Decimal::ZERO, 10);
    g.accumulation_tax_rate = dec!(-0.1);
    let err = calculate(&g, &BasisrenteParameters::default().into(), &RuleSet::default())
        .unwrap_err();
    assert!(err.to_string().contains("global.accumulation_tax_rate"));

    let g = global(dec!(100), Decimal::ZERO, 10);
    let bad = EtfParameters {
        ter: dec!(1.2),
        ..EtfParameters::default()
    };
    assert!(calculate(&g, &bad.into(), &RuleSet::default()).is_err());
}

#[test]
fn test_overflowing_projection_rejected_on_every_etf_path() {
    let g = global(dec!(100), Decimal::ZERO, 100);
    let extreme = EtfParameters {
        gross_return: dec!(0.9),
        ter: Decimal::ZERO,
        spread: Decimal::ZERO,
        ..EtfParameters::default()
    };
    let variants = [
        extreme.clone(),
        EtfParameters {
            rebalancing_count: 1,
            ..extreme.clone()
        },
        EtfParameters {
            contribution_dynamics: dec!(0.02),
            ..extreme
        },
    ];
    for params in variants {
        let err = calculate(&g, &params.into(), &RuleSet::default()).unwrap_err();
        assert!(err.to_string().contains("horizon_years"), "{err}");
    }
}

// ---------------------------------------------------------------------------
// Contribution dynamics
// ---------------------------------------------------------------------------

#[test]
fn test_rising_contributions_raise_paid_in_and_value() {
    let g = global(dec!(200), dec!(1_000), 20);
    let flat_etf = run(&g, fee_free_etf(dec!(0.06)));
    let rising_etf = run(
        &g,
        EtfParameters {
            contribution_dynamics: dec!(0.03),
            ..fee_free_etf(dec!(0.06))
        },
    );
    assert_eq!(
        rising_etf.total_contributions,
        g.contributions_with_dynamics(20, dec!(0.03)).unwrap()
    );
    assert!(rising_etf.total_contributions > flat_etf.total_contributions);
    assert!(rising_etf.net_final_value > flat_etf.net_final_value);

    let flat_rente = run(&g, BasisrenteParameters::default());
    let rising_rente = run(
        &g,
        BasisrenteParameters {
            contribution_dynamics: dec!(0.03),
            ..BasisrenteParameters::default()
        },
    );
    assert_eq!(
        rising_rente.total_contributions,
        rising_etf.total_contributions
    );
    assert!(rising_rente.total_tax_savings > flat_rente.total_tax_savings);
    assert!(rising_rente.costs.return_drag > flat_rente.costs.return_drag);
}

// ---------------------------------------------------------------------------
// Basisrente
// ---------------------------------------------------------------------------

#[test]
fn test_basisrente_policy_type_irrelevant_without_fee() {
    let g = global(dec!(250), dec!(1_000), 20);
    let gross_policy = BasisrenteParameters {
        effective_cost: dec!(0.012),
        policy_type: PolicyType::Gross,
        ..BasisrenteParameters::default()
    };
    let net_policy = BasisrenteParameters {
        policy_type: PolicyType::Net,
        ..gross_policy.clone()
    };
    assert_eq!(run(&g, gross_policy), run(&g, net_policy));
}

#[test]
fn test_basisrente_benefits_reduce_own_investment() {
    let g = global(dec!(100), Decimal::ZERO, 10);
    let outcome = run(&g, BasisrenteParameters::default());
    assert_eq!(outcome.total_tax_savings, dec!(5_040));
    assert_eq!(outcome.net_own_investment, dec!(6_960));
    assert_eq!(
        outcome.profit,
        outcome.net_final_value - outcome.net_own_investment
    );
}

// ---------------------------------------------------------------------------
// Riester
// ---------------------------------------------------------------------------

#[test]
fn test_riester_children_raise_net_value() {
    let g = GlobalParameters {
        accumulation_tax_rate: dec!(0.25),
        retirement_tax_rate: dec!(0.25),
        ..global(dec!(200), Decimal::ZERO, 30)
    };
    let params = |children| RiesterParameters {
        gross_return: dec!(0.05),
        effective_cost: dec!(0.015),
        children,
        lump_sum_fraction: Decimal::ZERO,
    };
    let without = run(&g, params(0));
    let with_two = run(&g, params(2));
    assert!(with_two.net_final_value > without.net_final_value);
    assert_eq!(with_two.total_state_subsidies, dec!(23_250));
}

#[test]
fn test_riester_ignores_lump_sum_with_warning() {
    let g = global(dec!(100), dec!(10_000), 10);
    let with_lump = run(&g, RiesterParameters::default());
    let without = run(
        &global(dec!(100), Decimal::ZERO, 10),
        RiesterParameters::default(),
    );
    assert_eq!(with_lump.gross_final_value, without.gross_final_value);
    assert_eq!(with_lump.warnings.len(), 1);
}

// ---------------------------------------------------------------------------
// Privatrente
// ---------------------------------------------------------------------------

#[test]
fn test_privatrente_later_start_lowers_tax() {
    let g = global(dec!(200), Decimal::ZERO, 25);
    let early = PrivatrenteParameters {
        payout: PayoutOption::Annuity { retirement_age: 60 },
        ..PrivatrenteParameters::default()
    };
    let late = PrivatrenteParameters {
        payout: PayoutOption::Annuity { retirement_age: 70 },
        ..PrivatrenteParameters::default()
    };
    assert!(run(&g, late).payout_tax < run(&g, early).payout_tax);
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

#[test]
fn test_outcome_survives_json_round_trip() {
    let g = global(dec!(175), dec!(3_000), 12);
    let outcome = run(
        &g,
        EtfParameters {
            rebalancing_count: 2,
            ..EtfParameters::default()
        },
    );
    let json = serde_json::to_string(&outcome).unwrap();
    let back: ProductOutcome = serde_json::from_str(&json).unwrap();
    assert_eq!(back.trajectory, outcome.trajectory);
    assert_eq!(back, outcome);
}
