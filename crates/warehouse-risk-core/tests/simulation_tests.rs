use pretty_assertions::assert_eq;
use serde_json::json;
use warehouse_risk_core::config::{ModelVariant, RunConfig, StreamMode};
use warehouse_risk_core::monte_carlo::{
    compare_freeze_regimes, run_simulation, simulate_paths, summarize_simulation,
    trace_waterfall_path,
};
use warehouse_risk_core::RiskEngineError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SEED: u64 = 42;

fn config_json(variant: &str, num_paths: u32, horizon_months: u32) -> serde_json::Value {
    json!({
        "risk_engine": {
            "default_rate": {
                "base": 0.03, "shock_coef": 0.02, "rho": 0.30,
                "clip_min": 0.0, "clip_max": 0.15
            },
            "lgd": {
                "base": 0.45, "shock_coef": 0.10, "rho": 0.20,
                "clip_min": 0.10, "clip_max": 0.90
            },
            "margin_shock": {
                "shock_coef": 0.01, "rho": 0.25,
                "clip_min": -0.03, "clip_max": 0.03
            }
        },
        "portfolio": { "notional": 100_000_000.0, "annual_coupon_rate": 0.09 },
        "sim": {
            "N": num_paths,
            "H": horizon_months,
            "seed": SEED,
            "variant": variant
        }
    })
}

fn config(variant: &str, num_paths: u32, horizon_months: u32) -> RunConfig {
    RunConfig::from_value(config_json(variant, num_paths, horizon_months)).unwrap()
}

// ---------------------------------------------------------------------------
// Reference scenario
// ---------------------------------------------------------------------------

#[test]
fn test_reference_scenario_kpis() {
    let cfg = config("regime_switching", 10_000, 60);
    let summary = summarize_simulation(&cfg).unwrap().result;

    assert_eq!(summary.num_paths, 10_000);
    assert!(
        summary.p5_total_net_income < summary.expected_total_net_income,
        "p5 {} should sit below the mean {}",
        summary.p5_total_net_income,
        summary.expected_total_net_income
    );
    assert!((0.0..=1.0).contains(&summary.probability_of_loss));
}

#[test]
fn test_reference_scenario_amortizing() {
    let cfg = config("amortizing", 2_000, 60);
    let summary = summarize_simulation(&cfg).unwrap().result;
    assert!(summary.p5_total_net_income < summary.expected_total_net_income);
    assert!((0.0..=1.0).contains(&summary.probability_of_loss));
    assert_eq!(summary.tranche_losses.len(), 4);
}

#[test]
fn test_defaults_fill_funding_section() {
    let cfg = config("regime_switching", 10, 12);
    assert_eq!(cfg.funding.funding_ratio, 0.8);
    assert_eq!(cfg.funding.regime.p_freeze_start, 0.06);
    assert_eq!(cfg.funding.waterfall.tranche_a.limit_fraction_of_notional, 0.60);
    assert_eq!(cfg.sim.stream_mode, StreamMode::Sequential);
    assert_eq!(cfg.equity_capital(), Some(100_000_000.0 * (1.0 - 0.8)));
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[test]
fn test_same_seed_same_table() {
    for variant in ["amortizing", "regime_switching"] {
        let cfg = config(variant, 500, 36);
        assert_eq!(simulate_paths(&cfg).unwrap(), simulate_paths(&cfg).unwrap());
    }
}

#[test]
fn test_same_seed_same_summary() {
    let cfg = config("regime_switching", 1_000, 60);
    let a = run_simulation(&cfg).unwrap().result.summary;
    let b = run_simulation(&cfg).unwrap().result.summary;
    assert_eq!(a, b);
}

#[test]
fn test_per_path_stream_deterministic() {
    let mut cfg = config("regime_switching", 400, 24);
    cfg.sim.stream_mode = StreamMode::PerPath;
    assert_eq!(simulate_paths(&cfg).unwrap(), simulate_paths(&cfg).unwrap());
}

// ---------------------------------------------------------------------------
// Table invariants
// ---------------------------------------------------------------------------

#[test]
fn test_drivers_within_clip_bounds() {
    for variant in ["amortizing", "regime_switching"] {
        let table = simulate_paths(&config(variant, 3_000, 12)).unwrap();
        for p in &table {
            let d = &p.drivers;
            assert!((0.0..=0.15).contains(&d.default_rate), "{}", d.default_rate);
            assert!((0.10..=0.90).contains(&d.lgd), "{}", d.lgd);
            assert!((-0.03..=0.03).contains(&d.margin_shock), "{}", d.margin_shock);
        }
    }
}

#[test]
fn test_liquidity_loss_requires_freeze_at_maturity() {
    let table = simulate_paths(&config("regime_switching", 5_000, 60)).unwrap();
    let mut frozen = 0;
    for p in &table {
        let m = p.maturity_losses().unwrap();
        assert!(m.credit_loss >= 0.0);
        assert!(m.liquidity_loss >= 0.0);
        if m.liquidity_loss > 0.0 {
            assert!(m.frozen_at_maturity);
        }
        if m.frozen_at_maturity {
            frozen += 1;
        }
    }
    // Stationary freeze probability is 0.06 / (0.06 + 0.30), about 17%.
    let share = frozen as f64 / table.len() as f64;
    assert!(share > 0.10 && share < 0.25, "frozen share {share}");
}

#[test]
fn test_tranche_losses_sum_to_allocated_loss() {
    let table = simulate_paths(&config("amortizing", 1_000, 60)).unwrap();
    for p in &table {
        let t = p.tranche_losses().unwrap();
        for loss in [t.a_loss, t.b_loss, t.c_loss, t.wh_loss] {
            assert!(loss >= 0.0);
        }
        let loss = 100_000_000.0 * (p.drivers.default_rate * 5.0).min(1.0) * p.drivers.lgd;
        assert!(t.total() <= loss + 1e-6);
    }
}

#[test]
fn test_single_path_single_month() {
    for variant in ["amortizing", "regime_switching"] {
        let out = run_simulation(&config(variant, 1, 1)).unwrap();
        assert_eq!(out.result.table.len(), 1);
        let s = &out.result.summary;
        assert_eq!(s.p5_total_net_income, s.expected_total_net_income);
    }
}

// ---------------------------------------------------------------------------
// Supplementary analyses
// ---------------------------------------------------------------------------

#[test]
fn test_freeze_comparison_end_to_end() {
    let cfg = config("regime_switching", 2_000, 60);
    let out = compare_freeze_regimes(&cfg).unwrap();
    assert!(out.result.delta_expected_total_net_income < 0.0);
    assert_eq!(out.metadata.precision, "ieee754_f64");
}

#[test]
fn test_layer_trace_reconstructs_path() {
    let cfg = config("amortizing", 30, 24);
    let table = simulate_paths(&cfg).unwrap();
    let trace = trace_waterfall_path(&cfg, 29).unwrap().result;
    assert_eq!(trace.result, table.paths()[29]);
    assert_eq!(trace.months.len(), 24);
    // Month 0 is bridge-funded entirely by the warehouse.
    assert_eq!(trace.months[0].warehouse_balance, 100_000_000.0);
    assert_eq!(trace.months[0].a_balance, 0.0);
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[test]
fn test_missing_section_reported() {
    let mut value = config_json("amortizing", 10, 12);
    value.as_object_mut().unwrap().remove("portfolio");
    assert!(matches!(
        RunConfig::from_value(value),
        Err(RiskEngineError::MissingParameter(_))
    ));
}

#[test]
fn test_missing_driver_base_stops_run() {
    let mut value = config_json("regime_switching", 10, 12);
    value["risk_engine"]["default_rate"]
        .as_object_mut()
        .unwrap()
        .remove("base");
    let cfg = RunConfig::from_value(value).unwrap();
    match simulate_paths(&cfg) {
        Err(RiskEngineError::MissingParameter(name)) => {
            assert_eq!(name, "risk_engine.default_rate.base")
        }
        other => panic!("expected MissingParameter, got {other:?}"),
    }
    assert!(run_simulation(&cfg).is_err());
}

#[test]
fn test_invalid_values_rejected_before_run() {
    let mut zero_paths = config("amortizing", 10, 12);
    zero_paths.sim.num_paths = 0;
    assert!(simulate_paths(&zero_paths).is_err());

    let mut bad_rho = config("regime_switching", 10, 12);
    bad_rho.risk_engine.lgd.correlation_to_systemic = 1.5;
    match simulate_paths(&bad_rho) {
        Err(RiskEngineError::InvalidInput { field, .. }) => {
            assert_eq!(field, "risk_engine.lgd.correlation_to_systemic")
        }
        other => panic!("expected InvalidInput, got {other:?}"),
    }

    let variant = config("regime_switching", 10, 12).sim.variant;
    assert_eq!(variant, ModelVariant::RegimeSwitching);
}
