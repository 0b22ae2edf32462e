use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::config::{ModelVariant, RunConfig, SimConfig, StreamMode};
use crate::error::RiskEngineError;
use crate::monte_carlo::streams;
use crate::monte_carlo::summary::{summarize, RunSummary};
use crate::path::{
    AmortizingSimulator, LayerSnapshot, PathResult, PathSimulator, RegimeSwitchingSimulator,
};
use crate::risk_factors::{RiskFactorSampler, SampledDrivers};
use crate::types::{with_metadata, ComputationOutput};
use crate::RiskEngineResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Ordered path results of one run. Index `i` is path `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    variant: ModelVariant,
    paths: Vec<PathResult>,
}

impl ResultTable {
    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn paths(&self) -> &[PathResult] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathResult> {
        self.paths.iter()
    }

    pub fn net_incomes(&self) -> Vec<f64> {
        self.paths.iter().map(|p| p.total_net_income).collect()
    }

    /// Values of a named column, in path order. `None` if the column does
    /// not exist for this variant.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        self.paths.iter().map(|p| p.column(name)).collect()
    }

    pub fn into_paths(self) -> Vec<PathResult> {
        self.paths
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a PathResult;
    type IntoIter = std::slice::Iter<'a, PathResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Result table plus its aggregate summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRun {
    pub table: ResultTable,
    pub summary: RunSummary,
}

/// Month-by-month funding stack of one amortizing path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterfallTrace {
    pub path_index: u32,
    pub result: PathResult,
    pub months: Vec<LayerSnapshot>,
}

// ---------------------------------------------------------------------------
// Path loop
// ---------------------------------------------------------------------------

fn simulate_one<S: PathSimulator, R: Rng>(
    sampler: &RiskFactorSampler,
    simulator: &S,
    rng: &mut R,
) -> PathResult {
    let drivers = sampler.sample(rng);
    simulator.simulate(&drivers, rng)
}

#[cfg(feature = "parallel")]
fn run_per_path<S: PathSimulator + Sync>(
    sampler: &RiskFactorSampler,
    simulator: &S,
    sim: &SimConfig,
) -> Vec<PathResult> {
    use rayon::prelude::*;

    // Indexed parallel collect keeps path order.
    (0..sim.num_paths as u64)
        .into_par_iter()
        .map(|i| simulate_one(sampler, simulator, &mut streams::path_rng(sim.seed, i)))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn run_per_path<S: PathSimulator + Sync>(
    sampler: &RiskFactorSampler,
    simulator: &S,
    sim: &SimConfig,
) -> Vec<PathResult> {
    (0..sim.num_paths as u64)
        .map(|i| simulate_one(sampler, simulator, &mut streams::path_rng(sim.seed, i)))
        .collect()
}

fn run_paths<S: PathSimulator + Sync>(
    sampler: &RiskFactorSampler,
    simulator: &S,
    sim: &SimConfig,
) -> Vec<PathResult> {
    match sim.stream_mode {
        StreamMode::Sequential => {
            let mut rng = streams::run_rng(sim.seed);
            (0..sim.num_paths)
                .map(|_| simulate_one(sampler, simulator, &mut rng))
                .collect()
        }
        StreamMode::PerPath => run_per_path(sampler, simulator, sim),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run `sim.num_paths` paths and return them in path order.
///
/// The configuration is validated before any path is simulated; on error no
/// path is run. With [`StreamMode::Sequential`] one generator seeded from
/// `sim.seed` is threaded through every (sampler, simulator) call, so a run
/// with N paths is a prefix of the same run with more paths.
pub fn simulate_paths(config: &RunConfig) -> RiskEngineResult<ResultTable> {
    config.validate()?;
    let sim = &config.sim;
    let sampler = RiskFactorSampler::new(&config.risk_engine)?;

    let start = Instant::now();
    info!(
        variant = sim.variant.as_str(),
        stream_mode = sim.stream_mode.as_str(),
        num_paths = sim.num_paths,
        horizon_months = sim.horizon_months,
        seed = sim.seed,
        "starting Monte Carlo run"
    );

    let paths = match sim.variant {
        ModelVariant::Amortizing => {
            let simulator = AmortizingSimulator::new(config)?;
            run_paths(&sampler, &simulator, sim)
        }
        ModelVariant::RegimeSwitching => {
            let simulator = RegimeSwitchingSimulator::new(config)?;
            run_paths(&sampler, &simulator, sim)
        }
    };

    info!(
        num_paths = paths.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Monte Carlo run complete"
    );

    Ok(ResultTable {
        variant: sim.variant,
        paths,
    })
}

/// Run the simulation and aggregate it.
///
/// Returns the full result table and summary KPIs (expected net income,
/// 5th percentile, probability of loss, equity returns, sensitivities and
/// the variant-specific loss breakdowns).
pub fn run_simulation(config: &RunConfig) -> RiskEngineResult<ComputationOutput<SimulationRun>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let table = simulate_paths(config)?;
    let equity_capital = config.equity_capital();
    if equity_capital.is_none() {
        warnings.push("funding_ratio leaves no equity capital; equity returns omitted".into());
    }
    let summary = summarize(&table, equity_capital)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology(config.sim.variant),
        &assumptions(config),
        warnings,
        elapsed,
        SimulationRun { table, summary },
    ))
}

/// Run the simulation and return only the aggregate summary.
pub fn summarize_simulation(config: &RunConfig) -> RiskEngineResult<ComputationOutput<RunSummary>> {
    let run = run_simulation(config)?;
    Ok(ComputationOutput {
        result: run.result.summary,
        methodology: run.methodology,
        assumptions: run.assumptions,
        warnings: run.warnings,
        metadata: run.metadata,
    })
}

/// Replay one amortizing path and return its monthly funding stack.
///
/// Amortizing paths consume exactly four normals each, so in sequential mode
/// path `i` is reached by replaying the sampler `i` times.
pub fn trace_waterfall_path(
    config: &RunConfig,
    path_index: u32,
) -> RiskEngineResult<ComputationOutput<WaterfallTrace>> {
    let start = Instant::now();
    config.validate()?;
    if config.sim.variant != ModelVariant::Amortizing {
        return Err(RiskEngineError::InvalidInput {
            field: "sim.variant".into(),
            reason: "Layer trace requires the amortizing variant".into(),
        });
    }
    if path_index >= config.sim.num_paths {
        return Err(RiskEngineError::InvalidInput {
            field: "path_index".into(),
            reason: format!(
                "Must be below num_paths ({}), got {path_index}",
                config.sim.num_paths
            ),
        });
    }

    let sampler = RiskFactorSampler::new(&config.risk_engine)?;
    let simulator = AmortizingSimulator::new(config)?;

    let drivers: SampledDrivers = match config.sim.stream_mode {
        StreamMode::Sequential => {
            let mut rng = streams::run_rng(config.sim.seed);
            let mut drivers = sampler.sample(&mut rng);
            for _ in 0..path_index {
                drivers = sampler.sample(&mut rng);
            }
            drivers
        }
        StreamMode::PerPath => {
            sampler.sample(&mut streams::path_rng(config.sim.seed, path_index as u64))
        }
    };
    debug!(path_index, "tracing waterfall path");

    let (result, months) = simulator.simulate_traced(&drivers);
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Amortizing Waterfall Layer Trace",
        &assumptions(config),
        Vec::new(),
        elapsed,
        WaterfallTrace {
            path_index,
            result,
            months,
        },
    ))
}

pub(crate) fn methodology(variant: ModelVariant) -> &'static str {
    match variant {
        ModelVariant::Amortizing => "Monte Carlo Amortizing Tranche Waterfall",
        ModelVariant::RegimeSwitching => "Monte Carlo Bullet Maturity with Funding Freeze Regime",
    }
}

pub(crate) fn assumptions(config: &RunConfig) -> serde_json::Value {
    serde_json::json!({
        "variant": config.sim.variant,
        "stream_mode": config.sim.stream_mode,
        "num_paths": config.sim.num_paths,
        "horizon_months": config.sim.horizon_months,
        "seed": config.sim.seed,
        "notional": config.portfolio.notional,
        "annual_coupon_rate": config.portfolio.annual_coupon_rate,
        "funding_ratio": config.funding.funding_ratio,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
