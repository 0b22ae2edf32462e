//! Seeded Monte Carlo orchestration and aggregation.

pub mod freeze;
pub mod orchestrator;
pub mod statistics;
pub mod streams;
pub mod summary;

pub use freeze::{compare_freeze_regimes, FreezeComparison};
pub use orchestrator::{
    run_simulation, simulate_paths, summarize_simulation, trace_waterfall_path, ResultTable,
    SimulationRun, WaterfallTrace,
};
pub use statistics::{describe, pearson_correlation, DistributionStats, HistogramBin, Percentiles};
pub use summary::{
    summarize, EquityReturnSummary, RunSummary, Sensitivity, TailDecomposition, TailScope,
    TrancheLossSummary,
};
