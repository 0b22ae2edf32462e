use chrono::Local;
use clap::Args;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use warehouse_risk_core::config::{ModelVariant, RunConfig};
use warehouse_risk_core::monte_carlo::{
    run_simulation, summarize_simulation, trace_waterfall_path, ResultTable, RunSummary,
};
use warehouse_risk_core::path::{loss_columns, DRIVER_COLUMNS};

use super::ConfigArgs;

/// Arguments for a full simulation run
#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Write mc_results.csv and config_snapshot.json under <DIR>/<timestamp>/
    #[arg(long, value_name = "DIR")]
    pub export: Option<String>,
}

/// Arguments for a summary-only run
#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for a single-path waterfall trace
#[derive(Args)]
pub struct TraceArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Zero-based index of the path to trace
    #[arg(long, default_value_t = 0)]
    pub path_index: u32,
}

pub fn run_run(args: RunArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = args.config.load()?;
    let output = run_simulation(&config)?;

    if let Some(ref dir) = args.export {
        let run_dir = export_run(Path::new(dir), &config, &output.result.table, &output.result.summary)?;
        info!(dir = %run_dir.display(), "exported run artefacts");
        eprintln!("Saved: {}", run_dir.display());
    }

    Ok(serde_json::to_value(output)?)
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = args.config.load()?;
    let output = summarize_simulation(&config)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_trace(args: TraceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut config = args.config.load()?;
    if args.config.variant.is_none() {
        config.sim.variant = ModelVariant::Amortizing;
    }
    let output = trace_waterfall_path(&config, args.path_index)?;
    Ok(serde_json::to_value(output)?)
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Write the result table and a config snapshot into a fresh timestamped
/// directory below `base`. Returns the directory written.
fn export_run(
    base: &Path,
    config: &RunConfig,
    table: &ResultTable,
    summary: &RunSummary,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let run_dir = base.join(Local::now().format("%Y%m%d_%H%M%S").to_string());
    fs::create_dir_all(&run_dir)
        .map_err(|e| format!("Failed to create '{}': {}", run_dir.display(), e))?;

    write_results_csv(&run_dir.join("mc_results.csv"), table)?;

    let snapshot = json!({
        "config": config,
        "results_summary": summary,
    });
    let snapshot_path = run_dir.join("config_snapshot.json");
    fs::write(&snapshot_path, serde_json::to_string_pretty(&snapshot)?)
        .map_err(|e| format!("Failed to write '{}': {}", snapshot_path.display(), e))?;

    Ok(run_dir)
}

fn write_results_csv(path: &Path, table: &ResultTable) -> Result<(), Box<dyn std::error::Error>> {
    let variant = table.variant();
    let mut headers: Vec<&str> = vec!["total_net_income"];
    headers.extend(DRIVER_COLUMNS);
    headers.extend(loss_columns(variant));
    let with_freeze_flag = variant == ModelVariant::RegimeSwitching;
    if with_freeze_flag {
        headers.push("frozen_at_maturity");
    }

    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
    wtr.write_record(&headers)?;

    for p in table {
        let mut row: Vec<String> = headers
            .iter()
            .filter_map(|h| p.column(h).map(|v| v.to_string()))
            .collect();
        if with_freeze_flag {
            let frozen = p.maturity_losses().map(|m| m.frozen_at_maturity).unwrap_or(false);
            row.push(frozen.to_string());
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}
