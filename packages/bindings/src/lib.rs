use napi::Result as NapiResult;
use napi_derive::napi;

use warehouse_risk_core::config::RunConfig;
use warehouse_risk_core::monte_carlo;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_config(config_json: &str) -> NapiResult<RunConfig> {
    RunConfig::from_json_str(config_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn run_simulation(config_json: String) -> NapiResult<String> {
    let config = parse_config(&config_json)?;
    let output = monte_carlo::run_simulation(&config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn summarize_simulation(config_json: String) -> NapiResult<String> {
    let config = parse_config(&config_json)?;
    let output = monte_carlo::summarize_simulation(&config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Analyses
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_freeze_regimes(config_json: String) -> NapiResult<String> {
    let config = parse_config(&config_json)?;
    let output = monte_carlo::compare_freeze_regimes(&config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn trace_waterfall_path(config_json: String, path_index: u32) -> NapiResult<String> {
    let config = parse_config(&config_json)?;
    let output =
        monte_carlo::trace_waterfall_path(&config, path_index).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
