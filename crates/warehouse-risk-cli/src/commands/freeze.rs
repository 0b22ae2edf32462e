use clap::Args;
use serde_json::Value;

use warehouse_risk_core::monte_carlo::compare_freeze_regimes;

use super::ConfigArgs;

/// Arguments for the freeze on/off comparison
#[derive(Args)]
pub struct CompareFreezeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run_compare_freeze(args: CompareFreezeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = args.config.load()?;
    let result = compare_freeze_regimes(&config)?;
    Ok(serde_json::to_value(result)?)
}
