pub mod freeze;
pub mod simulate;

use clap::{Args, ValueEnum};

use warehouse_risk_core::config::{ModelVariant, RunConfig, StreamMode};

use crate::input;

/// Config source and command-line overrides shared by every subcommand.
#[derive(Args)]
pub struct ConfigArgs {
    /// Path to a YAML or JSON run config (stdin JSON if omitted)
    #[arg(long, short)]
    pub config: Option<String>,

    /// Override the number of paths
    #[arg(long)]
    pub paths: Option<u32>,

    /// Override the horizon in months
    #[arg(long)]
    pub horizon: Option<u32>,

    /// Override the random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the path model
    #[arg(long)]
    pub variant: Option<VariantArg>,

    /// Override how random draws are assigned to paths
    #[arg(long)]
    pub stream_mode: Option<StreamModeArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VariantArg {
    Amortizing,
    RegimeSwitching,
}

impl From<VariantArg> for ModelVariant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::Amortizing => ModelVariant::Amortizing,
            VariantArg::RegimeSwitching => ModelVariant::RegimeSwitching,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StreamModeArg {
    Sequential,
    PerPath,
}

impl From<StreamModeArg> for StreamMode {
    fn from(m: StreamModeArg) -> Self {
        match m {
            StreamModeArg::Sequential => StreamMode::Sequential,
            StreamModeArg::PerPath => StreamMode::PerPath,
        }
    }
}

impl ConfigArgs {
    /// Load the run config and apply overrides. Validation is left to the
    /// engine so errors carry the engine's field paths.
    pub fn load(&self) -> Result<RunConfig, Box<dyn std::error::Error>> {
        let mut config: RunConfig = if let Some(ref path) = self.config {
            input::file::read_config(path)?
        } else if let Some(data) = input::stdin::read_stdin()? {
            RunConfig::from_value(data)?
        } else {
            return Err("--config <file.yaml|file.json> or stdin required".into());
        };

        if let Some(n) = self.paths {
            config.sim.num_paths = n;
        }
        if let Some(h) = self.horizon {
            config.sim.horizon_months = h;
        }
        if let Some(seed) = self.seed {
            config.sim.seed = seed;
        }
        if let Some(variant) = self.variant {
            config.sim.variant = variant.into();
        }
        if let Some(mode) = self.stream_mode {
            config.sim.stream_mode = mode.into();
        }
        Ok(config)
    }
}
