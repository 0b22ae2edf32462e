//! Run configuration.
//!
//! `risk_engine`, `portfolio` and `sim` are required sections; `funding`
//! falls back to the house defaults. [`RunConfig::validate`] must pass
//! before any path is simulated.

pub mod funding;
pub mod risk_engine;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RiskEngineError;
use crate::types::{Money, Rate};
use crate::RiskEngineResult;

pub use funding::{FundingConfig, RegimeFunding, TrancheFunding, WaterfallFunding};
pub use risk_engine::{DriverParams, RiskEngineConfig};

/// Collateral pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    pub notional: Money,
    /// Annual coupon on the collateral (decimal), before the margin shock.
    pub annual_coupon_rate: Rate,
}

impl PortfolioConfig {
    pub fn validate(&self) -> RiskEngineResult<()> {
        if !self.notional.is_finite() || self.notional <= 0.0 {
            return Err(RiskEngineError::invalid(
                "portfolio.notional",
                format!("Must be positive, got {}", self.notional),
            ));
        }
        if !self.annual_coupon_rate.is_finite() {
            return Err(RiskEngineError::invalid(
                "portfolio.annual_coupon_rate",
                "Must be a finite number",
            ));
        }
        Ok(())
    }
}

/// Which path simulator a run uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// Amortizing multi-tranche funding waterfall.
    Amortizing,
    /// Bullet maturity with a Markov funding freeze and refinance cliff.
    #[default]
    RegimeSwitching,
}

impl ModelVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Amortizing => "amortizing",
            ModelVariant::RegimeSwitching => "regime_switching",
        }
    }
}

/// How random draws are assigned to paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamMode {
    /// One generator seeded from `seed`, consumed path after path.
    #[default]
    Sequential,
    /// Path `i` owns a generator seeded from `(seed, i)`.
    PerPath,
}

impl StreamMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamMode::Sequential => "sequential",
            StreamMode::PerPath => "per_path",
        }
    }
}

/// Simulation controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of paths (N).
    #[serde(alias = "N")]
    pub num_paths: u32,
    /// Horizon in months (H).
    #[serde(alias = "H")]
    pub horizon_months: u32,
    pub seed: u64,
    #[serde(default)]
    pub variant: ModelVariant,
    #[serde(default)]
    pub stream_mode: StreamMode,
}

impl SimConfig {
    pub fn validate(&self) -> RiskEngineResult<()> {
        if self.num_paths < 1 {
            return Err(RiskEngineError::invalid(
                "sim.num_paths",
                "Must be at least 1",
            ));
        }
        if self.horizon_months < 1 {
            return Err(RiskEngineError::invalid(
                "sim.horizon_months",
                "Must be at least 1",
            ));
        }
        Ok(())
    }

    /// Horizon in years (H / 12).
    pub fn term_years(&self) -> f64 {
        self.horizon_months as f64 / 12.0
    }
}

/// Full configuration bundle for one Monte Carlo run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub risk_engine: RiskEngineConfig,
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub funding: FundingConfig,
    pub sim: SimConfig,
}

impl RunConfig {
    /// Deserialise from a JSON document. Missing required keys surface as
    /// [`RiskEngineError::MissingParameter`].
    pub fn from_json_str(json: &str) -> RiskEngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> RiskEngineResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Check every invariant of every section.
    pub fn validate(&self) -> RiskEngineResult<()> {
        self.risk_engine.validate()?;
        self.portfolio.validate()?;
        self.funding.validate()?;
        self.sim.validate()?;
        debug!(
            variant = self.sim.variant.as_str(),
            num_paths = self.sim.num_paths,
            horizon_months = self.sim.horizon_months,
            "configuration validated"
        );
        Ok(())
    }

    /// Equity capital backing the portfolio: `notional * (1 - funding_ratio)`.
    /// `None` when the funding ratio leaves no equity.
    pub fn equity_capital(&self) -> Option<Money> {
        let equity = self.portfolio.notional * (1.0 - self.funding.funding_ratio);
        (equity > 0.0).then_some(equity)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::base_config;
    use super::*;

    #[test]
    fn test_base_config_is_valid() {
        base_config(ModelVariant::Amortizing).validate().unwrap();
        base_config(ModelVariant::RegimeSwitching).validate().unwrap();
    }

    #[test]
    fn test_zero_notional_rejected() {
        let mut cfg = base_config(ModelVariant::Amortizing);
        cfg.portfolio.notional = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_paths_rejected() {
        let mut cfg = base_config(ModelVariant::Amortizing);
        cfg.sim.num_paths = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let mut cfg = base_config(ModelVariant::RegimeSwitching);
        cfg.sim.horizon_months = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_missing_section_is_missing_parameter() {
        let json = r#"{
            "portfolio": {"notional": 1000000.0, "annual_coupon_rate": 0.08},
            "sim": {"N": 10, "H": 12, "seed": 1}
        }"#;
        let err = RunConfig::from_json_str(json).unwrap_err();
        assert!(
            matches!(err, RiskEngineError::MissingParameter(ref m) if m.contains("risk_engine")),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_default_rate_without_base_rejected() {
        let mut value = serde_json::to_value(base_config(ModelVariant::RegimeSwitching)).unwrap();
        value["risk_engine"]["default_rate"]
            .as_object_mut()
            .unwrap()
            .remove("base");
        let cfg = RunConfig::from_value(value).unwrap();
        assert_eq!(cfg.risk_engine.default_rate.base, None);
        match cfg.validate() {
            Err(RiskEngineError::MissingParameter(name)) => {
                assert_eq!(name, "risk_engine.default_rate.base")
            }
            other => panic!("expected MissingParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_short_sim_keys_and_defaults() {
        let json = r#"{
            "risk_engine": {
                "default_rate": {"base": 0.03, "shock_coef": 0.02, "rho": 0.3, "clip_min": 0.0, "clip_max": 0.15},
                "lgd": {"base": 0.45, "shock_coef": 0.1, "rho": 0.2, "clip_min": 0.1, "clip_max": 0.9},
                "margin_shock": {"shock_coef": 0.01, "rho": 0.25, "clip_min": -0.03, "clip_max": 0.03}
            },
            "portfolio": {"notional": 1000000.0, "annual_coupon_rate": 0.08},
            "sim": {"N": 10, "H": 12, "seed": 7}
        }"#;
        let cfg = RunConfig::from_json_str(json).unwrap();
        assert_eq!(cfg.sim.num_paths, 10);
        assert_eq!(cfg.sim.horizon_months, 12);
        assert_eq!(cfg.sim.variant, ModelVariant::RegimeSwitching);
        assert_eq!(cfg.sim.stream_mode, StreamMode::Sequential);
        assert_eq!(cfg.funding, FundingConfig::default());
        cfg.validate().unwrap();
    }

    #[test]
    fn test_equity_capital() {
        let mut cfg = base_config(ModelVariant::RegimeSwitching);
        let eq = cfg.equity_capital().unwrap();
        assert!((eq - 20_000_000.0).abs() < 1e-6);
        cfg.funding.funding_ratio = 1.0;
        assert!(cfg.equity_capital().is_none());
    }
}
