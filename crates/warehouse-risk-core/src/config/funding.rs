use serde::{Deserialize, Serialize};

use crate::error::RiskEngineError;
use crate::types::Rate;
use crate::RiskEngineResult;

/// Capacity and cost of one funding layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrancheFunding {
    /// Maximum balance as a fraction of portfolio notional.
    pub limit_fraction_of_notional: f64,
    /// Annual funding rate (decimal).
    pub funding_rate_annual: Rate,
}

impl TrancheFunding {
    const fn new(limit_fraction_of_notional: f64, funding_rate_annual: Rate) -> Self {
        Self {
            limit_fraction_of_notional,
            funding_rate_annual,
        }
    }

    fn validate(&self, path: &str) -> RiskEngineResult<()> {
        if !self.limit_fraction_of_notional.is_finite()
            || !(0.0..=1.0).contains(&self.limit_fraction_of_notional)
        {
            return Err(RiskEngineError::invalid(
                format!("{path}.limit_fraction_of_notional"),
                format!(
                    "Must be in [0, 1], got {}",
                    self.limit_fraction_of_notional
                ),
            ));
        }
        if !self.funding_rate_annual.is_finite() {
            return Err(RiskEngineError::invalid(
                format!("{path}.funding_rate_annual"),
                "Must be a finite number",
            ));
        }
        Ok(())
    }
}

fn default_tranche_a() -> TrancheFunding {
    TrancheFunding::new(0.6, 0.05)
}

fn default_tranche_b() -> TrancheFunding {
    TrancheFunding::new(0.2, 0.07)
}

fn default_tranche_c() -> TrancheFunding {
    TrancheFunding::new(0.1, 0.10)
}

fn default_warehouse() -> TrancheFunding {
    TrancheFunding::new(0.1, 0.08)
}

/// Funding stack for the amortizing waterfall. Draw order is fixed:
/// A, then B, then C; the warehouse line carries whatever is left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterfallFunding {
    #[serde(default = "default_tranche_a")]
    pub tranche_a: TrancheFunding,
    #[serde(default = "default_tranche_b")]
    pub tranche_b: TrancheFunding,
    #[serde(default = "default_tranche_c")]
    pub tranche_c: TrancheFunding,
    /// The warehouse line absorbs the residual regardless of its limit.
    #[serde(default = "default_warehouse")]
    pub warehouse: TrancheFunding,
}

impl Default for WaterfallFunding {
    fn default() -> Self {
        Self {
            tranche_a: default_tranche_a(),
            tranche_b: default_tranche_b(),
            tranche_c: default_tranche_c(),
            warehouse: default_warehouse(),
        }
    }
}

impl WaterfallFunding {
    pub fn validate(&self) -> RiskEngineResult<()> {
        self.tranche_a.validate("funding.waterfall.tranche_a")?;
        self.tranche_b.validate("funding.waterfall.tranche_b")?;
        self.tranche_c.validate("funding.waterfall.tranche_c")?;
        self.warehouse.validate("funding.waterfall.warehouse")?;
        Ok(())
    }
}

fn default_p_freeze_start() -> f64 {
    0.06
}

fn default_p_freeze_persist() -> f64 {
    0.70
}

fn default_refinance_fail_prob() -> f64 {
    0.50
}

fn default_refinance_fail_sensitivity() -> f64 {
    0.35
}

fn default_haircut_base() -> f64 {
    0.30
}

fn default_haircut_sensitivity() -> f64 {
    0.25
}

fn default_haircut_noise() -> f64 {
    0.10
}

fn default_haircut_min() -> f64 {
    0.10
}

fn default_haircut_max() -> f64 {
    0.70
}

/// Freeze regime and refinance-cliff parameters for the bullet variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeFunding {
    /// P(unfrozen -> frozen) per month.
    #[serde(default = "default_p_freeze_start")]
    pub p_freeze_start: f64,
    /// P(frozen -> frozen) per month.
    #[serde(default = "default_p_freeze_persist")]
    pub p_freeze_persist: f64,
    /// Refinance failure probability at maturity with no systemic stress.
    #[serde(default = "default_refinance_fail_prob")]
    pub refinance_fail_prob: f64,
    /// Added failure probability per unit of adverse systemic draw.
    #[serde(
        default = "default_refinance_fail_sensitivity",
        alias = "refinance_fail_sens"
    )]
    pub refinance_fail_sensitivity: f64,
    #[serde(default = "default_haircut_base", alias = "forced_sale_haircut")]
    pub forced_sale_haircut_base: f64,
    #[serde(default = "default_haircut_sensitivity", alias = "haircut_sens")]
    pub forced_sale_haircut_sensitivity: f64,
    #[serde(default = "default_haircut_noise", alias = "haircut_noise")]
    pub forced_sale_haircut_noise: f64,
    #[serde(default = "default_haircut_min", alias = "haircut_min")]
    pub forced_sale_haircut_min: f64,
    #[serde(default = "default_haircut_max", alias = "haircut_max")]
    pub forced_sale_haircut_max: f64,
}

impl Default for RegimeFunding {
    fn default() -> Self {
        Self {
            p_freeze_start: default_p_freeze_start(),
            p_freeze_persist: default_p_freeze_persist(),
            refinance_fail_prob: default_refinance_fail_prob(),
            refinance_fail_sensitivity: default_refinance_fail_sensitivity(),
            forced_sale_haircut_base: default_haircut_base(),
            forced_sale_haircut_sensitivity: default_haircut_sensitivity(),
            forced_sale_haircut_noise: default_haircut_noise(),
            forced_sale_haircut_min: default_haircut_min(),
            forced_sale_haircut_max: default_haircut_max(),
        }
    }
}

impl RegimeFunding {
    /// Same parameters with the freeze chain switched off: the regime can
    /// neither start nor persist.
    pub fn with_freeze_disabled(&self) -> Self {
        Self {
            p_freeze_start: 0.0,
            p_freeze_persist: 0.0,
            ..*self
        }
    }

    pub fn validate(&self) -> RiskEngineResult<()> {
        let probabilities = [
            ("p_freeze_start", self.p_freeze_start),
            ("p_freeze_persist", self.p_freeze_persist),
            ("refinance_fail_prob", self.refinance_fail_prob),
        ];
        for (name, p) in probabilities {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(RiskEngineError::invalid(
                    format!("funding.regime.{name}"),
                    format!("Probability must be in [0, 1], got {p}"),
                ));
            }
        }
        let finite = [
            ("refinance_fail_sensitivity", self.refinance_fail_sensitivity),
            ("forced_sale_haircut_base", self.forced_sale_haircut_base),
            (
                "forced_sale_haircut_sensitivity",
                self.forced_sale_haircut_sensitivity,
            ),
            ("forced_sale_haircut_noise", self.forced_sale_haircut_noise),
            ("forced_sale_haircut_min", self.forced_sale_haircut_min),
            ("forced_sale_haircut_max", self.forced_sale_haircut_max),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(RiskEngineError::invalid(
                    format!("funding.regime.{name}"),
                    "Must be a finite number",
                ));
            }
        }
        if self.forced_sale_haircut_noise < 0.0 {
            return Err(RiskEngineError::invalid(
                "funding.regime.forced_sale_haircut_noise",
                "Must be non-negative",
            ));
        }
        if self.forced_sale_haircut_min > self.forced_sale_haircut_max {
            return Err(RiskEngineError::invalid(
                "funding.regime.forced_sale_haircut_min",
                format!(
                    "haircut_min ({}) must not exceed haircut_max ({})",
                    self.forced_sale_haircut_min, self.forced_sale_haircut_max
                ),
            ));
        }
        Ok(())
    }
}

fn default_funding_ratio() -> f64 {
    0.8
}

/// Funding section of the run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundingConfig {
    #[serde(default)]
    pub waterfall: WaterfallFunding,
    #[serde(default)]
    pub regime: RegimeFunding,
    /// Debt-funded share of notional; the rest is equity capital.
    #[serde(default = "default_funding_ratio")]
    pub funding_ratio: f64,
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            waterfall: WaterfallFunding::default(),
            regime: RegimeFunding::default(),
            funding_ratio: default_funding_ratio(),
        }
    }
}

impl FundingConfig {
    pub fn validate(&self) -> RiskEngineResult<()> {
        self.waterfall.validate()?;
        self.regime.validate()?;
        if !self.funding_ratio.is_finite() || !(0.0..=1.0).contains(&self.funding_ratio) {
            return Err(RiskEngineError::invalid(
                "funding.funding_ratio",
                format!("Must be in [0, 1], got {}", self.funding_ratio),
            ));
        }
        Ok(())
    }
}
