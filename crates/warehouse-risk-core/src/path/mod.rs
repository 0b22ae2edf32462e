//! Per-path cash-flow simulators.
//!
//! Both variants consume the same [`SampledDrivers`] contract and return one
//! immutable [`PathResult`]. They differ in what else they draw from the
//! random source:
//! - [`AmortizingSimulator`] draws nothing beyond the sampler's four normals.
//! - [`RegimeSwitchingSimulator`] draws one uniform per month for the freeze
//!   chain, one uniform for the terminal default and, when frozen at
//!   maturity, one normal (haircut noise) and one uniform (refinance failure).

pub mod amortizing;
pub mod regime;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ModelVariant;
use crate::risk_factors::SampledDrivers;
use crate::types::Money;

pub use amortizing::{AmortizingSimulator, LayerSnapshot};
pub use regime::{term_default_probability, RegimeSwitchingSimulator};

/// A cash-flow model that turns one set of sampled drivers into one outcome.
pub trait PathSimulator {
    fn variant(&self) -> ModelVariant;

    fn simulate<R: Rng>(&self, drivers: &SampledDrivers, rng: &mut R) -> PathResult;
}

/// Loss allocated to each funding layer by the amortizing waterfall.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrancheLosses {
    #[serde(rename = "A_loss")]
    pub a_loss: Money,
    #[serde(rename = "B_loss")]
    pub b_loss: Money,
    #[serde(rename = "C_loss")]
    pub c_loss: Money,
    #[serde(rename = "WH_loss")]
    pub wh_loss: Money,
}

impl TrancheLosses {
    pub fn total(&self) -> Money {
        self.a_loss + self.b_loss + self.c_loss + self.wh_loss
    }
}

/// Terminal losses of the bullet / freeze variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaturityLosses {
    pub credit_loss: Money,
    pub liquidity_loss: Money,
    /// Freeze state in the final month.
    pub frozen_at_maturity: bool,
}

/// Variant-specific loss fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathLosses {
    Tranche(TrancheLosses),
    Maturity(MaturityLosses),
}

/// Outcome of one simulated path. Serialises as a flat record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    pub total_net_income: Money,
    #[serde(flatten)]
    pub drivers: SampledDrivers,
    #[serde(flatten)]
    pub losses: PathLosses,
}

impl PathResult {
    pub fn tranche_losses(&self) -> Option<&TrancheLosses> {
        match &self.losses {
            PathLosses::Tranche(t) => Some(t),
            PathLosses::Maturity(_) => None,
        }
    }

    pub fn maturity_losses(&self) -> Option<&MaturityLosses> {
        match &self.losses {
            PathLosses::Maturity(m) => Some(m),
            PathLosses::Tranche(_) => None,
        }
    }

    /// Look up a numeric column by its exported name.
    pub fn column(&self, name: &str) -> Option<f64> {
        let d = &self.drivers;
        match (name, &self.losses) {
            ("total_net_income", _) => Some(self.total_net_income),
            ("systemic_factor", _) => Some(d.systemic_factor),
            ("default_rate", _) => Some(d.default_rate),
            ("lgd", _) => Some(d.lgd),
            ("margin_shock", _) => Some(d.margin_shock),
            ("A_loss", PathLosses::Tranche(t)) => Some(t.a_loss),
            ("B_loss", PathLosses::Tranche(t)) => Some(t.b_loss),
            ("C_loss", PathLosses::Tranche(t)) => Some(t.c_loss),
            ("WH_loss", PathLosses::Tranche(t)) => Some(t.wh_loss),
            ("credit_loss", PathLosses::Maturity(m)) => Some(m.credit_loss),
            ("liquidity_loss", PathLosses::Maturity(m)) => Some(m.liquidity_loss),
            _ => None,
        }
    }
}

/// Numeric columns shared by every variant.
pub const DRIVER_COLUMNS: [&str; 4] = ["default_rate", "lgd", "margin_shock", "systemic_factor"];

/// Loss columns produced by a variant.
pub fn loss_columns(variant: ModelVariant) -> &'static [&'static str] {
    match variant {
        ModelVariant::Amortizing => &["A_loss", "B_loss", "C_loss", "WH_loss"],
        ModelVariant::RegimeSwitching => &["credit_loss", "liquidity_loss"],
    }
}
