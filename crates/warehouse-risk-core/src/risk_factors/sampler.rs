use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

use crate::config::RiskEngineConfig;
use crate::error::RiskEngineError;
use crate::RiskEngineResult;

/// Drivers for one path. Produced by the sampler, read by a path simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampledDrivers {
    /// Systemic factor `Z ~ N(0, 1)`.
    pub systemic_factor: f64,
    /// Annual default rate, clipped.
    pub default_rate: f64,
    /// Loss given default, clipped.
    pub lgd: f64,
    /// Additive coupon shock, clipped.
    pub margin_shock: f64,
}

/// Correlated driver sampler.
///
/// Every call to [`RiskFactorSampler::sample`] consumes exactly four standard
/// normal draws, in this order: `Z`, `e_default`, `e_lgd`, `e_margin`.
#[derive(Debug, Clone)]
pub struct RiskFactorSampler {
    config: RiskEngineConfig,
    standard_normal: Normal,
}

impl RiskFactorSampler {
    pub fn new(config: &RiskEngineConfig) -> RiskEngineResult<Self> {
        config.validate()?;
        let standard_normal =
            Normal::new(0.0, 1.0).map_err(|e| RiskEngineError::InvalidInput {
                field: "distribution".into(),
                reason: format!("Invalid Normal parameters: {e}"),
            })?;
        Ok(Self {
            config: *config,
            standard_normal,
        })
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> SampledDrivers {
        let z = rng.sample(&self.standard_normal);
        let e_default = rng.sample(&self.standard_normal);
        let e_lgd = rng.sample(&self.standard_normal);
        let e_margin = rng.sample(&self.standard_normal);
        self.transform(z, e_default, e_lgd, e_margin)
    }

    /// Map the systemic and idiosyncratic normals onto clipped drivers.
    ///
    /// Default rate and LGD load on `-z` (a bad draw raises them); the
    /// margin shock loads on `+z` and has no base level.
    pub fn transform(&self, z: f64, e_default: f64, e_lgd: f64, e_margin: f64) -> SampledDrivers {
        let re = &self.config;

        let z_default = correlate(re.default_rate.correlation_to_systemic, z, e_default);
        let z_lgd = correlate(re.lgd.correlation_to_systemic, z, e_lgd);
        let z_margin = correlate(re.margin_shock.correlation_to_systemic, z, e_margin);

        let default_rate = re
            .default_rate
            .clip(re.default_rate.base_level() + re.default_rate.shock_coefficient * (-z_default));
        let lgd = re
            .lgd
            .clip(re.lgd.base_level() + re.lgd.shock_coefficient * (-z_lgd));
        let margin_shock = re
            .margin_shock
            .clip(re.margin_shock.shock_coefficient * z_margin);

        SampledDrivers {
            systemic_factor: z,
            default_rate,
            lgd,
            margin_shock,
        }
    }
}

/// One-factor Gaussian copula: `sqrt(rho) * z + sqrt(1 - rho) * e`.
fn correlate(rho: f64, z: f64, e: f64) -> f64 {
    rho.sqrt() * z + (1.0 - rho).sqrt() * e
}
