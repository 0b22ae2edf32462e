use serde::{Deserialize, Serialize};

use crate::error::RiskEngineError;
use crate::types::Rate;
use crate::RiskEngineResult;

/// Parameters for one correlated risk driver.
///
/// The driver's latent normal is `sqrt(rho) * Z + sqrt(1 - rho) * e`, so
/// `correlation_to_systemic` is the squared loading on the systemic factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverParams {
    /// Level before the shock. Required for default rate and LGD; the
    /// margin shock has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<f64>,
    /// Multiplier applied to the latent normal.
    #[serde(alias = "shock_coef")]
    pub shock_coefficient: f64,
    /// Squared correlation to the systemic factor, in `[0, 1]`.
    #[serde(alias = "rho")]
    pub correlation_to_systemic: Rate,
    pub clip_min: f64,
    pub clip_max: f64,
}

impl DriverParams {
    pub fn clip(&self, value: f64) -> f64 {
        value.clamp(self.clip_min, self.clip_max)
    }

    /// Base level, or 0 when the driver has none.
    pub fn base_level(&self) -> f64 {
        self.base.unwrap_or(0.0)
    }

    pub(crate) fn validate(&self, path: &str) -> RiskEngineResult<()> {
        let finite = [
            ("base", self.base_level()),
            ("shock_coefficient", self.shock_coefficient),
            ("correlation_to_systemic", self.correlation_to_systemic),
            ("clip_min", self.clip_min),
            ("clip_max", self.clip_max),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(RiskEngineError::invalid(
                    format!("{path}.{name}"),
                    "Must be a finite number",
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.correlation_to_systemic) {
            return Err(RiskEngineError::invalid(
                format!("{path}.correlation_to_systemic"),
                format!(
                    "Must be in [0, 1], got {}",
                    self.correlation_to_systemic
                ),
            ));
        }
        if self.clip_min > self.clip_max {
            return Err(RiskEngineError::invalid(
                format!("{path}.clip_min"),
                format!(
                    "clip_min ({}) must not exceed clip_max ({})",
                    self.clip_min, self.clip_max
                ),
            ));
        }
        Ok(())
    }
}

/// Correlated driver set sampled once per path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskEngineConfig {
    /// Annual default rate.
    pub default_rate: DriverParams,
    /// Loss given default.
    pub lgd: DriverParams,
    /// Additive shock to the annual coupon.
    pub margin_shock: DriverParams,
}

impl RiskEngineConfig {
    pub fn validate(&self) -> RiskEngineResult<()> {
        for (path, driver) in [
            ("risk_engine.default_rate", &self.default_rate),
            ("risk_engine.lgd", &self.lgd),
        ] {
            if driver.base.is_none() {
                return Err(RiskEngineError::MissingParameter(format!("{path}.base")));
            }
        }
        self.default_rate.validate("risk_engine.default_rate")?;
        self.lgd.validate("risk_engine.lgd")?;
        self.margin_shock.validate("risk_engine.margin_shock")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> DriverParams {
        DriverParams {
            base: Some(0.03),
            shock_coefficient: 0.02,
            correlation_to_systemic: 0.3,
            clip_min: 0.0,
            clip_max: 0.15,
        }
    }

    #[test]
    fn test_clip_bounds() {
        let d = driver();
        assert_eq!(d.clip(-0.5), 0.0);
        assert_eq!(d.clip(0.5), 0.15);
        assert_eq!(d.clip(0.07), 0.07);
    }

    #[test]
    fn test_rho_out_of_range_rejected() {
        let mut d = driver();
        d.correlation_to_systemic = 1.2;
        let err = d.validate("risk_engine.lgd").unwrap_err();
        match err {
            RiskEngineError::InvalidInput { field, .. } => {
                assert_eq!(field, "risk_engine.lgd.correlation_to_systemic")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_inverted_clip_rejected() {
        let mut d = driver();
        d.clip_min = 0.2;
        assert!(d.validate("risk_engine.default_rate").is_err());
    }

    #[test]
    fn test_nan_rejected() {
        let mut d = driver();
        d.shock_coefficient = f64::NAN;
        assert!(d.validate("risk_engine.default_rate").is_err());
    }

    #[test]
    fn test_yaml_style_aliases() {
        let d: DriverParams = serde_json::from_str(
            r#"{"base":0.45,"shock_coef":0.1,"rho":0.2,"clip_min":0.1,"clip_max":0.9}"#,
        )
        .unwrap();
        assert_eq!(d.shock_coefficient, 0.1);
        assert_eq!(d.correlation_to_systemic, 0.2);
    }

    #[test]
    fn test_margin_base_is_optional() {
        let d: DriverParams = serde_json::from_str(
            r#"{"shock_coefficient":0.01,"correlation_to_systemic":0.25,"clip_min":-0.03,"clip_max":0.03}"#,
        )
        .unwrap();
        assert_eq!(d.base, None);
        assert_eq!(d.base_level(), 0.0);
    }

    #[test]
    fn test_driver_without_base_is_missing_parameter() {
        let cfg = RiskEngineConfig {
            default_rate: driver(),
            lgd: DriverParams {
                base: None,
                ..driver()
            },
            margin_shock: DriverParams {
                base: None,
                ..driver()
            },
        };
        match cfg.validate() {
            Err(RiskEngineError::MissingParameter(name)) => assert_eq!(name, "risk_engine.lgd.base"),
            other => panic!("expected MissingParameter, got {other:?}"),
        }
    }
}
