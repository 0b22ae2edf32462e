//! Bullet-maturity simulator with a Markov funding-freeze regime.
//!
//! Coupon accrues on the full notional every month. At maturity two events
//! are resolved: a credit default drawn from the compounded term default
//! probability, and, only if funding is frozen in the final month, a
//! refinance failure that forces a sale at a stressed haircut. Both the
//! failure probability and the haircut load on `max(-Z, 0)`: adverse
//! systemic draws fatten the tail, favourable ones do not help.

use rand::Rng;
use statrs::distribution::Normal;

use crate::config::{ModelVariant, RegimeFunding, RunConfig};
use crate::error::RiskEngineError;
use crate::path::{MaturityLosses, PathLosses, PathResult, PathSimulator};
use crate::risk_factors::SampledDrivers;
use crate::types::{Money, Rate};
use crate::RiskEngineResult;

/// Upper bound on the refinance failure probability.
const MAX_REFINANCE_FAIL_PROB: f64 = 0.995;

/// Term default probability from an annual rate, compounded over the horizon:
/// `1 - (1 - rate)^(H / 12)`, with the rate and the result clipped to `[0, 1]`.
pub fn term_default_probability(annual_default_rate: Rate, horizon_months: u32) -> f64 {
    let term_years = horizon_months as f64 / 12.0;
    let survival = (1.0 - annual_default_rate.clamp(0.0, 1.0)).powf(term_years);
    (1.0 - survival).clamp(0.0, 1.0)
}

/// Regime-switching path simulator.
#[derive(Debug, Clone)]
pub struct RegimeSwitchingSimulator {
    notional: Money,
    annual_coupon_rate: Rate,
    horizon_months: u32,
    funding: RegimeFunding,
    standard_normal: Normal,
}

impl RegimeSwitchingSimulator {
    pub fn new(config: &RunConfig) -> RiskEngineResult<Self> {
        config.portfolio.validate()?;
        config.funding.regime.validate()?;
        config.sim.validate()?;
        let standard_normal =
            Normal::new(0.0, 1.0).map_err(|e| RiskEngineError::InvalidInput {
                field: "distribution".into(),
                reason: format!("Invalid Normal parameters: {e}"),
            })?;
        Ok(Self {
            notional: config.portfolio.notional,
            annual_coupon_rate: config.portfolio.annual_coupon_rate,
            horizon_months: config.sim.horizon_months,
            funding: config.funding.regime,
            standard_normal,
        })
    }

    /// One step of the freeze chain given a uniform draw `u`.
    fn next_freeze_state(&self, in_freeze: bool, u: f64) -> bool {
        if in_freeze {
            u < self.funding.p_freeze_persist
        } else {
            u < self.funding.p_freeze_start
        }
    }

    /// `max(-Z, 0)`: only adverse systemic draws add stress.
    fn systemic_stress(z: f64) -> f64 {
        (-z).max(0.0)
    }

    pub fn refinance_fail_probability(&self, systemic_factor: f64) -> f64 {
        let f = &self.funding;
        (f.refinance_fail_prob + f.refinance_fail_sensitivity * Self::systemic_stress(systemic_factor))
            .clamp(0.0, MAX_REFINANCE_FAIL_PROB)
    }

    pub fn forced_sale_haircut(&self, systemic_factor: f64, noise: f64) -> f64 {
        let f = &self.funding;
        (f.forced_sale_haircut_base
            + f.forced_sale_haircut_sensitivity * Self::systemic_stress(systemic_factor)
            + f.forced_sale_haircut_noise * noise)
            .clamp(f.forced_sale_haircut_min, f.forced_sale_haircut_max)
    }
}

impl PathSimulator for RegimeSwitchingSimulator {
    fn variant(&self) -> ModelVariant {
        ModelVariant::RegimeSwitching
    }

    fn simulate<R: Rng>(&self, drivers: &SampledDrivers, rng: &mut R) -> PathResult {
        let h = self.horizon_months;
        let monthly_coupon = (self.annual_coupon_rate + drivers.margin_shock) / 12.0;
        let p_default_term = term_default_probability(drivers.default_rate, h);

        let mut total_net_income = 0.0;
        let mut outstanding = self.notional;
        let mut in_freeze = false;
        let mut losses = MaturityLosses::default();

        for month in 0..h {
            in_freeze = self.next_freeze_state(in_freeze, rng.gen::<f64>());

            total_net_income += outstanding * monthly_coupon;

            if month == h - 1 {
                if rng.gen::<f64>() < p_default_term {
                    losses.credit_loss = self.notional * drivers.lgd;
                }

                if in_freeze {
                    let p_fail = self.refinance_fail_probability(drivers.systemic_factor);
                    // Haircut noise is drawn before the failure draw so the
                    // draw count does not depend on the failure outcome.
                    let noise: f64 = rng.sample(&self.standard_normal);
                    let haircut = self.forced_sale_haircut(drivers.systemic_factor, noise);

                    if rng.gen::<f64>() < p_fail {
                        let forced_sale_value = self.notional * (1.0 - haircut);
                        losses.liquidity_loss = self.notional - forced_sale_value;
                    }
                }
                losses.frozen_at_maturity = in_freeze;

                total_net_income -= losses.credit_loss + losses.liquidity_loss;
                outstanding = 0.0;
            }
        }
        debug_assert_eq!(outstanding, 0.0);

        PathResult {
            total_net_income,
            drivers: *drivers,
            losses: PathLosses::Maturity(losses),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::base_config;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SEED: u64 = 42;
    const NOTIONAL: f64 = 100_000_000.0;

    fn drivers(z: f64, default_rate: f64, lgd: f64) -> SampledDrivers {
        SampledDrivers {
            systemic_factor: z,
            default_rate,
            lgd,
            margin_shock: 0.0,
        }
    }

    fn simulator_with(horizon_months: u32, funding: RegimeFunding) -> RegimeSwitchingSimulator {
        let mut cfg = base_config(ModelVariant::RegimeSwitching);
        cfg.sim.horizon_months = horizon_months;
        cfg.funding.regime = funding;
        RegimeSwitchingSimulator::new(&cfg).unwrap()
    }

    fn always_frozen() -> RegimeFunding {
        RegimeFunding {
            p_freeze_start: 1.0,
            p_freeze_persist: 1.0,
            refinance_fail_prob: 1.0,
            ..RegimeFunding::default()
        }
    }

    #[test]
    fn test_term_probability_compounds() {
        let p = term_default_probability(0.02, 36);
        assert!((p - (1.0 - 0.98_f64.powi(3))).abs() < 1e-12);
        assert!((p - 0.058808).abs() < 1e-6, "p={p}");
        assert!(p < 0.06);
    }

    #[test]
    fn test_term_probability_bounds() {
        assert_eq!(term_default_probability(0.0, 60), 0.0);
        assert_eq!(term_default_probability(1.0, 60), 1.0);
        assert_eq!(term_default_probability(-0.5, 60), 0.0);
        assert_eq!(term_default_probability(1.5, 60), 1.0);
    }

    #[test]
    fn test_fail_probability_one_sided() {
        let sim = simulator_with(12, RegimeFunding::default());
        assert_eq!(sim.refinance_fail_probability(0.0), 0.50);
        assert_eq!(sim.refinance_fail_probability(2.5), 0.50);
        assert!((sim.refinance_fail_probability(-1.0) - 0.85).abs() < 1e-12);
        assert_eq!(sim.refinance_fail_probability(-10.0), MAX_REFINANCE_FAIL_PROB);
    }

    #[test]
    fn test_haircut_clipped() {
        let sim = simulator_with(12, RegimeFunding::default());
        assert!((sim.forced_sale_haircut(1.0, 0.0) - 0.30).abs() < 1e-12);
        assert!((sim.forced_sale_haircut(-1.0, 0.0) - 0.55).abs() < 1e-12);
        assert_eq!(sim.forced_sale_haircut(-5.0, 3.0), 0.70);
        assert_eq!(sim.forced_sale_haircut(0.0, -5.0), 0.10);
    }

    #[test]
    fn test_no_freeze_means_no_liquidity_loss() {
        let funding = RegimeFunding::default().with_freeze_disabled();
        let sim = simulator_with(60, funding);
        let mut rng = StdRng::seed_from_u64(SEED);
        for _ in 0..500 {
            let r = sim.simulate(&drivers(-3.0, 0.05, 0.5), &mut rng);
            let m = r.maturity_losses().unwrap();
            assert!(!m.frozen_at_maturity);
            assert_eq!(m.liquidity_loss, 0.0);
        }
    }

    #[test]
    fn test_certain_freeze_mostly_fails_refinancing() {
        // p_fail is capped at 0.995, so failure is near-certain but not certain.
        let sim = simulator_with(24, always_frozen());
        let mut rng = StdRng::seed_from_u64(SEED);
        let mut failures = 0;
        for _ in 0..400 {
            let r = sim.simulate(&drivers(-1.0, 0.0, 0.5), &mut rng);
            let m = r.maturity_losses().unwrap();
            assert!(m.frozen_at_maturity);
            assert_eq!(m.credit_loss, 0.0);
            if m.liquidity_loss > 0.0 {
                failures += 1;
                let haircut = m.liquidity_loss / NOTIONAL;
                assert!((0.10 - 1e-9..=0.70 + 1e-9).contains(&haircut), "haircut={haircut}");
            }
        }
        assert!(failures >= 380, "failures={failures}");
    }

    #[test]
    fn test_certain_default() {
        let funding = RegimeFunding::default().with_freeze_disabled();
        let sim = simulator_with(12, funding);
        let mut rng = StdRng::seed_from_u64(SEED);
        let r = sim.simulate(&drivers(0.0, 1.0, 0.4), &mut rng);
        let m = r.maturity_losses().unwrap();
        assert_eq!(m.credit_loss, NOTIONAL * 0.4);
        let income = 12.0 * NOTIONAL * 0.09 / 12.0;
        assert!((r.total_net_income - (income - NOTIONAL * 0.4)).abs() < 1e-3);
    }

    #[test]
    fn test_income_accrues_on_full_notional() {
        let funding = RegimeFunding::default().with_freeze_disabled();
        let sim = simulator_with(60, funding);
        let mut rng = StdRng::seed_from_u64(SEED);
        let r = sim.simulate(&drivers(0.5, 0.0, 0.5), &mut rng);
        let expected = 60.0 * NOTIONAL * 0.09 / 12.0;
        assert!((r.total_net_income - expected).abs() < 1e-3);
    }

    #[test]
    fn test_draw_count_without_freeze() {
        // H freeze uniforms + 1 default uniform.
        let funding = RegimeFunding::default().with_freeze_disabled();
        let sim = simulator_with(10, funding);

        let mut rng = StdRng::seed_from_u64(SEED);
        sim.simulate(&drivers(0.0, 0.03, 0.5), &mut rng);
        let next: f64 = rng.gen();

        let mut manual = StdRng::seed_from_u64(SEED);
        for _ in 0..11 {
            let _: f64 = manual.gen();
        }
        assert_eq!(next, manual.gen::<f64>());
    }

    #[test]
    fn test_draw_count_when_frozen() {
        // H freeze uniforms + 1 default uniform + 1 haircut normal + 1 failure uniform.
        let sim = simulator_with(10, always_frozen());
        let normal = Normal::new(0.0, 1.0).unwrap();

        let mut rng = StdRng::seed_from_u64(SEED);
        let r = sim.simulate(&drivers(-0.5, 0.03, 0.5), &mut rng);
        let next: f64 = rng.gen();

        let mut manual = StdRng::seed_from_u64(SEED);
        for _ in 0..11 {
            let _: f64 = manual.gen();
        }
        let noise: f64 = manual.sample(&normal);
        let fail_draw: f64 = manual.gen();
        assert_eq!(next, manual.gen::<f64>());

        let m = r.maturity_losses().unwrap();
        if fail_draw < sim.refinance_fail_probability(-0.5) {
            let expected_haircut = sim.forced_sale_haircut(-0.5, noise);
            assert!((m.liquidity_loss - NOTIONAL * expected_haircut).abs() < 1e-6);
        } else {
            assert_eq!(m.liquidity_loss, 0.0);
        }
    }

    #[test]
    fn test_seeded_reproducibility() {
        let sim = simulator_with(60, RegimeFunding::default());
        let d = drivers(-1.5, 0.08, 0.6);
        let mut r1 = StdRng::seed_from_u64(SEED);
        let mut r2 = StdRng::seed_from_u64(SEED);
        let a: Vec<PathResult> = (0..200).map(|_| sim.simulate(&d, &mut r1)).collect();
        let b: Vec<PathResult> = (0..200).map(|_| sim.simulate(&d, &mut r2)).collect();
        assert_eq!(a, b);
    }
}
