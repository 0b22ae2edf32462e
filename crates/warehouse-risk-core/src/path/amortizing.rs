//! Amortizing multi-tranche funding waterfall.
//!
//! Month 0 is fully warehouse-funded. From month 1 the term tranches draw
//! senior-first (A, B, C) up to their limits and the warehouse line carries
//! the residual. Principal amortizes straight-line and repays every layer
//! pro-rata to its share of the funding balance. Credit loss is applied once
//! at maturity, junior-first: C, B, A, then warehouse.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{ModelVariant, RunConfig, WaterfallFunding};
use crate::path::{PathLosses, PathResult, PathSimulator, TrancheLosses};
use crate::risk_factors::SampledDrivers;
use crate::types::{Money, Rate};
use crate::RiskEngineResult;

// ---------------------------------------------------------------------------
// Funding layers
// ---------------------------------------------------------------------------

/// Balances of the four funding sources.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct FundingLayers {
    a: Money,
    b: Money,
    c: Money,
    warehouse: Money,
}

impl FundingLayers {
    fn bridge(notional: Money) -> Self {
        Self {
            warehouse: notional,
            ..Self::default()
        }
    }

    fn term_total(&self) -> Money {
        self.a + self.b + self.c
    }

    fn total(&self) -> Money {
        self.term_total() + self.warehouse
    }

    /// Fill A, then B, then C toward their limits; the warehouse line takes
    /// whatever principal is still unplaced.
    fn draw_term_funding(&mut self, outstanding: Money, limits: &LayerLimits) {
        let mut needed = outstanding - self.term_total();

        let draw_a = (limits.a - self.a).min(needed);
        self.a += draw_a;
        needed -= draw_a;

        let draw_b = (limits.b - self.b).min(needed);
        self.b += draw_b;
        needed -= draw_b;

        let draw_c = (limits.c - self.c).min(needed);
        self.c += draw_c;

        self.warehouse = (outstanding - self.term_total()).max(0.0);
    }

    fn funding_cost(&self, rates: &LayerRates) -> Money {
        self.a * rates.a + self.b * rates.b + self.c * rates.c + self.warehouse * rates.warehouse
    }

    /// Repay `amount` across layers in proportion to each layer's share of
    /// the total funding balance. No-op when nothing is funded.
    fn repay_pro_rata(&mut self, amount: Money) {
        let total = self.total();
        if total <= 0.0 {
            return;
        }
        self.a -= amount * self.a / total;
        self.b -= amount * self.b / total;
        self.c -= amount * self.c / total;
        self.warehouse -= amount * self.warehouse / total;
    }

    /// Absorb `loss` junior-first: C, B, A, warehouse. Each layer takes at
    /// most its own balance; anything left over is unallocated.
    fn allocate_loss(&self, loss: Money) -> TrancheLosses {
        let mut remaining = loss.max(0.0);
        let mut absorb = |balance: Money| {
            let taken = balance.max(0.0).min(remaining);
            remaining -= taken;
            taken
        };

        let c_loss = absorb(self.c);
        let b_loss = absorb(self.b);
        let a_loss = absorb(self.a);
        let wh_loss = absorb(self.warehouse);

        TrancheLosses {
            a_loss,
            b_loss,
            c_loss,
            wh_loss,
        }
    }
}

/// Absolute capacity of each term tranche.
#[derive(Debug, Clone, Copy)]
struct LayerLimits {
    a: Money,
    b: Money,
    c: Money,
}

/// Monthly funding rate of each layer.
#[derive(Debug, Clone, Copy)]
struct LayerRates {
    a: Rate,
    b: Rate,
    c: Rate,
    warehouse: Rate,
}

// ---------------------------------------------------------------------------
// Trace
// ---------------------------------------------------------------------------

/// Funding stack for one month, after the draw step and before repayment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub month: u32,
    pub a_balance: Money,
    pub b_balance: Money,
    pub c_balance: Money,
    pub warehouse_balance: Money,
    pub outstanding: Money,
    pub interest_income: Money,
    pub funding_cost: Money,
}

impl LayerSnapshot {
    pub fn funding_total(&self) -> Money {
        self.a_balance + self.b_balance + self.c_balance + self.warehouse_balance
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Amortizing waterfall simulator.
///
/// The systemic factor is carried through to the result but does not enter
/// the cash flows: only default rate, LGD and margin shock do.
#[derive(Debug, Clone)]
pub struct AmortizingSimulator {
    notional: Money,
    annual_coupon_rate: Rate,
    horizon_months: u32,
    limits: LayerLimits,
    monthly_rates: LayerRates,
}

impl AmortizingSimulator {
    pub fn new(config: &RunConfig) -> RiskEngineResult<Self> {
        config.portfolio.validate()?;
        config.funding.waterfall.validate()?;
        config.sim.validate()?;
        Ok(Self::from_parts(
            config.portfolio.notional,
            config.portfolio.annual_coupon_rate,
            config.sim.horizon_months,
            &config.funding.waterfall,
        ))
    }

    fn from_parts(
        notional: Money,
        annual_coupon_rate: Rate,
        horizon_months: u32,
        funding: &WaterfallFunding,
    ) -> Self {
        Self {
            notional,
            annual_coupon_rate,
            horizon_months,
            limits: LayerLimits {
                a: notional * funding.tranche_a.limit_fraction_of_notional,
                b: notional * funding.tranche_b.limit_fraction_of_notional,
                c: notional * funding.tranche_c.limit_fraction_of_notional,
            },
            monthly_rates: LayerRates {
                a: funding.tranche_a.funding_rate_annual / 12.0,
                b: funding.tranche_b.funding_rate_annual / 12.0,
                c: funding.tranche_c.funding_rate_annual / 12.0,
                warehouse: funding.warehouse.funding_rate_annual / 12.0,
            },
        }
    }

    /// Run one path and record the funding stack month by month.
    pub fn simulate_traced(&self, drivers: &SampledDrivers) -> (PathResult, Vec<LayerSnapshot>) {
        let mut trace = Vec::with_capacity(self.horizon_months as usize);
        let result = self.run(drivers, Some(&mut trace));
        (result, trace)
    }

    fn run(&self, drivers: &SampledDrivers, mut trace: Option<&mut Vec<LayerSnapshot>>) -> PathResult {
        let h = self.horizon_months;
        let monthly_coupon = (self.annual_coupon_rate + drivers.margin_shock) / 12.0;
        let monthly_principal = self.notional / h as f64;

        let mut layers = FundingLayers::bridge(self.notional);
        let mut outstanding = self.notional;
        let mut total_net_income = 0.0;

        for month in 0..h {
            if month > 0 {
                layers.draw_term_funding(outstanding, &self.limits);
            }

            let interest_income = outstanding * monthly_coupon;
            let funding_cost = layers.funding_cost(&self.monthly_rates);
            total_net_income += interest_income - funding_cost;

            if let Some(trace) = trace.as_deref_mut() {
                trace.push(LayerSnapshot {
                    month,
                    a_balance: layers.a,
                    b_balance: layers.b,
                    c_balance: layers.c,
                    warehouse_balance: layers.warehouse,
                    outstanding,
                    interest_income,
                    funding_cost,
                });
            }

            layers.repay_pro_rata(monthly_principal);
            outstanding -= monthly_principal;
        }

        let cumulative_default = (drivers.default_rate * h as f64 / 12.0).min(1.0);
        let total_loss = self.notional * cumulative_default * drivers.lgd;
        let tranche_losses = layers.allocate_loss(total_loss);
        total_net_income -= total_loss;

        PathResult {
            total_net_income,
            drivers: *drivers,
            losses: PathLosses::Tranche(tranche_losses),
        }
    }
}

impl PathSimulator for AmortizingSimulator {
    fn variant(&self) -> ModelVariant {
        ModelVariant::Amortizing
    }

    fn simulate<R: Rng>(&self, drivers: &SampledDrivers, _rng: &mut R) -> PathResult {
        self.run(drivers, None)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
