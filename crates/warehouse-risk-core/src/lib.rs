//! Monte Carlo risk engine for a warehoused, tranched debt portfolio.
//!
//! A single-factor Gaussian sampler draws per-path default rate, LGD and
//! margin shocks; one of two path simulators turns them into a cash-flow
//! outcome:
//! - [`path::amortizing`]: multi-tranche funding waterfall with pro-rata
//!   amortization and junior-first loss allocation.
//! - [`path::regime`]: bullet maturity under a Markov funding-freeze regime
//!   with a stress-dependent refinance cliff.
//!
//! [`monte_carlo`] runs N seeded paths and aggregates the result table.

pub mod config;
pub mod error;
pub mod monte_carlo;
pub mod path;
pub mod risk_factors;
pub mod types;

pub use error::RiskEngineError;
pub use types::*;

/// Standard result type for all engine operations
pub type RiskEngineResult<T> = Result<T, RiskEngineError>;
