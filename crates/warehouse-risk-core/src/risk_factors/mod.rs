//! Single-factor Gaussian sampler for the per-path risk drivers.

pub mod sampler;

pub use sampler::{RiskFactorSampler, SampledDrivers};
