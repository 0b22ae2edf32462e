//! Random-source construction.
//!
//! `Sequential` runs use one `StdRng` seeded from the run seed. `PerPath`
//! runs give path `i` its own `StdRng` seeded from [`path_seed`], so a path's
//! outcome depends only on `(seed, i)` and the configuration.

use rand::rngs::StdRng;
use rand::SeedableRng;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 finaliser.
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed of the sub-stream owned by path `index`.
pub fn path_seed(seed: u64, index: u64) -> u64 {
    splitmix64(seed ^ splitmix64(index))
}

pub fn run_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn path_rng(seed: u64, index: u64) -> StdRng {
    StdRng::seed_from_u64(path_seed(seed, index))
}
