//! Construction parameters for the simulated PUFs.
//!
//! Every config carries a `seed`. `from_config` constructors turn it into a
//! `ChaCha20Rng`, so the same config always yields the same delay profiles.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::xor::ChallengeStrategy;

/// Domain tag mixed into every per-branch seed.
const BRANCH_SEED_DOMAIN: &[u8] = b"PUF-SIM-BRANCH-v1";

/// Parameters of a single arbiter chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PufConfig {
    /// Number of switching stages (challenge length).
    pub num_bits: usize,
    /// Mean of the normal distribution the stage delays are drawn from.
    pub mean: f64,
    /// Standard deviation of the stage delays.
    pub stdev: f64,
    /// Seed for delay sampling.
    pub seed: u64,
}

impl Default for PufConfig {
    fn default() -> Self {
        Self {
            num_bits: 64,
            mean: 0.0,
            stdev: 1.0,
            seed: 0,
        }
    }
}

impl PufConfig {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    pub fn rng(&self) -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(self.seed)
    }

    /// Independent RNG for branch `branch` of a composite built from this config.
    pub fn branch_rng(&self, branch: usize) -> ChaCha20Rng {
        ChaCha20Rng::from_seed(derive_branch_seed(self.seed, branch))
    }
}

/// Parameters of an XOR arbiter PUF.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct XorConfig {
    pub puf: PufConfig,
    pub num_xor: usize,
    pub strategy: ChallengeStrategy,
}

impl Default for XorConfig {
    fn default() -> Self {
        Self {
            puf: PufConfig::default(),
            num_xor: 4,
            strategy: ChallengeStrategy::Equal,
        }
    }
}

impl XorConfig {
    pub fn new(seed: u64) -> Self {
        Self {
            puf: PufConfig::new(seed),
            ..Default::default()
        }
    }
}

/// Parameters of a bent (AND-XOR) arbiter PUF.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BentConfig {
    pub puf: PufConfig,
    pub num_pufs: usize,
}

impl Default for BentConfig {
    fn default() -> Self {
        Self {
            puf: PufConfig::default(),
            num_pufs: 4,
        }
    }
}

impl BentConfig {
    pub fn new(seed: u64) -> Self {
        Self {
            puf: PufConfig::new(seed),
            ..Default::default()
        }
    }
}

/// Derives the 32-byte ChaCha seed of one composite branch using Keccak256.
///
/// Branch `i` gets the same seed no matter how many branches the composite has.
pub fn derive_branch_seed(seed: u64, branch: usize) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(BRANCH_SEED_DOMAIN);
    hasher.update(seed.to_be_bytes());
    hasher.update((branch as u64).to_be_bytes());
    hasher.finalize().into()
}
