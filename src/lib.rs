//! # puf-sim - Arbiter PUF simulation for modeling-attack research
//!
//! Simulates delay-based physically unclonable functions under the linear
//! additive delay model and produces challenge-response pairs (CRPs):
//!
//! 1. **Arbiter PUF** (`arbiter`) - one chain of `N` switching stages with normally distributed delays
//! 2. **XOR arbiter PUF** (`xor`) - `k` chains combined by XOR, with equal / random / derived challenges
//! 3. **Bent arbiter PUF** (`bent`) - an even number of chains combined as `x1x2 ⊕ x3x4 ⊕ …`
//!
//! ## Modules
//!
//! - [`features`] - Challenge → feature transform `φ` and the sign function
//! - [`arbiter`] - Single arbiter chain (delay profile, weight vector `w`)
//! - [`xor`] - XOR composition and challenge strategies
//! - [`bent`] - Bent (AND-XOR) composition
//! - [`puf`] - The `Puf` trait and CRP batches
//! - [`config`] - Seeded construction parameters
//!
//! ## Usage
//!
//! ```
//! use puf_sim::{Puf, XorArbiterPuf, ChallengeStrategy};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let mut rng = ChaCha20Rng::seed_from_u64(0);
//! let puf = XorArbiterPuf::new(64, 4, ChallengeStrategy::Equal, 0.0, 1.0, &mut rng).unwrap();
//! let challenges = puf.generate_challenge(1000, &mut rng);
//! let features = puf.calc_features(&challenges);
//! let responses = puf.bin_response(&features);
//! assert_eq!(responses.len(), 1000);
//! ```

pub mod arbiter;
pub mod bent;
pub mod config;
pub mod error;
pub mod features;
pub mod puf;
pub mod xor;

pub use arbiter::ArbiterPuf;
pub use bent::{logical_and, BentArbiterPuf};
pub use config::{derive_branch_seed, BentConfig, PufConfig, XorConfig};
pub use error::PufError;
pub use features::{bin_response, calc_branch_features, calc_features, sign};
pub use puf::{Crps, Puf};
pub use xor::{derived_challenge, ChallengeStrategy, XorArbiterPuf};
