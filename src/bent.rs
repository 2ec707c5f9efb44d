//! Bent arbiter PUF: an even number of arbiter chains on one shared challenge,
//! combined as `x1·x2 ⊕ x3·x4 ⊕ … ⊕ x(k-1)·xk`.
//!
//! Adjacent branches are joined with [`logical_and`], the pair outputs are
//! then multiplied (XOR in the ±1 domain).

use ndarray::{s, Array1, Array2, Array3, Axis, Zip};
use rand::Rng;

use crate::arbiter::{random_challenges, ArbiterPuf};
use crate::config::BentConfig;
use crate::error::PufError;
use crate::features::{calc_branch_features, sign};
use crate::puf::Puf;
use crate::xor::{branch_responses, shared_num_bits, stack_rows};

/// AND over signed delay differences, keeping the magnitude.
///
/// Negative exactly when both inputs are positive, `|a|·|b|` otherwise.
#[inline]
pub fn logical_and(a: f64, b: f64) -> f64 {
    if sign(a) > 0.0 && sign(b) > 0.0 {
        -(a * b)
    } else {
        a.abs() * b.abs()
    }
}

#[derive(Clone, Debug)]
pub struct BentArbiterPuf {
    num_bits: usize,
    branches: Vec<ArbiterPuf>,
}

impl BentArbiterPuf {
    pub fn new<R: Rng + ?Sized>(
        num_bits: usize,
        num_pufs: usize,
        mean: f64,
        stdev: f64,
        rng: &mut R,
    ) -> Result<Self, PufError> {
        check_branch_count(num_pufs)?;
        let branches = (0..num_pufs)
            .map(|_| ArbiterPuf::new(num_bits, mean, stdev, &mut *rng))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_branches(branches)
    }

    pub fn from_config(config: &BentConfig) -> Result<Self, PufError> {
        let puf = &config.puf;
        check_branch_count(config.num_pufs)?;
        let branches = (0..config.num_pufs)
            .map(|i| ArbiterPuf::new(puf.num_bits, puf.mean, puf.stdev, &mut puf.branch_rng(i)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_branches(branches)
    }

    pub fn from_branches(branches: Vec<ArbiterPuf>) -> Result<Self, PufError> {
        check_branch_count(branches.len())?;
        let num_bits = shared_num_bits(&branches)?;
        tracing::debug!(num_bits, num_pufs = branches.len(), "built bent arbiter PUF");
        Ok(Self { num_bits, branches })
    }

    pub fn num_pufs(&self) -> usize {
        self.branches.len()
    }

    pub fn branches(&self) -> &[ArbiterPuf] {
        &self.branches
    }

    /// Copy of all delay profiles, one row per branch.
    pub fn delays(&self) -> Array2<f64> {
        stack_rows(&self.branches, 2 * self.num_bits, ArbiterPuf::delays)
    }

    /// Copy of all weight vectors, one row per branch.
    pub fn parameters(&self) -> Array2<f64> {
        stack_rows(&self.branches, self.num_bits + 1, ArbiterPuf::parameter)
    }

    /// # Panics
    ///
    /// If `features` is not `(num_pufs, num_bits + 1, n)`.
    pub fn branch_responses(&self, features: &Array3<f64>) -> Array2<f64> {
        branch_responses(&self.branches, features)
    }

    /// [`logical_and`] of each adjacent branch pair, shape `(num_pufs / 2, n)`.
    pub fn pair_responses(&self, features: &Array3<f64>) -> Array2<f64> {
        let responses = self.branch_responses(features);
        Zip::from(responses.slice(s![0..;2, ..]))
            .and(responses.slice(s![1..;2, ..]))
            .map_collect(|&a, &b| logical_and(a, b))
    }
}

impl Puf for BentArbiterPuf {
    type Challenges = Array3<u8>;
    type Features = Array3<f64>;

    fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// One challenge, copied into every branch slot.
    fn generate_challenge<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array3<u8> {
        let shared = random_challenges(self.num_bits, n, rng);
        let mut challenges = Array3::zeros((self.num_pufs(), self.num_bits, n));
        for mut slot in challenges.outer_iter_mut() {
            slot.assign(&shared);
        }
        challenges
    }

    fn calc_features(&self, challenges: &Array3<u8>) -> Array3<f64> {
        calc_branch_features(challenges)
    }

    fn response(&self, features: &Array3<f64>) -> Array1<f64> {
        self.pair_responses(features)
            .map_axis(Axis(0), |column| column.product())
    }
}

fn check_branch_count(num_pufs: usize) -> Result<(), PufError> {
    if num_pufs < 2 || num_pufs % 2 != 0 {
        return Err(PufError::invalid(format!(
            "a bent PUF needs an even number of at least 2 arbiter chains, got {}",
            num_pufs
        )));
    }
    Ok(())
}
