//! XOR arbiter PUF: `k` independent arbiter chains whose outputs are XORed.
//!
//! In the ±1 domain XOR is multiplication, so the continuous response of the
//! composite is the product of the branch delay differences and its sign is
//! the XOR of the branch bits.
//!
//! How each branch gets its challenge is selected by [`ChallengeStrategy`].

use std::fmt;
use std::str::FromStr;

use ndarray::{s, Array1, Array2, Array3, ArrayView2, ArrayViewMut2, Axis, Zip};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::arbiter::{random_challenges, ArbiterPuf};
use crate::config::XorConfig;
use crate::error::PufError;
use crate::features::calc_branch_features;
use crate::puf::Puf;

/// How the per-branch challenges of a composite are produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStrategy {
    /// One challenge broadcast to every branch.
    Equal,
    /// An independent challenge per branch.
    Random,
    /// One shared challenge, rotated by the branch index and passed through
    /// the lightweight-PUF input network. Needs an even `num_bits`.
    #[serde(alias = "lightweight")]
    Derived,
}

impl FromStr for ChallengeStrategy {
    type Err = PufError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "equal" => Ok(ChallengeStrategy::Equal),
            "random" => Ok(ChallengeStrategy::Random),
            "derived" | "lightweight" => Ok(ChallengeStrategy::Derived),
            other => Err(PufError::invalid(format!(
                "no challenge mapping named {:?} exists for XOR PUFs \
                 (expected equal, random or derived)",
                other
            ))),
        }
    }
}

impl fmt::Display for ChallengeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChallengeStrategy::Equal => "equal",
            ChallengeStrategy::Random => "random",
            ChallengeStrategy::Derived => "derived",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug)]
pub struct XorArbiterPuf {
    num_bits: usize,
    strategy: ChallengeStrategy,
    branches: Vec<ArbiterPuf>,
}

impl XorArbiterPuf {
    pub fn new<R: Rng + ?Sized>(
        num_bits: usize,
        num_xor: usize,
        strategy: ChallengeStrategy,
        mean: f64,
        stdev: f64,
        rng: &mut R,
    ) -> Result<Self, PufError> {
        check_layout(num_bits, num_xor, strategy)?;
        let branches = (0..num_xor)
            .map(|_| ArbiterPuf::new(num_bits, mean, stdev, &mut *rng))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_branches(branches, strategy)
    }

    /// Seeds branch `i` from `config.puf.branch_rng(i)`.
    pub fn from_config(config: &XorConfig) -> Result<Self, PufError> {
        let puf = &config.puf;
        check_layout(puf.num_bits, config.num_xor, config.strategy)?;
        let branches = (0..config.num_xor)
            .map(|i| ArbiterPuf::new(puf.num_bits, puf.mean, puf.stdev, &mut puf.branch_rng(i)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_branches(branches, config.strategy)
    }

    /// Assembles a composite from existing chains, which must agree on `num_bits`.
    pub fn from_branches(
        branches: Vec<ArbiterPuf>,
        strategy: ChallengeStrategy,
    ) -> Result<Self, PufError> {
        let num_bits = shared_num_bits(&branches)?;
        check_layout(num_bits, branches.len(), strategy)?;
        tracing::debug!(
            num_bits,
            num_xor = branches.len(),
            %strategy,
            "built XOR arbiter PUF"
        );
        Ok(Self {
            num_bits,
            strategy,
            branches,
        })
    }

    pub fn num_xor(&self) -> usize {
        self.branches.len()
    }

    pub fn strategy(&self) -> ChallengeStrategy {
        self.strategy
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

    /// Delay difference of every branch, shape `(num_xor, n)`.
    ///
    /// # Panics
    ///
    /// If `features` is not `(num_xor, num_bits + 1, n)`.
    pub fn branch_responses(&self, features: &Array3<f64>) -> Array2<f64> {
        branch_responses(&self.branches, features)
    }
}

impl Puf for XorArbiterPuf {
    type Challenges = Array3<u8>;
    type Features = Array3<f64>;

    fn num_bits(&self) -> usize {
        self.num_bits
    }

    fn generate_challenge<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array3<u8> {
        let (num_xor, num_bits) = (self.num_xor(), self.num_bits);
        let mut challenges = Array3::zeros((num_xor, num_bits, n));
        match self.strategy {
            ChallengeStrategy::Equal => {
                let shared = random_challenges(num_bits, n, rng);
                for mut slot in challenges.outer_iter_mut() {
                    slot.assign(&shared);
                }
            }
            ChallengeStrategy::Random => {
                for mut slot in challenges.outer_iter_mut() {
                    slot.assign(&random_challenges(num_bits, n, rng));
                }
            }
            ChallengeStrategy::Derived => {
                let shared = random_challenges(num_bits, n, rng);
                for (branch, slot) in challenges.outer_iter_mut().enumerate() {
                    derive_into(shared.view(), branch, slot);
                }
            }
        }
        challenges
    }

    fn calc_features(&self, challenges: &Array3<u8>) -> Array3<f64> {
        calc_branch_features(challenges)
    }

    fn response(&self, features: &Array3<f64>) -> Array1<f64> {
        self.branch_responses(features)
            .map_axis(Axis(0), |column| column.product())
    }
}

/// Challenge seen by branch `branch` under [`ChallengeStrategy::Derived`].
///
/// The shared challenge is rotated left by `branch mod N` stages, then
///
/// ```text
/// c'[j]         = r[2j] ^ r[2j+1]      j < N/2
/// c'[N/2]       = r[0]
/// c'[N/2+1+j]   = r[2j+1] ^ r[2j+2]    j < N/2 - 1
/// ```
///
/// Branch indices past `N` wrap around, so branch `N + i` sees the same
/// challenge as branch `i`.
///
/// # Panics
///
/// If `shared` does not have an even, non-zero number of rows.
pub fn derived_challenge(shared: ArrayView2<'_, u8>, branch: usize) -> Array2<u8> {
    let mut out = Array2::zeros(shared.dim());
    derive_into(shared, branch, out.view_mut());
    out
}

fn derive_into(shared: ArrayView2<'_, u8>, branch: usize, mut out: ArrayViewMut2<'_, u8>) {
    let num_bits = shared.nrows();
    assert!(
        num_bits >= 2 && num_bits % 2 == 0,
        "derived challenges need an even number of stages, got {}",
        num_bits
    );
    let half = num_bits / 2;

    let shift = branch % num_bits;
    let mut rotated = Array2::zeros(shared.dim());
    rotated
        .slice_mut(s![..num_bits - shift, ..])
        .assign(&shared.slice(s![shift.., ..]));
    rotated
        .slice_mut(s![num_bits - shift.., ..])
        .assign(&shared.slice(s![..shift, ..]));

    Zip::from(out.slice_mut(s![..half, ..]))
        .and(rotated.slice(s![0..;2, ..]))
        .and(rotated.slice(s![1..;2, ..]))
        .for_each(|o, &a, &b| *o = a ^ b);
    out.row_mut(half).assign(&rotated.row(0));
    Zip::from(out.slice_mut(s![half + 1.., ..]))
        .and(rotated.slice(s![1..num_bits - 1;2, ..]))
        .and(rotated.slice(s![2..;2, ..]))
        .for_each(|o, &a, &b| *o = a ^ b);
}

fn check_layout(
    num_bits: usize,
    num_xor: usize,
    strategy: ChallengeStrategy,
) -> Result<(), PufError> {
    if num_xor < 1 {
        return Err(PufError::invalid("an XOR PUF needs at least one arbiter chain"));
    }
    if strategy == ChallengeStrategy::Derived && (num_bits < 2 || num_bits % 2 != 0) {
        return Err(PufError::invalid(format!(
            "derived challenges need an even num_bits >= 2, got {}",
            num_bits
        )));
    }
    Ok(())
}

/// `num_bits` common to all chains of a composite.
pub(crate) fn shared_num_bits(branches: &[ArbiterPuf]) -> Result<usize, PufError> {
    let first = branches
        .first()
        .ok_or_else(|| PufError::invalid("a composite PUF needs at least one arbiter chain"))?
        .num_bits();
    if let Some((i, other)) = branches
        .iter()
        .enumerate()
        .find(|(_, puf)| puf.num_bits() != first)
    {
        return Err(PufError::invalid(format!(
            "branch {} has {} stages, branch 0 has {}",
            i,
            other.num_bits(),
            first
        )));
    }
    Ok(first)
}

pub(crate) fn branch_responses(branches: &[ArbiterPuf], features: &Array3<f64>) -> Array2<f64> {
    assert_eq!(
        features.len_of(Axis(0)),
        branches.len(),
        "feature tensor has {} branches, expected {}",
        features.len_of(Axis(0)),
        branches.len()
    );
    let mut responses = Array2::zeros((branches.len(), features.len_of(Axis(2))));
    for ((puf, branch_features), mut row) in branches
        .iter()
        .zip(features.outer_iter())
        .zip(responses.outer_iter_mut())
    {
        row.assign(&puf.delay_difference(branch_features));
    }
    responses
}

pub(crate) fn stack_rows(
    branches: &[ArbiterPuf],
    width: usize,
    row: fn(&ArbiterPuf) -> &Array1<f64>,
) -> Array2<f64> {
    Array2::from_shape_fn((branches.len(), width), |(i, j)| row(&branches[i])[j])
}
