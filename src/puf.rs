use ndarray::Array1;
use rand::Rng;

use crate::features::bin_response;

/// Common interface of the simulated PUFs.
///
/// Callers draw challenges, transform them into features and evaluate
/// responses. Each step is a separate call so a modeling attack can reuse
/// the feature matrices it trains on.
pub trait Puf {
    /// Challenge batch, bits stored as `u8` with the batch along the last axis.
    type Challenges;
    /// Feature batch produced by [`Puf::calc_features`].
    type Features;

    /// Number of stages of each arbiter chain.
    fn num_bits(&self) -> usize;

    /// Draws `n` uniformly random challenges.
    fn generate_challenge<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Self::Challenges;

    fn calc_features(&self, challenges: &Self::Challenges) -> Self::Features;

    /// Continuous response (delay difference) for every feature column.
    fn response(&self, features: &Self::Features) -> Array1<f64>;

    /// Sign of [`Puf::response`]: −1, 0 or +1 per column.
    fn bin_response(&self, features: &Self::Features) -> Array1<f64> {
        bin_response(&self.response(features))
    }

    /// Runs the whole pipeline for a fresh batch of `n` challenges.
    fn generate_crps<R: Rng + ?Sized>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Crps<Self::Challenges, Self::Features> {
        let challenges = self.generate_challenge(n, rng);
        let features = self.calc_features(&challenges);
        let responses = self.bin_response(&features);
        Crps {
            challenges,
            features,
            responses,
        }
    }
}

/// A batch of challenge-response pairs together with the features the
/// responses were computed from.
#[derive(Clone, Debug)]
pub struct Crps<C, F> {
    pub challenges: C,
    pub features: F,
    /// Binarized responses, one per challenge.
    pub responses: Array1<f64>,
}

impl<C, F> Crps<C, F> {
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}
