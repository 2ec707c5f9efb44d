//! Arbiter PUF under the linear additive delay model (D. Lim).
//!
//! Each of the `N` switching stages contributes two random runtime
//! differences between the upper and lower path: one when the stage passes
//! the signals straight through, one when it crosses them. Those `2N`
//! delays collapse into a weight vector `w` of length `N + 1` so that the
//! arbiter's delay difference for a challenge is `⟨w, φ(c)⟩`.

use ndarray::{s, Array1, Array2, ArrayView2};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::PufConfig;
use crate::error::PufError;
use crate::features::calc_features;
use crate::puf::Puf;

#[derive(Clone, Debug)]
pub struct ArbiterPuf {
    num_bits: usize,
    /// Straight-connection delays in the first half, crossed in the second.
    delays: Array1<f64>,
    /// Weight vector `w` of the linear model, bias last.
    parameter: Array1<f64>,
}

impl ArbiterPuf {
    /// Samples `2 * num_bits` stage delays from `N(mean, stdev²)`.
    pub fn new<R: Rng + ?Sized>(
        num_bits: usize,
        mean: f64,
        stdev: f64,
        rng: &mut R,
    ) -> Result<Self, PufError> {
        if num_bits < 1 {
            return Err(PufError::invalid(format!(
                "num_bits must be at least 1, got {}",
                num_bits
            )));
        }
        let normal = delay_distribution(mean, stdev)?;
        let delays: Array1<f64> = (0..2 * num_bits).map(|_| normal.sample(&mut *rng)).collect();
        tracing::debug!(num_bits, mean, stdev, "sampled arbiter PUF delays");
        Self::from_delays(delays)
    }

    pub fn from_config(config: &PufConfig) -> Result<Self, PufError> {
        Self::new(config.num_bits, config.mean, config.stdev, &mut config.rng())
    }

    /// Builds a PUF from a fixed delay profile of length `2 * num_bits`.
    pub fn from_delays(delays: Array1<f64>) -> Result<Self, PufError> {
        if delays.len() < 2 || delays.len() % 2 != 0 {
            return Err(PufError::invalid(format!(
                "delay profile must have even length >= 2, got {}",
                delays.len()
            )));
        }
        if let Some(d) = delays.iter().find(|d| !d.is_finite()) {
            return Err(PufError::invalid(format!(
                "delay profile must be finite, found {}",
                d
            )));
        }
        let num_bits = delays.len() / 2;
        let parameter = linear_parameter(&delays, num_bits);
        Ok(Self {
            num_bits,
            delays,
            parameter,
        })
    }

    pub fn delays(&self) -> &Array1<f64> {
        &self.delays
    }

    pub fn parameter(&self) -> &Array1<f64> {
        &self.parameter
    }

    /// `⟨w, φ⟩` for every column of a `(num_bits + 1, n)` feature matrix.
    ///
    /// # Panics
    ///
    /// If the feature matrix does not have `num_bits + 1` rows.
    pub fn delay_difference(&self, features: ArrayView2<'_, f64>) -> Array1<f64> {
        assert_eq!(
            features.nrows(),
            self.num_bits + 1,
            "feature matrix has {} rows, expected {}",
            features.nrows(),
            self.num_bits + 1
        );
        self.parameter.dot(&features)
    }
}

impl Puf for ArbiterPuf {
    type Challenges = Array2<u8>;
    type Features = Array2<f64>;

    fn num_bits(&self) -> usize {
        self.num_bits
    }

    fn generate_challenge<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<u8> {
        random_challenges(self.num_bits, n, rng)
    }

    fn calc_features(&self, challenges: &Array2<u8>) -> Array2<f64> {
        calc_features(challenges)
    }

    fn response(&self, features: &Array2<f64>) -> Array1<f64> {
        self.delay_difference(features.view())
    }
}

pub(crate) fn delay_distribution(mean: f64, stdev: f64) -> Result<Normal<f64>, PufError> {
    if !mean.is_finite() {
        return Err(PufError::invalid(format!("delay mean must be finite, got {}", mean)));
    }
    if !stdev.is_finite() || stdev < 0.0 {
        return Err(PufError::invalid(format!(
            "delay stdev must be finite and non-negative, got {}",
            stdev
        )));
    }
    Normal::new(mean, stdev)
        .map_err(|e| PufError::invalid(format!("bad delay distribution: {}", e)))
}

/// Uniform 0/1 challenge matrix of shape `(num_bits, n)`.
pub(crate) fn random_challenges<R: Rng + ?Sized>(
    num_bits: usize,
    n: usize,
    rng: &mut R,
) -> Array2<u8> {
    tracing::trace!(num_bits, n, "drawing challenges");
    Array2::from_shape_simple_fn((num_bits, n), || rng.gen_range(0..2u8))
}

/// `w[0] = d_s[0] - d_c[0]`,
/// `w[i] = (d_s[i] - d_c[i]) + (d_s[i-1] + d_c[i-1])` for `0 < i < N`,
/// `w[N] = d_s[N-1] + d_c[N-1]`.
fn linear_parameter(delays: &Array1<f64>, num_bits: usize) -> Array1<f64> {
    let straight = delays.slice(s![..num_bits]);
    let crossed = delays.slice(s![num_bits..]);

    let mut parameter = Array1::zeros(num_bits + 1);
    parameter
        .slice_mut(s![..num_bits])
        .assign(&(&straight - &crossed));
    let mut shifted = parameter.slice_mut(s![1..]);
    shifted += &(&straight + &crossed);
    parameter
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn zero_puf(num_bits: usize) -> ArbiterPuf {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        ArbiterPuf::new(num_bits, 0.0, 0.0, &mut rng).unwrap()
    }

    #[test]
    fn test_parameter_derivation() {
        // straight = [1, 2, 3], crossed = [10, 20, 30]
        let puf = ArbiterPuf::from_delays(array![1.0, 2.0, 3.0, 10.0, 20.0, 30.0]).unwrap();
        assert_eq!(puf.num_bits(), 3);
        assert_eq!(
            puf.parameter(),
            &array![
                1.0 - 10.0,
                (2.0 - 20.0) + (1.0 + 10.0),
                (3.0 - 30.0) + (2.0 + 20.0),
                3.0 + 30.0
            ]
        );
    }

    #[test]
    fn test_single_stage() {
        let puf = ArbiterPuf::from_delays(array![0.5, -0.25]).unwrap();
        assert_eq!(puf.parameter(), &array![0.75, 0.25]);
    }

    #[test]
    fn test_shapes() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let puf = ArbiterPuf::new(64, 0.0, 1.0, &mut rng).unwrap();
        assert_eq!(puf.delays().len(), 128);
        assert_eq!(puf.parameter().len(), 65);

        let challenges = puf.generate_challenge(500, &mut rng);
        assert_eq!(challenges.dim(), (64, 500));
        assert!(challenges.iter().all(|&b| b <= 1));
        assert!(challenges.iter().any(|&b| b == 1));

        let features = puf.calc_features(&challenges);
        assert_eq!(features.dim(), (65, 500));
        assert_eq!(puf.response(&features).len(), 500);
    }

    #[test]
    fn test_zero_delay_profile() {
        let puf = zero_puf(16);
        assert!(puf.delays().iter().all(|&d| d == 0.0));
        assert!(puf.parameter().iter().all(|&w| w == 0.0));

        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let features = puf.calc_features(&puf.generate_challenge(50, &mut rng));
        assert!(puf.response(&features).iter().all(|&r| r == 0.0));
        assert!(puf.bin_response(&features).iter().all(|&r| r == 0.0));
    }

    #[test]
    fn test_two_bit_zero_delay_example() {
        let puf = zero_puf(2);
        let features = puf.calc_features(&array![[0u8], [1u8]]);
        assert_eq!(features, array![[-1.0], [-1.0], [1.0]]);
        assert_eq!(puf.response(&features), array![0.0]);
        assert_eq!(puf.bin_response(&features), array![0.0]);
    }

    #[test]
    fn test_response_is_dot_product() {
        let puf = ArbiterPuf::from_delays(array![1.0, 2.0, 3.0, 10.0, 20.0, 30.0]).unwrap();
        let features = array![[1.0, -1.0], [1.0, 1.0], [-1.0, -1.0], [1.0, 1.0]];
        let w = puf.parameter();
        let expected = array![
            w[0] + w[1] - w[2] + w[3],
            -w[0] + w[1] - w[2] + w[3]
        ];
        assert_eq!(puf.response(&features), expected);
    }

    #[test]
    fn test_bin_response_is_sign_of_response() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let puf = ArbiterPuf::new(32, 0.0, 1.0, &mut rng).unwrap();
        let features = puf.calc_features(&puf.generate_challenge(200, &mut rng));
        let response = puf.response(&features);
        let bin = puf.bin_response(&features);
        for (&r, &b) in response.iter().zip(bin.iter()) {
            assert!(b == -1.0 || b == 0.0 || b == 1.0);
            assert_eq!(b, crate::features::sign(r));
        }
    }

    #[test]
    fn test_response_deterministic() {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let puf = ArbiterPuf::new(24, 0.0, 1.0, &mut rng).unwrap();
        let features = puf.calc_features(&puf.generate_challenge(64, &mut rng));
        assert_eq!(puf.response(&features), puf.response(&features));
        assert_eq!(puf.bin_response(&features), puf.bin_response(&features));
    }

    #[test]
    fn test_from_config_deterministic() {
        let config = PufConfig {
            num_bits: 32,
            ..PufConfig::new(12345)
        };
        let p1 = ArbiterPuf::from_config(&config).unwrap();
        let p2 = ArbiterPuf::from_config(&config).unwrap();
        assert_eq!(p1.delays(), p2.delays());

        let p3 = ArbiterPuf::from_config(&PufConfig { seed: 1, ..config }).unwrap();
        assert_ne!(p1.delays(), p3.delays());
    }

    #[test]
    fn test_mean_shifts_delays() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let puf = ArbiterPuf::new(8, 5.0, 0.0, &mut rng).unwrap();
        assert!(puf.delays().iter().all(|&d| d == 5.0));
        // straight - crossed cancels, the sum of neighbours remains
        assert_eq!(puf.parameter()[0], 0.0);
        assert_eq!(puf.parameter()[3], 10.0);
        assert_eq!(puf.parameter()[8], 10.0);
    }

    #[test]
    fn test_invalid_num_bits() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let err = ArbiterPuf::new(0, 0.0, 1.0, &mut rng).unwrap_err();
        assert!(matches!(err, PufError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_invalid_distribution() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        assert!(ArbiterPuf::new(8, 0.0, -1.0, &mut rng).is_err());
        assert!(ArbiterPuf::new(8, 0.0, -1e-12, &mut rng).is_err());
        assert!(ArbiterPuf::new(8, 0.0, f64::NAN, &mut rng).is_err());
        assert!(ArbiterPuf::new(8, 0.0, f64::INFINITY, &mut rng).is_err());
        assert!(ArbiterPuf::new(8, f64::NAN, 1.0, &mut rng).is_err());
    }

    #[test]
    fn test_invalid_delay_profile() {
        assert!(ArbiterPuf::from_delays(array![1.0, 2.0, 3.0]).is_err());
        assert!(ArbiterPuf::from_delays(Array1::zeros(0)).is_err());
        assert!(ArbiterPuf::from_delays(array![f64::NAN, 0.0]).is_err());
        assert!(ArbiterPuf::from_delays(array![0.0, 1.0, f64::NEG_INFINITY, 2.0]).is_err());
    }

    #[test]
    fn test_negative_stdev_rejected_by_composites() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let xor = crate::xor::XorArbiterPuf::new(
            8,
            2,
            crate::xor::ChallengeStrategy::Equal,
            0.0,
            -1.0,
            &mut rng,
        );
        assert!(matches!(xor, Err(PufError::InvalidConfiguration(_))));
        let bent = crate::bent::BentArbiterPuf::new(8, 2, 0.0, -1.0, &mut rng);
        assert!(matches!(bent, Err(PufError::InvalidConfiguration(_))));
        let config = PufConfig {
            stdev: -2.0,
            ..PufConfig::new(1)
        };
        assert!(ArbiterPuf::from_config(&config).is_err());
    }

    #[test]
    #[should_panic(expected = "feature matrix has")]
    fn test_response_rejects_wrong_shape() {
        let puf = zero_puf(4);
        puf.response(&Array2::ones((3, 2)));
    }
}
