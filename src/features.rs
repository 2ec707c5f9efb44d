//! Feature transform of the linear additive delay model.
//!
//! For a challenge `c` of `N` bits the feature vector is
//!
//! ```text
//! φ[i] = Π_{j=i}^{N-1} (1 - 2·c[j])    for i in 0..N
//! φ[N] = 1                              (bias)
//! ```
//!
//! i.e. the parity sign of the challenge suffix starting at stage `i`. The
//! response of an arbiter chain is then the dot product `⟨w, φ⟩`.
//!
//! Batches are laid out column-wise: a challenge matrix has shape
//! `(N, n)` and its feature matrix `(N + 1, n)`.

use ndarray::{
    s, Array1, Array2, Array3, ArrayBase, ArrayView2, ArrayViewMut2, Axis, Data, Ix1, Ix2, Ix3,
};

/// Maps a challenge matrix `(N, n)` of 0/1 bits to its feature matrix `(N + 1, n)`.
pub fn calc_features<S>(challenges: &ArrayBase<S, Ix2>) -> Array2<f64>
where
    S: Data<Elem = u8>,
{
    let (num_bits, n) = challenges.dim();
    let mut features = Array2::ones((num_bits + 1, n));
    fill_features(challenges.view(), features.view_mut());
    features
}

/// Applies [`calc_features`] to every branch of a `(branches, N, n)` challenge tensor.
pub fn calc_branch_features<S>(challenges: &ArrayBase<S, Ix3>) -> Array3<f64>
where
    S: Data<Elem = u8>,
{
    let (branches, num_bits, n) = challenges.dim();
    let mut features = Array3::ones((branches, num_bits + 1, n));
    for (challenge, out) in challenges.outer_iter().zip(features.outer_iter_mut()) {
        fill_features(challenge, out);
    }
    features
}

/// `out` must be `(N + 1, n)` and pre-filled with ones; the bias row is left untouched.
fn fill_features(challenges: ArrayView2<'_, u8>, mut out: ArrayViewMut2<'_, f64>) {
    let num_bits = challenges.nrows();
    debug_assert_eq!(out.nrows(), num_bits + 1);

    let mut body = out.slice_mut(s![..num_bits, ..]);
    body.assign(&challenges.mapv(|bit| 1.0 - 2.0 * f64::from(bit)));

    // Suffix product: walk the stages from last to first.
    body.slice_mut(s![..;-1, ..])
        .accumulate_axis_inplace(Axis(0), |&prev, cur| *cur *= prev);
}

/// Hard decision: −1, 0 or +1.
///
/// Zero (and NaN) map to 0, unlike [`f64::signum`].
#[inline]
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Entrywise [`sign`] of a response vector.
pub fn bin_response<S>(responses: &ArrayBase<S, Ix1>) -> Array1<f64>
where
    S: Data<Elem = f64>,
{
    responses.mapv(sign)
}
