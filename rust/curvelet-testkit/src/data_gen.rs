//! Random complex test data.
//!
//! Every generator has a seeded variant; the unseeded ones draw a fresh seed so
//! repeated test runs cover different inputs.

use ndarray::{ArrayD, IxDyn};
use num_complex::Complex64;

/// `len` values with real and imaginary parts uniform in `[-1, 1)`.
pub fn complex_vec(len: usize) -> Vec<Complex64> {
    complex_vec_seeded(len, fastrand::u64(..))
}

pub fn complex_vec_seeded(len: usize, seed: u64) -> Vec<Complex64> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..len)
        .map(|_| Complex64::new(rng.f64() * 2.0 - 1.0, rng.f64() * 2.0 - 1.0))
        .collect()
}

/// A row-major array of the given shape filled like [`complex_vec`].
pub fn complex_array(shape: &[usize]) -> ArrayD<Complex64> {
    complex_array_seeded(shape, fastrand::u64(..))
}

pub fn complex_array_seeded(shape: &[usize], seed: u64) -> ArrayD<Complex64> {
    let len = shape.iter().product();
    ArrayD::from_shape_vec(IxDyn(shape), complex_vec_seeded(len, seed))
        .expect("shape matches the generated length")
}

/// A random shape of `ndim` extents, each in `min..=max`.
pub fn random_shape(ndim: usize, min: usize, max: usize) -> Vec<usize> {
    (0..ndim).map(|_| fastrand::usize(min..=max)).collect()
}
