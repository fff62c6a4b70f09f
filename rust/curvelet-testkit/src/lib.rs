//! Test utilities for the curvelet bridge crates.
//!
//! - [`CountingHeap`]: a native heap that tracks every region it hands out, for
//!   checking that each one is released exactly once;
//! - [`data_gen`]: random complex test data;
//! - [`relative_error`]: comparison of transform round trips.

pub mod data_gen;
pub mod heap;

pub use heap::CountingHeap;

use num_complex::Complex64;

/// `‖actual - expected‖₂ / ‖expected‖₂`, or the absolute error when `expected`
/// is zero.
///
/// Both sequences must have the same length.
pub fn relative_error<'a>(
    actual: impl IntoIterator<Item = &'a Complex64>,
    expected: impl IntoIterator<Item = &'a Complex64>,
) -> f64 {
    let mut diff = 0.0;
    let mut norm = 0.0;
    let mut actual = actual.into_iter();
    for e in expected {
        let a = actual.next().expect("actual is shorter than expected");
        diff += (a - e).norm_sqr();
        norm += e.norm_sqr();
    }
    assert!(actual.next().is_none(), "actual is longer than expected");
    if norm == 0.0 {
        diff.sqrt()
    } else {
        (diff / norm).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_error() {
        let expected = vec![Complex64::new(3.0, 0.0), Complex64::new(0.0, 4.0)];
        assert_eq!(relative_error(&expected, &expected), 0.0);
        let actual = vec![Complex64::new(3.0, 0.0), Complex64::new(0.0, 3.5)];
        assert!((relative_error(&actual, &expected) - 0.1).abs() < 1e-12);
        let zeros = vec![Complex64::new(0.0, 0.0); 2];
        assert_eq!(relative_error(&expected, &zeros), 5.0);
    }

    #[test]
    #[should_panic]
    fn test_length_mismatch_panics() {
        let a = vec![Complex64::new(1.0, 0.0)];
        let b = vec![Complex64::new(1.0, 0.0); 2];
        relative_error(&a, &b);
    }
}
