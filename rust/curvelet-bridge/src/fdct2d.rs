//! The 2-D curvelet transform family.
//!
//! Thin fronts over [`pipeline`](crate::pipeline) with the rank fixed to two.
//! Caller arrays of shape `(rows, cols)` are transformed as native `(cols, rows)`
//! matrices; coefficient bands come back in caller order.

use curvelet_common::Result;
use curvelet_memory::{CoeffArray, CoeffSource, Complex64};
use curvelet_native::{CurveletLibrary, Geometry};
use curvelet_ragged::RaggedCollection;
use ndarray::{AsArray, Dimension, Ix2};

use crate::{param::TransformParameters, pipeline};

/// Band shapes and sampling coordinates for a `dims = [rows, cols]` input.
pub fn param_query<L>(lib: &L, dims: &[usize], geometry: &Geometry) -> Result<TransformParameters>
where
    L: CurveletLibrary<Ix2> + ?Sized,
{
    pipeline::param_query::<Ix2, L>(lib, dims, geometry)
}

/// Forward transform of a 2-D array. Other ranks fail with `RankMismatch`.
pub fn forward<'a, L, E>(
    lib: &L,
    geometry: &Geometry,
    input: impl AsArray<'a, Complex64, E>,
) -> Result<RaggedCollection<CoeffArray<Ix2>>>
where
    L: CurveletLibrary<Ix2> + ?Sized,
    E: Dimension,
{
    pipeline::forward::<Ix2, L, E>(lib, geometry, input)
}

/// Inverse transform, with the coefficients checked against [`param_query`].
pub fn inverse<L, T>(
    lib: &L,
    dims: &[usize],
    geometry: &Geometry,
    coeffs: &RaggedCollection<T>,
) -> Result<CoeffArray<Ix2>>
where
    L: CurveletLibrary<Ix2> + ?Sized,
    T: CoeffSource<Ix2>,
{
    pipeline::inverse::<Ix2, L, T>(lib, dims, geometry, coeffs)
}

/// Inverse transform without shape checks.
///
/// # Safety
///
/// See [`pipeline::inverse_unchecked`].
pub unsafe fn inverse_unchecked<L, T>(
    lib: &L,
    dims: &[usize],
    geometry: &Geometry,
    coeffs: &RaggedCollection<T>,
) -> Result<CoeffArray<Ix2>>
where
    L: CurveletLibrary<Ix2> + ?Sized,
    T: CoeffSource<Ix2>,
{
    unsafe { pipeline::inverse_unchecked::<Ix2, L, T>(lib, dims, geometry, coeffs) }
}
