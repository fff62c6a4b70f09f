//! The 3-D curvelet transform family.
//!
//! Thin fronts over [`pipeline`](crate::pipeline) with the rank fixed to three.
//! Caller arrays of shape `(a, b, c)` are transformed as native `(c, b, a)`
//! tensors; coefficient bands come back in caller order.

use curvelet_common::Result;
use curvelet_memory::{CoeffArray, CoeffSource, Complex64};
use curvelet_native::{CurveletLibrary, Geometry};
use curvelet_ragged::RaggedCollection;
use ndarray::{AsArray, Dimension, Ix3};

use crate::{param::TransformParameters, pipeline};

/// Band shapes and sampling coordinates for a `dims = [a, b, c]` input.
pub fn param_query<L>(lib: &L, dims: &[usize], geometry: &Geometry) -> Result<TransformParameters>
where
    L: CurveletLibrary<Ix3> + ?Sized,
{
    pipeline::param_query::<Ix3, L>(lib, dims, geometry)
}

/// Forward transform of a 3-D array. Other ranks fail with `RankMismatch`.
pub fn forward<'a, L, E>(
    lib: &L,
    geometry: &Geometry,
    input: impl AsArray<'a, Complex64, E>,
) -> Result<RaggedCollection<CoeffArray<Ix3>>>
where
    L: CurveletLibrary<Ix3> + ?Sized,
    E: Dimension,
{
    pipeline::forward::<Ix3, L, E>(lib, geometry, input)
}

/// Inverse transform, with the coefficients checked against [`param_query`].
pub fn inverse<L, T>(
    lib: &L,
    dims: &[usize],
    geometry: &Geometry,
    coeffs: &RaggedCollection<T>,
) -> Result<CoeffArray<Ix3>>
where
    L: CurveletLibrary<Ix3> + ?Sized,
    T: CoeffSource<Ix3>,
{
    pipeline::inverse::<Ix3, L, T>(lib, dims, geometry, coeffs)
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
) -> Result<CoeffArray<Ix3>>
where
    L: CurveletLibrary<Ix3> + ?Sized,
    T: CoeffSource<Ix3>,
{
    unsafe { pipeline::inverse_unchecked::<Ix3, L, T>(lib, dims, geometry, coeffs) }
}
