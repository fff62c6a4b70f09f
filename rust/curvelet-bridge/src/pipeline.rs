//! The transform pipeline shared by the 2-D and 3-D families.
//!
//! Every function is generic over the container rank `D` and the library `L`;
//! [`fdct2d`](crate::fdct2d) and [`fdct3d`](crate::fdct3d) fix `D`.

use std::ffi::c_int;

use curvelet_common::{Result, error::Error};
use curvelet_memory::{CoeffArray, CoeffSource, Complex64};
use curvelet_native::{CurveletLibrary, Geometry, NativeError};
use curvelet_ragged::RaggedCollection;
use ndarray::{AsArray, Dimension};

use crate::{input::RaggedInputView, output, param::TransformParameters, view::InputView};

/// Maps a native failure into the bridge error, keeping geometry rejections
/// distinguishable.
pub(crate) fn from_native(operation: &str, err: NativeError) -> Error {
    match err {
        NativeError::InvalidGeometry(message) => Error::invalid_geometry(message),
        other => Error::native(operation, other),
    }
}

/// Checks the rank of caller-order `dims` and converts them to native order.
fn native_dims<D: Dimension>(dims: &[usize]) -> Result<Vec<c_int>> {
    if let Some(ndim) = D::NDIM {
        if dims.len() != ndim {
            return Err(Error::rank_mismatch(ndim, dims.len()));
        }
    }
    dims.iter()
        .rev()
        .map(|&d| {
            c_int::try_from(d)
                .map_err(|_| Error::invalid_geometry(format!("dimension {d} exceeds native int")))
        })
        .collect()
}

/// Sampling metadata of every band for an input with caller-order extents `dims`.
pub fn param_query<D, L>(
    lib: &L,
    dims: &[usize],
    geometry: &Geometry,
) -> Result<TransformParameters>
where
    D: Dimension,
    L: CurveletLibrary<D> + ?Sized,
{
    let native = native_dims::<D>(dims)?;
    let raw = lib
        .param(&native, geometry)
        .map_err(|e| from_native("param", e))?;
    let params = TransformParameters::from_raw(dims, geometry, raw)?;
    log::debug!(
        "{}: parameters for {:?}, {} scales, angles {:?}",
        lib.name(),
        dims,
        params.scale_count(),
        params.angle_counts()
    );
    Ok(params)
}

/// Forward transform of `input`, which may be any array or view of any rank.
///
/// Fails with `EmptyBuffer` for an empty input, `RankMismatch` when the rank is
/// not the rank of `D`, and `InvalidGeometry` when the library rejects the
/// geometry. The result has one entry per scale and, in each, one array per
/// angle, each aliasing memory the library allocated.
pub fn forward<'a, D, L, E>(
    lib: &L,
    geometry: &Geometry,
    input: impl AsArray<'a, Complex64, E>,
) -> Result<RaggedCollection<CoeffArray<D>>>
where
    D: Dimension,
    E: Dimension,
    L: CurveletLibrary<D> + ?Sized,
{
    let view = InputView::<D>::new(input.into())?;
    log::debug!(
        "{}: forward {:?} with {:?} ({})",
        lib.name(),
        view.shape(),
        geometry,
        if view.is_zero_copy() { "zero-copy" } else { "copied" }
    );
    let native = lib
        .forward(geometry, view.handle())
        .map_err(|e| from_native("forward", e))?;
    drop(view);
    output::drain(native)
}

/// Inverse transform of `coeffs` into an array with caller-order extents `dims`.
///
/// The coefficients are checked against [`param_query`] first: wrong scale
/// count (`ScaleCountMismatch`), angle count (`AngleCountMismatch`) or band
/// shape (`ShapeMismatch`) never reach the library.
pub fn inverse<D, L, T>(
    lib: &L,
    dims: &[usize],
    geometry: &Geometry,
    coeffs: &RaggedCollection<T>,
) -> Result<CoeffArray<D>>
where
    D: Dimension,
    L: CurveletLibrary<D> + ?Sized,
    T: CoeffSource<D>,
{
    check_scale_count(geometry, coeffs)?;
    let params = param_query(lib, dims, geometry)?;
    for (scale, angles) in coeffs.scales().enumerate() {
        let expected = params.angle_count(scale);
        if angles.len() != expected {
            return Err(Error::angle_count_mismatch(scale, expected, angles.len()));
        }
        for (angle, leaf) in angles.iter().enumerate() {
            let view = leaf.coeff_view();
            let expected = params.band_shape(scale, angle).unwrap_or_default();
            if view.shape() != expected.as_slice() {
                return Err(Error::shape_mismatch(scale, angle, expected, view.shape()));
            }
        }
    }
    // SAFETY: every band has the shape the parameter query reports.
    unsafe { inverse_unchecked(lib, dims, geometry, coeffs) }
}

/// Inverse transform without checking the coefficients against the parameter
/// query. Only the number of scales is verified (`ScaleCountMismatch`).
///
/// # Safety
///
/// Every band must have exactly the caller-order shape
/// [`TransformParameters::band_shape`] reports for `dims` and `geometry`, and
/// every scale the reported number of angles. The native library reads the
/// bands using those shapes; anything else is undefined behavior.
pub unsafe fn inverse_unchecked<D, L, T>(
    lib: &L,
    dims: &[usize],
    geometry: &Geometry,
    coeffs: &RaggedCollection<T>,
) -> Result<CoeffArray<D>>
where
    D: Dimension,
    L: CurveletLibrary<D> + ?Sized,
    T: CoeffSource<D>,
{
    let native = native_dims::<D>(dims)?;
    let view = RaggedInputView::<D>::new(coeffs, geometry.nbscales)?;
    log::debug!(
        "{}: inverse into {:?} with {:?} ({} of {} bands copied)",
        lib.name(),
        dims,
        geometry,
        view.copied_leaves(),
        coeffs.leaf_count()
    );
    let result = lib
        .inverse(&native, geometry, view.handles())
        .map_err(|e| from_native("inverse", e))?;
    drop(view);
    output::wrap_output(result)
}

fn check_scale_count<T>(geometry: &Geometry, coeffs: &RaggedCollection<T>) -> Result<()> {
    if i64::from(geometry.nbscales) != coeffs.scale_count() as i64 {
        return Err(Error::scale_count_mismatch(
            i64::from(geometry.nbscales),
            coeffs.scale_count(),
        ));
    }
    Ok(())
}
