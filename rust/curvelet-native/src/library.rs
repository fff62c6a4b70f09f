use std::ffi::c_int;

use curvelet_memory::{NativeArray, NativeHeapRef, NativeRagged};
use ndarray::Dimension;

use crate::{error::NativeError, geometry::Geometry, params::RawParams};

/// Entry points of a native curvelet library for containers of rank `D`.
///
/// All extents are in native order (first axis fastest) and all containers are
/// column-major. The library allocates every container it returns on
/// [`heap`](Self::heap) and never frees containers it was given.
pub trait CurveletLibrary<D: Dimension> {
    /// The heap output containers are allocated on.
    fn heap(&self) -> &NativeHeapRef;

    /// Short name used in log records.
    fn name(&self) -> &str {
        "native"
    }

    /// Sampling metadata for every band of the transform of an input with
    /// extents `dims`.
    fn param(&self, dims: &[c_int], geometry: &Geometry) -> Result<RawParams, NativeError>;

    /// Forward transform of `input`. Returns natively owned leaves,
    /// `[scale][angle]`.
    fn forward(
        &self,
        geometry: &Geometry,
        input: &NativeArray<D>,
    ) -> Result<NativeRagged<D>, NativeError>;

    /// Inverse transform of `coeffs` into a natively owned container with
    /// extents `dims`.
    ///
    /// Libraries are not required to check that the leaves have the shapes
    /// [`param`](Self::param) reports; feeding them anything else may read out
    /// of bounds.
    fn inverse(
        &self,
        dims: &[c_int],
        geometry: &Geometry,
        coeffs: &NativeRagged<D>,
    ) -> Result<NativeArray<D>, NativeError>;
}
