//! Handing native output over to the caller.

use curvelet_common::{Result, error::Error};
use curvelet_memory::{CoeffArray, NativeArray, NativeRagged};
use curvelet_native::NativeError;
use curvelet_ragged::RaggedCollection;
use ndarray::Dimension;

/// Turns one natively owned container into a caller-owned array.
///
/// The container's region moves into a one-shot release owner and the native
/// handle is cleared in the same step; the returned array presents the region
/// in caller axis order (native extents reversed) with row-major strides.
pub fn wrap_output<D: Dimension>(mut native: NativeArray<D>) -> Result<CoeffArray<D>> {
    let dims = native.dims().clone();
    let allocation = native.take_allocation().ok_or_else(|| {
        Error::native(
            "output",
            NativeError::failed(format!(
                "output container in state {:?} is not natively owned",
                native.state()
            )),
        )
    })?;
    Ok(CoeffArray::from_allocation(allocation, &dims))
}

/// Drains a native ragged collection into caller-owned arrays, scale-major and
/// angle-minor.
///
/// If a leaf cannot be handed over, the leaves already wrapped are released by
/// their arrays and the remaining ones by their native handles.
pub fn drain<D: Dimension>(native: NativeRagged<D>) -> Result<RaggedCollection<CoeffArray<D>>> {
    let mut coeffs = RaggedCollection::with_scale_capacity(native.len());
    for (scale, angles) in native.into_iter().enumerate() {
        let mut wrapped = Vec::with_capacity(angles.len());
        for (angle, leaf) in angles.into_iter().enumerate() {
            let array = wrap_output(leaf)?;
            log::trace!(
                "band ({scale}, {angle}): {:?} at {:p} handed to caller",
                array.shape(),
                array.as_ptr()
            );
            wrapped.push(array);
        }
        coeffs.push_scale(wrapped);
    }
    Ok(coeffs)
}
