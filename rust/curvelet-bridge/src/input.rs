//! Presenting a caller ragged collection to the native inverse transform.

use std::ffi::c_int;

use curvelet_common::{Result, error::Error};
use curvelet_memory::{CoeffSource, Complex64, NativeArray, NativeRagged, layout::reversed};
use curvelet_ragged::RaggedCollection;
use ndarray::{CowArray, Dimension};

use crate::view::reconcile;

/// Borrowed native handles over every leaf of a caller ragged collection.
///
/// Each handle aliases its leaf with the leaf's own shape reversed. Leaves that
/// are not row-major contiguous are copied first, like single inputs in
/// [`InputView`](crate::InputView). Only the number of scales is checked here:
/// the leaf shapes must be the ones the parameter query reports, which the
/// native library does not verify.
pub struct RaggedInputView<'a, D: Dimension> {
    leaves: Vec<CowArray<'a, Complex64, D>>,
    handles: NativeRagged<D>,
}

impl<'a, D: Dimension> RaggedInputView<'a, D> {
    /// Fails with `ScaleCountMismatch` if `coeffs` does not have `nbscales` scales.
    pub fn new<T>(coeffs: &'a RaggedCollection<T>, nbscales: c_int) -> Result<Self>
    where
        T: CoeffSource<D>,
    {
        if i64::from(nbscales) != coeffs.scale_count() as i64 {
            return Err(Error::scale_count_mismatch(
                i64::from(nbscales),
                coeffs.scale_count(),
            ));
        }
        let leaves: Vec<_> = coeffs
            .iter()
            .map(|leaf| reconcile(leaf.coeff_view(), "coefficient band"))
            .collect();
        let mut handles = Vec::with_capacity(coeffs.scale_count());
        let mut next = leaves.iter();
        for angles in coeffs.scales() {
            let scale = next
                .by_ref()
                .take(angles.len())
                .map(|leaf| unsafe {
                    NativeArray::borrowed(reversed(&leaf.raw_dim()), leaf.as_ptr())
                })
                .collect();
            handles.push(scale);
        }
        Ok(RaggedInputView { leaves, handles })
    }

    /// The borrowed handles, `[scale][angle]`.
    #[inline]
    pub fn handles(&self) -> &NativeRagged<D> {
        &self.handles
    }

    /// Number of leaves that had to be copied.
    pub fn copied_leaves(&self) -> usize {
        self.leaves.iter().filter(|leaf| !leaf.is_view()).count()
    }
}

impl<D: Dimension> Drop for RaggedInputView<'_, D> {
    fn drop(&mut self) {
        for handle in self.handles.iter_mut().flatten() {
            handle.unbind();
        }
    }
}
