//! Presenting a caller array to the native library.

use curvelet_common::{Result, error::Error};
use curvelet_memory::{Complex64, Layout, NativeArray, layout::reversed};
use ndarray::{ArrayView, CowArray, Dimension};

/// A caller array, seen by the native library as a borrowed column-major
/// container.
///
/// A row-major array of shape `(a, b, c)` occupies exactly the memory of a
/// column-major container with extents `(c, b, a)`, so the view only reverses
/// the extents and points the native handle at the caller's data.
///
/// Arrays that are not row-major contiguous (column-major, sliced with steps,
/// axes permuted) cannot be reinterpreted that way and are copied once into a
/// row-major buffer owned by the view. This is the only place the bridge copies
/// data without being asked to; [`is_zero_copy`](Self::is_zero_copy) reports
/// which path was taken and the copy is logged at debug level.
///
/// The native handle never frees anything. When the view is dropped the handle
/// is unbound (zero extents, null data) before it is destroyed.
pub struct InputView<'a, D: Dimension> {
    data: CowArray<'a, Complex64, D>,
    handle: NativeArray<D>,
}

impl<'a, D: Dimension> InputView<'a, D> {
    /// Wraps `array`, which may have any rank.
    ///
    /// Fails with `EmptyBuffer` if the array has no elements, and with
    /// `RankMismatch` if its rank is not the rank of `D`.
    pub fn new<E: Dimension>(array: ArrayView<'a, Complex64, E>) -> Result<Self> {
        if array.is_empty() {
            return Err(Error::empty_buffer());
        }
        let ndim = array.ndim();
        let array = array
            .into_dimensionality::<D>()
            .map_err(|_| Error::rank_mismatch(D::NDIM.unwrap_or(ndim), ndim))?;
        let data = reconcile(array, "input");
        let native_dims = reversed(&data.raw_dim());
        let handle = unsafe { NativeArray::borrowed(native_dims, data.as_ptr()) };
        Ok(InputView { data, handle })
    }

    /// `true` if the native handle aliases the caller's own memory.
    #[inline]
    pub fn is_zero_copy(&self) -> bool {
        self.data.is_view()
    }

    /// The borrowed native handle.
    #[inline]
    pub fn handle(&self) -> &NativeArray<D> {
        &self.handle
    }

    /// Caller-order shape.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}

impl<D: Dimension> Drop for InputView<'_, D> {
    fn drop(&mut self) {
        self.handle.unbind();
    }
}

/// Returns `array` itself when it is row-major contiguous, or a row-major copy.
pub(crate) fn reconcile<'a, D: Dimension>(
    array: ArrayView<'a, Complex64, D>,
    what: &str,
) -> CowArray<'a, Complex64, D> {
    if array.is_standard_layout() {
        return CowArray::from(array);
    }
    log::debug!(
        "{what} of shape {:?} is not row-major contiguous ({:?}); copying {} elements",
        array.shape(),
        Layout::of(&array),
        array.len()
    );
    CowArray::from(array.as_standard_layout().into_owned())
}

#[cfg(test)]
mod tests {
    use curvelet_memory::{BufferState, Ownership};
    use ndarray::{Array1, Array2, Array3, Ix2, Ix3, ShapeBuilder, arr2, s};

    use super::*;
    use curvelet_common::error::ErrorKind;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn test_row_major_input_is_aliased() {
        let a = arr2(&[[c(1.0), c(2.0), c(3.0)], [c(4.0), c(5.0), c(6.0)]]);
        let view = InputView::<Ix2>::new(a.view()).unwrap();
        assert!(view.is_zero_copy());
        let handle = view.handle();
        assert_eq!(handle.as_ptr(), a.as_ptr());
        assert_eq!(handle.dims(), &Ix2(3, 2));
        assert_eq!(handle.ownership(), Some(Ownership::Borrowed));
        assert_eq!(handle.get(&[0, 0]), Some(c(1.0)));
        assert_eq!(handle.get(&[1, 0]), Some(c(2.0)));
        assert_eq!(handle.get(&[0, 1]), Some(c(4.0)));
        assert_eq!(view.shape(), &[2, 3]);
    }

    #[test]
    fn test_column_major_input_is_copied() {
        let a = Array2::from_shape_fn((3, 4).f(), |(i, j)| c((i * 4 + j) as f64));
        let view = InputView::<Ix2>::new(a.view()).unwrap();
        assert!(!view.is_zero_copy());
        assert_ne!(view.handle().as_ptr(), a.as_ptr());
        assert_eq!(view.handle().dims(), &Ix2(4, 3));
        // Native (j, i) is caller (i, j).
        assert_eq!(view.handle().get(&[3, 2]), Some(c(11.0)));
    }

    #[test]
    fn test_stepped_slice_is_copied() {
        let a = Array3::from_shape_fn((4, 5, 6), |(i, j, k)| c((i * 100 + j * 10 + k) as f64));
        let sliced = a.slice(s![.., 1..4, ..;2]);
        let view = InputView::<Ix3>::new(sliced).unwrap();
        assert!(!view.is_zero_copy());
        assert_eq!(view.shape(), &[4, 3, 3]);
        assert_eq!(view.handle().get(&[2, 0, 3]), Some(c(314.0)));
    }

    #[test]
    fn test_rank_and_empty_errors() {
        let v = Array1::from_elem(8, c(1.0));
        let err = InputView::<Ix2>::new(v.view()).err().unwrap();
        assert!(matches!(
            err.kind(),
            ErrorKind::RankMismatch {
                expected: 2,
                actual: 1
            }
        ));

        let empty = Array2::<Complex64>::zeros((0, 4));
        let err = InputView::<Ix2>::new(empty.view()).err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::EmptyBuffer));

        // Emptiness is reported before the rank.
        let empty = Array1::<Complex64>::zeros(0);
        let err = InputView::<Ix2>::new(empty.view()).err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::EmptyBuffer));
    }

    #[test]
    fn test_drop_unbinds() {
        let a = Array2::from_elem((2, 2), c(1.0));
        let view = InputView::<Ix2>::new(a.view()).unwrap();
        assert_eq!(view.handle().state(), BufferState::Borrowed);
        drop(view);
        assert_eq!(a[[1, 1]], c(1.0));
    }
}
