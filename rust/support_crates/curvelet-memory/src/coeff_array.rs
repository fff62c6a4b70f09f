//! Caller-owned arrays that alias memory produced by the native library.

use std::{ptr::NonNull, sync::Arc};

use ndarray::{Array, ArrayBase, ArrayView, Data, Dimension, IxDyn, ShapeBuilder};
use num_complex::Complex64;

use crate::{
    heap::{MemoryAllocation, MemoryOwner, NativeAllocation},
    layout::{Layout, reversed, row_major_strides},
};

/// An immutable, row-major complex array with shared ownership of its memory.
///
/// `CoeffArray`s are returned by the forward and inverse transforms. They alias
/// the exact region the native library produced, presented with the axis order
/// reversed relative to the native container (so a native `(m, n)` matrix
/// becomes an `(n, m)` row-major array). Cloning is cheap and never copies; the
/// memory is returned to its native heap when the last clone is dropped.
#[derive(Clone)]
pub struct CoeffArray<D: Dimension> {
    ptr: NonNull<Complex64>,
    shape: D,
    strides: D,
    owner: Arc<dyn MemoryOwner + Send + Sync + 'static>,
}

// SAFETY: the memory is immutable for the lifetime of the owner, which is
// itself `Send + Sync`.
unsafe impl<D: Dimension> Send for CoeffArray<D> {}

unsafe impl<D: Dimension> Sync for CoeffArray<D> {}

impl<D: Dimension> CoeffArray<D> {
    /// Wraps a native allocation that backs a container with `native_dims`
    /// (first axis fastest). The allocation becomes caller-owned.
    ///
    /// # Panics
    ///
    /// Panics if the allocation's length differs from the number of elements
    /// described by `native_dims`.
    pub fn from_allocation(mut allocation: NativeAllocation, native_dims: &D) -> Self {
        let shape = reversed(native_dims);
        assert_eq!(
            allocation.len(),
            shape.size(),
            "native allocation does not match extents {:?}",
            native_dims.slice()
        );
        allocation.hand_to_caller();
        Self::from_owner(Arc::new(allocation), shape)
    }

    /// Takes ownership of an ndarray array. Arrays that are not in row-major
    /// layout are copied into it first.
    pub fn from_array(array: Array<Complex64, D>) -> Self {
        let array = if array.is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };
        let shape = array.raw_dim();
        let (vec, offset) = array.into_raw_vec_and_offset();
        let offset = offset.unwrap_or(0);
        let owner = Arc::new(vec);
        let MemoryAllocation { ptr, len } = owner.memory();
        debug_assert!(offset + shape.size() <= len);
        let ptr = unsafe { ptr.add(offset) };
        CoeffArray {
            ptr: NonNull::new(ptr as *mut Complex64).unwrap_or(NonNull::dangling()),
            strides: row_major_strides(&shape),
            shape,
            owner,
        }
    }

    /// Builds an array over the whole region of `owner`, with row-major `shape`.
    fn from_owner(owner: Arc<dyn MemoryOwner + Send + Sync + 'static>, shape: D) -> Self {
        let MemoryAllocation { ptr, len } = owner.memory();
        assert_eq!(len, shape.size());
        CoeffArray {
            ptr: NonNull::new(ptr as *mut Complex64).unwrap_or(NonNull::dangling()),
            strides: row_major_strides(&shape),
            shape,
            owner,
        }
    }

    /// Caller-order shape.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.shape.slice()
    }

    #[inline]
    pub fn raw_dim(&self) -> D {
        self.shape.clone()
    }

    /// Element strides matching [`shape`](Self::shape).
    #[inline]
    pub fn strides(&self) -> &[usize] {
        self.strides.slice()
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.shape.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        Layout::RowMajor
    }

    #[inline]
    pub fn as_ptr(&self) -> *const Complex64 {
        self.ptr.as_ptr()
    }

    /// The elements in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[Complex64] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len()) }
    }

    /// The raw bytes of the elements, interleaved real and imaginary `f64`s.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }

    /// Borrows the array as an ndarray view.
    pub fn view(&self) -> ArrayView<'_, Complex64, D> {
        let shape = self.shape.clone().strides(self.strides.clone());
        unsafe { ArrayView::from_shape_ptr(shape, self.ptr.as_ptr()) }
    }

    /// Copies the elements into a new ndarray array.
    pub fn to_owned(&self) -> Array<Complex64, D> {
        self.view().to_owned()
    }

    /// Number of `CoeffArray`s sharing this memory.
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.owner)
    }

    /// Converts to a dynamic-rank array sharing the same memory.
    pub fn into_dyn(self) -> CoeffArray<IxDyn> {
        CoeffArray {
            ptr: self.ptr,
            shape: self.shape.into_dyn(),
            strides: self.strides.into_dyn(),
            owner: self.owner,
        }
    }
}

impl<D: Dimension> std::fmt::Debug for CoeffArray<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoeffArray")
            .field("shape", &self.shape())
            .field("ptr", &self.ptr)
            .field("shares", &self.share_count())
            .finish()
    }
}

impl<D: Dimension> From<Array<Complex64, D>> for CoeffArray<D> {
    fn from(array: Array<Complex64, D>) -> Self {
        CoeffArray::from_array(array)
    }
}

/// Anything that can lend a caller-order view of complex coefficients.
///
/// Implemented for [`CoeffArray`] and for every ndarray array or view of
/// `Complex64`, so forward output can be fed back to the inverse transform
/// unchanged, or replaced by arrays the caller built.
pub trait CoeffSource<D: Dimension> {
    fn coeff_view(&self) -> ArrayView<'_, Complex64, D>;
}

impl<D: Dimension> CoeffSource<D> for CoeffArray<D> {
    fn coeff_view(&self) -> ArrayView<'_, Complex64, D> {
        self.view()
    }
}

impl<S, D> CoeffSource<D> for ArrayBase<S, D>
where
    S: Data<Elem = Complex64>,
    D: Dimension,
{
    fn coeff_view(&self) -> ArrayView<'_, Complex64, D> {
        self.view()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use ndarray::{Array2, Ix2, Ix3, arr2};

    use super::*;
    use crate::{
        heap::{NativeHeap, NativeHeapRef, SystemHeap},
        native_array::{CpxNumMat, CpxNumTns},
    };

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[derive(Default)]
    struct TallyHeap {
        released: AtomicUsize,
    }

    unsafe impl NativeHeap for TallyHeap {
        fn allocate(&self, len: usize) -> *mut Complex64 {
            SystemHeap.allocate(len)
        }

        unsafe fn release(&self, ptr: *mut Complex64, len: usize) {
            self.released.fetch_add(1, Ordering::SeqCst);
            unsafe { SystemHeap.release(ptr, len) }
        }
    }

    #[test]
    fn test_native_matrix_presented_transposed() {
        let heap = SystemHeap::shared();
        // Native (m, n) = (3, 2), column-major: columns [1 2 3] and [4 5 6].
        let mut mat = CpxNumMat::allocate(&heap, Ix2(3, 2));
        for (i, v) in mat.as_mut_slice().iter_mut().enumerate() {
            *v = c((i + 1) as f64);
        }
        let native_ptr = mat.as_ptr();
        let dims = *mat.dims();
        let array = CoeffArray::from_allocation(mat.take_allocation().unwrap(), &dims);

        assert_eq!(array.shape(), &[2, 3]);
        assert_eq!(array.strides(), &[3, 1]);
        assert_eq!(array.as_ptr(), native_ptr);
        let expected = arr2(&[[c(1.0), c(2.0), c(3.0)], [c(4.0), c(5.0), c(6.0)]]);
        assert_eq!(array.view(), expected);
    }

    #[test]
    fn test_tensor_axes_reversed() {
        let heap = SystemHeap::shared();
        let mut tns = CpxNumTns::allocate(&heap, Ix3(2, 3, 4));
        tns.as_mut_slice()[1 + 2 * 2 + 3 * 6] = c(7.0);
        let dims = *tns.dims();
        let array = CoeffArray::from_allocation(tns.take_allocation().unwrap(), &dims);
        assert_eq!(array.shape(), &[4, 3, 2]);
        assert_eq!(array.view()[[3, 2, 1]], c(7.0));
    }

    #[test]
    fn test_last_clone_releases() {
        let tally = Arc::new(TallyHeap::default());
        let heap: NativeHeapRef = tally.clone();
        let mut mat = CpxNumMat::allocate(&heap, Ix2(2, 2));
        let dims = *mat.dims();
        let array = CoeffArray::from_allocation(mat.take_allocation().unwrap(), &dims);
        drop(mat);
        let copy = array.clone();
        assert_eq!(copy.share_count(), 2);
        drop(array);
        assert_eq!(tally.released.load(Ordering::SeqCst), 0);
        let dynamic = copy.into_dyn();
        assert_eq!(dynamic.shape(), &[2, 2]);
        drop(dynamic);
        assert_eq!(tally.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_array_keeps_values() {
        let a = arr2(&[[c(1.0), c(2.0)], [c(3.0), c(4.0)], [c(5.0), c(6.0)]]);
        let array = CoeffArray::from_array(a.clone());
        assert_eq!(array.view(), a);
        assert_eq!(array.layout(), Layout::RowMajor);

        let f_order = Array2::from_shape_vec((2, 3).f(), a.iter().copied().collect()).unwrap();
        let array = CoeffArray::from(f_order.clone());
        assert_eq!(array.view(), f_order);
        assert_eq!(array.as_slice().len(), 6);
    }

    #[test]
    fn test_empty_array() {
        let heap = SystemHeap::shared();
        let mut mat = CpxNumMat::allocate(&heap, Ix2(4, 0));
        let dims = *mat.dims();
        let array = CoeffArray::from_allocation(mat.take_allocation().unwrap(), &dims);
        assert!(array.is_empty());
        assert_eq!(array.shape(), &[0, 4]);
        assert_eq!(array.view().len(), 0);
        assert!(array.as_bytes().is_empty());
    }

    #[test]
    fn test_coeff_source() {
        fn total<T: CoeffSource<Ix2>>(source: &T) -> Complex64 {
            source.coeff_view().sum()
        }
        let a = arr2(&[[c(1.0), c(2.0)], [c(3.0), c(4.0)]]);
        assert_eq!(total(&a), c(10.0));
        assert_eq!(total(&a.view()), c(10.0));
        assert_eq!(total(&CoeffArray::from_array(a)), c(10.0));
    }
}
