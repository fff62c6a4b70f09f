//! Native container handles: the Rust image of the native library's complex
//! matrix (`CpxNumMat`) and tensor (`CpxNumTns`) types.
//!
//! A handle is a bare `(extents, data pointer)` pair in column-major order, plus
//! the state that decides what its destruction does: a `Borrowed` handle never
//! frees anything, a `NativeOwned` one returns its region to the native heap.

use ndarray::{Dimension, Ix2, Ix3};
use num_complex::Complex64;

use crate::{
    heap::{NativeAllocation, NativeHeapRef},
    layout::column_major_offset,
    state::{BufferState, Ownership},
};

/// Complex matrix handle, extents `(m, n)`, `m` fastest.
pub type CpxNumMat = NativeArray<Ix2>;

/// Complex tensor handle, extents `(m, n, p)`, `m` fastest.
pub type CpxNumTns = NativeArray<Ix3>;

/// Native ragged collection: `[scale][angle]` leaves, as the native library
/// produces and consumes them.
pub type NativeRagged<D> = Vec<Vec<NativeArray<D>>>;

/// A column-major container handle in the native library's convention.
pub struct NativeArray<D: Dimension> {
    /// Extents, first axis fastest.
    dims: D,
    data: *mut Complex64,
    state: BufferState,
    heap: Option<NativeHeapRef>,
}

impl<D: Dimension> NativeArray<D> {
    /// An empty handle with zero extents and no data.
    pub fn unbound() -> Self {
        NativeArray {
            dims: D::zeros(D::NDIM.unwrap_or(0)),
            data: std::ptr::null_mut(),
            state: BufferState::Unbound,
            heap: None,
        }
    }

    /// A handle that aliases memory owned elsewhere.
    ///
    /// # Safety
    ///
    /// `data` must be valid for reads of `dims.size()` elements laid out
    /// column-major for as long as the handle is bound, and must not be mutated
    /// during that time.
    pub unsafe fn borrowed(dims: D, data: *const Complex64) -> Self {
        let mut state = BufferState::Unbound;
        state.advance(BufferState::Borrowed);
        NativeArray {
            dims,
            data: data as *mut Complex64,
            state,
            heap: None,
        }
    }

    /// Allocates a zeroed, natively owned container on `heap`.
    pub fn allocate(heap: &NativeHeapRef, dims: D) -> Self {
        let len = dims.size();
        let data = heap.allocate(len);
        assert!(!data.is_null(), "native heap returned null for {len} elements");
        unsafe { Self::from_native_raw(heap.clone(), dims, data) }
    }

    /// Wraps a region the native library allocated on its own.
    ///
    /// # Safety
    ///
    /// `data` must be null (only when `dims.size() == 0`) or have been returned by
    /// `heap.allocate(dims.size())`, and nothing else may release it.
    pub unsafe fn from_native_raw(heap: NativeHeapRef, dims: D, data: *mut Complex64) -> Self {
        assert!(
            !data.is_null() || dims.size() == 0,
            "null native data for extents {:?}",
            dims.slice()
        );
        let mut state = BufferState::Unbound;
        state.advance(BufferState::NativeOwned);
        NativeArray {
            dims,
            data,
            state,
            heap: Some(heap),
        }
    }

    /// Extents, first axis fastest.
    #[inline]
    pub fn dims(&self) -> &D {
        &self.dims
    }

    /// Extent along native axis `axis`.
    #[inline]
    pub fn extent(&self, axis: usize) -> usize {
        self.dims.slice()[axis]
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.dims.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn state(&self) -> BufferState {
        self.state
    }

    #[inline]
    pub fn ownership(&self) -> Option<Ownership> {
        self.state.ownership()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const Complex64 {
        self.data
    }

    /// The elements in column-major order.
    pub fn as_slice(&self) -> &[Complex64] {
        if self.data.is_null() {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.data, self.len()) }
    }

    /// Mutable access for the library that owns the container.
    ///
    /// # Panics
    ///
    /// Panics unless the handle is `NativeOwned`: borrowed caller memory is read-only.
    pub fn as_mut_slice(&mut self) -> &mut [Complex64] {
        assert_eq!(
            self.state,
            BufferState::NativeOwned,
            "only natively owned containers are writable"
        );
        if self.data.is_null() {
            return &mut [];
        }
        unsafe { std::slice::from_raw_parts_mut(self.data, self.len()) }
    }

    /// Element at a native (column-major) index.
    pub fn get(&self, index: &[usize]) -> Option<Complex64> {
        column_major_offset(self.dims.slice(), index).map(|offset| self.as_slice()[offset])
    }

    /// Detaches a borrowed handle from the memory it aliases: extents become zero
    /// and the pointer null, so dropping the handle does nothing.
    ///
    /// # Panics
    ///
    /// Panics on an owning handle, which would otherwise leak its region.
    pub fn unbind(&mut self) {
        match self.state {
            BufferState::Unbound => {}
            BufferState::Borrowed => {
                self.clear_fields();
                self.state.advance(BufferState::Unbound);
            }
            state => panic!("cannot unbind a handle in state {state:?}"),
        }
    }

    /// Moves responsibility for the region out of a natively owned handle.
    ///
    /// The handle is cleared in the same step, so that at no point do both the
    /// handle and the returned allocation consider themselves owners. Returns
    /// `None` for handles that own nothing.
    pub fn take_allocation(&mut self) -> Option<NativeAllocation> {
        if self.state != BufferState::NativeOwned {
            return None;
        }
        let heap = self.heap.take()?;
        let len = self.len();
        let data = self.data;
        self.clear_fields();
        // The buffer moves to `BridgeOwned` with the allocation; the handle is
        // left tracking nothing.
        self.state = BufferState::Unbound;
        Some(unsafe { NativeAllocation::from_raw(data, len, heap) })
    }

    fn clear_fields(&mut self) {
        self.dims = D::zeros(self.dims.ndim());
        self.data = std::ptr::null_mut();
    }
}

impl<D: Dimension> Default for NativeArray<D> {
    fn default() -> Self {
        Self::unbound()
    }
}

impl<D: Dimension> Drop for NativeArray<D> {
    fn drop(&mut self) {
        if self.state == BufferState::NativeOwned {
            // Abandoned before reaching the caller.
            drop(self.take_allocation());
        }
    }
}

impl<D: Dimension> std::fmt::Debug for NativeArray<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeArray")
            .field("dims", &self.dims.slice())
            .field("data", &self.data)
            .field("state", &self.state)
            .finish()
    }
}
