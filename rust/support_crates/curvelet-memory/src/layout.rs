//! Axis-order conventions and the pure-metadata conversions between them.
//!
//! Callers use row-major (last axis fastest) arrays; the native library uses
//! column-major (first axis fastest) containers. A row-major buffer with shape
//! `(a, b, c)` is, byte for byte, a column-major buffer with extents `(c, b, a)`,
//! so switching conventions only reverses the extents.

use ndarray::{ArrayBase, Data, Dimension};

/// Memory order of a contiguous buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Last axis fastest ("C" order). The caller-facing convention.
    RowMajor,
    /// First axis fastest ("Fortran" order). The native convention.
    ColumnMajor,
}

impl Layout {
    /// Detects the layout of an ndarray array or view.
    ///
    /// Returns `None` for arrays that are contiguous in neither order (sliced with
    /// steps, permuted axes of a larger array, etc.). Arrays that are contiguous
    /// in both orders (one non-unit axis at most) report `RowMajor`.
    pub fn of<S, D>(array: &ArrayBase<S, D>) -> Option<Layout>
    where
        S: Data,
        D: Dimension,
    {
        if array.is_standard_layout() {
            Some(Layout::RowMajor)
        } else if array.t().is_standard_layout() {
            Some(Layout::ColumnMajor)
        } else {
            None
        }
    }

    /// The layout that reads the same memory once the axis order is reversed.
    pub fn transposed(self) -> Layout {
        match self {
            Layout::RowMajor => Layout::ColumnMajor,
            Layout::ColumnMajor => Layout::RowMajor,
        }
    }
}

/// Returns `dim` with its axes in reverse order.
pub fn reversed<D: Dimension>(dim: &D) -> D {
    let mut rev = dim.clone();
    rev.slice_mut().reverse();
    rev
}

/// Element strides of a row-major buffer of the given shape.
pub fn row_major_strides<D: Dimension>(shape: &D) -> D {
    let mut strides = shape.clone();
    let mut acc = 1usize;
    for (stride, &extent) in strides.slice_mut().iter_mut().zip(shape.slice()).rev() {
        *stride = acc;
        acc = acc.saturating_mul(extent);
    }
    strides
}

/// Element strides of a column-major buffer of the given extents.
pub fn column_major_strides<D: Dimension>(extents: &D) -> D {
    let mut strides = extents.clone();
    let mut acc = 1usize;
    for (stride, &extent) in strides.slice_mut().iter_mut().zip(extents.slice()) {
        *stride = acc;
        acc = acc.saturating_mul(extent);
    }
    strides
}

/// Linear offset of `index` in a column-major buffer with the given extents,
/// or `None` if the index is out of bounds.
pub fn column_major_offset(extents: &[usize], index: &[usize]) -> Option<usize> {
    if extents.len() != index.len() {
        return None;
    }
    let mut offset = 0usize;
    let mut stride = 1usize;
    for (&extent, &i) in extents.iter().zip(index) {
        if i >= extent {
            return None;
        }
        offset += i * stride;
        stride *= extent;
    }
    Some(offset)
}
