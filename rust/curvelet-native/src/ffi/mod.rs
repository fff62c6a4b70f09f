//! CurveLab bindings, through the C++ shim in `cpp/`.
//!
//! The shim hands every output container over as a raw `new[]` region; each one is
//! wrapped in a natively owned [`NativeArray`] on [`CurveLabHeap`] before anything
//! else happens, so that a failure half way through a ragged collection still
//! releases every region exactly once.

mod sys;

use std::{
    ffi::{CStr, c_char, c_int},
    sync::Arc,
};

use curvelet_memory::{Complex64, NativeArray, NativeHeap, NativeHeapRef, NativeRagged};
use ndarray::{Dimension, Ix2, Ix3};

use crate::{error::NativeError, geometry::Geometry, library::CurveletLibrary, params::RawParams};

use sys::{CbLeaf, CbParams, CbRagged};

const ERROR_LEN: usize = 512;

/// The heap CurveLab allocates its containers on (`new[]` / `delete[]`).
#[derive(Debug, Default, Clone, Copy)]
pub struct CurveLabHeap;

unsafe impl NativeHeap for CurveLabHeap {
    fn allocate(&self, len: usize) -> *mut Complex64 {
        unsafe { sys::cb_alloc(len) }
    }

    unsafe fn release(&self, ptr: *mut Complex64, _len: usize) {
        unsafe { sys::cb_release(ptr) }
    }

    fn name(&self) -> &str {
        "curvelab"
    }
}

/// CurveLab's fast discrete curvelet transforms: wrapping in 2-D, `fdct3d` in 3-D.
///
/// CurveLab keeps process-wide FFT plans; calls must be serialized by the caller.
#[derive(Clone)]
pub struct CurveLab {
    heap: NativeHeapRef,
}

impl CurveLab {
    pub fn new() -> CurveLab {
        CurveLab {
            heap: Arc::new(CurveLabHeap),
        }
    }
}

impl Default for CurveLab {
    fn default() -> Self {
        CurveLab::new()
    }
}

impl std::fmt::Debug for CurveLab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurveLab").finish_non_exhaustive()
    }
}

/// Runs a shim entry point, turning a non-zero status into an error carrying the
/// message the shim wrote.
fn call(f: impl FnOnce(*mut c_char, usize) -> c_int) -> Result<(), NativeError> {
    let mut message = [0 as c_char; ERROR_LEN];
    if f(message.as_mut_ptr(), ERROR_LEN) == 0 {
        return Ok(());
    }
    let message = unsafe { CStr::from_ptr(message.as_ptr()) };
    Err(NativeError::failed(format!(
        "CurveLab: {}",
        message.to_string_lossy()
    )))
}

fn checked_dims(dims: &[c_int], rank: usize, geometry: &Geometry) -> Result<(), NativeError> {
    geometry.check(dims)?;
    if dims.len() != rank {
        return Err(NativeError::invalid_geometry(format!(
            "expected {rank} dimensions, got {}",
            dims.len()
        )));
    }
    Ok(())
}

fn native_ints<D: Dimension>(dims: &D) -> Result<Vec<c_int>, NativeError> {
    dims.slice()
        .iter()
        .map(|&e| {
            c_int::try_from(e).map_err(|_| {
                NativeError::invalid_geometry(format!("extent {e} exceeds native int"))
            })
        })
        .collect()
}

struct ParamsGuard(CbParams);

impl Drop for ParamsGuard {
    fn drop(&mut self) {
        unsafe { sys::cb_params_free(&mut self.0) };
    }
}

/// Frees the index arrays of a shim ragged collection, never the leaves.
struct RaggedGuard(CbRagged);

impl Drop for RaggedGuard {
    fn drop(&mut self) {
        unsafe { sys::cb_ragged_free(&mut self.0) };
    }
}

/// # Safety
///
/// `flat` must be null or valid for `counts.iter().sum()` reads.
unsafe fn unflatten<T: Copy>(flat: *const T, counts: &[usize]) -> Vec<Vec<T>> {
    if flat.is_null() {
        return Vec::new();
    }
    let total = counts.iter().sum();
    let mut values = unsafe { std::slice::from_raw_parts(flat, total) }.iter().copied();
    counts
        .iter()
        .map(|&n| values.by_ref().take(n).collect())
        .collect()
}

/// # Safety
///
/// `params` must have been filled in by a successful shim parameter query.
unsafe fn read_params(params: &CbParams, rank: usize) -> RawParams {
    let counts: Vec<usize> =
        unsafe { std::slice::from_raw_parts(params.nbangles, params.nbscales as usize) }
            .iter()
            .map(|&n| n as usize)
            .collect();
    let mut raw = RawParams::default();
    for axis in 0..rank {
        raw.sizes.push(unsafe { unflatten(params.sizes[axis], &counts) });
        raw.frequencies
            .push(unsafe { unflatten(params.frequencies[axis], &counts) });
        if !params.spacings[axis].is_null() {
            raw.spacings
                .push(unsafe { unflatten(params.spacings[axis], &counts) });
        }
    }
    raw
}

/// Wraps every leaf of a shim ragged collection in a natively owned handle.
///
/// # Safety
///
/// `raw` must have been filled in by a successful shim forward call, and its
/// leaves must not have been wrapped before.
unsafe fn take_ragged<D: Dimension>(
    heap: &NativeHeapRef,
    raw: &CbRagged,
    make_dim: impl Fn(&[c_int; 3]) -> D,
) -> NativeRagged<D> {
    let counts = unsafe { std::slice::from_raw_parts(raw.nbangles, raw.nbscales as usize) };
    let total: usize = counts.iter().map(|&n| n as usize).sum();
    let leaves = unsafe { std::slice::from_raw_parts(raw.leaves, total) };
    let mut leaves = leaves.iter();
    counts
        .iter()
        .map(|&n| {
            leaves
                .by_ref()
                .take(n as usize)
                .map(|leaf| unsafe {
                    NativeArray::from_native_raw(heap.clone(), make_dim(&leaf.dims), leaf.data)
                })
                .collect()
        })
        .collect()
}

/// Index arrays describing a ragged collection of borrowed handles.
struct BorrowedRagged {
    counts: Vec<c_int>,
    leaves: Vec<CbLeaf>,
}

impl BorrowedRagged {
    fn new<D: Dimension>(coeffs: &NativeRagged<D>) -> BorrowedRagged {
        let counts = coeffs.iter().map(|angles| angles.len() as c_int).collect();
        let leaves = coeffs
            .iter()
            .flatten()
            .map(|leaf| {
                let mut dims = [1 as c_int; 3];
                for (d, &e) in dims.iter_mut().zip(leaf.dims().slice()) {
                    *d = e as c_int;
                }
                CbLeaf {
                    dims,
                    data: leaf.as_ptr() as *mut Complex64,
                }
            })
            .collect();
        BorrowedRagged { counts, leaves }
    }

    fn raw(&mut self) -> CbRagged {
        CbRagged {
            nbscales: self.counts.len() as c_int,
            nbangles: self.counts.as_mut_ptr(),
            leaves: self.leaves.as_mut_ptr(),
        }
    }
}

impl CurveletLibrary<Ix2> for CurveLab {
    fn heap(&self) -> &NativeHeapRef {
        &self.heap
    }

    fn name(&self) -> &str {
        "curvelab"
    }

    fn param(&self, dims: &[c_int], geometry: &Geometry) -> Result<RawParams, NativeError> {
        checked_dims(dims, 2, geometry)?;
        let mut params = ParamsGuard(CbParams::default());
        call(|err, len| unsafe {
            sys::cb_fdct2d_param(
                dims[0],
                dims[1],
                geometry.nbscales,
                geometry.nbangles_coarse,
                geometry.boundary.as_flag(),
                &mut params.0,
                err,
                len,
            )
        })?;
        Ok(unsafe { read_params(&params.0, 2) })
    }

    fn forward(
        &self,
        geometry: &Geometry,
        input: &NativeArray<Ix2>,
    ) -> Result<NativeRagged<Ix2>, NativeError> {
        let dims = native_ints(input.dims())?;
        checked_dims(&dims, 2, geometry)?;
        let mut raw = RaggedGuard(CbRagged::default());
        call(|err, len| unsafe {
            sys::cb_fdct2d_forward(
                dims[0],
                dims[1],
                geometry.nbscales,
                geometry.nbangles_coarse,
                geometry.boundary.as_flag(),
                input.as_ptr(),
                &mut raw.0,
                err,
                len,
            )
        })?;
        Ok(unsafe {
            take_ragged(&self.heap, &raw.0, |d| Ix2(d[0] as usize, d[1] as usize))
        })
    }

    fn inverse(
        &self,
        dims: &[c_int],
        geometry: &Geometry,
        coeffs: &NativeRagged<Ix2>,
    ) -> Result<NativeArray<Ix2>, NativeError> {
        checked_dims(dims, 2, geometry)?;
        let mut borrowed = BorrowedRagged::new(coeffs);
        let raw = borrowed.raw();
        let mut out: *mut Complex64 = std::ptr::null_mut();
        call(|err, len| unsafe {
            sys::cb_fdct2d_inverse(
                dims[0],
                dims[1],
                geometry.nbscales,
                geometry.nbangles_coarse,
                geometry.boundary.as_flag(),
                &raw,
                &mut out,
                err,
                len,
            )
        })?;
        let dim = Ix2(dims[0] as usize, dims[1] as usize);
        Ok(unsafe { NativeArray::from_native_raw(self.heap.clone(), dim, out) })
    }
}

impl CurveletLibrary<Ix3> for CurveLab {
    fn heap(&self) -> &NativeHeapRef {
        &self.heap
    }

    fn name(&self) -> &str {
        "curvelab"
    }

    fn param(&self, dims: &[c_int], geometry: &Geometry) -> Result<RawParams, NativeError> {
        checked_dims(dims, 3, geometry)?;
        let mut params = ParamsGuard(CbParams::default());
        call(|err, len| unsafe {
            sys::cb_fdct3d_param(
                dims[0],
                dims[1],
                dims[2],
                geometry.nbscales,
                geometry.nbangles_coarse,
                geometry.boundary.as_flag(),
                &mut params.0,
                err,
                len,
            )
        })?;
        Ok(unsafe { read_params(&params.0, 3) })
    }

    fn forward(
        &self,
        geometry: &Geometry,
        input: &NativeArray<Ix3>,
    ) -> Result<NativeRagged<Ix3>, NativeError> {
        let dims = native_ints(input.dims())?;
        checked_dims(&dims, 3, geometry)?;
        let mut raw = RaggedGuard(CbRagged::default());
        call(|err, len| unsafe {
            sys::cb_fdct3d_forward(
                dims[0],
                dims[1],
                dims[2],
                geometry.nbscales,
                geometry.nbangles_coarse,
                geometry.boundary.as_flag(),
                input.as_ptr(),
                &mut raw.0,
                err,
                len,
            )
        })?;
        Ok(unsafe {
            take_ragged(&self.heap, &raw.0, |d| {
                Ix3(d[0] as usize, d[1] as usize, d[2] as usize)
            })
        })
    }

    fn inverse(
        &self,
        dims: &[c_int],
        geometry: &Geometry,
        coeffs: &NativeRagged<Ix3>,
    ) -> Result<NativeArray<Ix3>, NativeError> {
        checked_dims(dims, 3, geometry)?;
        let mut borrowed = BorrowedRagged::new(coeffs);
        let raw = borrowed.raw();
        let mut out: *mut Complex64 = std::ptr::null_mut();
        call(|err, len| unsafe {
            sys::cb_fdct3d_inverse(
                dims[0],
                dims[1],
                dims[2],
                geometry.nbscales,
                geometry.nbangles_coarse,
                geometry.boundary.as_flag(),
                &raw,
                &mut out,
                err,
                len,
            )
        })?;
        let dim = Ix3(dims[0] as usize, dims[1] as usize, dims[2] as usize);
        Ok(unsafe { NativeArray::from_native_raw(self.heap.clone(), dim, out) })
    }
}
