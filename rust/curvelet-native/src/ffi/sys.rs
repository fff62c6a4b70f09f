//! Raw declarations of the C++ shim in `cpp/shim.h`.

use std::ffi::{c_char, c_int};

use num_complex::Complex64;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CbLeaf {
    pub dims: [c_int; 3],
    pub data: *mut Complex64,
}

#[repr(C)]
#[derive(Debug)]
pub struct CbRagged {
    pub nbscales: c_int,
    pub nbangles: *mut c_int,
    pub leaves: *mut CbLeaf,
}

impl Default for CbRagged {
    fn default() -> Self {
        CbRagged {
            nbscales: 0,
            nbangles: std::ptr::null_mut(),
            leaves: std::ptr::null_mut(),
        }
    }
}

#[repr(C)]
#[derive(Debug)]
pub struct CbParams {
    pub nbscales: c_int,
    pub nbangles: *mut c_int,
    pub nleaves: c_int,
    pub sizes: [*mut c_int; 3],
    pub frequencies: [*mut f64; 3],
    pub spacings: [*mut f64; 3],
}

impl Default for CbParams {
    fn default() -> Self {
        CbParams {
            nbscales: 0,
            nbangles: std::ptr::null_mut(),
            nleaves: 0,
            sizes: [std::ptr::null_mut(); 3],
            frequencies: [std::ptr::null_mut(); 3],
            spacings: [std::ptr::null_mut(); 3],
        }
    }
}

unsafe extern "C" {
    pub fn cb_alloc(len: usize) -> *mut Complex64;
    pub fn cb_release(data: *mut Complex64);
    pub fn cb_ragged_free(ragged: *mut CbRagged);
    pub fn cb_params_free(params: *mut CbParams);

    pub fn cb_fdct2d_param(
        m: c_int,
        n: c_int,
        nbscales: c_int,
        nbangles_coarse: c_int,
        ac: c_int,
        out: *mut CbParams,
        err: *mut c_char,
        errlen: usize,
    ) -> c_int;
    pub fn cb_fdct2d_forward(
        m: c_int,
        n: c_int,
        nbscales: c_int,
        nbangles_coarse: c_int,
        ac: c_int,
        x: *const Complex64,
        out: *mut CbRagged,
        err: *mut c_char,
        errlen: usize,
    ) -> c_int;
    pub fn cb_fdct2d_inverse(
        m: c_int,
        n: c_int,
        nbscales: c_int,
        nbangles_coarse: c_int,
        ac: c_int,
        c: *const CbRagged,
        out: *mut *mut Complex64,
        err: *mut c_char,
        errlen: usize,
    ) -> c_int;

    pub fn cb_fdct3d_param(
        m: c_int,
        n: c_int,
        p: c_int,
        nbscales: c_int,
        nbangles_coarse: c_int,
        ac: c_int,
        out: *mut CbParams,
        err: *mut c_char,
        errlen: usize,
    ) -> c_int;
    pub fn cb_fdct3d_forward(
        m: c_int,
        n: c_int,
        p: c_int,
        nbscales: c_int,
        nbangles_coarse: c_int,
        ac: c_int,
        x: *const Complex64,
        out: *mut CbRagged,
        err: *mut c_char,
        errlen: usize,
    ) -> c_int;
    pub fn cb_fdct3d_inverse(
        m: c_int,
        n: c_int,
        p: c_int,
        nbscales: c_int,
        nbangles_coarse: c_int,
        ac: c_int,
        c: *const CbRagged,
        out: *mut *mut Complex64,
        err: *mut c_char,
        errlen: usize,
    ) -> c_int;
}
