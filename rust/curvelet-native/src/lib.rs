//! The native side of the curvelet bridge.
//!
//! [`CurveletLibrary`] mirrors the entry points of a separately compiled curvelet
//! library: a parameter query, a forward transform producing a ragged collection
//! of natively allocated containers, and an inverse transform consuming one.
//! Two implementations are provided:
//!
//! - [`BlockPartition`], a pure-Rust reference backend that honors the native
//!   contract (validation, angle counts, heap ownership of every output) with an
//!   exactly invertible partition in place of the curvelet kernels;
//! - `CurveLab` (feature `curvelab`), the fast discrete curvelet transform by
//!   wrapping, reached through a small C++ shim.

pub mod error;
pub mod geometry;
pub mod library;
pub mod params;
pub mod reference;

#[cfg(feature = "curvelab")]
pub mod ffi;

pub use error::NativeError;
pub use geometry::{BoundaryMode, Geometry};
pub use library::CurveletLibrary;
pub use params::RawParams;
pub use reference::BlockPartition;

#[cfg(feature = "curvelab")]
pub use ffi::CurveLab;
