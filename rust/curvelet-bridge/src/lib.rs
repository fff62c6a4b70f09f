//! Zero-copy bridge between `ndarray` and native curvelet transforms.
//!
//! The native library works on column-major containers it allocates itself and
//! returns its coefficients as a ragged `[scale][angle]` collection. This crate
//! presents caller arrays to it without copying and hands the native output back
//! as [`CoeffArray`]s that alias the native memory and return it to the native
//! heap when dropped:
//!
//! - [`fdct2d`] and [`fdct3d`]: parameter query, forward and inverse transforms;
//! - [`FdctOperator`]: the transform as a linear operator along chosen axes of an
//!   N-dimensional array;
//! - [`wedges`]: per-wedge helpers (energy, splitting, argmax).
//!
//! A row-major caller array of shape `(a, b)` is read natively as a column-major
//! `(b, a)` container, and native output is presented the same way in reverse:
//! switching conventions only ever reverses the axis order.

pub mod fdct2d;
pub mod fdct3d;
pub mod input;
pub mod operator;
pub mod options;
pub mod output;
pub mod param;
pub mod pipeline;
pub mod view;
pub mod wedges;

#[cfg(test)]
mod tests;

pub use curvelet_common::{
    Result,
    error::{Error, ErrorKind},
};
pub use curvelet_memory::{CoeffArray, CoeffSource, Complex64, Layout};
pub use curvelet_native::{BlockPartition, BoundaryMode, CurveletLibrary, Geometry};
pub use curvelet_ragged::{RaggedCollection, WedgeIndex};

#[cfg(feature = "curvelab")]
pub use curvelet_native::CurveLab;

pub use operator::FdctOperator;
pub use options::FdctOptions;
pub use param::TransformParameters;
pub use view::InputView;
