//! Transform geometry: scale count, coarse angle count and boundary mode.

use std::ffi::c_int;

use serde::{Deserialize, Serialize};

use crate::error::NativeError;

/// What the finest scale holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Curvelets at every scale, including the finest.
    #[default]
    Curvelets,
    /// A single wavelet band at the finest scale.
    Wavelets,
}

impl BoundaryMode {
    /// The integer flag the native routines expect (`1` for curvelets).
    #[inline]
    pub fn as_flag(self) -> c_int {
        match self {
            BoundaryMode::Curvelets => 1,
            BoundaryMode::Wavelets => 0,
        }
    }

    pub fn from_flag(flag: c_int) -> BoundaryMode {
        if flag != 0 {
            BoundaryMode::Curvelets
        } else {
            BoundaryMode::Wavelets
        }
    }
}

/// Geometry of a curvelet decomposition.
///
/// The fields keep the native `int` width so that out-of-range values, negative
/// ones included, reach the validation the native library performs instead of
/// being rejected by the type system on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    /// Number of scales, coarsest included.
    pub nbscales: c_int,
    /// Number of angles at the second coarsest scale.
    pub nbangles_coarse: c_int,
    pub boundary: BoundaryMode,
}

impl Geometry {
    pub const DEFAULT_ANGLES_COARSE: c_int = 16;

    pub fn new(nbscales: c_int, nbangles_coarse: c_int, boundary: BoundaryMode) -> Geometry {
        Geometry {
            nbscales,
            nbangles_coarse,
            boundary,
        }
    }

    /// Default geometry for an input of the given extents:
    /// `ceil(log2(min extent) - 3)` scales (at least one), 16 coarse angles,
    /// curvelets at the finest scale.
    pub fn for_extents(extents: &[usize]) -> Geometry {
        Geometry::new(
            default_scale_count(extents),
            Self::DEFAULT_ANGLES_COARSE,
            BoundaryMode::Curvelets,
        )
    }

    /// Checks the geometry and the native-order `dims` against the constraints
    /// every curvelet library shares.
    pub fn check(&self, dims: &[c_int]) -> Result<(), NativeError> {
        if !(2..=3).contains(&dims.len()) {
            return Err(NativeError::invalid_geometry(format!(
                "expected 2 or 3 dimensions, got {}",
                dims.len()
            )));
        }
        if let Some(bad) = dims.iter().find(|&&d| d < 1) {
            return Err(NativeError::invalid_geometry(format!(
                "dimensions must be positive, got {bad} in {dims:?}"
            )));
        }
        if self.nbscales < 1 {
            return Err(NativeError::invalid_geometry(format!(
                "nbscales must be at least 1, got {}",
                self.nbscales
            )));
        }
        let supported = max_scale_count(dims);
        if self.nbscales > supported {
            return Err(NativeError::invalid_geometry(format!(
                "nbscales {} exceeds the {supported} scales dimensions {dims:?} support",
                self.nbscales
            )));
        }
        if self.nbangles_coarse < 8 || self.nbangles_coarse % 8 != 0 {
            return Err(NativeError::invalid_geometry(format!(
                "nbangles_coarse must be a positive multiple of 8, got {}",
                self.nbangles_coarse
            )));
        }
        let total = self
            .checked_angle_counts()
            .and_then(|counts| counts.into_iter().try_fold(0usize, usize::checked_add))
            .filter(|&total| c_int::try_from(total).is_ok());
        if total.is_none() {
            return Err(NativeError::invalid_geometry(format!(
                "{} scales of {} coarse angles exceed the native band count",
                self.nbscales, self.nbangles_coarse
            )));
        }
        Ok(())
    }

    /// Number of angles at every scale.
    ///
    /// The coarsest scale holds one band; scale `s >= 1` holds
    /// `nbangles_coarse * 2^ceil((s - 1) / 2)`, so the count doubles every
    /// other scale. With wavelets at the boundary the finest scale holds one band.
    /// The geometry must have passed [`check`](Self::check).
    /// An unchecked geometry whose counts overflow yields no scales.
    pub fn angle_counts(&self) -> Vec<usize> {
        self.checked_angle_counts().unwrap_or_default()
    }

    fn checked_angle_counts(&self) -> Option<Vec<usize>> {
        let nbscales = self.nbscales.max(1) as usize;
        let coarse = self.nbangles_coarse.max(0) as usize;
        (0..nbscales)
            .map(|scale| {
                if scale == 0 {
                    Some(1)
                } else if scale == nbscales - 1 && self.boundary == BoundaryMode::Wavelets {
                    Some(1)
                } else {
                    let doublings = u32::try_from((scale - 1).div_ceil(2)).ok()?;
                    coarse.checked_mul(1usize.checked_shl(doublings)?)
                }
            })
            .collect()
    }
}

/// Every scale halves the band radius, so an extent of `n` carries at most
/// `floor(log2 n) + 1` scales.
pub fn max_scale_count(dims: &[c_int]) -> c_int {
    let min = dims.iter().copied().min().unwrap_or(1).max(1) as u32;
    (u32::BITS - min.leading_zeros()) as c_int
}

/// `ceil(log2(min extent) - 3)`, at least one.
pub fn default_scale_count(extents: &[usize]) -> c_int {
    let Some(&min) = extents.iter().min() else {
        return 1;
    };
    if min == 0 {
        return 1;
    }
    let scales = ((min as f64).log2() - 3.0).ceil();
    if scales < 1.0 { 1 } else { scales as c_int }
}
