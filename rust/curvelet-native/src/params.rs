//! Raw output of a native parameter query.

use std::ffi::c_int;

/// Per-band sampling metadata, exactly as a native library reports it.
///
/// Every table is indexed `[axis][scale][angle]`, with axes in native order
/// (axis 0 varies fastest in memory).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawParams {
    /// Number of samples of each band along each axis.
    pub sizes: Vec<Vec<Vec<c_int>>>,
    /// Frequency-domain center of each band along each axis.
    pub frequencies: Vec<Vec<Vec<f64>>>,
    /// Spatial sampling step of each band along each axis.
    /// Only the 2-D transform reports spacings; the table is empty otherwise.
    pub spacings: Vec<Vec<Vec<f64>>>,
}

impl RawParams {
    /// Number of axes described.
    pub fn rank(&self) -> usize {
        self.sizes.len()
    }

    /// Number of scales, or zero when nothing is described.
    pub fn scale_count(&self) -> usize {
        self.sizes.first().map_or(0, Vec::len)
    }

    /// Number of angles at every scale.
    pub fn angle_counts(&self) -> Vec<usize> {
        self.sizes
            .first()
            .map(|axis| axis.iter().map(Vec::len).collect())
            .unwrap_or_default()
    }

    /// Returns `true` if every table agrees on the scale and angle structure.
    pub fn is_consistent(&self) -> bool {
        let counts = self.angle_counts();
        let rank = self.rank();
        self.sizes.iter().all(|t| has_structure(t, &counts))
            && self.frequencies.len() == rank
            && self.frequencies.iter().all(|t| has_structure(t, &counts))
            && (self.spacings.is_empty() || self.spacings.len() == rank)
            && self.spacings.iter().all(|t| has_structure(t, &counts))
    }
}

fn has_structure<T>(table: &[Vec<T>], counts: &[usize]) -> bool {
    table.len() == counts.len() && table.iter().zip(counts).all(|(angles, &n)| angles.len() == n)
}
