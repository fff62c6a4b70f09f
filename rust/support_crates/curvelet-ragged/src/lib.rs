//! A two-level ragged collection indexed by `(scale, angle)`.
//!
//! The outer level holds one entry per decomposition scale; each scale holds its
//! own number of angles. Coarse scales typically have few angles and fine scales
//! many, and those counts are dictated by the transform geometry, so the
//! collection never pads or resizes a scale on its own.

use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Position of a wedge within a ragged collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WedgeIndex {
    /// Scale index, coarsest first.
    pub scale: usize,
    /// Angle index within the scale.
    pub angle: usize,
    /// Number of angles in this scale.
    pub angle_count: usize,
    /// Number of scales in the collection.
    pub scale_count: usize,
}

/// Ordered scales, each an ordered sequence of per-angle values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaggedCollection<T> {
    scales: Vec<Vec<T>>,
}

impl<T> RaggedCollection<T> {
    /// Creates a collection with no scales.
    pub fn new() -> Self {
        RaggedCollection { scales: Vec::new() }
    }

    /// Creates an empty collection with room for `scale_count` scales.
    pub fn with_scale_capacity(scale_count: usize) -> Self {
        RaggedCollection {
            scales: Vec::with_capacity(scale_count),
        }
    }

    /// Wraps a `[scale][angle]` nested vector.
    pub fn from_nested(scales: Vec<Vec<T>>) -> Self {
        RaggedCollection { scales }
    }

    /// Appends a scale.
    pub fn push_scale(&mut self, angles: Vec<T>) {
        self.scales.push(angles);
    }

    /// Number of scales.
    #[inline]
    pub fn scale_count(&self) -> usize {
        self.scales.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    /// Number of angles at `scale`.
    ///
    /// # Panics
    ///
    /// Panics if `scale` is out of range.
    #[inline]
    pub fn angle_count(&self, scale: usize) -> usize {
        self.scales[scale].len()
    }

    /// Number of angles at every scale.
    pub fn angle_counts(&self) -> Vec<usize> {
        self.scales.iter().map(Vec::len).collect()
    }

    /// Total number of leaves over all scales.
    pub fn leaf_count(&self) -> usize {
        self.scales.iter().map(Vec::len).sum()
    }

    /// Returns the leaf at `(scale, angle)`, or `None` if out of range.
    #[inline]
    pub fn get(&self, scale: usize, angle: usize) -> Option<&T> {
        self.scales.get(scale).and_then(|angles| angles.get(angle))
    }

    #[inline]
    pub fn get_mut(&mut self, scale: usize, angle: usize) -> Option<&mut T> {
        self.scales
            .get_mut(scale)
            .and_then(|angles| angles.get_mut(angle))
    }

    /// The angles of one scale.
    #[inline]
    pub fn scale(&self, scale: usize) -> &[T] {
        &self.scales[scale]
    }

    /// Iterates over the scales, coarsest first.
    pub fn scales(&self) -> impl ExactSizeIterator<Item = &[T]> + '_ {
        self.scales.iter().map(Vec::as_slice)
    }

    /// Iterates over all leaves, scale-major and angle-minor.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.scales.iter().flatten()
    }

    /// Iterates over all leaves together with their position.
    pub fn iter_indexed(&self) -> impl Iterator<Item = (WedgeIndex, &T)> + '_ {
        let scale_count = self.scales.len();
        self.scales.iter().enumerate().flat_map(move |(scale, angles)| {
            let angle_count = angles.len();
            angles.iter().enumerate().map(move |(angle, leaf)| {
                (
                    WedgeIndex {
                        scale,
                        angle,
                        angle_count,
                        scale_count,
                    },
                    leaf,
                )
            })
        })
    }

    /// Applies `f` to every leaf, keeping the structure.
    pub fn map<'s, U>(&'s self, mut f: impl FnMut(&'s T) -> U) -> RaggedCollection<U> {
        self.map_indexed(|_, leaf| f(leaf))
    }

    /// Applies `f` to every leaf and its position, keeping the structure.
    pub fn map_indexed<'s, U>(
        &'s self,
        mut f: impl FnMut(WedgeIndex, &'s T) -> U,
    ) -> RaggedCollection<U> {
        let mut out = RaggedCollection::with_scale_capacity(self.scale_count());
        let mut leaves = self.iter_indexed().peekable();
        for scale in 0..self.scale_count() {
            let mut angles = Vec::with_capacity(self.angle_count(scale));
            while let Some((index, leaf)) = leaves.next_if(|(index, _)| index.scale == scale) {
                angles.push(f(index, leaf));
            }
            out.push_scale(angles);
        }
        out
    }

    /// Applies a fallible `f` to every leaf, stopping at the first error.
    pub fn try_map<'s, U, E>(
        &'s self,
        mut f: impl FnMut(&'s T) -> Result<U, E>,
    ) -> Result<RaggedCollection<U>, E> {
        let mut out = RaggedCollection::with_scale_capacity(self.scale_count());
        for angles in &self.scales {
            let mapped = angles.iter().map(&mut f).collect::<Result<Vec<_>, E>>()?;
            out.push_scale(mapped);
        }
        Ok(out)
    }

    /// Returns `true` if both collections have the same scale and angle counts.
    pub fn same_structure<U>(&self, other: &RaggedCollection<U>) -> bool {
        self.scale_count() == other.scale_count()
            && self
                .scales
                .iter()
                .zip(&other.scales)
                .all(|(a, b)| a.len() == b.len())
    }

    /// Unwraps into the `[scale][angle]` nested vector.
    pub fn into_nested(self) -> Vec<Vec<T>> {
        self.scales
    }

    /// Borrows the `[scale][angle]` nested vector.
    pub fn as_nested(&self) -> &[Vec<T>] {
        &self.scales
    }
}

impl<T> Default for RaggedCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for RaggedCollection<T> {
    type Output = [T];

    #[inline]
    fn index(&self, scale: usize) -> &[T] {
        &self.scales[scale]
    }
}

impl<T> Index<(usize, usize)> for RaggedCollection<T> {
    type Output = T;

    #[inline]
    fn index(&self, (scale, angle): (usize, usize)) -> &T {
        &self.scales[scale][angle]
    }
}

impl<T> From<Vec<Vec<T>>> for RaggedCollection<T> {
    fn from(scales: Vec<Vec<T>>) -> Self {
        RaggedCollection::from_nested(scales)
    }
}

impl<T> FromIterator<Vec<T>> for RaggedCollection<T> {
    fn from_iter<I: IntoIterator<Item = Vec<T>>>(iter: I) -> Self {
        RaggedCollection::from_nested(iter.into_iter().collect())
    }
}

impl<T> IntoIterator for RaggedCollection<T> {
    type Item = Vec<T>;
    type IntoIter = std::vec::IntoIter<Vec<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.scales.into_iter()
    }
}
