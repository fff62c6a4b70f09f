//! Per-band sampling metadata of a transform geometry.

use curvelet_common::{Result, error::Error};
use curvelet_native::{BoundaryMode, Geometry, NativeError, RawParams};
use curvelet_ragged::RaggedCollection;
use serde::Serialize;

/// Shapes and sampling coordinates of every band a transform produces.
///
/// Tables are kept per native axis: axis 0 (`x`) is the fastest varying one,
/// which is the caller's *last* axis. [`band_shape`](Self::band_shape) converts
/// back to caller order, and is what buffers for the inverse transform must be
/// sized with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformParameters {
    /// Input extents, caller order.
    dims: Vec<usize>,
    nbscales: i32,
    nbangles_coarse: i32,
    boundary: BoundaryMode,
    sizes: Vec<RaggedCollection<usize>>,
    frequencies: Vec<RaggedCollection<f64>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    spacings: Vec<RaggedCollection<f64>>,
}

impl TransformParameters {
    pub(crate) fn from_raw(
        dims: &[usize],
        geometry: &Geometry,
        raw: RawParams,
    ) -> Result<TransformParameters> {
        if raw.rank() != dims.len() || !raw.is_consistent() {
            return Err(Error::native(
                "param",
                NativeError::failed(format!(
                    "inconsistent parameter tables for {}-D input",
                    dims.len()
                )),
            ));
        }
        let sizes = raw
            .sizes
            .into_iter()
            .map(|table| {
                RaggedCollection::from_nested(table).try_map(|&n| {
                    usize::try_from(n).map_err(|_| {
                        let cause = NativeError::failed(format!("negative band size {n}"));
                        Error::native("param", cause)
                    })
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TransformParameters {
            dims: dims.to_vec(),
            nbscales: geometry.nbscales,
            nbangles_coarse: geometry.nbangles_coarse,
            boundary: geometry.boundary,
            sizes,
            frequencies: raw
                .frequencies
                .into_iter()
                .map(RaggedCollection::from_nested)
                .collect(),
            spacings: raw
                .spacings
                .into_iter()
                .map(RaggedCollection::from_nested)
                .collect(),
        })
    }

    /// Input extents, caller order.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.nbscales, self.nbangles_coarse, self.boundary)
    }

    pub fn scale_count(&self) -> usize {
        self.sizes.first().map_or(0, RaggedCollection::scale_count)
    }

    pub fn angle_count(&self, scale: usize) -> usize {
        self.sizes[0].angle_count(scale)
    }

    pub fn angle_counts(&self) -> Vec<usize> {
        self.sizes
            .first()
            .map(RaggedCollection::angle_counts)
            .unwrap_or_default()
    }

    /// Band sample counts along native axis `axis`.
    pub fn sizes(&self, axis: usize) -> &RaggedCollection<usize> {
        &self.sizes[axis]
    }

    /// Band frequency centers along native axis `axis`.
    pub fn frequencies(&self, axis: usize) -> &RaggedCollection<f64> {
        &self.frequencies[axis]
    }

    /// Band sampling steps along native axis `axis`; `None` for 3-D transforms,
    /// which do not report them.
    pub fn spacings(&self, axis: usize) -> Option<&RaggedCollection<f64>> {
        self.spacings.get(axis)
    }

    /// Shape of band `(scale, angle)` in caller order.
    pub fn band_shape(&self, scale: usize, angle: usize) -> Option<Vec<usize>> {
        self.sizes
            .iter()
            .rev()
            .map(|table| table.get(scale, angle).copied())
            .collect()
    }

    /// Caller-order shapes of all bands.
    pub fn band_shapes(&self) -> RaggedCollection<Vec<usize>> {
        match self.sizes.first() {
            Some(first) => first.map_indexed(|index, _| {
                self.sizes
                    .iter()
                    .rev()
                    .map(|table| table[(index.scale, index.angle)])
                    .collect()
            }),
            None => RaggedCollection::new(),
        }
    }

    /// Number of coefficients in band `(scale, angle)`.
    pub fn band_len(&self, scale: usize, angle: usize) -> Option<usize> {
        self.band_shape(scale, angle)
            .map(|shape| shape.iter().product())
    }

    /// Number of coefficients over all bands.
    pub fn total_len(&self) -> usize {
        self.band_shapes()
            .iter()
            .map(|shape| shape.iter().product::<usize>())
            .sum()
    }
}
