//! A pure-Rust curvelet library stand-in.
//!
//! [`BlockPartition`] follows the native contract to the letter: it validates
//! geometry the way CurveLab does, produces CurveLab's angle counts, allocates
//! every output container on its heap and never touches the memory it borrows.
//! In place of the curvelet kernels it cuts the input along its slowest native
//! axis into one contiguous block per band (as evenly as possible, so some
//! blocks may be empty), which makes the inverse an exact reconstruction.

use std::{f64::consts::PI, ffi::c_int, ops::Range};

use curvelet_memory::{NativeArray, NativeHeapRef, NativeRagged, SystemHeap};
use ndarray::Dimension;

use crate::{
    error::NativeError, geometry::Geometry, library::CurveletLibrary, params::RawParams,
};

/// Reference backend that partitions the input into bands.
#[derive(Clone)]
pub struct BlockPartition {
    heap: NativeHeapRef,
}

impl BlockPartition {
    pub fn new(heap: NativeHeapRef) -> BlockPartition {
        BlockPartition { heap }
    }
}

impl Default for BlockPartition {
    fn default() -> Self {
        BlockPartition::new(SystemHeap::shared())
    }
}

impl std::fmt::Debug for BlockPartition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockPartition")
            .field("heap", &self.heap.name())
            .finish()
    }
}

/// How an input of given extents is cut into bands.
struct Plan {
    /// Native extents, first axis fastest.
    dims: Vec<usize>,
    angle_counts: Vec<usize>,
    bands: usize,
    /// Elements in one step of the slowest axis.
    plane: usize,
    /// Extent of the slowest axis.
    slow: usize,
}

impl Plan {
    fn new(dims: &[c_int], geometry: &Geometry) -> Result<Plan, NativeError> {
        geometry.check(dims)?;
        let dims: Vec<usize> = dims.iter().map(|&d| d as usize).collect();
        let angle_counts = geometry.angle_counts();
        let bands = angle_counts.iter().sum();
        let (&slow, rest) = dims
            .split_last()
            .ok_or_else(|| NativeError::invalid_geometry("no dimensions"))?;
        Ok(Plan {
            plane: rest.iter().product(),
            slow,
            dims,
            angle_counts,
            bands,
        })
    }

    /// Rows of the slowest axis covered by band `k`, counted scale-major.
    /// The first `slow % bands` blocks hold one row more than the others.
    fn block(&self, k: usize) -> Range<usize> {
        let quotient = self.slow / self.bands;
        let remainder = self.slow % self.bands;
        let start = k * quotient + k.min(remainder);
        start..start + quotient + usize::from(k < remainder)
    }

    fn band_dims(&self, rows: &Range<usize>) -> Vec<usize> {
        let mut dims = self.dims.clone();
        if let Some(last) = dims.last_mut() {
            *last = rows.len();
        }
        dims
    }

    /// Element range of band `k` in a column-major buffer with the plan's extents.
    fn span(&self, k: usize) -> Range<usize> {
        let rows = self.block(k);
        rows.start * self.plane..rows.end * self.plane
    }
}

fn to_dim<D: Dimension>(extents: &[usize]) -> Result<D, NativeError> {
    if D::NDIM.is_some_and(|ndim| ndim != extents.len()) {
        return Err(NativeError::failed(format!(
            "{}-D extents {extents:?} passed to a {}-D transform",
            extents.len(),
            D::NDIM.unwrap_or(0)
        )));
    }
    let mut dim = D::zeros(extents.len());
    dim.slice_mut().copy_from_slice(extents);
    Ok(dim)
}

fn to_native_ints(extents: &[usize]) -> Result<Vec<c_int>, NativeError> {
    extents
        .iter()
        .map(|&e| {
            c_int::try_from(e).map_err(|_| {
                NativeError::invalid_geometry(format!("extent {e} exceeds native int"))
            })
        })
        .collect()
}

impl<D: Dimension> CurveletLibrary<D> for BlockPartition {
    fn heap(&self) -> &NativeHeapRef {
        &self.heap
    }

    fn name(&self) -> &str {
        "block-partition"
    }

    fn param(&self, dims: &[c_int], geometry: &Geometry) -> Result<RawParams, NativeError> {
        let plan = Plan::new(dims, geometry)?;
        let rank = plan.dims.len();
        let mut params = RawParams {
            sizes: vec![Vec::with_capacity(plan.angle_counts.len()); rank],
            frequencies: vec![Vec::with_capacity(plan.angle_counts.len()); rank],
            spacings: if rank == 2 {
                vec![Vec::with_capacity(plan.angle_counts.len()); rank]
            } else {
                Vec::new()
            },
        };

        let mut band = 0;
        for (scale, &count) in plan.angle_counts.iter().enumerate() {
            let radius = if scale == 0 { 0.0 } else { 2f64.powi(scale as i32) };
            let mut sizes = vec![Vec::with_capacity(count); rank];
            let mut frequencies = vec![Vec::with_capacity(count); rank];
            let mut spacings = vec![Vec::with_capacity(count); params.spacings.len()];
            for angle in 0..count {
                let extents = plan.band_dims(&plan.block(band));
                let theta = 2.0 * PI * (angle as f64 + 0.5) / count as f64;
                for axis in 0..rank {
                    sizes[axis].push(extents[axis] as c_int);
                    frequencies[axis].push(match axis {
                        0 => radius * theta.cos(),
                        1 => radius * theta.sin(),
                        _ => 0.0,
                    });
                }
                for (axis, table) in spacings.iter_mut().enumerate() {
                    table.push(plan.dims[axis] as f64 / extents[axis].max(1) as f64);
                }
                band += 1;
            }
            for (table, scale_sizes) in params.sizes.iter_mut().zip(sizes) {
                table.push(scale_sizes);
            }
            for (table, scale_freqs) in params.frequencies.iter_mut().zip(frequencies) {
                table.push(scale_freqs);
            }
            for (table, scale_spacings) in params.spacings.iter_mut().zip(spacings) {
                table.push(scale_spacings);
            }
        }
        Ok(params)
    }

    fn forward(
        &self,
        geometry: &Geometry,
        input: &NativeArray<D>,
    ) -> Result<NativeRagged<D>, NativeError> {
        let dims = to_native_ints(input.dims().slice())?;
        let plan = Plan::new(&dims, geometry)?;
        let data = input.as_slice();

        let mut coeffs: NativeRagged<D> = Vec::with_capacity(plan.angle_counts.len());
        let mut band = 0;
        for &count in &plan.angle_counts {
            let mut angles = Vec::with_capacity(count);
            for _ in 0..count {
                let extents = plan.band_dims(&plan.block(band));
                let mut leaf = NativeArray::allocate(&self.heap, to_dim::<D>(&extents)?);
                leaf.as_mut_slice().copy_from_slice(&data[plan.span(band)]);
                angles.push(leaf);
                band += 1;
            }
            coeffs.push(angles);
        }
        log::trace!(
            "block partition forward: {:?} into {} bands",
            plan.dims,
            plan.bands
        );
        Ok(coeffs)
    }

    fn inverse(
        &self,
        dims: &[c_int],
        geometry: &Geometry,
        coeffs: &NativeRagged<D>,
    ) -> Result<NativeArray<D>, NativeError> {
        let plan = Plan::new(dims, geometry)?;
        if coeffs.len() != plan.angle_counts.len() {
            return Err(NativeError::failed(format!(
                "expected {} scales, got {}",
                plan.angle_counts.len(),
                coeffs.len()
            )));
        }

        let mut output = NativeArray::allocate(&self.heap, to_dim::<D>(&plan.dims)?);
        let out = output.as_mut_slice();
        let mut band = 0;
        for (scale, (angles, &count)) in coeffs.iter().zip(&plan.angle_counts).enumerate() {
            if angles.len() != count {
                return Err(NativeError::failed(format!(
                    "scale {scale}: expected {count} angles, got {}",
                    angles.len()
                )));
            }
            for (angle, leaf) in angles.iter().enumerate() {
                let target = &mut out[plan.span(band)];
                if leaf.len() != target.len() {
                    return Err(NativeError::failed(format!(
                        "band ({scale}, {angle}): expected {} elements, got {}",
                        target.len(),
                        leaf.len()
                    )));
                }
                target.copy_from_slice(leaf.as_slice());
                band += 1;
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use curvelet_memory::{BufferState, Complex64, CpxNumMat, CpxNumTns};
    use ndarray::{Ix2, Ix3};

    use super::*;
    use crate::geometry::BoundaryMode;

    fn random_data(len: usize) -> Vec<Complex64> {
        (0..len)
            .map(|_| Complex64::new(fastrand::f64() - 0.5, fastrand::f64() - 0.5))
            .collect()
    }

    fn borrowed_ragged<D: Dimension>(coeffs: &NativeRagged<D>) -> NativeRagged<D> {
        coeffs
            .iter()
            .map(|angles| {
                angles
                    .iter()
                    .map(|leaf| unsafe {
                        NativeArray::borrowed(leaf.dims().clone(), leaf.as_ptr())
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_forward_structure_matches_params() {
        let lib = BlockPartition::default();
        let geometry = Geometry::new(3, 8, BoundaryMode::Curvelets);
        let data = random_data(20 * 70);
        let mut input = unsafe { CpxNumMat::borrowed(Ix2(20, 70), data.as_ptr()) };

        let params = CurveletLibrary::<Ix2>::param(&lib, &[20, 70], &geometry).unwrap();
        let coeffs = lib.forward(&geometry, &input).unwrap();
        input.unbind();

        assert!(params.is_consistent());
        assert_eq!(params.spacings.len(), 2);
        assert_eq!(coeffs.len(), 3);
        assert_eq!(params.angle_counts(), vec![1, 8, 16]);
        for (scale, angles) in coeffs.iter().enumerate() {
            assert_eq!(angles.len(), params.angle_counts()[scale]);
            for (angle, leaf) in angles.iter().enumerate() {
                assert_eq!(leaf.state(), BufferState::NativeOwned);
                assert_eq!(leaf.extent(0), params.sizes[0][scale][angle] as usize);
                assert_eq!(leaf.extent(1), params.sizes[1][scale][angle] as usize);
            }
        }
        let total: usize = coeffs.iter().flatten().map(NativeArray::len).sum();
        assert_eq!(total, data.len());
    }

    #[test]
    fn test_round_trip_is_exact_2d() {
        let lib = BlockPartition::default();
        let geometry = Geometry::new(4, 16, BoundaryMode::Wavelets);
        let data = random_data(33 * 129);
        let input = unsafe { CpxNumMat::borrowed(Ix2(33, 129), data.as_ptr()) };
        let coeffs = lib.forward(&geometry, &input).unwrap();
        let borrowed = borrowed_ragged(&coeffs);
        let output = lib.inverse(&[33, 129], &geometry, &borrowed).unwrap();
        assert_eq!(output.dims(), &Ix2(33, 129));
        assert_eq!(output.as_slice(), data.as_slice());
    }

    #[test]
    fn test_round_trip_is_exact_3d() {
        let lib = BlockPartition::default();
        let geometry = Geometry::new(2, 8, BoundaryMode::Curvelets);
        let data = random_data(5 * 6 * 40);
        let input = unsafe { CpxNumTns::borrowed(Ix3(5, 6, 40), data.as_ptr()) };
        let coeffs = lib.forward(&geometry, &input).unwrap();
        assert_eq!(coeffs[1].len(), 8);
        let params = CurveletLibrary::<Ix3>::param(&lib, &[5, 6, 40], &geometry).unwrap();
        assert!(params.spacings.is_empty());
        assert_eq!(params.rank(), 3);
        let output = lib
            .inverse(&[5, 6, 40], &geometry, &borrowed_ragged(&coeffs))
            .unwrap();
        assert_eq!(output.as_slice(), data.as_slice());
    }

    #[test]
    fn test_short_axis_yields_empty_bands() {
        let lib = BlockPartition::default();
        let geometry = Geometry::new(2, 8, BoundaryMode::Curvelets);
        let data = random_data(4 * 3);
        let input = unsafe { CpxNumMat::borrowed(Ix2(4, 3), data.as_ptr()) };
        let coeffs = lib.forward(&geometry, &input).unwrap();
        let lens: Vec<usize> = coeffs.iter().flatten().map(NativeArray::len).collect();
        assert_eq!(lens, vec![4, 4, 4, 0, 0, 0, 0, 0, 0]);
        let output = lib.inverse(&[4, 3], &geometry, &borrowed_ragged(&coeffs)).unwrap();
        assert_eq!(output.as_slice(), data.as_slice());
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let lib = BlockPartition::default();
        let err = CurveletLibrary::<Ix2>::param(
            &lib,
            &[32, 32],
            &Geometry::new(-2, 16, BoundaryMode::Curvelets),
        )
        .unwrap_err();
        assert!(matches!(err, NativeError::InvalidGeometry(_)));

        let err = CurveletLibrary::<Ix2>::param(
            &lib,
            &[32, -32],
            &Geometry::new(2, 16, BoundaryMode::Curvelets),
        )
        .unwrap_err();
        assert!(matches!(err, NativeError::InvalidGeometry(_)));
    }

    #[test]
    fn test_inverse_rejects_wrong_structure() {
        let lib = BlockPartition::default();
        let geometry = Geometry::new(2, 8, BoundaryMode::Curvelets);
        let data = random_data(16 * 16);
        let input = unsafe { CpxNumMat::borrowed(Ix2(16, 16), data.as_ptr()) };
        let coeffs = lib.forward(&geometry, &input).unwrap();

        let mut borrowed = borrowed_ragged(&coeffs);
        borrowed.pop();
        let err = lib.inverse(&[16, 16], &geometry, &borrowed).unwrap_err();
        assert!(matches!(err, NativeError::Failed(_)));

        let mut borrowed = borrowed_ragged(&coeffs);
        borrowed[0][0] = unsafe { CpxNumMat::borrowed(Ix2(1, 1), data.as_ptr()) };
        let err = lib.inverse(&[16, 16], &geometry, &borrowed).unwrap_err();
        assert!(err.to_string().contains("band (0, 0)"));
    }
}
