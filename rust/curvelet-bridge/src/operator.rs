//! The curvelet transform as a linear operator over N-dimensional arrays.

use curvelet_common::{Result, error::Error, verify_arg};
use curvelet_memory::{CoeffArray, CoeffSource, Complex64};
use curvelet_native::{CurveletLibrary, Geometry};
use curvelet_ragged::RaggedCollection;
use ndarray::{
    Array2, ArrayD, ArrayView, ArrayView2, ArrayViewD, ArrayViewMutD, Axis, Dimension, Ix2, Ix3,
    IxDyn,
};

use crate::{options::FdctOptions, param::TransformParameters, pipeline};

/// Applies the 2-D or 3-D curvelet transform along the axes `dirs` of an array
/// with extents `dims`, once for every position along the remaining axes.
///
/// Vectors are flattened row-major. The operator maps `prod(dims)` samples to
/// `iterations * output_len` coefficients: for every iteration `i` (positions
/// along the other axes, row-major), the coefficients of that slice, flattened
/// by [`vect`](Self::vect), fill column `i` of a row-major
/// `(output_len, iterations)` matrix.
///
/// The transforms are tight frames, so the adjoint ([`rmatvec`](Self::rmatvec))
/// is also the inverse.
pub struct FdctOperator<L> {
    lib: L,
    dims: Vec<usize>,
    /// Transformed axes, ascending.
    dirs: Vec<usize>,
    /// The other axes, ascending.
    iter_axes: Vec<usize>,
    geometry: Geometry,
    params: TransformParameters,
    band_shapes: RaggedCollection<Vec<usize>>,
    output_len: usize,
    iterations: usize,
}

impl<L> FdctOperator<L>
where
    L: CurveletLibrary<Ix2> + CurveletLibrary<Ix3>,
{
    /// Creates an operator over arrays with extents `dims`, transforming along
    /// `dirs`. Negative directions count from the last axis. The transformed axes
    /// keep their order in `dims` whatever the order of `dirs`.
    pub fn new(lib: L, dims: &[usize], dirs: &[isize], options: &FdctOptions) -> Result<Self> {
        let ndim = dims.len();
        let mut axes = dirs
            .iter()
            .map(|&d| normalize_axis(d, ndim))
            .collect::<Result<Vec<_>>>()?;
        axes.sort_unstable();
        verify_arg!(dirs, axes.windows(2).all(|w| w[0] != w[1]));
        if !(2..=3).contains(&axes.len()) {
            return Err(Error::invalid_arg(
                "dirs",
                format!(
                    "the curvelet transform is only implemented in 2-D and 3-D, got {} directions",
                    axes.len()
                ),
            ));
        }
        verify_arg!(dims, dims.iter().all(|&d| d > 0));

        let input_shape: Vec<usize> = axes.iter().map(|&a| dims[a]).collect();
        let geometry = options.geometry_for(&input_shape);
        let params = match axes.len() {
            2 => pipeline::param_query::<Ix2, L>(&lib, &input_shape, &geometry)?,
            _ => pipeline::param_query::<Ix3, L>(&lib, &input_shape, &geometry)?,
        };
        let band_shapes = params.band_shapes();
        let output_len = params.total_len();
        let iter_axes: Vec<usize> = (0..ndim).filter(|a| !axes.contains(a)).collect();
        let iterations = iter_axes.iter().map(|&a| dims[a]).product();
        log::debug!(
            "curvelet operator over {dims:?} along {axes:?}: {iterations} x {output_len} coefficients"
        );
        Ok(FdctOperator {
            lib,
            dims: dims.to_vec(),
            dirs: axes,
            iter_axes,
            geometry,
            params,
            band_shapes,
            output_len,
            iterations,
        })
    }

    /// 2-D transform along the last two axes.
    pub fn new_2d(lib: L, dims: &[usize], options: &FdctOptions) -> Result<Self> {
        Self::new(lib, dims, &[-2, -1], options)
    }

    /// 3-D transform along the last three axes.
    pub fn new_3d(lib: L, dims: &[usize], options: &FdctOptions) -> Result<Self> {
        Self::new(lib, dims, &[-3, -2, -1], options)
    }

    /// `(coefficient count, sample count)`.
    pub fn shape(&self) -> (usize, usize) {
        (
            self.iterations * self.output_len,
            self.dims.iter().product(),
        )
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Transformed axes, ascending.
    pub fn dirs(&self) -> &[usize] {
        &self.dirs
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn parameters(&self) -> &TransformParameters {
        &self.params
    }

    /// Caller-order shape of every band of one slice.
    pub fn band_shapes(&self) -> &RaggedCollection<Vec<usize>> {
        &self.band_shapes
    }

    /// Number of coefficients of one slice.
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    /// Number of slices transformed.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Forward transform of a flattened array.
    pub fn matvec(&self, x: &[Complex64]) -> Result<Vec<Complex64>> {
        verify_arg!(x, x.len() == self.shape().1);
        let x = ArrayViewD::from_shape(IxDyn(&self.dims), x)
            .map_err(|e| Error::invalid_arg("x", e.to_string()))?;
        let mut out = Array2::<Complex64>::zeros((self.output_len, self.iterations));
        for (i, index) in self.slice_indices().enumerate() {
            let slice = self.slice_at(x.view(), index.slice());
            let column = match self.dirs.len() {
                2 => {
                    let coeffs = pipeline::forward::<Ix2, L, _>(&self.lib, &self.geometry, slice)?;
                    self.vect(&coeffs)?
                }
                _ => {
                    let coeffs = pipeline::forward::<Ix3, L, _>(&self.lib, &self.geometry, slice)?;
                    self.vect(&coeffs)?
                }
            };
            for (target, value) in out.column_mut(i).iter_mut().zip(column) {
                *target = value;
            }
        }
        Ok(out.into_raw_vec_and_offset().0)
    }

    /// Adjoint transform of a flattened coefficient vector.
    pub fn rmatvec(&self, y: &[Complex64]) -> Result<Vec<Complex64>> {
        verify_arg!(y, y.len() == self.shape().0);
        let y = ArrayView2::from_shape((self.output_len, self.iterations), y)
            .map_err(|e| Error::invalid_arg("y", e.to_string()))?;
        let input_shape: Vec<usize> = self.dirs.iter().map(|&a| self.dims[a]).collect();
        let mut out = ArrayD::<Complex64>::zeros(IxDyn(&self.dims));
        for (i, index) in self.slice_indices().enumerate() {
            let column: Vec<Complex64> = y.column(i).to_vec();
            let coeffs = self.to_struct(&column)?;
            let restored: CoeffArray<IxDyn> = match self.dirs.len() {
                2 => pipeline::inverse::<Ix2, L, _>(
                    &self.lib,
                    &input_shape,
                    &self.geometry,
                    &fixed_rank::<Ix2>(&coeffs)?,
                )?
                .into_dyn(),
                _ => pipeline::inverse::<Ix3, L, _>(
                    &self.lib,
                    &input_shape,
                    &self.geometry,
                    &fixed_rank::<Ix3>(&coeffs)?,
                )?
                .into_dyn(),
            };
            self.slice_at_mut(out.view_mut(), index.slice())
                .assign(&restored.view());
        }
        Ok(out.into_raw_vec_and_offset().0)
    }

    /// Inverse transform; the same as [`rmatvec`](Self::rmatvec).
    pub fn inverse(&self, y: &[Complex64]) -> Result<Vec<Complex64>> {
        self.rmatvec(y)
    }

    /// Flattens the coefficients of one slice: scale-major, angle-minor, each
    /// band row-major.
    pub fn vect<D, T>(&self, coeffs: &RaggedCollection<T>) -> Result<Vec<Complex64>>
    where
        D: Dimension,
        T: CoeffSource<D>,
    {
        let mut flat = Vec::with_capacity(self.output_len);
        for band in coeffs.iter() {
            flat.extend(band.coeff_view().iter().copied());
        }
        verify_arg!(coeffs, flat.len() == self.output_len);
        Ok(flat)
    }

    /// Rebuilds the coefficients of one slice from their flattened form.
    pub fn to_struct(&self, v: &[Complex64]) -> Result<RaggedCollection<ArrayD<Complex64>>> {
        verify_arg!(v, v.len() == self.output_len);
        let mut offset = 0;
        self.band_shapes.try_map(|shape| {
            let len: usize = shape.iter().product();
            let band = ArrayD::from_shape_vec(IxDyn(shape), v[offset..offset + len].to_vec())
                .map_err(|e| Error::invalid_arg("v", e.to_string()))?;
            offset += len;
            Ok(band)
        })
    }

    /// Positions along the iterated axes, row-major.
    fn slice_indices(&self) -> ndarray::iter::IndicesIter<IxDyn> {
        let extents: Vec<usize> = self.iter_axes.iter().map(|&a| self.dims[a]).collect();
        ndarray::indices(IxDyn(&extents)).into_iter()
    }

    fn slice_at<'v>(
        &self,
        mut view: ArrayViewD<'v, Complex64>,
        index: &[usize],
    ) -> ArrayViewD<'v, Complex64> {
        for (&axis, &i) in self.iter_axes.iter().zip(index).rev() {
            view = view.index_axis_move(Axis(axis), i);
        }
        view
    }

    fn slice_at_mut<'v>(
        &self,
        mut view: ArrayViewMutD<'v, Complex64>,
        index: &[usize],
    ) -> ArrayViewMutD<'v, Complex64> {
        for (&axis, &i) in self.iter_axes.iter().zip(index).rev() {
            view = view.index_axis_move(Axis(axis), i);
        }
        view
    }
}

impl<L> std::fmt::Debug for FdctOperator<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FdctOperator")
            .field("dims", &self.dims)
            .field("dirs", &self.dirs)
            .field("geometry", &self.geometry)
            .field("output_len", &self.output_len)
            .field("iterations", &self.iterations)
            .finish()
    }
}

/// Normalizes a possibly negative axis index.
fn normalize_axis(axis: isize, ndim: usize) -> Result<usize> {
    let ndim = ndim as isize;
    if axis < -ndim || axis >= ndim {
        return Err(Error::invalid_arg(
            "dirs",
            format!("axis {axis} is out of bounds for an array of dimension {ndim}"),
        ));
    }
    Ok(if axis < 0 { axis + ndim } else { axis } as usize)
}

fn fixed_rank<D: Dimension>(
    coeffs: &RaggedCollection<ArrayD<Complex64>>,
) -> Result<RaggedCollection<ArrayView<'_, Complex64, D>>> {
    coeffs.try_map(|band| {
        band.view()
            .into_dimensionality::<D>()
            .map_err(|_| Error::rank_mismatch(D::NDIM.unwrap_or(0), band.ndim()))
    })
}

#[cfg(test)]
mod tests {
    use curvelet_common::error::ErrorKind;
    use curvelet_native::{BlockPartition, BoundaryMode};
    use curvelet_testkit::{data_gen, relative_error};
    use ndarray::Array2;

    use super::*;

    fn options(nbscales: i32) -> FdctOptions {
        FdctOptions {
            nbscales: Some(nbscales),
            nbangles_coarse: 8,
            boundary: BoundaryMode::Curvelets,
        }
    }

    fn dot(a: &[Complex64], b: &[Complex64]) -> Complex64 {
        a.iter().zip(b).map(|(x, y)| x * y.conj()).sum()
    }

    #[test]
    fn test_shape() {
        let op = FdctOperator::new(BlockPartition::default(), &[6, 40, 5], &[1, -1], &options(2))
            .unwrap();
        assert_eq!(op.dirs(), &[1, 2]);
        assert_eq!(op.iterations(), 6);
        assert_eq!(op.output_len(), 200);
        assert_eq!(op.shape(), (1200, 1200));
        assert_eq!(op.band_shapes().angle_counts(), vec![1, 8]);
    }

    #[test]
    fn test_single_slice_matches_forward() {
        let lib = BlockPartition::default();
        let op = FdctOperator::new_2d(lib.clone(), &[24, 12], &options(2)).unwrap();
        assert_eq!(op.iterations(), 1);
        let x = data_gen::complex_array(&[24, 12]);
        let direct = crate::fdct2d::forward(&lib, op.geometry(), &x).unwrap();
        let flat = op.matvec(x.as_slice().unwrap()).unwrap();
        assert_eq!(flat, op.vect(&direct).unwrap());

        let bands = op.to_struct(&flat).unwrap();
        assert!(bands.same_structure(&direct));
        for (a, b) in bands.iter().zip(direct.iter()) {
            assert_eq!(a.view(), b.view().into_dyn());
        }
    }

    #[test]
    fn test_round_trip_along_inner_axes() {
        let op = FdctOperator::new(BlockPartition::default(), &[7, 3, 32], &[0, 2], &options(2))
            .unwrap();
        let x = data_gen::complex_vec(op.shape().1);
        let y = op.matvec(&x).unwrap();
        assert_eq!(y.len(), op.shape().0);
        let back = op.inverse(&y).unwrap();
        assert!(relative_error(&back, &x) < 1e-12);
    }

    #[test]
    fn test_round_trip_3d() {
        let op = FdctOperator::new_3d(BlockPartition::default(), &[2, 6, 5, 16], &options(2))
            .unwrap();
        assert_eq!(op.iterations(), 2);
        let x = data_gen::complex_vec(op.shape().1);
        let back = op.rmatvec(&op.matvec(&x).unwrap()).unwrap();
        assert!(relative_error(&back, &x) < 1e-12);
    }

    #[test]
    fn test_adjoint() {
        let op = FdctOperator::new(BlockPartition::default(), &[16, 4, 9], &[0, 2], &options(2))
            .unwrap();
        let x = data_gen::complex_vec(op.shape().1);
        let y = data_gen::complex_vec(op.shape().0);
        let lhs = dot(&op.matvec(&x).unwrap(), &y);
        let rhs = dot(&x, &op.rmatvec(&y).unwrap());
        assert!((lhs - rhs).norm() <= 1e-10 * lhs.norm().max(1.0));
    }

    #[test]
    fn test_invalid_directions() {
        let lib = BlockPartition::default();
        let err = FdctOperator::new(lib.clone(), &[8, 8, 8], &[0], &options(1)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        let err = FdctOperator::new(lib.clone(), &[8, 8, 8], &[0, -3], &options(1)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        let err = FdctOperator::new(lib.clone(), &[8, 8], &[0, 2], &options(1)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        let err = FdctOperator::new(lib, &[8, 8], &[0, 1], &options(-1)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidGeometry { .. }));
    }

    #[test]
    fn test_wrong_vector_lengths() {
        let op = FdctOperator::new_2d(BlockPartition::default(), &[8, 16], &options(1)).unwrap();
        let err = op.matvec(&[Complex64::new(0.0, 0.0); 3]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        let err = op.rmatvec(&[Complex64::new(0.0, 0.0); 3]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        let wrong = RaggedCollection::from_nested(vec![vec![Array2::<Complex64>::zeros((2, 2))]]);
        assert!(op.vect(&wrong).is_err());
    }
}
