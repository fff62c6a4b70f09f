use curvelet_testkit::data_gen;
use ndarray::{Array1, Array2, ArrayD, IxDyn};

use crate::{
    BlockPartition, BoundaryMode, CoeffArray, Complex64, ErrorKind, Geometry, RaggedCollection,
    fdct2d, fdct3d,
};

fn geometry(nbscales: i32) -> Geometry {
    Geometry::new(nbscales, 8, BoundaryMode::Curvelets)
}

fn forward_2d(dims: [usize; 2], nbscales: i32) -> RaggedCollection<Array2<Complex64>> {
    let x = data_gen::complex_array(&dims);
    fdct2d::forward(&BlockPartition::default(), &geometry(nbscales), &x)
        .unwrap()
        .map(CoeffArray::to_owned)
}

#[test]
fn test_wrong_rank() {
    let lib = BlockPartition::default();
    let v = Array1::from_elem(64, Complex64::new(1.0, 0.0));
    let err = fdct2d::forward(&lib, &geometry(2), &v).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::RankMismatch {
            expected: 2,
            actual: 1
        }
    ));

    let x4 = ArrayD::from_elem(IxDyn(&[4, 4, 4, 4]), Complex64::new(1.0, 0.0));
    let err = fdct3d::forward(&lib, &geometry(1), &x4).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::RankMismatch {
            expected: 3,
            actual: 4
        }
    ));

    let err = fdct2d::param_query(&lib, &[8, 8, 8], &geometry(1)).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::RankMismatch { .. }));
}

#[test]
fn test_empty_input() {
    let x = Array2::<Complex64>::zeros((0, 16));
    let err = fdct2d::forward(&BlockPartition::default(), &geometry(1), &x).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::EmptyBuffer));
}

#[test]
fn test_invalid_geometry() {
    let lib = BlockPartition::default();
    let x = data_gen::complex_array(&[16, 16]);
    for bad in [
        Geometry::new(-1, 8, BoundaryMode::Curvelets),
        Geometry::new(2, 12, BoundaryMode::Curvelets),
        Geometry::new(2, 0, BoundaryMode::Wavelets),
    ] {
        let err = fdct2d::forward(&lib, &bad, &x).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidGeometry { .. }), "{bad:?}");
        let err = fdct2d::param_query(&lib, &[16, 16], &bad).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidGeometry { .. }));
    }
    let err = fdct2d::param_query(&lib, &[16, 0], &geometry(1)).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidGeometry { .. }));
}

#[test]
fn test_too_many_scales() {
    let lib = BlockPartition::default();
    for nbscales in [7, 40, 64, 129, 200, i32::MAX] {
        let err = fdct2d::param_query(&lib, &[32, 32], &geometry(nbscales)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidGeometry { .. }), "{nbscales}");
    }
    let x = data_gen::complex_array(&[32, 40]);
    let err = fdct2d::forward(&lib, &geometry(200), &x).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidGeometry { .. }));
    let err = fdct3d::param_query(&lib, &[64, 64, 3], &geometry(3)).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidGeometry { .. }));

    assert!(fdct2d::param_query(&lib, &[32, 40], &geometry(6)).is_ok());
    assert!(fdct2d::forward(&lib, &geometry(6), &x).is_ok());
}

#[test]
fn test_scale_count_mismatch() {
    let lib = BlockPartition::default();
    let coeffs = forward_2d([32, 32], 3);
    let err = fdct2d::inverse(&lib, &[32, 32], &geometry(2), &coeffs).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::ScaleCountMismatch {
            expected: 2,
            actual: 3
        }
    ));
    let err = fdct2d::inverse(&lib, &[32, 32], &geometry(-1), &coeffs).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::ScaleCountMismatch { expected: -1, .. }
    ));
    let err = unsafe { fdct2d::inverse_unchecked(&lib, &[32, 32], &geometry(4), &coeffs) }
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::ScaleCountMismatch { .. }));
}

#[test]
fn test_angle_count_mismatch() {
    let lib = BlockPartition::default();
    let mut nested = forward_2d([32, 32], 3).into_nested();
    nested[2].pop();
    let coeffs = RaggedCollection::from_nested(nested);
    let err = fdct2d::inverse(&lib, &[32, 32], &geometry(3), &coeffs).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::AngleCountMismatch {
            scale: 2,
            expected: 16,
            actual: 15
        }
    ));
}

#[test]
fn test_shape_mismatch() {
    let lib = BlockPartition::default();
    let mut coeffs = forward_2d([32, 32], 2);
    *coeffs.get_mut(1, 3).unwrap() = Array2::zeros((1, 1));
    let err = fdct2d::inverse(&lib, &[32, 32], &geometry(2), &coeffs).unwrap_err();
    match err.kind() {
        ErrorKind::ShapeMismatch {
            scale,
            angle,
            actual,
            ..
        } => {
            assert_eq!((*scale, *angle), (1, 3));
            assert_eq!(actual, &vec![1, 1]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let coeffs = forward_2d([32, 32], 2);
    let err = fdct2d::inverse(&lib, &[32, 31], &geometry(2), &coeffs).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::ShapeMismatch { .. }));
}

#[test]
fn test_error_messages() {
    let err = fdct2d::forward(
        &BlockPartition::default(),
        &Geometry::new(2, 12, BoundaryMode::Curvelets),
        &data_gen::complex_array(&[8, 8]),
    )
    .unwrap_err();
    assert!(err.to_string().starts_with("invalid geometry"), "{err}");
}
