use std::sync::Arc;

use curvelet_memory::NativeHeapRef;
use curvelet_testkit::{CountingHeap, data_gen};

use crate::{BlockPartition, BoundaryMode, Geometry, fdct2d, fdct3d};

fn counting_lib() -> (Arc<CountingHeap>, BlockPartition) {
    let counting = CountingHeap::shared();
    let heap: NativeHeapRef = counting.clone();
    (counting, BlockPartition::new(heap))
}

#[test]
fn test_forward_output_released_in_any_order() {
    let (counting, lib) = counting_lib();
    let geometry = Geometry::new(3, 8, BoundaryMode::Curvelets);
    let x = data_gen::complex_array(&[40, 24]);
    let coeffs = fdct2d::forward(&lib, &geometry, &x).unwrap();
    assert_eq!(counting.live(), coeffs.leaf_count());
    assert_eq!(counting.releases(), 0);

    let mut bands: Vec<_> = coeffs.into_nested().into_iter().flatten().collect();
    fastrand::shuffle(&mut bands);
    while let Some(band) = bands.pop() {
        let live = counting.live();
        drop(band);
        assert_eq!(counting.live(), live - 1);
    }
    counting.assert_balanced();
}

#[test]
fn test_clones_share_one_allocation() {
    let (counting, lib) = counting_lib();
    let geometry = Geometry::new(1, 8, BoundaryMode::Curvelets);
    let x = data_gen::complex_array(&[8, 8]);
    let coeffs = fdct2d::forward(&lib, &geometry, &x).unwrap();
    let band = coeffs[(0, 0)].clone();
    let dynamic = band.clone().into_dyn();
    assert_eq!(band.share_count(), 3);
    drop(coeffs);
    drop(band);
    assert_eq!(counting.live(), 1);
    assert_eq!(dynamic.shape(), &[8, 8]);
    drop(dynamic);
    counting.assert_balanced();
}

#[test]
fn test_inverse_output_owned_by_caller() {
    let (counting, lib) = counting_lib();
    let geometry = Geometry::new(2, 8, BoundaryMode::Curvelets);
    let dims = [6, 12, 30];
    let x = data_gen::complex_array(&dims);
    let coeffs = fdct3d::forward(&lib, &geometry, &x).unwrap();
    let back = fdct3d::inverse(&lib, &dims, &geometry, &coeffs).unwrap();
    assert_eq!(counting.live(), coeffs.leaf_count() + 1);
    drop(coeffs);
    assert_eq!(counting.live(), 1);
    drop(back);
    counting.assert_balanced();
}

#[test]
fn test_coefficients_released_on_other_thread() {
    let (counting, lib) = counting_lib();
    let geometry = Geometry::new(2, 16, BoundaryMode::Wavelets);
    let x = data_gen::complex_array(&[32, 32]);
    let coeffs = fdct2d::forward(&lib, &geometry, &x).unwrap();
    let energy = std::thread::spawn(move || {
        coeffs
            .iter()
            .map(|band| band.view().iter().map(|c| c.norm_sqr()).sum::<f64>())
            .sum::<f64>()
    })
    .join()
    .unwrap();
    let expected: f64 = x.iter().map(|c| c.norm_sqr()).sum();
    assert!((energy - expected).abs() <= 1e-9 * expected);
    counting.assert_balanced();
}

#[test]
fn test_rejected_calls_allocate_nothing() {
    let (counting, lib) = counting_lib();
    let x = data_gen::complex_array(&[16, 16]);
    let bad = Geometry::new(0, 8, BoundaryMode::Curvelets);
    assert!(fdct2d::forward(&lib, &bad, &x).is_err());

    let geometry = Geometry::new(2, 8, BoundaryMode::Curvelets);
    let coeffs = fdct2d::forward(&lib, &geometry, &x).unwrap();
    let allocations = counting.allocations();
    assert!(fdct2d::inverse(&lib, &[16, 15], &geometry, &coeffs).is_err());
    assert_eq!(counting.allocations(), allocations);
    drop(coeffs);
    counting.assert_balanced();
}
