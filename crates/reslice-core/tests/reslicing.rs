use proptest::prelude::*;
use reslice_core::coordinate::{CoordinateMap, NiftiQForm};
use reslice_core::image::{Dimensions, Orientation, VoxelBuffer};
use reslice_core::slicer::{calc_min_bounding_dimensions, AffineDataSlicer, DataSlicer};
use reslice_core::spatial::{AffineMatrix, Axis, Vector3};
use reslice_core::voxel::{types, ValueScale, VoxelArray, VoxelType};
use std::f64::consts::FRAC_PI_2;

proptest! {
    #[test]
    fn test_point_of_index_round_trip(
        sizes in prop::collection::vec(1usize..6, 1..5),
        seed in any::<u64>()
    ) {
        let dims = Dimensions::new(&sizes, VoxelType::Float).unwrap();
        let point: Vec<i64> = sizes
            .iter()
            .enumerate()
            .map(|(i, &s)| ((seed >> (i * 8)) % s as u64) as i64)
            .collect();
        let index = dims.index(&point).unwrap();
        prop_assert_eq!(dims.point(index), Some(point));
    }

    #[test]
    fn test_identity_scale_is_passthrough(v in -1e9f64..1e9) {
        let scale = ValueScale::new();
        prop_assert!(scale.is_identity());
        prop_assert_eq!(scale.convert(v), v);
    }

    #[test]
    fn test_bounding_box_covers_corners(
        angle in -3.14f64..3.14,
        sx in 0.2f64..3.0, sy in 0.2f64..3.0, sz in 0.2f64..3.0,
        tx in -10.0f64..10.0,
        nx in 1usize..20, ny in 1usize..20, nz in 1usize..20
    ) {
        let m = AffineMatrix::build_translation(tx, 0.0, 0.0)
            .multiply(&AffineMatrix::build_axis_rotation(Axis::Z, angle))
            .multiply(&AffineMatrix::build_scale(sx, sy, sz));
        let sizes = [nx, ny, nz];
        let bounds = calc_min_bounding_dimensions(&m, &sizes).unwrap();

        let mut lo = [f64::INFINITY; 3];
        let mut hi = [f64::NEG_INFINITY; 3];
        for corner in 0..8usize {
            let p = Vector3::new(
                if corner & 1 != 0 { (nx - 1) as f64 } else { 0.0 },
                if corner & 2 != 0 { (ny - 1) as f64 } else { 0.0 },
                if corner & 4 != 0 { (nz - 1) as f64 } else { 0.0 },
            );
            let q = m.product(&p);
            for a in 0..3 {
                lo[a] = lo[a].min(q[a]);
                hi[a] = hi[a].max(q[a]);
            }
        }
        for a in 0..3 {
            prop_assert_eq!(bounds.sizes[a], (hi[a] - lo[a]).ceil() as usize + 1);
            prop_assert_eq!(bounds.origin[a], lo[a]);
        }
    }
}

#[test]
fn test_dimensions_index_scenario() {
    let dims = Dimensions::new(&[4, 3, 2], VoxelType::Short).unwrap();
    assert_eq!(dims.index(&[1, 1, 1]), Some(17));
    assert_eq!(dims.point(17), Some(vec![1, 1, 1]));
}

#[test]
fn test_thresholded_scale_scenario() {
    let mut scale = ValueScale::with_scale(2.0, 0.0);
    scale.set_min_threshold(0.0, 0.0);
    scale.set_max_threshold(100.0, 100.0);
    assert_eq!(scale.convert(-5.0), 0.0);
    assert_eq!(scale.convert(50.0), 100.0);
    assert_eq!(scale.convert(200.0), 100.0);
}

#[test]
fn test_quarter_turn_cube_keeps_bounds() {
    let dims = Dimensions::new(&[10, 10, 10], VoxelType::UnsignedByte).unwrap();
    let rotation = AffineMatrix::build_axis_rotation(Axis::Z, FRAC_PI_2);
    let slicer = AffineDataSlicer::new(&dims, rotation, Orientation::Transverse, None).unwrap();
    assert_eq!(slicer.bounds().sizes, [10, 10, 10]);
    assert_eq!(slicer.number_of_slices(), 10);
    assert_eq!(slicer.slice_dimensions().sizes(), &[10, 10]);
}

#[test]
fn test_qform_scenario() {
    let map = CoordinateMap::nifti_qform(NiftiQForm::new([0.0; 3], 1.0, [2.0; 3], [0.0; 3]));
    let out = map.to_space(&Vector3::new(1.0, 0.0, 0.0), None);
    assert!(out.approx_eq(&Vector3::new(2.0, 0.0, 0.0), 1e-12));
}

#[test]
fn test_saturating_narrowing() {
    assert_eq!(types::int_to_unsigned_byte(-5), 0);
    assert_eq!(types::int_to_unsigned_byte(300), 255);
    assert_eq!(types::int_to_byte(200), 127);
    assert_eq!(types::int_to_byte(-200), -128);
}

#[test]
fn test_rotated_slice_samples_rotated_voxel() {
    // Single bright voxel at (7, 2, 4) in a cube.
    let dims = Dimensions::new(&[10, 10, 10], VoxelType::UnsignedByte).unwrap();
    let mut input = VoxelBuffer::new(dims.clone());
    input.init_data_array();
    input.set_pixel(&[7, 2, 4], 200.0).unwrap();

    let rotation = AffineMatrix::build_axis_rotation(Axis::Z, FRAC_PI_2);
    let slicer = AffineDataSlicer::new(&dims, rotation, Orientation::Transverse, None).unwrap();
    let out = slicer
        .grab_slice_data(&input, 4, 0, &ValueScale::new(), None)
        .unwrap();

    let [x, y] = slicer.slice_point_from_data_indices(&[7, 2, 4]);
    assert_eq!(out.get_pixel(&[x, y]), Some(200.0));
    let lit = out
        .data()
        .unwrap()
        .to_f64_vec()
        .into_iter()
        .filter(|v| *v != 0.0)
        .count();
    assert_eq!(lit, 1);
}

#[test]
fn test_window_level_into_bytes() {
    let dims = Dimensions::new(&[4, 1, 1], VoxelType::Short).unwrap();
    let input =
        VoxelBuffer::from_array(dims.clone(), VoxelArray::from(vec![-1000i16, 0, 500, 3000])).unwrap();
    let mut scale = ValueScale::new();
    scale.set_to_fit_data_in_range(0.0, 1000.0, 0.0, 255.0, true);

    let slicer = reslice_core::PrimaryOrthoDataSlicer::new(
        &dims,
        Orientation::Transverse,
        Some(VoxelType::UnsignedByte),
    );
    let out = slicer.grab_slice_data(&input, 0, 0, &scale, None).unwrap();
    let values = out.data().unwrap().to_f64_vec();
    assert_eq!(values[0], 0.0);
    assert_eq!(values[1], 0.0);
    assert!((values[2] - 128.0).abs() <= 1.0);
    assert_eq!(values[3], 255.0);
}

#[test]
fn test_flipped_input_through_both_slicers() {
    // x stored in reverse: index = 2 - x + 3y + 6z
    let dims = Dimensions::new(&[3, 2, 2], VoxelType::Short)
        .unwrap()
        .with_offset(2)
        .with_increments(&[-1, 3, 6])
        .unwrap();
    let input = VoxelBuffer::from_array(dims.clone(), VoxelArray::from((0..12).collect::<Vec<i16>>()))
        .unwrap();
    assert_eq!(input.get_pixel(&[0, 1, 1]), Some(11.0));

    let scale = ValueScale::new();
    let ortho = reslice_core::PrimaryOrthoDataSlicer::new(&dims, Orientation::Transverse, None);
    let affine =
        AffineDataSlicer::new(&dims, AffineMatrix::identity(), Orientation::Transverse, None).unwrap();
    let expected = [
        vec![2.0, 1.0, 0.0, 5.0, 4.0, 3.0],
        vec![8.0, 7.0, 6.0, 11.0, 10.0, 9.0],
    ];
    for (slice, want) in expected.iter().enumerate() {
        let o = ortho.grab_slice_data(&input, slice, 0, &scale, None).unwrap();
        let a = affine.grab_slice_data(&input, slice, 0, &scale, None).unwrap();
        assert_eq!(&o.data().unwrap().to_f64_vec(), want, "ortho slice {slice}");
        assert_eq!(&a.data().unwrap().to_f64_vec(), want, "affine slice {slice}");
    }

    let sagittal = reslice_core::PrimaryOrthoDataSlicer::new(&dims, Orientation::Sagittal, None);
    let out = sagittal.grab_slice_data(&input, 2, 0, &scale, None).unwrap();
    assert_eq!(out.data().unwrap().to_f64_vec(), vec![0.0, 3.0, 6.0, 9.0]);
}
