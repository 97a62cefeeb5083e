//! Pose recovery and rejection tests for the PnP solver


use approx::assert_abs_diff_eq;
use camera_position::{
    config::SolverConfig,
    pose_solver::{PoseSolver, TargetLayout},
    Error,
};
use nalgebra::Vector3;
use opencv::core::{Point2d, Point3d};
use test_helpers::*;

#[test]
fn test_tetrahedron_recovery() {
    let object = tetrahedron();
    let image = observe(&object, &identity_pose()).unwrap();

    // Projections under the identity pose are known exactly
    let expected = [(320.0, 320.0), (370.0, 320.0), (320.0, 370.0), (320.0, 320.0)];
    for (p, (x, y)) in image.iter().zip(expected) {
        assert_abs_diff_eq!(p.x, x, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, y, epsilon = 1e-9);
    }

    let estimate = PoseSolver::default()
        .solve(&object, &image, &synthetic_camera())
        .expect("tetrahedron should solve");
    assert_eq!(estimate.layout, TargetLayout::Volumetric);
    assert_abs_diff_eq!(estimate.pose.rotation, Vector3::zeros(), epsilon = 1e-3);
    assert_abs_diff_eq!(estimate.pose.translation, Vector3::new(0.0, 0.0, 100.0), epsilon = 1e-3);
    assert!(estimate.rms_error < 1e-3);
}

#[test]
fn test_oblique_pose_recovery() {
    let truth = oblique_pose();
    let object = cube_corners();
    let image = observe(&object, &truth).unwrap();

    let estimate = PoseSolver::default().solve(&object, &image, &synthetic_camera()).unwrap();
    assert_abs_diff_eq!(estimate.pose.rotation, truth.rotation, epsilon = 1e-4);
    assert_abs_diff_eq!(estimate.pose.translation, truth.translation, epsilon = 1e-3);
    assert_abs_diff_eq!(estimate.pose.camera_center(), truth.camera_center(), epsilon = 1e-2);
}

#[test]
fn test_noisy_observations_still_converge() {
    let truth = oblique_pose();
    let object = cube_corners();
    let offsets = [0.3, -0.2, 0.1, -0.4, 0.25, -0.1, 0.2];
    let image: Vec<Point2d> = observe(&object, &truth)
        .unwrap()
        .iter()
        .zip(offsets)
        .map(|(p, d)| Point2d::new(p.x + d, p.y - d))
        .collect();

    let estimate = PoseSolver::default().solve(&object, &image, &synthetic_camera()).unwrap();
    assert!(estimate.rms_error > 0.0);
    assert!(estimate.rms_error < 1.0);
    assert_abs_diff_eq!(estimate.pose.translation, truth.translation, epsilon = 5.0);
}

#[test]
fn test_too_few_correspondences() {
    let object = tetrahedron();
    let image = observe(&object, &identity_pose()).unwrap();

    for n in 0..=3 {
        match PoseSolver::default().solve(&object[..n], &image[..n], &synthetic_camera()) {
            Err(Error::InsufficientCorrespondences { required, provided }) => {
                assert_eq!(required, 4);
                assert_eq!(provided, n);
            }
            other => panic!("expected InsufficientCorrespondences for {n} points, got {other:?}"),
        }
    }
}

#[test]
fn test_length_mismatch_rejected() {
    let object = cube_corners();
    let image = observe(&object, &oblique_pose()).unwrap();
    let result = PoseSolver::default().solve(&object, &image[..5], &synthetic_camera());
    assert!(matches!(result, Err(Error::MalformedInput(_))));
}

#[test]
fn test_coplanar_rejected_by_default() {
    let object = square();
    let image = observe(&object, &oblique_pose()).unwrap();
    let result = PoseSolver::default().solve(&object, &image, &synthetic_camera());
    assert!(matches!(result, Err(Error::DegenerateGeometry(_))));
}

#[test]
fn test_coplanar_accepted_when_enabled() {
    let truth = oblique_pose();
    let object = square();
    let image = observe(&object, &truth).unwrap();
    let solver = PoseSolver::new(SolverConfig {
        allow_planar: true,
        ..SolverConfig::default()
    });

    let estimate = solver.solve(&object, &image, &synthetic_camera()).unwrap();
    assert_eq!(estimate.layout, TargetLayout::Planar);
    assert_abs_diff_eq!(estimate.pose.rotation, truth.rotation, epsilon = 1e-4);
    assert_abs_diff_eq!(estimate.pose.translation, truth.translation, epsilon = 1e-3);
}

#[test]
fn test_collinear_rejected() {
    let object: Vec<Point3d> = (0..5).map(|i| Point3d::new(5.0 * f64::from(i), 0.0, 2.0 * f64::from(i))).collect();
    let image = observe(&object, &identity_pose()).unwrap();
    let solver = PoseSolver::new(SolverConfig {
        allow_planar: true,
        ..SolverConfig::default()
    });
    let result = solver.solve(&object, &image, &synthetic_camera());
    assert!(matches!(result, Err(Error::DegenerateGeometry(_))));
}

#[test]
fn test_collinear_image_points_rejected() {
    let object = cube_corners();
    let image: Vec<Point2d> = (0..object.len()).map(|i| Point2d::new(100.0 + 10.0 * i as f64, 200.0)).collect();
    let result = PoseSolver::default().solve(&object, &image, &synthetic_camera());
    assert!(matches!(result, Err(Error::DegenerateGeometry(_))));
}

#[test]
fn test_permuted_image_points_change_the_pose() {
    let truth = oblique_pose();
    let object = cube_corners();
    let mut image = observe(&object, &truth).unwrap();
    image.swap(1, 4);
    image.swap(2, 6);

    match PoseSolver::default().solve(&object, &image, &synthetic_camera()) {
        Err(_) => {}
        Ok(estimate) => {
            let rotation_error = (estimate.pose.rotation - truth.rotation).norm();
            let translation_error = (estimate.pose.translation - truth.translation).norm();
            assert!(
                rotation_error > 1e-2 || translation_error > 1e-2 || estimate.rms_error > 1.0,
                "permuted correspondences reproduced the true pose"
            );
        }
    }
}
