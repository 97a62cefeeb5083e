//! Tests for the object point and camera parameter loaders


use camera_position::{camera_parameters::CameraParameters, object_points::load_object_points, Error};
use nalgebra::Matrix3;
use opencv::core::Point3d;
use test_helpers::*;

#[test]
fn test_object_points_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_object_points(dir.path(), &cube_corners());
    assert_eq!(load_object_points(&path).unwrap(), cube_corners());
}

#[test]
fn test_object_points_tolerate_whitespace_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.txt");
    std::fs::write(&path, "0,0,0\r\n\n 10 , 0 , 0 \n0,10,0\n0,0,-10\n\n").unwrap();

    let points = load_object_points(&path).unwrap();
    assert_eq!(
        points,
        vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(10.0, 0.0, 0.0),
            Point3d::new(0.0, 10.0, 0.0),
            Point3d::new(0.0, 0.0, -10.0),
        ]
    );
}

#[test]
fn test_object_points_missing_file() {
    let result = load_object_points("/nonexistent/points.txt");
    assert!(matches!(result, Err(Error::FileNotFound(_))));
}

#[test]
fn test_object_points_reject_non_integers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.txt");
    std::fs::write(&path, "0,0,0\n1.5,2,3\n").unwrap();

    match load_object_points(&path) {
        Err(Error::MalformedInput(msg)) => assert!(msg.contains("line 2")),
        other => panic!("expected MalformedInput, got {other:?}"),
    }
}

#[test]
fn test_camera_parameters_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("camera.xml");
    let intrinsic = Matrix3::new(812.5, 0.0, 319.75, 0.0, 815.25, 241.125, 0.0, 0.0, 1.0);
    let distortion = vec![-0.21, 0.075, 0.0012, -0.0009, 0.0031];
    let camera = CameraParameters::new(intrinsic, distortion).unwrap();

    camera.save(&path).unwrap();
    assert_eq!(CameraParameters::load(&path).unwrap(), camera);
}

#[test]
fn test_camera_parameters_yaml_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("camera.yml");
    let camera = synthetic_camera();
    camera.save(&path).unwrap();
    assert_eq!(CameraParameters::load(&path).unwrap(), camera);
}

#[test]
fn test_camera_parameters_from_opencv_xml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("camera.xml");
    std::fs::write(
        &path,
        r#"<?xml version="1.0"?>
<opencv_storage>
<intrinsic type_id="opencv-matrix">
  <rows>3</rows>
  <cols>3</cols>
  <dt>d</dt>
  <data>500. 0. 320. 0. 500. 320. 0. 0. 1.</data></intrinsic>
<distortion type_id="opencv-matrix">
  <rows>5</rows>
  <cols>1</cols>
  <dt>d</dt>
  <data>0. 0. 0. 0. 0.</data></distortion>
</opencv_storage>
"#,
    )
    .unwrap();

    assert_eq!(CameraParameters::load(&path).unwrap(), synthetic_camera());
}

#[test]
fn test_camera_parameters_missing_distortion() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("camera.xml");
    std::fs::write(
        &path,
        r#"<?xml version="1.0"?>
<opencv_storage>
<intrinsic type_id="opencv-matrix">
  <rows>3</rows>
  <cols>3</cols>
  <dt>d</dt>
  <data>500. 0. 320. 0. 500. 320. 0. 0. 1.</data></intrinsic>
</opencv_storage>
"#,
    )
    .unwrap();

    match CameraParameters::load(&path) {
        Err(Error::MalformedInput(msg)) => assert!(msg.contains("distortion")),
        other => panic!("expected MalformedInput, got {other:?}"),
    }
}

#[test]
fn test_camera_parameters_missing_file() {
    let result = CameraParameters::load("/nonexistent/camera.xml");
    assert!(matches!(result, Err(Error::FileNotFound(_))));
}
