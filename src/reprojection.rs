//! Reprojection of the object points through a solved pose.
//!
//! The reprojected points are diagnostic only: they are compared with the
//! operator's clicks on screen and summarised as residuals, but never
//! persisted.

use crate::{
    camera_parameters::CameraParameters,
    constants::{MARKED_COLOR, REPROJECTED_COLOR},
    overlay::{bgr, draw_caption, draw_cross, MarkerStyle},
    pose::Pose,
    pose_solver::object_points_mat,
    utils::pixel_distance,
    Error, Result,
};
use log::{debug, info};
use opencv::{
    calib3d,
    core::{Mat, Point2d, Point3d},
    prelude::*,
};

/// Result of reprojecting the object points
#[derive(Debug, Clone, PartialEq)]
pub struct Reprojection {
    /// Object points projected through the pose, in object point order
    pub points: Vec<Point2d>,
    /// Pixel distance between each marked point and its reprojection
    pub residuals: Vec<f64>,
    /// Root-mean-square of the residuals
    pub rms_error: f64,
}

impl Reprojection {
    /// Largest single residual, or 0 for an empty set
    #[must_use]
    pub fn max_error(&self) -> f64 {
        self.residuals.iter().copied().fold(0.0, f64::max)
    }
}

/// Project object points through the pose and camera model
///
/// # Errors
///
/// Returns an error if OpenCV projection fails.
pub fn project_points(object: &[Point3d], pose: &Pose, camera: &CameraParameters) -> Result<Vec<Point2d>> {
    if object.is_empty() {
        return Ok(Vec::new());
    }

    let object_mat = object_points_mat(object)?;
    let mut image_points = Mat::default();
    calib3d::project_points(
        &object_mat,
        &pose.rvec_mat()?,
        &pose.tvec_mat()?,
        &camera.intrinsic_mat()?,
        &camera.distortion_mat()?,
        &mut image_points,
        &mut Mat::default(),
        0.0,
    )?;

    Ok(image_points.data_typed::<Point2d>()?.to_vec())
}

/// Root-mean-square distance between paired points
#[must_use]
pub fn rms(observed: &[Point2d], projected: &[Point2d]) -> f64 {
    if observed.is_empty() {
        return 0.0;
    }
    let sum: f64 = observed
        .iter()
        .zip(projected)
        .map(|(&a, &b)| pixel_distance(a, b).powi(2))
        .sum();
    (sum / observed.len() as f64).sqrt()
}

/// Reproject the object points and measure them against the marked points
///
/// # Errors
///
/// Returns an error if the sequences differ in length or projection fails.
pub fn evaluate(object: &[Point3d], marked: &[Point2d], pose: &Pose, camera: &CameraParameters) -> Result<Reprojection> {
    if object.len() != marked.len() {
        return Err(Error::MalformedInput(format!(
            "{} object points but {} marked points",
            object.len(),
            marked.len()
        )));
    }

    let points = project_points(object, pose, camera)?;
    let residuals: Vec<f64> = marked
        .iter()
        .zip(&points)
        .map(|(&a, &b)| pixel_distance(a, b))
        .collect();
    for (i, (point, residual)) in points.iter().zip(&residuals).enumerate() {
        debug!("point {}: reprojected ({:.2}, {:.2}), error {:.3} px", i, point.x, point.y, residual);
    }

    let rms_error = rms(marked, &points);
    let reprojection = Reprojection {
        points,
        residuals,
        rms_error,
    };
    info!(
        "Reprojection error: rms {:.3} px, max {:.3} px",
        reprojection.rms_error,
        reprojection.max_error()
    );
    Ok(reprojection)
}

/// Draw marked points (red) and reprojected points (blue) over a copy of `image`
///
/// # Errors
///
/// Returns an error if any point is not drawable or OpenCV drawing fails.
pub fn draw_overlay(image: &Mat, marked: &[Point2d], reprojection: &Reprojection, style: &MarkerStyle) -> Result<Mat> {
    let mut canvas = image.try_clone()?;
    for &point in marked {
        draw_cross(&mut canvas, point, bgr(MARKED_COLOR), style)?;
    }
    for &point in &reprojection.points {
        draw_cross(&mut canvas, point, bgr(REPROJECTED_COLOR), style)?;
    }
    draw_caption(
        &mut canvas,
        0,
        &format!(
            "red: marked  blue: reprojected  rms {:.2} px  max {:.2} px",
            reprojection.rms_error,
            reprojection.max_error()
        ),
    )?;
    draw_caption(&mut canvas, 1, "press any key or close the window to continue")?;
    Ok(canvas)
}
