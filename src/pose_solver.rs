//! Perspective-n-Point solver for the camera pose.
//!
//! A closed-form estimate (EPnP, or IPPE for planar targets) seeds a
//! Levenberg-Marquardt refinement of the reprojection error. Inputs that
//! cannot constrain a unique pose are rejected before OpenCV is called, and
//! the refined pose is checked before it is handed on.

use crate::{
    camera_parameters::CameraParameters,
    config::SolverConfig,
    constants::MIN_CORRESPONDENCES,
    pose::Pose,
    reprojection, Error, Result,
};
use log::{debug, info};
use nalgebra::{Matrix2, Matrix3, Vector2, Vector3};
use opencv::{
    calib3d,
    core::{Mat, Point2d, Point3d, TermCriteria, TermCriteria_Type},
    prelude::*,
};

/// Shape of the object point cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetLayout {
    /// Points span all three dimensions
    Volumetric,
    /// All points lie on a common plane
    Planar,
}

/// Solved pose plus its fit quality
#[derive(Debug, Clone, PartialEq)]
pub struct PoseEstimate {
    /// Estimated camera pose
    pub pose: Pose,
    /// Root-mean-square reprojection error over the correspondences, in pixels
    pub rms_error: f64,
    /// Layout of the object points the pose was solved from
    pub layout: TargetLayout,
}

/// PnP pose solver
#[derive(Debug, Clone, Default)]
pub struct PoseSolver {
    config: SolverConfig,
}

impl PoseSolver {
    /// Create a solver with the given settings
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Solver settings
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Estimate the camera pose from positional 3D/2D correspondences
    ///
    /// `object[i]` must be the object point that was marked at `image[i]`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The two sequences differ in length ([`Error::MalformedInput`])
    /// - Fewer than four correspondences are given ([`Error::InsufficientCorrespondences`])
    /// - The object points are collinear, or coplanar while planar targets are
    ///   disabled, or the image points are collinear ([`Error::DegenerateGeometry`])
    /// - The solved pose is non-finite or puts points behind the camera
    ///   ([`Error::DegenerateGeometry`])
    /// - OpenCV operations fail
    pub fn solve(&self, object: &[Point3d], image: &[Point2d], camera: &CameraParameters) -> Result<PoseEstimate> {
        if object.len() != image.len() {
            return Err(Error::MalformedInput(format!(
                "{} object points but {} image points",
                object.len(),
                image.len()
            )));
        }
        if object.len() < MIN_CORRESPONDENCES {
            return Err(Error::InsufficientCorrespondences {
                required: MIN_CORRESPONDENCES,
                provided: object.len(),
            });
        }

        let layout = classify_object_points(object, self.config.degeneracy_tolerance)?;
        if layout == TargetLayout::Planar && !self.config.allow_planar {
            return Err(Error::DegenerateGeometry(
                "object points are coplanar (enable solver.allow_planar for planar targets)".to_string(),
            ));
        }
        check_image_points(image, self.config.degeneracy_tolerance)?;

        let object_mat = object_points_mat(object)?;
        let image_mat = image_points_mat(image)?;
        let camera_matrix = camera.intrinsic_mat()?;
        let dist_coeffs = camera.distortion_mat()?;

        let method = match layout {
            TargetLayout::Volumetric => calib3d::SOLVEPNP_EPNP,
            TargetLayout::Planar => calib3d::SOLVEPNP_IPPE,
        };
        debug!("Initial estimate with {:?} layout, {} correspondences", layout, object.len());

        let mut rvec = Mat::default();
        let mut tvec = Mat::default();
        let found = calib3d::solve_pnp(
            &object_mat,
            &image_mat,
            &camera_matrix,
            &dist_coeffs,
            &mut rvec,
            &mut tvec,
            false,
            method,
        )?;
        if !found {
            return Err(Error::DegenerateGeometry(
                "closed-form PnP found no pose for these correspondences".to_string(),
            ));
        }
        debug!("initial pose: {:?}", Pose::from_mats(&rvec, &tvec)?);

        let criteria = TermCriteria::new(
            TermCriteria_Type::COUNT as i32 + TermCriteria_Type::EPS as i32,
            self.config.max_iterations,
            self.config.epsilon,
        )?;
        calib3d::solve_pnp_refine_lm(
            &object_mat,
            &image_mat,
            &camera_matrix,
            &dist_coeffs,
            &mut rvec,
            &mut tvec,
            criteria,
        )?;

        let pose = Pose::from_mats(&rvec, &tvec)?;
        validate_pose(&pose, object)?;

        let projected = reprojection::project_points(object, &pose, camera)?;
        let rms_error = reprojection::rms(image, &projected);
        info!(
            "Solved pose: rvec={:?} tvec={:?} (rms {:.4} px)",
            pose.rotation.as_slice(),
            pose.translation.as_slice(),
            rms_error
        );

        Ok(PoseEstimate { pose, rms_error, layout })
    }
}

/// Classify the object point cloud, rejecting clouds without a 2D extent
///
/// Compares the singular values of the centred cloud: the second against the
/// first detects collinearity, the third detects coplanarity.
///
/// # Errors
///
/// Returns [`Error::DegenerateGeometry`] if the points coincide or are collinear.
pub fn classify_object_points(points: &[Point3d], tolerance: f64) -> Result<TargetLayout> {
    let centroid = points
        .iter()
        .fold(Vector3::<f64>::zeros(), |acc, p| acc + Vector3::new(p.x, p.y, p.z))
        / points.len().max(1) as f64;
    let scatter = points.iter().fold(Matrix3::<f64>::zeros(), |acc, p| {
        let d = Vector3::new(p.x, p.y, p.z) - centroid;
        acc + d * d.transpose()
    });

    let spread = sorted_spread(scatter.symmetric_eigenvalues().as_slice());
    debug!("object point spread: {:?}", spread);
    if spread[0] <= f64::EPSILON {
        return Err(Error::DegenerateGeometry("object points coincide".to_string()));
    }
    if spread[1] / spread[0] < tolerance {
        return Err(Error::DegenerateGeometry("object points are collinear".to_string()));
    }
    if spread[2] / spread[0] < tolerance {
        return Ok(TargetLayout::Planar);
    }
    Ok(TargetLayout::Volumetric)
}

/// Reject image points that all fall on one line
///
/// # Errors
///
/// Returns [`Error::DegenerateGeometry`] if the points coincide or are collinear.
pub fn check_image_points(points: &[Point2d], tolerance: f64) -> Result<()> {
    let centroid = points
        .iter()
        .fold(Vector2::<f64>::zeros(), |acc, p| acc + Vector2::new(p.x, p.y))
        / points.len().max(1) as f64;
    let scatter = points.iter().fold(Matrix2::<f64>::zeros(), |acc, p| {
        let d = Vector2::new(p.x, p.y) - centroid;
        acc + d * d.transpose()
    });

    let spread = sorted_spread(scatter.symmetric_eigenvalues().as_slice());
    if spread[0] <= f64::EPSILON || spread[1] / spread[0] < tolerance {
        return Err(Error::DegenerateGeometry("image points are collinear".to_string()));
    }
    Ok(())
}

/// Singular values of the centred cloud, largest first
fn sorted_spread(eigenvalues: &[f64]) -> Vec<f64> {
    let mut spread: Vec<f64> = eigenvalues.iter().map(|l| l.max(0.0).sqrt()).collect();
    spread.sort_by(|a, b| b.total_cmp(a));
    spread
}

fn validate_pose(pose: &Pose, object: &[Point3d]) -> Result<()> {
    if !pose.is_finite() {
        return Err(Error::DegenerateGeometry("solver produced a non-finite pose".to_string()));
    }
    if let Some(idx) = object.iter().position(|p| pose.to_camera(p).z <= 0.0) {
        return Err(Error::DegenerateGeometry(format!(
            "solved pose places object point {idx} behind the camera"
        )));
    }
    Ok(())
}

/// Object points as a 1xN CV_64FC3 `Mat`
pub(crate) fn object_points_mat(points: &[Point3d]) -> Result<Mat> {
    Ok(Mat::from_slice(points)?.try_clone()?)
}

/// Image points as a 1xN CV_64FC2 `Mat`
pub(crate) fn image_points_mat(points: &[Point2d]) -> Result<Mat> {
    Ok(Mat::from_slice(points)?.try_clone()?)
}
