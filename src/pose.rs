//! Camera extrinsic pose in Rodrigues form.

use crate::{Error, Result};
use nalgebra::{Point3, Rotation3, Vector3};
use opencv::{
    core::{Mat, Point3d},
    prelude::*,
};

/// Camera pose relative to the object frame
///
/// Maps object coordinates into camera coordinates: `X_cam = R(rotation) *
/// X_obj + translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Axis-angle rotation vector (axis scaled by angle in radians)
    pub rotation: Vector3<f64>,
    /// Translation in object units
    pub translation: Vector3<f64>,
}

impl Pose {
    /// Create a pose from rotation and translation vectors
    #[must_use]
    pub fn new(rotation: Vector3<f64>, translation: Vector3<f64>) -> Self {
        Self { rotation, translation }
    }

    /// Rotation as a 3x3 rotation matrix (Rodrigues formula)
    #[must_use]
    pub fn rotation_matrix(&self) -> Rotation3<f64> {
        Rotation3::new(self.rotation)
    }

    /// Camera position expressed in the object frame (`-R^T t`)
    #[must_use]
    pub fn camera_center(&self) -> Vector3<f64> {
        -(self.rotation_matrix().transpose() * self.translation)
    }

    /// Transform an object point into the camera frame
    #[must_use]
    pub fn to_camera(&self, point: &Point3d) -> Point3<f64> {
        let p = Point3::new(point.x, point.y, point.z);
        self.rotation_matrix() * p + self.translation
    }

    /// Whether both vectors hold only finite values
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.rotation.iter().chain(self.translation.iter()).all(|v| v.is_finite())
    }

    /// Rotation vector as a 3x1 CV_64F `Mat`
    ///
    /// # Errors
    ///
    /// Returns an error if OpenCV fails to allocate the matrix.
    pub fn rvec_mat(&self) -> Result<Mat> {
        vector_to_mat(&self.rotation)
    }

    /// Translation vector as a 3x1 CV_64F `Mat`
    ///
    /// # Errors
    ///
    /// Returns an error if OpenCV fails to allocate the matrix.
    pub fn tvec_mat(&self) -> Result<Mat> {
        vector_to_mat(&self.translation)
    }

    /// Build a pose from OpenCV rvec/tvec outputs
    ///
    /// # Errors
    ///
    /// Returns an error if either matrix does not hold three CV_64F values.
    pub fn from_mats(rvec: &Mat, tvec: &Mat) -> Result<Self> {
        Ok(Self {
            rotation: mat_to_vector(rvec)?,
            translation: mat_to_vector(tvec)?,
        })
    }
}

fn vector_to_mat(v: &Vector3<f64>) -> Result<Mat> {
    Ok(Mat::from_slice_2d(&[[v.x], [v.y], [v.z]])?)
}

fn mat_to_vector(mat: &Mat) -> Result<Vector3<f64>> {
    if mat.total() != 3 {
        return Err(Error::InvalidInput(format!(
            "expected a 3-element vector, got {}x{}",
            mat.rows(),
            mat.cols()
        )));
    }
    let values = mat.data_typed::<f64>()?;
    Ok(Vector3::new(values[0], values[1], values[2]))
}
