//! Camera intrinsics and lens distortion, loaded from an OpenCV parameter file.

use crate::{
    constants::{DISTORTION_KEY, DISTORTION_LENGTHS, INTRINSIC_KEY},
    storage::{StorageReader, StorageWriter},
    Error, Result,
};
use log::{debug, info};
use nalgebra::Matrix3;
use opencv::core::Mat;
use std::path::Path;

/// Pre-computed intrinsic calibration of the camera
#[derive(Debug, Clone, PartialEq)]
pub struct CameraParameters {
    /// 3x3 intrinsic matrix (focal lengths, principal point)
    pub intrinsic: Matrix3<f64>,
    /// Distortion coefficients in OpenCV order (k1, k2, p1, p2[, k3, ...])
    pub distortion: Vec<f64>,
}

impl CameraParameters {
    /// Build camera parameters, validating the distortion vector length
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] if the distortion vector length is
    /// not one the OpenCV camera model accepts.
    pub fn new(intrinsic: Matrix3<f64>, distortion: Vec<f64>) -> Result<Self> {
        if !DISTORTION_LENGTHS.contains(&distortion.len()) {
            return Err(Error::MalformedInput(format!(
                "distortion must have one of {:?} coefficients, got {}",
                DISTORTION_LENGTHS,
                distortion.len()
            )));
        }
        if intrinsic.iter().chain(distortion.iter()).any(|v| !v.is_finite()) {
            return Err(Error::MalformedInput("camera parameters contain non-finite values".to_string()));
        }
        Ok(Self { intrinsic, distortion })
    }

    /// Pinhole parameters with no lens distortion
    #[must_use]
    pub fn pinhole(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            intrinsic: Matrix3::new(fx, 0.0, cx, 0.0, fy, cy, 0.0, 0.0, 1.0),
            distortion: vec![0.0; 5],
        }
    }

    /// Load `intrinsic` and `distortion` from a `FileStorage` file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened ([`Error::FileNotFound`])
    /// - Either field is absent or empty ([`Error::MalformedInput`])
    /// - The intrinsic matrix is not 3x3 ([`Error::MalformedInput`])
    /// - The distortion vector has an unsupported length ([`Error::MalformedInput`])
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading camera parameters from: {}", path.display());

        let reader = StorageReader::open(path)?;
        let intrinsic = reader
            .read_matrix(INTRINSIC_KEY)?
            .ok_or_else(|| Error::MalformedInput(format!("missing or empty field \"{INTRINSIC_KEY}\"")))?;
        let distortion = reader
            .read_matrix(DISTORTION_KEY)?
            .ok_or_else(|| Error::MalformedInput(format!("missing or empty field \"{DISTORTION_KEY}\"")))?;

        if intrinsic.rows != 3 || intrinsic.cols != 3 {
            return Err(Error::MalformedInput(format!(
                "field \"{INTRINSIC_KEY}\" must be 3x3, got {}x{}",
                intrinsic.rows, intrinsic.cols
            )));
        }
        if distortion.rows != 1 && distortion.cols != 1 {
            return Err(Error::MalformedInput(format!(
                "field \"{DISTORTION_KEY}\" must be a vector, got {}x{}",
                distortion.rows, distortion.cols
            )));
        }

        let params = Self::new(Matrix3::from_row_slice(&intrinsic.data), distortion.data)?;
        debug!("intrinsic: {}", params.intrinsic);
        debug!("distortion: {:?}", params.distortion);
        Ok(params)
    }

    /// Write both fields so that [`CameraParameters::load`] reads them back
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailure`] if the destination cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = StorageWriter::create(path)?;
        let intrinsic: Vec<f64> = self.intrinsic.transpose().iter().copied().collect();
        writer.write_matrix(INTRINSIC_KEY, 3, 3, &intrinsic)?;
        writer.write_matrix(DISTORTION_KEY, 1, self.distortion.len(), &self.distortion)?;
        writer.finish()?;
        info!("Wrote camera parameters to {}", path.display());
        Ok(())
    }

    /// Horizontal focal length in pixels
    #[must_use]
    pub fn fx(&self) -> f64 {
        self.intrinsic[(0, 0)]
    }

    /// Vertical focal length in pixels
    #[must_use]
    pub fn fy(&self) -> f64 {
        self.intrinsic[(1, 1)]
    }

    /// Principal point in pixels
    #[must_use]
    pub fn principal_point(&self) -> (f64, f64) {
        (self.intrinsic[(0, 2)], self.intrinsic[(1, 2)])
    }

    /// Intrinsic matrix as a 3x3 CV_64F `Mat`
    ///
    /// # Errors
    ///
    /// Returns an error if OpenCV fails to allocate the matrix.
    pub fn intrinsic_mat(&self) -> Result<Mat> {
        let rows: Vec<[f64; 3]> = self
            .intrinsic
            .row_iter()
            .map(|row| [row[0], row[1], row[2]])
            .collect();
        Ok(Mat::from_slice_2d(&rows)?)
    }

    /// Distortion coefficients as a 1xK CV_64F `Mat`
    ///
    /// # Errors
    ///
    /// Returns an error if OpenCV fails to allocate the matrix.
    pub fn distortion_mat(&self) -> Result<Mat> {
        Ok(Mat::from_slice_2d(&[self.distortion.as_slice()])?)
    }
}
