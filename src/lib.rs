//! Camera extrinsic pose estimation from a single image of a known object.
//!
//! Given the 3D coordinates of points on an object, an image of that object
//! and the camera's intrinsic calibration, the library recovers where the
//! camera was when the image was taken:
//! 1. Object points and camera parameters are loaded from disk
//! 2. An operator marks the matching image points, in order
//! 3. The pose is solved with `PnP` (Perspective-n-Point) plus
//!    Levenberg-Marquardt refinement
//! 4. The object points are reprojected to check the fit
//! 5. Rotation and translation are written to an `OpenCV` `FileStorage` file
//!
//! # Examples
//!
//! ## Solving from known correspondences
//!
//! ```no_run
//! use camera_position::{
//!     camera_parameters::CameraParameters, object_points::load_object_points,
//!     pose_solver::PoseSolver, position_writer::write_pose,
//! };
//! use opencv::core::Point2d;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let object = load_object_points("points.txt")?;
//! let camera = CameraParameters::load("camera.xml")?;
//! let image = vec![
//!     Point2d::new(320.0, 320.0),
//!     Point2d::new(370.0, 320.0),
//!     Point2d::new(320.0, 370.0),
//!     Point2d::new(331.0, 331.0),
//! ];
//!
//! let estimate = PoseSolver::default().solve(&object, &image, &camera)?;
//! println!("rvec {:?} tvec {:?}", estimate.pose.rotation, estimate.pose.translation);
//! write_pose("camera_position.xml", &estimate.pose)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Full pipeline with recorded clicks
//!
//! ```no_run
//! use camera_position::{
//!     app::{AppConfig, CameraPositionApp},
//!     correspondence::ScriptedSource,
//!     display::HeadlessReview,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let app = CameraPositionApp::new(AppConfig::new("points.txt", "image.png", "camera.xml"))?;
//! let mut clicks = ScriptedSource::from_file("clicks.txt")?;
//! let summary = app.run_with(&mut clicks, &mut HeadlessReview)?;
//! println!("rms reprojection error: {:.3} px", summary.reprojection.rms_error);
//! # Ok(())
//! # }
//! ```

/// Object point file loading
pub mod object_points;

/// Camera intrinsics and distortion
pub mod camera_parameters;

/// `OpenCV` `FileStorage` access
pub mod storage;

/// Camera pose representation
pub mod pose;

/// Operator point collection state machine
pub mod correspondence;

/// highgui picking and review windows
pub mod display;

/// Marker drawing
pub mod overlay;

/// `PnP` pose solver
pub mod pose_solver;

/// Reprojection diagnostics
pub mod reprojection;

/// Camera position output
pub mod position_writer;

/// Parsing and pixel helpers
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
