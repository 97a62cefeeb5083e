//! Constants used throughout the application

/// Minimum number of correspondences for a PnP solve
pub const MIN_CORRESPONDENCES: usize = 4;

/// Default name of the persisted pose file, written to the working directory
pub const DEFAULT_OUTPUT_FILE: &str = "camera_position.xml";

/// Field names inside the camera parameter file
pub const INTRINSIC_KEY: &str = "intrinsic";
pub const DISTORTION_KEY: &str = "distortion";

/// Field names inside the camera position file
pub const ROTATION_KEY: &str = "rotation";
pub const TRANSLATION_KEY: &str = "translation";

/// Distortion vector lengths accepted by the OpenCV camera model
pub const DISTORTION_LENGTHS: [usize; 5] = [4, 5, 8, 12, 14];

/// Default Levenberg-Marquardt iteration cap
pub const DEFAULT_MAX_ITERATIONS: i32 = 100;

/// Default Levenberg-Marquardt convergence epsilon
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// Singular value ratio under which a point cloud loses a dimension
pub const DEFAULT_DEGENERACY_TOLERANCE: f64 = 1e-6;

/// Marker half-length in pixels
pub const DEFAULT_MARKER_SIZE: i32 = 7;

/// Marker stroke thickness in pixels
pub const DEFAULT_MARKER_THICKNESS: i32 = 2;

/// Interval between highgui event polls
pub const DEFAULT_POLL_INTERVAL_MS: i32 = 30;

/// Key codes that dismiss a display window
pub const KEY_ESCAPE: i32 = 27;
pub const KEY_QUIT: i32 = b'q' as i32;

/// BGR colour of operator-marked points
pub const MARKED_COLOR: (f64, f64, f64) = (0.0, 0.0, 255.0);

/// BGR colour of reprojected points
pub const REPROJECTED_COLOR: (f64, f64, f64) = (255.0, 0.0, 0.0);

/// BGR colour of overlay captions
pub const CAPTION_COLOR: (f64, f64, f64) = (0.0, 255.0, 255.0);
