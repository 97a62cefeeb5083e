//! Configuration management for the camera position estimator

use crate::{
    constants::{
        DEFAULT_DEGENERACY_TOLERANCE, DEFAULT_EPSILON, DEFAULT_MARKER_SIZE, DEFAULT_MARKER_THICKNESS,
        DEFAULT_MAX_ITERATIONS, DEFAULT_OUTPUT_FILE, DEFAULT_POLL_INTERVAL_MS,
    },
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pose solver configuration
    pub solver: SolverConfig,

    /// Display configuration
    pub display: DisplayConfig,

    /// Output configuration
    pub output: OutputConfig,
}

/// Pose solver parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Accept coplanar object points (solved with IPPE)
    pub allow_planar: bool,

    /// Maximum Levenberg-Marquardt iterations
    pub max_iterations: i32,

    /// Refinement convergence threshold
    pub epsilon: f64,

    /// Relative spread below which a point cloud dimension counts as flat
    pub degeneracy_tolerance: f64,
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Half-length of marker cross arms in pixels
    pub marker_size: i32,

    /// Marker stroke thickness in pixels
    pub marker_thickness: i32,

    /// Event polling interval of the picking window in milliseconds
    pub poll_interval_ms: i32,

    /// Draw point indices next to markers
    pub show_labels: bool,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Camera position file written after a successful solve
    pub camera_position: PathBuf,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            allow_planar: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            epsilon: DEFAULT_EPSILON,
            degeneracy_tolerance: DEFAULT_DEGENERACY_TOLERANCE,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            marker_size: DEFAULT_MARKER_SIZE,
            marker_thickness: DEFAULT_MARKER_THICKNESS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            show_labels: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            camera_position: PathBuf::from(DEFAULT_OUTPUT_FILE),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| Error::write_failure(path, e))?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.solver.max_iterations <= 0 {
            return Err(Error::ConfigError(
                "Solver max_iterations must be greater than 0".to_string(),
            ));
        }
        if !(self.solver.epsilon.is_finite() && self.solver.epsilon > 0.0) {
            return Err(Error::ConfigError("Solver epsilon must be positive".to_string()));
        }
        if !(0.0..1.0).contains(&self.solver.degeneracy_tolerance) {
            return Err(Error::ConfigError(
                "Degeneracy tolerance must be in [0.0, 1.0)".to_string(),
            ));
        }

        if self.display.marker_size <= 0 {
            return Err(Error::ConfigError("Marker size must be greater than 0".to_string()));
        }
        if self.display.marker_thickness <= 0 {
            return Err(Error::ConfigError(
                "Marker thickness must be greater than 0".to_string(),
            ));
        }
        if self.display.poll_interval_ms <= 0 {
            return Err(Error::ConfigError(
                "Poll interval must be greater than 0".to_string(),
            ));
        }

        if self.output.camera_position.as_os_str().is_empty() {
            return Err(Error::ConfigError("Output path must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Camera Position Configuration

# Pose solver
solver:
  allow_planar: false
  max_iterations: 100
  epsilon: 1.0e-10
  degeneracy_tolerance: 1.0e-6

# Point picking and review windows
display:
  marker_size: 7
  marker_thickness: 2
  poll_interval_ms: 30
  show_labels: true

# Output
output:
  camera_position: "camera_position.xml"
"#;
