//! Main application module for camera position estimation.

use crate::{
    camera_parameters::CameraParameters,
    config::Config,
    correspondence::{collect_correspondences, CorrespondenceSource, ScriptedSource},
    display::{load_image, HeadlessReview, PointPicker, ReviewSurface, ReviewWindow},
    error::Result,
    object_points::load_object_points,
    overlay::MarkerStyle,
    pose_solver::{PoseEstimate, PoseSolver},
    position_writer::write_pose,
    reprojection::{self, Reprojection},
};
use log::info;
use opencv::core::{Mat, Point2d, Point3d};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Text file of object points, one `x,y,z` triple per line
    pub object_points: PathBuf,
    /// Image of the object
    pub image: PathBuf,
    /// `FileStorage` file with `intrinsic` and `distortion`
    pub camera_parameters: PathBuf,
    /// Destination of the camera position file
    pub output: PathBuf,
    /// Recorded clicks replayed instead of interactive picking
    pub image_points: Option<PathBuf>,
    /// Show the reprojection window before writing
    pub review: bool,
    /// Tuning parameters
    pub settings: Config,
}

impl AppConfig {
    /// Configuration for the three required inputs with default settings
    pub fn new(object_points: impl Into<PathBuf>, image: impl Into<PathBuf>, camera_parameters: impl Into<PathBuf>) -> Self {
        let settings = Config::default();
        Self {
            object_points: object_points.into(),
            image: image.into(),
            camera_parameters: camera_parameters.into(),
            output: settings.output.camera_position.clone(),
            image_points: None,
            review: true,
            settings,
        }
    }
}

/// Inputs loaded at pipeline start, read-only afterwards
pub struct PipelineInputs {
    /// Object points in file order
    pub object_points: Vec<Point3d>,
    /// Camera intrinsics and distortion
    pub camera: CameraParameters,
    /// Image the points are marked on
    pub image: Mat,
}

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Marked image points in object point order
    pub image_points: Vec<Point2d>,
    /// Solved pose
    pub estimate: PoseEstimate,
    /// Reprojection diagnostics
    pub reprojection: Reprojection,
    /// File the pose was written to
    pub output: PathBuf,
}

/// Main application struct
pub struct CameraPositionApp {
    config: AppConfig,
    solver: PoseSolver,
    style: MarkerStyle,
}

impl CameraPositionApp {
    /// Create the application, validating its settings
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConfigError`] if the settings are invalid.
    pub fn new(config: AppConfig) -> Result<Self> {
        config.settings.validate()?;
        let solver = PoseSolver::new(config.settings.solver.clone());
        let style = MarkerStyle::from(&config.settings.display);
        Ok(Self { config, solver, style })
    }

    /// Application configuration
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the whole pipeline with the configured point source and review surface
    ///
    /// # Errors
    ///
    /// Returns the first stage failure; nothing is written in that case.
    pub fn run(&self) -> Result<RunSummary> {
        let inputs = self.load_inputs()?;
        let image_points = {
            let mut source = self.correspondence_source(&inputs.image)?;
            collect_correspondences(source.as_mut(), inputs.object_points.len())?
        };
        let mut review = self.review_surface();
        self.finish(&inputs, image_points, review.as_mut())
    }

    /// Run the whole pipeline against caller-supplied surfaces
    ///
    /// # Errors
    ///
    /// Returns the first stage failure; nothing is written in that case.
    pub fn run_with(&self, source: &mut dyn CorrespondenceSource, review: &mut dyn ReviewSurface) -> Result<RunSummary> {
        let inputs = self.load_inputs()?;
        let image_points = collect_correspondences(source, inputs.object_points.len())?;
        self.finish(&inputs, image_points, review)
    }

    /// Load object points, camera parameters and the image
    ///
    /// # Errors
    ///
    /// Returns an error if any input is missing or malformed.
    pub fn load_inputs(&self) -> Result<PipelineInputs> {
        let object_points = load_object_points(&self.config.object_points)?;
        let camera = CameraParameters::load(&self.config.camera_parameters)?;
        let image = load_image(&self.config.image)?;
        Ok(PipelineInputs {
            object_points,
            camera,
            image,
        })
    }

    fn correspondence_source(&self, image: &Mat) -> Result<Box<dyn CorrespondenceSource>> {
        if let Some(path) = &self.config.image_points {
            info!("Replaying image points from {}", path.display());
            return Ok(Box::new(ScriptedSource::from_file(path)?));
        }
        let picker = PointPicker::open(
            &window_name(&self.config.image),
            image,
            self.style,
            self.config.settings.display.poll_interval_ms,
        )?;
        Ok(Box::new(picker))
    }

    fn review_surface(&self) -> Box<dyn ReviewSurface> {
        if self.config.review {
            let name = format!("{} - reprojection", window_name(&self.config.image));
            Box::new(ReviewWindow::new(name, self.config.settings.display.poll_interval_ms))
        } else {
            Box::new(HeadlessReview)
        }
    }

    fn finish(&self, inputs: &PipelineInputs, image_points: Vec<Point2d>, review: &mut dyn ReviewSurface) -> Result<RunSummary> {
        let estimate = self.solver.solve(&inputs.object_points, &image_points, &inputs.camera)?;
        let center = estimate.pose.camera_center();
        info!("Camera centre in object frame: ({:.3}, {:.3}, {:.3})", center.x, center.y, center.z);

        let reprojection = reprojection::evaluate(&inputs.object_points, &image_points, &estimate.pose, &inputs.camera)?;
        let overlay = reprojection::draw_overlay(&inputs.image, &image_points, &reprojection, &self.style)?;
        review.review(&overlay)?;

        write_pose(&self.config.output, &estimate.pose)?;
        Ok(RunSummary {
            image_points,
            estimate,
            reprojection,
            output: self.config.output.clone(),
        })
    }
}

/// Window title for an image: its file name
fn window_name(image: &Path) -> String {
    image
        .file_name()
        .map_or_else(|| image.display().to_string(), |name| name.to_string_lossy().into_owned())
}
