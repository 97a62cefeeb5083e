//! Camera position estimation from a single image of a known object.

use anyhow::{Context, Result};
use camera_position::{
    app::{AppConfig, CameraPositionApp},
    config::Config,
};
use clap::{error::ErrorKind, Parser};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Object points file, one `x,y,z` integer triple per line
    object_points: PathBuf,

    /// Image of the object
    image: PathBuf,

    /// Camera parameter file with `intrinsic` and `distortion`
    camera_parameters: PathBuf,

    /// Where to write the camera position
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Replay `x,y` image points from a file instead of picking them
    #[arg(long)]
    image_points: Option<PathBuf>,

    /// Skip the reprojection review window
    #[arg(long)]
    no_review: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // Usage errors exit with 1 rather than clap's 2
            let _ = e.print();
            std::process::exit(1);
        }
    };

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Camera Position Estimation");

    let settings = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file(path).with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => Config::default(),
    };

    let config = AppConfig {
        output: args
            .output
            .unwrap_or_else(|| settings.output.camera_position.clone()),
        object_points: args.object_points,
        image: args.image,
        camera_parameters: args.camera_parameters,
        image_points: args.image_points,
        review: !args.no_review,
        settings,
    };

    let app = CameraPositionApp::new(config).context("invalid configuration")?;
    let summary = app.run().context("camera position estimation failed")?;

    let pose = &summary.estimate.pose;
    let center = pose.camera_center();
    println!(
        "rvec: [{:.6}, {:.6}, {:.6}]",
        pose.rotation.x, pose.rotation.y, pose.rotation.z
    );
    println!(
        "tvec: [{:.6}, {:.6}, {:.6}]",
        pose.translation.x, pose.translation.y, pose.translation.z
    );
    println!("camera centre: [{:.6}, {:.6}, {:.6}]", center.x, center.y, center.z);
    println!("rms reprojection error: {:.4} px", summary.reprojection.rms_error);
    println!("Write the camera position to {}", summary.output.display());

    Ok(())
}
