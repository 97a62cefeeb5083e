//! Loader for the known 3D object-frame coordinates.
//!
//! The source is plain text with one `x,y,z` integer triple per line. Line
//! order is the correspondence key: the i-th point pairs with the i-th
//! clicked image point.

use crate::{utils::parse_fields, Error, Result};
use log::{debug, info};
use opencv::core::Point3d;
use std::fs;
use std::path::Path;

/// Load object points from a text file
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened ([`Error::FileNotFound`])
/// - Any non-blank line is not an integer triple ([`Error::MalformedInput`])
/// - The file contains no points ([`Error::MalformedInput`])
pub fn load_object_points<P: AsRef<Path>>(path: P) -> Result<Vec<Point3d>> {
    let path = path.as_ref();
    info!("Loading object points from: {}", path.display());

    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            Error::FileNotFound(path.to_path_buf())
        }
        _ => Error::Io(e),
    })?;

    let points = parse_object_points(&content)?;
    info!("Loaded {} object points", points.len());
    Ok(points)
}

/// Parse object points from text content
///
/// Blank lines are skipped. Anything else must be exactly three
/// comma-separated integers; a malformed line rejects the whole source.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] naming the first offending line, or if
/// no points are present.
pub fn parse_object_points(content: &str) -> Result<Vec<Point3d>> {
    let mut points = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some(values) = parse_fields::<i64>(trimmed, 3) else {
            return Err(Error::MalformedInput(format!(
                "line {}: expected integer triple \"x,y,z\", got \"{}\"",
                idx + 1,
                trimmed
            )));
        };

        #[allow(clippy::cast_precision_loss)] // Object coordinates are far below 2^53
        let point = Point3d::new(values[0] as f64, values[1] as f64, values[2] as f64);
        debug!("object point {}: {:?}", points.len(), point);
        points.push(point);
    }

    if points.is_empty() {
        return Err(Error::MalformedInput("no object points found".to_string()));
    }

    Ok(points)
}
