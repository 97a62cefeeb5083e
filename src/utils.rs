//! Small parsing and pixel-coordinate helpers shared by the loaders and overlays.

use crate::{Error, Result};
use opencv::core::{Point, Point2d};
use std::str::FromStr;

/// Split a comma-separated line into exactly `expected` values
///
/// Each field is trimmed before parsing. Returns `None` on a wrong field
/// count or any field that fails to parse.
pub fn parse_fields<T: FromStr>(line: &str, expected: usize) -> Option<Vec<T>> {
    let values = line
        .split(',')
        .map(|field| field.trim().parse::<T>().ok())
        .collect::<Option<Vec<T>>>()?;
    (values.len() == expected).then_some(values)
}

/// Safely convert f64 to i32 with bounds checking
///
/// # Errors
///
/// Returns an error if the value is not finite or outside i32 range
#[allow(clippy::cast_possible_truncation)] // Rounding after bounds check is safe
pub fn f64_to_i32(value: f64) -> Result<i32> {
    let rounded = value.round();
    if rounded.is_finite() && rounded >= f64::from(i32::MIN) && rounded <= f64::from(i32::MAX) {
        Ok(rounded as i32)
    } else {
        Err(Error::InvalidInput(format!(
            "Value {value} cannot be safely converted to a pixel coordinate"
        )))
    }
}

/// Round a sub-pixel point to the integer grid used by the drawing calls
///
/// # Errors
///
/// Returns an error if either coordinate is not representable as i32
pub fn to_pixel(point: Point2d) -> Result<Point> {
    Ok(Point::new(f64_to_i32(point.x)?, f64_to_i32(point.y)?))
}

/// Euclidean distance between two image points
#[must_use]
pub fn pixel_distance(a: Point2d, b: Point2d) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}
