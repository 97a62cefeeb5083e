//! Marker drawing on image canvases.

use crate::{
    config::DisplayConfig,
    constants::CAPTION_COLOR,
    utils::to_pixel,
    Result,
};
use opencv::{
    core::{Mat, Point, Point2d, Scalar},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8, LINE_AA},
};

/// How markers are drawn on a canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    /// Half-length of each cross arm in pixels
    pub size: i32,
    /// Stroke thickness in pixels
    pub thickness: i32,
    /// Draw each marker's index next to it
    pub show_labels: bool,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self::from(&DisplayConfig::default())
    }
}

impl From<&DisplayConfig> for MarkerStyle {
    fn from(config: &DisplayConfig) -> Self {
        Self {
            size: config.marker_size,
            thickness: config.marker_thickness,
            show_labels: config.show_labels,
        }
    }
}

/// Build an OpenCV colour from a BGR tuple
#[must_use]
pub fn bgr((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}

/// Draw an upright cross centred on `point`
///
/// # Errors
///
/// Returns an error if the point is not a drawable pixel or OpenCV fails.
pub fn draw_cross(canvas: &mut Mat, point: Point2d, color: Scalar, style: &MarkerStyle) -> Result<()> {
    let center = to_pixel(point)?;
    let len = style.size;
    imgproc::line(
        canvas,
        Point::new(center.x - len, center.y),
        Point::new(center.x + len, center.y),
        color,
        style.thickness,
        LINE_8,
        0,
    )?;
    imgproc::line(
        canvas,
        Point::new(center.x, center.y - len),
        Point::new(center.x, center.y + len),
        color,
        style.thickness,
        LINE_8,
        0,
    )?;
    Ok(())
}

/// Draw a cross plus, when enabled, its 1-based index
///
/// # Errors
///
/// Returns an error if the point is not a drawable pixel or OpenCV fails.
pub fn draw_marker(canvas: &mut Mat, index: usize, point: Point2d, color: Scalar, style: &MarkerStyle) -> Result<()> {
    draw_cross(canvas, point, color, style)?;
    if style.show_labels {
        let anchor = to_pixel(point)?;
        imgproc::put_text(
            canvas,
            &(index + 1).to_string(),
            Point::new(anchor.x + style.size + 2, anchor.y - style.size - 2),
            FONT_HERSHEY_SIMPLEX,
            0.4,
            color,
            1,
            LINE_AA,
            false,
        )?;
    }
    Ok(())
}

/// Write a one-line caption in the top-left corner
///
/// # Errors
///
/// Returns an error if OpenCV drawing fails.
pub fn draw_caption(canvas: &mut Mat, line: usize, text: &str) -> Result<()> {
    let y = 20 + 20 * i32::try_from(line).unwrap_or(0);
    imgproc::put_text(
        canvas,
        text,
        Point::new(10, y),
        FONT_HERSHEY_SIMPLEX,
        0.5,
        bgr(CAPTION_COLOR),
        1,
        LINE_AA,
        false,
    )?;
    Ok(())
}
