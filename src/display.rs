//! highgui windows for point picking and reprojection review.

use crate::{
    constants::{KEY_ESCAPE, KEY_QUIT, MARKED_COLOR},
    correspondence::{CollectorEvent, CorrespondenceSource},
    overlay::{bgr, draw_caption, draw_marker, MarkerStyle},
    Error, Result,
};
use log::{debug, info};
use opencv::{
    core::{Mat, Point2d},
    highgui::{self, EVENT_LBUTTONDOWN, WINDOW_AUTOSIZE, WND_PROP_VISIBLE},
    imgcodecs::{self, IMREAD_COLOR},
    prelude::*,
};
use std::{
    collections::VecDeque,
    path::Path,
    sync::{Arc, Mutex},
};

/// Clicks captured by the mouse callback, drained on the caller's thread
type ClickQueue = Arc<Mutex<VecDeque<CollectorEvent>>>;

/// Load the image the operator marks points on
///
/// # Errors
///
/// Returns [`Error::FileNotFound`] if the path is not a file, or
/// [`Error::MalformedInput`] if OpenCV cannot decode it.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Mat> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let image = imgcodecs::imread(&path.to_string_lossy(), IMREAD_COLOR)?;
    if image.empty() {
        return Err(Error::MalformedInput(format!("cannot decode image {}", path.display())));
    }
    info!("Loaded image {} ({}x{})", path.display(), image.cols(), image.rows());
    Ok(image)
}

/// Map a `wait_key` code to an operator event
///
/// Returns `None` when no key was pressed.
#[must_use]
pub fn key_event(key: i32) -> Option<CollectorEvent> {
    if key < 0 {
        return None;
    }
    match key & 0xFF {
        KEY_ESCAPE | KEY_QUIT => Some(CollectorEvent::Dismiss),
        _ => Some(CollectorEvent::Continue),
    }
}

/// Everything the picking window needs, owned in one place
pub struct PickingContext {
    /// highgui window name
    pub window: String,
    /// Image with the markers drawn so far
    pub canvas: Mat,
    /// How markers are drawn
    pub style: MarkerStyle,
    clicks: ClickQueue,
}

impl PickingContext {
    #[must_use]
    pub fn new(window: impl Into<String>, image: Mat, style: MarkerStyle) -> Self {
        Self {
            window: window.into(),
            canvas: image,
            style,
            clicks: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    fn pop_click(&self) -> Result<Option<CollectorEvent>> {
        let mut queue = self
            .clicks
            .lock()
            .map_err(|_| Error::InvalidInput("click queue poisoned".to_string()))?;
        Ok(queue.pop_front())
    }
}

/// Interactive point picker backed by a highgui window
///
/// Left clicks become [`CollectorEvent::Click`]. Esc, `q` and closing the
/// window dismiss; any other key continues.
pub struct PointPicker {
    context: PickingContext,
    poll_interval_ms: i32,
}

impl PointPicker {
    /// Open the picking window showing `image`
    ///
    /// # Errors
    ///
    /// Returns an error if the window or mouse callback cannot be set up.
    pub fn open(window: &str, image: &Mat, style: MarkerStyle, poll_interval_ms: i32) -> Result<Self> {
        let mut context = PickingContext::new(window, image.try_clone()?, style);
        draw_caption(&mut context.canvas, 0, "click the points in order, then press any key")?;

        highgui::named_window(&context.window, WINDOW_AUTOSIZE)?;
        let queue = Arc::clone(&context.clicks);
        highgui::set_mouse_callback(
            &context.window,
            Some(Box::new(move |event: i32, x: i32, y: i32, _flags: i32| {
                if event == EVENT_LBUTTONDOWN {
                    if let Ok(mut clicks) = queue.lock() {
                        clicks.push_back(CollectorEvent::Click(f64::from(x), f64::from(y)));
                    }
                }
            })),
        )?;
        highgui::imshow(&context.window, &context.canvas)?;
        debug!("Opened picking window {:?}", context.window);

        Ok(Self {
            context,
            poll_interval_ms: poll_interval_ms.max(1),
        })
    }

    /// Image with the accepted markers drawn on it
    #[must_use]
    pub fn canvas(&self) -> &Mat {
        &self.context.canvas
    }

    fn window_closed(&self) -> Result<bool> {
        Ok(highgui::get_window_property(&self.context.window, WND_PROP_VISIBLE)? < 1.0)
    }
}

impl CorrespondenceSource for PointPicker {
    fn next_event(&mut self) -> Result<CollectorEvent> {
        loop {
            if let Some(click) = self.context.pop_click()? {
                return Ok(click);
            }
            let key = highgui::wait_key(self.poll_interval_ms)?;
            // Clicks delivered during wait_key take precedence over the key
            if let Some(click) = self.context.pop_click()? {
                return Ok(click);
            }
            if let Some(event) = key_event(key) {
                return Ok(event);
            }
            if self.window_closed()? {
                debug!("Picking window closed");
                return Ok(CollectorEvent::Dismiss);
            }
        }
    }

    fn point_accepted(&mut self, index: usize, point: Point2d) -> Result<()> {
        let style = self.context.style;
        draw_marker(&mut self.context.canvas, index, point, bgr(MARKED_COLOR), &style)?;
        highgui::imshow(&self.context.window, &self.context.canvas)?;
        Ok(())
    }
}

impl Drop for PointPicker {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.context.window) {
            debug!("destroy_window failed: {}", e);
        }
    }
}

/// A place to show the reprojection overlay until the operator is done
pub trait ReviewSurface {
    /// Show `overlay` and block until the operator dismisses it
    ///
    /// # Errors
    ///
    /// Returns an error if the surface fails.
    fn review(&mut self, overlay: &Mat) -> Result<()>;
}

/// Review in a highgui window, closed by any key or the window button
pub struct ReviewWindow {
    window: String,
    poll_interval_ms: i32,
}

impl ReviewWindow {
    #[must_use]
    pub fn new(window: impl Into<String>, poll_interval_ms: i32) -> Self {
        Self {
            window: window.into(),
            poll_interval_ms: poll_interval_ms.max(1),
        }
    }
}

impl ReviewSurface for ReviewWindow {
    fn review(&mut self, overlay: &Mat) -> Result<()> {
        highgui::named_window(&self.window, WINDOW_AUTOSIZE)?;
        highgui::imshow(&self.window, overlay)?;
        info!("Showing reprojection; press any key or close the window to continue");
        loop {
            if highgui::wait_key(self.poll_interval_ms)? >= 0 {
                break;
            }
            if highgui::get_window_property(&self.window, WND_PROP_VISIBLE)? < 1.0 {
                break;
            }
        }
        highgui::destroy_window(&self.window)?;
        Ok(())
    }
}

/// Review surface for batch runs: returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessReview;

impl ReviewSurface for HeadlessReview {
    fn review(&mut self, overlay: &Mat) -> Result<()> {
        debug!("Skipping review of {}x{} overlay", overlay.cols(), overlay.rows());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_event_mapping() {
        assert_eq!(key_event(-1), None);
        assert_eq!(key_event(KEY_ESCAPE), Some(CollectorEvent::Dismiss));
        assert_eq!(key_event(i32::from(b'q')), Some(CollectorEvent::Dismiss));
        assert_eq!(key_event(i32::from(b' ')), Some(CollectorEvent::Continue));
        assert_eq!(key_event(13), Some(CollectorEvent::Continue));
        // Modifier bits above the low byte are ignored
        assert_eq!(key_event(0x10_0000 | KEY_ESCAPE), Some(CollectorEvent::Dismiss));
    }

    #[test]
    fn test_load_image_missing_file() {
        let result = load_image("/nonexistent/image.png");
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_load_image_undecodable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(load_image(&path), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_headless_review_returns() {
        let overlay = Mat::default();
        assert!(HeadlessReview.review(&overlay).is_ok());
    }
}
