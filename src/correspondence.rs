//! Collection of the 2D image points that match the loaded object points.
//!
//! The operator marks one pixel per object point, in object point order. The
//! bookkeeping lives in [`CorrespondenceCollector`], a state machine that
//! knows nothing about windows; events come from a [`CorrespondenceSource`],
//! which is either the interactive picker in [`crate::display`] or a
//! [`ScriptedSource`] replaying recorded clicks.

use crate::{utils::parse_fields, Error, Result};
use log::{debug, info, warn};
use opencv::core::Point2d;
use std::{collections::VecDeque, path::Path};

/// Operator input as seen by the collector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollectorEvent {
    /// Left-button press at pixel coordinates
    Click(f64, f64),
    /// Any key other than the dismiss keys
    Continue,
    /// Window closed, Esc or `q`
    Dismiss,
}

/// Collector progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    /// Fewer points than the target have been marked
    Collecting,
    /// All target points have been marked
    Complete,
}

/// Outcome of feeding one event to the collector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollectorStep {
    /// A click was stored as the point at `index`
    Accepted {
        /// Zero-based position in the output sequence
        index: usize,
        /// Stored pixel location
        point: Point2d,
    },
    /// The event has no effect in the current state
    Ignored,
    /// Collection finished with all points marked
    Finished,
}

/// State machine accumulating exactly `target` clicked points
#[derive(Debug, Clone)]
pub struct CorrespondenceCollector {
    target: usize,
    points: Vec<Point2d>,
}

impl CorrespondenceCollector {
    /// Create a collector expecting `target` points
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `target` is zero.
    pub fn new(target: usize) -> Result<Self> {
        if target == 0 {
            return Err(Error::InvalidInput("correspondence target must be at least 1".to_string()));
        }
        Ok(Self {
            target,
            points: Vec::with_capacity(target),
        })
    }

    /// Number of points to collect
    #[must_use]
    pub fn target(&self) -> usize {
        self.target
    }

    /// Points collected so far, in click order
    #[must_use]
    pub fn points(&self) -> &[Point2d] {
        &self.points
    }

    #[must_use]
    pub fn state(&self) -> CollectorState {
        if self.points.len() < self.target {
            CollectorState::Collecting
        } else {
            CollectorState::Complete
        }
    }

    /// Apply one operator event
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientCorrespondences`] when the operator
    /// dismisses before every point is marked.
    pub fn handle(&mut self, event: CollectorEvent) -> Result<CollectorStep> {
        match (self.state(), event) {
            (CollectorState::Collecting, CollectorEvent::Click(x, y)) => {
                let point = Point2d::new(x, y);
                let index = self.points.len();
                self.points.push(point);
                debug!("point {} marked at ({:.1}, {:.1})", index + 1, x, y);
                Ok(CollectorStep::Accepted { index, point })
            }
            (CollectorState::Complete, CollectorEvent::Click(x, y)) => {
                debug!("ignoring click at ({:.1}, {:.1}): all {} points marked", x, y, self.target);
                Ok(CollectorStep::Ignored)
            }
            (CollectorState::Collecting, CollectorEvent::Continue) => {
                warn!(
                    "{} of {} points marked; keep clicking or press Esc to abort",
                    self.points.len(),
                    self.target
                );
                Ok(CollectorStep::Ignored)
            }
            (CollectorState::Collecting, CollectorEvent::Dismiss) => Err(Error::InsufficientCorrespondences {
                required: self.target,
                provided: self.points.len(),
            }),
            (CollectorState::Complete, CollectorEvent::Continue | CollectorEvent::Dismiss) => {
                Ok(CollectorStep::Finished)
            }
        }
    }

    /// Consume the collector, returning the marked points
    #[must_use]
    pub fn into_points(self) -> Vec<Point2d> {
        self.points
    }
}

/// Provider of operator events for point collection
pub trait CorrespondenceSource {
    /// Block until the next operator event
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying surface fails.
    fn next_event(&mut self) -> Result<CollectorEvent>;

    /// Called after a click is stored, so the surface can mark it
    ///
    /// # Errors
    ///
    /// Returns an error if drawing the marker fails.
    fn point_accepted(&mut self, _index: usize, _point: Point2d) -> Result<()> {
        Ok(())
    }
}

/// Run a collector to completion against `source`
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for a zero target,
/// [`Error::InsufficientCorrespondences`] if the operator dismisses early, or
/// any error raised by the source.
pub fn collect_correspondences<S: CorrespondenceSource + ?Sized>(source: &mut S, target: usize) -> Result<Vec<Point2d>> {
    let mut collector = CorrespondenceCollector::new(target)?;
    info!("Mark {} points in object point order, then press any key", target);

    loop {
        let event = source.next_event()?;
        match collector.handle(event)? {
            CollectorStep::Accepted { index, point } => source.point_accepted(index, point)?,
            CollectorStep::Ignored => {}
            CollectorStep::Finished => break,
        }
    }

    let points = collector.into_points();
    info!("Collected {} image points", points.len());
    Ok(points)
}

/// Replays a fixed list of events
///
/// Once the list is exhausted every further call yields
/// [`CollectorEvent::Dismiss`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    events: VecDeque<CollectorEvent>,
    accepted: Vec<(usize, Point2d)>,
}

impl ScriptedSource {
    /// Replay `events` in order
    #[must_use]
    pub fn new(events: impl IntoIterator<Item = CollectorEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            accepted: Vec::new(),
        }
    }

    /// One click per point followed by a continue key
    #[must_use]
    pub fn from_clicks(points: &[Point2d]) -> Self {
        Self::new(
            points
                .iter()
                .map(|p| CollectorEvent::Click(p.x, p.y))
                .chain(std::iter::once(CollectorEvent::Continue)),
        )
    }

    /// Load clicks from a text file of `x,y` pixel pairs, one per line
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the file cannot be opened, or
    /// [`Error::MalformedInput`] for a line that is not a numeric pair.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        let points = parse_image_points(&content)?;
        info!("Loaded {} image points from {}", points.len(), path.display());
        Ok(Self::from_clicks(&points))
    }

    /// Points reported through [`CorrespondenceSource::point_accepted`]
    #[must_use]
    pub fn accepted(&self) -> &[(usize, Point2d)] {
        &self.accepted
    }
}

impl CorrespondenceSource for ScriptedSource {
    fn next_event(&mut self) -> Result<CollectorEvent> {
        Ok(self.events.pop_front().unwrap_or(CollectorEvent::Dismiss))
    }

    fn point_accepted(&mut self, index: usize, point: Point2d) -> Result<()> {
        self.accepted.push((index, point));
        Ok(())
    }
}

/// Parse `x,y` pixel pairs, skipping blank lines
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] naming the first bad line.
pub fn parse_image_points(content: &str) -> Result<Vec<Point2d>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| match parse_fields::<f64>(line, 2) {
            Some(v) if v.iter().all(|c| c.is_finite()) => Ok(Point2d::new(v[0], v[1])),
            _ => Err(Error::MalformedInput(format!("line {}: expected \"x,y\", got {:?}", i + 1, line.trim()))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn clicks(n: usize) -> Vec<CollectorEvent> {
        (0..n).map(|i| CollectorEvent::Click(i as f64, 2.0 * i as f64)).collect()
    }

    #[test]
    fn test_zero_target_rejected() {
        assert!(matches!(CorrespondenceCollector::new(0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_state_transitions() {
        let mut collector = CorrespondenceCollector::new(2).unwrap();
        assert_eq!(collector.state(), CollectorState::Collecting);

        let step = collector.handle(CollectorEvent::Click(1.0, 2.0)).unwrap();
        assert_eq!(
            step,
            CollectorStep::Accepted {
                index: 0,
                point: Point2d::new(1.0, 2.0)
            }
        );
        assert_eq!(collector.handle(CollectorEvent::Continue).unwrap(), CollectorStep::Ignored);

        collector.handle(CollectorEvent::Click(3.0, 4.0)).unwrap();
        assert_eq!(collector.state(), CollectorState::Complete);

        // Extra clicks are dropped
        assert_eq!(collector.handle(CollectorEvent::Click(5.0, 6.0)).unwrap(), CollectorStep::Ignored);
        assert_eq!(collector.points().len(), 2);

        assert_eq!(collector.handle(CollectorEvent::Continue).unwrap(), CollectorStep::Finished);
    }

    #[test]
    fn test_dismiss_while_collecting() {
        let mut collector = CorrespondenceCollector::new(3).unwrap();
        collector.handle(CollectorEvent::Click(1.0, 1.0)).unwrap();
        match collector.handle(CollectorEvent::Dismiss) {
            Err(Error::InsufficientCorrespondences { required, provided }) => {
                assert_eq!(required, 3);
                assert_eq!(provided, 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_dismiss_when_complete_finishes() {
        let mut collector = CorrespondenceCollector::new(1).unwrap();
        collector.handle(CollectorEvent::Click(1.0, 1.0)).unwrap();
        assert_eq!(collector.handle(CollectorEvent::Dismiss).unwrap(), CollectorStep::Finished);
    }

    #[test]
    fn test_collect_reports_accepted_points() {
        let mut source = ScriptedSource::new(clicks(3).into_iter().chain([CollectorEvent::Continue]));
        let points = collect_correspondences(&mut source, 3).unwrap();
        assert_eq!(points.len(), 3);
        let indices: Vec<usize> = source.accepted().iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_exhausted_script_dismisses() {
        let mut source = ScriptedSource::new(clicks(2));
        let result = collect_correspondences(&mut source, 4);
        assert!(matches!(
            result,
            Err(Error::InsufficientCorrespondences { required: 4, provided: 2 })
        ));
    }

    #[test]
    fn test_parse_image_points() {
        let points = parse_image_points("10.5, 20\n\n  30,40.25  \n").unwrap();
        assert_eq!(points, vec![Point2d::new(10.5, 20.0), Point2d::new(30.0, 40.25)]);
    }

    #[test]
    fn test_parse_image_points_rejects_bad_line() {
        let err = parse_image_points("1,2\n3\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(parse_image_points("1,2,3\n").is_err());
        assert!(parse_image_points("nan,2\n").is_err());
    }

    proptest! {
        #[test]
        fn prop_exactly_target_points_in_click_order(target in 1usize..12, extra in 0usize..6, short in 0usize..12) {
            // Enough clicks: exactly `target` are kept, in order
            let mut source = ScriptedSource::new(clicks(target + extra));
            let points = collect_correspondences(&mut source, target).unwrap();
            let expected: Vec<Point2d> = (0..target).map(|i| Point2d::new(i as f64, 2.0 * i as f64)).collect();
            prop_assert_eq!(points, expected);

            // Too few clicks: dismissal fails
            let provided = short % target;
            let mut source = ScriptedSource::new(clicks(provided));
            let is_insufficient = matches!(
                collect_correspondences(&mut source, target),
                Err(Error::InsufficientCorrespondences { .. })
            );
            prop_assert!(is_insufficient);
        }
    }
}
