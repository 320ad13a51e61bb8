//! Gesture interpreter: turns semantic gesture events into view updates.
//!
//! A recognizer reports a gesture start (with the touch centroid), pinch
//! updates (cumulative scale factor since the start plus the current
//! centroid), pan deltas and a gesture end. Anchor state only lives between
//! start and end. [`TouchTracker`] is the built-in recognizer for raw touch
//! points.

use crate::geometry::{centroid, resolve_scale, Point, Viewport};

/// A semantic gesture event in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// A multi-touch gesture began around `centroid`.
    Start { centroid: Point },
    /// Pinch progress; `scale` is relative to the scale at gesture start.
    Pinch { scale: f64, centroid: Point },
    /// Drag by a container-space delta.
    Pan { dx: f64, dy: f64 },
    /// All touches lifted.
    End,
}

impl GestureEvent {
    /// Start event anchored at the center of gravity of `touches`.
    pub fn start_from_touches(touches: &[Point]) -> Option<GestureEvent> {
        centroid(touches).map(|centroid| GestureEvent::Start { centroid })
    }

    /// Pinch event anchored at the center of gravity of `touches`.
    pub fn pinch_from_touches(scale: f64, touches: &[Point]) -> Option<GestureEvent> {
        centroid(touches).map(|centroid| GestureEvent::Pinch { scale, centroid })
    }
}

/// Gesture-scoped anchor, created on start and dropped on end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureAnchor {
    /// View scale when the gesture started.
    pub anchor_scale: f64,
    /// The gesture centroid relative to the image's top-left corner, in
    /// scaled image pixels.
    pub anchor_on_image: Point,
}

impl GestureAnchor {
    fn at(viewport: &Viewport, centroid: Point) -> Self {
        let offset = viewport.offset();
        Self {
            anchor_scale: viewport.scale(),
            anchor_on_image: Point::new(centroid.x - offset.x, centroid.y - offset.y),
        }
    }
}

/// What the platform should do after an event was handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureResponse {
    /// The view changed and must be repainted.
    pub repaint: bool,
    /// The platform event's default action (page scrolling) must be cancelled.
    pub prevent_default: bool,
}

/// Tracks the active gesture and applies it to a [`Viewport`].
#[derive(Debug, Clone, Default)]
pub struct GestureInterpreter {
    anchor: Option<GestureAnchor>,
}

impl GestureInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor(&self) -> Option<&GestureAnchor> {
        self.anchor.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn handle(&mut self, viewport: &mut Viewport, event: GestureEvent) -> GestureResponse {
        match event {
            GestureEvent::Start { centroid } => {
                self.anchor = Some(GestureAnchor::at(viewport, centroid));
                tracing::trace!(?centroid, scale = viewport.scale(), "gesture start");
                GestureResponse::default()
            }
            GestureEvent::Pinch { scale, centroid } => self.pinch(viewport, scale, centroid),
            GestureEvent::Pan { dx, dy } => {
                if !(dx.is_finite() && dy.is_finite()) {
                    return GestureResponse::default();
                }
                let before = viewport.offset();
                viewport.pan_by(dx, dy);
                if let Some(anchor) = self.anchor.as_mut() {
                    // keep the anchor on the same image point the pan moved
                    let after = viewport.offset();
                    anchor.anchor_on_image.x -= after.x - before.x;
                    anchor.anchor_on_image.y -= after.y - before.y;
                }
                GestureResponse {
                    repaint: true,
                    prevent_default: true,
                }
            }
            GestureEvent::End => {
                self.anchor = None;
                GestureResponse::default()
            }
        }
    }

    /// Zoom so that the image point under the anchor stays under `centroid`.
    fn pinch(&mut self, viewport: &mut Viewport, factor: f64, centroid: Point) -> GestureResponse {
        if !(factor.is_finite() && factor > 0.0) {
            return GestureResponse::default();
        }
        let anchor = match self.anchor {
            Some(anchor) => anchor,
            None => GestureAnchor::at(viewport, centroid),
        };

        let previous = viewport.scale();
        let resolved = resolve_scale(anchor.anchor_scale * factor, viewport.min_scale());
        let zoom = resolved / previous;

        let view = viewport.apply(
            centroid.x - anchor.anchor_on_image.x * zoom,
            centroid.y - anchor.anchor_on_image.y * zoom,
            resolved,
        );
        tracing::trace!(factor, scale = view.scale, "pinch");

        self.anchor = Some(GestureAnchor {
            anchor_scale: anchor.anchor_scale,
            anchor_on_image: Point::new(centroid.x - view.offset_x, centroid.y - view.offset_y),
        });

        GestureResponse {
            repaint: true,
            prevent_default: true,
        }
    }
}

/// Turns raw touch snapshots into [`GestureEvent`]s.
///
/// One finger pans. Two or more fingers pinch around their centroid, with
/// the scale measured as the fingers' spread relative to the spread when the
/// multi-touch gesture started. Lifting back to one finger ends the pinch
/// and resumes panning from that finger without a jump.
#[derive(Debug, Clone, Default)]
pub struct TouchTracker {
    start_spread: Option<f64>,
    last_single: Option<Point>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a multi-touch gesture is in progress.
    pub fn is_pinching(&self) -> bool {
        self.start_spread.is_some()
    }

    /// Touches were added (`touchstart`).
    pub fn touches_started(&mut self, touches: &[Point]) -> Option<GestureEvent> {
        match touches {
            [] => None,
            [single] => {
                self.last_single = Some(*single);
                None
            }
            // a finger joined: restart around the new set
            _ => self.begin_pinch(touches),
        }
    }

    /// Touches moved (`touchmove`).
    pub fn touches_moved(&mut self, touches: &[Point]) -> Option<GestureEvent> {
        match touches {
            [] => None,
            [single] => {
                let last = self.last_single.replace(*single)?;
                Some(GestureEvent::Pan {
                    dx: single.x - last.x,
                    dy: single.y - last.y,
                })
            }
            _ => match self.start_spread {
                Some(start) => GestureEvent::pinch_from_touches(spread(touches) / start, touches),
                None => self.begin_pinch(touches),
            },
        }
    }

    /// Touches were lifted or cancelled; `touches` are the ones still down.
    pub fn touches_ended(&mut self, touches: &[Point]) -> Option<GestureEvent> {
        self.last_single = match touches {
            [single] => Some(*single),
            _ => None,
        };
        if !self.is_pinching() {
            return None;
        }
        if touches.len() >= 2 {
            return self.begin_pinch(touches);
        }
        self.start_spread = None;
        Some(GestureEvent::End)
    }

    fn begin_pinch(&mut self, touches: &[Point]) -> Option<GestureEvent> {
        let spread = spread(touches);
        if !(spread.is_finite() && spread > 0.0) {
            return None;
        }
        self.start_spread = Some(spread);
        self.last_single = None;
        GestureEvent::start_from_touches(touches)
    }
}

/// Mean distance of `touches` from their arithmetic mean.
fn spread(touches: &[Point]) -> f64 {
    let n = touches.len() as f64;
    let (sx, sy) = touches.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let (mx, my) = (sx / n, sy / n);
    touches
        .iter()
        .map(|p| ((p.x - mx).powi(2) + (p.y - my).powi(2)).sqrt())
        .sum::<f64>()
        / n
}
