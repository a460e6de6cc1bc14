use crate::{
    core::{Color, Point, default_annotation_color},
    error::{OralmarkError, OralmarkResult},
    model::{AnnotationRecord, ArrowRecord, CircleRecord, PenRecord, RectangleRecord, Tool},
};

/// Gesture capture state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Capturing,
}

/// What the host surface should paint in response to a pointer move.
#[derive(Clone, Debug, PartialEq)]
pub enum LivePaint {
    /// Pen: one incremental segment from the previous point, painted
    /// without replaying the record list.
    Segment {
        from: Point,
        to: Point,
        color: Color,
        width: f64,
    },
    /// Shape tools: replay the full record list, then paint this preview
    /// record on top. Issued on every move so no stale preview survives.
    Preview(AnnotationRecord),
}

/// Tracks one in-progress pointer gesture and turns it into a finalized
/// [`AnnotationRecord`] on gesture end. Transient; never persisted.
#[derive(Clone, Debug)]
pub struct DrawingSession {
    tool: Tool,
    color: Color,
    line_width: f64,
    state: SessionState,
    points: Vec<Point>,
}

impl Default for DrawingSession {
    fn default() -> Self {
        Self {
            tool: Tool::Pen,
            color: default_annotation_color(),
            line_width: Tool::Pen.default_stroke_width(),
            state: SessionState::Idle,
            points: Vec::new(),
        }
    }
}

impl DrawingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    pub fn is_capturing(&self) -> bool {
        self.state == SessionState::Capturing
    }

    /// Select a tool. Discards any in-progress gesture and resets the
    /// stroke width to the tool's default.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.line_width = tool.default_stroke_width();
        self.state = SessionState::Idle;
        self.points.clear();
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_line_width(&mut self, width: f64) -> OralmarkResult<()> {
        if !width.is_finite() || width <= 0.0 {
            return Err(OralmarkError::validation(format!(
                "stroke width must be finite and > 0, got {width}"
            )));
        }
        self.line_width = width;
        Ok(())
    }

    /// Start a gesture at `point`. Any previous in-progress gesture is
    /// discarded.
    pub fn begin(&mut self, point: Point) {
        self.points.clear();
        self.points.push(point);
        self.state = SessionState::Capturing;
    }

    /// Feed a pointer move. Returns the paint instruction for the host
    /// surface, or `None` when no gesture is active.
    pub fn update(&mut self, point: Point) -> Option<LivePaint> {
        if self.state != SessionState::Capturing {
            return None;
        }

        match self.tool {
            Tool::Pen => {
                let from = *self.points.last()?;
                self.points.push(point);
                Some(LivePaint::Segment {
                    from,
                    to: point,
                    color: self.color,
                    width: self.line_width,
                })
            }
            Tool::Rectangle | Tool::Circle | Tool::Arrow => {
                // Shape gestures hold exactly (start, current).
                if self.points.len() == 1 {
                    self.points.push(point);
                } else {
                    self.points[1] = point;
                }
                self.shape_record(self.points[0], point).map(LivePaint::Preview)
            }
        }
    }

    /// End the gesture at `point` and emit the finalized record, or `None`
    /// for a gesture below the minimum point count (a click with no drag).
    /// That silent no-op is deliberate, not an error.
    pub fn end(&mut self, point: Point) -> Option<AnnotationRecord> {
        if self.state != SessionState::Capturing {
            return None;
        }

        let record = match self.tool {
            Tool::Pen if self.points.len() > 1 => Some(AnnotationRecord::Pen(PenRecord {
                points: std::mem::take(&mut self.points),
                color: self.color,
                line_width: self.line_width,
            })),
            Tool::Pen => None,
            // The end position wins over the last tracked move.
            _ if self.points.len() == 2 => self.shape_record(self.points[0], point),
            _ => None,
        };

        self.state = SessionState::Idle;
        self.points.clear();
        record
    }

    /// The pointer left the surface mid-gesture; finalize exactly like
    /// [`DrawingSession::end`] so no gesture is left stuck capturing.
    pub fn leave(&mut self, point: Point) -> Option<AnnotationRecord> {
        self.end(point)
    }

    fn shape_record(&self, start: Point, end: Point) -> Option<AnnotationRecord> {
        match self.tool {
            Tool::Pen => None,
            Tool::Rectangle => Some(AnnotationRecord::Rectangle(RectangleRecord {
                start_x: start.x.min(end.x),
                start_y: start.y.min(end.y),
                width: (end.x - start.x).abs(),
                height: (end.y - start.y).abs(),
                color: self.color,
                line_width: self.line_width,
            })),
            Tool::Circle => Some(AnnotationRecord::Circle(CircleRecord {
                center_x: start.x,
                center_y: start.y,
                radius: (end.x - start.x).hypot(end.y - start.y),
                color: self.color,
                line_width: self.line_width,
            })),
            Tool::Arrow => Some(AnnotationRecord::Arrow(ArrowRecord {
                start_x: start.x,
                start_y: start.y,
                end_x: end.x,
                end_y: end.y,
                color: self.color,
                line_width: self.line_width,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(tool: Tool) -> DrawingSession {
        let mut s = DrawingSession::new();
        s.set_tool(tool);
        s
    }

    fn drag(session: &mut DrawingSession, from: Point, to: Point) -> Option<AnnotationRecord> {
        session.begin(from);
        session.update(to);
        session.end(to)
    }

    #[test]
    fn rectangle_normalizes_drag_direction() {
        let mut s = session_with(Tool::Rectangle);
        let down = drag(&mut s, Point::new(50.0, 50.0), Point::new(10.0, 10.0)).unwrap();
        let up = drag(&mut s, Point::new(10.0, 10.0), Point::new(50.0, 50.0)).unwrap();

        let expected = AnnotationRecord::Rectangle(RectangleRecord {
            start_x: 10.0,
            start_y: 10.0,
            width: 40.0,
            height: 40.0,
            color: s.color(),
            line_width: 7.0,
        });
        assert_eq!(down, expected);
        assert_eq!(up, expected);
    }

    #[test]
    fn circle_radius_is_euclidean_distance() {
        let mut s = session_with(Tool::Circle);
        let rec = drag(&mut s, Point::new(100.0, 100.0), Point::new(100.0, 150.0)).unwrap();
        match rec {
            AnnotationRecord::Circle(c) => {
                assert_eq!(c.center_x, 100.0);
                assert_eq!(c.center_y, 100.0);
                assert_eq!(c.radius, 50.0);
            }
            other => panic!("expected circle, got {other:?}"),
        }
    }

    #[test]
    fn arrow_preserves_direction() {
        let mut s = session_with(Tool::Arrow);
        let forward = drag(&mut s, Point::new(0.0, 0.0), Point::new(30.0, 0.0)).unwrap();
        let backward = drag(&mut s, Point::new(30.0, 0.0), Point::new(0.0, 0.0)).unwrap();
        assert_ne!(forward, backward);
    }

    #[test]
    fn pen_collects_the_full_path() {
        let mut s = session_with(Tool::Pen);
        s.begin(Point::new(1.0, 1.0));
        s.update(Point::new(2.0, 2.0));
        s.update(Point::new(3.0, 3.0));
        let rec = s.end(Point::new(9.0, 9.0)).unwrap();
        match rec {
            AnnotationRecord::Pen(p) => {
                // The end position is not appended; only tracked moves count.
                assert_eq!(
                    p.points,
                    vec![
                        Point::new(1.0, 1.0),
                        Point::new(2.0, 2.0),
                        Point::new(3.0, 3.0)
                    ]
                );
                assert_eq!(p.line_width, 7.0);
            }
            other => panic!("expected pen, got {other:?}"),
        }
    }

    #[test]
    fn click_without_drag_emits_nothing() {
        for tool in [Tool::Pen, Tool::Rectangle, Tool::Circle, Tool::Arrow] {
            let mut s = session_with(tool);
            s.begin(Point::new(5.0, 5.0));
            assert_eq!(s.end(Point::new(5.0, 5.0)), None, "{tool:?}");
            assert!(!s.is_capturing());
        }
    }

    #[test]
    fn update_while_idle_is_ignored() {
        let mut s = session_with(Tool::Pen);
        assert_eq!(s.update(Point::new(1.0, 1.0)), None);
        assert_eq!(s.end(Point::new(1.0, 1.0)), None);
    }

    #[test]
    fn pen_moves_yield_incremental_segments() {
        let mut s = session_with(Tool::Pen);
        s.begin(Point::new(0.0, 0.0));
        let paint = s.update(Point::new(4.0, 0.0)).unwrap();
        assert_eq!(
            paint,
            LivePaint::Segment {
                from: Point::new(0.0, 0.0),
                to: Point::new(4.0, 0.0),
                color: s.color(),
                width: 7.0,
            }
        );
    }

    #[test]
    fn shape_moves_yield_previews() {
        let mut s = session_with(Tool::Circle);
        s.begin(Point::new(10.0, 10.0));
        let paint = s.update(Point::new(10.0, 20.0)).unwrap();
        match paint {
            LivePaint::Preview(AnnotationRecord::Circle(c)) => assert_eq!(c.radius, 10.0),
            other => panic!("expected circle preview, got {other:?}"),
        }
    }

    #[test]
    fn leave_finalizes_like_end() {
        let mut a = session_with(Tool::Rectangle);
        a.begin(Point::new(0.0, 0.0));
        a.update(Point::new(10.0, 10.0));
        let via_end = a.end(Point::new(10.0, 10.0));

        let mut b = session_with(Tool::Rectangle);
        b.begin(Point::new(0.0, 0.0));
        b.update(Point::new(10.0, 10.0));
        let via_leave = b.leave(Point::new(10.0, 10.0));

        assert_eq!(via_end, via_leave);
        assert!(!b.is_capturing());
    }

    #[test]
    fn end_position_wins_over_last_move() {
        let mut s = session_with(Tool::Rectangle);
        s.begin(Point::new(0.0, 0.0));
        s.update(Point::new(5.0, 5.0));
        let rec = s.end(Point::new(20.0, 30.0)).unwrap();
        match rec {
            AnnotationRecord::Rectangle(r) => {
                assert_eq!((r.width, r.height), (20.0, 30.0));
            }
            other => panic!("expected rectangle, got {other:?}"),
        }
    }

    #[test]
    fn set_tool_discards_in_progress_gesture_and_sets_width() {
        let mut s = session_with(Tool::Pen);
        s.begin(Point::new(0.0, 0.0));
        s.update(Point::new(1.0, 1.0));

        s.set_tool(Tool::Arrow);
        assert!(!s.is_capturing());
        assert_eq!(s.line_width(), 5.0);
        assert_eq!(s.end(Point::new(2.0, 2.0)), None);
    }

    #[test]
    fn set_line_width_rejects_bad_values() {
        let mut s = DrawingSession::new();
        assert!(s.set_line_width(0.0).is_err());
        assert!(s.set_line_width(f64::NAN).is_err());
        assert!(s.set_line_width(2.5).is_ok());
        assert_eq!(s.line_width(), 2.5);
    }
}
