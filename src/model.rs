use crate::{
    core::{Color, Point},
    error::{OralmarkError, OralmarkResult},
};

/// Drawing tool selectable during a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Pen,
    Rectangle,
    Circle,
    Arrow,
}

impl Tool {
    /// Stroke width a finalized record gets unless the session overrides it.
    pub fn default_stroke_width(self) -> f64 {
        match self {
            Tool::Pen | Tool::Rectangle | Tool::Circle => 7.0,
            Tool::Arrow => 5.0,
        }
    }
}

/// One finalized drawn mark. The `tool` tag discriminates the wire object;
/// field names follow the stored document format.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "tool", rename_all = "lowercase")]
pub enum AnnotationRecord {
    Pen(PenRecord),
    Rectangle(RectangleRecord),
    Circle(CircleRecord),
    Arrow(ArrowRecord),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenRecord {
    pub points: Vec<Point>,
    #[serde(default = "fallback_color")]
    pub color: Color,
    #[serde(default = "fallback_line_width")]
    pub line_width: f64,
}

/// Stored geometry is already normalized: `(start_x, start_y)` is the
/// top-left corner and `width`/`height` are nonnegative.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleRecord {
    pub start_x: f64,
    pub start_y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "fallback_color")]
    pub color: Color,
    #[serde(default = "fallback_line_width")]
    pub line_width: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleRecord {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    #[serde(default = "fallback_color")]
    pub color: Color,
    #[serde(default = "fallback_line_width")]
    pub line_width: f64,
}

/// Start/end are stored literally; the arrowhead is drawn at the end
/// point, so direction is meaningful and must not be normalized away.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowRecord {
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    #[serde(default = "fallback_color")]
    pub color: Color,
    #[serde(default = "fallback_line_width")]
    pub line_width: f64,
}

// Documents written by older clients may omit color/lineWidth; these are
// the values their replay path assumed.
fn fallback_color() -> Color {
    Color::from_rgb8(255, 0, 0)
}

fn fallback_line_width() -> f64 {
    3.0
}

impl AnnotationRecord {
    pub fn tool(&self) -> Tool {
        match self {
            AnnotationRecord::Pen(_) => Tool::Pen,
            AnnotationRecord::Rectangle(_) => Tool::Rectangle,
            AnnotationRecord::Circle(_) => Tool::Circle,
            AnnotationRecord::Arrow(_) => Tool::Arrow,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            AnnotationRecord::Pen(r) => r.color,
            AnnotationRecord::Rectangle(r) => r.color,
            AnnotationRecord::Circle(r) => r.color,
            AnnotationRecord::Arrow(r) => r.color,
        }
    }

    pub fn line_width(&self) -> f64 {
        match self {
            AnnotationRecord::Pen(r) => r.line_width,
            AnnotationRecord::Rectangle(r) => r.line_width,
            AnnotationRecord::Circle(r) => r.line_width,
            AnnotationRecord::Arrow(r) => r.line_width,
        }
    }

    pub fn validate(&self) -> OralmarkResult<()> {
        let width = self.line_width();
        if !width.is_finite() || width <= 0.0 {
            return Err(OralmarkError::validation(format!(
                "lineWidth must be finite and > 0, got {width}"
            )));
        }

        match self {
            AnnotationRecord::Pen(r) => {
                if r.points.is_empty() {
                    return Err(OralmarkError::validation("pen record has no points"));
                }
                for p in &r.points {
                    ensure_finite(&[p.x, p.y], "pen point")?;
                }
            }
            AnnotationRecord::Rectangle(r) => {
                ensure_finite(&[r.start_x, r.start_y, r.width, r.height], "rectangle")?;
                if r.width < 0.0 || r.height < 0.0 {
                    return Err(OralmarkError::validation(
                        "rectangle width/height must be >= 0",
                    ));
                }
            }
            AnnotationRecord::Circle(r) => {
                ensure_finite(&[r.center_x, r.center_y, r.radius], "circle")?;
                if r.radius < 0.0 {
                    return Err(OralmarkError::validation("circle radius must be >= 0"));
                }
            }
            AnnotationRecord::Arrow(r) => {
                ensure_finite(&[r.start_x, r.start_y, r.end_x, r.end_y], "arrow")?;
            }
        }

        Ok(())
    }
}

fn ensure_finite(values: &[f64], what: &str) -> OralmarkResult<()> {
    for v in values {
        if !v.is_finite() {
            return Err(OralmarkError::validation(format!(
                "{what} has a non-finite coordinate"
            )));
        }
    }
    Ok(())
}
