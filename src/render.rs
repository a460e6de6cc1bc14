//! Deterministic replay rendering over the CPU rasterizer.

use std::sync::Arc;

use kurbo::Shape;

use crate::{
    assets::BaseImage,
    core::{Affine, BezPath, Color, Point, Surface},
    error::{OralmarkError, OralmarkResult},
    model::AnnotationRecord,
    session::LivePaint,
};

/// Flattening tolerance for shape outlines and stroke expansion.
const STROKE_TOLERANCE: f64 = 0.1;

/// Arrowhead barb length in surface units.
const ARROW_HEAD_LEN: f64 = 20.0;

/// Rendered RGBA8 frame, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// Replay a record list over a base image. Deterministic and pure: the
/// same base image, surface, and ordered records produce pixel-identical
/// output. The base image is scaled to fill the surface, then each record
/// paints in list order with its own color and stroke width. Geometry
/// outside the surface clips silently; an empty list yields the bare base
/// image.
#[tracing::instrument(skip(base, records))]
pub fn render(
    base: &BaseImage,
    surface: Surface,
    records: &[AnnotationRecord],
) -> OralmarkResult<Frame> {
    let mut canvas = LiveCanvas::new(base, surface)?;
    canvas.replay(records)?;
    Ok(canvas.snapshot())
}

/// One view's drawing surface. Holds the rasterizer context plus the
/// current pixels so pointer-move painting can either replay the record
/// list (shape previews) or extend the existing bitmap (pen segments)
/// without the caller re-feeding anything it has not changed.
pub struct LiveCanvas {
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    base_paint: vello_cpu::Image,
    base_width: u32,
    base_height: u32,
    surface: Surface,
}

impl LiveCanvas {
    pub fn new(base: &BaseImage, surface: Surface) -> OralmarkResult<Self> {
        let w: u16 = surface
            .width
            .try_into()
            .map_err(|_| OralmarkError::render("surface width exceeds u16"))?;
        let h: u16 = surface
            .height
            .try_into()
            .map_err(|_| OralmarkError::render("surface height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(OralmarkError::render("surface dimensions must be > 0"));
        }

        let base_paint = rgba_premul_to_image(&base.rgba8_premul, base.width, base.height)?;

        let mut canvas = Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            base_paint,
            base_width: base.width,
            base_height: base.height,
            surface,
        };
        canvas.replay(&[])?;
        Ok(canvas)
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Redraw from scratch: base image, then every record in list order.
    pub fn replay(&mut self, records: &[AnnotationRecord]) -> OralmarkResult<()> {
        self.replay_inner(records, None)
    }

    /// Redraw from scratch, then paint `preview` on top; the shape-tool
    /// pointer-move path. Issuing a full replay per move is the documented
    /// contract — it leaves no stale preview behind.
    pub fn replay_with_preview(
        &mut self,
        records: &[AnnotationRecord],
        preview: &AnnotationRecord,
    ) -> OralmarkResult<()> {
        self.replay_inner(records, Some(preview))
    }

    /// Extend the current pixels with one pen segment, leaving everything
    /// already painted untouched.
    pub fn paint_segment(
        &mut self,
        from: Point,
        to: Point,
        color: Color,
        width: f64,
    ) -> OralmarkResult<()> {
        let backdrop = rgba_premul_to_image(
            self.pixmap.data_as_u8_slice(),
            self.surface.width,
            self.surface.height,
        )?;

        self.ctx.reset();
        self.ctx
            .set_blend_mode(vello_cpu::peniko::BlendMode::default());
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(backdrop);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            self.surface.width as f64,
            self.surface.height as f64,
        ));

        let mut segment = BezPath::new();
        segment.move_to(from);
        segment.line_to(to);
        paint_stroke(&mut self.ctx, &segment, color, width);

        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        Ok(())
    }

    /// Execute one pointer-move paint instruction against `records`.
    pub fn apply(
        &mut self,
        records: &[AnnotationRecord],
        paint: &LivePaint,
    ) -> OralmarkResult<()> {
        match paint {
            LivePaint::Segment {
                from,
                to,
                color,
                width,
            } => self.paint_segment(*from, *to, *color, *width),
            LivePaint::Preview(record) => self.replay_with_preview(records, record),
        }
    }

    /// Copy the current pixels out as a frame.
    pub fn snapshot(&self) -> Frame {
        Frame {
            width: self.surface.width,
            height: self.surface.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }

    fn replay_inner(
        &mut self,
        records: &[AnnotationRecord],
        preview: Option<&AnnotationRecord>,
    ) -> OralmarkResult<()> {
        self.ctx.reset();
        self.ctx
            .set_blend_mode(vello_cpu::peniko::BlendMode::default());
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        // Base image scaled to fill the surface.
        let sx = self.surface.width as f64 / self.base_width as f64;
        let sy = self.surface.height as f64 / self.base_height as f64;
        self.ctx
            .set_transform(affine_to_cpu(Affine::scale_non_uniform(sx, sy)));
        self.ctx.set_paint(self.base_paint.clone());
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            self.base_width as f64,
            self.base_height as f64,
        ));

        // Records paint in surface coordinates.
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        for record in records.iter().chain(preview) {
            paint_record(&mut self.ctx, record);
        }

        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        Ok(())
    }
}

fn paint_record(ctx: &mut vello_cpu::RenderContext, record: &AnnotationRecord) {
    let path = record_path(record);
    paint_stroke(ctx, &path, record.color(), record.line_width());
}

/// Outline geometry for one record, in surface coordinates. Pen records
/// with fewer than two points produce an empty path, matching how stored
/// single-point strokes have always replayed (as nothing).
fn record_path(record: &AnnotationRecord) -> BezPath {
    let mut path = BezPath::new();
    match record {
        AnnotationRecord::Pen(r) => {
            if r.points.len() > 1 {
                path.move_to(r.points[0]);
                for p in &r.points[1..] {
                    path.line_to(*p);
                }
            }
        }
        AnnotationRecord::Rectangle(r) => {
            path = kurbo::Rect::new(
                r.start_x,
                r.start_y,
                r.start_x + r.width,
                r.start_y + r.height,
            )
            .to_path(STROKE_TOLERANCE);
        }
        AnnotationRecord::Circle(r) => {
            path = kurbo::Circle::new((r.center_x, r.center_y), r.radius)
                .to_path(STROKE_TOLERANCE);
        }
        AnnotationRecord::Arrow(r) => {
            let start = Point::new(r.start_x, r.start_y);
            let end = Point::new(r.end_x, r.end_y);
            let angle = (end.y - start.y).atan2(end.x - start.x);

            // Shaft and first barb share a subpath (round join at the
            // tip); the second barb starts fresh from the tip.
            path.move_to(start);
            path.line_to(end);
            path.line_to(barb(end, angle - std::f64::consts::FRAC_PI_6));
            path.move_to(end);
            path.line_to(barb(end, angle + std::f64::consts::FRAC_PI_6));
        }
    }
    path
}

fn barb(tip: Point, angle: f64) -> Point {
    Point::new(
        tip.x - ARROW_HEAD_LEN * angle.cos(),
        tip.y - ARROW_HEAD_LEN * angle.sin(),
    )
}

/// Stroke `path` with round caps and joins by expanding it to a fill
/// outline, then filling through the rasterizer.
fn paint_stroke(ctx: &mut vello_cpu::RenderContext, path: &BezPath, color: Color, width: f64) {
    if path.elements().is_empty() {
        return;
    }
    let style = kurbo::Stroke::new(width)
        .with_caps(kurbo::Cap::Round)
        .with_join(kurbo::Join::Round);
    let outline = kurbo::stroke(
        path.elements().iter().copied(),
        &style,
        &kurbo::StrokeOpts::default(),
        STROKE_TOLERANCE,
    );

    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    ctx.fill_path(&bezpath_to_cpu(&outline));
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> OralmarkResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| OralmarkError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| OralmarkError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(OralmarkError::render("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

fn rgba_premul_to_image(
    bytes_premul: &[u8],
    width: u32,
    height: u32,
) -> OralmarkResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes_premul, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}
