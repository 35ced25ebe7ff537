use web_sys::CanvasRenderingContext2d;

use sketchduel_shared::Segment;

use crate::history::History;

/// Immediate-mode drawing target, in canvas pixels.
pub trait Surface {
    fn clear(&self, width: f64, height: f64);
    fn stroke_segment(&self, segment: &Segment);
}

pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        ctx.set_line_cap("round");
        ctx.set_line_join("round");
        Self { ctx }
    }

    /// Resizing a canvas resets its context state, so this runs after every
    /// resize with the current device pixel ratio.
    pub fn reset(&self, pixel_ratio: f64) {
        let _ = self
            .ctx
            .set_transform(pixel_ratio, 0.0, 0.0, pixel_ratio, 0.0, 0.0);
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
    }
}

impl Surface for CanvasSurface {
    fn clear(&self, width: f64, height: f64) {
        self.ctx.clear_rect(0.0, 0.0, width, height);
    }

    fn stroke_segment(&self, segment: &Segment) {
        let ctx = &self.ctx;
        ctx.begin_path();
        ctx.move_to(segment.x, segment.y);
        ctx.line_to(segment.x2, segment.y2);
        ctx.set_stroke_style_str(&segment.color);
        ctx.set_line_width(segment.width);
        ctx.stroke();
    }
}

pub fn redraw(surface: &impl Surface, history: &History, width: f64, height: f64) {
    surface.clear(width, height);
    for segment in history.iter() {
        surface.stroke_segment(segment);
    }
}
