//! Drawing surface contract.
//!
//! Drawables and previews only ever talk to a [`Surface`]; the raster
//! implementation lives in [`crate::sketch::render`], and
//! [`RecordingSurface`] captures the primitive calls for inspection.

use crate::sketch::model::{Color, Point};

pub trait Surface {
    /// Pixel dimensions of the backing target.
    fn size(&self) -> (u32, u32);

    /// Resets the whole surface to transparent.
    fn clear(&mut self);

    /// Connected polyline through `points`; `points.len() - 1` segments.
    fn draw_polyline(&mut self, points: &[Point], width: f32, color: Color);

    /// Unfilled circle outline.
    fn draw_circle(&mut self, center: Point, radius: f32, width: f32, color: Color);

    /// Translates to `at`, rotates by `rotation` degrees and draws `glyph`
    /// centered on the local origin.
    fn draw_glyph(&mut self, glyph: &str, at: Point, rotation: f32);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Clear,
    Polyline {
        points: Vec<Point>,
        width: f32,
        color: Color,
    },
    Circle {
        center: Point,
        radius: f32,
        width: f32,
        color: Color,
    },
    Glyph {
        glyph: String,
        at: Point,
        rotation: f32,
    },
}

/// Surface that records the primitive operations issued since the last
/// clear. A `Clear` op is kept as the first entry so callers can tell a
/// full replay from an overlay-only draw.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    ops: Vec<SurfaceOp>,
    clears: usize,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
            clears: 0,
        }
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Ops after the most recent clear.
    pub fn frame(&self) -> &[SurfaceOp] {
        match self.ops.first() {
            Some(SurfaceOp::Clear) => &self.ops[1..],
            _ => &self.ops,
        }
    }

    pub fn clear_count(&self) -> usize {
        self.clears
    }

    pub fn segment_count(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                SurfaceOp::Polyline { points, .. } => points.len().saturating_sub(1),
                _ => 0,
            })
            .sum()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(SurfaceOp::Clear);
        self.clears += 1;
    }

    fn draw_polyline(&mut self, points: &[Point], width: f32, color: Color) {
        self.ops.push(SurfaceOp::Polyline {
            points: points.to_vec(),
            width,
            color,
        });
    }

    fn draw_circle(&mut self, center: Point, radius: f32, width: f32, color: Color) {
        self.ops.push(SurfaceOp::Circle {
            center,
            radius,
            width,
            color,
        });
    }

    fn draw_glyph(&mut self, glyph: &str, at: Point, rotation: f32) {
        self.ops.push(SurfaceOp::Glyph {
            glyph: glyph.to_string(),
            at,
            rotation,
        });
    }
}
