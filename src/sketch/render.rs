use anyhow::{bail, Result};

use crate::sketch::glyph::{GlyphFont, GlyphRasterizer};
use crate::sketch::history::HistoryStore;
use crate::sketch::input::InputController;
use crate::sketch::model::{Color, MarkerStroke, Point};
use crate::sketch::preview::Preview;
use crate::sketch::settings::SketchSettings;
use crate::sketch::surface::Surface;

const MIN_STROKE_RADIUS: f32 = 0.5;
/// Largest glyph side rasterized, in pixels.
const MAX_GLYPH_PIXELS: f32 = 4096.0;
const MAX_SURFACE_SIDE: u32 = 16_384;

/// Area a primitive may touch, in surface pixel space. Stays in floats until
/// [`Bounds::clip`] so far-away or non-finite geometry never reaches integer
/// math.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn around(center: Point, reach: f32) -> Self {
        Self {
            min_x: center.x - reach,
            min_y: center.y - reach,
            max_x: center.x + reach,
            max_y: center.y + reach,
        }
    }

    /// Box around a round-capped segment, with a pixel of slack.
    pub fn capsule(start: Point, end: Point, radius: f32) -> Self {
        let pad = radius + 1.0;
        Self {
            min_x: start.x.min(end.x) - pad,
            min_y: start.y.min(end.y) - pad,
            max_x: start.x.max(end.x) + pad,
            max_y: start.y.max(end.y) + pad,
        }
    }

    pub fn merge(self, other: Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Pixels of a `width` x `height` surface these bounds cover, or `None`
    /// when they miss it. NaN edges collapse to the surface edge they were
    /// compared against.
    pub fn clip(self, width: u32, height: u32) -> Option<PixelRect> {
        let (w, h) = (width as f32, height as f32);
        let x0 = self.min_x.floor().max(0.0).min(w);
        let y0 = self.min_y.floor().max(0.0).min(h);
        let x1 = (self.max_x.floor() + 1.0).max(0.0).min(w);
        let y1 = (self.max_y.floor() + 1.0).max(0.0).min(h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect {
            x0: x0 as u32,
            y0: y0 as u32,
            x1: x1 as u32,
            y1: y1 as u32,
        })
    }
}

/// Half-open pixel range `[x0, x1) x [y0, y1)`, always inside its surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    fn pixels(self) -> impl Iterator<Item = (u32, u32)> {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| (x, y)))
    }
}

/// Software RGBA8 surface with straight alpha. Drawing coordinates are
/// logical and multiplied by `scale` before rasterization, so the same
/// history can be replayed onto a larger export target.
#[derive(Debug)]
pub struct RgbaSurface {
    width: u32,
    height: u32,
    scale: f32,
    glyph_size: f32,
    pixels: Vec<u8>,
    glyphs: GlyphRasterizer,
}

impl RgbaSurface {
    pub fn new(
        width: u32,
        height: u32,
        scale: f32,
        glyph_size: f32,
        glyphs: GlyphRasterizer,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("drawing surface unavailable: {width}x{height} has no pixels");
        }
        if width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
            bail!("drawing surface unavailable: {width}x{height} exceeds {MAX_SURFACE_SIDE} per side");
        }
        if !(scale.is_finite() && scale > 0.0) {
            bail!("drawing surface unavailable: invalid scale {scale}");
        }
        let len = (width as usize) * (height as usize) * 4;
        Ok(Self {
            width,
            height,
            scale,
            glyph_size,
            pixels: vec![0; len],
            glyphs,
        })
    }

    pub fn for_canvas(settings: &SketchSettings, font: Option<GlyphFont>) -> Result<Self> {
        Self::new(
            settings.canvas_width,
            settings.canvas_height,
            1.0,
            settings.sticker_size,
            GlyphRasterizer::new(font),
        )
    }

    pub fn for_export(settings: &SketchSettings, font: Option<GlyphFont>) -> Result<Self> {
        Self::new(
            settings.export_width,
            settings.export_height,
            settings.export_scale(),
            settings.sticker_size,
            GlyphRasterizer::new(font),
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let idx = self.offset(x, y);
        Color::rgba(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        )
    }

    /// Number of pixels with any coverage.
    pub fn inked_pixels(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    fn blend_at(&mut self, x: u32, y: u32, color: [u8; 4]) {
        let idx = self.offset(x, y);
        blend_pixel(&mut self.pixels[idx..idx + 4], color);
    }
}

impl Surface for RgbaSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
    }

    fn draw_polyline(&mut self, points: &[Point], width: f32, color: Color) {
        if points.len() < 2 {
            return;
        }
        let radius = (width * self.scale / 2.0).max(MIN_STROKE_RADIUS);
        let scaled: Vec<Point> = points.iter().map(|p| p.scaled(self.scale)).collect();

        let Some(area) = scaled
            .windows(2)
            .map(|seg| Bounds::capsule(seg[0], seg[1], radius))
            .reduce(Bounds::merge)
            .and_then(|bounds| bounds.clip(self.width, self.height))
        else {
            return;
        };

        // Mask first so overlapping segments blend exactly once.
        let area_width = area.width() as usize;
        let mut mask = vec![false; area_width * area.height() as usize];
        let radius_sq = radius * radius;
        for seg in scaled.windows(2) {
            let Some(clip) = Bounds::capsule(seg[0], seg[1], radius).clip(self.width, self.height)
            else {
                continue;
            };
            for (x, y) in clip.pixels() {
                let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                if point_segment_distance_sq(center, seg[0], seg[1]) <= radius_sq {
                    mask[(y - area.y0) as usize * area_width + (x - area.x0) as usize] = true;
                }
            }
        }

        let rgba = color.to_rgba_array();
        for (x, y) in area.pixels() {
            if mask[(y - area.y0) as usize * area_width + (x - area.x0) as usize] {
                self.blend_at(x, y, rgba);
            }
        }
    }

    fn draw_circle(&mut self, center: Point, radius: f32, width: f32, color: Color) {
        let center = center.scaled(self.scale);
        let radius = radius * self.scale;
        let half_width = (width * self.scale / 2.0).max(MIN_STROKE_RADIUS);
        let outer = radius + half_width;
        let Some(clip) = Bounds::around(center, outer).clip(self.width, self.height) else {
            return;
        };

        let rgba = color.to_rgba_array();
        for (x, y) in clip.pixels() {
            let dx = x as f32 + 0.5 - center.x;
            let dy = y as f32 + 0.5 - center.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if (distance - radius).abs() <= half_width {
                self.blend_at(x, y, rgba);
            }
        }
    }

    fn draw_glyph(&mut self, glyph: &str, at: Point, rotation: f32) {
        let pixel_size = (self.glyph_size * self.scale).min(MAX_GLYPH_PIXELS);
        let bitmap = self.glyphs.rasterize(glyph, pixel_size);
        if bitmap.width == 0 || bitmap.height == 0 {
            return;
        }
        let anchor = at.scaled(self.scale);
        let half_w = bitmap.width as f32 / 2.0;
        let half_h = bitmap.height as f32 / 2.0;
        let reach = (half_w * half_w + half_h * half_h).sqrt();
        let Some(clip) = Bounds::around(anchor, reach).clip(self.width, self.height) else {
            return;
        };

        let (sin, cos) = rotation.to_radians().sin_cos();
        for (x, y) in clip.pixels() {
            let dx = x as f32 + 0.5 - anchor.x;
            let dy = y as f32 + 0.5 - anchor.y;
            // Inverse of translate-then-rotate.
            let lx = dx * cos + dy * sin + half_w;
            let ly = -dx * sin + dy * cos + half_h;
            if !(0.0..bitmap.width as f32).contains(&lx)
                || !(0.0..bitmap.height as f32).contains(&ly)
            {
                continue;
            }
            let src = bitmap.pixel(lx as u32, ly as u32);
            if src[3] != 0 {
                self.blend_at(x, y, src);
            }
        }
    }
}

/// Source-over for straight-alpha RGBA8.
pub(crate) fn blend_pixel(dst: &mut [u8], src: [u8; 4]) {
    match src[3] {
        0 => {}
        255 => dst.copy_from_slice(&src),
        alpha => {
            let sa = alpha as f32 / 255.0;
            let da = dst[3] as f32 / 255.0;
            let out_a = sa + da * (1.0 - sa);
            for channel in 0..3 {
                let sc = src[channel] as f32;
                let dc = dst[channel] as f32;
                let value = (sc * sa + dc * da * (1.0 - sa)) / out_a;
                dst[channel] = value.round().clamp(0.0, 255.0) as u8;
            }
            dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn point_segment_distance_sq(point: Point, start: Point, end: Point) -> f32 {
    let vx = end.x - start.x;
    let vy = end.y - start.y;
    let wx = point.x - start.x;
    let wy = point.y - start.y;
    let len_sq = vx * vx + vy * vy;
    if len_sq <= f32::EPSILON {
        return wx * wx + wy * wy;
    }
    let t = ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0);
    let dx = point.x - (start.x + vx * t);
    let dy = point.y - (start.y + vy * t);
    dx * dx + dy * dy
}

/// Full replay: committed history, then either the in-progress stroke or
/// the hover preview. The two overlays never appear together.
pub fn redraw<S: Surface + ?Sized>(
    surface: &mut S,
    history: &HistoryStore,
    stroke: Option<&MarkerStroke>,
    preview: Option<&Preview>,
) {
    match (stroke, preview) {
        (Some(stroke), _) => {
            replay_committed(surface, history);
            stroke.display(surface);
        }
        (None, Some(preview)) => preview.render(surface, history),
        (None, None) => replay_committed(surface, history),
    }
}

pub fn redraw_controller<S: Surface + ?Sized>(surface: &mut S, input: &InputController) {
    redraw(surface, input.history(), input.stroke(), input.preview());
}

pub fn replay_committed<S: Surface + ?Sized>(surface: &mut S, history: &HistoryStore) {
    surface.clear();
    history.replay(surface);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::model::StickerPlacement;
    use crate::sketch::preview::CursorPreview;
    use crate::sketch::surface::{RecordingSurface, SurfaceOp};

    fn surface(side: u32) -> RgbaSurface {
        RgbaSurface::new(side, side, 1.0, 16.0, GlyphRasterizer::default()).expect("surface")
    }

    fn line(points: &[(f32, f32)], thickness: f32) -> MarkerStroke {
        let mut stroke = MarkerStroke::new(points[0].into(), thickness, Color::BLACK);
        for p in &points[1..] {
            stroke.extend((*p).into());
        }
        stroke
    }

    #[test]
    fn zero_sized_surface_is_rejected() {
        assert!(RgbaSurface::new(0, 10, 1.0, 16.0, GlyphRasterizer::default()).is_err());
        assert!(RgbaSurface::new(10, 10, 0.0, 16.0, GlyphRasterizer::default()).is_err());
    }

    #[test]
    fn polyline_writes_pixels_with_stroke_color() {
        let mut target = surface(32);
        target.draw_polyline(
            &[Point::new(2.0, 2.0), Point::new(20.0, 20.0)],
            3.0,
            Color::rgb(200, 10, 10),
        );

        assert!(target.inked_pixels() > 0);
        assert_eq!(target.pixel(11, 11), Color::rgb(200, 10, 10));
        assert_eq!(target.pixel(30, 2), Color::TRANSPARENT);
    }

    #[test]
    fn thicker_strokes_cover_more_pixels() {
        let mut thin = surface(64);
        let mut thick = surface(64);
        line(&[(5.0, 32.0), (58.0, 32.0)], 3.0).display(&mut thin);
        line(&[(5.0, 32.0), (58.0, 32.0)], 15.0).display(&mut thick);

        assert!(thick.inked_pixels() > thin.inked_pixels() * 3);
    }

    #[test]
    fn translucent_overlap_blends_once_per_stroke() {
        let mut target = surface(32);
        let color = Color::rgba(0, 0, 255, 128);
        target.draw_polyline(
            &[
                Point::new(4.0, 16.0),
                Point::new(16.0, 16.0),
                Point::new(4.0, 16.0),
            ],
            5.0,
            color,
        );
        assert_eq!(target.pixel(10, 16), color);
    }

    #[test]
    fn cursor_ring_is_hollow() {
        let mut target = surface(64);
        target.draw_circle(Point::new(32.0, 32.0), 7.5, 1.0, Color::GRAY);

        assert_eq!(target.pixel(32, 32), Color::TRANSPARENT);
        assert_eq!(target.pixel(39, 32), Color::GRAY);
    }

    #[test]
    fn glyph_rotation_changes_pixels_at_same_anchor() {
        let mut upright = surface(64);
        let mut flipped = surface(64);
        StickerPlacement::new("🐸", 32.0, 32.0, 0.0).display(&mut upright);
        StickerPlacement::new("🐸", 32.0, 32.0, 180.0).display(&mut flipped);

        assert!(upright.inked_pixels() > 0);
        assert_ne!(upright.pixels(), flipped.pixels());
    }

    #[test]
    fn scaled_surface_grows_footprint() {
        let stroke = line(&[(2.0, 2.0), (10.0, 2.0)], 3.0);
        let mut small = surface(64);
        let mut large =
            RgbaSurface::new(256, 256, 4.0, 16.0, GlyphRasterizer::default()).expect("surface");
        stroke.display(&mut small);
        stroke.display(&mut large);

        assert!(large.inked_pixels() >= small.inked_pixels() * 12);
        assert_ne!(large.pixel(24, 8), Color::TRANSPARENT);
    }

    #[test]
    fn stroking_frame_omits_preview() {
        let history = HistoryStore::default();
        let stroke = line(&[(0.0, 0.0), (3.0, 3.0)], 3.0);
        let preview = Preview::Cursor(CursorPreview::new(Point::ORIGIN, 3.0, Color::GRAY));

        let mut target = RecordingSurface::new(16, 16);
        redraw(&mut target, &history, Some(&stroke), Some(&preview));
        assert!(target
            .frame()
            .iter()
            .all(|op| !matches!(op, SurfaceOp::Circle { .. })));

        redraw(&mut target, &history, None, Some(&preview));
        assert!(matches!(target.frame(), [SurfaceOp::Circle { .. }]));
    }

    #[test]
    fn far_away_stroke_is_clipped_not_wrapped() {
        let mut target = surface(32);
        target.draw_polyline(
            &[Point::new(0.0, 8.0), Point::new(3.0e9, 8.0)],
            3.0,
            Color::BLACK,
        );
        assert_eq!(target.pixel(20, 8), Color::BLACK);
        assert_eq!(target.pixel(20, 20), Color::TRANSPARENT);

        let mut offscreen = surface(32);
        offscreen.draw_polyline(
            &[Point::new(-4.0e9, -4.0e9), Point::new(-3.0e9, -3.0e9)],
            3.0,
            Color::BLACK,
        );
        assert_eq!(offscreen.inked_pixels(), 0);
    }

    #[test]
    fn huge_thickness_floods_surface() {
        let mut target = surface(16);
        target.draw_polyline(
            &[Point::new(0.0, 0.0), Point::new(3.0e9, 0.0)],
            1.0e10,
            Color::BLACK,
        );
        assert_eq!(target.inked_pixels(), 16 * 16);

        let mut ring = surface(16);
        ring.draw_circle(Point::new(8.0, 8.0), 5.0e9, 1.0, Color::GRAY);
        assert_eq!(ring.inked_pixels(), 0);
    }

    #[test]
    fn non_finite_geometry_draws_nothing() {
        let mut target = surface(16);
        target.draw_polyline(
            &[Point::new(f32::NAN, 1.0), Point::new(4.0, f32::NAN)],
            3.0,
            Color::BLACK,
        );
        target.draw_circle(Point::new(f32::INFINITY, 0.0), 2.0, 1.0, Color::BLACK);
        target.draw_glyph("🐸", Point::new(f32::NAN, f32::NAN), 0.0);
        assert_eq!(target.inked_pixels(), 0);
    }

    #[test]
    fn bounds_clip_to_surface() {
        let inside = Bounds::around(Point::new(4.0, 4.0), 1.5).clip(16, 16);
        assert_eq!(
            inside,
            Some(PixelRect {
                x0: 2,
                y0: 2,
                x1: 6,
                y1: 6
            })
        );

        let spanning = Bounds::capsule(Point::new(-1.0e12, 3.0), Point::new(1.0e12, 3.0), 1.0)
            .clip(16, 16)
            .expect("covers surface rows");
        assert_eq!((spanning.x0, spanning.x1), (0, 16));
        assert_eq!((spanning.y0, spanning.y1), (1, 6));

        assert_eq!(Bounds::around(Point::new(-50.0, 4.0), 2.0).clip(16, 16), None);
    }

    #[test]
    fn oversized_surface_is_rejected() {
        assert!(RgbaSurface::new(100_000, 10, 1.0, 16.0, GlyphRasterizer::default()).is_err());
    }

    #[test]
    fn blend_pixel_composites_over_transparent() {
        let mut dst = [0, 0, 0, 0];
        blend_pixel(&mut dst, [10, 20, 30, 128]);
        assert_eq!(dst, [10, 20, 30, 128]);

        let mut opaque = [255, 255, 255, 255];
        blend_pixel(&mut opaque, [0, 0, 0, 0]);
        assert_eq!(opaque, [255, 255, 255, 255]);
    }
}
