//! Sticker glyph rasterization.
//!
//! Glyph strings are rasterized once per pixel size into straight-alpha
//! RGBA bitmaps whose center is the glyph's anchor. With a font, `swash`
//! renders color outlines, color bitmaps, or plain outlines (in that order
//! of preference). Text the font cannot map falls back to a placeholder
//! sticker that still shows orientation.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use swash::scale::image::{Content, Image};
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::Format;
use swash::FontRef;

use crate::sketch::model::Color;
use crate::sketch::render::blend_pixel;

const PLACEHOLDER_INSET: f32 = 0.1;
const PLACEHOLDER_APEX: f32 = 0.35;
const PLACEHOLDER_BASE_Y: f32 = 0.1;
const PLACEHOLDER_HALF_BASE: f32 = 0.25;

/// Validated font bytes, shared between the live and export surfaces.
#[derive(Clone)]
pub struct GlyphFont {
    data: Arc<[u8]>,
}

impl GlyphFont {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("read sticker font {}", path.display()))?;
        Self::from_bytes(data).with_context(|| format!("parse sticker font {}", path.display()))
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if FontRef::from_index(&data, 0).is_none() {
            return Err(anyhow!("font data is not a usable TrueType/OpenType face"));
        }
        Ok(Self { data: data.into() })
    }

    fn font_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(&self.data, 0)
    }
}

impl fmt::Debug for GlyphFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphFont")
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    /// Straight-alpha RGBA8, row-major.
    pub pixels: Vec<u8>,
}

impl GlyphBitmap {
    fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    fn blend(&mut self, x: i32, y: i32, src: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        blend_pixel(&mut self.pixels[idx..idx + 4], src);
    }
}

pub struct GlyphRasterizer {
    font: Option<GlyphFont>,
    context: ScaleContext,
    cache: HashMap<(String, u32), Arc<GlyphBitmap>>,
}

impl GlyphRasterizer {
    pub fn new(font: Option<GlyphFont>) -> Self {
        Self {
            font,
            context: ScaleContext::new(),
            cache: HashMap::new(),
        }
    }

    pub fn rasterize(&mut self, glyph: &str, pixel_size: f32) -> Arc<GlyphBitmap> {
        let key = (glyph.to_string(), pixel_size.to_bits());
        if let Some(bitmap) = self.cache.get(&key) {
            return Arc::clone(bitmap);
        }

        let rendered = self
            .font
            .as_ref()
            .and_then(|font| rasterize_with_font(&mut self.context, font, glyph, pixel_size));
        let bitmap = Arc::new(rendered.unwrap_or_else(|| {
            tracing::debug!(glyph, "no font coverage; using placeholder sticker");
            placeholder(glyph, pixel_size)
        }));
        self.cache.insert(key, Arc::clone(&bitmap));
        bitmap
    }
}

impl Default for GlyphRasterizer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for GlyphRasterizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphRasterizer")
            .field("font", &self.font)
            .field("cached", &self.cache.len())
            .finish()
    }
}

struct PlacedImage {
    x: i32,
    y: i32,
    image: Image,
}

fn rasterize_with_font(
    context: &mut ScaleContext,
    font: &GlyphFont,
    text: &str,
    pixel_size: f32,
) -> Option<GlyphBitmap> {
    let font_ref = font.font_ref()?;
    let units_per_em = font_ref.metrics(&[]).units_per_em as f32;
    if units_per_em <= 0.0 {
        return None;
    }
    let scale = pixel_size / units_per_em;
    let charmap = font_ref.charmap();
    let glyph_metrics = font_ref.glyph_metrics(&[]);

    let mut scaler = context.builder(font_ref).size(pixel_size).build();
    let mut render = Render::new(&[
        Source::ColorOutline(0),
        Source::ColorBitmap(StrikeWith::BestFit),
        Source::Outline,
    ]);
    render.format(Format::Alpha);

    let mut placed = Vec::new();
    let mut pen_x = 0.0_f32;
    for ch in text.chars() {
        let glyph_id = charmap.map(ch);
        if glyph_id == 0 {
            continue;
        }
        if let Some(image) = render.render(&mut scaler, glyph_id) {
            if image.placement.width > 0 && image.placement.height > 0 {
                placed.push(PlacedImage {
                    x: pen_x.round() as i32 + image.placement.left,
                    y: -image.placement.top,
                    image,
                });
            }
        }
        pen_x += glyph_metrics.advance_width(glyph_id) * scale;
    }

    let min_x = placed.iter().map(|p| p.x).min()?;
    let min_y = placed.iter().map(|p| p.y).min()?;
    let max_x = placed
        .iter()
        .map(|p| p.x + p.image.placement.width as i32)
        .max()?;
    let max_y = placed
        .iter()
        .map(|p| p.y + p.image.placement.height as i32)
        .max()?;

    let mut bitmap = GlyphBitmap::transparent((max_x - min_x) as u32, (max_y - min_y) as u32);
    for piece in &placed {
        composite_image(&mut bitmap, piece, min_x, min_y);
    }
    Some(bitmap)
}

fn composite_image(bitmap: &mut GlyphBitmap, piece: &PlacedImage, min_x: i32, min_y: i32) {
    let width = piece.image.placement.width as usize;
    let height = piece.image.placement.height as usize;
    let data = &piece.image.data;
    for row in 0..height {
        for col in 0..width {
            let src = match piece.image.content {
                Content::Mask => {
                    let coverage = data.get(row * width + col).copied().unwrap_or(0);
                    [0, 0, 0, coverage]
                }
                Content::SubpixelMask => {
                    let idx = (row * width + col) * 4;
                    let coverage = data
                        .get(idx..idx + 3)
                        .and_then(|rgb| rgb.iter().copied().max())
                        .unwrap_or(0);
                    [0, 0, 0, coverage]
                }
                Content::Color => {
                    let idx = (row * width + col) * 4;
                    match data.get(idx..idx + 4) {
                        Some(px) => [px[0], px[1], px[2], px[3]],
                        None => [0, 0, 0, 0],
                    }
                }
            };
            if src[3] == 0 {
                continue;
            }
            bitmap.blend(
                piece.x - min_x + col as i32,
                piece.y - min_y + row as i32,
                src,
            );
        }
    }
}

/// Framed sticker with a triangle pointing towards local -y, tinted by a
/// hash of the glyph text.
fn placeholder(text: &str, pixel_size: f32) -> GlyphBitmap {
    let side = pixel_size.round().max(1.0) as u32;
    let size = side as f32;
    let half = size / 2.0;
    let outer = half - size * PLACEHOLDER_INSET;
    let inner = outer - (size / 16.0).max(1.0);
    let color = Color::from_rgb24(fnv1a(text)).to_rgba_array();

    let apex = (0.0, -size * PLACEHOLDER_APEX);
    let left = (-size * PLACEHOLDER_HALF_BASE, size * PLACEHOLDER_BASE_Y);
    let right = (size * PLACEHOLDER_HALF_BASE, size * PLACEHOLDER_BASE_Y);

    let mut bitmap = GlyphBitmap::transparent(side, side);
    for y in 0..side {
        for x in 0..side {
            let lx = x as f32 + 0.5 - half;
            let ly = y as f32 + 0.5 - half;
            let in_outer = lx.abs() <= outer && ly.abs() <= outer;
            let in_inner = lx.abs() < inner && ly.abs() < inner;
            let on_frame = in_outer && !in_inner;
            if on_frame || point_in_triangle((lx, ly), apex, left, right) {
                bitmap.blend(x as i32, y as i32, color);
            }
        }
    }
    bitmap
}

fn point_in_triangle(p: (f32, f32), a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> bool {
    let edge = |p0: (f32, f32), p1: (f32, f32)| (p1.0 - p0.0) * (p.1 - p0.1) - (p1.1 - p0.1) * (p.0 - p0.0);
    let d0 = edge(a, b);
    let d1 = edge(b, c);
    let d2 = edge(c, a);
    let has_neg = d0 < 0.0 || d1 < 0.0 || d2 < 0.0;
    let has_pos = d0 > 0.0 || d1 > 0.0 || d2 > 0.0;
    !(has_neg && has_pos)
}

fn fnv1a(text: &str) -> u32 {
    text.bytes().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ byte as u32).wrapping_mul(0x0100_0193)
    })
}
