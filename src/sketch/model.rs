use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::sketch::surface::Surface;

const FALLBACK_THICKNESS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn scaled(self, scale: f32) -> Self {
        Self {
            x: self.x * scale,
            y: self.y * scale,
        }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ColorWire")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const GRAY: Self = Self::rgba(128, 128, 128, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Opaque color from the low 24 bits of `value`, `0xRRGGBB`.
    pub const fn from_rgb24(value: u32) -> Self {
        Self::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    pub fn to_rgba_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "black" => return Ok(Self::BLACK),
            "gray" | "grey" => return Ok(Self::GRAY),
            "transparent" => return Ok(Self::TRANSPARENT),
            _ => {}
        }

        let hex = trimmed
            .strip_prefix('#')
            .ok_or_else(|| anyhow!("color '{trimmed}' must start with '#'"))?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("color '{trimmed}' contains non-hex digits");
        }

        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        let color = match hex.len() {
            3 => Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?),
            6 => Self::rgb(byte(0)?, byte(2)?, byte(4)?),
            8 => Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?),
            len => bail!("color '{trimmed}' has {len} hex digits, expected 3, 6 or 8"),
        };
        Ok(color)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ColorWire {
    Hex(String),
    Rgba {
        r: u8,
        g: u8,
        b: u8,
        #[serde(default = "opaque")]
        a: u8,
    },
}

fn opaque() -> u8 {
    255
}

impl TryFrom<ColorWire> for Color {
    type Error = anyhow::Error;

    fn try_from(wire: ColorWire) -> Result<Self, Self::Error> {
        match wire {
            ColorWire::Hex(hex) => hex.parse(),
            ColorWire::Rgba { r, g, b, a } => Ok(Self::rgba(r, g, b, a)),
        }
    }
}

/// Freehand line. Points are only appended while the stroke sits in the
/// controller's in-progress slot; once committed it is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStroke {
    points: Vec<Point>,
    thickness: f32,
    color: Color,
}

impl MarkerStroke {
    pub fn new(initial: Point, thickness: f32, color: Color) -> Self {
        let thickness = if thickness > 0.0 {
            thickness
        } else {
            tracing::warn!(thickness, "non-positive marker thickness replaced");
            FALLBACK_THICKNESS
        };
        Self {
            points: vec![initial],
            thickness,
            color,
        }
    }

    pub fn extend(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Number of visible segments; a single click yields none.
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn display<S: Surface + ?Sized>(&self, surface: &mut S) {
        if self.points.len() < 2 {
            return;
        }
        surface.draw_polyline(&self.points, self.thickness, self.color);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StickerPlacement {
    glyph: String,
    position: Point,
    rotation: f32,
}

impl StickerPlacement {
    pub fn new(glyph: impl Into<String>, x: f32, y: f32, rotation: f32) -> Self {
        Self {
            glyph: glyph.into(),
            position: Point::new(x, y),
            rotation,
        }
    }

    pub fn glyph(&self) -> &str {
        &self.glyph
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Rotation in degrees, clockwise on a y-down surface.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn display<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface.draw_glyph(&self.glyph, self.position, self.rotation);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawableKind {
    Stroke,
    Sticker,
}

/// A committed, replayable action.
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    Stroke(MarkerStroke),
    Sticker(StickerPlacement),
}

impl Drawable {
    pub fn kind(&self) -> DrawableKind {
        match self {
            Drawable::Stroke(_) => DrawableKind::Stroke,
            Drawable::Sticker(_) => DrawableKind::Sticker,
        }
    }

    pub fn display<S: Surface + ?Sized>(&self, surface: &mut S) {
        match self {
            Drawable::Stroke(stroke) => stroke.display(surface),
            Drawable::Sticker(sticker) => sticker.display(surface),
        }
    }
}

impl From<MarkerStroke> for Drawable {
    fn from(stroke: MarkerStroke) -> Self {
        Drawable::Stroke(stroke)
    }
}

impl From<StickerPlacement> for Drawable {
    fn from(sticker: StickerPlacement) -> Self {
        Drawable::Sticker(sticker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::surface::{RecordingSurface, SurfaceOp};

    #[test]
    fn single_point_stroke_renders_nothing() {
        let stroke = MarkerStroke::new(Point::new(4.0, 4.0), 3.0, Color::BLACK);
        let mut surface = RecordingSurface::new(32, 32);
        stroke.display(&mut surface);

        assert_eq!(stroke.segment_count(), 0);
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn stroke_renders_points_in_insertion_order_with_own_style() {
        let mut stroke = MarkerStroke::new(Point::new(0.0, 0.0), 15.0, Color::rgb(10, 20, 30));
        stroke.extend(Point::new(5.0, 5.0));
        stroke.extend(Point::new(9.0, 2.0));

        let mut surface = RecordingSurface::new(32, 32);
        stroke.display(&mut surface);

        assert_eq!(stroke.segment_count(), 2);
        assert_eq!(
            surface.ops(),
            &[SurfaceOp::Polyline {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(5.0, 5.0),
                    Point::new(9.0, 2.0)
                ],
                width: 15.0,
                color: Color::rgb(10, 20, 30),
            }]
        );
    }

    #[test]
    fn non_positive_thickness_falls_back() {
        let stroke = MarkerStroke::new(Point::ORIGIN, 0.0, Color::BLACK);
        assert_eq!(stroke.thickness(), FALLBACK_THICKNESS);
        let stroke = MarkerStroke::new(Point::ORIGIN, f32::NAN, Color::BLACK);
        assert_eq!(stroke.thickness(), FALLBACK_THICKNESS);
    }

    #[test]
    fn sticker_displays_fixed_transform() {
        let sticker = StickerPlacement::new("🦁", 20.0, 20.0, 45.0);
        let mut surface = RecordingSurface::new(64, 64);
        Drawable::from(sticker).display(&mut surface);

        assert_eq!(
            surface.ops(),
            &[SurfaceOp::Glyph {
                glyph: "🦁".to_string(),
                at: Point::new(20.0, 20.0),
                rotation: 45.0,
            }]
        );
    }

    #[test]
    fn color_parses_hex_forms() {
        assert_eq!("#000".parse::<Color>().unwrap(), Color::BLACK);
        assert_eq!("#ff8000".parse::<Color>().unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(
            "#01020304".parse::<Color>().unwrap(),
            Color::rgba(1, 2, 3, 4)
        );
        assert_eq!("black".parse::<Color>().unwrap(), Color::BLACK);
        assert!("ff8000".parse::<Color>().is_err());
        assert!("#ff80".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
    }

    #[test]
    fn color_deserializes_from_hex_or_object() {
        let hex: Color = serde_json::from_str("\"#0a0b0c\"").unwrap();
        assert_eq!(hex, Color::rgb(10, 11, 12));

        let object: Color = serde_json::from_str(r#"{"r":1,"g":2,"b":3}"#).unwrap();
        assert_eq!(object, Color::rgb(1, 2, 3));

        let roundtrip: Color =
            serde_json::from_str(&serde_json::to_string(&Color::rgba(9, 8, 7, 6)).unwrap())
                .unwrap();
        assert_eq!(roundtrip, Color::rgba(9, 8, 7, 6));
    }

    #[test]
    fn rgb24_and_hex_agree() {
        let color = Color::from_rgb24(0x12ab34);
        assert_eq!(color.to_hex(), "#12ab34");
        assert_eq!(color.to_hex().parse::<Color>().unwrap(), color);
    }
}
