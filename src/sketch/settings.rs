use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::sketch::model::Color;

const MIN_THICKNESS: f32 = 1.0;
const MAX_THICKNESS: f32 = 256.0;
const MIN_STICKER_SIZE: f32 = 8.0;
const MAX_STICKER_SIZE: f32 = 512.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SketchSettings {
    #[serde(default = "default_canvas_side")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_side")]
    pub canvas_height: u32,
    #[serde(default = "default_thin_thickness")]
    pub thin_thickness: f32,
    #[serde(default = "default_thick_thickness")]
    pub thick_thickness: f32,
    #[serde(default = "default_initial_color")]
    pub initial_color: Color,
    #[serde(default = "default_stickers")]
    pub stickers: Vec<String>,
    #[serde(default = "default_sticker_size")]
    pub sticker_size: f32,
    #[serde(default = "default_cursor_color")]
    pub cursor_color: Color,
    #[serde(default = "default_true")]
    pub randomize_marker_color: bool,
    #[serde(default = "default_true")]
    pub randomize_sticker_rotation: bool,
    #[serde(default = "default_export_side")]
    pub export_width: u32,
    #[serde(default = "default_export_side")]
    pub export_height: u32,
    #[serde(default = "default_export_file_name")]
    pub export_file_name: String,
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for SketchSettings {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_side(),
            canvas_height: default_canvas_side(),
            thin_thickness: default_thin_thickness(),
            thick_thickness: default_thick_thickness(),
            initial_color: default_initial_color(),
            stickers: default_stickers(),
            sticker_size: default_sticker_size(),
            cursor_color: default_cursor_color(),
            randomize_marker_color: true,
            randomize_sticker_rotation: true,
            export_width: default_export_side(),
            export_height: default_export_side(),
            export_file_name: default_export_file_name(),
            font_path: None,
            debug_logging: false,
        }
    }
}

impl SketchSettings {
    pub fn sanitize(&mut self) {
        self.thin_thickness = within_or(
            self.thin_thickness,
            MIN_THICKNESS,
            MAX_THICKNESS,
            default_thin_thickness(),
        );
        self.thick_thickness = within_or(
            self.thick_thickness,
            MIN_THICKNESS,
            MAX_THICKNESS,
            default_thick_thickness(),
        );
        self.sticker_size = within_or(
            self.sticker_size,
            MIN_STICKER_SIZE,
            MAX_STICKER_SIZE,
            default_sticker_size(),
        );
        self.stickers.retain(|glyph| !glyph.is_empty());
        if self.export_file_name.trim().is_empty() {
            self.export_file_name = default_export_file_name();
        }
    }

    /// Uniform factor mapping canvas coordinates onto the export target.
    pub fn export_scale(&self) -> f32 {
        let sx = self.export_width.max(1) as f32 / self.canvas_width.max(1) as f32;
        let sy = self.export_height.max(1) as f32 / self.canvas_height.max(1) as f32;
        sx.min(sy)
    }
}

/// Out-of-range and NaN values fall back.
fn within_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if (min..=max).contains(&value) {
        value
    } else {
        fallback
    }
}

fn default_canvas_side() -> u32 {
    256
}

fn default_thin_thickness() -> f32 {
    3.0
}

fn default_thick_thickness() -> f32 {
    15.0
}

fn default_initial_color() -> Color {
    Color::BLACK
}

fn default_stickers() -> Vec<String> {
    ["🐸", "🦁", "🦓", "🐶", "🐱", "😎"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_sticker_size() -> f32 {
    64.0
}

fn default_cursor_color() -> Color {
    Color::GRAY
}

fn default_true() -> bool {
    true
}

fn default_export_side() -> u32 {
    1024
}

fn default_export_file_name() -> String {
    "sketchpad.png".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_sketchpad_layout() {
        let settings = SketchSettings::default();
        assert_eq!((settings.canvas_width, settings.canvas_height), (256, 256));
        assert_eq!(settings.thin_thickness, 3.0);
        assert_eq!(settings.thick_thickness, 15.0);
        assert_eq!(settings.stickers.len(), 6);
        assert_eq!(settings.export_scale(), 4.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: SketchSettings =
            serde_json::from_str(r##"{"thick_thickness": 20, "initial_color": "#ff0000"}"##)
                .expect("partial settings");
        assert_eq!(settings.thick_thickness, 20.0);
        assert_eq!(settings.initial_color, Color::rgb(255, 0, 0));
        assert_eq!(settings.thin_thickness, 3.0);
        assert_eq!(settings.export_file_name, "sketchpad.png");
    }

    #[test]
    fn sanitize_repairs_degenerate_values() {
        let mut settings = SketchSettings {
            canvas_width: 0,
            export_height: 0,
            thin_thickness: -2.0,
            thick_thickness: f32::NAN,
            sticker_size: 0.0,
            stickers: vec![String::new(), "⭐".to_string()],
            export_file_name: "  ".to_string(),
            ..SketchSettings::default()
        };
        settings.sanitize();

        // Surface sizes are left alone; a zero size is a startup error.
        assert_eq!(settings.canvas_width, 0);
        assert_eq!(settings.export_height, 0);
        assert_eq!(settings.thin_thickness, 3.0);
        assert_eq!(settings.thick_thickness, 15.0);
        assert_eq!(settings.sticker_size, 64.0);
        assert_eq!(settings.stickers, vec!["⭐".to_string()]);
        assert_eq!(settings.export_file_name, "sketchpad.png");

        let mut oversized = SketchSettings {
            thin_thickness: 1.0e10,
            thick_thickness: f32::INFINITY,
            sticker_size: 1.0e6,
            ..SketchSettings::default()
        };
        oversized.sanitize();
        assert_eq!(oversized.thin_thickness, 3.0);
        assert_eq!(oversized.thick_thickness, 15.0);
        assert_eq!(oversized.sticker_size, 64.0);

        let mut edges = SketchSettings {
            thin_thickness: 1.0,
            thick_thickness: 256.0,
            sticker_size: 512.0,
            ..SketchSettings::default()
        };
        edges.sanitize();
        assert_eq!(
            (edges.thin_thickness, edges.thick_thickness, edges.sticker_size),
            (1.0, 256.0, 512.0)
        );
    }

    #[test]
    fn export_scale_uses_tighter_axis() {
        let settings = SketchSettings {
            canvas_width: 100,
            canvas_height: 50,
            export_width: 400,
            export_height: 100,
            ..SketchSettings::default()
        };
        assert_eq!(settings.export_scale(), 2.0);
    }
}
