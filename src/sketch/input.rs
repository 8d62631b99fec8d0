use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::sketch::history::HistoryStore;
use crate::sketch::model::{Color, MarkerStroke, Point};
use crate::sketch::preview::{CursorPreview, GlyphPreview, Preview};
use crate::sketch::settings::SketchSettings;

const MAX_RGB24: u32 = 0xFF_FFFF;
const FULL_TURN_DEGREES: f32 = 360.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolSelection {
    Thin,
    Thick,
    Sticker { index: usize },
}

/// Everything the input source and tool buttons can deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown {
        x: f32,
        y: f32,
    },
    PointerMove {
        x: f32,
        y: f32,
    },
    /// Release may arrive from outside the surface bounds, so it carries no
    /// position.
    PointerUp,
    SelectTool {
        tool: ToolSelection,
    },
    SetColor {
        color: Color,
    },
    AddSticker {
        #[serde(default)]
        glyph: Option<String>,
    },
    Undo,
    Redo,
    Clear,
    Export {
        #[serde(default)]
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Redraw,
    Export { path: Option<PathBuf> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Idle,
    Stroking,
}

/// Session-scoped tool settings, passed around instead of living in globals.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolState {
    pub thickness: f32,
    pub color: Color,
    pub glyph: Option<String>,
    pub rotation: Option<f32>,
}

impl ToolState {
    pub fn from_settings(settings: &SketchSettings) -> Self {
        Self {
            thickness: settings.thin_thickness,
            color: settings.initial_color,
            glyph: None,
            rotation: None,
        }
    }
}

/// Glyph buttons in creation order; a button's index never changes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StickerSet {
    glyphs: Vec<String>,
}

impl StickerSet {
    pub fn new(glyphs: impl IntoIterator<Item = String>) -> Self {
        Self {
            glyphs: glyphs.into_iter().filter(|g| !g.is_empty()).collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.glyphs.get(index).map(String::as_str)
    }

    /// Appends a prompt result. Empty or cancelled input leaves the set
    /// unchanged.
    pub fn add(&mut self, glyph: Option<String>) -> Option<usize> {
        let glyph = glyph.filter(|g| !g.is_empty())?;
        self.glyphs.push(glyph);
        Some(self.glyphs.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct InputController {
    thin_thickness: f32,
    thick_thickness: f32,
    cursor_color: Color,
    randomize_marker_color: bool,
    randomize_sticker_rotation: bool,
    tools: ToolState,
    stickers: StickerSet,
    history: HistoryStore,
    stroke: Option<MarkerStroke>,
    preview: Option<Preview>,
    rng: StdRng,
}

impl InputController {
    pub fn new(settings: &SketchSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    pub fn with_seed(settings: &SketchSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(settings: &SketchSettings, rng: StdRng) -> Self {
        Self {
            thin_thickness: settings.thin_thickness,
            thick_thickness: settings.thick_thickness,
            cursor_color: settings.cursor_color,
            randomize_marker_color: settings.randomize_marker_color,
            randomize_sticker_rotation: settings.randomize_sticker_rotation,
            tools: ToolState::from_settings(settings),
            stickers: StickerSet::new(settings.stickers.iter().cloned()),
            history: HistoryStore::default(),
            stroke: None,
            preview: None,
            rng,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn stroke(&self) -> Option<&MarkerStroke> {
        self.stroke.as_ref()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn stickers(&self) -> &StickerSet {
        &self.stickers
    }

    pub fn mode(&self) -> InputMode {
        if self.stroke.is_some() {
            InputMode::Stroking
        } else {
            InputMode::Idle
        }
    }

    pub fn handle(&mut self, event: InputEvent) -> Option<InputCommand> {
        match event {
            InputEvent::PointerDown { x, y } => self.pointer_down(Point::new(x, y)),
            InputEvent::PointerMove { x, y } => self.pointer_move(Point::new(x, y)),
            InputEvent::PointerUp => self.pointer_up(),
            InputEvent::SelectTool { tool } => self.select_tool(tool),
            InputEvent::SetColor { color } => self.set_color(color),
            InputEvent::AddSticker { glyph } => {
                let _ = self.add_custom_sticker(glyph);
                None
            }
            InputEvent::Undo => self.undo(),
            InputEvent::Redo => self.redo(),
            InputEvent::Clear => self.clear(),
            InputEvent::Export { path } => Some(InputCommand::Export { path }),
        }
    }

    pub fn pointer_down(&mut self, point: Point) -> Option<InputCommand> {
        if let Some(Preview::Glyph(glyph)) = self.preview.as_mut() {
            glyph.position = point;
            let placement = glyph.to_placement();
            tracing::debug!(glyph = placement.glyph(), x = point.x, y = point.y, "place sticker");
            self.history.commit(placement);
            return Some(InputCommand::Redraw);
        }

        if let Some(stroke) = self.stroke.take() {
            tracing::debug!("press while stroking; committing previous stroke");
            self.history.commit(stroke);
        }

        self.stroke = Some(MarkerStroke::new(
            point,
            self.tools.thickness,
            self.tools.color,
        ));
        Some(InputCommand::Redraw)
    }

    pub fn pointer_move(&mut self, point: Point) -> Option<InputCommand> {
        if let Some(stroke) = self.stroke.as_mut() {
            stroke.extend(point);
            return Some(InputCommand::Redraw);
        }

        let preview = self.preview.as_mut()?;
        preview.update_position(point);
        Some(InputCommand::Redraw)
    }

    pub fn pointer_up(&mut self) -> Option<InputCommand> {
        let stroke = self.stroke.take()?;
        self.history.commit(stroke);
        Some(InputCommand::Redraw)
    }

    pub fn select_tool(&mut self, tool: ToolSelection) -> Option<InputCommand> {
        match tool {
            ToolSelection::Thin => self.select_marker(self.thin_thickness),
            ToolSelection::Thick => self.select_marker(self.thick_thickness),
            ToolSelection::Sticker { index } => {
                let Some(glyph) = self.stickers.get(index).map(str::to_owned) else {
                    tracing::warn!(index, available = self.stickers.len(), "unknown sticker button");
                    return None;
                };
                let rotation = if self.randomize_sticker_rotation {
                    self.rng.gen_range(0.0..FULL_TURN_DEGREES)
                } else {
                    0.0
                };
                self.randomize_color();
                tracing::debug!(%glyph, rotation, "sticker tool selected");
                self.tools.glyph = Some(glyph);
                self.tools.rotation = Some(rotation);
            }
        }
        self.refresh_preview();
        Some(InputCommand::Redraw)
    }

    /// New color applies to strokes created from now on only.
    pub fn set_color(&mut self, color: Color) -> Option<InputCommand> {
        self.tools.color = color;
        self.refresh_preview();
        Some(InputCommand::Redraw)
    }

    pub fn add_custom_sticker(&mut self, glyph: Option<String>) -> Option<usize> {
        let index = self.stickers.add(glyph)?;
        tracing::debug!(index, "custom sticker added");
        Some(index)
    }

    pub fn undo(&mut self) -> Option<InputCommand> {
        self.history.undo().then_some(InputCommand::Redraw)
    }

    pub fn redo(&mut self) -> Option<InputCommand> {
        self.history.redo().then_some(InputCommand::Redraw)
    }

    pub fn clear(&mut self) -> Option<InputCommand> {
        self.history.clear();
        Some(InputCommand::Redraw)
    }

    fn select_marker(&mut self, thickness: f32) {
        self.randomize_color();
        self.tools.thickness = thickness;
        self.tools.glyph = None;
        self.tools.rotation = None;
        tracing::debug!(thickness, color = %self.tools.color.to_hex(), "marker tool selected");
    }

    fn randomize_color(&mut self) {
        if self.randomize_marker_color {
            self.tools.color = Color::from_rgb24(self.rng.gen_range(0..=MAX_RGB24));
        }
    }

    /// Replaces the live preview with one reflecting the active tool. The
    /// fresh preview starts at the surface origin and follows the next
    /// pointer move.
    fn refresh_preview(&mut self) {
        let preview = match (&self.tools.glyph, self.tools.rotation) {
            (Some(glyph), rotation) => Preview::Glyph(GlyphPreview::new(
                glyph.clone(),
                Point::ORIGIN,
                rotation.unwrap_or(0.0),
            )),
            (None, _) => Preview::Cursor(CursorPreview::new(
                Point::ORIGIN,
                self.tools.thickness,
                self.cursor_color,
            )),
        };
        self.preview = Some(preview);
    }
}
