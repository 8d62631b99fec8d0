//! Transient tool overlays. Previews are never committed to history.

use crate::sketch::history::HistoryStore;
use crate::sketch::model::{Color, Point, StickerPlacement};
use crate::sketch::surface::Surface;

const CURSOR_LINE_WIDTH: f32 = 1.0;

/// Hover ring showing the marker footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorPreview {
    pub position: Point,
    pub thickness: f32,
    pub color: Color,
}

impl CursorPreview {
    pub fn new(position: Point, thickness: f32, color: Color) -> Self {
        Self {
            position,
            thickness,
            color,
        }
    }

    fn draw_overlay<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface.draw_circle(
            self.position,
            self.thickness / 2.0,
            CURSOR_LINE_WIDTH,
            self.color,
        );
    }
}

/// Ghost of the sticker that a press would commit.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphPreview {
    pub glyph: String,
    pub position: Point,
    pub rotation: f32,
}

impl GlyphPreview {
    pub fn new(glyph: impl Into<String>, position: Point, rotation: f32) -> Self {
        Self {
            glyph: glyph.into(),
            position,
            rotation,
        }
    }

    /// The placement a press at the current position produces.
    pub fn to_placement(&self) -> StickerPlacement {
        StickerPlacement::new(
            self.glyph.clone(),
            self.position.x,
            self.position.y,
            self.rotation,
        )
    }

    fn draw_overlay<S: Surface + ?Sized>(&self, surface: &mut S) {
        // Same transform path as a committed sticker.
        self.to_placement().display(surface);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    Cursor(CursorPreview),
    Glyph(GlyphPreview),
}

impl Preview {
    pub fn position(&self) -> Point {
        match self {
            Preview::Cursor(cursor) => cursor.position,
            Preview::Glyph(glyph) => glyph.position,
        }
    }

    pub fn update_position(&mut self, position: Point) {
        match self {
            Preview::Cursor(cursor) => cursor.position = position,
            Preview::Glyph(glyph) => glyph.position = position,
        }
    }

    /// Clears the surface, replays committed history, then overlays the
    /// preview.
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S, history: &HistoryStore) {
        surface.clear();
        history.replay(surface);
        self.draw_overlay(surface);
    }

    pub fn draw_overlay<S: Surface + ?Sized>(&self, surface: &mut S) {
        match self {
            Preview::Cursor(cursor) => cursor.draw_overlay(surface),
            Preview::Glyph(glyph) => glyph.draw_overlay(surface),
        }
    }
}
