use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::sketch::glyph::GlyphFont;
use crate::sketch::history::HistoryStore;
use crate::sketch::input::{InputCommand, InputController, InputEvent};
use crate::sketch::render::{redraw_controller, RgbaSurface};
use crate::sketch::save::{default_export_path, export_png};
use crate::sketch::settings::SketchSettings;
use crate::sketch::surface::Surface;

/// One sketching session: the input controller plus the surface it is
/// shown on. Every state change is followed by a full synchronous replay.
pub struct Sketchpad<S: Surface> {
    settings: SketchSettings,
    font: Option<GlyphFont>,
    input: InputController,
    surface: S,
    redraws: u64,
}

impl Sketchpad<RgbaSurface> {
    /// Fails once, at startup, when the surface or configured font is
    /// unusable.
    pub fn from_settings(mut settings: SketchSettings) -> Result<Self> {
        settings.sanitize();
        let font = settings
            .font_path
            .as_deref()
            .map(GlyphFont::load)
            .transpose()?;
        let surface = RgbaSurface::for_canvas(&settings, font.clone())?;
        let input = InputController::new(&settings);
        if input.stickers().is_empty() {
            tracing::warn!("no sticker glyphs configured; only markers are available");
        }
        Ok(Self::with_parts(settings, font, input, surface))
    }
}

impl<S: Surface> Sketchpad<S> {
    pub fn with_parts(
        settings: SketchSettings,
        font: Option<GlyphFont>,
        input: InputController,
        surface: S,
    ) -> Self {
        let (width, height) = surface.size();
        tracing::info!(
            width,
            height,
            font = font.is_some(),
            stickers = input.stickers().len(),
            "sketchpad ready"
        );
        let mut pad = Self {
            settings,
            font,
            input,
            surface,
            redraws: 0,
        };
        pad.redraw();
        pad
    }

    pub fn settings(&self) -> &SketchSettings {
        &self.settings
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    pub fn history(&self) -> &HistoryStore {
        self.input.history()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    /// Applies one event. Returns the written file when the event was an
    /// export request.
    pub fn dispatch(&mut self, event: InputEvent) -> Result<Option<PathBuf>> {
        match self.input.handle(event) {
            Some(InputCommand::Redraw) => {
                self.redraw();
                Ok(None)
            }
            Some(InputCommand::Export { path }) => self.export(path.as_deref()).map(Some),
            None => Ok(None),
        }
    }

    pub fn redraw(&mut self) {
        redraw_controller(&mut self.surface, &self.input);
        self.redraws += 1;
    }

    /// Writes the committed history as PNG, defaulting to a timestamped
    /// file in the export folder next to the executable.
    pub fn export(&self, path: Option<&Path>) -> Result<PathBuf> {
        let target = match path {
            Some(path) => path.to_path_buf(),
            None => default_export_path(&self.settings)?,
        };
        export_png(
            self.input.history(),
            &self.settings,
            self.font.clone(),
            &target,
        )?;
        Ok(target)
    }
}
