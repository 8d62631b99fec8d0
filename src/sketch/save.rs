use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sketch::glyph::GlyphFont;
use crate::sketch::history::HistoryStore;
use crate::sketch::render::{replay_committed, RgbaSurface};
use crate::sketch::settings::SketchSettings;

pub const SKETCH_EXPORT_SUBDIR: &str = "sketch_exports";

/// Replays committed history only; the in-progress stroke and any preview
/// never reach an export.
pub fn render_export(
    history: &HistoryStore,
    settings: &SketchSettings,
    font: Option<GlyphFont>,
) -> Result<RgbaSurface> {
    let mut surface = RgbaSurface::for_export(settings, font)?;
    replay_committed(&mut surface, history);
    Ok(surface)
}

pub fn write_png(surface: &RgbaSurface, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create export folder {}", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        surface.pixels(),
        surface.width(),
        surface.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("encode png {}", path.display()))
}

pub fn export_png(
    history: &HistoryStore,
    settings: &SketchSettings,
    font: Option<GlyphFont>,
    path: &Path,
) -> Result<()> {
    let surface = render_export(history, settings, font)?;
    write_png(&surface, path)?;
    tracing::info!(
        path = %path.display(),
        drawables = history.undo_len(),
        width = surface.width(),
        height = surface.height(),
        "sketch exported"
    );
    Ok(())
}

pub fn exe_relative_output_folder_from_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(SKETCH_EXPORT_SUBDIR))
}

pub fn ensure_output_folder() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    let output = exe_relative_output_folder_from_path(&exe_path)?;
    fs::create_dir_all(&output)
        .with_context(|| format!("create sketch output folder {}", output.display()))?;
    Ok(output)
}

pub fn timestamped_stem(now: chrono::DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// `sketchpad.png` + timestamp -> `sketchpad_20260102_030405.png`.
pub fn build_filename(file_name: &str, now: chrono::DateTime<Local>) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("sketchpad");
    format!("{}_{}.png", stem, timestamped_stem(now))
}

pub fn default_export_path(settings: &SketchSettings) -> Result<PathBuf> {
    let folder = ensure_output_folder()?;
    Ok(folder.join(build_filename(&settings.export_file_name, Local::now())))
}
