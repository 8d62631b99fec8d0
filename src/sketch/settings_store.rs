use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

use crate::sketch::settings::SketchSettings;

pub const SKETCH_SETTINGS_FILE_NAME: &str = "sketch_settings.json";

pub fn settings_path_from_exe_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(SKETCH_SETTINGS_FILE_NAME))
}

pub fn resolve_settings_path() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    settings_path_from_exe_path(&exe_path)
}

pub fn load() -> Result<SketchSettings> {
    load_from_path(&resolve_settings_path()?)
}

pub fn load_from_path(path: &Path) -> Result<SketchSettings> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no sketch settings file; using defaults");
        return Ok(SketchSettings::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read sketch settings file {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(SketchSettings::default());
    }

    let mut loaded: SketchSettings = serde_json::from_str(&content)
        .with_context(|| format!("deserialize sketch settings file {}", path.display()))?;
    loaded.sanitize();
    Ok(loaded)
}

pub fn save_to_path(path: &Path, settings: &SketchSettings) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create sketch settings parent folder {}", parent.display()))?;
    }

    let mut sanitized = settings.clone();
    sanitized.sanitize();
    let json =
        serde_json::to_string_pretty(&sanitized).context("serialize sketch settings")?;
    std::fs::write(path, json)
        .with_context(|| format!("write sketch settings file {}", path.display()))
}
