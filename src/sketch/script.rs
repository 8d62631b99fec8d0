//! Recorded input sessions.
//!
//! A script is a JSON array of [`InputEvent`]s, replayed in order through a
//! [`Sketchpad`] exactly as live input would be.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::sketch::input::InputEvent;
use crate::sketch::service::Sketchpad;
use crate::sketch::surface::Surface;

pub fn parse_script(content: &str) -> Result<Vec<InputEvent>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(content).context("deserialize input script")
}

pub fn load_script(path: &Path) -> Result<Vec<InputEvent>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read input script {}", path.display()))?;
    parse_script(&content).with_context(|| format!("parse input script {}", path.display()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptReport {
    pub events: usize,
    pub exports: Vec<PathBuf>,
}

pub fn run_script<S: Surface>(
    pad: &mut Sketchpad<S>,
    events: impl IntoIterator<Item = InputEvent>,
) -> Result<ScriptReport> {
    let mut report = ScriptReport::default();
    for (index, event) in events.into_iter().enumerate() {
        tracing::trace!(index, ?event, "replay event");
        if let Some(path) = pad
            .dispatch(event)
            .with_context(|| format!("script event #{index}"))?
        {
            report.exports.push(path);
        }
        report.events += 1;
    }
    tracing::info!(
        events = report.events,
        exports = report.exports.len(),
        drawables = pad.history().undo_len(),
        "input script finished"
    );
    Ok(report)
}
