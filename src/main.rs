//! Headless sketchpad driver.
//!
//! Replays a recorded input script onto the canvas and optionally exports
//! the resulting picture.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use sticker_sketchpad::logging;
use sticker_sketchpad::sketch::script::{load_script, run_script};
use sticker_sketchpad::sketch::settings_store;
use sticker_sketchpad::sketch::Sketchpad;

#[derive(Parser)]
#[command(name = "sticker_sketchpad")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Marker and sticker sketchpad", long_about = None)]
struct Cli {
    /// Settings file (defaults to sketch_settings.json next to the executable)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// JSON array of input events to replay
    #[arg(long)]
    script: Option<PathBuf>,

    /// Export the final picture to this PNG file
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => settings_store::load_from_path(path)?,
        None => settings_store::load()?,
    };
    logging::init(cli.debug || settings.debug_logging, cli.log_file.clone());

    let mut pad = Sketchpad::from_settings(settings).context("start sketchpad")?;

    if let Some(path) = &cli.script {
        let events = load_script(path)?;
        let report = run_script(&mut pad, events)?;
        for exported in &report.exports {
            println!("{}", exported.display());
        }
    }

    if let Some(out) = &cli.out {
        let written = pad.export(Some(out))?;
        println!("{}", written.display());
    }

    Ok(())
}
