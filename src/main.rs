// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! ustrack - ultrasound nerve tracking
//!
//! A desktop tool for marking a nerve and a fixpoint in ultrasound frame
//! sequences, propagating the marks with an object tracker and exporting
//! the resulting coordinates of every folder as one table.

mod analysis;
mod app;
mod capture;
mod config;
mod io;
mod models;
mod navigation;
mod session;
mod tracking;
mod ui;
mod util;

use anyhow::{bail, Context, Result};
use app::TrackerApp;
use clap::Parser;
use config::Config;
use session::Session;
use std::path::PathBuf;
use tracking::BackendRegistry;

#[derive(Parser, Debug)]
#[command(name = "ustrack", version, about = "Annotate and track nerves in ultrasound frames")]
struct Args {
    /// Configuration file (JSON or YAML)
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Root folder, overriding the configured one
    #[arg(short, long)]
    folder: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::load(&args.config)?;
    if let Some(folder) = args.folder {
        config.folder = folder;
    }
    config.folder = std::fs::canonicalize(&config.folder)
        .with_context(|| format!("Root folder {} does not exist", config.folder.display()))?;

    let folders = io::discovery::discover_folders(&config.folder)?;
    if folders.is_empty() {
        bail!("No folders found under {}", config.folder.display());
    }
    log::info!("Found {} folders under {}", folders.len(), config.folder.display());

    let registry = BackendRegistry::with_defaults(&config.tracker);
    let session = Session::open(config, folders, registry)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("ustrack - Ultrasound Nerve Tracking"),
        ..Default::default()
    };

    eframe::run_native(
        "ustrack",
        options,
        Box::new(|_cc| Ok(Box::new(TrackerApp::new(session)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
