// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Ovara - image annotation for object detection and pose estimation
//!
//! A desktop application for drawing class-labelled bounding boxes and
//! ordered keypoints on image folders and exporting them as YOLO labels.

mod app;
mod config;
mod editor;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::OvaraApp;
use config::AppConfig;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = AppConfig::load()?;
    log::info!("Projects are stored in {}", config.state_file.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("Ovara"),
        ..Default::default()
    };

    eframe::run_native(
        "Ovara",
        options,
        Box::new(move |_cc| Ok(Box::new(OvaraApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
