#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
use log4rs::config::Deserializers;
use screen_translator::ScreenTranslatorApp;
use std::{fs, path::Path};

#[tokio::main]
async fn main() -> eframe::Result {
    init_logger();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Screen Translator")
            .with_inner_size([360.0, 120.0])
            .with_min_inner_size([300.0, 100.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Screen Translator",
        native_options,
        Box::new(|cc| Ok(Box::new(ScreenTranslatorApp::new(cc)))),
    )
}

const LOG_CONFIG_DIR: &str = "config";
const LOG_CONFIG: &str = "config/log4rs.yaml";

fn init_logger() {
    let result = fs::create_dir_all(LOG_CONFIG_DIR)
        .and_then(|()| {
            if Path::new(LOG_CONFIG).exists() {
                Ok(())
            } else {
                fs::write(LOG_CONFIG, include_str!("../config/log4rs.yaml"))
            }
        })
        .map_err(anyhow::Error::from)
        .and_then(|()| log4rs::init_file(LOG_CONFIG, Deserializers::default()));

    if let Err(e) = result {
        eprintln!("Logger init failed: {e:#}");
    }
}
