mod app;
mod config;
mod document;
mod fonts;
mod logging;
mod preview;
mod ui;

use std::path::PathBuf;

use crate::{app::MarkdownEditor, config::Settings};
use eframe::egui::{self, Vec2, vec2};

const MIN_WINDOW_SIZE: Vec2 = vec2(400.0, 300.0);
const WINDOW_TITLE: &str = "MarkDown";

fn main() -> eframe::Result {
    let (settings, settings_error) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    logging::init(settings.log_level());
    log::info!("Starting {} {}", WINDOW_TITLE, env!("CARGO_PKG_VERSION"));
    if let Some(e) = settings_error {
        log::warn!("Using default settings: {e:#}");
    }

    let font_override = std::env::var_os(fonts::FONT_OVERRIDE_ENV).map(PathBuf::from);
    let font = fonts::select_font(font_override, &settings.font, &fonts::font_directories());
    match &font {
        Some(path) => log::info!("Using font {}", path.display()),
        None => log::info!("No CJK font found, using default fonts"),
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(settings.window_size())
            .with_min_inner_size(MIN_WINDOW_SIZE),
        centered: true,

        ..Default::default()
    };
    let font_size = settings.font_size();

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |cc| {
            if let Some(path) = &font {
                if let Err(e) = fonts::install_font(&cc.egui_ctx, path) {
                    log::warn!("{e:#}");
                }
            }
            ui::apply_theme(&cc.egui_ctx, font_size);
            Ok(Box::new(MarkdownEditor::new()))
        }),
    )
}
