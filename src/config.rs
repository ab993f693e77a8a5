use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result, anyhow};
use eframe::egui::{Vec2, vec2};
use serde::Deserialize;
use simplelog::LevelFilter;

pub const APP_DIR: &str = "markdown-editor";
const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_WINDOW_SIZE: Vec2 = vec2(800.0, 500.0);
pub const DEFAULT_FONT_SIZE: f32 = 14.0;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window: WindowSettings,
    pub editor: EditorSettings,
    pub font: FontSettings,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub font_size: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    /// Explicit font file, tried before scanning the system.
    pub path: Option<PathBuf>,
    /// Replaces the built-in list of CJK font file names.
    pub names: Option<Vec<String>>,
}

impl Settings {
    /// Reads the settings file. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = settings_file_path()?;
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> Result<Self> {
        let json_data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };
        Self::from_json(&json_data).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn from_json(json_data: &str) -> Result<Self> {
        Ok(serde_json::from_str(json_data)?)
    }

    pub fn window_size(&self) -> Vec2 {
        vec2(
            positive_or(self.window.width, DEFAULT_WINDOW_SIZE.x),
            positive_or(self.window.height, DEFAULT_WINDOW_SIZE.y),
        )
    }

    pub fn font_size(&self) -> f32 {
        positive_or(self.editor.font_size, DEFAULT_FONT_SIZE)
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
            .as_deref()
            .and_then(|level| LevelFilter::from_str(level).ok())
            .unwrap_or(LevelFilter::Info)
    }
}

fn positive_or(value: Option<f32>, default: f32) -> f32 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(default)
}

fn settings_file_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow!("Could not find config or home directory"))?;

    path.push(APP_DIR);
    path.push(SETTINGS_FILE);
    Ok(path)
}
