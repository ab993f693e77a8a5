//! Picks a system font able to draw CJK text and hands it to egui.
//!
//! egui's bundled fonts have no CJK glyphs, so without this the editor and
//! preview show boxes for Chinese, Japanese and Korean text. Everything here
//! is best effort: when no font is found the defaults stay in place.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use ab_glyph::FontRef;
use anyhow::{Context, Result};
use eframe::egui::{self, FontData, FontDefinitions, FontFamily};

use crate::config::FontSettings;

pub const FONT_OVERRIDE_ENV: &str = "MARKDOWN_EDITOR_FONT";
const FONT_NAME: &str = "cjk";
const FONT_EXTENSIONS: &[&str] = &["ttf", "ttc", "otf", "otc"];

/// File names checked in order against every installed font path.
pub const CJK_FONT_NAMES: &[&str] = &[
    // Microsoft YaHei
    "msyh.ttc",
    "msyh.ttf",
    "simhei.ttf",
    "simsun.ttc",
    "PingFang.ttc",
    "Hiragino Sans GB.ttc",
    "STHeiti Medium.ttc",
    "NotoSansCJK-Regular.ttc",
    "NotoSansCJKsc-Regular.otf",
    "NotoSansSC-Regular",
    "SourceHanSansSC-Regular.otf",
    "wqy-microhei.ttc",
    "wqy-zenhei.ttc",
];

pub fn font_directories() -> Vec<PathBuf> {
    let mut directories = Vec::new();

    #[cfg(target_os = "windows")]
    {
        let windir = std::env::var_os("WINDIR").unwrap_or_else(|| "C:\\Windows".into());
        directories.push(PathBuf::from(windir).join("Fonts"));
    }

    #[cfg(target_os = "macos")]
    {
        directories.push(PathBuf::from("/System/Library/Fonts"));
        directories.push(PathBuf::from("/Library/Fonts"));
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        directories.push(PathBuf::from("/usr/share/fonts"));
        directories.push(PathBuf::from("/usr/local/share/fonts"));
        if let Some(home) = dirs::home_dir() {
            directories.push(home.join(".fonts"));
        }
    }

    if let Some(user_fonts) = dirs::font_dir() {
        if !directories.contains(&user_fonts) {
            directories.push(user_fonts);
        }
    }

    directories
}

pub fn list_font_files(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut fonts = Vec::new();
    for dir in dirs {
        collect_font_files(dir, &mut fonts);
    }
    fonts
}

fn collect_font_files(dir: &Path, fonts: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let mut entries: Vec<(PathBuf, fs::FileType)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| Some((e.path(), e.file_type().ok()?)))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    // Symlinked directories are not followed; a link back to an ancestor would loop.
    for (path, file_type) in entries {
        if file_type.is_dir() {
            collect_font_files(&path, fonts);
        } else if is_font_file(&path) && (file_type.is_file() || path.is_file()) {
            fonts.push(path);
        }
    }
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FONT_EXTENSIONS.iter().any(|f| ext.eq_ignore_ascii_case(f)))
}

/// First path whose file name contains one of `names`.
pub fn find_cjk_font<S: AsRef<str>>(paths: &[PathBuf], names: &[S]) -> Option<PathBuf> {
    paths
        .iter()
        .find(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|file_name| names.iter().any(|name| file_name.contains(name.as_ref())))
        })
        .cloned()
}

/// Chooses the UI font: explicit override, then settings, then a scan of `dirs`.
pub fn select_font(
    override_path: Option<PathBuf>,
    settings: &FontSettings,
    dirs: &[PathBuf],
) -> Option<PathBuf> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Some(path);
        }
        log::warn!("{FONT_OVERRIDE_ENV} points to missing font {}", path.display());
    }

    if let Some(path) = settings.path.as_deref() {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        log::warn!("Configured font {} does not exist", path.display());
    }

    let fonts = list_font_files(dirs);
    log::debug!("Scanned {} font files", fonts.len());

    match &settings.names {
        Some(names) => find_cjk_font(&fonts, names.as_slice()),
        None => find_cjk_font(&fonts, CJK_FONT_NAMES),
    }
}

/// Makes the font at `path` the primary proportional font and a monospace fallback.
///
/// The bytes are parsed up front: egui only loads fonts on the next frame and
/// panics on data it can't read.
pub fn install_font(ctx: &egui::Context, path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read font {}", path.display()))?;
    FontRef::try_from_slice(&bytes)
        .with_context(|| format!("Unsupported font file {}", path.display()))?;

    let mut definitions = FontDefinitions::default();
    definitions
        .font_data
        .insert(FONT_NAME.to_owned(), Arc::new(FontData::from_owned(bytes)));

    if let Some(family) = definitions.families.get_mut(&FontFamily::Proportional) {
        family.insert(0, FONT_NAME.to_owned());
    }
    if let Some(family) = definitions.families.get_mut(&FontFamily::Monospace) {
        family.push(FONT_NAME.to_owned());
    }

    ctx.set_fonts(definitions);
    Ok(())
}
