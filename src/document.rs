use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "MD"];

pub fn is_markdown_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// The text being edited and the file it belongs to, if any.
///
/// Saving in place is only possible once a file is associated, either by
/// opening one or by a successful save-as.
#[derive(Debug, Default)]
pub struct Document {
    text: String,
    current_file: Option<PathBuf>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    pub fn can_save(&self) -> bool {
        self.current_file.is_some()
    }

    pub fn file_name(&self) -> Option<String> {
        self.current_file
            .as_ref()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Replaces the text with the file's contents. Nothing changes on error.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        self.text = content;
        self.current_file = Some(path.to_path_buf());
        Ok(())
    }

    /// Writes the text back to the associated file.
    ///
    /// Returns `Ok(false)` without touching the disk when no file is associated.
    pub fn save(&self) -> Result<bool> {
        let Some(path) = self.current_file.as_ref() else {
            return Ok(false);
        };

        fs::write(path, &self.text)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        Ok(true)
    }

    pub fn save_as(&mut self, path: PathBuf) -> Result<()> {
        fs::write(&path, &self.text)
            .with_context(|| format!("Failed to save {}", path.display()))?;

        self.current_file = Some(path);
        Ok(())
    }
}
