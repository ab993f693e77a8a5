use std::path::PathBuf;

use anyhow::Error;
use eframe::egui::{self, Align, Button, Key, KeyboardShortcut, Layout, Margin, Modifiers};

use crate::{
    WINDOW_TITLE,
    document::{Document, MARKDOWN_EXTENSIONS, is_markdown_path},
    preview::MarkdownPreview,
};

const TEXT_EDIT_MARGIN: i8 = 10;
const MIN_PANEL_WIDTH: f32 = 120.0;
const DEFAULT_FILE_NAME: &str = "untitled.md";
const ERROR_DIALOG_WIDTH: f32 = 320.0;

const OPEN_SHORTCUT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::O);
const SAVE_SHORTCUT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::S);
const SAVE_AS_SHORTCUT: KeyboardShortcut = KeyboardShortcut::new(
    Modifiers {
        shift: true,
        ..Modifiers::COMMAND
    },
    Key::S,
);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FileAction {
    Open,
    Save,
    SaveAs,
}

pub fn window_title(file_name: Option<&str>) -> String {
    match file_name {
        Some(name) => format!("{WINDOW_TITLE} - {name}"),
        None => WINDOW_TITLE.to_owned(),
    }
}

pub struct MarkdownEditor {
    document: Document,
    preview: MarkdownPreview,
    error: Option<String>,
}

impl MarkdownEditor {
    pub fn new() -> Self {
        Self {
            document: Document::new(),
            preview: MarkdownPreview::new(),
            error: None,
        }
    }

    fn on_text_changed(&mut self) {
        self.preview.set_markdown(self.document.text());
    }

    fn show_error(&mut self, err: Error) {
        log::error!("{err:#}");
        self.error = Some(format!("{err:#}"));
    }

    fn update_title(&self, ctx: &egui::Context) {
        let title = window_title(self.document.file_name().as_deref());
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(title));
    }

    fn run_action(&mut self, ctx: &egui::Context, action: FileAction) {
        match action {
            FileAction::Open => self.open_file(ctx),
            FileAction::Save => self.save_file(),
            FileAction::SaveAs => self.save_file_as(ctx),
        }
    }

    fn open_file(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Open Markdown File")
            .add_filter("Markdown", MARKDOWN_EXTENSIONS)
            .pick_file()
        {
            self.open_path(ctx, path);
        }
    }

    fn open_path(&mut self, ctx: &egui::Context, path: PathBuf) {
        match self.document.open(&path) {
            Ok(()) => {
                self.on_text_changed();
                self.update_title(ctx);
                log::info!("Opened {}", path.display());
            }
            Err(e) => self.show_error(e),
        }
    }

    fn save_file(&mut self) {
        match self.document.save() {
            Ok(true) => {
                if let Some(path) = self.document.current_file() {
                    log::info!("Saved {}", path.display());
                }
            }
            Ok(false) => {}
            Err(e) => self.show_error(e),
        }
    }

    fn save_file_as(&mut self, ctx: &egui::Context) {
        let file_name = self
            .document
            .file_name()
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_owned());

        let mut dialog = rfd::FileDialog::new()
            .set_title("Save Markdown File As...")
            .add_filter("Markdown", MARKDOWN_EXTENSIONS)
            .set_file_name(file_name);

        if let Some(parent) = self.document.current_file().and_then(|p| p.parent()) {
            dialog = dialog.set_directory(parent);
        }

        if let Some(path) = dialog.save_file() {
            self.save_to_path(ctx, path);
        }
    }

    fn save_to_path(&mut self, ctx: &egui::Context, path: PathBuf) {
        let shown = path.display().to_string();
        match self.document.save_as(path) {
            Ok(()) => {
                self.update_title(ctx);
                log::info!("Saved as {shown}");
            }
            Err(e) => self.show_error(e),
        }
    }

    fn handle_key_input(&mut self, ctx: &egui::Context) -> Option<FileAction> {
        if self.error.is_some() {
            return None;
        }

        let can_save = self.document.can_save();
        ctx.input_mut(|i| {
            // Checked before Save: Save would also match with Shift held.
            if i.consume_shortcut(&SAVE_AS_SHORTCUT) {
                Some(FileAction::SaveAs)
            } else if i.consume_shortcut(&SAVE_SHORTCUT) {
                can_save.then_some(FileAction::Save)
            } else if i.consume_shortcut(&OPEN_SHORTCUT) {
                Some(FileAction::Open)
            } else {
                None
            }
        })
    }

    fn dropped_markdown_file(ctx: &egui::Context) -> Option<PathBuf> {
        ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .find(|path| is_markdown_path(path))
        })
    }

    fn show_error_modal(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error.as_deref() else {
            return;
        };

        let mut dismissed = false;
        let modal = egui::Modal::new(egui::Id::new("error_dialog")).show(ctx, |ui| {
            ui.set_width(ERROR_DIALOG_WIDTH);
            ui.heading("Error");
            ui.add_space(8.0);
            ui.label(message);
            ui.add_space(12.0);
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        });

        if dismissed || modal.should_close() {
            self.error = None;
        }
    }

    fn menu_bar(&self, ctx: &egui::Context, action: &mut Option<FileAction>) {
        let can_save = self.document.can_save();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    let open = Button::new("Open...").shortcut_text(ctx.format_shortcut(&OPEN_SHORTCUT));
                    if ui.add(open).clicked() {
                        *action = Some(FileAction::Open);
                        ui.close_menu();
                    }

                    let save = Button::new("Save").shortcut_text(ctx.format_shortcut(&SAVE_SHORTCUT));
                    if ui.add_enabled(can_save, save).clicked() {
                        *action = Some(FileAction::Save);
                        ui.close_menu();
                    }

                    let save_as =
                        Button::new("Save As...").shortcut_text(ctx.format_shortcut(&SAVE_AS_SHORTCUT));
                    if ui.add(save_as).clicked() {
                        *action = Some(FileAction::SaveAs);
                        ui.close_menu();
                    }
                });
            });
        });
    }

    pub fn ui(&mut self, ctx: &egui::Context) {
        let mut action = self.handle_key_input(ctx);

        if action.is_none() && self.error.is_none() {
            if let Some(path) = Self::dropped_markdown_file(ctx) {
                self.open_path(ctx, path);
            }
        }

        self.menu_bar(ctx, &mut action);

        let mut changed = false;
        egui::SidePanel::left("editor")
            .resizable(true)
            .min_width(MIN_PANEL_WIDTH)
            .default_width(ctx.screen_rect().width() / 2.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("editor")
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        let input = ui.add(
                            egui::TextEdit::multiline(self.document.text_mut())
                                .desired_width(f32::INFINITY)
                                .min_size(ui.available_size())
                                .margin(Margin::same(TEXT_EDIT_MARGIN))
                                .frame(false),
                        );
                        changed = input.changed();
                    });
            });

        if changed {
            self.on_text_changed();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.preview.show(ui);
        });

        self.show_error_modal(ctx);

        if let Some(action) = action {
            self.run_action(ctx, action);
        }
    }
}

impl eframe::App for MarkdownEditor {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("Exiting");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::tempdir;

    fn key_press(key: Key, modifiers: Modifiers) -> egui::RawInput {
        egui::RawInput {
            modifiers,
            events: vec![egui::Event::Key {
                key,
                physical_key: None,
                pressed: true,
                repeat: false,
                modifiers,
            }],
            ..Default::default()
        }
    }

    fn action_for(editor: &mut MarkdownEditor, input: egui::RawInput) -> Option<FileAction> {
        let ctx = egui::Context::default();
        let mut action = None;
        let _ = ctx.run(input, |ctx| {
            if let Some(found) = editor.handle_key_input(ctx) {
                action = Some(found);
            }
        });
        action
    }

    #[test]
    fn title_includes_file_name() {
        assert_eq!(window_title(None), "MarkDown");
        assert_eq!(window_title(Some("notes.md")), "MarkDown - notes.md");
    }

    #[test]
    fn save_disabled_until_file_associated() {
        let dir = tempdir().unwrap();
        let ctx = egui::Context::default();
        let mut editor = MarkdownEditor::new();
        assert!(!editor.document.can_save());

        editor.document.text_mut().push_str("hello");
        editor.save_file();
        assert!(editor.error.is_none());
        assert!(!editor.document.can_save());

        editor.save_to_path(&ctx, dir.path().join("hello.md"));
        assert!(editor.document.can_save());
    }

    #[test]
    fn open_populates_editor_and_preview() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readme.md");
        fs::write(&path, "# Hello\n\nworld\n").unwrap();

        let ctx = egui::Context::default();
        let mut editor = MarkdownEditor::new();
        editor.open_path(&ctx, path.clone());

        assert_eq!(editor.document.text(), "# Hello\n\nworld\n");
        assert_eq!(editor.document.current_file(), Some(path.as_path()));
        assert!(editor.document.can_save());
        assert_eq!(editor.preview.blocks().len(), 2);
        assert!(editor.error.is_none());
    }

    #[test]
    fn failed_open_reports_error_and_keeps_state() {
        let dir = tempdir().unwrap();
        let ctx = egui::Context::default();
        let mut editor = MarkdownEditor::new();
        editor.document.text_mut().push_str("keep me");

        editor.open_path(&ctx, dir.path().join("missing.md"));

        let message = editor.error.as_deref().expect("error should be shown");
        assert!(message.contains("missing.md"));
        assert_eq!(editor.document.text(), "keep me");
        assert!(!editor.document.can_save());
    }

    #[test]
    fn text_change_rerenders_preview() {
        let mut editor = MarkdownEditor::new();
        assert!(editor.preview.blocks().is_empty());

        editor.document.text_mut().push_str("# Heading");
        editor.on_text_changed();
        assert_eq!(editor.preview.blocks().len(), 1);

        editor.document.text_mut().push_str("\n\nparagraph");
        editor.on_text_changed();
        assert_eq!(editor.preview.blocks().len(), 2);
    }

    #[test]
    fn save_as_then_save_writes_same_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.md");
        let ctx = egui::Context::default();
        let mut editor = MarkdownEditor::new();

        editor.document.text_mut().push_str("v1 中文\n");
        editor.save_to_path(&ctx, path.clone());
        assert_eq!(fs::read(&path).unwrap(), "v1 中文\n".as_bytes());

        editor.document.text_mut().push_str("v2\n");
        editor.save_file();
        assert_eq!(fs::read(&path).unwrap(), editor.document.text().as_bytes());
        assert!(editor.error.is_none());
    }

    #[test]
    fn failed_save_as_shows_error() {
        let dir = tempdir().unwrap();
        let ctx = egui::Context::default();
        let mut editor = MarkdownEditor::new();

        editor.save_to_path(&ctx, dir.path().join("missing-dir").join("doc.md"));

        assert!(editor.error.is_some());
        assert!(!editor.document.can_save());
    }

    #[test]
    fn save_shortcut_requires_file() {
        let dir = tempdir().unwrap();
        let ctx = egui::Context::default();
        let mut editor = MarkdownEditor::new();

        assert_eq!(action_for(&mut editor, key_press(Key::S, Modifiers::COMMAND)), None);

        editor.save_to_path(&ctx, dir.path().join("doc.md"));
        assert_eq!(
            action_for(&mut editor, key_press(Key::S, Modifiers::COMMAND)),
            Some(FileAction::Save)
        );
    }

    #[test]
    fn shift_selects_save_as() {
        let mut editor = MarkdownEditor::new();
        let modifiers = Modifiers {
            shift: true,
            ..Modifiers::COMMAND
        };

        assert_eq!(
            action_for(&mut editor, key_press(Key::S, modifiers)),
            Some(FileAction::SaveAs)
        );
        assert_eq!(
            action_for(&mut editor, key_press(Key::O, Modifiers::COMMAND)),
            Some(FileAction::Open)
        );
    }

    #[test]
    fn shortcuts_ignored_while_error_shown() {
        let mut editor = MarkdownEditor::new();
        editor.error = Some("boom".to_string());

        assert_eq!(action_for(&mut editor, key_press(Key::O, Modifiers::COMMAND)), None);
    }

    fn drop_files(paths: &[PathBuf]) -> egui::RawInput {
        egui::RawInput {
            dropped_files: paths
                .iter()
                .map(|path| egui::DroppedFile {
                    path: Some(path.clone()),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn dropped_markdown_file_is_opened() {
        let dir = tempdir().unwrap();
        let text_file = dir.path().join("a.txt");
        let markdown = dir.path().join("b.MD");
        fs::write(&text_file, "not markdown").unwrap();
        fs::write(&markdown, "# Dropped\n\nbody\n").unwrap();

        let ctx = egui::Context::default();
        let mut editor = MarkdownEditor::new();
        let _ = ctx.run(drop_files(&[text_file, markdown.clone()]), |ctx| editor.ui(ctx));

        assert_eq!(editor.document.current_file(), Some(markdown.as_path()));
        assert_eq!(editor.document.text(), "# Dropped\n\nbody\n");
        assert!(editor.document.can_save());
        assert_eq!(editor.preview.blocks().len(), 2);
    }

    #[test]
    fn non_markdown_drop_is_ignored() {
        let dir = tempdir().unwrap();
        let text_file = dir.path().join("notes.txt");
        fs::write(&text_file, "plain").unwrap();

        let ctx = egui::Context::default();
        let mut editor = MarkdownEditor::new();
        let _ = ctx.run(drop_files(&[text_file]), |ctx| editor.ui(ctx));

        assert!(editor.document.current_file().is_none());
        assert_eq!(editor.document.text(), "");
        assert!(!editor.document.can_save());
    }

    #[test]
    fn drop_ignored_while_error_shown() {
        let dir = tempdir().unwrap();
        let markdown = dir.path().join("later.md");
        fs::write(&markdown, "# Later").unwrap();

        let ctx = egui::Context::default();
        let mut editor = MarkdownEditor::new();
        editor.error = Some("Failed to open x.md".to_string());
        let _ = ctx.run(drop_files(&[markdown]), |ctx| editor.ui(ctx));

        assert!(editor.document.current_file().is_none());
        assert!(editor.preview.blocks().is_empty());
        assert!(editor.error.is_some());
    }

    #[test]
    fn headless_frame_renders() {
        let ctx = egui::Context::default();
        let mut editor = MarkdownEditor::new();
        editor.document.text_mut().push_str("# Title\n\n- [x] done\n\n```\ncode\n```\n");
        editor.on_text_changed();
        editor.error = Some("Failed to open x.md".to_string());

        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| editor.ui(ctx));
        }

        assert!(editor.error.is_some());
    }
}
