use eframe::egui::{self, Color32, FontId, Stroke, Style, TextStyle, Theme, style::Selection};

const ACCENT_LIGHT: (u8, u8, u8) = (159, 185, 194);
const ACCENT_DARK: (u8, u8, u8) = (133, 152, 158);

pub fn apply_theme(ctx: &egui::Context, font_size: f32) {
    for theme in [Theme::Dark, Theme::Light] {
        ctx.style_mut_of(theme, |style| {
            accent_colors(style);
            text_sizes(style, font_size);
        });
    }
}

fn accent_colors(style: &mut Style) {
    let (r, g, b) = if style.visuals.dark_mode {
        ACCENT_DARK
    } else {
        ACCENT_LIGHT
    };
    let accent = Color32::from_rgb(r, g, b);

    style.visuals.selection = Selection {
        bg_fill: accent,
        stroke: Stroke::new(2.0, Color32::BLACK),
    };
    style.visuals.widgets.hovered.weak_bg_fill = accent;
    if style.visuals.dark_mode {
        style.visuals.widgets.inactive.weak_bg_fill = style.visuals.faint_bg_color;
    }
}

fn text_sizes(style: &mut Style, font_size: f32) {
    for text_style in [TextStyle::Body, TextStyle::Button, TextStyle::Monospace] {
        if let Some(font) = style.text_styles.get_mut(&text_style) {
            *font = FontId::new(font_size, font.family.clone());
        }
    }
}
