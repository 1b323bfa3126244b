use crate::session::orchestrator::Notice;
use eframe::egui::{self, Color32, CornerRadius, FontId, Frame, Margin, Stroke, TextStyle};

#[derive(Debug, Clone)]
pub struct Theme {
    pub surface_0: Color32,
    pub surface_1: Color32,
    pub surface_2: Color32,
    pub surface_3: Color32,
    pub accent_primary: Color32,
    pub accent_muted: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub danger: Color32,
    pub text_primary: Color32,
    pub text_muted: Color32,
    pub user_bubble: Color32,
    pub assistant_bubble: Color32,
    pub spacing_8: f32,
    pub spacing_12: f32,
    pub radius_8: u8,
    pub radius_12: u8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            surface_0: Color32::from_rgb(0x0F, 0x11, 0x15),
            surface_1: Color32::from_rgb(0x16, 0x1A, 0x20),
            surface_2: Color32::from_rgb(0x1C, 0x22, 0x2B),
            surface_3: Color32::from_rgb(0x22, 0x2A, 0x35),
            accent_primary: Color32::from_rgb(0xE1, 0x4D, 0x2A),
            accent_muted: Color32::from_rgb(0xB8, 0x3E, 0x22),
            success: Color32::from_rgb(0x22, 0xC5, 0x5E),
            warning: Color32::from_rgb(0xF5, 0x9E, 0x0B),
            danger: Color32::from_rgb(0xEF, 0x44, 0x44),
            text_primary: Color32::from_rgb(0xE6, 0xED, 0xF3),
            text_muted: Color32::from_rgb(0x8B, 0x94, 0x9E),
            user_bubble: Color32::from_rgb(0x2A, 0x23, 0x1F),
            assistant_bubble: Color32::from_rgb(0x1C, 0x22, 0x2B),
            spacing_8: 8.0,
            spacing_12: 12.0,
            radius_8: 8,
            radius_12: 12,
        }
    }
}

impl Theme {
    pub fn apply_visuals(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = self.surface_1;
        visuals.extreme_bg_color = self.surface_0;
        visuals.override_text_color = Some(self.text_primary);
        visuals.widgets.noninteractive.bg_fill = self.surface_2;
        visuals.widgets.noninteractive.bg_stroke = Stroke::NONE;
        visuals.widgets.inactive.bg_fill = self.surface_2;
        visuals.widgets.inactive.weak_bg_fill = self.surface_2;
        visuals.widgets.hovered.bg_fill = self.surface_3;
        visuals.widgets.hovered.weak_bg_fill = self.surface_3;
        visuals.widgets.active.bg_fill = self.accent_muted;
        visuals.selection.bg_fill = self.accent_muted;
        visuals.hyperlink_color = self.accent_primary;

        let mut style = (*ctx.style()).clone();
        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(10.0, 8.0);
        style.spacing.button_padding = egui::vec2(12.0, 6.0);
        style
            .text_styles
            .insert(TextStyle::Heading, FontId::proportional(18.0));
        style.text_styles.insert(TextStyle::Body, FontId::proportional(14.0));
        style
            .text_styles
            .insert(TextStyle::Monospace, FontId::monospace(13.0));
        ctx.set_style(style);
    }

    pub fn card_frame(&self) -> Frame {
        Frame::new()
            .fill(self.surface_2)
            .inner_margin(Margin::same(self.spacing_12 as i8))
            .corner_radius(CornerRadius::same(self.radius_12))
    }

    pub fn bubble_frame(&self, from_user: bool) -> Frame {
        let fill = if from_user {
            self.user_bubble
        } else {
            self.assistant_bubble
        };
        Frame::new()
            .fill(fill)
            .inner_margin(Margin::same(self.spacing_8 as i8))
            .corner_radius(CornerRadius::same(self.radius_8))
    }

    pub fn notice_color(&self, notice: &Notice) -> Color32 {
        match notice {
            Notice::Success(_) => self.success,
            Notice::Warning(_) => self.warning,
            Notice::Error(_) => self.danger,
        }
    }

    pub fn notice_frame(&self, notice: &Notice) -> Frame {
        Frame::new()
            .fill(self.surface_0)
            .stroke(Stroke::new(1.0, self.notice_color(notice)))
            .inner_margin(Margin::symmetric(self.spacing_12 as i8, 8))
            .corner_radius(CornerRadius::same(self.radius_8))
    }
}
