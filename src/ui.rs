use crate::about;
use crate::state::State;
use crate::verdict::{Verdict, VerdictKind};
use crate::{ScanTool, INITIAL_WIDTH, PROGRAM_TITLE};
use eframe::egui::{
    self, pos2, vec2, Align2, Color32, ColorImage, Context, FontId, Painter, Rect, Stroke,
    TextureOptions, Ui,
};

const DISABLED_COLOR: Color32 = Color32::from_rgb(255, 0, 0);
const PLACEHOLDER_COLOR: Color32 = Color32::DARK_GRAY;

const PREVIEW_TEXT: &str = "Камера отключена в Preview";
const WAITING_TEXT: &str = "Ожидание кадров...";
const CAPTION_TEXT: &str = "Наведите камеру на QR-код";

// Scan target geometry, in points
const TARGET_SIZE: f32 = 260.0;
const TARGET_STROKE: f32 = 3.0;
const TARGET_ROUNDING: f32 = 8.0;
const OVERLAY_PADDING: f32 = 32.0;
const CAPTION_BOTTOM_PADDING: f32 = 64.0;
const BANNER_PADDING: f32 = 16.0;

pub(crate) fn verdict_color(kind: VerdictKind) -> Color32 {
    let [r, g, b] = kind.rgb();
    Color32::from_rgb(r, g, b)
}

/// Largest rect with the frame's aspect ratio that fits centered in `area`.
pub(crate) fn fit_rect(area: Rect, width: usize, height: usize) -> Rect {
    if width == 0 || height == 0 {
        return area;
    }
    let (w, h) = (width as f32, height as f32);
    let scale = (area.width() / w).min(area.height() / h);
    Rect::from_center_size(area.center(), vec2(w * scale, h * scale))
}

// --- UI Drawing Functions ---

pub(crate) fn draw_about_screen(app: &mut ScanTool, ui: &mut Ui) {
    ui.set_width(INITIAL_WIDTH);
    ui.vertical_centered(|ui| {
        ui.heading(format!("About {}", PROGRAM_TITLE));
        ui.separator();
        for line in about::about() {
            ui.label(line);
        }
        ui.separator();
        if ui.button("OK").clicked() {
            app.state = State::Running;
        }
    });
}

/// Feed (or placeholder), target overlay, then the verdict banner on top.
pub(crate) fn draw_scan_screen(app: &mut ScanTool, ui: &mut Ui, ctx: &Context) {
    upload_frame(app, ctx);
    draw_control_buttons(app, ui, ctx);

    let area = ui.available_rect_before_wrap();
    let painter = ui.painter_at(area);

    draw_feed(app, &painter, area);
    draw_target_overlay(ui, &painter, area);
    if let Some(verdict) = app.session.scan.verdict() {
        draw_banner(&painter, area, verdict);
    }

    ui.allocate_rect(area, egui::Sense::hover());
}

// Moves a freshly received frame into the GPU texture
fn upload_frame(app: &mut ScanTool, ctx: &Context) {
    if !app.session.frame_dirty {
        return;
    }
    app.session.frame_dirty = false;

    let Some(frame) = &app.session.latest_frame else {
        return;
    };
    let image = ColorImage::from_rgba_unmultiplied([frame.width, frame.height], &frame.rgba);
    match &mut app.frame_texture {
        Some(texture) => texture.set(image, TextureOptions::LINEAR),
        None => {
            app.frame_texture = Some(ctx.load_texture("camera_frame", image, TextureOptions::LINEAR))
        }
    }
}

fn draw_feed(app: &ScanTool, painter: &Painter, area: Rect) {
    let texture = if app.preview {
        None
    } else {
        app.frame_texture.as_ref()
    };

    match texture {
        Some(texture) => {
            painter.rect_filled(area, 0.0, Color32::BLACK);
            let [w, h] = texture.size();
            let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
            painter.image(texture.id(), fit_rect(area, w, h), uv, Color32::WHITE);
        }
        None => {
            painter.rect_filled(area, 0.0, PLACEHOLDER_COLOR);
            let text = if app.preview { PREVIEW_TEXT } else { WAITING_TEXT };
            painter.text(
                area.center(),
                Align2::CENTER_CENTER,
                text,
                FontId::proportional(16.0),
                Color32::WHITE,
            );
        }
    }
}

fn draw_target_overlay(ui: &Ui, painter: &Painter, area: Rect) {
    let inner = area.shrink(OVERLAY_PADDING);
    let target = Rect::from_center_size(inner.center(), vec2(TARGET_SIZE, TARGET_SIZE));
    painter.rect_stroke(
        target,
        TARGET_ROUNDING,
        Stroke::new(TARGET_STROKE, ui.visuals().selection.bg_fill),
    );

    painter.text(
        pos2(inner.center().x, inner.bottom() - CAPTION_BOTTOM_PADDING),
        Align2::CENTER_BOTTOM,
        CAPTION_TEXT,
        FontId::proportional(16.0),
        ui.visuals().strong_text_color(),
    );
}

fn draw_banner(painter: &Painter, area: Rect, verdict: &Verdict) {
    let galley = painter.layout(
        verdict.label.clone(),
        FontId::proportional(16.0),
        Color32::WHITE,
        area.width() - 2.0 * BANNER_PADDING,
    );
    let height = galley.size().y + 2.0 * BANNER_PADDING;
    let banner = Rect::from_min_max(pos2(area.left(), area.bottom() - height), area.right_bottom());

    painter.rect_filled(banner, 0.0, verdict_color(verdict.kind));
    painter.galley(
        banner.min + vec2(BANNER_PADDING, BANNER_PADDING),
        galley,
        Color32::WHITE,
    );
}

/// Start/Stop, source name, About and Exit along the top edge.
fn draw_control_buttons(app: &mut ScanTool, ui: &mut Ui, ctx: &Context) {
    let thread_running = app.get_thread_status();

    ui.horizontal(|ui| {
        ui.add_space(8.0);
        let (start_stop_text, start_stop_color) = if thread_running {
            ("Stop", DISABLED_COLOR)
        } else {
            ("Start", Color32::GREEN)
        };
        let button = egui::Button::new(
            egui::RichText::new(start_stop_text)
                .color(Color32::BLACK)
                .background_color(start_stop_color),
        );
        if ui.add_enabled(!app.preview, button).clicked() {
            app.handle_start_stop_toggle();
        }

        let status = if app.preview {
            "PREVIEW".to_string()
        } else if thread_running {
            format!("{} source running", app.config.data.source)
        } else {
            format!("{} source stopped", app.config.data.source)
        };
        ui.label(status);

        if ui.button("About").clicked() {
            app.state = State::About;
        }

        if ui.button("Exit").clicked() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_colors() {
        assert_eq!(verdict_color(VerdictKind::Safe), Color32::from_rgb(0x4C, 0xAF, 0x50));
        assert_eq!(verdict_color(VerdictKind::Danger), Color32::from_rgb(255, 0, 0));
        assert_eq!(verdict_color(VerdictKind::Neutral), Color32::from_rgb(0x88, 0x88, 0x88));
    }

    #[test]
    fn fit_rect_keeps_aspect_ratio() {
        let area = Rect::from_min_size(pos2(0.0, 0.0), vec2(400.0, 400.0));
        let fitted = fit_rect(area, 200, 100);
        assert_eq!(fitted.width(), 400.0);
        assert_eq!(fitted.height(), 200.0);
        assert_eq!(fitted.center(), area.center());

        assert_eq!(fit_rect(area, 0, 10), area);
    }
}
