use std::sync::Arc;

use eframe::epaint::textures::TextureOptions;
use eframe::epaint::{ColorImage, StrokeKind};
use egui::{
    Align2, Color32, Context, FontId, Id, Key, PointerButton, Pos2, Rect, Sense, TextureHandle,
    Vec2, ViewportBuilder, ViewportId,
};
use log::info;

use crate::capture::selector::{AreaSelector, SelectionMode};
use crate::capture::{CaptureArea, ScreenCapture};
use crate::language::{LanguageCode, LanguageCodes, language_name};
use crate::ui::settings::AppSettings;

const HELP_SIZE: (f32, f32) = (360.0, 70.0);

/// Full screen overlay over a frozen screenshot.
#[derive(Default)]
pub struct CaptureOverlay {
    capture: Option<Arc<ScreenCapture>>,
    texture: Option<TextureHandle>,
    selector: AreaSelector,
    /// Selection waiting for the customization popup.
    pending: Option<CaptureArea>,
    help_text: String,
    recognition_languages: Vec<&'static LanguageCode>,
}

impl CaptureOverlay {
    pub fn is_active(&self) -> bool {
        self.capture.is_some()
    }

    pub fn update_settings(&mut self, settings: &AppSettings, installed_languages: &[String]) {
        self.recognition_languages = LanguageCodes.recognizable(installed_languages);

        let translation = if settings.do_translation {
            language_name(&settings.translate_language)
        } else {
            "-".to_string()
        };
        self.help_text = format!(
            "Recognize: {}\nTranslate: {}\nRight button drag to customize, Esc to cancel",
            language_name(&settings.tesseract.language),
            translation
        );
    }

    pub fn activate(&mut self, ctx: &Context, capture: Arc<ScreenCapture>) {
        let rgba = capture.image.to_rgba8();
        self.texture = Some(ctx.load_texture(
            "capture_image",
            ColorImage::from_rgba_unmultiplied(
                [rgba.width() as usize, rgba.height() as usize],
                rgba.as_raw(),
            ),
            TextureOptions::default(),
        ));

        let scale = capture.scale_factor.max(1.0);
        let help_size = (
            (HELP_SIZE.0 * scale) as u32,
            (HELP_SIZE.1 * scale) as u32,
        );
        self.selector.set_screen_rects(&[capture.rect()], help_size);
        self.selector.activate((-1, -1));
        self.pending = None;
        self.capture = Some(capture);
    }

    pub fn deactivate(&mut self) {
        info!("Capture closed");
        self.capture = None;
        self.texture = None;
        self.pending = None;
        self.selector.cancel();
    }

    /// Returns the area to process once the user finished selecting.
    pub fn show(
        &mut self,
        ctx: &Context,
        settings: &AppSettings,
    ) -> Option<(Arc<ScreenCapture>, CaptureArea)> {
        let capture = self.capture.clone()?;
        let texture = self.texture.clone()?;

        let scale = capture.scale_factor.max(0.1);
        let size = Vec2::new(
            capture.image.width() as f32 / scale,
            capture.image.height() as f32 / scale,
        );
        let builder = ViewportBuilder::default()
            .with_title("Capture")
            .with_position([capture.origin.0 as f32, capture.origin.1 as f32])
            .with_inner_size(size)
            .with_decorations(false)
            .with_always_on_top();

        let mut selected = None;
        let mut close = false;
        ctx.show_viewport_immediate(ViewportId::from_hash_of("capture"), builder, |ctx, _| {
            if ctx.input(|i| i.viewport().close_requested()) {
                close = true;
            }

            egui::CentralPanel::default()
                .frame(egui::Frame::NONE)
                .show(ctx, |ui| {
                    let rect = ui.max_rect();
                    let to_raster = capture.image.width() as f32 / rect.width().max(1.0);
                    ui.interact(rect, Id::new("capture_area"), Sense::click_and_drag());

                    ui.painter().image(
                        texture.id(),
                        rect,
                        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                        Color32::WHITE,
                    );
                    ui.painter()
                        .rect_filled(rect, 0.0, Color32::from_black_alpha(60));

                    if self.pending.is_none() {
                        selected = self.handle_input(ctx, rect, to_raster, settings);
                    }

                    self.paint(ui, rect, to_raster);
                });

            if let Some(area) = &mut self.pending {
                match show_customization(ctx, area, &self.recognition_languages) {
                    Some(true) => selected = self.pending.take(),
                    Some(false) => self.pending = None,
                    None => {}
                }
            } else if ctx.input(|i| i.key_pressed(Key::Escape)) {
                close = true;
            }
        });

        if close || selected.is_some() {
            self.deactivate();
        }
        selected.map(|area| (capture, area))
    }

    fn handle_input(
        &mut self,
        ctx: &Context,
        rect: Rect,
        to_raster: f32,
        settings: &AppSettings,
    ) -> Option<CaptureArea> {
        let pos = ctx.input(|i| i.pointer.latest_pos())?;
        let raster = (
            ((pos.x - rect.min.x) * to_raster) as i32,
            ((pos.y - rect.min.y) * to_raster) as i32,
        );

        let (primary, secondary, released) = ctx.input(|i| {
            (
                i.pointer.button_pressed(PointerButton::Primary),
                i.pointer.button_pressed(PointerButton::Secondary),
                i.pointer.any_released(),
            )
        });

        if primary {
            self.selector.press(raster, SelectionMode::Default);
        } else if secondary {
            self.selector.press(raster, SelectionMode::Customize);
        } else if released && self.selector.is_selecting() {
            let (selection, mode) = self.selector.release(raster)?;

            let area = settings.default_area(selection);
            return match mode {
                SelectionMode::Default => Some(area),
                SelectionMode::Customize => {
                    self.pending = Some(area);
                    None
                }
            };
        } else if self.selector.move_to(raster) {
            ctx.request_repaint();
        }
        None
    }

    fn paint(&self, ui: &egui::Ui, rect: Rect, to_raster: f32) {
        let to_screen = |r: &imageproc::rect::Rect| {
            Rect::from_min_size(
                Pos2::new(
                    rect.min.x + r.left() as f32 / to_raster,
                    rect.min.y + r.top() as f32 / to_raster,
                ),
                Vec2::new(r.width() as f32 / to_raster, r.height() as f32 / to_raster),
            )
        };

        let selection = self
            .pending
            .as_ref()
            .map(|x| x.rect)
            .or_else(|| self.selector.selection());
        if let Some(selection) = selection {
            ui.painter().rect(
                to_screen(&selection),
                0.0,
                Color32::TRANSPARENT,
                (2.0, Color32::RED),
                StrokeKind::Middle,
            );
        }

        for help in self.selector.help_rects() {
            let help_rect = to_screen(&help.current);
            ui.painter()
                .rect_filled(help_rect, 4.0, Color32::from_black_alpha(180));
            ui.painter().text(
                help_rect.center(),
                Align2::CENTER_CENTER,
                &self.help_text,
                FontId::proportional(13.0),
                Color32::WHITE,
            );
        }
    }
}

/// `Some(true)` to process, `Some(false)` to drop the selection.
fn show_customization(
    ctx: &Context,
    area: &mut CaptureArea,
    recognition_languages: &[&'static LanguageCode],
) -> Option<bool> {
    let mut result = None;
    egui::Window::new("Capture settings")
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
        .show(ctx, |ui| {
            egui::Grid::new("capture_settings_grid").show(ui, |ui| {
                ui.label("Recognize:");
                egui::ComboBox::from_id_salt(Id::new("capture_ocr_language"))
                    .selected_text(language_name(&area.ocr_language))
                    .show_ui(ui, |ui| {
                        for lang in recognition_languages {
                            ui.selectable_value(&mut area.ocr_language, lang.id.to_string(), lang.name);
                        }
                    });
                ui.end_row();

                ui.checkbox(&mut area.do_translation, "Translate:");
                ui.add_enabled_ui(area.do_translation, |ui| {
                    egui::ComboBox::from_id_salt(Id::new("capture_translate_language"))
                        .selected_text(language_name(&area.translate_language))
                        .show_ui(ui, |ui| {
                            for lang in LanguageCodes.all() {
                                ui.selectable_value(
                                    &mut area.translate_language,
                                    lang.id.to_string(),
                                    lang.name,
                                );
                            }
                        });
                });
                ui.end_row();
            });

            ui.horizontal(|ui| {
                if ui.button("Process").clicked() {
                    result = Some(true);
                }
                if ui.button("Cancel").clicked() {
                    result = Some(false);
                }
            });
        });

    if ctx.input(|i| i.key_pressed(Key::Escape)) {
        result = Some(false);
    }
    result
}
