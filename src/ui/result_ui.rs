use std::sync::Arc;

use eframe::epaint::ColorImage;
use eframe::epaint::textures::TextureOptions;
use egui::{Context, Id, RichText, Sense, TextureHandle, ViewportBuilder, ViewportId};
use image::DynamicImage;

use crate::language::{LanguageCode, LanguageCodes, LanguageId};
use crate::processing_item::ProcessingItem;
use crate::ui::event::{Event, EventHandler};

const MAX_RESULTS: usize = 8;
const RESULT_WIDTH: f32 = 420.0;
const MAX_IMAGE_HEIGHT: f32 = 200.0;

struct ResultUi {
    id: u64,
    item: ProcessingItem,
    texture: Option<TextureHandle>,
    /// Text being corrected by the user.
    edit: Option<String>,
    open: bool,
}

impl ResultUi {
    fn same_source(&self, item: &ProcessingItem) -> bool {
        match (&self.item.source, &item.source) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Floating windows showing processed items.
#[derive(Default)]
pub struct ResultWindows {
    results: Vec<ResultUi>,
    next_id: u64,
    recognition_languages: Vec<&'static LanguageCode>,
    show_image: bool,
}

impl ResultWindows {
    pub fn apply_settings(&mut self, installed_languages: &[String], show_image: bool) {
        self.recognition_languages = LanguageCodes.recognizable(installed_languages);
        self.show_image = show_image;
    }

    /// Replaces the window showing the same capture or opens a new one.
    pub fn show_result(&mut self, ctx: &Context, item: ProcessingItem) {
        if let Some(result) = self.results.iter_mut().find(|x| x.same_source(&item)) {
            result.item = item;
            result.edit = None;
            result.open = true;
            return;
        }

        let texture = create_texture(ctx, item.source.as_deref(), self.next_id);
        self.results.push(ResultUi {
            id: self.next_id,
            item,
            texture,
            edit: None,
            open: true,
        });
        self.next_id += 1;

        if self.results.len() > MAX_RESULTS {
            self.results.remove(0);
        }
    }

    pub fn last_item(&self) -> Option<&ProcessingItem> {
        self.results.last().map(|x| &x.item)
    }

    pub fn show_last(&mut self) {
        if let Some(result) = self.results.last_mut() {
            result.open = true;
        }
    }

    pub fn hide_all(&mut self) {
        self.results.iter_mut().for_each(|x| x.open = false);
    }

    pub fn show(&mut self, ctx: &Context) {
        for result in self.results.iter_mut().filter(|x| x.open) {
            let (x, y) = result.item.screen_pos;
            let viewport_id = ViewportId::from_hash_of(("result", result.id));
            let builder = ViewportBuilder::default()
                .with_title("Result")
                .with_position([x as f32, y as f32])
                .with_inner_size([RESULT_WIDTH, result_height(result, self.show_image)])
                .with_decorations(false)
                .with_always_on_top();

            ctx.show_viewport_immediate(viewport_id, builder, |ctx, _| {
                if ctx.input(|i| i.viewport().close_requested()) {
                    result.open = false;
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    show_result_content(ui, result, &self.recognition_languages, self.show_image);
                });
            });
        }
    }
}

fn result_height(result: &ResultUi, show_image: bool) -> f32 {
    let lines = result.item.recognized.lines().count() + result.item.translated.lines().count();
    let image = match (&result.texture, show_image) {
        (Some(texture), true) => {
            let [w, h] = texture.size_vec2().into();
            (h * (RESULT_WIDTH / w.max(1.0))).min(MAX_IMAGE_HEIGHT)
        }
        _ => 0.0,
    };
    image + 40.0 + 20.0 * lines.max(1) as f32
}

fn show_result_content(
    ui: &mut egui::Ui,
    result: &mut ResultUi,
    languages: &[&'static LanguageCode],
    show_image: bool,
) {
    if let Some(text) = &mut result.edit {
        ui.add(egui::TextEdit::multiline(text).desired_width(f32::INFINITY));
        let (apply, cancel) = ui
            .horizontal(|ui| (ui.button("Apply").clicked(), ui.button("Cancel").clicked()))
            .inner;
        if apply {
            let mut item = result.item.clone();
            item.recognized = text.clone();
            item.translated.clear();
            ui.ctx().emit(Event::RequestEdition(item));
        }
        if apply || cancel {
            result.edit = None;
        }
        return;
    }

    if show_image && let Some(texture) = &result.texture {
        ui.add(
            egui::Image::new(texture)
                .max_height(MAX_IMAGE_HEIGHT)
                .shrink_to_fit(),
        );
        ui.separator();
    }

    ui.label(RichText::new(&result.item.recognized).size(16.0));
    if !result.item.translated.is_empty() {
        ui.separator();
        ui.label(RichText::new(&result.item.translated).size(16.0));
    }

    let response = ui.interact(
        ui.max_rect(),
        Id::new(("result_area", result.id)),
        Sense::click(),
    );
    if response.clicked() {
        result.open = false;
    }

    response.context_menu(|ui| {
        show_context_menu(ui, result, languages);
    });
}

fn show_context_menu(ui: &mut egui::Ui, result: &mut ResultUi, languages: &[&'static LanguageCode]) {
    let ctx = ui.ctx().clone();
    let item = &result.item;

    ui.menu_button("Recognize", |ui| {
        for lang in languages {
            if ui.button(lang.name).clicked() {
                ctx.emit(Event::RequestRecognize(with_ocr_language(item, lang.id)));
                ui.close();
            }
        }
    });

    ui.menu_button("Translate", |ui| {
        for lang in LanguageCodes.all() {
            if ui.button(lang.name).clicked() {
                ctx.emit(Event::RequestTranslate(with_translate_language(
                    item, lang.id,
                )));
                ui.close();
            }
        }
    });

    if ui.button("Copy to clipboard").clicked() {
        ctx.emit(Event::RequestClipboard(item.clone()));
        ui.close();
    }
    if ui.button("Copy image to clipboard").clicked() {
        ctx.emit(Event::RequestImageClipboard(item.clone()));
        ui.close();
    }
    if ui.button("Correct").clicked() {
        result.edit = Some(result.item.recognized.clone());
        ui.close();
    }
}

pub fn with_ocr_language(item: &ProcessingItem, language: &str) -> ProcessingItem {
    ProcessingItem {
        ocr_language: LanguageId::from(language),
        recognized: String::new(),
        translated: String::new(),
        ..item.clone()
    }
}

pub fn with_translate_language(item: &ProcessingItem, language: &str) -> ProcessingItem {
    ProcessingItem {
        translate_language: LanguageId::from(language),
        translated: String::new(),
        ..item.clone()
    }
}

fn create_texture(ctx: &Context, image: Option<&DynamicImage>, id: u64) -> Option<TextureHandle> {
    image.map(|image| {
        let rgba = image.to_rgba8();
        ctx.load_texture(
            format!("result_image_{id}"),
            ColorImage::from_rgba_unmultiplied(
                [rgba.width() as usize, rgba.height() as usize],
                rgba.as_raw(),
            ),
            TextureOptions::default(),
        )
    })
}
