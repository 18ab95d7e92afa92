use crate::action::{default_tessdata_path, open_path};
use crate::capture::CaptureArea;
use crate::language::{LanguageCodes, LanguageId, language_name};
use crate::ocr::TesseractParameter;
use crate::ocr::corrector::Substitution;
use crate::ocr::tesseract::installed_languages;
use crate::translation::{TranslatorConfig, TranslatorKind};
use crate::ui::event::{Event, EventHandler};
use crate::ui::id_item::{IdItem, ItemList};
use crate::ui::shortcut::{self, Shortcut, default_shortcuts};
use crate::update::UPDATE_URL;
use chrono::{DateTime, Utc};
use eframe::epaint::Color32;
use egui::{CollapsingHeader, Id, RichText, Ui};
use egui_dnd::dnd;
use imageproc::rect::Rect;
use std::path::PathBuf;
use std::time::Duration;
use strum::{Display, EnumIter, IntoEnumIterator};

#[derive(serde::Deserialize, serde::Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub shortcuts: Vec<Shortcut>,
    pub show_captured_image: bool,
    pub copy_result_to_clipboard: bool,

    pub tesseract: TesseractParameter,

    pub do_translation: bool,
    pub translate_language: LanguageId,
    pub translation_timeout_secs: u64,
    pub translators: Vec<IdItem<TranslatorKind>>,
    pub debug_mode: bool,
    pub ignore_ssl_errors: bool,
    pub force_rotate_translators: bool,

    pub update_url: String,
    pub auto_update_interval_days: u32,
    pub last_update_check: Option<DateTime<Utc>>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            shortcuts: default_shortcuts(),
            show_captured_image: false,
            copy_result_to_clipboard: false,
            tesseract: TesseractParameter::default(),
            do_translation: true,
            translate_language: "rus".to_string(),
            translation_timeout_secs: 15,
            translators: IdItem::enabled_list(TranslatorKind::iter()),
            debug_mode: false,
            ignore_ssl_errors: false,
            force_rotate_translators: false,
            update_url: UPDATE_URL.to_string(),
            auto_update_interval_days: 0,
            last_update_check: None,
        }
    }
}

impl AppSettings {
    pub fn translator_config(&self) -> TranslatorConfig {
        TranslatorConfig {
            timeout: Duration::from_secs(self.translation_timeout_secs.max(1)),
            translators: self.translators.enabled(),
            debug_mode: self.debug_mode,
            ignore_ssl_errors: self.ignore_ssl_errors,
            force_rotate_translators: self.force_rotate_translators,
            ..Default::default()
        }
    }

    pub fn default_area(&self, rect: Rect) -> CaptureArea {
        CaptureArea {
            rect,
            ocr_language: self.tesseract.language.clone(),
            translate_language: self.translate_language.clone(),
            do_translation: self.do_translation,
        }
    }

    pub fn tessdata_path(&self) -> PathBuf {
        self.tesseract
            .tessdata_path
            .clone()
            .unwrap_or_else(default_tessdata_path)
    }

    /// Adds translators unknown to older stored settings.
    pub fn normalize(&mut self) {
        self.translators.merge_missing(TranslatorKind::iter());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter)]
pub enum SettingsPage {
    #[default]
    General,
    Recognition,
    Translation,
    Update,
}

/// Settings window editing a copy that is applied on save.
#[derive(Default)]
pub struct SettingsUi {
    draft: Option<AppSettings>,
    page: SettingsPage,
    installed_languages: Vec<String>,
    new_substitution: Substitution,
}

impl SettingsUi {
    pub fn open(&mut self, settings: &AppSettings) {
        self.installed_languages = installed_languages(settings.tesseract.tessdata_path.as_deref());
        self.draft = Some(settings.clone());
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    pub fn installed_languages(&self) -> &[String] {
        &self.installed_languages
    }

    pub fn refresh_installed_languages(&mut self, settings: &AppSettings) {
        self.installed_languages = installed_languages(settings.tesseract.tessdata_path.as_deref());
    }

    /// Returns the edited settings once saved.
    pub fn show(&mut self, ctx: &egui::Context) -> Option<AppSettings> {
        let draft = self.draft.as_mut()?;
        let page = &mut self.page;
        let installed = &mut self.installed_languages;
        let new_substitution = &mut self.new_substitution;

        let mut saved = None;
        let mut close = false;
        let mut open = true;
        egui::Window::new("Settings")
            .open(&mut open)
            .collapsible(false)
            .default_width(480.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    for x in SettingsPage::iter() {
                        ui.selectable_value(page, x, x.to_string());
                    }
                });
                ui.separator();

                egui::ScrollArea::vertical()
                    .max_height(420.0)
                    .show(ui, |ui| match page {
                        SettingsPage::General => show_general(ui, draft),
                        SettingsPage::Recognition => {
                            show_recognition(ui, draft, installed, new_substitution)
                        }
                        SettingsPage::Translation => show_translation(ui, draft),
                        SettingsPage::Update => show_update(ui, draft),
                    });

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        saved = Some(draft.clone());
                        close = true;
                    }
                    if ui.button("Cancel").clicked() {
                        close = true;
                    }
                });
            });

        if close || !open {
            self.draft = None;
        }
        saved
    }
}

fn show_general(ui: &mut Ui, settings: &mut AppSettings) {
    egui::widgets::global_theme_preference_buttons(ui);

    shortcut::show_config(ui, &mut settings.shortcuts);

    CollapsingHeader::new("Result")
        .default_open(true)
        .show(ui, |ui| {
            ui.checkbox(&mut settings.show_captured_image, "Show captured image");
            ui.checkbox(
                &mut settings.copy_result_to_clipboard,
                "Copy result to clipboard",
            );
        });
}

fn show_recognition(
    ui: &mut Ui,
    settings: &mut AppSettings,
    installed: &mut Vec<String>,
    new_substitution: &mut Substitution,
) {
    ui.horizontal(|ui| {
        ui.label("Tessdata path:");
        let mut path = settings
            .tesseract
            .tessdata_path
            .as_ref()
            .map(|x| x.display().to_string())
            .unwrap_or_default();
        if ui.text_edit_singleline(&mut path).changed() {
            settings.tesseract.tessdata_path = (!path.is_empty()).then(|| PathBuf::from(path));
            *installed = installed_languages(settings.tesseract.tessdata_path.as_deref());
        }
    });

    ui.horizontal(|ui| {
        if ui.button("Open tessdata folder").clicked()
            && let Err(e) = open_path(&settings.tessdata_path())
        {
            ui.ctx().emit(Event::Error(format!("{e:#}")));
        }
        if ui.button("Refresh").clicked() {
            *installed = installed_languages(settings.tesseract.tessdata_path.as_deref());
        }
    });

    let recognizable = LanguageCodes.recognizable(installed);
    ui.horizontal(|ui| {
        ui.label("Language:");
        egui::ComboBox::from_id_salt(Id::new("ocr_language"))
            .selected_text(language_name(&settings.tesseract.language))
            .show_ui(ui, |ui| {
                for lang in &recognizable {
                    ui.selectable_value(
                        &mut settings.tesseract.language,
                        lang.id.to_string(),
                        lang.name,
                    );
                }
            });
    });

    if recognizable.is_empty() {
        ui.label(RichText::new("No recognition languages installed").color(Color32::RED));
    } else {
        ui.label(format!(
            "Installed: {}",
            recognizable.iter().map(|x| x.name).collect::<Vec<_>>().join(", ")
        ));
    }

    CollapsingHeader::new("Corrections")
        .default_open(true)
        .show(ui, |ui| {
            show_substitutions(ui, &mut settings.tesseract.substitutions, new_substitution);
        });
}

fn show_substitutions(
    ui: &mut Ui,
    substitutions: &mut Vec<Substitution>,
    new_substitution: &mut Substitution,
) {
    let mut removed = None;
    egui::Grid::new("substitutions_grid")
        .striped(true)
        .show(ui, |ui| {
            ui.label("Language");
            ui.label("Source");
            ui.label("Target");
            ui.end_row();

            for (i, x) in substitutions.iter_mut().enumerate() {
                ui.label(if x.language.is_empty() {
                    "All".to_string()
                } else {
                    language_name(&x.language)
                });
                ui.text_edit_singleline(&mut x.source);
                ui.text_edit_singleline(&mut x.target);
                if ui
                    .button(RichText::new("\u{1F5D9}").color(Color32::RED))
                    .clicked()
                {
                    removed = Some(i);
                }
                ui.end_row();
            }

            egui::ComboBox::from_id_salt(Id::new("substitution_language"))
                .selected_text(if new_substitution.language.is_empty() {
                    "All".to_string()
                } else {
                    language_name(&new_substitution.language)
                })
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut new_substitution.language, String::new(), "All");
                    for lang in LanguageCodes.all() {
                        ui.selectable_value(
                            &mut new_substitution.language,
                            lang.id.to_string(),
                            lang.name,
                        );
                    }
                });
            ui.text_edit_singleline(&mut new_substitution.source);
            ui.text_edit_singleline(&mut new_substitution.target);
            if ui.button("Add").clicked() && !new_substitution.source.is_empty() {
                substitutions.push(std::mem::take(new_substitution));
            }
            ui.end_row();
        });

    if let Some(i) = removed {
        substitutions.remove(i);
    }
}

fn show_translation(ui: &mut Ui, settings: &mut AppSettings) {
    ui.checkbox(&mut settings.do_translation, "Translate text");

    ui.add_enabled_ui(settings.do_translation, |ui| {
        ui.horizontal(|ui| {
            ui.label("Language:");
            egui::ComboBox::from_id_salt(Id::new("translate_language"))
                .selected_text(language_name(&settings.translate_language))
                .show_ui(ui, |ui| {
                    for lang in LanguageCodes.all() {
                        ui.selectable_value(
                            &mut settings.translate_language,
                            lang.id.to_string(),
                            lang.name,
                        );
                    }
                });
        });

        ui.add(
            egui::Slider::new(&mut settings.translation_timeout_secs, 1..=120)
                .text("Timeout (s)"),
        );
        ui.checkbox(&mut settings.debug_mode, "Debug mode");
        ui.checkbox(&mut settings.ignore_ssl_errors, "Ignore SSL errors");
        ui.checkbox(
            &mut settings.force_rotate_translators,
            "Force translator rotation",
        );

        ui.separator();
        ui.label("Translators:");
        dnd(ui, "dnd_translators").show_vec(
            &mut settings.translators,
            |ui, item, handle, state| {
                ui.horizontal(|ui| {
                    handle.ui(ui, |ui| {
                        ui.label(format!("{} \u{2B0D}", state.index + 1));
                    });
                    ui.checkbox(&mut item.active, item.item.to_string());
                });
            },
        );

        if settings.translators.iter().all(|x| !x.active) {
            ui.label(RichText::new("No translators enabled").color(Color32::RED));
        }
    });
}

fn show_update(ui: &mut Ui, settings: &mut AppSettings) {
    ui.horizontal(|ui| {
        ui.label("Update URL:");
        ui.text_edit_singleline(&mut settings.update_url);
    });

    ui.add(
        egui::Slider::new(&mut settings.auto_update_interval_days, 0..=60)
            .text("Check interval (days, 0 disables)"),
    );

    ui.label(match settings.last_update_check {
        Some(date) => format!("Last check: {}", date.format("%Y-%m-%d %H:%M")),
        None => "Last check: never".to_string(),
    });

    if ui.button("Check now").clicked() {
        ui.ctx().emit(Event::CheckForUpdates);
    }
}
