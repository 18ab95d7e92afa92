use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use egui::{Context, RichText};
use log::{info, warn};

use super::capture_overlay::CaptureOverlay;
use super::history_ui::HistoryUi;
use super::result_ui::ResultWindows;
use super::settings::{AppSettings, SettingsUi};
use super::shortcut::ShortcutManager;
use super::update_ui::{UpdateRequest, UpdateUi};
use crate::action;
use crate::capture::{CaptureArea, ScreenCapture};
use crate::database::HistoryCache;
use crate::processing_item::ProcessingItem;
use crate::translation::web_translator::{TranslatorHandle, spawn_translator};
use crate::ui::event::{Event, EventHandler};
use crate::ui::shutdown::shutdown_tasks;
use crate::update::{AutoChecker, Loader, Model};

#[derive(serde::Deserialize, serde::Serialize, Default)]
#[serde(default)]
pub struct ScreenTranslatorApp {
    pub settings: AppSettings,

    #[serde(skip)]
    pub settings_ui: SettingsUi,
    #[serde(skip)]
    pub capture: CaptureOverlay,
    #[serde(skip)]
    pub results: ResultWindows,
    #[serde(skip)]
    pub history: HistoryUi,
    #[serde(skip)]
    pub updates: UpdateUi,
    #[serde(skip)]
    pub errors: Vec<String>,

    #[serde(skip)]
    translator: Option<TranslatorHandle>,
    #[serde(skip)]
    shortcuts: ShortcutManager,
    #[serde(skip)]
    auto_checker: AutoChecker,
    #[serde(skip)]
    last_area: Option<CaptureArea>,
}

impl ScreenTranslatorApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut app: Self = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        app.settings.normalize();

        let ctx = &cc.egui_ctx;
        let (translator, events) = spawn_translator(
            app.settings.translator_config(),
            Some(Arc::new(HistoryCache)),
        );
        action::forward_translation_events(ctx, events);
        app.translator = Some(translator);

        app.shortcuts = ShortcutManager::new();
        app.auto_checker = AutoChecker::new(
            app.settings.auto_update_interval_days,
            app.settings.last_update_check,
        );
        app.apply_settings(ctx);

        app
    }

    /// Pushes the current settings into every component.
    fn apply_settings(&mut self, ctx: &Context) {
        info!("Applying settings");
        self.settings_ui.refresh_installed_languages(&self.settings);
        let installed = self.settings_ui.installed_languages().to_vec();

        if let Some(translator) = &self.translator {
            translator.apply_settings(self.settings.translator_config());
        }
        self.capture.update_settings(&self.settings, &installed);
        self.results
            .apply_settings(&installed, self.settings.show_captured_image);
        self.auto_checker
            .set_check_interval_days(self.settings.auto_update_interval_days);
        self.auto_checker
            .set_last_check_date(self.settings.last_update_check);

        for error in self.shortcuts.register(&self.settings.shortcuts) {
            ctx.emit(Event::Error(error));
        }
    }

    pub fn start_capture(&mut self, ctx: &Context, area: Option<CaptureArea>) {
        if self.capture.is_active() {
            return;
        }
        self.results.hide_all();
        action::capture_screen(ctx, area);
    }

    pub fn repeat_capture(&mut self, ctx: &Context) {
        let area = self.last_area.clone();
        self.start_capture(ctx, area);
    }

    pub fn handle_capture(
        &mut self,
        ctx: &Context,
        capture: Arc<ScreenCapture>,
        area: Option<CaptureArea>,
    ) {
        match area {
            Some(area) => self.process_area(ctx, &capture, area),
            None => self.capture.activate(ctx, capture),
        }
    }

    fn process_area(&mut self, ctx: &Context, capture: &ScreenCapture, area: CaptureArea) {
        let Some(item) = area.to_item(capture) else {
            warn!("Selected area is outside of the captured screen");
            return;
        };
        self.last_area = Some(area);
        self.recognize(ctx, item);
    }

    pub fn recognize(&mut self, ctx: &Context, item: ProcessingItem) {
        if !item.is_valid() {
            ctx.emit(Event::Error("Nothing to recognize".to_string()));
            return;
        }
        action::recognize(ctx, item, self.settings.tesseract.clone());
    }

    pub fn translate(&mut self, item: ProcessingItem) {
        if let Some(translator) = &self.translator {
            translator.translate(item);
        }
    }

    /// Translation requested from a result window, bypassing stored translations.
    pub fn retranslate(&mut self, item: ProcessingItem) {
        if let Some(translator) = &self.translator {
            translator.retranslate(item);
        }
    }

    pub fn handle_recognized(&mut self, ctx: &Context, item: ProcessingItem) {
        self.results.show_result(ctx, item.clone());
        action::store_recognized(ctx, &item);
        self.translate(item);
    }

    pub fn handle_translated(&mut self, ctx: &Context, item: ProcessingItem) {
        action::store_translation(ctx, &item);
        if self.settings.copy_result_to_clipboard {
            ctx.copy_text(item.clipboard_text());
        }
        self.results.show_result(ctx, item);
    }

    pub fn handle_edition(&mut self, ctx: &Context, item: ProcessingItem) {
        self.results.show_result(ctx, item.clone());
        action::store_recognized(ctx, &item);
        self.translate(item);
    }

    fn loader(&self) -> Loader {
        Loader::new(
            &self.settings.update_url,
            std::env::temp_dir().join("screen_translator_updates"),
        )
    }

    pub fn check_for_updates(&mut self, ctx: &Context) {
        if self.updates.busy {
            return;
        }
        self.updates.busy = true;
        let expansions = action::update_expansions(self.settings.tesseract.tessdata_path.as_deref());
        action::check_for_updates(ctx, self.loader(), expansions);
    }

    pub fn handle_update_model(&mut self, ctx: &Context, model: Model) {
        self.finish_update_check();
        let has_updates = model.has_updates();
        self.updates.set_model(model);
        if has_updates {
            ctx.emit(Event::UpdatesAvailable);
        }
    }

    pub fn handle_update_failure(&mut self, ctx: &Context, message: String) {
        self.finish_update_check();
        self.updates.handle_failure(&message);
        ctx.emit(Event::Error(message));
    }

    /// A failed installation leaves the check schedule alone.
    pub fn handle_apply_failure(&mut self, ctx: &Context, message: String) {
        self.updates.handle_failure(&message);
        ctx.emit(Event::Error(message));
    }

    fn finish_update_check(&mut self) {
        self.auto_checker.handle_check_finished(Utc::now());
        if self.auto_checker.is_last_check_date_changed() {
            self.settings.last_update_check = self.auto_checker.last_check_date();
            self.auto_checker.reset_changed_flag();
        }
    }

    fn check_auto_update(&mut self, ctx: &Context) {
        if !self.updates.busy && self.auto_checker.is_due(Utc::now()) {
            info!("Scheduled update check");
            self.check_for_updates(ctx);
        }
        if self.auto_checker.next_check_at().is_some() {
            ctx.request_repaint_after(Duration::from_secs(60));
        }
    }

    fn show_main_panel(&mut self, ctx: &Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                if ui.button("Capture").clicked() {
                    ctx.emit(Event::CaptureRequested);
                }
                if ui.button("Repeat capture").clicked() {
                    ctx.emit(Event::RepeatCaptureRequested);
                }
                if ui
                    .add_enabled(self.results.last_item().is_some(), egui::Button::new("Show last"))
                    .clicked()
                {
                    ctx.emit(Event::ShowLastRequested);
                }
                if ui
                    .add_enabled(self.results.last_item().is_some(), egui::Button::new("Copy last"))
                    .clicked()
                {
                    ctx.emit(Event::CopyLastRequested);
                }
            });

            ui.separator();
            ui.horizontal_wrapped(|ui| {
                if ui.button("Settings").clicked() {
                    self.settings_ui.open(&self.settings);
                }
                if ui.button("History").clicked() {
                    self.history.toggle(ctx);
                }
                let updates = if self.updates.updates_available() {
                    RichText::new("Updates \u{2B06}").strong()
                } else {
                    RichText::new("Updates")
                };
                if ui.button(updates).clicked() {
                    self.updates.open = !self.updates.open;
                }
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
    }

    fn show_errors(&mut self, ctx: &Context) {
        if self.errors.is_empty() {
            return;
        }

        let mut dismissed = false;
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                for error in &self.errors {
                    ui.label(RichText::new(error).color(egui::Color32::RED));
                }
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.errors.clear();
        }
    }

    fn show(&mut self, ctx: &Context) {
        if ctx.input(|i| i.viewport().close_requested()) {
            shutdown_tasks();
        }

        self.show_main_panel(ctx);

        if let Some(mut settings) = self.settings_ui.show(ctx) {
            // checks may have finished while the dialog was open
            settings.last_update_check = self.settings.last_update_check;
            self.settings = settings;
            self.apply_settings(ctx);
        }
        if self.history.open {
            self.history.show(ctx);
        }
        if self.updates.open {
            match self.updates.show(ctx) {
                Some(UpdateRequest::Check) => self.check_for_updates(ctx),
                Some(UpdateRequest::Apply) => {
                    self.updates.busy = true;
                    let actions = self.updates.model.user_actions();
                    action::apply_updates(ctx, self.loader(), actions);
                }
                None => {}
            }
        }

        if let Some((capture, area)) = self.capture.show(ctx, &self.settings) {
            self.process_area(ctx, &capture, area);
        }

        self.results.show(ctx);
        self.show_errors(ctx);
    }
}

impl eframe::App for ScreenTranslatorApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.shortcuts.check_events(ctx);
        ctx.update_state(self);

        self.check_auto_update(ctx);

        self.show(ctx);

        // Global hotkeys arrive outside of egui input.
        ctx.request_repaint_after(Duration::from_millis(100));
    }

    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta};

    use super::*;

    fn app_checked_at(date: DateTime<Utc>) -> ScreenTranslatorApp {
        let mut app = ScreenTranslatorApp::default();
        app.settings.auto_update_interval_days = 7;
        app.settings.last_update_check = Some(date);
        app.auto_checker = AutoChecker::new(7, Some(date));
        app.updates.busy = true;
        app
    }

    #[test]
    fn failed_installation_keeps_last_check_date() {
        let ctx = Context::default();
        let checked = Utc::now() - TimeDelta::days(3);
        let mut app = app_checked_at(checked);

        app.handle_apply_failure(&ctx, "Checksum mismatch: http://x".to_string());

        assert!(!app.updates.busy);
        assert_eq!(app.settings.last_update_check, Some(checked));
        assert_eq!(app.auto_checker.last_check_date(), Some(checked));
        assert!(!app.auto_checker.is_due(Utc::now()));
        assert!(matches!(
            ctx.get_events().as_slice(),
            [Event::Error(message)] if message == "Checksum mismatch: http://x"
        ));
    }

    #[test]
    fn failed_check_counts_as_finished_check() {
        let ctx = Context::default();
        let checked = Utc::now() - TimeDelta::days(3);
        let mut app = app_checked_at(checked);

        app.handle_update_failure(&ctx, "http://x: 404 Not Found".to_string());

        assert!(!app.updates.busy);
        let last = app.settings.last_update_check.unwrap();
        assert!(last > checked);
        assert_eq!(app.auto_checker.last_check_date(), Some(last));
        assert!(!app.auto_checker.is_last_check_date_changed());
    }
}
