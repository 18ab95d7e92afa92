use crate::ScreenTranslatorApp;
use crate::capture::{CaptureArea, ScreenCapture};
use crate::database::HistoryData;
use crate::processing_item::ProcessingItem;
use crate::update::Model;
use egui::{Context, Id};
use log::{debug, error};
use std::sync::{Arc, LazyLock};

#[derive(Debug, Clone)]
pub enum Event {
    CaptureRequested,
    RepeatCaptureRequested,
    ShowLastRequested,
    CopyLastRequested,
    /// `Some` area is processed right away without the overlay.
    ScreenCaptured(Arc<ScreenCapture>, Option<CaptureArea>),
    Recognized(ProcessingItem),
    Translated(ProcessingItem),
    Error(String),
    RequestRecognize(ProcessingItem),
    RequestTranslate(ProcessingItem),
    RequestClipboard(ProcessingItem),
    RequestImageClipboard(ProcessingItem),
    RequestEdition(ProcessingItem),
    UpdateHistoryData(Vec<HistoryData>),
    CheckForUpdates,
    UpdateModelLoaded(Model),
    UpdateCheckFailed(String),
    UpdateApplyFailed(String),
    UpdatesAvailable,
    Updated,
}

pub trait EventHandler {
    fn emit(&self, value: Event);

    fn get_events(&self) -> Vec<Event>;

    fn update_state(&self, state: &mut ScreenTranslatorApp) {
        let events = self.get_events();

        for x in events {
            self.handle_event(state, x);
        }
    }

    fn handle_event(&self, state: &mut ScreenTranslatorApp, event: Event);
}

static EVENT_LIST_ID: LazyLock<Id> = LazyLock::new(|| Id::new("EVENT_LIST"));

impl EventHandler for Context {
    fn emit(&self, value: Event) {
        self.data_mut(|x| {
            x.get_temp_mut_or_insert_with(*EVENT_LIST_ID, Vec::new)
                .push(value);
        });
        self.request_repaint();
    }

    fn get_events(&self) -> Vec<Event> {
        self.data_mut(|x| x.remove_temp(*EVENT_LIST_ID).unwrap_or_default())
    }

    fn handle_event(&self, state: &mut ScreenTranslatorApp, event: Event) {
        match event {
            Event::CaptureRequested => state.start_capture(self, None),
            Event::RepeatCaptureRequested => state.repeat_capture(self),
            Event::ShowLastRequested => state.results.show_last(),
            Event::CopyLastRequested => {
                if let Some(item) = state.results.last_item() {
                    self.copy_text(item.clipboard_text());
                }
            }
            Event::ScreenCaptured(capture, area) => state.handle_capture(self, capture, area),
            Event::Recognized(item) => state.handle_recognized(self, item),
            Event::Translated(item) => state.handle_translated(self, item),
            Event::Error(message) => {
                error!("{message}");
                state.errors.push(message);
            }
            Event::RequestRecognize(item) => state.recognize(self, item),
            Event::RequestTranslate(item) => state.retranslate(item),
            Event::RequestClipboard(item) => {
                debug!("Copy text of item at {:?}", item.screen_pos);
                self.copy_text(item.clipboard_text());
            }
            Event::RequestImageClipboard(item) => {
                if let Err(e) = crate::action::copy_image(&item) {
                    self.emit(Event::Error(format!("{e:#}")));
                }
            }
            Event::RequestEdition(item) => state.handle_edition(self, item),
            Event::UpdateHistoryData(data) => {
                state.history.history_data = data;
            }
            Event::CheckForUpdates => state.check_for_updates(self),
            Event::UpdateModelLoaded(model) => state.handle_update_model(self, model),
            Event::UpdateCheckFailed(message) => state.handle_update_failure(self, message),
            Event::UpdateApplyFailed(message) => state.handle_apply_failure(self, message),
            Event::UpdatesAvailable => state.updates.set_updates_available(),
            Event::Updated => state.updates.handle_updated(),
        }
    }
}
