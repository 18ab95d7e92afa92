use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use arboard::{Clipboard, ImageData};
use egui::Context;
use log::{error, info};
use open::that;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::spawn_blocking;

use crate::capture::{CaptureArea, ScreenCapture};
use crate::database::{self, HistoryData};
use crate::ocr::{self, TesseractParameter};
use crate::processing_item::ProcessingItem;
use crate::translation::web_translator::TranslationEvent;
use crate::ui::event::Event;
use crate::ui::event::EventHandler;
use crate::ui::shutdown::TASK_TRACKER;
use crate::update::{Loader, UserActions};

pub fn open_path(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    that(path).with_context(|| format!("Failed to open {}", path.display()))
}

pub fn capture_screen(ctx: &Context, area: Option<CaptureArea>) {
    let ctx = ctx.clone();
    TASK_TRACKER.spawn(async move {
        match spawn_blocking(ScreenCapture::capture_under_cursor).await {
            Ok(Ok(capture)) => ctx.emit(Event::ScreenCaptured(Arc::new(capture), area)),
            Ok(Err(e)) => ctx.emit(Event::Error(format!("Failed to capture screen: {e:#}"))),
            Err(e) => error!("Capture task failed: {e}"),
        }
    });
}

pub fn recognize(ctx: &Context, item: ProcessingItem, parameter: TesseractParameter) {
    let ctx = ctx.clone();
    TASK_TRACKER.spawn(async move {
        use std::time::Instant;
        let now = Instant::now();
        info!("Start recognition ({})", item.ocr_language);

        let result = spawn_blocking(move || ocr::recognize(item, &parameter)).await;

        let elapsed = now.elapsed();
        info!("End recognition elapsed: {elapsed:.2?}");

        match result {
            Ok(Ok(item)) => ctx.emit(Event::Recognized(item)),
            Ok(Err(e)) => ctx.emit(Event::Error(format!("{e:#}"))),
            Err(e) => error!("Recognition task failed: {e}"),
        }
    });
}

pub fn forward_translation_events(ctx: &Context, mut events: UnboundedReceiver<TranslationEvent>) {
    let ctx = ctx.clone();
    TASK_TRACKER.spawn(async move {
        while let Some(event) = events.recv().await {
            ctx.emit(match event {
                TranslationEvent::Translated(item) => Event::Translated(item),
                TranslationEvent::Error(message) => Event::Error(message),
            });
        }
    });
}

pub fn store_recognized(ctx: &Context, item: &ProcessingItem) {
    if item.recognized.is_empty() {
        return;
    }
    let recognized = item.recognized.clone();
    let language = item.translate_language.clone();
    store_history(ctx, move || database::store_recognized(&recognized, &language));
}

pub fn store_translation(ctx: &Context, item: &ProcessingItem) {
    if item.recognized.is_empty() || item.translated.is_empty() {
        return;
    }
    let recognized = item.recognized.clone();
    let language = item.translate_language.clone();
    let translated = item.translated.clone();
    store_history(ctx, move || {
        database::store_translation(&recognized, &language, &translated)
    });
}

fn store_history<F>(ctx: &Context, store: F)
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    let ctx = ctx.clone();
    TASK_TRACKER.spawn(async move {
        match spawn_blocking(store).await {
            Ok(Ok(())) => ctx.emit(Event::UpdateHistoryData(load_history().await)),
            Ok(Err(e)) => error!("Failed to store history: {e}"),
            Err(e) => error!("History task failed: {e}"),
        }
    });
}

pub fn refresh_history(ctx: &Context) {
    let ctx = ctx.clone();
    TASK_TRACKER.spawn(async move {
        ctx.emit(Event::UpdateHistoryData(load_history().await));
    });
}

pub fn clear_history(ctx: &Context) {
    store_history(ctx, database::clear_history);
}

async fn load_history() -> Vec<HistoryData> {
    spawn_blocking(database::load_full_history)
        .await
        .map_err(anyhow::Error::from)
        .and_then(|x| x)
        .unwrap_or_else(|err| {
            error!("Failed to load history: {err}");
            vec![]
        })
}

pub fn copy_image(item: &ProcessingItem) -> Result<()> {
    let image = item.source.as_ref().context("No image to copy")?.to_rgba8();

    let mut clipboard = Clipboard::new().context("Clipboard is not available")?;
    clipboard
        .set_image(ImageData {
            width: image.width() as usize,
            height: image.height() as usize,
            bytes: Cow::Owned(image.into_raw()),
        })
        .context("Failed to copy image")?;
    Ok(())
}

pub fn default_tessdata_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_default()
        .join("tessdata")
}

/// Values for `$name$` placeholders of update file paths.
pub fn update_expansions(tessdata_path: Option<&Path>) -> BTreeMap<String, String> {
    let mut expansions = BTreeMap::new();

    let tessdata = tessdata_path.map_or_else(default_tessdata_path, Path::to_path_buf);
    expansions.insert("tessdata".to_string(), tessdata.display().to_string());

    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|x| x.parent().map(Path::to_path_buf))
    {
        expansions.insert("appdir".to_string(), dir.display().to_string());
    }

    expansions
}

pub fn check_for_updates(ctx: &Context, loader: Loader, expansions: BTreeMap<String, String>) {
    let ctx = ctx.clone();
    TASK_TRACKER.spawn(async move {
        match loader.load_model(expansions).await {
            Ok(model) => ctx.emit(Event::UpdateModelLoaded(model)),
            Err(e) => ctx.emit(Event::UpdateCheckFailed(format!("{e:#}"))),
        }
    });
}

pub fn apply_updates(ctx: &Context, loader: Loader, actions: UserActions) {
    let ctx = ctx.clone();
    TASK_TRACKER.spawn(async move {
        match loader.apply_user_actions(actions).await {
            Ok(()) => ctx.emit(Event::Updated),
            Err(e) => ctx.emit(Event::UpdateApplyFailed(format!("{e:#}"))),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansions_use_given_tessdata() {
        let expansions = update_expansions(Some(Path::new("/data/tess")));
        assert_eq!(expansions["tessdata"], "/data/tess");
        assert!(expansions.contains_key("appdir"));
    }

    #[test]
    fn copy_without_image_fails() {
        let error = copy_image(&ProcessingItem::default()).unwrap_err();
        assert_eq!(error.to_string(), "No image to copy");
    }
}
