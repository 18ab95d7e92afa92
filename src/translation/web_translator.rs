use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use log::{error, info, warn};
use reqwest::Client;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::spawn_blocking;
use tokio::time::timeout;

use crate::processing_item::ProcessingItem;
use crate::translation::helper::TranslatorHelper;
use crate::translation::{TranslatorConfig, build_client};
use crate::ui::shutdown::TASK_TRACKER;

pub const NO_TRANSLATORS: &str = "No translators enabled. Change settings.";
pub const TIMEOUT: &str = "Translation timed out.";

#[derive(Debug, Clone, PartialEq)]
pub enum TranslationEvent {
    Translated(ProcessingItem),
    Error(String),
}

/// Translations stored from earlier runs.
pub trait TranslationCache: Send + Sync {
    fn lookup(&self, text: &str, language: &str) -> Result<Option<String>>;
}

#[derive(Debug)]
pub enum TranslatorCommand {
    /// `use_cache` is false when the user asked for a fresh translation.
    Translate {
        item: ProcessingItem,
        use_cache: bool,
    },
    ApplySettings(TranslatorConfig),
}

enum Failure {
    Empty,
    Load(String),
    Timeout,
}

/// Translates queued items one at a time, rotating through the enabled
/// translators when one fails, times out or returns nothing.
pub struct WebTranslator {
    client: Client,
    config: TranslatorConfig,
    helper: TranslatorHelper,
    queue: VecDeque<(ProcessingItem, bool)>,
    cache: Option<Arc<dyn TranslationCache>>,
    events: UnboundedSender<TranslationEvent>,
}

impl WebTranslator {
    pub fn new(config: TranslatorConfig, events: UnboundedSender<TranslationEvent>) -> Self {
        let mut translator = Self {
            client: Client::new(),
            config: TranslatorConfig::default(),
            helper: TranslatorHelper::default(),
            queue: VecDeque::new(),
            cache: None,
            events,
        };
        translator.apply_settings(config);
        translator
    }

    pub fn with_cache(mut self, cache: Arc<dyn TranslationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn apply_settings(&mut self, config: TranslatorConfig) {
        match build_client(&config) {
            Ok(client) => self.client = client,
            Err(e) => self.emit_error(format!("Failed to create http client: {e}")),
        }

        self.helper.load(config.translators.clone());
        if !self.helper.got_translators() {
            self.emit_error(NO_TRANSLATORS.to_string());
        }

        self.config = config;
    }

    /// Queues the item, or hands it back untouched when there is nothing to translate.
    pub fn translate(&mut self, item: ProcessingItem) {
        self.enqueue(item, true);
    }

    /// Same as `translate` but never answers from the cache.
    pub fn retranslate(&mut self, item: ProcessingItem) {
        self.enqueue(item, false);
    }

    fn enqueue(&mut self, item: ProcessingItem, use_cache: bool) {
        if !item.is_valid() || item.translate_language.is_empty() || item.recognized.is_empty() {
            self.emit(TranslationEvent::Translated(item));
            return;
        }
        self.queue.push_back((item, use_cache));
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub async fn translate_queued(&mut self) {
        while let Some((mut item, use_cache)) = self.queue.pop_front() {
            if use_cache && let Some(translation) = self.cached(&item).await {
                info!("Using stored translation");
                item.translated = translation;
                self.emit(TranslationEvent::Translated(item));
                continue;
            }
            self.translate_item(item).await;
        }
    }

    async fn cached(&self, item: &ProcessingItem) -> Option<String> {
        let cache = self.cache.clone()?;
        let text = item.recognized.clone();
        let language = item.translate_language.clone();
        match spawn_blocking(move || cache.lookup(&text, &language)).await {
            Ok(Ok(translation)) => translation.filter(|x| !x.is_empty()),
            Ok(Err(e)) => {
                warn!("Failed to load stored translation: {e:#}");
                None
            }
            Err(e) => {
                error!("Cache lookup task failed: {e}");
                None
            }
        }
    }

    async fn translate_item(&mut self, mut item: ProcessingItem) {
        self.helper.new_item(self.config.force_rotate_translators);

        let mut translator = self.helper.current();
        if translator.is_none() {
            self.emit_error(NO_TRANSLATORS.to_string());
        }

        let mut failure = None;
        while let Some(kind) = translator {
            info!("Translate with {kind} to {}", item.translate_language);

            let attempt = timeout(
                self.config.timeout,
                kind.translate(
                    &self.client,
                    &self.config.endpoints,
                    &item.recognized,
                    &item.translate_language,
                    self.config.debug_mode,
                ),
            )
            .await;

            match attempt {
                Ok(Ok(text)) if !text.is_empty() => {
                    item.translated = text;
                    self.emit(TranslationEvent::Translated(item));
                    return;
                }
                Ok(Ok(_)) => {
                    warn!("{kind} returned empty translation");
                    failure = Some(Failure::Empty);
                }
                Ok(Err(e)) => {
                    warn!("{kind} failed: {e:#}");
                    failure = Some(Failure::Load(kind.page_url(&self.config.endpoints)));
                }
                Err(_) => {
                    warn!("{kind} timed out");
                    failure = Some(Failure::Timeout);
                }
            }

            translator = self.helper.next();
        }

        match failure {
            Some(Failure::Load(url)) => {
                self.emit_error(format!("Failed to load page ({url}) for translation."))
            }
            Some(Failure::Timeout) => self.emit_error(TIMEOUT.to_string()),
            Some(Failure::Empty) => item.translated.clear(),
            None => {}
        }
        self.emit(TranslationEvent::Translated(item));
    }

    fn handle(&mut self, command: TranslatorCommand) {
        match command {
            TranslatorCommand::Translate {
                item,
                use_cache: true,
            } => self.translate(item),
            TranslatorCommand::Translate {
                item,
                use_cache: false,
            } => self.retranslate(item),
            TranslatorCommand::ApplySettings(config) => self.apply_settings(config),
        }
    }

    /// Processes commands until every handle is dropped.
    pub async fn run(mut self, mut commands: UnboundedReceiver<TranslatorCommand>) {
        while let Some(command) = commands.recv().await {
            self.handle(command);
            while let Ok(command) = commands.try_recv() {
                self.handle(command);
            }
            self.translate_queued().await;
        }
        info!("Translator stopped");
    }

    fn emit(&self, event: TranslationEvent) {
        if self.events.send(event).is_err() {
            warn!("Translation event dropped, receiver closed");
        }
    }

    fn emit_error(&self, message: String) {
        error!("{message}");
        self.emit(TranslationEvent::Error(message));
    }
}

#[derive(Clone, Debug)]
pub struct TranslatorHandle {
    tx: UnboundedSender<TranslatorCommand>,
}

impl TranslatorHandle {
    pub fn translate(&self, item: ProcessingItem) {
        self.send(TranslatorCommand::Translate {
            item,
            use_cache: true,
        });
    }

    pub fn retranslate(&self, item: ProcessingItem) {
        self.send(TranslatorCommand::Translate {
            item,
            use_cache: false,
        });
    }

    pub fn apply_settings(&self, config: TranslatorConfig) {
        self.send(TranslatorCommand::ApplySettings(config));
    }

    fn send(&self, command: TranslatorCommand) {
        if let Err(e) = self.tx.send(command) {
            error!("Translator is not running: {e}");
        }
    }
}

pub fn spawn_translator(
    config: TranslatorConfig,
    cache: Option<Arc<dyn TranslationCache>>,
) -> (TranslatorHandle, UnboundedReceiver<TranslationEvent>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let mut translator = WebTranslator::new(config, event_tx);
    if let Some(cache) = cache {
        translator = translator.with_cache(cache);
    }
    TASK_TRACKER.spawn(translator.run(command_rx));

    (TranslatorHandle { tx: command_tx }, event_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::bing::tests::{PAGE, RESPONSE};
    use crate::translation::{Endpoints, TranslatorKind};
    use httpmock::prelude::*;
    use image::DynamicImage;
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Default)]
    struct MemoryCache(HashMap<(String, String), String>);

    impl MemoryCache {
        fn with(text: &str, language: &str, translation: &str) -> Arc<dyn TranslationCache> {
            let mut cache = Self::default();
            cache.0.insert(
                (text.to_string(), language.to_string()),
                translation.to_string(),
            );
            Arc::new(cache)
        }
    }

    impl TranslationCache for MemoryCache {
        fn lookup(&self, text: &str, language: &str) -> Result<Option<String>> {
            std::thread::sleep(Duration::from_millis(text.len() as u64 % 7));
            Ok(self.0.get(&(text.to_string(), language.to_string())).cloned())
        }
    }

    fn item(text: &str) -> ProcessingItem {
        let mut item = ProcessingItem::new(
            (0, 0),
            DynamicImage::new_rgba8(2, 2),
            96,
            "eng".into(),
            "rus".into(),
        );
        item.recognized = text.to_string();
        item
    }

    fn config(server: &MockServer, translators: Vec<TranslatorKind>) -> TranslatorConfig {
        TranslatorConfig {
            timeout: Duration::from_secs(5),
            translators,
            endpoints: Endpoints {
                google: server.base_url(),
                bing: server.base_url(),
            },
            ..Default::default()
        }
    }

    fn events(rx: &mut UnboundedReceiver<TranslationEvent>) -> Vec<TranslationEvent> {
        let mut events = vec![];
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    async fn google_answers(server: &MockServer, text: &str, translation: &str) {
        let body = format!(r#"<div class="result-container">{translation}</div>"#);
        server
            .mock_async(move |when, then| {
                when.method(GET).path("/m").query_param("q", text);
                then.status(200).body(body);
            })
            .await;
    }

    #[tokio::test]
    async fn item_without_target_is_passed_through() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut translator = WebTranslator::new(TranslatorConfig::default(), tx);

        let mut untranslatable = item("text");
        untranslatable.translate_language.clear();
        translator.translate(untranslatable.clone());

        let invalid = ProcessingItem {
            recognized: "text".into(),
            translate_language: "rus".into(),
            ..Default::default()
        };
        translator.translate(invalid.clone());

        assert_eq!(translator.queue_len(), 0);
        assert_eq!(
            events(&mut rx),
            vec![
                TranslationEvent::Translated(untranslatable),
                TranslationEvent::Translated(invalid)
            ]
        );
    }

    #[tokio::test]
    async fn translates_in_queue_order() {
        let server = MockServer::start_async().await;
        google_answers(&server, "one", "один").await;
        google_answers(&server, "two", "два").await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut translator =
            WebTranslator::new(config(&server, vec![TranslatorKind::Google]), tx);

        translator.translate(item("one"));
        translator.translate(item("two"));
        assert_eq!(translator.queue_len(), 2);
        translator.translate_queued().await;

        let translated: Vec<String> = events(&mut rx)
            .into_iter()
            .map(|x| match x {
                TranslationEvent::Translated(item) => item.translated,
                TranslationEvent::Error(e) => panic!("unexpected error {e}"),
            })
            .collect();
        assert_eq!(translated, vec!["один", "два"]);
    }

    #[tokio::test]
    async fn rotates_to_next_translator_on_load_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/m");
                then.status(500);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/translator");
                then.status(200).body(PAGE);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/ttranslatev3");
                then.status(200).body(RESPONSE);
            })
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut translator = WebTranslator::new(
            config(&server, vec![TranslatorKind::Google, TranslatorKind::Bing]),
            tx,
        );
        translator.translate(item("Hello"));
        translator.translate_queued().await;

        let mut expected = item("Hello");
        expected.translated = "Привет".into();
        assert_eq!(events(&mut rx), vec![TranslationEvent::Translated(expected)]);
    }

    #[tokio::test]
    async fn reports_load_failure_of_last_translator() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/m");
                then.status(404);
            })
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut translator =
            WebTranslator::new(config(&server, vec![TranslatorKind::Google]), tx);
        translator.translate(item("Hello"));
        translator.translate_queued().await;

        let message = format!("Failed to load page ({}/m) for translation.", server.base_url());
        assert_eq!(
            events(&mut rx),
            vec![
                TranslationEvent::Error(message),
                TranslationEvent::Translated(item("Hello"))
            ]
        );
    }

    #[tokio::test]
    async fn reports_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/m");
                then.status(200)
                    .delay(Duration::from_secs(2))
                    .body(r#"<div class="result-container">late</div>"#);
            })
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut config = config(&server, vec![TranslatorKind::Google]);
        config.timeout = Duration::from_millis(100);
        let mut translator = WebTranslator::new(config, tx);
        translator.translate(item("Hello"));
        translator.translate_queued().await;

        assert_eq!(
            events(&mut rx),
            vec![
                TranslationEvent::Error(TIMEOUT.to_string()),
                TranslationEvent::Translated(item("Hello"))
            ]
        );
    }

    #[tokio::test]
    async fn empty_translation_is_not_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/m");
                then.status(200).body("<html></html>");
            })
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut translator =
            WebTranslator::new(config(&server, vec![TranslatorKind::Google]), tx);
        translator.translate(item("Hello"));
        translator.translate_queued().await;

        assert_eq!(events(&mut rx), vec![TranslationEvent::Translated(item("Hello"))]);
    }

    #[tokio::test]
    async fn missing_translators_are_reported() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut translator = WebTranslator::new(
            TranslatorConfig {
                translators: vec![],
                ..Default::default()
            },
            tx,
        );
        assert_eq!(
            events(&mut rx),
            vec![TranslationEvent::Error(NO_TRANSLATORS.to_string())]
        );

        translator.translate(item("Hello"));
        translator.translate_queued().await;
        assert_eq!(
            events(&mut rx),
            vec![
                TranslationEvent::Error(NO_TRANSLATORS.to_string()),
                TranslationEvent::Translated(item("Hello"))
            ]
        );
    }

    #[tokio::test]
    async fn spawned_translator_answers_through_channel() {
        let server = MockServer::start_async().await;
        google_answers(&server, "one", "один").await;

        let (handle, mut rx) =
            spawn_translator(config(&server, vec![TranslatorKind::Google]), None);
        handle.translate(item("one"));

        let event = rx.recv().await.unwrap();
        let TranslationEvent::Translated(item) = event else {
            panic!("unexpected event {event:?}");
        };
        assert_eq!(item.translated, "один");
    }

    #[tokio::test]
    async fn stored_translation_skips_network_unless_refreshed() {
        let server = MockServer::start_async().await;
        let page = server
            .mock_async(|when, then| {
                when.path("/m");
                then.status(200)
                    .body(r#"<div class="result-container">fresh</div>"#);
            })
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut translator = WebTranslator::new(config(&server, vec![TranslatorKind::Google]), tx)
            .with_cache(MemoryCache::with("Hello", "rus", "stored"));

        translator.translate(item("Hello"));
        translator.retranslate(item("Hello"));
        translator.translate_queued().await;

        let translated: Vec<String> = events(&mut rx)
            .into_iter()
            .filter_map(|x| match x {
                TranslationEvent::Translated(item) => Some(item.translated),
                TranslationEvent::Error(_) => None,
            })
            .collect();
        assert_eq!(translated, vec!["stored", "fresh"]);
        page.assert_async().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn many_requests_keep_their_order() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/m");
                then.status(200)
                    .body(r#"<div class="result-container">done</div>"#);
            })
            .await;

        let (handle, mut rx) = spawn_translator(
            config(&server, vec![TranslatorKind::Google]),
            Some(Arc::new(MemoryCache::default())),
        );
        let texts: Vec<String> = (0..40).map(|i| format!("text {i}")).collect();
        for text in &texts {
            handle.translate(item(text));
        }

        let mut received = vec![];
        while received.len() < texts.len() {
            match rx.recv().await.unwrap() {
                TranslationEvent::Translated(item) => received.push(item.recognized),
                TranslationEvent::Error(e) => panic!("unexpected error {e}"),
            }
        }
        assert_eq!(received, texts);
    }
}
