use crate::language::LanguageId;
use image::DynamicImage;
use std::sync::Arc;

/// One capture travelling through recognition and translation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingItem {
    /// Top left corner of the captured area in global screen coordinates.
    pub screen_pos: (i32, i32),
    pub source: Option<Arc<DynamicImage>>,
    /// Resolution of the source raster, 0 when unknown.
    pub source_dpi: u32,
    pub ocr_language: LanguageId,
    pub translate_language: LanguageId,
    pub recognized: String,
    pub translated: String,
}

impl ProcessingItem {
    pub fn new(
        screen_pos: (i32, i32),
        source: DynamicImage,
        source_dpi: u32,
        ocr_language: LanguageId,
        translate_language: LanguageId,
    ) -> Self {
        Self {
            screen_pos,
            source: Some(Arc::new(source)),
            source_dpi,
            ocr_language,
            translate_language,
            ..Default::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.source
            .as_ref()
            .is_some_and(|x| x.width() != 0 && x.height() != 0)
            && !self.ocr_language.is_empty()
    }

    /// Text put on the clipboard for this item.
    pub fn clipboard_text(&self) -> String {
        if self.translated.is_empty() {
            self.recognized.clone()
        } else {
            format!("{}\n{}", self.recognized, self.translated)
        }
    }
}
