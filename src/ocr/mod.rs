use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::language::LanguageId;
use crate::ocr::corrector::Substitution;
use crate::ocr::tesseract::Tesseract;
use crate::processing_item::ProcessingItem;

pub mod corrector;
pub mod memory;
pub mod tesseract;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TesseractParameter {
    /// `None` uses the data directory of the installed tesseract.
    pub tessdata_path: Option<PathBuf>,
    pub language: LanguageId,
    pub substitutions: Vec<Substitution>,
}

impl Default for TesseractParameter {
    fn default() -> Self {
        Self {
            tessdata_path: None,
            language: "eng".to_string(),
            substitutions: vec![],
        }
    }
}

/// Runs recognition for the item's source image. Blocking.
pub fn recognize(mut item: ProcessingItem, parameter: &TesseractParameter) -> Result<ProcessingItem> {
    let source = item.source.clone().context("Nothing to recognize")?;

    let mut engine = Tesseract::new(&item.ocr_language, parameter.tessdata_path.as_deref());
    let text = engine.recognize(&source, item.source_dpi)?;

    item.recognized = corrector::correct(&text, &item.ocr_language, &parameter.substitutions);
    item.translated.clear();
    Ok(item)
}
