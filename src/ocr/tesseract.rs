use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat};
use log::{debug, info};
use rusty_tesseract::{Args, Image};

use crate::language::{LanguageCode, LanguageCodes};
use crate::ocr::memory::free_memory;

const PREFERRED_DPI: f32 = 300.0;
const MAX_DIMENSION: f32 = 0x7fff as f32;
const MEMORY_USAGE: f64 = 0.95;

#[derive(Debug)]
pub struct PreparedImage {
    pub image: GrayImage,
    pub scale: f32,
    pub dpi: u32,
}

/// Converts to grayscale and upscales towards 300 DPI without exceeding the
/// engine's dimension limit or the available memory.
pub fn prepare_image(
    image: &DynamicImage,
    source_dpi: u32,
    available_memory: Option<u64>,
) -> PreparedImage {
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();

    if source_dpi == 0 {
        return PreparedImage {
            image: gray,
            scale: 1.0,
            dpi: source_dpi,
        };
    }

    let preferred_scale = (PREFERRED_DPI / source_dpi as f32).max(1.0);
    if preferred_scale <= 1.0 {
        return PreparedImage {
            image: gray,
            scale: 1.0,
            dpi: source_dpi,
        };
    }

    let mut scale = preferred_scale
        .min(MAX_DIMENSION / width as f32)
        .min(MAX_DIMENSION / height as f32);

    if let Some(memory) = available_memory.filter(|x| *x > 0) {
        // one byte per grayscale pixel
        let actual_size = u64::from(width) * u64::from(height);
        let max_scale_memory = (memory as f64 * MEMORY_USAGE / actual_size as f64) as f32;
        scale = scale.min(max_scale_memory);
    }

    let scaled_width = (width as f32 * scale).round() as u32;
    let scaled_height = (height as f32 * scale).round() as u32;
    if scaled_width == 0 || scaled_height == 0 {
        return PreparedImage {
            image: gray,
            scale: 1.0,
            dpi: source_dpi,
        };
    }

    debug!("Scale image {width}x{height} by {scale:.2} to {scaled_width}x{scaled_height}");
    let image = image::imageops::resize(&gray, scaled_width, scaled_height, FilterType::Triangle);

    PreparedImage {
        image,
        scale,
        dpi: (source_dpi as f32 * scale).round() as u32,
    }
}

#[derive(Debug)]
pub struct Tesseract {
    language: Option<&'static LanguageCode>,
    tessdata_path: Option<PathBuf>,
    error: String,
}

impl Tesseract {
    pub fn new(language: &str, tessdata_path: Option<&Path>) -> Self {
        let mut tesseract = Self {
            language: None,
            tessdata_path: tessdata_path.map(Path::to_path_buf),
            error: String::new(),
        };

        match tesseract.init(language) {
            Ok(code) => tesseract.language = Some(code),
            Err(e) => tesseract.error = e.to_string(),
        }

        tesseract
    }

    fn init(&self, language: &str) -> Result<&'static LanguageCode> {
        let code = LanguageCodes
            .find_by_id(language)
            .ok_or_else(|| anyhow!("unknown recognition language: {language}"))?;

        if !self.is_installed(code.tesseract) {
            bail!("troubles with tessdata");
        }

        Ok(code)
    }

    fn is_installed(&self, tesseract_code: &str) -> bool {
        match &self.tessdata_path {
            Some(path) => path.join(format!("{tesseract_code}.traineddata")).is_file(),
            None => installed_languages(None).iter().any(|x| x == tesseract_code),
        }
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn is_valid(&self) -> bool {
        self.language.is_some()
    }

    pub fn recognize(&mut self, source: &DynamicImage, source_dpi: u32) -> Result<String> {
        let Some(language) = self.language else {
            bail!("{}", self.error);
        };
        if source.width() == 0 || source.height() == 0 {
            bail!("empty image");
        }

        self.error.clear();

        let prepared = prepare_image(source, source_dpi, free_memory());
        let result = self.run_engine(language.tesseract, &prepared);

        let text = match result {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                self.error = e.to_string();
                return Err(e);
            }
        };

        if text.is_empty() {
            self.error = "Failed to recognize text".to_string();
            bail!("{}", self.error);
        }

        info!("Recognized {} chars ({})", text.chars().count(), language.id);
        Ok(text)
    }

    fn run_engine(&self, tesseract_code: &str, prepared: &PreparedImage) -> Result<String> {
        let file = tempfile::Builder::new()
            .prefix("screen_translator")
            .suffix(".png")
            .tempfile()
            .context("Could not create temporary image")?;
        prepared
            .image
            .save_with_format(file.path(), ImageFormat::Png)
            .context("Could not store temporary image")?;

        match &self.tessdata_path {
            Some(tessdata) => run_tesseract_command(file.path(), tesseract_code, prepared.dpi, tessdata),
            None => {
                let image = Image::from_path(file.path())?;
                let args = Args {
                    lang: tesseract_code.to_string(),
                    dpi: (prepared.dpi > 0).then_some(prepared.dpi as i32),
                    ..Args::default()
                };
                Ok(rusty_tesseract::image_to_string(&image, &args)?)
            }
        }
    }
}

fn run_tesseract_command(
    image_path: &Path,
    tesseract_code: &str,
    dpi: u32,
    tessdata: &Path,
) -> Result<String> {
    let mut command = Command::new("tesseract");
    command
        .arg(image_path)
        .arg("stdout")
        .args(["-l", tesseract_code])
        .arg("--tessdata-dir")
        .arg(tessdata);
    if dpi > 0 {
        command.args(["--dpi", &dpi.to_string()]);
    }

    let output = command.output().context("Failed to start tesseract")?;
    if !output.status.success() {
        bail!(
            "tesseract failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8(output.stdout)?)
}

/// Tesseract codes with installed trained data.
pub fn installed_languages(tessdata_path: Option<&Path>) -> Vec<String> {
    match tessdata_path {
        Some(path) => std::fs::read_dir(path)
            .map(|entries| {
                entries
                    .flatten()
                    .filter_map(|entry| {
                        let name = entry.file_name().to_string_lossy().to_string();
                        name.strip_suffix(".traineddata").map(str::to_string)
                    })
                    .collect()
            })
            .unwrap_or_default(),
        None => rusty_tesseract::get_tesseract_langs().unwrap_or_default(),
    }
}
