use anyhow::{Context, Result, anyhow};
use enigo::{Enigo, Mouse, Settings as EnigoSettings};
use image::{DynamicImage, RgbaImage};
use imageproc::rect::Rect;
use log::info;
use screenshots::Screen;

use crate::language::LanguageId;
use crate::processing_item::ProcessingItem;

pub mod selector;

const BASE_DPI: f32 = 96.0;

/// Raster of the screen the overlay is shown on.
#[derive(Debug, Clone)]
pub struct ScreenCapture {
    pub image: DynamicImage,
    /// Global position of the screen in logical coordinates.
    pub origin: (i32, i32),
    pub scale_factor: f32,
}

impl ScreenCapture {
    pub fn capture_under_cursor() -> Result<Self> {
        let (x, y) = mouse_position()?;
        Self::capture_at(x, y)
    }

    pub fn capture_at(x: i32, y: i32) -> Result<Self> {
        let screen = Screen::from_point(x, y)?;
        let image = screen.capture()?;

        let bytes = image.to_vec();
        let image = RgbaImage::from_raw(image.width(), image.height(), bytes)
            .context("screenshot failed")?;

        let info = screen.display_info;
        info!(
            "Captured screen {} at ({}, {}) {}x{}",
            info.id,
            info.x,
            info.y,
            image.width(),
            image.height()
        );

        Ok(Self {
            image: DynamicImage::ImageRgba8(image),
            origin: (info.x, info.y),
            scale_factor: info.scale_factor,
        })
    }

    /// Screen rect in raster pixels.
    pub fn rect(&self) -> Rect {
        Rect::at(0, 0).of_size(self.image.width().max(1), self.image.height().max(1))
    }

    pub fn dpi(&self) -> u32 {
        (BASE_DPI * self.scale_factor).round() as u32
    }

    pub fn crop(&self, rect: &Rect) -> Option<DynamicImage> {
        let rect = rect.intersect(self.rect())?;
        Some(self.image.crop_imm(
            rect.left() as u32,
            rect.top() as u32,
            rect.width(),
            rect.height(),
        ))
    }

    /// Global logical position of a raster pixel.
    pub fn to_global(&self, (x, y): (i32, i32)) -> (i32, i32) {
        let scale = if self.scale_factor > 0.0 {
            self.scale_factor
        } else {
            1.0
        };
        (
            self.origin.0 + (x as f32 / scale).round() as i32,
            self.origin.1 + (y as f32 / scale).round() as i32,
        )
    }
}

fn mouse_position() -> Result<(i32, i32)> {
    let enigo = Enigo::new(&EnigoSettings::default()).map_err(|e| anyhow!("{e:?}"))?;
    enigo.location().map_err(|e| anyhow!("{e:?}"))
}

/// Selected area with the languages it should be processed with.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureArea {
    pub rect: Rect,
    pub ocr_language: LanguageId,
    pub translate_language: LanguageId,
    pub do_translation: bool,
}

impl CaptureArea {
    pub fn to_item(&self, capture: &ScreenCapture) -> Option<ProcessingItem> {
        let image = capture.crop(&self.rect)?;
        let translate_language = if self.do_translation {
            self.translate_language.clone()
        } else {
            LanguageId::new()
        };

        Some(ProcessingItem::new(
            capture.to_global((self.rect.left(), self.rect.top())),
            image,
            capture.dpi(),
            self.ocr_language.clone(),
            translate_language,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture() -> ScreenCapture {
        ScreenCapture {
            image: DynamicImage::new_rgba8(200, 100),
            origin: (1920, 0),
            scale_factor: 2.0,
        }
    }

    #[test]
    fn crop_is_clamped() {
        let image = capture()
            .crop(&Rect::at(150, 50).of_size(100, 100))
            .unwrap();
        assert_eq!((image.width(), image.height()), (50, 50));

        assert!(capture().crop(&Rect::at(300, 300).of_size(10, 10)).is_none());
    }

    #[test]
    fn area_becomes_item() {
        let area = CaptureArea {
            rect: Rect::at(20, 10).of_size(40, 30),
            ocr_language: "eng".into(),
            translate_language: "rus".into(),
            do_translation: true,
        };

        let item = area.to_item(&capture()).unwrap();
        assert_eq!(item.screen_pos, (1930, 5));
        assert_eq!(item.source_dpi, 192);
        assert_eq!(item.translate_language, "rus");
        assert!(item.is_valid());

        let area = CaptureArea {
            do_translation: false,
            ..area
        };
        assert!(area.to_item(&capture()).unwrap().translate_language.is_empty());
    }
}
