#![warn(clippy::all, rust_2018_idioms)]
#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
mod ui;

pub use ui::app::ScreenTranslatorApp;

pub(crate) mod action;
pub(crate) mod capture;
pub(crate) mod database;
pub(crate) mod language;
pub(crate) mod ocr;
pub(crate) mod processing_item;
pub(crate) mod translation;
pub(crate) mod update;
