pub mod app;
pub mod capture_overlay;
pub mod event;
pub mod history_ui;
pub mod id_item;
pub mod result_ui;
pub mod settings;
pub mod shortcut;
pub mod shutdown;
pub mod update_ui;
