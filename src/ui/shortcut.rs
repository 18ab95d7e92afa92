use crate::ui::event::{Event, EventHandler};
use egui::{CollapsingHeader, Context};
use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum ShortcutAction {
    Capture,
    #[strum(to_string = "Repeat capture")]
    RepeatCapture,
    #[strum(to_string = "Show last result")]
    ShowLast,
    #[strum(to_string = "Copy last result")]
    CopyLast,
}

impl ShortcutAction {
    fn event(self) -> Event {
        match self {
            ShortcutAction::Capture => Event::CaptureRequested,
            ShortcutAction::RepeatCapture => Event::RepeatCaptureRequested,
            ShortcutAction::ShowLast => Event::ShowLastRequested,
            ShortcutAction::CopyLast => Event::CopyLastRequested,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Shortcut {
    pub action: ShortcutAction,
    pub hotkey: String,
}

impl Shortcut {
    pub fn new(action: ShortcutAction, hotkey: &str) -> Self {
        Self {
            action,
            hotkey: hotkey.to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        HotKey::from_str(&self.hotkey).is_ok()
    }
}

pub fn default_shortcuts() -> Vec<Shortcut> {
    vec![
        Shortcut::new(ShortcutAction::Capture, "Ctrl+Alt+Z"),
        Shortcut::new(ShortcutAction::RepeatCapture, "Ctrl+Alt+S"),
        Shortcut::new(ShortcutAction::ShowLast, "Ctrl+Alt+X"),
        Shortcut::new(ShortcutAction::CopyLast, "Ctrl+Alt+C"),
    ]
}

/// Owns the OS registrations of the configured hotkeys.
#[derive(Default)]
pub struct ShortcutManager {
    hotkey_manager: Option<GlobalHotKeyManager>,
    registered: Vec<(HotKey, ShortcutAction)>,
}

impl ShortcutManager {
    pub fn new() -> Self {
        let hotkey_manager = GlobalHotKeyManager::new()
            .inspect_err(|e| error!("Global hotkeys are not available: {e}"))
            .ok();

        Self {
            hotkey_manager,
            registered: vec![],
        }
    }

    /// Replaces all registrations, returns the ones that failed.
    pub fn register(&mut self, shortcuts: &[Shortcut]) -> Vec<String> {
        let Some(manager) = &self.hotkey_manager else {
            return vec![];
        };

        for (hotkey, _) in self.registered.drain(..) {
            if let Err(e) = manager.unregister(hotkey) {
                warn!("Failed to unregister {hotkey:?}: {e}");
            }
        }

        let mut errors = vec![];
        for shortcut in shortcuts.iter().filter(|x| !x.hotkey.is_empty()) {
            match HotKey::from_str(&shortcut.hotkey) {
                Ok(hotkey) => match manager.register(hotkey) {
                    Ok(()) => {
                        info!("Registered {} for {}", shortcut.hotkey, shortcut.action);
                        self.registered.push((hotkey, shortcut.action));
                    }
                    Err(e) => errors.push(format!("Failed to register {}: {e}", shortcut.hotkey)),
                },
                Err(e) => errors.push(format!("Invalid hotkey {}: {e}", shortcut.hotkey)),
            }
        }
        errors
    }

    pub fn check_events(&self, ctx: &Context) {
        while let Ok(event) = GlobalHotKeyEvent::receiver().try_recv() {
            if event.state != HotKeyState::Pressed {
                continue;
            }
            if let Some((_, action)) = self.registered.iter().find(|(x, _)| x.id == event.id) {
                ctx.emit(action.event());
            }
        }
    }
}

pub fn show_config(ui: &mut egui::Ui, shortcuts: &mut [Shortcut]) {
    CollapsingHeader::new("Hotkeys")
        .default_open(true)
        .show(ui, |ui| {
            egui::Grid::new("hotkeys_grid").show(ui, |ui| {
                for shortcut in shortcuts.iter_mut() {
                    ui.label(shortcut.action.to_string());
                    ui.text_edit_singleline(&mut shortcut.hotkey);
                    if !shortcut.hotkey.is_empty() && !shortcut.is_valid() {
                        ui.colored_label(egui::Color32::RED, "\u{2716}");
                    }
                    ui.end_row();
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_shortcuts_are_valid() {
        let shortcuts = default_shortcuts();
        assert_eq!(shortcuts.len(), 4);
        assert!(shortcuts.iter().all(Shortcut::is_valid));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(!Shortcut::new(ShortcutAction::Capture, "Ctrl+Nope+").is_valid());
    }
}
