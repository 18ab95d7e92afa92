use egui::{Color32, Context, Id, RichText};
use egui_extras::{Column, TableBuilder};
use log::info;
use strum::IntoEnumIterator;

use crate::update::{Action, Model, State};

/// Component table of the update subsystem.
#[derive(Default)]
pub struct UpdateUi {
    pub model: Model,
    pub open: bool,
    /// A check or an installation is running.
    pub busy: bool,
    updates_available: bool,
    status: String,
}

pub enum UpdateRequest {
    Check,
    Apply,
}

impl UpdateUi {
    pub fn updates_available(&self) -> bool {
        self.updates_available
    }

    pub fn set_updates_available(&mut self) {
        self.updates_available = true;
    }

    pub fn set_model(&mut self, model: Model) {
        self.updates_available = model.has_updates();
        self.model = model;
        self.busy = false;
        self.status = if self.updates_available {
            "Updates available".to_string()
        } else {
            "Everything is up to date".to_string()
        };
    }

    pub fn handle_updated(&mut self) {
        info!("Update finished");
        self.model.update_states();
        self.updates_available = self.model.has_updates();
        self.busy = false;
        self.status = "Update finished".to_string();
    }

    pub fn handle_failure(&mut self, message: &str) {
        self.busy = false;
        self.status = message.to_string();
    }

    pub fn show(&mut self, ctx: &Context) -> Option<UpdateRequest> {
        let mut request = None;
        let mut open = self.open;
        egui::Window::new("Updates")
            .open(&mut open)
            .default_size([600.0, 320.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.add_enabled_ui(!self.busy, |ui| {
                        if ui.button("Check for updates").clicked() {
                            request = Some(UpdateRequest::Check);
                        }
                        let has_actions = !self.model.user_actions().is_empty();
                        if ui
                            .add_enabled(has_actions, egui::Button::new("Apply"))
                            .clicked()
                        {
                            request = Some(UpdateRequest::Apply);
                        }
                    });
                    if self.busy {
                        ui.spinner();
                    }
                    ui.label(&self.status);
                });
                ui.separator();
                self.show_table(ui);
            });
        self.open = open;

        if request.is_some() {
            self.status.clear();
        }
        request
    }

    fn show_table(&mut self, ui: &mut egui::Ui) {
        let rows = self.model.rows();
        let mut changed = vec![];

        TableBuilder::new(ui)
            .striped(true)
            .column(Column::remainder())
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::remainder())
            .header(20.0, |mut header| {
                for title in ["Name", "State", "Action", "Version", "Files"] {
                    header.col(|ui| {
                        ui.heading(title);
                    });
                }
            })
            .body(|body| {
                body.rows(24.0, rows.len(), |mut row| {
                    let Some(value) = rows.get(row.index()) else {
                        return;
                    };
                    row.col(|ui| {
                        ui.label(format!("{}{}", "    ".repeat(value.depth), value.name));
                    });
                    row.col(|ui| {
                        ui.label(RichText::new(value.state.to_string()).color(state_color(value.state)));
                    });
                    row.col(|ui| {
                        if !value.editable {
                            return;
                        }
                        let mut action = value.action;
                        egui::ComboBox::from_id_salt(Id::new(("update_action", &value.path)))
                            .selected_text(action.to_string())
                            .show_ui(ui, |ui| {
                                for x in Action::iter() {
                                    ui.selectable_value(&mut action, x, x.to_string());
                                }
                            });
                        if action != value.action {
                            changed.push((value.path.clone(), action));
                        }
                    });
                    row.col(|ui| {
                        ui.label(&value.version);
                    });
                    row.col(|ui| {
                        ui.label(&value.files);
                    });
                });
            });

        for (path, action) in changed {
            if !self.model.set_action(&path, action) {
                self.status = format!("{action} is not possible here");
            }
        }
    }
}

fn state_color(state: State) -> Color32 {
    match state {
        State::NotAvailable => Color32::GRAY,
        State::NotInstalled => Color32::LIGHT_GRAY,
        State::UpdateAvailable => Color32::YELLOW,
        State::Actual => Color32::GREEN,
    }
}
