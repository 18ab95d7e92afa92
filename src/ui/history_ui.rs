use egui::{CentralPanel, Context, TopBottomPanel};
use egui_extras::{Column, TableBuilder};

use crate::language::language_name;
use crate::{action, database::HistoryData};

#[derive(Default)]
pub struct HistoryUi {
    pub history_data: Vec<HistoryData>,
    pub open: bool,
    filter: String,
}

impl HistoryUi {
    pub fn toggle(&mut self, ctx: &Context) {
        self.open = !self.open;
        if self.open {
            action::refresh_history(ctx);
        }
    }

    pub fn show(&mut self, ctx: &Context) {
        let mut open = self.open;
        egui::Window::new("History")
            .open(&mut open)
            .default_size([640.0, 400.0])
            .show(ctx, |ui| {
                TopBottomPanel::top("history top panel")
                    .show_separator_line(false)
                    .show_inside(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.label("Filter:");
                            ui.text_edit_singleline(&mut self.filter);
                            if ui.button("Clear history").clicked() {
                                action::clear_history(ctx);
                            }
                        });
                    });
                CentralPanel::default().show_inside(ui, |ui| self.show_table(ui));
            });
        self.open = open;
    }

    fn filtered(&self) -> Vec<&HistoryData> {
        let filter = self.filter.to_lowercase();
        self.history_data
            .iter()
            .filter(|x| {
                filter.is_empty()
                    || x.recognized.to_lowercase().contains(&filter)
                    || x.translation
                        .as_ref()
                        .is_some_and(|t| t.to_lowercase().contains(&filter))
            })
            .collect()
    }

    fn show_table(&self, ui: &mut egui::Ui) {
        let rows = self.filtered();
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::remainder())
            .column(Column::remainder())
            .column(Column::auto())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.heading("Timestamp");
                });
                header.col(|ui| {
                    ui.heading("Language");
                });
                header.col(|ui| {
                    ui.heading("Recognized");
                });
                header.col(|ui| {
                    ui.heading("Translation");
                });
                header.col(|_| {});
            })
            .body(|body| {
                body.rows(30.0, rows.len(), |mut row| {
                    if let Some(value) = rows.get(row.index()) {
                        row.col(|ui| {
                            ui.label(&value.updated_at);
                        });
                        row.col(|ui| {
                            ui.label(language_name(&value.language));
                        });
                        row.col(|ui| {
                            ui.label(&value.recognized);
                        });
                        row.col(|ui| {
                            ui.label(value.translation.as_deref().unwrap_or_default());
                        });
                        row.col(|ui| {
                            if ui.button("Copy").clicked() {
                                ui.ctx().copy_text(history_text(value));
                            }
                        });
                    }
                });
            });
    }
}

fn history_text(value: &HistoryData) -> String {
    match &value.translation {
        Some(translation) if !translation.is_empty() => {
            format!("{}\n{}", value.recognized, translation)
        }
        _ => value.recognized.clone(),
    }
}
