use eframe::egui::{ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::dashboard::Dashboard;
use crate::data::model::{cell, Row};

/// Filtered rows shown under the charts.
pub const PREVIEW_ROWS: usize = 100;

/// Table of the first filtered rows, all display columns.
pub fn preview_table(ui: &mut Ui, dashboard: &Dashboard) {
    let Some(dataset) = dashboard.dataset() else {
        return;
    };
    let rows: Vec<&Row> = dashboard.visible_rows().take(PREVIEW_ROWS).collect();
    ui.strong(format!("First {} filtered rows", rows.len()));

    ScrollArea::horizontal()
        .id_salt("preview_table")
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .columns(
                    Column::auto().at_least(60.0).resizable(true),
                    dataset.columns.len(),
                )
                .header(20.0, |mut header| {
                    for col in &dataset.columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(col);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, rows.len(), |mut row| {
                        let record = rows[row.index()];
                        for col in &dataset.columns {
                            row.col(|ui: &mut Ui| {
                                ui.label(cell(record, col).to_string());
                            });
                        }
                    });
                });
        });
}
