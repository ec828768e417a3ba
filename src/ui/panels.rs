use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};

use crate::data::filter::{Bound, CategorySelection};
use crate::data::model::SemanticType;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.heading("Filters");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            let enabled = state.dashboard.dataset().is_some();
            if ui.add_enabled(enabled, egui::Button::new("Reset")).clicked() {
                let result = state.dashboard.reset_filters();
                state.report(result);
            }
        });
    });
    ui.separator();

    let dataset = match state.dashboard.dataset() {
        Some(ds) => ds,
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    // Clone what we need so we can mutate state inside the loop.
    let category_columns: Vec<String> = dataset
        .filter_columns(SemanticType::Category)
        .map(String::from)
        .collect();
    let numeric_columns: Vec<String> = dataset
        .filter_columns(SemanticType::Number)
        .map(String::from)
        .collect();

    if category_columns.is_empty() && numeric_columns.is_empty() {
        ui.label("No filters available");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if !category_columns.is_empty() {
                ui.strong("Categories");
                for col in &category_columns {
                    category_filter(ui, state, col);
                }
                ui.separator();
            }

            if !numeric_columns.is_empty() {
                ui.strong("Numeric ranges");
                for col in &numeric_columns {
                    numeric_filter(ui, state, col);
                }
            }
        });
}

/// Combo box with "All" plus every observed value of the column.
fn category_filter(ui: &mut Ui, state: &mut AppState, column: &str) {
    let current = state
        .dashboard
        .filters()
        .map(|f| f.category(column).clone())
        .unwrap_or_default();
    let selected_text = match &current {
        CategorySelection::All => "All".to_string(),
        CategorySelection::Value(v) => v.clone(),
    };
    let values = state.dashboard.category_values(column);

    let mut choice = None;
    ui.label(column);
    egui::ComboBox::from_id_salt(("category_filter", column))
        .selected_text(selected_text)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_all(), "All").clicked() {
                choice = Some(CategorySelection::All);
            }
            for value in &values {
                let is_selected = matches!(&current, CategorySelection::Value(v) if v == value);
                if ui.selectable_label(is_selected, value).clicked() {
                    choice = Some(CategorySelection::Value(value.clone()));
                }
            }
        });
    ui.add_space(4.0);

    if let Some(selection) = choice {
        let result = state.dashboard.set_category_filter(column, selection);
        state.report(result);
    }
}

/// Min / max inputs, showing the observed range until the user edits one.
fn numeric_filter(ui: &mut Ui, state: &mut AppState, column: &str) {
    ui.label(column);
    let Some(observed) = state.dashboard.numeric_range(column) else {
        ui.weak("no numeric values");
        return;
    };
    let current = state
        .dashboard
        .filters()
        .and_then(|f| f.numeric(column))
        .unwrap_or(observed);

    let speed = ((observed.max - observed.min) / 200.0).max(0.01);
    let (mut min, mut max) = (current.min, current.max);
    let mut edit = None;
    ui.horizontal(|ui: &mut Ui| {
        if ui
            .add(DragValue::new(&mut min).speed(speed).prefix("min "))
            .changed()
        {
            edit = Some((Bound::Min, min));
        }
        if ui
            .add(DragValue::new(&mut max).speed(speed).prefix("max "))
            .changed()
        {
            edit = Some((Bound::Max, max));
        }
    });
    ui.add_space(4.0);

    if let Some((bound, value)) = edit {
        let result = state.dashboard.set_numeric_bound(column, bound, value);
        state.report(result);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let loaded = state.dashboard.dataset().is_some();
            if ui
                .add_enabled(loaded, egui::Button::new("Upload new file"))
                .clicked()
            {
                state.reset();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(snapshot) = state.dashboard.snapshot() {
            ui.label(format!(
                "Showing {} of {} records",
                snapshot.filtered_rows, snapshot.total_rows
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open data file")
        .add_filter("Supported files", &["csv", "xlsx", "xls", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx", "xls", "xlsm", "xlsb"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}
