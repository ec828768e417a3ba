use eframe::egui::{ScrollArea, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

use crate::color::{series_color, ColorMap};
use crate::dashboard::ColumnChart;
use crate::data::model::SemanticType;
use crate::data::summary::{CategoryCount, ChartSummary, DateCount, NumberPoint};
use crate::state::AppState;
use crate::ui::preview;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Chart grid (central panel)
// ---------------------------------------------------------------------------

/// Render one chart per display column, then the row preview.
pub fn chart_grid(ui: &mut Ui, state: &AppState) {
    let snapshot = match state.dashboard.snapshot() {
        Some(s) => s,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open or drop a CSV or Excel file to generate charts  (File → Open…)");
            });
            return;
        }
    };

    ui.heading("Data Visualization Dashboard");
    ui.label(format!(
        "Showing {} of {} records",
        snapshot.filtered_rows, snapshot.total_rows
    ));
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let n_cols = if ui.available_width() > 900.0 { 2 } else { 1 };
            ui.columns(n_cols, |cols: &mut [Ui]| {
                for (i, chart) in snapshot.charts.iter().enumerate() {
                    chart_card(&mut cols[i % n_cols], chart, state.color_maps.get(&chart.column));
                }
            });

            ui.separator();
            preview::preview_table(ui, &state.dashboard);
        });
}

fn chart_card(ui: &mut Ui, chart: &ColumnChart, colors: Option<&ColorMap>) {
    ui.group(|ui: &mut Ui| {
        ui.horizontal(|ui: &mut Ui| {
            ui.strong(&chart.column);
            ui.weak(format!("({})", chart.semantic_type));
        });
        match &chart.summary {
            ChartSummary::Category(counts) => category_chart(ui, &chart.column, counts, colors),
            ChartSummary::Number(points) => number_chart(ui, &chart.column, points),
            ChartSummary::Date(counts) => date_chart(ui, &chart.column, counts),
            ChartSummary::NoData => {
                ui.label("No data available");
            }
        }
    });
}

// -- Per-type charts --

fn category_chart(ui: &mut Ui, column: &str, counts: &[CategoryCount], colors: Option<&ColorMap>) {
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let fill = colors
                .map(|cm| cm.color_for(&c.name))
                .unwrap_or_else(|| series_color(SemanticType::Category));
            Bar::new(i as f64, c.count as f64).name(&c.name).fill(fill)
        })
        .collect();
    let labels: Vec<String> = counts.iter().map(|c| c.name.clone()).collect();

    Plot::new(("category_chart", column))
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .allow_drag(false)
        .x_axis_formatter(move |mark, _range| label_at(&labels, mark.value))
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Count"));
        });
}

fn number_chart(ui: &mut Ui, column: &str, points: &[NumberPoint]) {
    let line_points: PlotPoints = points
        .iter()
        .map(|p| [p.index as f64, p.value])
        .collect();

    Plot::new(("number_chart", column))
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .legend(Legend::default())
        .x_axis_label("Index")
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(line_points)
                    .name(column)
                    .color(series_color(SemanticType::Number))
                    .width(1.5),
            );
        });
}

fn date_chart(ui: &mut Ui, column: &str, counts: &[DateCount]) {
    let line_points: PlotPoints = counts
        .iter()
        .enumerate()
        .map(|(i, c)| [i as f64, c.count as f64])
        .collect();
    let labels: Vec<String> = counts.iter().map(|c| c.date.clone()).collect();

    Plot::new(("date_chart", column))
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .legend(Legend::default())
        .x_axis_formatter(move |mark, _range| label_at(&labels, mark.value))
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(line_points)
                    .name("Count")
                    .color(series_color(SemanticType::Date))
                    .width(1.5),
            );
        });
}

/// Axis label for a bucket position; blank between buckets.
fn label_at(labels: &[String], value: f64) -> String {
    let idx = value.round();
    if idx < 0.0 || (value - idx).abs() > 1e-6 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_only_on_bucket_positions() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(label_at(&labels, 1.0), "b");
        assert_eq!(label_at(&labels, 0.5), "");
        assert_eq!(label_at(&labels, -1.0), "");
        assert_eq!(label_at(&labels, 5.0), "");
    }
}
