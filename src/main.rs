use anyhow::{anyhow, Context, Result};
use clap::Parser;
use eframe::egui;

use autochart::app::DashboardApp;
use autochart::cli::Args;
use autochart::dashboard::{Dashboard, Snapshot};
use autochart::data::loader::load_file;
use autochart::state::AppState;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.summary {
        return print_summary(&args);
    }

    let mut state = AppState::default();
    state.dashboard.subscribe(log_snapshot);
    if let Some(path) = &args.file {
        state.open_path(path);
        if state.dashboard.dataset().is_some() {
            args.apply_filters(&mut state.dashboard)?;
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Autochart – Data Visualization Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow!("running UI: {e}"))
}

/// Headless mode: load, filter and print the snapshot as JSON.
fn print_summary(args: &Args) -> Result<()> {
    let path = args.file.as_deref().context("--summary needs a data file")?;
    let dataset = load_file(path).with_context(|| format!("loading {}", path.display()))?;

    let mut dashboard = Dashboard::new();
    dashboard.load(dataset);
    args.apply_filters(&mut dashboard)?;

    let snapshot = dashboard.snapshot().context("dataset vanished after load")?;
    let json = if args.pretty {
        serde_json::to_string_pretty(snapshot)?
    } else {
        serde_json::to_string(snapshot)?
    };
    println!("{json}");
    Ok(())
}

fn log_snapshot(snapshot: Option<&Snapshot>) {
    match snapshot {
        Some(s) => log::debug!(
            "Snapshot: {}/{} rows, {} charts",
            s.filtered_rows,
            s.total_rows,
            s.charts.len()
        ),
        None => log::debug!("Dataset discarded"),
    }
}
