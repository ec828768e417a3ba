use std::collections::BTreeMap;
use std::path::Path;

use crate::color::ColorMap;
use crate::dashboard::Dashboard;
use crate::data::filter::category_values;
use crate::data::loader::load_file;
use crate::data::model::{Dataset, SemanticType};
use crate::error::FilterError;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Dataset, filters and the derived charts.
    pub dashboard: Dashboard,

    /// Bar colours per category column.
    pub color_maps: BTreeMap<String, ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Ingest a newly loaded dataset: fresh filters, fresh colours.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.color_maps = dataset
            .columns_of(SemanticType::Category)
            .map(|col| {
                let values = category_values(&dataset.rows, col);
                (col.to_string(), ColorMap::new(&values))
            })
            .collect();

        self.dashboard.load(dataset);
        self.status_message = None;
    }

    /// Load a file; a failure becomes the status message.
    pub fn open_path(&mut self, path: &Path) {
        match load_file(path) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(e.to_string());
            }
        }
    }

    /// Forget the current dataset ("upload new file").
    pub fn reset(&mut self) {
        self.dashboard.reset();
        self.color_maps.clear();
        self.status_message = None;
    }

    /// Surface a rejected filter edit in the status line.
    pub fn report(&mut self, result: Result<(), FilterError>) {
        match result {
            Ok(()) => self.status_message = None,
            Err(e) => self.status_message = Some(format!("Filter error: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn failed_load_keeps_message_and_no_dataset() {
        let mut state = AppState::default();
        state.open_path(Path::new("data.txt"));
        assert!(state.dashboard.dataset().is_none());
        assert!(state
            .status_message
            .as_deref()
            .is_some_and(|m| m.contains("CSV or Excel")));
    }

    #[test]
    fn load_then_reset() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "fruit,weight\napple,1\npear,2").unwrap();
        file.flush().unwrap();

        let mut state = AppState::default();
        state.open_path(file.path());
        assert_eq!(state.dashboard.snapshot().unwrap().total_rows, 2);
        assert!(state.color_maps.contains_key("fruit"));
        assert!(state.status_message.is_none());

        state.reset();
        assert!(state.dashboard.snapshot().is_none());
        assert!(state.color_maps.is_empty());
    }
}
