use std::time::Instant;

use serde::Serialize;

use crate::data::filter::{self, Bound, CategorySelection, FilterState, NumericRange};
use crate::data::model::{Dataset, Row, SemanticType};
use crate::data::summary::{summarize, ChartSummary};
use crate::error::FilterError;

// ---------------------------------------------------------------------------
// Published snapshot
// ---------------------------------------------------------------------------

/// Chart data for one display column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnChart {
    pub column: String,
    pub semantic_type: SemanticType,
    pub summary: ChartSummary,
}

/// Everything the presentation layer needs after a recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub filtered_rows: usize,
    pub total_rows: usize,
    /// One entry per display column, in display order.
    pub charts: Vec<ColumnChart>,
}

/// Called after every recomputation; `None` once the dataset is discarded.
pub type Subscriber = Box<dyn FnMut(Option<&Snapshot>)>;

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// State tied to one loaded dataset. Dropped as a whole on reset.
struct Session {
    dataset: Dataset,
    filters: FilterState,
    /// Indices of rows passing the current filters.
    visible_indices: Vec<usize>,
    snapshot: Snapshot,
}

/// Owns the loaded dataset and its filters, and re-derives every chart
/// whenever either changes.
#[derive(Default)]
pub struct Dashboard {
    session: Option<Session>,
    subscribers: Vec<Subscriber>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for future snapshots.
    pub fn subscribe(&mut self, subscriber: impl FnMut(Option<&Snapshot>) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Replace the current dataset, starting with no filters.
    pub fn load(&mut self, dataset: Dataset) {
        log::info!(
            "Loaded {} rows with columns {:?}",
            dataset.len(),
            dataset.columns
        );
        let total = dataset.len();
        self.session = Some(Session {
            dataset,
            filters: FilterState::new(),
            visible_indices: (0..total).collect(),
            snapshot: Snapshot {
                filtered_rows: total,
                total_rows: total,
                charts: Vec::new(),
            },
        });
        self.recompute();
    }

    /// Discard the dataset and everything derived from it.
    pub fn reset(&mut self) {
        self.session = None;
        self.publish();
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.session.as_ref().map(|s| &s.dataset)
    }

    pub fn filters(&self) -> Option<&FilterState> {
        self.session.as_ref().map(|s| &s.filters)
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.session.as_ref().map(|s| &s.snapshot)
    }

    pub fn visible_indices(&self) -> &[usize] {
        self.session
            .as_ref()
            .map(|s| s.visible_indices.as_slice())
            .unwrap_or(&[])
    }

    /// Rows passing the current filters, in dataset order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        let rows = self.dataset().map(|ds| ds.rows.as_slice()).unwrap_or(&[]);
        self.visible_indices().iter().map(move |&i| &rows[i])
    }

    // -- Filter options, always over the unfiltered dataset --

    pub fn category_values(&self, column: &str) -> Vec<String> {
        self.dataset()
            .map(|ds| filter::category_values(&ds.rows, column))
            .unwrap_or_default()
    }

    pub fn numeric_range(&self, column: &str) -> Option<NumericRange> {
        self.dataset()
            .and_then(|ds| filter::numeric_range(&ds.rows, column))
    }

    // -- Filter mutations --

    pub fn set_category_filter(
        &mut self,
        column: &str,
        selection: CategorySelection,
    ) -> Result<(), FilterError> {
        self.update_filters(|ds, filters| filters.set_category(&ds.schema, column, selection))
    }

    pub fn set_numeric_filter(
        &mut self,
        column: &str,
        range: NumericRange,
    ) -> Result<(), FilterError> {
        self.update_filters(|ds, filters| filters.set_numeric(&ds.schema, column, range))
    }

    /// Edit one bound of a numeric filter, seeding the other bound from the
    /// column's observed range when the column had no filter yet.
    pub fn set_numeric_bound(
        &mut self,
        column: &str,
        bound: Bound,
        value: f64,
    ) -> Result<(), FilterError> {
        let observed = self.numeric_range(column);
        self.update_filters(|ds, filters| {
            filters.set_numeric_bound(&ds.schema, column, bound, value, observed)
        })
    }

    pub fn clear_numeric_filter(&mut self, column: &str) -> Result<(), FilterError> {
        self.update_filters(|_, filters| {
            filters.clear_numeric(column);
            Ok(())
        })
    }

    /// Drop every filter.
    pub fn reset_filters(&mut self) -> Result<(), FilterError> {
        self.update_filters(|_, filters| {
            filters.clear();
            Ok(())
        })
    }

    fn update_filters<F>(&mut self, edit: F) -> Result<(), FilterError>
    where
        F: FnOnce(&Dataset, &mut FilterState) -> Result<(), FilterError>,
    {
        let session = self.session.as_mut().ok_or(FilterError::NoDataset)?;
        if let Err(e) = edit(&session.dataset, &mut session.filters) {
            log::warn!("Rejected filter change: {e}");
            return Err(e);
        }
        self.recompute();
        Ok(())
    }

    /// Re-derive visible rows and every chart from scratch, then publish.
    fn recompute(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let started = Instant::now();
        let dataset = &session.dataset;

        session.visible_indices = filter::filtered_indices(dataset, &session.filters);
        let visible: Vec<&Row> = session
            .visible_indices
            .iter()
            .map(|&i| &dataset.rows[i])
            .collect();

        let charts = dataset
            .columns
            .iter()
            .map(|column| {
                let semantic_type = dataset
                    .schema
                    .type_of(column)
                    .unwrap_or(SemanticType::Unknown);
                ColumnChart {
                    column: column.clone(),
                    semantic_type,
                    summary: summarize(column, semantic_type, visible.iter().copied()),
                }
            })
            .collect();

        session.snapshot = Snapshot {
            filtered_rows: visible.len(),
            total_rows: dataset.len(),
            charts,
        };
        log::debug!(
            "Recomputed {} charts over {}/{} rows in {:?}",
            session.snapshot.charts.len(),
            session.snapshot.filtered_rows,
            session.snapshot.total_rows,
            started.elapsed()
        );
        self.publish();
    }

    fn publish(&mut self) {
        let snapshot = self.session.as_ref().map(|s| &s.snapshot);
        for subscriber in &mut self.subscribers {
            subscriber(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::data::model::CellValue;
    use crate::data::summary::{CategoryCount, DateCount};

    fn dataset() -> Dataset {
        let json = r#"{
            "schema": {"c": "category", "n": "number", "d": "date"},
            "data": [
                {"c": "x", "n": "5",   "d": "2024-01-02T10:00:00"},
                {"c": "y", "n": "bad", "d": "2024-01-01T09:00:00"},
                {"c": "x", "n": "15",  "d": "2024-01-02T11:00:00"}
            ],
            "columns": ["c", "n", "d"]
        }"#;
        Dataset::from_json(json).unwrap()
    }

    fn recorder(dashboard: &mut Dashboard) -> Rc<RefCell<Vec<Option<Snapshot>>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        dashboard.subscribe(move |snapshot| sink.borrow_mut().push(snapshot.cloned()));
        seen
    }

    #[test]
    fn load_publishes_unfiltered_snapshot() {
        let mut dashboard = Dashboard::new();
        let seen = recorder(&mut dashboard);
        dashboard.load(dataset());

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        let snapshot = seen[0].as_ref().unwrap();
        assert_eq!(snapshot.filtered_rows, 3);
        assert_eq!(snapshot.total_rows, 3);
        let columns: Vec<&str> = snapshot.charts.iter().map(|c| c.column.as_str()).collect();
        assert_eq!(columns, vec!["c", "n", "d"]);
        assert_eq!(
            snapshot.charts[2].summary,
            ChartSummary::Date(vec![
                DateCount { date: "2024-01-01".into(), count: 1 },
                DateCount { date: "2024-01-02".into(), count: 2 },
            ])
        );
    }

    #[test]
    fn every_filter_change_recomputes_all_charts() {
        let mut dashboard = Dashboard::new();
        dashboard.load(dataset());
        let seen = recorder(&mut dashboard);

        dashboard
            .set_numeric_filter("n", NumericRange::new(0.0, 10.0))
            .unwrap();
        let snapshot = dashboard.snapshot().unwrap();
        assert_eq!(snapshot.filtered_rows, 1);
        assert_eq!(dashboard.visible_indices(), &[0]);
        assert_eq!(
            snapshot.charts[0].summary,
            ChartSummary::Category(vec![CategoryCount { name: "x".into(), count: 1 }])
        );

        dashboard
            .set_category_filter("c", CategorySelection::from_choice("y"))
            .unwrap();
        assert_eq!(dashboard.snapshot().unwrap().filtered_rows, 0);
        assert!(dashboard
            .snapshot()
            .unwrap()
            .charts
            .iter()
            .all(|c| c.summary == ChartSummary::NoData));

        dashboard.reset_filters().unwrap();
        assert_eq!(dashboard.snapshot().unwrap().filtered_rows, 3);
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn rejected_filter_leaves_state_untouched() {
        let mut dashboard = Dashboard::new();
        assert_eq!(
            dashboard.set_category_filter("c", CategorySelection::All),
            Err(FilterError::NoDataset)
        );

        dashboard.load(dataset());
        let seen = recorder(&mut dashboard);
        assert!(dashboard
            .set_numeric_filter("c", NumericRange::new(0.0, 1.0))
            .is_err());
        assert!(seen.borrow().is_empty());
        assert!(dashboard.filters().unwrap().is_empty());
    }

    #[test]
    fn bound_edit_uses_observed_range() {
        let mut dashboard = Dashboard::new();
        dashboard.load(dataset());
        assert_eq!(
            dashboard.numeric_range("n"),
            Some(NumericRange::new(5.0, 15.0))
        );
        dashboard.set_numeric_bound("n", Bound::Min, 10.0).unwrap();
        assert_eq!(
            dashboard.filters().unwrap().numeric("n"),
            Some(NumericRange::new(10.0, 15.0))
        );
        let rows: Vec<&Row> = dashboard.visible_rows().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["n"], CellValue::from("15"));

        dashboard.clear_numeric_filter("n").unwrap();
        assert_eq!(dashboard.snapshot().unwrap().filtered_rows, 3);
    }

    #[test]
    fn filter_options_ignore_current_filters() {
        let mut dashboard = Dashboard::new();
        dashboard.load(dataset());
        dashboard
            .set_category_filter("c", CategorySelection::from_choice("x"))
            .unwrap();
        assert_eq!(dashboard.category_values("c"), vec!["x", "y"]);
    }

    #[test]
    fn reset_invalidates_everything() {
        let mut dashboard = Dashboard::new();
        dashboard.load(dataset());
        let seen = recorder(&mut dashboard);
        dashboard.reset();

        assert!(dashboard.snapshot().is_none());
        assert!(dashboard.dataset().is_none());
        assert!(dashboard.visible_indices().is_empty());
        assert_eq!(dashboard.visible_rows().count(), 0);
        assert_eq!(*seen.borrow(), vec![None::<Snapshot>]);
    }
}
