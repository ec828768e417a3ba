use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::model::{cell, Dataset, Row, Schema, SemanticType};
use crate::error::FilterError;

/// Textual sentinel meaning "no constraint" for a category column.
pub const ALL: &str = "all";

// ---------------------------------------------------------------------------
// Filter predicates
// ---------------------------------------------------------------------------

/// Selection for one category column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySelection {
    #[default]
    All,
    Value(String),
}

impl CategorySelection {
    /// Map a choice from a selection widget; [`ALL`] is the sentinel.
    pub fn from_choice(choice: &str) -> Self {
        if choice == ALL {
            CategorySelection::All
        } else {
            CategorySelection::Value(choice.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, CategorySelection::All)
    }

    fn accepts(&self, row: &Row, column: &str) -> bool {
        match self {
            CategorySelection::All => true,
            CategorySelection::Value(wanted) => cell(row, column)
                .as_text()
                .is_some_and(|text| text == wanted.as_str()),
        }
    }
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        NumericRange { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    fn accepts(&self, row: &Row, column: &str) -> bool {
        cell(row, column)
            .parse_number()
            .is_some_and(|v| self.contains(v))
    }
}

/// Which end of a [`NumericRange`] an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
}

// ---------------------------------------------------------------------------
// FilterState
// ---------------------------------------------------------------------------

/// Active per-column constraints.
///
/// Keys are only ever columns whose schema type matches the filter kind;
/// the setters reject anything else. A column that is absent carries no
/// constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    category: BTreeMap<String, CategorySelection>,
    numeric: BTreeMap<String, NumericRange>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no filter constrains any row.
    pub fn is_empty(&self) -> bool {
        self.numeric.is_empty() && self.category.values().all(CategorySelection::is_all)
    }

    pub fn category(&self, column: &str) -> &CategorySelection {
        static ALL_SELECTION: CategorySelection = CategorySelection::All;
        self.category.get(column).unwrap_or(&ALL_SELECTION)
    }

    pub fn numeric(&self, column: &str) -> Option<NumericRange> {
        self.numeric.get(column).copied()
    }

    pub fn set_category(
        &mut self,
        schema: &Schema,
        column: &str,
        selection: CategorySelection,
    ) -> Result<(), FilterError> {
        expect_type(schema, column, SemanticType::Category)?;
        self.category.insert(column.to_string(), selection);
        Ok(())
    }

    pub fn set_numeric(
        &mut self,
        schema: &Schema,
        column: &str,
        range: NumericRange,
    ) -> Result<(), FilterError> {
        expect_type(schema, column, SemanticType::Number)?;
        if range.min.is_nan() || range.max.is_nan() {
            return Err(FilterError::InvalidBound(column.to_string()));
        }
        self.numeric.insert(column.to_string(), range);
        Ok(())
    }

    /// Edit one bound. The other bound comes from the current filter, else
    /// from `observed`, else zero.
    pub fn set_numeric_bound(
        &mut self,
        schema: &Schema,
        column: &str,
        bound: Bound,
        value: f64,
        observed: Option<NumericRange>,
    ) -> Result<(), FilterError> {
        let mut range = self
            .numeric(column)
            .or(observed)
            .unwrap_or(NumericRange::new(0.0, 0.0));
        match bound {
            Bound::Min => range.min = value,
            Bound::Max => range.max = value,
        }
        self.set_numeric(schema, column, range)
    }

    pub fn clear_numeric(&mut self, column: &str) {
        self.numeric.remove(column);
    }

    /// Back to no constraints.
    pub fn clear(&mut self) {
        self.category.clear();
        self.numeric.clear();
    }

    /// Whether `row` passes every active filter.
    pub fn accepts(&self, row: &Row) -> bool {
        self.category
            .iter()
            .all(|(col, sel)| sel.accepts(row, col))
            && self
                .numeric
                .iter()
                .all(|(col, range)| range.accepts(row, col))
    }
}

fn expect_type(schema: &Schema, column: &str, expected: SemanticType) -> Result<(), FilterError> {
    match schema.type_of(column) {
        None => Err(FilterError::UnknownColumn(column.to_string())),
        Some(actual) if actual != expected => Err(FilterError::WrongType {
            column: column.to_string(),
            expected,
            actual,
        }),
        Some(_) => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Applying filters
// ---------------------------------------------------------------------------

/// Rows passing all active filters, in their original order.
pub fn apply<'a, I>(rows: I, filters: &FilterState) -> Vec<&'a Row>
where
    I: IntoIterator<Item = &'a Row>,
{
    rows.into_iter().filter(|row| filters.accepts(row)).collect()
}

/// Return indices of rows that pass all active filters.
pub fn filtered_indices(dataset: &Dataset, filters: &FilterState) -> Vec<usize> {
    if filters.is_empty() {
        return (0..dataset.len()).collect();
    }
    dataset
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| filters.accepts(row))
        .map(|(i, _)| i)
        .collect()
}

/// Distinct non-empty values of a category column, sorted ascending.
/// Pass the unfiltered rows: the options do not shrink as filters apply.
pub fn category_values(rows: &[Row], column: &str) -> Vec<String> {
    let values: BTreeSet<String> = rows
        .iter()
        .map(|row| cell(row, column))
        .filter(|v| v.has_value())
        .filter_map(|v| v.as_text().map(|t| t.into_owned()))
        .collect();
    values.into_iter().collect()
}

/// Observed range of the parseable values of a column, or `None` when no
/// value parses.
pub fn numeric_range(rows: &[Row], column: &str) -> Option<NumericRange> {
    rows.iter()
        .filter_map(|row| cell(row, column).parse_number())
        .fold(None, |acc: Option<NumericRange>, v| match acc {
            None => Some(NumericRange::new(v, v)),
            Some(r) => Some(NumericRange::new(r.min.min(v), r.max.max(v))),
        })
}
