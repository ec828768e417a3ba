//! Chart-ready aggregates of one column over a set of rows.

use std::collections::BTreeMap;

use serde::Serialize;

use super::model::{cell, Row, SemanticType};

/// Most frequent category values kept in a category summary.
pub const CATEGORY_LIMIT: usize = 10;

/// Separators that end the date part of a date-time string.
const TIME_SEPARATORS: [char; 2] = ['T', ' '];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberPoint {
    /// 1-based position in the filtered rows.
    pub index: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateCount {
    pub date: String,
    pub count: usize,
}

/// What a chart for one column should draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "points", rename_all = "snake_case")]
pub enum ChartSummary {
    Category(Vec<CategoryCount>),
    Number(Vec<NumberPoint>),
    Date(Vec<DateCount>),
    /// Nothing to plot; shown as "No data available".
    NoData,
}

impl ChartSummary {
    pub fn len(&self) -> usize {
        match self {
            ChartSummary::Category(v) => v.len(),
            ChartSummary::Number(v) => v.len(),
            ChartSummary::Date(v) => v.len(),
            ChartSummary::NoData => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Summarize `column` of `rows` according to its semantic type.
pub fn summarize<'a, I>(column: &str, semantic_type: SemanticType, rows: I) -> ChartSummary
where
    I: IntoIterator<Item = &'a Row>,
{
    let summary = match semantic_type {
        SemanticType::Category => ChartSummary::Category(category_counts(column, rows)),
        SemanticType::Number => ChartSummary::Number(number_series(column, rows)),
        SemanticType::Date => ChartSummary::Date(date_counts(column, rows)),
        SemanticType::Unknown => ChartSummary::NoData,
    };
    if summary.is_empty() {
        ChartSummary::NoData
    } else {
        summary
    }
}

/// Count per value, descending; ties keep ascending value order.
fn category_counts<'a>(column: &str, rows: impl IntoIterator<Item = &'a Row>) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows {
        let value = cell(row, column);
        if !value.has_value() {
            continue;
        }
        if let Some(text) = value.as_text() {
            *counts.entry(text.into_owned()).or_default() += 1;
        }
    }

    let mut out: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(name, count)| CategoryCount { name, count })
        .collect();
    // stable sort over the BTreeMap order
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out.truncate(CATEGORY_LIMIT);
    out
}

/// One point per row; values that do not parse plot as zero.
fn number_series<'a>(column: &str, rows: impl IntoIterator<Item = &'a Row>) -> Vec<NumberPoint> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| NumberPoint {
            index: i + 1,
            value: cell(row, column).parse_number().unwrap_or(0.0),
        })
        .collect()
}

fn date_counts<'a>(column: &str, rows: impl IntoIterator<Item = &'a Row>) -> Vec<DateCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows {
        let value = cell(row, column);
        if !value.is_truthy() {
            continue;
        }
        if let Some(text) = value.as_text() {
            *counts.entry(date_key(&text).to_string()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(date, count)| DateCount { date, count })
        .collect()
}

/// Date part of a date-time string: everything before the first time
/// separator.
pub fn date_key(raw: &str) -> &str {
    let raw = raw.trim();
    raw.split(&TIME_SEPARATORS[..]).next().unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    fn rows(column: &str, values: &[&str]) -> Vec<Row> {
        values
            .iter()
            .map(|v| Row::from([(column.to_string(), CellValue::from(*v))]))
            .collect()
    }

    #[test]
    fn category_counts_sorted_by_frequency() {
        let data = rows("c", &["x", "x", "y"]);
        assert_eq!(
            summarize("c", SemanticType::Category, &data),
            ChartSummary::Category(vec![
                CategoryCount { name: "x".into(), count: 2 },
                CategoryCount { name: "y".into(), count: 1 },
            ])
        );
    }

    #[test]
    fn category_summary_keeps_top_ten_with_value_tie_break() {
        let mut values = Vec::new();
        for (i, name) in ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l"]
            .iter()
            .enumerate()
        {
            // "l" appears 3 times, "k" twice, the rest once
            let times = if i == 11 { 3 } else if i == 10 { 2 } else { 1 };
            values.extend(std::iter::repeat(*name).take(times));
        }
        values.push("");
        let data = rows("c", &values);

        let ChartSummary::Category(counts) = summarize("c", SemanticType::Category, &data) else {
            panic!("expected a category summary");
        };
        assert_eq!(counts.len(), CATEGORY_LIMIT);
        assert_eq!(counts[0].name, "l");
        assert_eq!(counts[1].name, "k");
        let tail: Vec<&str> = counts[2..].iter().map(|c| c.name.as_str()).collect();
        assert_eq!(tail, vec!["a", "b", "c", "d", "e", "f", "g", "h"]);
        assert!(counts.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn false_and_zero_are_counted_as_categories() {
        let flags: Vec<Row> = [true, false, false]
            .iter()
            .map(|b| Row::from([("paid".to_string(), CellValue::Bool(*b))]))
            .collect();
        assert_eq!(
            summarize("paid", SemanticType::Category, &flags),
            ChartSummary::Category(vec![
                CategoryCount { name: "false".into(), count: 2 },
                CategoryCount { name: "true".into(), count: 1 },
            ])
        );

        let codes: Vec<Row> = [0.0, 1.0, 0.0]
            .iter()
            .map(|n| Row::from([("code".to_string(), CellValue::Number(*n))]))
            .collect();
        assert_eq!(
            summarize("code", SemanticType::Category, &codes),
            ChartSummary::Category(vec![
                CategoryCount { name: "0".into(), count: 2 },
                CategoryCount { name: "1".into(), count: 1 },
            ])
        );
    }

    #[test]
    fn number_series_keeps_every_row() {
        let data = rows("n", &["1.5", "bad", "", "4"]);
        assert_eq!(
            summarize("n", SemanticType::Number, &data),
            ChartSummary::Number(vec![
                NumberPoint { index: 1, value: 1.5 },
                NumberPoint { index: 2, value: 0.0 },
                NumberPoint { index: 3, value: 0.0 },
                NumberPoint { index: 4, value: 4.0 },
            ])
        );
    }

    #[test]
    fn date_counts_bucket_by_day() {
        let data = rows(
            "d",
            &["2024-01-02T10:00", "2024-01-01T09:00", "", "2024-01-02T11:00"],
        );
        assert_eq!(
            summarize("d", SemanticType::Date, &data),
            ChartSummary::Date(vec![
                DateCount { date: "2024-01-01".into(), count: 1 },
                DateCount { date: "2024-01-02".into(), count: 2 },
            ])
        );
    }

    #[test]
    fn date_key_stops_at_either_separator() {
        assert_eq!(date_key("2024-03-05T12:00:00"), "2024-03-05");
        assert_eq!(date_key("2024-03-05 12:00:00"), "2024-03-05");
        assert_eq!(date_key("2024-03-05"), "2024-03-05");
        assert_eq!(date_key(" 2024-03-05T12:00"), "2024-03-05");
    }

    #[test]
    fn padded_dates_share_a_bucket() {
        let data = rows("d", &[" 2024-01-02T10:00", "2024-01-02 11:00:00"]);
        assert_eq!(
            summarize("d", SemanticType::Date, &data),
            ChartSummary::Date(vec![DateCount { date: "2024-01-02".into(), count: 2 }])
        );
    }

    #[test]
    fn empty_or_untyped_columns_have_no_data() {
        let empty: Vec<Row> = Vec::new();
        assert_eq!(summarize("n", SemanticType::Number, &empty), ChartSummary::NoData);
        let blanks = rows("c", &["", ""]);
        assert_eq!(summarize("c", SemanticType::Category, &blanks), ChartSummary::NoData);
        let data = rows("x", &["1"]);
        assert_eq!(summarize("x", SemanticType::Unknown, &data), ChartSummary::NoData);
    }

    #[test]
    fn summary_serializes_with_kind_tag() {
        let data = rows("c", &["x"]);
        let json = serde_json::to_value(summarize("c", SemanticType::Category, &data)).unwrap();
        assert_eq!(json["kind"], "category");
        assert_eq!(json["points"][0]["name"], "x");
        assert_eq!(serde_json::to_value(ChartSummary::NoData).unwrap()["kind"], "no_data");
    }
}
