//! Schema inference for freshly read tables.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::model::{CellValue, Dataset, Row, SemanticType, NULL_CELL};
use crate::error::UploadError;

/// Date-time layouts recognised in text cells, most specific first.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Canonical text form of a date cell.
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A table as read from a file, before any typing.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    /// Row-major cells; rows may be shorter than `headers`.
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    fn column(&self, idx: usize) -> impl Iterator<Item = &CellValue> + Clone {
        self.rows
            .iter()
            .map(move |r| r.get(idx).unwrap_or(&NULL_CELL))
    }
}

/// Infer a type per column, normalise values and build the dataset.
///
/// Number columns hold numbers, date columns hold ISO date-time text, and
/// missing cells become empty text in every column.
pub fn build_dataset(mut table: RawTable) -> Result<Dataset, UploadError> {
    if table.headers.is_empty() || table.rows.is_empty() {
        return Err(UploadError::EmptyFile);
    }
    table.headers = unique_headers(&table.headers);

    let types: Vec<SemanticType> = (0..table.headers.len())
        .map(|idx| detect_column_type(table.column(idx)))
        .collect();

    let rows: Vec<Row> = table
        .rows
        .iter()
        .map(|raw| {
            table
                .headers
                .iter()
                .zip(&types)
                .enumerate()
                .map(|(idx, (header, ty))| {
                    let value = raw.get(idx).unwrap_or(&NULL_CELL);
                    (header.clone(), normalize(value, *ty))
                })
                .collect()
        })
        .collect();

    let schema = table.headers.iter().cloned().zip(types).collect();
    let dataset = Dataset {
        schema,
        rows,
        columns: table.headers,
    };
    dataset.validate()?;
    Ok(dataset)
}

/// Blank headers become `column_N` and repeats get a `.N` suffix, so every
/// column keeps its own key.
fn unique_headers(headers: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let base = match header.trim() {
                "" => format!("column_{}", idx + 1),
                h => h.to_string(),
            };
            let mut name = base.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                name = format!("{base}.{n}");
                n += 1;
            }
            name
        })
        .collect()
}

/// `number` when every present cell is numeric (or nothing is present),
/// `date` when every present cell is a date, `category` otherwise.
pub fn detect_column_type<'a>(cells: impl Iterator<Item = &'a CellValue> + Clone) -> SemanticType {
    let mut present = cells.filter(|c| !c.is_missing());
    if present.clone().all(|c| strict_number(c).is_some()) {
        return SemanticType::Number;
    }
    if present.all(|c| parse_datetime(c).is_some()) {
        return SemanticType::Date;
    }
    SemanticType::Category
}

fn normalize(value: &CellValue, ty: SemanticType) -> CellValue {
    if value.is_missing() {
        return CellValue::Text(String::new());
    }
    match ty {
        SemanticType::Number => strict_number(value)
            .map(CellValue::Number)
            .unwrap_or_else(|| value.clone()),
        SemanticType::Date => parse_datetime(value)
            .map(|dt| CellValue::Text(dt.format(ISO_FORMAT).to_string()))
            .unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}

/// Whole-cell numeric parse. Unlike [`CellValue::parse_number`] trailing
/// text disqualifies the cell.
fn strict_number(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn parse_datetime(value: &CellValue) -> Option<NaiveDateTime> {
    let CellValue::Text(s) = value else {
        return None;
    };
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
