use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::UploadError;

// ---------------------------------------------------------------------------
// CellValue – a single cell of an uploaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as delivered by the upload payload.
///
/// Values are kept raw and interpreted on demand by each consumer, so the
/// filter engine and the summaries can apply their own parse policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Textual form used for equality filtering and category labels.
    /// `Null` has no text.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            CellValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            CellValue::Number(n) => Some(Cow::Owned(format_number(*n))),
            CellValue::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            CellValue::Null => None,
        }
    }

    /// Falsy values are `Null`, empty text, zero, NaN and `false`.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Bool(b) => *b,
            CellValue::Number(n) => *n != 0.0 && !n.is_nan(),
            CellValue::Text(s) => !s.is_empty(),
        }
    }

    /// Whether the cell holds anything at all: only `Null` and empty text
    /// are empty, so `false` and `0` are real category values.
    pub fn has_value(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Text(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Lenient numeric interpretation: text yields its leading numeric
    /// prefix, so `"15kg"` is 15 and `"kg"` is nothing.
    pub fn parse_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if !n.is_nan() => Some(*n),
            CellValue::Text(s) => parse_float_prefix(s),
            _ => None,
        }
    }

    /// Missing for schema inference purposes: null or blank text.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => write!(f, "{text}"),
            None => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// Integral floats print without a fractional part (`5` rather than `5.0`).
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Parse the longest prefix of `s` that forms a float literal, after
/// leading whitespace. Accepts an optional sign, `Infinity`, digits with an
/// optional fraction, and an exponent only when digits follow it.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        let negative = bytes.first() == Some(&b'-');
        return Some(if negative { f64::NEG_INFINITY } else { f64::INFINITY });
    }

    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// Semantic types and schema
// ---------------------------------------------------------------------------

/// How a column's values are interpreted for filtering and charting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SemanticType {
    Category,
    Number,
    Date,
    /// Any tag the upstream parser produced that we do not chart.
    Unknown,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Category => "category",
            SemanticType::Number => "number",
            SemanticType::Date => "date",
            SemanticType::Unknown => "unknown",
        }
    }
}

impl From<String> for SemanticType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "category" => SemanticType::Category,
            "number" => SemanticType::Number,
            "date" => SemanticType::Date,
            _ => SemanticType::Unknown,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column name → semantic type. Immutable once a dataset is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(BTreeMap<String, SemanticType>);

impl Schema {
    pub fn type_of(&self, column: &str) -> Option<SemanticType> {
        self.0.get(column).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SemanticType)> {
        self.0.iter().map(|(col, ty)| (col.as_str(), *ty))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, SemanticType)> for Schema {
    fn from_iter<T: IntoIterator<Item = (String, SemanticType)>>(iter: T) -> Self {
        Schema(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Row / Dataset
// ---------------------------------------------------------------------------

/// One record of the uploaded table: column name → raw value.
pub type Row = BTreeMap<String, CellValue>;

/// A fully materialized upload: the `{schema, data, columns}` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub schema: Schema,
    /// Rows in upload order.
    #[serde(rename = "data")]
    pub rows: Vec<Row>,
    /// Display order of the charts.
    pub columns: Vec<String>,
}

impl Dataset {
    /// Parse and validate an upload payload.
    pub fn from_json(text: &str) -> Result<Self, UploadError> {
        let dataset: Dataset = serde_json::from_str(text)
            .map_err(|e| UploadError::MalformedResponse(e.to_string()))?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Every display column must carry a schema type.
    pub fn validate(&self) -> Result<(), UploadError> {
        if let Some(col) = self.columns.iter().find(|c| !self.schema.contains(c)) {
            return Err(UploadError::MalformedResponse(format!(
                "column '{col}' has no schema entry"
            )));
        }
        Ok(())
    }

    /// Display columns of the given type, in display order.
    pub fn columns_of(&self, kind: SemanticType) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(move |col| self.schema.type_of(col) == Some(kind))
            .map(String::as_str)
    }

    /// Every schema column of the given type, display columns first in
    /// display order, then typed columns that are not displayed.
    pub fn filter_columns(&self, kind: SemanticType) -> impl Iterator<Item = &str> {
        let hidden = self
            .schema
            .iter()
            .filter(move |(col, ty)| *ty == kind && !self.columns.iter().any(|c| c == col))
            .map(|(col, _)| col);
        self.columns_of(kind).chain(hidden)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub(crate) static NULL_CELL: CellValue = CellValue::Null;

/// Cell lookup that treats an absent column as `Null`.
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a CellValue {
    row.get(column).unwrap_or(&NULL_CELL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_float_prefix_follows_leading_number() {
        assert_eq!(parse_float_prefix("5"), Some(5.0));
        assert_eq!(parse_float_prefix("  -2.5e3xyz"), Some(-2500.0));
        assert_eq!(parse_float_prefix("15kg"), Some(15.0));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("3e"), Some(3.0));
        assert_eq!(parse_float_prefix("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_float_prefix("bad"), None);
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("-"), None);
        assert_eq!(parse_float_prefix("."), None);
    }

    #[test]
    fn truthiness_matches_empty_and_zero() {
        assert!(!CellValue::Null.is_truthy());
        assert!(!CellValue::from("").is_truthy());
        assert!(!CellValue::Number(0.0).is_truthy());
        assert!(!CellValue::Bool(false).is_truthy());
        assert!(CellValue::from("0").is_truthy());
        assert!(CellValue::Number(3.0).is_truthy());
    }

    #[test]
    fn false_and_zero_still_have_a_value() {
        assert!(CellValue::Bool(false).has_value());
        assert!(CellValue::Number(0.0).has_value());
        assert!(CellValue::from(" ").has_value());
        assert!(!CellValue::from("").has_value());
        assert!(!CellValue::Null.has_value());
    }

    #[test]
    fn numbers_print_like_json() {
        assert_eq!(CellValue::Number(5.0).to_string(), "5");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Null.to_string(), "");
    }

    #[test]
    fn payload_deserializes_with_unknown_types() {
        let json = r#"{
            "schema": {"c": "category", "n": "number", "d": "date", "x": "boolean"},
            "data": [{"c": "a", "n": 1.5, "d": "2024-01-01", "x": null}],
            "columns": ["c", "n", "d", "x"]
        }"#;
        let ds = Dataset::from_json(json).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.schema.type_of("x"), Some(SemanticType::Unknown));
        assert_eq!(ds.rows[0]["n"], CellValue::Number(1.5));
        assert_eq!(ds.rows[0]["x"], CellValue::Null);
        assert_eq!(ds.columns_of(SemanticType::Number).collect::<Vec<_>>(), vec!["n"]);
    }

    #[test]
    fn filter_columns_include_typed_columns_not_displayed() {
        let json = r#"{
            "schema": {"b": "category", "a": "category", "z": "category", "n": "number"},
            "data": [{"a": "x", "b": "y", "z": "w", "n": 1}],
            "columns": ["b", "n", "a"]
        }"#;
        let ds = Dataset::from_json(json).unwrap();
        assert_eq!(
            ds.filter_columns(SemanticType::Category).collect::<Vec<_>>(),
            vec!["b", "a", "z"]
        );
        assert_eq!(ds.filter_columns(SemanticType::Number).collect::<Vec<_>>(), vec!["n"]);
        assert_eq!(ds.filter_columns(SemanticType::Date).count(), 0);
    }

    #[test]
    fn payload_with_unlisted_column_is_malformed() {
        let json = r#"{"schema": {}, "data": [], "columns": ["c"]}"#;
        let err = Dataset::from_json(json).unwrap_err();
        assert!(matches!(err, UploadError::MalformedResponse(_)));
    }
}
