use std::path::Path;

use anyhow::{anyhow, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use calamine::{open_workbook_auto, Data, DataType as _, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::infer::{build_dataset, RawTable};
use super::model::{CellValue, Dataset};
use crate::error::UploadError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`                          – header row, one record per line
/// * `.xlsx` / `.xls` / `.xlsm` / `.xlsb` – first worksheet, header row first
/// * `.parquet`                      – flat columns
/// * `.json`                         – a ready `{schema, data, columns}` payload
///
/// Everything except JSON goes through schema inference.
pub fn load_file(path: &Path) -> Result<Dataset, UploadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => read_csv(path),
        "xlsx" | "xls" | "xlsm" | "xlsb" => read_excel(path),
        "parquet" | "pq" => read_parquet(path),
        "json" => return load_json(path),
        other => return Err(UploadError::UnsupportedFileType(other.to_string())),
    }
    .map_err(|e| UploadError::Processing(format!("{e:#}")))?;

    log::debug!(
        "Read {} rows x {} columns from {}",
        table.rows.len(),
        table.headers.len(),
        path.display()
    );
    build_dataset(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON layout (the parsing service response):
///
/// ```json
/// {
///   "schema":  { "region": "category", "units": "number", "day": "date" },
///   "data":    [ { "region": "north", "units": 3, "day": "2024-01-02T00:00:00" } ],
///   "columns": [ "region", "units", "day" ]
/// }
/// ```
fn load_json(path: &Path) -> Result<Dataset, UploadError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| UploadError::Processing(format!("reading JSON file: {e}")))?;
    let dataset = Dataset::from_json(&text)?;
    if dataset.is_empty() {
        return Err(UploadError::EmptyFile);
    }
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Every cell is read as text; empty cells are missing.
fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(csv_cell).collect());
    }

    Ok(RawTable { headers, rows })
}

fn csv_cell(s: &str) -> CellValue {
    if s.is_empty() {
        CellValue::Null
    } else {
        CellValue::Text(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

/// Read the first worksheet; its first row holds the headers.
fn read_excel(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path).map_err(|e| anyhow!("opening workbook: {e}"))?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .map_err(|e| anyhow!("reading first worksheet: {e}"))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(RawTable::default());
    };
    let headers = header_row
        .iter()
        .map(|c| c.as_string().unwrap_or_else(|| c.to_string()))
        .collect();
    let rows = rows.map(|r| r.iter().map(excel_cell).collect()).collect();

    Ok(RawTable { headers, rows })
}

fn excel_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            CellValue::Text(s.clone())
        }
        // Excel serial dates
        other => other
            .as_datetime()
            .map(|dt| CellValue::Text(dt.format("%Y-%m-%dT%H:%M:%S").to_string()))
            .unwrap_or(CellValue::Null),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file.
///
/// Strings and booleans are read as is, every numeric type is read as
/// Float64, and anything else (dates, timestamps, decimals...) is cast to
/// its textual form and left to schema inference.
fn read_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch
            .columns()
            .iter()
            .zip(&headers)
            .map(|(col, name)| {
                readable_column(col).with_context(|| format!("converting column '{name}'"))
            })
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            rows.push(columns.iter().map(|col| extract_cell(col, row)).collect());
        }
    }

    Ok(RawTable { headers, rows })
}

// -- Parquet / Arrow helpers --

/// Bring a column to one of the types [`extract_cell`] understands.
fn readable_column(col: &ArrayRef) -> Result<ArrayRef> {
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Boolean | DataType::Float64 => {
            Ok(col.clone())
        }
        dt if dt.is_numeric() => Ok(cast(col, &DataType::Float64)?),
        _ => Ok(cast(col, &DataType::Utf8)?),
    }
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Float64 => CellValue::Number(col.as_primitive::<Float64Type>().value(row)),
        _ => CellValue::Null,
    }
}
