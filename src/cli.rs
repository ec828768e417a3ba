//! Command line options.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::dashboard::Dashboard;
use crate::data::filter::{CategorySelection, NumericRange};

#[derive(Debug, Clone, Parser)]
#[command(name = "autochart", version, about = "Explore a CSV or Excel file as filterable charts")]
pub struct Args {
    /// Data file to open (.csv, .xlsx, .xls, .parquet, .json)
    pub file: Option<PathBuf>,

    /// Keep only rows whose category column equals a value (repeatable)
    #[arg(long = "where", value_name = "COLUMN=VALUE", value_parser = parse_category_filter)]
    pub category_filters: Vec<(String, String)>,

    /// Keep only rows whose numeric column lies in an inclusive range (repeatable)
    #[arg(long = "range", value_name = "COLUMN=MIN..MAX", value_parser = parse_range_filter)]
    pub range_filters: Vec<(String, NumericRange)>,

    /// Print the chart summaries as JSON instead of opening a window
    #[arg(long, requires = "file")]
    pub summary: bool,

    /// Indent the JSON output
    #[arg(long, requires = "summary")]
    pub pretty: bool,
}

impl Args {
    /// Apply the command line filters to a loaded dashboard.
    pub fn apply_filters(&self, dashboard: &mut Dashboard) -> Result<()> {
        for (column, value) in &self.category_filters {
            dashboard
                .set_category_filter(column, CategorySelection::from_choice(value))
                .with_context(|| format!("--where {column}={value}"))?;
        }
        for (column, range) in &self.range_filters {
            dashboard
                .set_numeric_filter(column, *range)
                .with_context(|| format!("--range {column}={}..{}", range.min, range.max))?;
        }
        Ok(())
    }
}

fn split_assignment(s: &str) -> Result<(&str, &str), String> {
    match s.split_once('=') {
        Some((column, value)) if !column.is_empty() => Ok((column, value)),
        _ => Err(format!("expected COLUMN=..., got '{s}'")),
    }
}

fn parse_category_filter(s: &str) -> Result<(String, String), String> {
    let (column, value) = split_assignment(s)?;
    Ok((column.to_string(), value.to_string()))
}

fn parse_range_filter(s: &str) -> Result<(String, NumericRange), String> {
    let (column, range) = split_assignment(s)?;
    let (min, max) = range
        .split_once("..")
        .ok_or_else(|| format!("expected MIN..MAX, got '{range}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|_| format!("'{v}' is not a number"))
    };
    Ok((column.to_string(), NumericRange::new(parse(min)?, parse(max)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_filters() {
        let args = Args::try_parse_from([
            "autochart",
            "sales.csv",
            "--where",
            "region=north",
            "--range",
            "units=-1.5..10",
            "--summary",
        ])
        .unwrap();
        assert_eq!(args.file, Some(PathBuf::from("sales.csv")));
        assert_eq!(args.category_filters, vec![("region".to_string(), "north".to_string())]);
        assert_eq!(
            args.range_filters,
            vec![("units".to_string(), NumericRange::new(-1.5, 10.0))]
        );
        assert!(args.summary);
        assert!(!args.pretty);
    }

    #[test]
    fn rejects_malformed_filters() {
        assert!(parse_range_filter("units=1-10").is_err());
        assert!(parse_range_filter("units=a..2").is_err());
        assert!(parse_category_filter("=x").is_err());
        assert!(Args::try_parse_from(["autochart", "--summary"]).is_err());
    }
}
