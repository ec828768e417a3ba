/// Data layer: core types, loading, filtering and summaries.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read file → RawTable  (infer: type columns → Dataset)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  {schema, data, columns}
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterState → filtered rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  summary  │  per column + semantic type → ChartSummary
///   └──────────┘
/// ```

pub mod filter;
pub mod infer;
pub mod loader;
pub mod model;
pub mod summary;
