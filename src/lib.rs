//! Open a tabular dataset and explore it as automatically generated,
//! filterable charts.
//!
//! The [`dashboard::Dashboard`] owns a loaded [`data::model::Dataset`] and
//! its [`data::filter::FilterState`]; every filter change re-derives one
//! [`data::summary::ChartSummary`] per column and pushes a snapshot to
//! subscribers. The egui front end in [`app`] and [`ui`] renders those
//! snapshots.

pub mod app;
pub mod cli;
pub mod color;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod state;
pub mod ui;
