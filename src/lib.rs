//! mtreport - does transmission type affect fuel efficiency?
//!
//! This library loads the 1974 Motor Trend road-test dataset (32 cars),
//! compares fuel efficiency between automatic and manual transmissions,
//! fits and selects ordinary least squares models for mpg, and renders the
//! findings as text, JSON, CSV or a self-contained HTML report.

pub mod annotate;
pub mod cli;
pub mod compare;
pub mod config;
pub mod csv_output;
pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod html_output;
pub mod json_output;
pub mod model;
pub mod pipeline;
pub mod summary;
pub mod text_output;

pub use error::{AnalysisError, Result};
