//! JSON output format for analysis reports
//!
//! The report is serialized as-is beneath a small versioned envelope. Values
//! that are undefined (standardized residuals at leverage 1) become `null`.

use crate::pipeline::AnalysisReport;
use serde::Serialize;

/// Root JSON output structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// Crate version that produced the report
    pub version: String,
    /// Format name
    pub format: String,
    /// Formula of the selected model, repeated for quick access
    pub selected_formula: String,
    #[serde(flatten)]
    pub report: &'a AnalysisReport,
}

impl<'a> JsonOutput<'a> {
    pub fn new(report: &'a AnalysisReport) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "mtreport-json-v1".to_string(),
            selected_formula: report.winner.formula.to_string(),
            report,
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
