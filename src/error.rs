//! Error taxonomy for the analysis pipeline
//!
//! Every variant is fatal: the report is only rendered when all stages
//! succeed.

use thiserror::Error;

/// Errors raised by the analysis stages
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to load dataset: {0}")]
    DataLoad(String),

    #[error("Design matrix for '{model}' is rank deficient at column '{column}'")]
    RankDeficiency { model: String, column: String },

    #[error("Group '{group}' has {size} observation(s); at least 2 are required")]
    EmptyGroup { group: String, size: usize },

    #[error("Degenerate data: {0}")]
    DegenerateData(String),

    #[error("Model '{model}' has no coefficient named '{name}'")]
    MissingCoefficient { model: String, name: String },

    #[error("No candidate has a transmission coefficient with p < {alpha}")]
    NoQualifyingModel { alpha: f64 },

    #[error("Invalid model formula '{formula}': {reason}")]
    InvalidFormula { formula: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
