// Analysis configuration
//
// Every knob the pipeline exposes. Loaded from TOML with `--config`, then
// overridden field by field from the command line.

use crate::error::{AnalysisError, Result};
use crate::model::formula::Formula;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the mtcars analysis
///
/// # Example
/// ```
/// use mtreport::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.significance_level, 0.05);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Alpha for the model selection rule
    ///
    /// A candidate qualifies only if its transmission coefficient has
    /// p < significance_level.
    pub significance_level: f64,

    /// Confidence level of the Welch interval (0.95 → 95% CI)
    pub confidence_level: f64,

    /// Largest subset size enumerated by best-subset search
    ///
    /// Clamped to the number of design columns (16 for the full model).
    /// The search is exhaustive, so cost grows combinatorially.
    pub max_subset_size: usize,

    /// Hard cap on stepwise moves
    pub max_stepwise_steps: usize,

    /// Additional formulas to fit and compare, e.g. `"mpg ~ wt + am"`
    pub extra_candidates: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            confidence_level: 0.95,
            max_subset_size: 10,
            max_stepwise_steps: 1000,
            extra_candidates: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Stricter selection (alpha 0.01, 99% intervals)
    pub fn strict() -> Self {
        Self {
            significance_level: 0.01,
            confidence_level: 0.99,
            ..Self::default()
        }
    }

    /// Looser selection (alpha 0.10, 90% intervals)
    pub fn permissive() -> Self {
        Self {
            significance_level: 0.10,
            confidence_level: 0.90,
            ..Self::default()
        }
    }

    /// Load from a TOML file; absent fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AnalysisError::InvalidConfig(format!("failed to parse TOML: {}", e)))?;
        config.validate().map_err(AnalysisError::InvalidConfig)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            ));
        }

        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            ));
        }

        if self.max_subset_size == 0 {
            return Err("max_subset_size must be >= 1".to_string());
        }

        if self.max_stepwise_steps == 0 {
            return Err("max_stepwise_steps must be >= 1".to_string());
        }

        for text in &self.extra_candidates {
            Formula::parse(text).map_err(|e| e.to_string())?;
        }

        Ok(())
    }
}
