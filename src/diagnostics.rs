//! Residual diagnostics for the selected model
//!
//! Builds the data behind the four standard regression plots:
//!
//! 1. residuals vs fitted
//! 2. normal Q-Q of standardized residuals
//! 3. scale-location, sqrt(|standardized residual|) vs fitted
//! 4. standardized residuals vs leverage, with Cook's distance contours
//!
//! Standardized (internally studentized) residuals are
//! `r_i = e_i / (sigma * sqrt(1 - h_i))` and Cook's distance is
//! `D_i = r_i^2 * h_i / (p * (1 - h_i))`. Points with leverage 1 have no
//! defined standardized residual and carry NaN.

use crate::annotate::AnnotatedTable;
use crate::error::{AnalysisError, Result};
use crate::model::CandidateModel;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

/// Points labelled per plot
pub const LABELLED_POINTS: usize = 3;

/// Cook's distance levels drawn on the leverage plot
pub const COOK_LEVELS: [f64; 2] = [0.5, 1.0];

/// Per-observation diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationDiagnostics {
    pub label: String,
    pub fitted: f64,
    pub residual: f64,
    pub standardized_residual: f64,
    pub leverage: f64,
    pub cooks_distance: f64,
}

impl ObservationDiagnostics {
    pub fn sqrt_abs_standardized(&self) -> f64 {
        self.standardized_residual.abs().sqrt()
    }
}

/// One point of the normal Q-Q plot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QqPoint {
    pub label: String,
    pub theoretical: f64,
    pub sample: f64,
}

/// One Cook's distance contour, upper branch; the lower branch is its mirror
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CookContour {
    pub level: f64,
    /// (leverage, standardized residual) pairs
    pub points: Vec<(f64, f64)>,
}

/// Everything the diagnostic plots need
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub model: String,
    pub observations: Vec<ObservationDiagnostics>,
    pub qq: Vec<QqPoint>,
    pub cook_contours: Vec<CookContour>,
    /// Largest |residual|, used on the residuals vs fitted plot
    pub extreme_residuals: Vec<String>,
    /// Largest |standardized residual|, used on the Q-Q and scale-location plots
    pub extreme_standardized: Vec<String>,
    /// Largest Cook's distance, used on the leverage plot
    pub extreme_cooks: Vec<String>,
}

/// Plotting positions (i - a) / (n + 1 - 2a), a = 3/8 for n <= 10 else 1/2
pub fn plotting_positions(n: usize) -> Vec<f64> {
    let a = if n <= 10 { 3.0 / 8.0 } else { 0.5 };
    let denominator = n as f64 + 1.0 - 2.0 * a;
    (1..=n).map(|i| (i as f64 - a) / denominator).collect()
}

/// Labels of the `count` observations with the largest `key`
///
/// NaN keys sort last; ties keep row order.
fn most_extreme(
    observations: &[ObservationDiagnostics],
    count: usize,
    key: impl Fn(&ObservationDiagnostics) -> f64,
) -> Vec<String> {
    let mut order: Vec<usize> = (0..observations.len()).collect();
    order.sort_by(|&a, &b| {
        let (ka, kb) = (key(&observations[a]), key(&observations[b]));
        match (ka.is_nan(), kb.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => kb.total_cmp(&ka),
        }
    });
    order
        .into_iter()
        .take(count)
        .map(|i| observations[i].label.clone())
        .collect()
}

fn cook_contour(level: f64, n_params: usize, max_leverage: f64) -> CookContour {
    const STEPS: usize = 50;
    let p = n_params as f64;
    let upper = max_leverage.clamp(0.01, 0.99);
    let points = (1..=STEPS)
        .map(|i| {
            let h = upper * i as f64 / STEPS as f64;
            (h, (level * p * (1.0 - h) / h).sqrt())
        })
        .collect();
    CookContour { level, points }
}

/// Compute diagnostics for `model` fitted on `table`
pub fn diagnose(model: &CandidateModel, table: &AnnotatedTable) -> Result<Diagnostics> {
    let fit = &model.fit;
    if table.len() != fit.n {
        return Err(AnalysisError::DegenerateData(format!(
            "model '{}' was fitted on {} rows, table has {}",
            model.name,
            fit.n,
            table.len()
        )));
    }
    if fit.sigma <= 0.0 {
        return Err(AnalysisError::DegenerateData(format!(
            "model '{}' fits exactly; residual diagnostics are undefined",
            model.name
        )));
    }

    let p = fit.n_params as f64;
    let observations: Vec<ObservationDiagnostics> = table
        .records()
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let h = fit.leverage[i];
            let residual = fit.residuals[i];
            let (standardized_residual, cooks_distance) = if h < 1.0 {
                let r = residual / (fit.sigma * (1.0 - h).sqrt());
                (r, r * r * h / (p * (1.0 - h)))
            } else {
                (f64::NAN, f64::NAN)
            };
            ObservationDiagnostics {
                label: record.model.clone(),
                fitted: fit.fitted[i],
                residual,
                standardized_residual,
                leverage: h,
                cooks_distance,
            }
        })
        .collect();

    let mut sorted: Vec<&ObservationDiagnostics> = observations
        .iter()
        .filter(|o| o.standardized_residual.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.standardized_residual.total_cmp(&b.standardized_residual));
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AnalysisError::DegenerateData(format!("standard normal: {}", e)))?;
    let qq = plotting_positions(sorted.len())
        .into_iter()
        .zip(sorted)
        .map(|(position, o)| QqPoint {
            label: o.label.clone(),
            theoretical: normal.inverse_cdf(position),
            sample: o.standardized_residual,
        })
        .collect();

    let max_leverage = observations
        .iter()
        .map(|o| o.leverage)
        .fold(0.0, f64::max);
    let cook_contours = COOK_LEVELS
        .iter()
        .map(|level| cook_contour(*level, fit.n_params, max_leverage))
        .collect();

    let diagnostics = Diagnostics {
        model: model.name.clone(),
        extreme_residuals: most_extreme(&observations, LABELLED_POINTS, |o| o.residual.abs()),
        extreme_standardized: most_extreme(&observations, LABELLED_POINTS, |o| {
            o.standardized_residual.abs()
        }),
        extreme_cooks: most_extreme(&observations, LABELLED_POINTS, |o| o.cooks_distance),
        observations,
        qq,
        cook_contours,
    };

    tracing::debug!(
        "Diagnostics for '{}': most influential {:?}",
        diagnostics.model,
        diagnostics.extreme_cooks
    );

    Ok(diagnostics)
}
