// Bidirectional stepwise selection by AIC
//
// Every step evaluates dropping each droppable term and adding each term in
// scope that is not yet present; factors move as a whole. The move with the
// lowest AIC is taken when it beats the current model by more than
// AIC_TOLERANCE. Every term in the current model may be dropped.
//
// AIC strictly decreases along the path, so no model is visited twice and
// the search terminates; `max_steps` is a hard cap on top of that.

use super::design::DesignMatrix;
use super::formula::Formula;
use super::ols::{gaussian_aic, residual_sum_of_squares};
use crate::annotate::AnnotatedTable;
use crate::dataset::Column;
use crate::error::{AnalysisError, Result};
use nalgebra::DVector;
use serde::Serialize;

/// Minimum AIC improvement for a move to be taken
pub const AIC_TOLERANCE: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    Add,
    Remove,
}

impl std::fmt::Display for StepAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepAction::Add => write!(f, "+"),
            StepAction::Remove => write!(f, "-"),
        }
    }
}

/// One accepted move
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepwiseStep {
    pub action: StepAction,
    pub term: Column,
    /// AIC of the model after the move
    pub aic: f64,
}

/// Full search path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepwiseTrace {
    pub start: Formula,
    pub start_aic: f64,
    pub steps: Vec<StepwiseStep>,
    pub result: Formula,
    pub final_aic: f64,
    /// False when the search stopped on `max_steps` instead of converging
    pub converged: bool,
}

/// Search parameters
#[derive(Debug, Clone)]
pub struct StepwiseScope<'a> {
    /// Terms that may be added
    pub upper: &'a [Column],
    pub max_steps: usize,
}

fn formula_aic(table: &AnnotatedTable, formula: &Formula, y: &DVector<f64>) -> Result<Option<f64>> {
    let design = DesignMatrix::for_formula(table, formula)?;
    let all: Vec<usize> = (0..design.n_columns()).collect();
    Ok(residual_sum_of_squares(&design, &all, y)
        .map(|rss| gaussian_aic(rss, design.n_rows(), design.n_columns() + 1)))
}

/// Run the search from `start`
pub fn stepwise_aic(
    table: &AnnotatedTable,
    start: &Formula,
    scope: &StepwiseScope<'_>,
) -> Result<StepwiseTrace> {
    let y = DVector::from_vec(table.response());

    let start_aic = formula_aic(table, start, &y)?.ok_or_else(|| AnalysisError::RankDeficiency {
        model: start.to_string(),
        column: "(stepwise start)".to_string(),
    })?;

    let mut current = start.clone();
    let mut current_aic = start_aic;
    let mut steps = Vec::new();
    let mut converged = false;

    while steps.len() < scope.max_steps {
        let removals = current
            .terms()
            .iter()
            .map(|t| (StepAction::Remove, *t, current.without(*t)));
        let additions = scope
            .upper
            .iter()
            .filter(|t| !current.contains(**t))
            .map(|t| (StepAction::Add, *t, current.with(*t)));

        let mut best: Option<(StepAction, Column, Formula, f64)> = None;
        for (action, term, candidate) in removals.chain(additions) {
            let Some(aic) = formula_aic(table, &candidate, &y)? else {
                tracing::debug!("Stepwise: skipping rank-deficient {}", candidate);
                continue;
            };
            if best.as_ref().map_or(true, |b| aic < b.3) {
                best = Some((action, term, candidate, aic));
            }
        }

        match best {
            Some((action, term, candidate, aic)) if aic < current_aic - AIC_TOLERANCE => {
                tracing::debug!("Stepwise: {}{} → AIC {:.4}", action, term, aic);
                steps.push(StepwiseStep { action, term, aic });
                current = candidate;
                current_aic = aic;
            }
            _ => {
                converged = true;
                break;
            }
        }
    }

    if !converged {
        tracing::warn!(
            "Stepwise search stopped after {} steps without converging",
            steps.len()
        );
    }

    tracing::info!(
        "Stepwise selection: {} (AIC {:.4}, {} steps)",
        current,
        current_aic,
        steps.len()
    );

    Ok(StepwiseTrace {
        start: start.clone(),
        start_aic,
        steps,
        result: current,
        final_aic: current_aic,
        converged,
    })
}
