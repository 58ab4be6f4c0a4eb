//! End-to-end analysis: load → annotate → summarize → fit → compare → diagnose
//!
//! Each stage consumes the previous stage's output by reference and builds
//! new values; nothing is mutated in place. Any stage error aborts the run.

use crate::annotate::{annotate, AnnotatedTable};
use crate::compare::{comparison_table, select_best, ComparisonRow};
use crate::config::AnalysisConfig;
use crate::dataset::{Column, Dataset};
use crate::diagnostics::{diagnose, Diagnostics};
use crate::error::{AnalysisError, Result};
use crate::model::{fit_models, CandidateModel, ModelSet};
use crate::summary::{summarize, DescriptiveSummary};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Plain-language findings about the transmission effect
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Narrative {
    pub model: String,
    pub formula: String,
    /// Estimated mpg difference, Manual minus Automatic, other terms held fixed
    pub manual_effect: f64,
    pub effect_ci_lower: f64,
    pub effect_ci_upper: f64,
    pub confidence_level: f64,
    pub transmission_p: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub baseline_effect: f64,
    pub baseline_r_squared: f64,
    pub paragraphs: Vec<String>,
}

/// Complete result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub observations: usize,
    pub config: AnalysisConfig,
    pub summary: DescriptiveSummary,
    pub models: ModelSet,
    pub comparison: Vec<ComparisonRow>,
    /// Index into `comparison` of the selected model
    pub selected: usize,
    pub winner: CandidateModel,
    pub diagnostics: Diagnostics,
    pub narrative: Narrative,
}

fn other_terms(winner: &CandidateModel) -> String {
    let names: Vec<&str> = winner
        .formula
        .terms()
        .iter()
        .filter(|t| **t != Column::Am)
        .map(|t| t.name())
        .collect();
    if names.is_empty() {
        "no other terms".to_string()
    } else {
        names.join(", ")
    }
}

fn build_narrative(
    summary: &DescriptiveSummary,
    models: &ModelSet,
    winner: &CandidateModel,
    confidence_level: f64,
) -> Result<Narrative> {
    let coefficient = winner.transmission()?;
    let baseline = models.baseline.transmission()?;

    let df = winner.fit.df_residual as f64;
    let critical = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| {
            AnalysisError::DegenerateData(format!("t distribution for '{}': {}", winner.name, e))
        })?
        .inverse_cdf(0.5 + confidence_level / 2.0);
    let effect_ci_lower = coefficient.estimate - critical * coefficient.std_error;
    let effect_ci_upper = coefficient.estimate + critical * coefficient.std_error;

    let welch = &summary.welch;
    let percent = confidence_level * 100.0;

    let paragraphs = vec![
        format!(
            "Manual cars average {:.2} mpg against {:.2} mpg for automatic cars. \
             A Welch two-sample t-test gives t = {:.3} on {:.2} df, p = {:.4}; \
             the {:.0}% interval for the automatic minus manual difference is \
             [{:.2}, {:.2}] mpg.",
            welch.second_mean,
            welch.first_mean,
            welch.statistic,
            welch.df,
            welch.pvalue,
            percent,
            welch.ci_lower,
            welch.ci_upper
        ),
        format!(
            "Transmission alone ({}) attributes {:.2} mpg to a manual gearbox but \
             explains only {:.1}% of the variance in fuel efficiency.",
            models.baseline.formula,
            baseline.estimate,
            models.baseline.fit.r_squared * 100.0
        ),
        format!(
            "The selected model is {} ({}). Holding {} fixed, a manual transmission \
             changes fuel efficiency by {:.2} mpg ({:.0}% CI [{:.2}, {:.2}], p = {:.4}).",
            winner.formula,
            winner.name,
            other_terms(winner),
            coefficient.estimate,
            percent,
            effect_ci_lower,
            effect_ci_upper,
            coefficient.p_value
        ),
        format!(
            "This model explains {:.1}% of the variance in mpg (adjusted R² {:.4}).",
            winner.fit.r_squared * 100.0,
            winner.fit.adj_r_squared
        ),
    ];

    Ok(Narrative {
        model: winner.name.clone(),
        formula: winner.formula.to_string(),
        manual_effect: coefficient.estimate,
        effect_ci_lower,
        effect_ci_upper,
        confidence_level,
        transmission_p: coefficient.p_value,
        r_squared: winner.fit.r_squared,
        adj_r_squared: winner.fit.adj_r_squared,
        baseline_effect: baseline.estimate,
        baseline_r_squared: models.baseline.fit.r_squared,
        paragraphs,
    })
}

/// Run every stage on an already annotated table
pub fn analyze_table(table: &AnnotatedTable, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate().map_err(AnalysisError::InvalidConfig)?;

    let summary = summarize(table, config.confidence_level)?;
    let models = fit_models(table, config)?;

    let compared = models.compared();
    let comparison = comparison_table(&compared)?;
    let selected = select_best(&comparison, config.significance_level).ok_or(
        AnalysisError::NoQualifyingModel {
            alpha: config.significance_level,
        },
    )?;
    let winner = compared[selected].clone();
    tracing::info!("Selected '{}' ({})", winner.name, winner.formula);

    let diagnostics = diagnose(&winner, table)?;
    let narrative = build_narrative(&summary, &models, &winner, config.confidence_level)?;

    Ok(AnalysisReport {
        observations: table.len(),
        config: config.clone(),
        summary,
        models,
        comparison,
        selected,
        winner,
        diagnostics,
        narrative,
    })
}

/// Run the full analysis on `dataset`
pub fn run_analysis(dataset: &Dataset, config: &AnalysisConfig) -> Result<AnalysisReport> {
    tracing::info!("Analyzing {} observations", dataset.len());
    let table = annotate(dataset)?;
    analyze_table(&table, config)
}
