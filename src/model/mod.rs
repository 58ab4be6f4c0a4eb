// Regression model fitting for mpg
//
// Produces every candidate the report compares:
// - baseline   mpg ~ am
// - full       mpg ~ every other column
// - stepwise   bidirectional AIC search from the full model, am always kept
// - subsets    exhaustive best-subset search over the full design columns,
//              lifted back to whole terms at the adjusted-R² and Cp optima
// - configured extra formulas from AnalysisConfig
//
// All fits share one DesignMatrix encoding and one QR least-squares path.

pub mod design;
pub mod formula;
pub mod ols;
pub mod stepwise;
pub mod subset;

pub use design::{DesignColumn, DesignMatrix};
pub use formula::Formula;
pub use ols::{fit_ols, Coefficient, FTest, OlsFit, INTERCEPT};
pub use stepwise::{stepwise_aic, StepAction, StepwiseScope, StepwiseStep, StepwiseTrace};
pub use subset::{best_subsets, Criterion, SelectionResult, SubsetFit};

use crate::annotate::AnnotatedTable;
use crate::config::AnalysisConfig;
use crate::dataset::Column;
use crate::error::{AnalysisError, Result};
use serde::Serialize;

/// Design column holding the Manual-vs-Automatic effect
pub const TRANSMISSION_COEFFICIENT: &str = "amManual";

/// How a candidate was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    Baseline,
    Full,
    Stepwise,
    BestSubsetAdjR2,
    BestSubsetCp,
    Configured,
}

impl ModelRole {
    pub fn label(&self) -> &'static str {
        match self {
            ModelRole::Baseline => "baseline",
            ModelRole::Full => "full",
            ModelRole::Stepwise => "stepwise AIC",
            ModelRole::BestSubsetAdjR2 => "best subset (adjusted R²)",
            ModelRole::BestSubsetCp => "best subset (Cp)",
            ModelRole::Configured => "configured",
        }
    }
}

/// A fitted candidate model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateModel {
    pub name: String,
    pub role: ModelRole,
    pub formula: Formula,
    pub fit: OlsFit,
}

impl CandidateModel {
    /// Fit `formula` against `table`
    pub fn fit(
        table: &AnnotatedTable,
        name: impl Into<String>,
        role: ModelRole,
        formula: Formula,
    ) -> Result<Self> {
        let name = name.into();
        let design = DesignMatrix::for_formula(table, &formula)?;
        let fit = fit_ols(&name, &design, &table.response())?;
        Ok(Self {
            name,
            role,
            formula,
            fit,
        })
    }

    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.fit.coefficients.iter().find(|c| c.name == name)
    }

    /// The Manual-vs-Automatic coefficient
    pub fn transmission(&self) -> Result<&Coefficient> {
        self.coefficient(TRANSMISSION_COEFFICIENT)
            .ok_or_else(|| AnalysisError::MissingCoefficient {
                model: self.name.clone(),
                name: TRANSMISSION_COEFFICIENT.to_string(),
            })
    }
}

/// Every fitted model plus the search artefacts behind them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSet {
    pub baseline: CandidateModel,
    pub full: CandidateModel,
    pub stepwise: CandidateModel,
    pub stepwise_trace: StepwiseTrace,
    pub subset_adj_r2: CandidateModel,
    pub subset_cp: CandidateModel,
    pub subsets: SelectionResult,
    pub configured: Vec<CandidateModel>,
}

impl ModelSet {
    /// Candidates entering the comparison table, baseline excluded
    pub fn compared(&self) -> Vec<&CandidateModel> {
        [&self.full, &self.stepwise, &self.subset_adj_r2, &self.subset_cp]
            .into_iter()
            .chain(self.configured.iter())
            .collect()
    }

    /// Every candidate, baseline first
    pub fn all(&self) -> Vec<&CandidateModel> {
        std::iter::once(&self.baseline)
            .chain(self.compared())
            .collect()
    }
}

/// Whole-term formula for a subset of design columns
///
/// A factor enters when any of its indicators was selected. The transmission
/// term is added when the subset left it out.
pub fn lift_subset(design: &DesignMatrix, subset: &SubsetFit) -> Formula {
    with_transmission(
        Formula::new(design.terms_of(&subset.indices)),
        &format!("best subset of size {}", subset.size),
    )
}

/// `formula`, with the transmission term added when `source` dropped it
pub fn with_transmission(formula: Formula, source: &str) -> Formula {
    if formula.contains(Column::Am) {
        formula
    } else {
        tracing::warn!("The {} omits am; adding it to {}", source, formula);
        formula.with(Column::Am)
    }
}

fn parse_configured(text: &str) -> Result<Formula> {
    let formula = Formula::parse(text)?;
    if !formula.contains(Column::Am) {
        return Err(AnalysisError::InvalidFormula {
            formula: text.to_string(),
            reason: "candidate models must include am".to_string(),
        });
    }
    Ok(formula)
}

/// Fit every candidate
pub fn fit_models(table: &AnnotatedTable, config: &AnalysisConfig) -> Result<ModelSet> {
    let baseline = CandidateModel::fit(table, "Baseline", ModelRole::Baseline, Formula::baseline())?;
    let full = CandidateModel::fit(table, "Full", ModelRole::Full, Formula::full())?;

    let scope = StepwiseScope {
        upper: &Column::REGRESSORS,
        max_steps: config.max_stepwise_steps,
    };
    let stepwise_trace = stepwise_aic(table, &full.formula, &scope)?;
    let stepwise = CandidateModel::fit(
        table,
        "Stepwise AIC",
        ModelRole::Stepwise,
        with_transmission(stepwise_trace.result.clone(), "stepwise search"),
    )?;

    let full_design = DesignMatrix::for_formula(table, &full.formula)?;
    let subsets = best_subsets(&full_design, &table.response(), config.max_subset_size)?;
    let subset_adj_r2 = CandidateModel::fit(
        table,
        "Best subset (adjusted R²)",
        ModelRole::BestSubsetAdjR2,
        lift_subset(&full_design, subsets.best(Criterion::AdjR2)),
    )?;
    let subset_cp = CandidateModel::fit(
        table,
        "Best subset (Cp)",
        ModelRole::BestSubsetCp,
        lift_subset(&full_design, subsets.best(Criterion::Cp)),
    )?;

    let configured = config
        .extra_candidates
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let formula = parse_configured(text)?;
            CandidateModel::fit(
                table,
                format!("Configured #{}", i + 1),
                ModelRole::Configured,
                formula,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let set = ModelSet {
        baseline,
        full,
        stepwise,
        stepwise_trace,
        subset_adj_r2,
        subset_cp,
        subsets,
        configured,
    };

    for candidate in set.all() {
        candidate.transmission()?;
    }

    tracing::info!("Fitted {} candidate models", set.all().len());
    Ok(set)
}
