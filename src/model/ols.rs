// Ordinary least squares via Householder QR
//
// X = QR with thin Q (n x p) and upper-triangular R (p x p):
//   beta       = R^-1 Q^T y
//   (X^T X)^-1 = R^-1 R^-T
//   leverage_i = ||Q_i||^2
//
// A column is declared aliased when |R_jj| <= RANK_TOLERANCE * max |R_kk|.
// Without pivoting, the first such j is the first column that is a linear
// combination of the columns before it.

use super::design::DesignMatrix;
use crate::error::{AnalysisError, Result};
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use std::f64::consts::PI;

/// Relative tolerance on the R diagonal
pub const RANK_TOLERANCE: f64 = 1e-7;

/// Name of the intercept coefficient
pub const INTERCEPT: &str = "(Intercept)";

/// One row of a coefficient table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

/// Overall F test against the intercept-only model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FTest {
    pub statistic: f64,
    pub df_model: usize,
    pub df_residual: usize,
    pub p_value: f64,
}

/// Everything derived from one least-squares fit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OlsFit {
    pub coefficients: Vec<Coefficient>,
    pub n: usize,
    /// Parameters including the intercept
    pub n_params: usize,
    pub df_residual: usize,
    pub rss: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    /// Residual standard error
    pub sigma: f64,
    pub f_test: Option<FTest>,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
    pub leverage: Vec<f64>,
}

/// Gaussian log-likelihood at the ML variance estimate rss / n
pub fn gaussian_log_likelihood(rss: f64, n: usize) -> f64 {
    let n = n as f64;
    -0.5 * n * ((2.0 * PI).ln() + (rss / n).ln() + 1.0)
}

/// AIC = 2k - 2 logLik, k counting the coefficients and the variance
pub fn gaussian_aic(rss: f64, n: usize, n_params: usize) -> f64 {
    2.0 * (n_params + 1) as f64 - 2.0 * gaussian_log_likelihood(rss, n)
}

/// BIC = k ln(n) - 2 logLik, k counting the coefficients and the variance
pub fn gaussian_bic(rss: f64, n: usize, n_params: usize) -> f64 {
    (n as f64).ln() * (n_params + 1) as f64 - 2.0 * gaussian_log_likelihood(rss, n)
}

struct Decomposition {
    q: DMatrix<f64>,
    r: DMatrix<f64>,
}

/// QR with the rank check; `Err(j)` names the first aliased column of `x`
fn decompose(x: DMatrix<f64>) -> std::result::Result<Decomposition, usize> {
    let (n, p) = x.shape();
    if p > n {
        return Err(n);
    }

    let qr = x.qr();
    let r = qr.r();
    let diagonal: Vec<f64> = r.diagonal().iter().map(|d| d.abs()).collect();
    let largest = diagonal.iter().copied().fold(0.0, f64::max);
    if let Some(j) = diagonal
        .iter()
        .position(|d| !d.is_finite() || *d <= RANK_TOLERANCE * largest)
    {
        return Err(j);
    }

    Ok(Decomposition { q: qr.q(), r })
}

fn solve(decomposition: &Decomposition, y: &DVector<f64>) -> Option<DVector<f64>> {
    let qty = decomposition.q.transpose() * y;
    decomposition.r.solve_upper_triangular(&qty)
}

/// Residual sum of squares for intercept + selected columns
///
/// `None` when the selection is rank deficient. Used by the search
/// routines, which only need RSS.
pub fn residual_sum_of_squares(design: &DesignMatrix, indices: &[usize], y: &DVector<f64>) -> Option<f64> {
    let x = design.matrix_for(indices);
    let decomposition = decompose(x.clone()).ok()?;
    let beta = solve(&decomposition, y)?;
    let residuals = y - x * beta;
    Some(residuals.norm_squared())
}

fn aliased_column_name(design: &DesignMatrix, j: usize) -> String {
    match j {
        0 => INTERCEPT.to_string(),
        j if j <= design.n_columns() => design.columns()[j - 1].name.clone(),
        _ => "(too many columns)".to_string(),
    }
}

/// Fit `y` on intercept + every column of `design`
pub fn fit_ols(model: &str, design: &DesignMatrix, y: &[f64]) -> Result<OlsFit> {
    let n = design.n_rows();
    if y.len() != n {
        return Err(AnalysisError::DegenerateData(format!(
            "response has {} rows, design has {}",
            y.len(),
            n
        )));
    }

    let x = design.to_matrix();
    let p = x.ncols();
    let rank_error = |j: usize| AnalysisError::RankDeficiency {
        model: model.to_string(),
        column: aliased_column_name(design, j),
    };

    let decomposition = decompose(x.clone()).map_err(rank_error)?;
    if n <= p {
        return Err(AnalysisError::DegenerateData(format!(
            "'{}' has no residual degrees of freedom ({} rows, {} parameters)",
            model, n, p
        )));
    }

    let y_vec = DVector::from_column_slice(y);
    let beta = solve(&decomposition, &y_vec).ok_or_else(|| rank_error(p - 1))?;
    let r_inverse = decomposition
        .r
        .clone()
        .try_inverse()
        .ok_or_else(|| rank_error(p - 1))?;

    let fitted = &x * &beta;
    let residuals = &y_vec - &fitted;
    let rss = residuals.norm_squared();

    let df_residual = n - p;
    let sigma2 = rss / df_residual as f64;

    let t_dist = StudentsT::new(0.0, 1.0, df_residual as f64).map_err(|e| {
        AnalysisError::DegenerateData(format!("t distribution for '{}': {}", model, e))
    })?;

    let unscaled = &r_inverse * r_inverse.transpose();
    let names = std::iter::once(INTERCEPT.to_string()).chain(design.column_names());
    let coefficients: Vec<Coefficient> = names
        .enumerate()
        .map(|(j, name)| {
            let std_error = (sigma2 * unscaled[(j, j)]).sqrt();
            let t_value = beta[j] / std_error;
            Coefficient {
                name,
                estimate: beta[j],
                std_error,
                t_value,
                p_value: (2.0 * t_dist.sf(t_value.abs())).min(1.0),
            }
        })
        .collect();

    let mean = y.iter().sum::<f64>() / n as f64;
    let tss: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let r_squared = 1.0 - rss / tss;
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_residual as f64;

    let f_test = if p > 1 {
        let df_model = p - 1;
        let statistic = ((tss - rss) / df_model as f64) / sigma2;
        let f_dist = FisherSnedecor::new(df_model as f64, df_residual as f64).map_err(|e| {
            AnalysisError::DegenerateData(format!("F distribution for '{}': {}", model, e))
        })?;
        Some(FTest {
            statistic,
            df_model,
            df_residual,
            p_value: f_dist.sf(statistic),
        })
    } else {
        None
    };

    let leverage = decomposition
        .q
        .row_iter()
        .map(|row| row.norm_squared())
        .collect();

    let log_likelihood = gaussian_log_likelihood(rss, n);

    tracing::debug!(
        "Fitted '{}': p={} rss={:.4} R²={:.4} adj={:.4}",
        model,
        p,
        rss,
        r_squared,
        adj_r_squared
    );

    Ok(OlsFit {
        coefficients,
        n,
        n_params: p,
        df_residual,
        rss,
        r_squared,
        adj_r_squared,
        sigma: sigma2.sqrt(),
        f_test,
        log_likelihood,
        aic: gaussian_aic(rss, n, p),
        bic: gaussian_bic(rss, n, p),
        fitted: fitted.iter().copied().collect(),
        residuals: residuals.iter().copied().collect(),
        leverage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::annotate;
    use crate::dataset::{Column, Dataset};
    use crate::model::formula::Formula;

    fn fit(formula: &Formula) -> OlsFit {
        let table = annotate(&Dataset::bundled().unwrap()).unwrap();
        let design = DesignMatrix::for_formula(&table, formula).unwrap();
        fit_ols(&formula.to_string(), &design, &table.response()).unwrap()
    }

    fn coefficient<'a>(fit: &'a OlsFit, name: &str) -> &'a Coefficient {
        fit.coefficients.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn test_baseline_fit() {
        let fit = fit(&Formula::baseline());
        assert!((fit.r_squared - 0.3598).abs() < 1e-4);
        assert!((fit.adj_r_squared - 0.3385).abs() < 1e-4);

        let intercept = coefficient(&fit, INTERCEPT);
        assert!((intercept.estimate - 17.147_368).abs() < 1e-5);
        let manual = coefficient(&fit, "amManual");
        assert!((manual.estimate - 7.244_939).abs() < 1e-5);
        assert!((manual.p_value - 0.000_285).abs() < 1e-5);
    }

    #[test]
    fn test_three_regressor_fit() {
        let fit = fit(&Formula::new([Column::Wt, Column::Qsec, Column::Am]));
        assert!((fit.r_squared - 0.8497).abs() < 1e-4);
        assert!((fit.adj_r_squared - 0.8336).abs() < 1e-4);

        let wt = coefficient(&fit, "wt");
        assert!((wt.estimate + 3.9165).abs() < 1e-4);
        assert!((wt.std_error - 0.7112).abs() < 1e-4);

        let manual = coefficient(&fit, "amManual");
        assert!((manual.estimate - 2.9358).abs() < 1e-4);
        assert!((manual.p_value - 0.0467).abs() < 1e-4);

        let f_test = fit.f_test.as_ref().unwrap();
        assert!((f_test.statistic - 52.75).abs() < 1e-2);
        assert_eq!((f_test.df_model, f_test.df_residual), (3, 28));
        assert!(f_test.p_value < 1e-10);
    }

    #[test]
    fn test_single_regressor_f_test_matches_t_test() {
        // F(1, d) = T(d)^2
        let fit = fit(&Formula::baseline());
        let f_test = fit.f_test.as_ref().unwrap();
        let manual = coefficient(&fit, "amManual");
        assert!((f_test.statistic - manual.t_value.powi(2)).abs() < 1e-9);
        assert!((f_test.p_value - manual.p_value).abs() < 1e-9);
    }

    #[test]
    fn test_p_values_on_full_fit() {
        let fit = fit(&Formula::full());
        assert!((coefficient(&fit, "amManual").p_value - 0.71132).abs() < 1e-5);
        assert!((coefficient(&fit, "hp").p_value - 0.09393).abs() < 1e-5);
        assert!(fit.coefficients.iter().all(|c| (0.0..=1.0).contains(&c.p_value)));
    }

    #[test]
    fn test_full_fit_is_identifiable() {
        let fit = fit(&Formula::full());
        assert_eq!(fit.n_params, 17);
        assert_eq!(fit.df_residual, 15);
        assert!((fit.adj_r_squared - 0.7790).abs() < 1e-4);
    }

    #[test]
    fn test_residuals_sum_to_zero_and_leverage_sums_to_p() {
        let fit = fit(&Formula::new([Column::Wt, Column::Qsec, Column::Am]));
        let residual_sum: f64 = fit.residuals.iter().sum();
        assert!(residual_sum.abs() < 1e-9);

        let trace: f64 = fit.leverage.iter().sum();
        assert!((trace - fit.n_params as f64).abs() < 1e-9);

        for ((fitted, residual), observed) in fit
            .fitted
            .iter()
            .zip(&fit.residuals)
            .zip(annotate(&Dataset::bundled().unwrap()).unwrap().response())
        {
            assert!((fitted + residual - observed).abs() < 1e-9);
        }
    }

    #[test]
    fn test_aic_matches_log_likelihood() {
        let fit = fit(&Formula::new([Column::Wt, Column::Qsec, Column::Am]));
        assert!((fit.aic - (2.0 * 5.0 - 2.0 * fit.log_likelihood)).abs() < 1e-12);
        assert!((fit.aic - 154.1194).abs() < 1e-3);
    }

    #[test]
    fn test_collinear_column_rejected() {
        let table = annotate(&Dataset::bundled().unwrap()).unwrap();
        let base = DesignMatrix::for_formula(&table, &Formula::new([Column::Wt])).unwrap();
        let mut columns = base.columns().to_vec();
        let mut doubled = columns[0].clone();
        doubled.name = "wt2".to_string();
        doubled.values = doubled.values.iter().map(|v| 2.0 * v).collect();
        columns.push(doubled);
        let design = DesignMatrix::from_columns(base.n_rows(), columns);

        let err = fit_ols("collinear", &design, &table.response()).unwrap_err();
        match err {
            AnalysisError::RankDeficiency { model, column } => {
                assert_eq!(model, "collinear");
                assert_eq!(column, "wt2");
            }
            other => panic!("expected rank deficiency, got {other}"),
        }
    }

    #[test]
    fn test_rss_helper_matches_full_fit() {
        let table = annotate(&Dataset::bundled().unwrap()).unwrap();
        let design = DesignMatrix::for_formula(&table, &Formula::full()).unwrap();
        let y = DVector::from_vec(table.response());
        let all: Vec<usize> = (0..design.n_columns()).collect();
        let rss = residual_sum_of_squares(&design, &all, &y).unwrap();
        let fit = fit_ols("full", &design, &table.response()).unwrap();
        assert!((rss - fit.rss).abs() < 1e-9);
    }
}
