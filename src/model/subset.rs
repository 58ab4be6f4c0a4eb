// Exhaustive best-subset search over design columns
//
// For each size k every combination of k columns is fitted (intercept
// always included) and the lowest-RSS combination kept. Within one size
// adjusted R², Cp and BIC are all monotone in RSS, so the per-size winner is
// the same for every criterion; the criteria only differ in which size wins.
//
//   Cp  = RSS_k / sigma²_full + 2(k + 1) - n
//   BIC = n ln(RSS_k / n) + (k + 1) ln(n)
//
// sigma²_full is the residual variance of the model with every column.

use super::design::DesignMatrix;
use super::ols::residual_sum_of_squares;
use crate::error::{AnalysisError, Result};
use nalgebra::DVector;
use serde::Serialize;

/// Criterion used to pick among per-size winners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    AdjR2,
    Cp,
    Bic,
}

impl Criterion {
    pub fn label(&self) -> &'static str {
        match self {
            Criterion::AdjR2 => "adjusted R²",
            Criterion::Cp => "Mallows' Cp",
            Criterion::Bic => "BIC",
        }
    }
}

/// Best combination of one size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsetFit {
    pub size: usize,
    pub indices: Vec<usize>,
    pub columns: Vec<String>,
    pub rss: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub cp: f64,
    pub bic: f64,
}

/// Per-size winners and the size each criterion prefers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionResult {
    pub max_size: usize,
    pub by_size: Vec<SubsetFit>,
    pub best_adj_r2_size: usize,
    pub best_cp_size: usize,
    pub best_bic_size: usize,
}

impl SelectionResult {
    /// Winning subset for `criterion`
    pub fn best(&self, criterion: Criterion) -> &SubsetFit {
        let size = match criterion {
            Criterion::AdjR2 => self.best_adj_r2_size,
            Criterion::Cp => self.best_cp_size,
            Criterion::Bic => self.best_bic_size,
        };
        // by_size is dense from 1, and the best sizes come from it
        &self.by_size[size - 1]
    }
}

/// Lexicographic k-combinations of 0..n
struct Combinations {
    n: usize,
    current: Vec<usize>,
    done: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            current: (0..k).collect(),
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.current.clone();

        let k = self.current.len();
        let mut i = k;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if self.current[i] < self.n - k + i {
                self.current[i] += 1;
                for j in i + 1..k {
                    self.current[j] = self.current[j - 1] + 1;
                }
                break;
            }
        }

        Some(item)
    }
}

fn first_best(by_size: &[SubsetFit], better: impl Fn(&SubsetFit, &SubsetFit) -> bool) -> usize {
    let mut best = &by_size[0];
    for fit in &by_size[1..] {
        if better(fit, best) {
            best = fit;
        }
    }
    best.size
}

/// Search every subset of up to `max_size` columns of `design`
pub fn best_subsets(design: &DesignMatrix, y: &[f64], max_size: usize) -> Result<SelectionResult> {
    let n = design.n_rows();
    let p = design.n_columns();
    if p == 0 {
        return Err(AnalysisError::DegenerateData(
            "subset search needs at least one candidate column".to_string(),
        ));
    }
    if max_size == 0 {
        return Err(AnalysisError::InvalidConfig(
            "max_subset_size must be at least 1".to_string(),
        ));
    }
    if n < p + 2 {
        return Err(AnalysisError::DegenerateData(format!(
            "subset search needs more rows ({}) than full-model parameters ({})",
            n,
            p + 1
        )));
    }

    let max_size = max_size.min(p);
    let y_vec = DVector::from_column_slice(y);

    let all: Vec<usize> = (0..p).collect();
    let full_rss = residual_sum_of_squares(design, &all, &y_vec).ok_or_else(|| {
        AnalysisError::RankDeficiency {
            model: "best subset (full design)".to_string(),
            column: "(unknown)".to_string(),
        }
    })?;
    let sigma2_full = full_rss / (n - p - 1) as f64;

    let mean = y.iter().sum::<f64>() / n as f64;
    let tss: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let names = design.column_names();
    let n_f = n as f64;

    let mut by_size = Vec::with_capacity(max_size);
    for size in 1..=max_size {
        let mut winner: Option<(f64, Vec<usize>)> = None;
        for indices in Combinations::new(p, size) {
            let Some(rss) = residual_sum_of_squares(design, &indices, &y_vec) else {
                continue;
            };
            if winner.as_ref().map_or(true, |(best, _)| rss < *best) {
                winner = Some((rss, indices));
            }
        }

        let Some((rss, indices)) = winner else {
            tracing::debug!("Subset search: no full-rank subset of size {}", size);
            break;
        };

        let k = (size + 1) as f64;
        let r_squared = 1.0 - rss / tss;
        let fit = SubsetFit {
            size,
            columns: indices.iter().map(|i| names[*i].clone()).collect(),
            indices,
            rss,
            r_squared,
            adj_r_squared: 1.0 - (1.0 - r_squared) * (n_f - 1.0) / (n_f - k),
            cp: rss / sigma2_full + 2.0 * k - n_f,
            bic: n_f * (rss / n_f).ln() + k * n_f.ln(),
        };
        tracing::debug!(
            "Subset size {}: {:?} rss={:.4} adj={:.4} cp={:.3} bic={:.3}",
            size,
            fit.columns,
            fit.rss,
            fit.adj_r_squared,
            fit.cp,
            fit.bic
        );
        by_size.push(fit);
    }

    if by_size.is_empty() {
        return Err(AnalysisError::RankDeficiency {
            model: "best subset".to_string(),
            column: names[0].clone(),
        });
    }

    let best_adj_r2_size = first_best(&by_size, |a, b| a.adj_r_squared > b.adj_r_squared);
    let best_cp_size = first_best(&by_size, |a, b| a.cp < b.cp);
    let best_bic_size = first_best(&by_size, |a, b| a.bic < b.bic);

    tracing::info!(
        "Best subsets: adjR² size {}, Cp size {}, BIC size {}",
        best_adj_r2_size,
        best_cp_size,
        best_bic_size
    );

    Ok(SelectionResult {
        max_size: by_size.len(),
        by_size,
        best_adj_r2_size,
        best_cp_size,
        best_bic_size,
    })
}
