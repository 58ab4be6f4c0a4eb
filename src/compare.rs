//! Model comparison and selection
//!
//! `select_best` is a pure function over the comparison rows: a row
//! qualifies when its transmission p-value is below alpha, and the winner
//! is the qualifier with the highest adjusted R². Ties fall back to the
//! lower p-value, then to the earlier row.
//!
//! Rows carry unrounded statistics; rounding to `REPORT_DECIMALS` happens
//! only when a row is rendered or serialized.

use crate::error::Result;
use crate::model::{CandidateModel, Formula, ModelRole};
use serde::{Serialize, Serializer};

/// Decimal places used for the comparison table
pub const REPORT_DECIMALS: i32 = 4;

/// Round half away from zero to `REPORT_DECIMALS`
pub fn round_report(value: f64) -> f64 {
    let scale = 10f64.powi(REPORT_DECIMALS);
    (value * scale).round() / scale
}

fn serialize_rounded<S: Serializer>(
    value: &f64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_report(*value))
}

/// One line of the comparison table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub name: String,
    pub role: ModelRole,
    pub formula: Formula,
    #[serde(serialize_with = "serialize_rounded")]
    pub adj_r_squared: f64,
    #[serde(serialize_with = "serialize_rounded")]
    pub transmission_p: f64,
}

impl ComparisonRow {
    pub fn from_candidate(candidate: &CandidateModel) -> Result<Self> {
        Ok(Self {
            name: candidate.name.clone(),
            role: candidate.role,
            formula: candidate.formula.clone(),
            adj_r_squared: candidate.fit.adj_r_squared,
            transmission_p: candidate.transmission()?.p_value,
        })
    }

    pub fn qualifies(&self, alpha: f64) -> bool {
        self.transmission_p < alpha
    }
}

/// Comparison rows for the given candidates, in order
pub fn comparison_table(candidates: &[&CandidateModel]) -> Result<Vec<ComparisonRow>> {
    candidates
        .iter()
        .map(|c| ComparisonRow::from_candidate(c))
        .collect()
}

/// Index of the selected row, `None` when nothing qualifies
pub fn select_best(rows: &[ComparisonRow], alpha: f64) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, row) in rows.iter().enumerate() {
        if !row.qualifies(alpha) {
            continue;
        }
        let better = match best {
            None => true,
            Some(b) => {
                let current = &rows[b];
                row.adj_r_squared > current.adj_r_squared
                    || (row.adj_r_squared == current.adj_r_squared
                        && row.transmission_p < current.transmission_p)
            }
        };
        if better {
            best = Some(i);
        }
    }
    best
}
