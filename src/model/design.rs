// Design matrix construction
//
// Continuous terms contribute one column. Categorical terms are
// treatment-coded against their lowest level: one indicator per remaining
// level, named `<term><label>` (cyl6, carb8, amManual). The intercept is
// implicit and only materialized by `to_matrix`.
//
// Fitting and subset search both go through this type so the encoding is
// identical everywhere.

use super::formula::Formula;
use crate::annotate::AnnotatedTable;
use crate::dataset::Column;
use crate::error::{AnalysisError, Result};
use nalgebra::DMatrix;

/// One regressor column
#[derive(Debug, Clone, PartialEq)]
pub struct DesignColumn {
    pub name: String,
    /// Source term this column encodes
    pub term: Column,
    pub values: Vec<f64>,
}

/// Regressor columns for a set of terms, intercept implicit
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    n_rows: usize,
    columns: Vec<DesignColumn>,
}

fn encode_term(table: &AnnotatedTable, formula: &Formula, term: Column) -> Result<Vec<DesignColumn>> {
    if term == Column::Mpg {
        return Err(AnalysisError::InvalidFormula {
            formula: formula.to_string(),
            reason: "the response cannot be a regressor".to_string(),
        });
    }

    if !term.is_categorical() {
        let values = table
            .records()
            .iter()
            .filter_map(|r| r.continuous(term))
            .collect();
        return Ok(vec![DesignColumn {
            name: term.name().to_string(),
            term,
            values,
        }]);
    }

    let levels = table.levels(term);
    if levels.len() < 2 {
        return Err(AnalysisError::RankDeficiency {
            model: formula.to_string(),
            column: term.name().to_string(),
        });
    }

    Ok(levels
        .iter()
        .skip(1)
        .map(|level| DesignColumn {
            name: format!("{}{}", term.name(), level.label),
            term,
            values: table
                .records()
                .iter()
                .map(|r| match r.level(term) {
                    Some(ref l) if l == level => 1.0,
                    _ => 0.0,
                })
                .collect(),
        })
        .collect())
}

impl DesignMatrix {
    /// Encode the terms of `formula` against `table`
    pub fn for_formula(table: &AnnotatedTable, formula: &Formula) -> Result<Self> {
        let mut columns = Vec::new();
        for term in formula.terms() {
            columns.extend(encode_term(table, formula, *term)?);
        }

        Ok(Self {
            n_rows: table.len(),
            columns,
        })
    }

    /// Assemble a design from explicit columns
    pub fn from_columns(n_rows: usize, columns: Vec<DesignColumn>) -> Self {
        Self { n_rows, columns }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of regressor columns (intercept excluded)
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[DesignColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Sub-design with the given column indices, in the given order
    pub fn select(&self, indices: &[usize]) -> DesignMatrix {
        DesignMatrix {
            n_rows: self.n_rows,
            columns: indices.iter().map(|i| self.columns[*i].clone()).collect(),
        }
    }

    /// Distinct source terms of the selected columns, in canonical order
    pub fn terms_of(&self, indices: &[usize]) -> Vec<Column> {
        let mut terms: Vec<Column> = indices.iter().map(|i| self.columns[*i].term).collect();
        terms.sort();
        terms.dedup();
        terms
    }

    /// Dense matrix with a leading intercept column
    pub fn to_matrix(&self) -> DMatrix<f64> {
        self.matrix_for(&(0..self.columns.len()).collect::<Vec<_>>())
    }

    /// Dense matrix (intercept + selected columns) without cloning columns
    pub fn matrix_for(&self, indices: &[usize]) -> DMatrix<f64> {
        DMatrix::from_fn(self.n_rows, indices.len() + 1, |row, col| {
            if col == 0 {
                1.0
            } else {
                self.columns[indices[col - 1]].values[row]
            }
        })
    }
}
