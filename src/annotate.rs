//! Type annotation: numeric codes to categorical levels
//!
//! Five columns (cyl, vs, am, gear, carb) are recast as categorical. The
//! transmission codes go through an explicit lookup table so that the
//! 0 → Automatic, 1 → Manual direction never depends on level ordering.

use crate::dataset::{Column, Dataset, RawRecord};
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Transmission type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Transmission {
    Automatic,
    Manual,
}

/// Numeric code → transmission type
pub const TRANSMISSION_LEVELS: [(u32, Transmission); 2] =
    [(0, Transmission::Automatic), (1, Transmission::Manual)];

impl Transmission {
    pub fn from_code(code: u32) -> Option<Self> {
        TRANSMISSION_LEVELS
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, t)| *t)
    }

    pub fn code(self) -> u32 {
        TRANSMISSION_LEVELS
            .iter()
            .find(|(_, t)| *t == self)
            .map(|(c, _)| *c)
            .unwrap_or_default()
    }

    pub fn label(self) -> &'static str {
        match self {
            Transmission::Automatic => "Automatic",
            Transmission::Manual => "Manual",
        }
    }
}

impl std::fmt::Display for Transmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One level of a categorical column
///
/// Levels order by their numeric code; the first level is the reference
/// in treatment coding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Level {
    pub code: u32,
    pub label: String,
}

/// One automobile with categorical fields typed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedRecord {
    pub model: String,
    pub mpg: f64,
    pub cyl: u32,
    pub disp: f64,
    pub hp: f64,
    pub drat: f64,
    pub wt: f64,
    pub qsec: f64,
    pub vs: u32,
    pub am: Transmission,
    pub gear: u32,
    pub carb: u32,
}

impl AnnotatedRecord {
    /// Value of a continuous column, `None` for categorical ones
    pub fn continuous(&self, column: Column) -> Option<f64> {
        match column {
            Column::Mpg => Some(self.mpg),
            Column::Disp => Some(self.disp),
            Column::Hp => Some(self.hp),
            Column::Drat => Some(self.drat),
            Column::Wt => Some(self.wt),
            Column::Qsec => Some(self.qsec),
            _ => None,
        }
    }

    /// Level of a categorical column, `None` for continuous ones
    pub fn level(&self, column: Column) -> Option<Level> {
        let code = match column {
            Column::Am => {
                return Some(Level {
                    code: self.am.code(),
                    label: self.am.label().to_string(),
                })
            }
            Column::Cyl => self.cyl,
            Column::Vs => self.vs,
            Column::Gear => self.gear,
            Column::Carb => self.carb,
            _ => return None,
        };
        Some(Level {
            code,
            label: code.to_string(),
        })
    }

    fn to_raw(&self) -> RawRecord {
        RawRecord {
            model: self.model.clone(),
            mpg: self.mpg,
            cyl: f64::from(self.cyl),
            disp: self.disp,
            hp: self.hp,
            drat: self.drat,
            wt: self.wt,
            qsec: self.qsec,
            vs: f64::from(self.vs),
            am: f64::from(self.am.code()),
            gear: f64::from(self.gear),
            carb: f64::from(self.carb),
        }
    }
}

/// Table with categorical columns typed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedTable {
    records: Vec<AnnotatedRecord>,
}

impl AnnotatedTable {
    pub fn records(&self) -> &[AnnotatedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Response column (mpg) in row order
    pub fn response(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.mpg).collect()
    }

    /// Distinct levels of a categorical column, ordered by code
    pub fn levels(&self, column: Column) -> Vec<Level> {
        let mut levels: Vec<Level> = self
            .records
            .iter()
            .filter_map(|r| r.level(column))
            .collect();
        levels.sort();
        levels.dedup();
        levels
    }

    /// Keep the rows matching `keep`
    pub fn filter<F>(&self, keep: F) -> AnnotatedTable
    where
        F: Fn(&AnnotatedRecord) -> bool,
    {
        AnnotatedTable {
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Re-encode categorical columns to their numeric codes
    pub fn to_raw(&self) -> Result<Dataset> {
        Dataset::from_records(self.records.iter().map(AnnotatedRecord::to_raw).collect())
    }
}

fn factor_code(column: Column, record: &RawRecord) -> Result<u32> {
    let value = record.value(column);
    if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(AnalysisError::DataLoad(format!(
            "'{}' has non-integer level {} in categorical column '{}'",
            record.model, value, column
        )));
    }
    Ok(value as u32)
}

fn annotate_record(record: &RawRecord) -> Result<AnnotatedRecord> {
    let am_code = factor_code(Column::Am, record)?;
    let am = Transmission::from_code(am_code).ok_or_else(|| {
        AnalysisError::DataLoad(format!(
            "'{}' has unknown transmission code {}",
            record.model, am_code
        ))
    })?;

    Ok(AnnotatedRecord {
        model: record.model.clone(),
        mpg: record.mpg,
        cyl: factor_code(Column::Cyl, record)?,
        disp: record.disp,
        hp: record.hp,
        drat: record.drat,
        wt: record.wt,
        qsec: record.qsec,
        vs: factor_code(Column::Vs, record)?,
        am,
        gear: factor_code(Column::Gear, record)?,
        carb: factor_code(Column::Carb, record)?,
    })
}

/// Produce the typed table; the raw dataset is left untouched
pub fn annotate(dataset: &Dataset) -> Result<AnnotatedTable> {
    let records = dataset
        .records()
        .iter()
        .map(annotate_record)
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        "Annotated {} rows ({} categorical columns)",
        records.len(),
        Column::ALL.iter().filter(|c| c.is_categorical()).count()
    );

    Ok(AnnotatedTable { records })
}
