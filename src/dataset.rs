//! Dataset loader for the bundled road-test table
//!
//! The canonical table has one row per automobile and eleven numeric
//! columns. Categorical fields stay in their raw numeric encoding here;
//! see [`crate::annotate`] for the typed view.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// CSV compiled into the binary
const BUNDLED_CSV: &str = include_str!("../data/mtcars.csv");

/// Header every dataset file must carry, in order
pub const EXPECTED_HEADER: [&str; 12] = [
    "model", "mpg", "cyl", "disp", "hp", "drat", "wt", "qsec", "vs", "am", "gear", "carb",
];

/// Stable column identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Mpg,
    Cyl,
    Disp,
    Hp,
    Drat,
    Wt,
    Qsec,
    Vs,
    Am,
    Gear,
    Carb,
}

impl Column {
    /// All columns in table order
    pub const ALL: [Column; 11] = [
        Column::Mpg,
        Column::Cyl,
        Column::Disp,
        Column::Hp,
        Column::Drat,
        Column::Wt,
        Column::Qsec,
        Column::Vs,
        Column::Am,
        Column::Gear,
        Column::Carb,
    ];

    /// Every column except the response, in table order
    pub const REGRESSORS: [Column; 10] = [
        Column::Cyl,
        Column::Disp,
        Column::Hp,
        Column::Drat,
        Column::Wt,
        Column::Qsec,
        Column::Vs,
        Column::Am,
        Column::Gear,
        Column::Carb,
    ];

    /// Short identifier used in headers and formulas
    pub fn name(self) -> &'static str {
        match self {
            Column::Mpg => "mpg",
            Column::Cyl => "cyl",
            Column::Disp => "disp",
            Column::Hp => "hp",
            Column::Drat => "drat",
            Column::Wt => "wt",
            Column::Qsec => "qsec",
            Column::Vs => "vs",
            Column::Am => "am",
            Column::Gear => "gear",
            Column::Carb => "carb",
        }
    }

    /// Human-readable description
    pub fn description(self) -> &'static str {
        match self {
            Column::Mpg => "Miles/(US) gallon",
            Column::Cyl => "Number of cylinders",
            Column::Disp => "Displacement (cu.in.)",
            Column::Hp => "Gross horsepower",
            Column::Drat => "Rear axle ratio",
            Column::Wt => "Weight (1000 lbs)",
            Column::Qsec => "1/4 mile time",
            Column::Vs => "Engine shape (0 = V-shaped, 1 = straight)",
            Column::Am => "Transmission (0 = automatic, 1 = manual)",
            Column::Gear => "Number of forward gears",
            Column::Carb => "Number of carburetors",
        }
    }

    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// Columns recast to categorical by the type annotator
    pub fn is_categorical(self) -> bool {
        matches!(
            self,
            Column::Cyl | Column::Vs | Column::Am | Column::Gear | Column::Carb
        )
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One automobile, raw numeric encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Row label (make and model)
    pub model: String,
    pub mpg: f64,
    pub cyl: f64,
    pub disp: f64,
    pub hp: f64,
    pub drat: f64,
    pub wt: f64,
    pub qsec: f64,
    pub vs: f64,
    pub am: f64,
    pub gear: f64,
    pub carb: f64,
}

impl RawRecord {
    pub fn value(&self, column: Column) -> f64 {
        match column {
            Column::Mpg => self.mpg,
            Column::Cyl => self.cyl,
            Column::Disp => self.disp,
            Column::Hp => self.hp,
            Column::Drat => self.drat,
            Column::Wt => self.wt,
            Column::Qsec => self.qsec,
            Column::Vs => self.vs,
            Column::Am => self.am,
            Column::Gear => self.gear,
            Column::Carb => self.carb,
        }
    }
}

/// The canonical observation table
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<RawRecord>,
}

impl Dataset {
    /// Load the copy bundled with the binary
    pub fn bundled() -> Result<Self> {
        Self::from_csv_str(BUNDLED_CSV)
    }

    /// Load a CSV file carrying the canonical header
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::DataLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_csv_str(&text)
    }

    /// Parse CSV text carrying the canonical header
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AnalysisError::DataLoad(format!("CSV header: {}", e)))?;
        let found: Vec<&str> = headers.iter().collect();
        if found != EXPECTED_HEADER {
            return Err(AnalysisError::DataLoad(format!(
                "unexpected header [{}], expected [{}]",
                found.join(","),
                EXPECTED_HEADER.join(",")
            )));
        }

        let mut records = Vec::new();
        for (line, row) in reader.deserialize::<RawRecord>().enumerate() {
            // +2: one for the header, one for 1-based numbering
            let record =
                row.map_err(|e| AnalysisError::DataLoad(format!("row {}: {}", line + 2, e)))?;
            records.push(record);
        }

        Self::from_records(records)
    }

    /// Build a dataset from already-parsed records
    pub fn from_records(records: Vec<RawRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(AnalysisError::DataLoad("dataset has no rows".to_string()));
        }

        for record in &records {
            if let Some(column) = Column::ALL
                .iter()
                .find(|c| !record.value(**c).is_finite())
            {
                return Err(AnalysisError::DataLoad(format!(
                    "non-finite value in column '{}' for '{}'",
                    column, record.model
                )));
            }
        }

        tracing::debug!("Loaded dataset with {} rows", records.len());
        Ok(Self { records })
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of one column in row order
    pub fn column(&self, column: Column) -> Vec<f64> {
        self.records.iter().map(|r| r.value(column)).collect()
    }
}
