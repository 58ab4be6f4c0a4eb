//! Descriptive summaries of fuel efficiency by transmission type
//!
//! Produces the per-group box-and-whisker statistics, a small descriptive
//! table per group, and the Welch two-sample test. Medians go through
//! aprender's `DescriptiveStats` on a trueno `Vector`.

mod boxplot;
mod welch;

pub use boxplot::{boxplot_stats, five_number_summary, BoxplotStats, WHISKER_COEFFICIENT};
pub use welch::{welch_t_test, WelchTest};

use crate::annotate::{AnnotatedTable, Transmission};
use crate::error::{AnalysisError, Result};
use aprender::stats::DescriptiveStats;
use serde::Serialize;
use trueno::Vector;

/// Response values of one group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSample {
    pub label: String,
    pub values: Vec<f64>,
}

/// Descriptive statistics for one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub n: usize,
    pub mean: f64,
    pub sd: f64,
    pub median: f64,
}

/// Everything the descriptive stage produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveSummary {
    pub groups: Vec<GroupSummary>,
    pub boxplots: Vec<BoxplotStats>,
    pub welch: WelchTest,
}

/// Median via aprender's R-7 quantile
pub fn median(values: &[f64]) -> Result<f64> {
    let narrowed: Vec<f32> = values.iter().map(|v| *v as f32).collect();
    let vector = Vector::from_slice(&narrowed);
    let stats = DescriptiveStats::new(&vector);
    stats
        .quantile(0.5)
        .map(f64::from)
        .map_err(|e| AnalysisError::DegenerateData(format!("failed to compute median: {}", e)))
}

fn group_summary(sample: &GroupSample) -> Result<GroupSummary> {
    let n = sample.values.len();
    if n < 2 {
        return Err(AnalysisError::EmptyGroup {
            group: sample.label.clone(),
            size: n,
        });
    }

    let mean = sample.values.iter().sum::<f64>() / n as f64;
    let ss: f64 = sample.values.iter().map(|v| (v - mean).powi(2)).sum();

    Ok(GroupSummary {
        group: sample.label.clone(),
        n,
        mean,
        sd: (ss / (n - 1) as f64).sqrt(),
        median: median(&sample.values)?,
    })
}

/// Split mpg by transmission type, Automatic first
pub fn split_by_transmission(table: &AnnotatedTable) -> [GroupSample; 2] {
    [Transmission::Automatic, Transmission::Manual].map(|transmission| GroupSample {
        label: transmission.label().to_string(),
        values: table
            .records()
            .iter()
            .filter(|r| r.am == transmission)
            .map(|r| r.mpg)
            .collect(),
    })
}

/// Run the descriptive stage
pub fn summarize(table: &AnnotatedTable, confidence_level: f64) -> Result<DescriptiveSummary> {
    let [automatic, manual] = split_by_transmission(table);

    let welch = welch_t_test(&automatic, &manual, confidence_level)?;

    let groups = [&automatic, &manual]
        .into_iter()
        .map(group_summary)
        .collect::<Result<Vec<_>>>()?;

    let boxplots = [&automatic, &manual]
        .into_iter()
        .map(|g| boxplot_stats(&g.label, &g.values))
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(
        "Descriptive summary: {} n={} vs {} n={}, p={:.4}",
        automatic.label,
        automatic.values.len(),
        manual.label,
        manual.values.len(),
        welch.pvalue
    );

    Ok(DescriptiveSummary {
        groups,
        boxplots,
        welch,
    })
}
