// Box-and-whisker statistics
//
// Hinges follow Tukey's five-number summary (averaged order statistics at
// depth floor((n + 3) / 2) / 2), not interpolated quantiles, so the boxes
// match the conventional statistical rendering. Whiskers reach the most
// extreme observation within 1.5 hinge spreads; anything beyond is an
// outlier.

use crate::error::{AnalysisError, Result};
use serde::Serialize;

/// Whisker reach in hinge spreads
pub const WHISKER_COEFFICIENT: f64 = 1.5;

/// Box-and-whisker summary for one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxplotStats {
    pub group: String,
    pub n: usize,
    pub lower_whisker: f64,
    pub lower_hinge: f64,
    pub median: f64,
    pub upper_hinge: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Tukey's five-number summary of already-sorted data
///
/// Returns `[min, lower hinge, median, upper hinge, max]`.
pub fn five_number_summary(sorted: &[f64]) -> Option<[f64; 5]> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }

    let n4 = ((n + 3) / 2) as f64 / 2.0;
    let depths = [
        1.0,
        n4,
        (n as f64 + 1.0) / 2.0,
        n as f64 + 1.0 - n4,
        n as f64,
    ];

    let mut summary = [0.0; 5];
    for (slot, depth) in summary.iter_mut().zip(depths) {
        let lo = depth.floor() as usize - 1;
        let hi = depth.ceil() as usize - 1;
        *slot = 0.5 * (sorted[lo] + sorted[hi]);
    }
    Some(summary)
}

/// Compute box-and-whisker statistics for one group
pub fn boxplot_stats(group: &str, values: &[f64]) -> Result<BoxplotStats> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let [_, lower_hinge, median, upper_hinge, _] =
        five_number_summary(&sorted).ok_or_else(|| AnalysisError::EmptyGroup {
            group: group.to_string(),
            size: 0,
        })?;

    let reach = WHISKER_COEFFICIENT * (upper_hinge - lower_hinge);
    let lower_fence = lower_hinge - reach;
    let upper_fence = upper_hinge + reach;

    let (inside, outliers): (Vec<f64>, Vec<f64>) = sorted
        .iter()
        .partition(|v| (lower_fence..=upper_fence).contains(*v));

    // Non-empty: the median always lies between the fences
    let lower_whisker = inside.first().copied().unwrap_or(median);
    let upper_whisker = inside.last().copied().unwrap_or(median);

    Ok(BoxplotStats {
        group: group.to_string(),
        n: sorted.len(),
        lower_whisker,
        lower_hinge,
        median,
        upper_hinge,
        upper_whisker,
        outliers,
    })
}
