// Welch's unequal-variance two-sample t-test
//
// Degrees of freedom come from the Welch-Satterthwaite approximation, so
// they are fractional in general. The pooled-variance formulation is never
// used.

use super::GroupSample;
use crate::error::{AnalysisError, Result};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Result of comparing two group means
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WelchTest {
    pub first_group: String,
    pub second_group: String,
    pub first_mean: f64,
    pub second_mean: f64,
    /// first_mean - second_mean
    pub mean_difference: f64,
    pub confidence_level: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub statistic: f64,
    pub df: f64,
    /// Two-sided
    pub pvalue: f64,
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, ss / (n - 1.0))
}

/// Run the test on two groups of at least two observations each
pub fn welch_t_test(
    first: &GroupSample,
    second: &GroupSample,
    confidence_level: f64,
) -> Result<WelchTest> {
    for group in [first, second] {
        if group.values.len() < 2 {
            return Err(AnalysisError::EmptyGroup {
                group: group.label.clone(),
                size: group.values.len(),
            });
        }
    }

    let (m1, v1) = mean_and_variance(&first.values);
    let (m2, v2) = mean_and_variance(&second.values);
    let n1 = first.values.len() as f64;
    let n2 = second.values.len() as f64;

    let se1 = v1 / n1;
    let se2 = v2 / n2;
    let stderr = (se1 + se2).sqrt();
    if stderr == 0.0 {
        return Err(AnalysisError::DegenerateData(format!(
            "both '{}' and '{}' have zero variance",
            first.label, second.label
        )));
    }

    let df = (se1 + se2).powi(2) / (se1.powi(2) / (n1 - 1.0) + se2.powi(2) / (n2 - 1.0));
    let difference = m1 - m2;
    let statistic = difference / stderr;
    let t_dist = StudentsT::new(0.0, 1.0, df).map_err(|e| {
        AnalysisError::DegenerateData(format!("Welch t distribution (df = {}): {}", df, e))
    })?;
    let pvalue = (2.0 * t_dist.sf(statistic.abs())).min(1.0);
    let critical = t_dist.inverse_cdf(0.5 + confidence_level / 2.0);

    tracing::debug!(
        "Welch test {} vs {}: t={:.4} df={:.3} p={:.6}",
        first.label,
        second.label,
        statistic,
        df,
        pvalue
    );

    Ok(WelchTest {
        first_group: first.label.clone(),
        second_group: second.label.clone(),
        first_mean: m1,
        second_mean: m2,
        mean_difference: difference,
        confidence_level,
        ci_lower: difference - critical * stderr,
        ci_upper: difference + critical * stderr,
        statistic,
        df,
        pvalue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::annotate;
    use crate::dataset::Dataset;
    use crate::summary::split_by_transmission;

    fn sample(label: &str, values: &[f64]) -> GroupSample {
        GroupSample {
            label: label.to_string(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn test_significant_difference() {
        let baseline = sample("baseline", &[10.0, 12.0, 11.0, 13.0, 10.0]);
        let current = sample("current", &[25.0, 27.0, 26.0, 28.0, 25.0]);

        let result = welch_t_test(&baseline, &current, 0.95).unwrap();
        assert!(result.pvalue < 0.05);
        assert!(result.mean_difference < 0.0);
        assert!(result.ci_upper < 0.0);
    }

    #[test]
    fn test_no_difference() {
        let baseline = sample("baseline", &[10.0, 12.0, 11.0, 13.0, 10.0]);
        let current = sample("current", &[11.0, 13.0, 10.0, 12.0, 11.0]);

        let result = welch_t_test(&baseline, &current, 0.95).unwrap();
        assert!(result.pvalue >= 0.05);
        assert!(result.ci_lower < 0.0 && result.ci_upper > 0.0);
    }

    #[test]
    fn test_equal_sizes_and_variances_df() {
        // Equal n and variance: df = 2(n - 1)
        let a = sample("a", &[1.0, 2.0, 3.0, 4.0]);
        let b = sample("b", &[2.0, 3.0, 4.0, 5.0]);
        let result = welch_t_test(&a, &b, 0.95).unwrap();
        assert!((result.df - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_swapping_groups_negates_statistic() {
        let a = sample("a", &[3.1, 4.7, 5.0, 2.2, 6.3]);
        let b = sample("b", &[7.5, 8.1, 6.9]);
        let ab = welch_t_test(&a, &b, 0.95).unwrap();
        let ba = welch_t_test(&b, &a, 0.95).unwrap();
        assert!((ab.statistic + ba.statistic).abs() < 1e-12);
        assert!((ab.pvalue - ba.pvalue).abs() < 1e-12);
        assert!((ab.df - ba.df).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_samples() {
        let a = sample("a", &[10.0]);
        let b = sample("b", &[12.0, 13.0]);
        let err = welch_t_test(&a, &b, 0.95).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyGroup { size: 1, .. }));
    }

    #[test]
    fn test_empty_group() {
        let a = sample("a", &[]);
        let b = sample("b", &[12.0, 13.0]);
        assert!(matches!(
            welch_t_test(&a, &b, 0.95),
            Err(AnalysisError::EmptyGroup { size: 0, .. })
        ));
    }

    #[test]
    fn test_zero_variance_rejected() {
        let a = sample("a", &[5.0, 5.0]);
        let b = sample("b", &[5.0, 5.0, 5.0]);
        assert!(matches!(
            welch_t_test(&a, &b, 0.95),
            Err(AnalysisError::DegenerateData(_))
        ));
    }

    #[test]
    fn test_transmission_groups() {
        let table = annotate(&Dataset::bundled().unwrap()).unwrap();
        let [automatic, manual] = split_by_transmission(&table);
        let result = welch_t_test(&automatic, &manual, 0.95).unwrap();

        assert!((result.statistic + 3.767_123).abs() < 1e-6);
        assert!((result.df - 18.332_252).abs() < 1e-6);
        assert!((result.pvalue - 0.001_373_638).abs() < 1e-9);

        // Half-width is t(0.975, df) standard errors
        let stderr = result.mean_difference / result.statistic;
        let critical = (result.ci_upper - result.mean_difference) / stderr;
        assert!((critical - 2.098_214).abs() < 1e-6);
        assert!((result.ci_lower + 11.280_194).abs() < 1e-6);
    }

    #[test]
    fn test_agrees_with_aprender() {
        let a = [10.0, 12.0, 11.0, 13.0, 10.0, 14.5];
        let b = [11.0, 15.0, 17.0, 12.0, 16.0];
        let ours = welch_t_test(&sample("a", &a), &sample("b", &b), 0.95).unwrap();

        let a32: Vec<f32> = a.iter().map(|v| *v as f32).collect();
        let b32: Vec<f32> = b.iter().map(|v| *v as f32).collect();
        let theirs = aprender::stats::hypothesis::ttest_ind(&a32, &b32, false).unwrap();

        assert!((ours.statistic.abs() - f64::from(theirs.statistic).abs()).abs() < 1e-3);
        assert!((ours.df - f64::from(theirs.df)).abs() < 1e-2);
    }
}
