// End-to-end analysis tests on the bundled dataset

use mtreport::annotate::{annotate, Transmission};
use mtreport::compare::{round_report, select_best};
use mtreport::config::AnalysisConfig;
use mtreport::dataset::Dataset;
use mtreport::model::{Criterion, ModelRole};
use mtreport::pipeline::{analyze_table, run_analysis, AnalysisReport};
use mtreport::AnalysisError;

fn report_with(config: AnalysisConfig) -> AnalysisReport {
    run_analysis(&Dataset::bundled().unwrap(), &config).unwrap()
}

fn default_report() -> AnalysisReport {
    report_with(AnalysisConfig::default())
}

#[test]
fn test_welch_manual_mean_is_higher() {
    let report = default_report();
    let welch = &report.summary.welch;

    assert!(welch.second_mean > welch.first_mean);
    assert!((welch.pvalue - 0.0014).abs() < 1e-4);
    assert!((welch.df - 18.33).abs() < 1e-2);
    assert!((welch.ci_lower + 11.28).abs() < 1e-2);
    assert!((welch.ci_upper + 3.21).abs() < 1e-2);
}

#[test]
fn test_baseline_r_squared() {
    let report = default_report();
    assert!((report.models.baseline.fit.r_squared - 0.36).abs() < 1e-2);
    assert!((report.narrative.baseline_r_squared - 0.36).abs() < 1e-2);
}

#[test]
fn test_weight_qsec_model_is_unique_qualifier() {
    let report = default_report();
    let alpha = report.config.significance_level;

    let qualifiers: Vec<usize> = report
        .comparison
        .iter()
        .enumerate()
        .filter(|(_, row)| row.qualifies(alpha))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(qualifiers, vec![report.selected]);

    assert_eq!(report.winner.formula.to_string(), "mpg ~ wt + qsec + am");
    assert_eq!(report.winner.role, ModelRole::BestSubsetCp);
    assert!(report.winner.transmission().unwrap().p_value < 0.05);
    assert_eq!(select_best(&report.comparison, alpha), Some(report.selected));
}

#[test]
fn test_comparison_table_contents() {
    let report = default_report();
    let rows: Vec<(String, f64, f64)> = report
        .comparison
        .iter()
        .map(|r| {
            (
                r.formula.to_string(),
                round_report(r.adj_r_squared),
                round_report(r.transmission_p),
            )
        })
        .collect();

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].1, 0.779);
    assert_eq!(rows[0].2, 0.7113);
    assert_eq!(rows[1].0, "mpg ~ cyl + hp + wt + am");
    assert_eq!(rows[1].1, 0.8401);
    assert_eq!(rows[2].0, "mpg ~ cyl + hp + wt + vs + am");
    assert_eq!(rows[2].1, 0.8418);
    assert_eq!(rows[3].0, "mpg ~ wt + qsec + am");
    assert_eq!(rows[3].1, 0.8336);
    assert_eq!(rows[3].2, 0.0467);
}

#[test]
fn test_subset_criteria_sizes() {
    let report = default_report();
    let subsets = &report.models.subsets;

    assert_eq!(subsets.max_size, 10);
    assert_eq!(subsets.best_cp_size, subsets.best_bic_size);
    assert_eq!(subsets.best_cp_size, 3);
    assert_eq!(subsets.best_adj_r2_size, 5);
    assert_eq!(
        subsets.best(Criterion::Bic).columns,
        vec!["wt", "qsec", "amManual"]
    );
}

#[test]
fn test_stepwise_bounded_by_regressor_count() {
    let report = default_report();
    let trace = &report.models.stepwise_trace;
    assert!(trace.converged);
    assert!(trace.steps.len() <= 10);
    assert_eq!(trace.steps.len(), 6);
}

#[test]
fn test_narrative_reports_winner() {
    let report = default_report();
    let narrative = &report.narrative;

    assert_eq!(narrative.formula, "mpg ~ wt + qsec + am");
    assert!((narrative.manual_effect - 2.9358).abs() < 1e-4);
    assert!(narrative.effect_ci_lower > 0.0);
    assert!(narrative.effect_ci_lower < narrative.manual_effect);
    assert!(narrative.effect_ci_upper > narrative.manual_effect);
    assert!((narrative.r_squared - 0.8497).abs() < 1e-4);
    assert_eq!(narrative.paragraphs.len(), 4);
    assert!(narrative.paragraphs[2].contains("wt, qsec"));
}

#[test]
fn test_runs_are_identical() {
    let config = AnalysisConfig {
        max_subset_size: 6,
        ..AnalysisConfig::default()
    };
    let first = report_with(config.clone());
    let second = report_with(config);

    assert_eq!(first, second);
    for (a, b) in first.models.all().iter().zip(second.models.all()) {
        assert_eq!(a.fit.coefficients, b.fit.coefficients);
    }
}

#[test]
fn test_annotation_round_trip() {
    let dataset = Dataset::bundled().unwrap();
    let table = annotate(&dataset).unwrap();
    let raw = table.to_raw().unwrap();

    assert_eq!(raw, dataset);
    assert_eq!(annotate(&raw).unwrap(), table);
}

#[test]
fn test_single_group_fails_with_empty_group() {
    let table = annotate(&Dataset::bundled().unwrap()).unwrap();
    let manual_only = table.filter(|r| r.am == Transmission::Manual);

    let err = analyze_table(&manual_only, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::EmptyGroup { ref group, size: 0 } if group == "Automatic"
    ));
}

#[test]
fn test_one_observation_group_fails() {
    let table = annotate(&Dataset::bundled().unwrap()).unwrap();
    let reduced = table.filter(|r| r.am == Transmission::Automatic || r.model == "Fiat 128");

    let err = analyze_table(&reduced, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyGroup { size: 1, .. }));
}

#[test]
fn test_strict_alpha_has_no_winner() {
    let err = run_analysis(
        &Dataset::bundled().unwrap(),
        &AnalysisConfig {
            max_subset_size: 6,
            ..AnalysisConfig::strict()
        },
    )
    .unwrap_err();
    assert!(matches!(err, AnalysisError::NoQualifyingModel { alpha } if alpha == 0.01));
}

#[test]
fn test_invalid_config_rejected() {
    let config = AnalysisConfig {
        confidence_level: 1.0,
        ..AnalysisConfig::default()
    };
    let err = run_analysis(&Dataset::bundled().unwrap(), &config).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidConfig(_)));
}
