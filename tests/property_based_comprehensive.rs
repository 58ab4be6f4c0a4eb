//! Property-based tests for the analysis building blocks
//!
//! Covers the pure pieces that take arbitrary input:
//! 1. Selection rule
//! 2. Boxplot statistics
//! 3. Welch test symmetry
//! 4. Formula parsing
//! 5. Welch intervals and Q-Q plotting positions
//! 6. CSV loading of perturbed data

use mtreport::compare::{select_best, ComparisonRow};
use mtreport::dataset::{Column, Dataset};
use mtreport::diagnostics::plotting_positions;
use mtreport::model::{Formula, ModelRole};
use mtreport::summary::{boxplot_stats, welch_t_test, GroupSample};
use proptest::prelude::*;

fn row(adj_r_squared: f64, transmission_p: f64) -> ComparisonRow {
    ComparisonRow {
        name: "candidate".to_string(),
        role: ModelRole::Configured,
        formula: Formula::baseline(),
        adj_r_squared,
        transmission_p,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_selected_row_qualifies_and_dominates(
        rows in prop::collection::vec((0.0f64..1.0, 0.0f64..1.0), 0..12),
        alpha in 0.001f64..0.5,
    ) {
        let rows: Vec<ComparisonRow> = rows.into_iter().map(|(a, p)| row(a, p)).collect();

        match select_best(&rows, alpha) {
            Some(winner) => {
                prop_assert!(rows[winner].transmission_p < alpha);
                for r in rows.iter().filter(|r| r.qualifies(alpha)) {
                    prop_assert!(r.adj_r_squared <= rows[winner].adj_r_squared);
                }
            }
            None => prop_assert!(rows.iter().all(|r| !r.qualifies(alpha))),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_boxplot_is_ordered_and_partitions_data(
        values in prop::collection::vec(-1000.0f64..1000.0, 1..60),
    ) {
        let stats = boxplot_stats("group", &values).unwrap();

        prop_assert_eq!(stats.n, values.len());
        prop_assert!(stats.lower_whisker <= stats.lower_hinge);
        prop_assert!(stats.lower_hinge <= stats.median);
        prop_assert!(stats.median <= stats.upper_hinge);
        prop_assert!(stats.upper_hinge <= stats.upper_whisker);

        let inside = values
            .iter()
            .filter(|v| **v >= stats.lower_whisker && **v <= stats.upper_whisker)
            .count();
        prop_assert_eq!(inside + stats.outliers.len(), values.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_welch_swapping_groups_negates_statistic(
        a in prop::collection::vec(0.0f64..50.0, 2..20),
        b in prop::collection::vec(0.0f64..50.0, 2..20),
    ) {
        let first = GroupSample { label: "a".to_string(), values: a };
        let second = GroupSample { label: "b".to_string(), values: b };

        if let (Ok(ab), Ok(ba)) = (
            welch_t_test(&first, &second, 0.95),
            welch_t_test(&second, &first, 0.95),
        ) {
            prop_assert!((ab.statistic + ba.statistic).abs() < 1e-9);
            prop_assert!((ab.pvalue - ba.pvalue).abs() < 1e-9);
            prop_assert!(ab.df >= 1.0 - 1e-9);
            prop_assert!(ab.pvalue >= 0.0 && ab.pvalue <= 1.0);
            prop_assert!(ab.ci_lower <= ab.mean_difference && ab.mean_difference <= ab.ci_upper);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_formula_display_round_trips(
        picks in prop::collection::vec(0usize..10, 1..10),
    ) {
        let formula = Formula::new(picks.iter().map(|i| Column::REGRESSORS[*i]));
        let parsed = Formula::parse(&formula.to_string()).unwrap();
        prop_assert_eq!(parsed, formula);
    }

    #[test]
    fn prop_formula_parse_never_panics(text in "\\PC{0,40}") {
        let _ = Formula::parse(&text);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_welch_interval_widens_with_confidence(
        a in prop::collection::vec(0.0f64..50.0, 2..20),
        b in prop::collection::vec(0.0f64..50.0, 2..20),
    ) {
        let first = GroupSample { label: "a".to_string(), values: a };
        let second = GroupSample { label: "b".to_string(), values: b };

        if let (Ok(narrow), Ok(wide)) = (
            welch_t_test(&first, &second, 0.90),
            welch_t_test(&first, &second, 0.99),
        ) {
            prop_assert!(wide.ci_upper - wide.ci_lower > narrow.ci_upper - narrow.ci_lower);
            prop_assert!(wide.ci_lower < narrow.ci_lower);
        }
    }

    #[test]
    fn prop_plotting_positions_are_symmetric_probabilities(n in 1usize..200) {
        let positions = plotting_positions(n);
        prop_assert_eq!(positions.len(), n);
        prop_assert!(positions.iter().all(|p| *p > 0.0 && *p < 1.0));
        for pair in positions.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        prop_assert!((positions[0] + positions[n - 1] - 1.0).abs() < 1e-12);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(25))]

    #[test]
    fn prop_scaled_mpg_column_still_loads(scale in 0.5f64..2.0) {
        let bundled = Dataset::bundled().unwrap();
        let mut csv = String::from("model,mpg,cyl,disp,hp,drat,wt,qsec,vs,am,gear,carb\n");
        for r in bundled.records() {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{},{}\n",
                r.model, r.mpg * scale, r.cyl, r.disp, r.hp, r.drat, r.wt, r.qsec, r.vs, r.am, r.gear, r.carb
            ));
        }

        let dataset = Dataset::from_csv_str(&csv).unwrap();
        prop_assert_eq!(dataset.len(), 32);
        let total: f64 = dataset.column(Column::Mpg).iter().sum();
        prop_assert!((total - 642.9 * scale).abs() < 1e-6);
    }
}
