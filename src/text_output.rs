//! Plain-text report, the default output format

use crate::model::{CandidateModel, StepAction};
use crate::pipeline::AnalysisReport;
use std::fmt::Write;

/// p-values below 1e-4 switch to scientific notation
pub fn format_p_value(p: f64) -> String {
    if p.is_nan() {
        "NA".to_string()
    } else if p < 1e-4 {
        format!("{:.2e}", p)
    } else {
        format!("{:.4}", p)
    }
}

/// Text output formatter
#[derive(Debug)]
pub struct TextOutput<'a> {
    report: &'a AnalysisReport,
}

impl<'a> TextOutput<'a> {
    pub fn new(report: &'a AnalysisReport) -> Self {
        Self { report }
    }

    fn descriptive(&self, out: &mut String) -> std::fmt::Result {
        let summary = &self.report.summary;
        writeln!(
            out,
            "=== Fuel efficiency by transmission (n = {}) ===\n",
            self.report.observations
        )?;
        writeln!(out, "group            n      mean        sd    median")?;
        writeln!(out, "---------- ------- --------- --------- ---------")?;
        for g in &summary.groups {
            writeln!(
                out,
                "{:<10} {:>7} {:>9.3} {:>9.3} {:>9.3}",
                g.group, g.n, g.mean, g.sd, g.median
            )?;
        }

        writeln!(out, "\nBoxplot (Tukey hinges, whiskers at 1.5 x IQR):")?;
        for b in &summary.boxplots {
            writeln!(
                out,
                "  {:<10} [{:.2} | {:.2} {:.2} {:.2} | {:.2}] outliers: {}",
                b.group,
                b.lower_whisker,
                b.lower_hinge,
                b.median,
                b.upper_hinge,
                b.upper_whisker,
                if b.outliers.is_empty() {
                    "none".to_string()
                } else {
                    b.outliers
                        .iter()
                        .map(|v| format!("{:.2}", v))
                        .collect::<Vec<_>>()
                        .join(", ")
                }
            )?;
        }

        let w = &summary.welch;
        writeln!(out, "\nWelch two-sample t-test ({} vs {}):", w.first_group, w.second_group)?;
        writeln!(
            out,
            "  t = {:.4}, df = {:.4}, p-value = {}",
            w.statistic,
            w.df,
            format_p_value(w.pvalue)
        )?;
        writeln!(
            out,
            "  {:.0}% CI for the difference in means: [{:.4}, {:.4}]",
            w.confidence_level * 100.0,
            w.ci_lower,
            w.ci_upper
        )?;
        writeln!(
            out,
            "  mean of {}: {:.4}   mean of {}: {:.4}",
            w.first_group, w.first_mean, w.second_group, w.second_mean
        )
    }

    fn searches(&self, out: &mut String) -> std::fmt::Result {
        let models = &self.report.models;
        let trace = &models.stepwise_trace;

        writeln!(out, "\n=== Stepwise AIC (both directions) ===\n")?;
        writeln!(out, "Start:  {}  AIC={:.2}", trace.start, trace.start_aic)?;
        for step in &trace.steps {
            let verb = match step.action {
                StepAction::Add => "add",
                StepAction::Remove => "drop",
            };
            writeln!(out, "  {} {:<6} AIC={:.2}", verb, step.term.name(), step.aic)?;
        }
        writeln!(out, "Final:  {}  AIC={:.2}", trace.result, trace.final_aic)?;

        writeln!(out, "\n=== Best subsets ===\n")?;
        writeln!(out, "size   adj R²        Cp       BIC  columns")?;
        writeln!(out, "---- -------- --------- ---------  -------")?;
        let subsets = &models.subsets;
        for fit in &subsets.by_size {
            let mut marks = String::new();
            if fit.size == subsets.best_adj_r2_size {
                marks.push_str(" [max adjR²]");
            }
            if fit.size == subsets.best_cp_size {
                marks.push_str(" [min Cp]");
            }
            if fit.size == subsets.best_bic_size {
                marks.push_str(" [min BIC]");
            }
            writeln!(
                out,
                "{:>4} {:>8.4} {:>9.3} {:>9.3}  {}{}",
                fit.size,
                fit.adj_r_squared,
                fit.cp,
                fit.bic,
                fit.columns.join(", "),
                marks
            )?;
        }
        Ok(())
    }

    fn comparison(&self, out: &mut String) -> std::fmt::Result {
        let alpha = self.report.config.significance_level;
        writeln!(out, "\n=== Model comparison (alpha = {}) ===\n", alpha)?;
        writeln!(out, "  {:<42} {:>8} {:>10}", "formula", "adj R²", "am p-value")?;
        for (i, row) in self.report.comparison.iter().enumerate() {
            let marker = if i == self.report.selected { "*" } else { " " };
            writeln!(
                out,
                "{} {:<42} {:>8.4} {:>10.4}",
                marker,
                row.formula.to_string(),
                row.adj_r_squared,
                row.transmission_p
            )?;
        }
        writeln!(out, "\n* selected: am p < alpha with the highest adjusted R²")
    }

    fn coefficients(&self, out: &mut String, model: &CandidateModel) -> std::fmt::Result {
        let fit = &model.fit;
        writeln!(out, "\n=== Selected model: {} ===\n", model.formula)?;
        writeln!(
            out,
            "{:<12} {:>10} {:>10} {:>8} {:>10}",
            "term", "estimate", "std.error", "t", "p-value"
        )?;
        for c in &fit.coefficients {
            writeln!(
                out,
                "{:<12} {:>10.4} {:>10.4} {:>8.3} {:>10}",
                c.name,
                c.estimate,
                c.std_error,
                c.t_value,
                format_p_value(c.p_value)
            )?;
        }
        writeln!(
            out,
            "\nResidual standard error: {:.4} on {} degrees of freedom",
            fit.sigma, fit.df_residual
        )?;
        writeln!(
            out,
            "Multiple R-squared: {:.4}, Adjusted R-squared: {:.4}",
            fit.r_squared, fit.adj_r_squared
        )?;
        if let Some(f) = &fit.f_test {
            writeln!(
                out,
                "F-statistic: {:.2} on {} and {} DF, p-value: {}",
                f.statistic,
                f.df_model,
                f.df_residual,
                format_p_value(f.p_value)
            )?;
        }
        writeln!(out, "AIC: {:.4}   BIC: {:.4}", fit.aic, fit.bic)
    }

    fn diagnostics(&self, out: &mut String) -> std::fmt::Result {
        let d = &self.report.diagnostics;
        writeln!(out, "\n=== Residual diagnostics ===\n")?;
        writeln!(out, "Largest residuals:              {}", d.extreme_residuals.join(", "))?;
        writeln!(out, "Largest standardized residuals: {}", d.extreme_standardized.join(", "))?;
        writeln!(out, "Largest Cook's distance:        {}", d.extreme_cooks.join(", "))?;

        let max_cook = d
            .observations
            .iter()
            .map(|o| o.cooks_distance)
            .filter(|c| c.is_finite())
            .fold(0.0, f64::max);
        writeln!(out, "Maximum Cook's distance: {:.4}", max_cook)
    }

    fn findings(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "\n=== Findings ===\n")?;
        for paragraph in &self.report.narrative.paragraphs {
            writeln!(out, "{}\n", paragraph)?;
        }
        Ok(())
    }

    /// Render the full report
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self
            .descriptive(&mut out)
            .and_then(|_| self.searches(&mut out))
            .and_then(|_| self.comparison(&mut out))
            .and_then(|_| self.coefficients(&mut out, &self.report.winner))
            .and_then(|_| self.diagnostics(&mut out))
            .and_then(|_| self.findings(&mut out));
        out
    }
}
