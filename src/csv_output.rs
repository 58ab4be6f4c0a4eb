//! CSV output format for spreadsheet analysis
//!
//! Two tables: the model comparison (the default `--format csv` output) and
//! the coefficient table of every fitted candidate in long form.

use crate::compare::ComparisonRow;
use crate::model::CandidateModel;
use crate::pipeline::AnalysisReport;

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Comparison table formatter
#[derive(Debug)]
pub struct CsvOutput<'a> {
    rows: &'a [ComparisonRow],
    selected: Option<usize>,
    alpha: f64,
}

impl<'a> CsvOutput<'a> {
    pub fn new(rows: &'a [ComparisonRow], selected: Option<usize>, alpha: f64) -> Self {
        Self {
            rows,
            selected,
            alpha,
        }
    }

    pub fn from_report(report: &'a AnalysisReport) -> Self {
        Self::new(
            &report.comparison,
            Some(report.selected),
            report.config.significance_level,
        )
    }

    fn header() -> &'static str {
        "model,role,formula,adj_r_squared,transmission_p,qualifies,selected"
    }

    fn format_row(&self, index: usize, row: &ComparisonRow) -> String {
        [
            escape_field(&row.name),
            escape_field(row.role.label()),
            escape_field(&row.formula.to_string()),
            format!("{:.4}", row.adj_r_squared),
            format!("{:.4}", row.transmission_p),
            row.qualifies(self.alpha).to_string(),
            (self.selected == Some(index)).to_string(),
        ]
        .join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str(Self::header());
        output.push('\n');
        for (i, row) in self.rows.iter().enumerate() {
            output.push_str(&self.format_row(i, row));
            output.push('\n');
        }
        output
    }
}

/// Long-form coefficient table: one line per (model, term)
#[derive(Debug)]
pub struct CsvCoefficientOutput<'a> {
    models: Vec<&'a CandidateModel>,
}

impl<'a> CsvCoefficientOutput<'a> {
    pub fn new(models: Vec<&'a CandidateModel>) -> Self {
        Self { models }
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::from("model,formula,term,estimate,std_error,t_value,p_value\n");
        for model in &self.models {
            let formula = escape_field(&model.formula.to_string());
            for c in &model.fit.coefficients {
                output.push_str(&format!(
                    "{},{},{},{},{},{},{}\n",
                    escape_field(&model.name),
                    formula,
                    escape_field(&c.name),
                    c.estimate,
                    c.std_error,
                    c.t_value,
                    c.p_value
                ));
            }
        }
        output
    }
}
