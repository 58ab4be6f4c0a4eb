//! CLI argument parsing for mtreport

use crate::config::AnalysisConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the analysis report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
    /// HTML report with embedded plots
    Html,
}

#[derive(Parser, Debug)]
#[command(name = "mtreport")]
#[command(version)]
#[command(
    about = "Does transmission type affect fuel efficiency? Regression analysis of mtcars",
    long_about = None
)]
pub struct Cli {
    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Load observations from a CSV file instead of the bundled dataset
    #[arg(long = "data", value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Analysis configuration (TOML)
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Significance level for model selection (overrides config)
    #[arg(long = "alpha", value_name = "ALPHA")]
    pub alpha: Option<f64>,

    /// Largest subset size for best-subset search (overrides config)
    #[arg(long = "max-subset-size", value_name = "N")]
    pub max_subset_size: Option<usize>,

    /// With --format csv, emit every candidate's coefficients instead of the comparison table
    #[arg(long = "coefficients")]
    pub coefficients: bool,

    /// Enable debug tracing output (to stderr)
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Apply command-line overrides on top of `config`
    pub fn apply_overrides(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(alpha) = self.alpha {
            config.significance_level = alpha;
        }
        if let Some(size) = self.max_subset_size {
            config.max_subset_size = size;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["mtreport"]);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.output.is_none());
        assert!(cli.data.is_none());
        assert!(cli.config.is_none());
        assert!(cli.alpha.is_none());
        assert!(!cli.coefficients);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_formats() {
        for (name, format) in [
            ("text", OutputFormat::Text),
            ("json", OutputFormat::Json),
            ("csv", OutputFormat::Csv),
            ("html", OutputFormat::Html),
        ] {
            let cli = Cli::parse_from(["mtreport", "--format", name]);
            assert_eq!(cli.format, format);
        }
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["mtreport", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_cli_output_path() {
        let cli = Cli::parse_from(["mtreport", "-o", "report.html", "--format", "html"]);
        assert_eq!(cli.output, Some(PathBuf::from("report.html")));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["mtreport", "--alpha", "0.1", "--max-subset-size", "4"]);
        let config = cli.apply_overrides(AnalysisConfig::default());
        assert_eq!(config.significance_level, 0.1);
        assert_eq!(config.max_subset_size, 4);
        assert_eq!(config.confidence_level, 0.95);
    }

    #[test]
    fn test_cli_no_overrides_keeps_config() {
        let cli = Cli::parse_from(["mtreport"]);
        let config = cli.apply_overrides(AnalysisConfig::strict());
        assert_eq!(config, AnalysisConfig::strict());
    }
}
