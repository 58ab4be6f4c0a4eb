use anyhow::{Context, Result};
use clap::Parser;
use mtreport::cli::{Cli, OutputFormat};
use mtreport::config::AnalysisConfig;
use mtreport::csv_output::{CsvCoefficientOutput, CsvOutput};
use mtreport::dataset::Dataset;
use mtreport::html_output::HtmlOutput;
use mtreport::json_output::JsonOutput;
use mtreport::pipeline::{run_analysis, AnalysisReport};
use mtreport::text_output::TextOutput;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(args: &Cli) -> Result<AnalysisConfig> {
    let config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    let config = args.apply_overrides(config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

fn load_dataset(args: &Cli) -> Result<Dataset> {
    match &args.data {
        Some(path) => Dataset::from_path(path)
            .with_context(|| format!("Failed to load dataset {}", path.display())),
        None => Dataset::bundled().context("Failed to load bundled dataset"),
    }
}

fn render(args: &Cli, report: &AnalysisReport) -> Result<String> {
    let rendered = match args.format {
        OutputFormat::Text => TextOutput::new(report).to_text(),
        OutputFormat::Json => JsonOutput::new(report)
            .to_json()
            .context("Failed to serialize report")?,
        OutputFormat::Csv if args.coefficients => {
            CsvCoefficientOutput::new(report.models.all()).to_csv()
        }
        OutputFormat::Csv => CsvOutput::from_report(report).to_csv(),
        OutputFormat::Html => HtmlOutput::new(report).to_html(),
    };
    Ok(rendered)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = load_config(&args)?;
    let dataset = load_dataset(&args)?;
    let report = run_analysis(&dataset, &config).context("Analysis failed")?;
    let rendered = render(&args, &report)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}
