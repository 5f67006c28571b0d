//! `authwatch analyze` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use authwatch_core::config::AuthwatchConfig;
use authwatch_core::types::Severity;
use authwatch_log_pipeline::report::ReportSummary;
use authwatch_log_pipeline::{BatchAnalyzer, PipelineConfig, PipelineConfigBuilder};

use super::path_string;
use crate::cli::AnalyzeArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, severity_label};

/// Execute the `analyze` command.
///
/// Runs the two-pass batch analysis, writes the alert log and the report
/// unless `--no-persist` is given, then prints the report.
///
/// # Errors
///
/// Returns `CliError::SourceUnavailable` if the log file cannot be read and
/// `CliError::Command` if the report cannot be written.
pub async fn execute(
    args: AnalyzeArgs,
    config: &AuthwatchConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let pipeline_config = build_config(&args, config)?;
    info!(
        source = %pipeline_config.log_path,
        threshold = pipeline_config.failure_threshold,
        "starting batch analysis"
    );

    let analyzer = BatchAnalyzer::new(pipeline_config);
    let state = analyzer.analyze().await?;

    let summary = if args.no_persist {
        state.summary()
    } else {
        analyzer.persist(&state).await?
    };

    let config = analyzer.config();
    let report = AnalyzeReport {
        source: config.log_path.clone(),
        alert_path: (!args.no_persist)
            .then(|| config.alert_path().map(path_string))
            .flatten(),
        report_path: (!args.no_persist).then(|| config.report_path.clone()),
        generated_at: chrono::Local::now().naive_local(),
        summary,
    };

    writer.render(&report)?;
    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration.
fn build_config(args: &AnalyzeArgs, config: &AuthwatchConfig) -> Result<PipelineConfig, CliError> {
    let mut builder = PipelineConfigBuilder::from_config(PipelineConfig::from_core(config));
    if let Some(log) = &args.log {
        builder = builder.log_path(path_string(log));
    }
    if let Some(alerts) = &args.alerts {
        builder = builder.alert_path(path_string(alerts));
    }
    if let Some(report) = &args.report {
        builder = builder.report_path(path_string(report));
    }
    Ok(builder.build()?)
}

/// Result of a batch analysis.
///
/// JSON output carries the structured summary; text output renders the
/// same report that is written to disk.
#[derive(Serialize)]
pub struct AnalyzeReport {
    /// Analysed log file
    pub source: String,
    /// Alert log written, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_path: Option<String>,
    /// Report written, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
    #[serde(skip)]
    pub generated_at: chrono::NaiveDateTime,
    pub summary: ReportSummary,
}

impl Render for AnalyzeReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let s = &self.summary;
        writeln!(w, "Analysis: {}", self.source.bold())?;
        writeln!(w, "  Lines analysed: {}", s.lines_analyzed)?;
        writeln!(
            w,
            "  Alerts: {} ({} {}, {} {})",
            s.total_alerts,
            s.critical_alerts,
            severity_label(Severity::Critical),
            s.warning_alerts,
            severity_label(Severity::Warning),
        )?;
        match &self.alert_path {
            Some(path) => writeln!(w, "  Alert log: {path}")?,
            None => writeln!(w, "  Alert log: {}", "(not written)".dimmed())?,
        }
        match &self.report_path {
            Some(path) => writeln!(w, "  Report: {path}")?,
            None => writeln!(w, "  Report: {}", "(not written)".dimmed())?,
        }
        writeln!(w)?;
        write!(
            w,
            "{}",
            authwatch_log_pipeline::render(s, self.generated_at)
        )?;
        Ok(())
    }
}
