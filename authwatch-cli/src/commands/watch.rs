//! `authwatch watch` command handler

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use authwatch_core::config::{AuthwatchConfig, ReplayMode};
use authwatch_log_pipeline::report::run_periodic_reports;
use authwatch_log_pipeline::{
    DetectionState, PipelineConfig, PipelineConfigBuilder, TailMonitor, write_report,
};

use super::path_string;
use crate::cli::{OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Printed before monitoring starts.
pub const CUMULATIVE_NOTICE: &str = "note: live mode evaluates each line against the failures seen so far; \
an IP only trips the repeated-failure rule from its threshold-th failure onward";

/// Execute the `watch` command.
///
/// Runs the tailing monitor until Ctrl-C, with an optional periodic report
/// task sharing the same detection state. A final report is always written
/// on shutdown.
pub async fn execute(
    args: WatchArgs,
    config: &AuthwatchConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let cancel = CancellationToken::new();
    let signal_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("interrupt received, finishing current poll cycle"),
                Err(e) => warn!(error = %e, "cannot listen for ctrl-c, stopping"),
            }
            cancel.cancel();
        })
    };

    let result = run(args, config, writer, cancel).await;
    signal_task.abort();
    result
}

/// Monitoring loop driven by an external cancellation token.
pub async fn run(
    args: WatchArgs,
    config: &AuthwatchConfig,
    writer: &OutputWriter,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let pipeline_config = build_config(&args, config)?;

    if matches!(writer.format(), OutputFormat::Text) {
        eprintln!("{CUMULATIVE_NOTICE}");
    }

    let shared = DetectionState::new(&pipeline_config).into_shared();
    let mut monitor = TailMonitor::new(&pipeline_config, Arc::clone(&shared));
    let report_path = PathBuf::from(&pipeline_config.report_path);

    let reporter = pipeline_config.report_interval().map(|interval| {
        tokio::spawn(run_periodic_reports(
            Arc::clone(&shared),
            report_path.clone(),
            interval,
            cancel.clone(),
        ))
    });

    let tail = monitor.run(cancel.clone()).await;
    // the monitor only returns once cancelled; make sure the reporter follows
    cancel.cancel();
    if let Some(handle) = reporter
        && let Err(e) = handle.await
    {
        warn!(error = %e, "periodic report task ended abnormally");
    }

    let alerts_persisted = monitor.sink().map_or(0, |s| s.written());
    if let Some(sink) = monitor.sink_mut()
        && let Err(e) = sink.finalize().await
    {
        warn!(error = %e, "cannot update alert log header");
    }

    let summary = shared.lock().await.summary();
    write_report(&report_path, &summary).await?;

    let report = WatchReport {
        source: pipeline_config.log_path.clone(),
        replay_mode: pipeline_config.replay_mode.to_string(),
        cycles: monitor.cycles(),
        final_offset: tail.byte_offset,
        lines_analyzed: summary.lines_analyzed,
        total_alerts: summary.total_alerts,
        critical_alerts: summary.critical_alerts,
        warning_alerts: summary.warning_alerts,
        alerts_persisted,
        alert_path: pipeline_config.alert_path().map(path_string),
        report_path: pipeline_config.report_path.clone(),
    };
    writer.render(&report)?;
    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration.
fn build_config(args: &WatchArgs, config: &AuthwatchConfig) -> Result<PipelineConfig, CliError> {
    let mut builder = PipelineConfigBuilder::from_config(PipelineConfig::from_core(config));
    if let Some(log) = &args.log {
        builder = builder.log_path(path_string(log));
    }
    if args.from_start {
        builder = builder.replay_mode(ReplayMode::FromStart);
    }
    if args.tail_only {
        builder = builder.replay_mode(ReplayMode::TailOnly);
    }
    if let Some(secs) = args.interval {
        builder = builder.poll_interval_secs(secs);
    }
    if let Some(secs) = args.report_interval {
        builder = builder.report_interval_secs(secs);
    }
    Ok(builder.build()?)
}

/// Shutdown summary of a monitoring session.
#[derive(Serialize)]
pub struct WatchReport {
    pub source: String,
    pub replay_mode: String,
    pub cycles: u64,
    pub final_offset: u64,
    pub lines_analyzed: u64,
    pub total_alerts: usize,
    pub critical_alerts: usize,
    pub warning_alerts: usize,
    pub alerts_persisted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_path: Option<String>,
    pub report_path: String,
}

impl Render for WatchReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Monitoring stopped: {}", self.source.bold())?;
        writeln!(w, "  Replay mode: {}", self.replay_mode)?;
        writeln!(w, "  Poll cycles: {}", self.cycles)?;
        writeln!(w, "  Final offset: {} bytes", self.final_offset)?;
        writeln!(w, "  Lines analysed: {}", self.lines_analyzed)?;
        writeln!(
            w,
            "  Alerts: {} ({} critical, {} warning)",
            self.total_alerts,
            self.critical_alerts.to_string().red(),
            self.warning_alerts.to_string().yellow(),
        )?;
        match &self.alert_path {
            Some(path) => writeln!(w, "  Alert log: {path} ({} lines appended)", self.alerts_persisted)?,
            None => writeln!(w, "  Alert log: {}", "(disabled)".dimmed())?,
        }
        writeln!(w, "  Final report: {}", self.report_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn watch_args(log: PathBuf) -> WatchArgs {
        WatchArgs {
            log: Some(log),
            from_start: false,
            tail_only: false,
            interval: Some(1),
            report_interval: None,
        }
    }

    #[test]
    fn test_build_config_replay_overrides() {
        let mut args = watch_args("auth.log".into());
        args.tail_only = true;
        args.report_interval = Some(60);
        let config = build_config(&args, &AuthwatchConfig::default()).expect("valid");
        assert_eq!(config.replay_mode, ReplayMode::TailOnly);
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.report_interval(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_build_config_rejects_zero_interval() {
        let mut args = watch_args("auth.log".into());
        args.interval = Some(0);
        let err = build_config(&args, &AuthwatchConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_watch_report_render_text() {
        colored::control::set_override(false);
        let report = WatchReport {
            source: "data/auth.log".to_owned(),
            replay_mode: "tail-only".to_owned(),
            cycles: 12,
            final_offset: 4096,
            lines_analyzed: 40,
            total_alerts: 3,
            critical_alerts: 2,
            warning_alerts: 1,
            alerts_persisted: 3,
            alert_path: Some("alertes.txt".to_owned()),
            report_path: "rapport_securite.txt".to_owned(),
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("Monitoring stopped: data/auth.log"));
        assert!(output.contains("Alerts: 3 (2 critical, 1 warning)"));
        assert!(output.contains("alertes.txt (3 lines appended)"));
    }

    #[tokio::test]
    async fn test_run_until_cancelled_writes_final_report() {
        let dir = tempfile::tempdir().expect("temp dir");
        let log = dir.path().join("auth.log");
        tokio::fs::write(&log, "2026-01-10 03:00:00 USER=admin IP=1.1.1.1 STATUS=FAIL\n")
            .await
            .expect("write log");

        let mut config = AuthwatchConfig::default();
        config.monitor.alert_path = path_string(&dir.path().join("alerts.txt"));
        config.monitor.report_path = path_string(&dir.path().join("report.txt"));

        let cancel = CancellationToken::new();
        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                cancel.cancel();
            })
        };

        let writer = OutputWriter::new(OutputFormat::Json);
        run(watch_args(log), &config, &writer, cancel)
            .await
            .expect("watch should stop cleanly");
        canceller.await.expect("canceller");

        let report = tokio::fs::read_to_string(dir.path().join("report.txt"))
            .await
            .expect("final report written");
        assert!(report.contains("admin : 1 suspicious attempts"));

        let alerts = tokio::fs::read_to_string(dir.path().join("alerts.txt"))
            .await
            .expect("alert log appended");
        assert!(alerts.contains("[CRITICAL]"));
        assert!(alerts.contains("Total alerts: 1\n"));
    }
}
