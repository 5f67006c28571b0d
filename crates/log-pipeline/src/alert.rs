//! 알림 생성 및 기록 -- 의심 판정을 [`Alert`]로 변환하고 알림 파일에 남깁니다.
//!
//! - [`AlertEmitter`]: 실행 단위의 인메모리 알림 시퀀스 (삽입 순서 = 로그 순서)
//! - [`AlertSink`]: 감시 모드용 append-only 알림 파일. 기록 실패는 경고로만 남기고,
//!   종료 시 헤더의 총 개수를 갱신합니다.
//! - [`write_alert_log`]: 배치 모드용. 총 개수 헤더와 함께 파일 전체를 다시 씁니다.
//!
//! # 알림 라인 형식
//! ```text
//! [2026-01-10 03:12:45] [WARNING] Connection outside business hours - 2026-01-10 03:12:45 USER=bob IP=1.2.3.4 STATUS=FAIL
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use authwatch_core::metrics as m;
use authwatch_core::types::Severity;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::LogPipelineError;
use crate::parser::LogRecord;
use crate::rule::{DetectionPolicy, ReasonCode, Verdict};

/// 알림 파일 제목
pub const ALERT_LOG_TITLE: &str = "SECURITY ALERT LOG";

/// 이유 문구 구분자
pub const REASON_SEPARATOR: &str = " | ";

/// 헤더의 개수 줄 접두사
const TOTAL_PREFIX: &str = "Total alerts: ";

/// 헤더 구분선 폭
const BANNER_WIDTH: usize = 60;

/// 의심 레코드 하나에 대한 알림
///
/// 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// `"<date> <time>"` 또는 `UNKNOWN_DATE`
    pub timestamp_label: String,
    /// 종합 심각도
    pub severity: Severity,
    /// 발동한 규칙 (선언 순서)
    pub reasons: Vec<ReasonCode>,
    /// `" | "`로 연결된 이유 문구
    pub reason_text: String,
    /// 원본 라인
    pub raw_line: String,
    /// 출발지 IP
    pub source_ip: Option<String>,
    /// 대상 사용자
    pub user: Option<String>,
    /// 시
    pub hour: Option<i32>,
}

impl Alert {
    /// 알림 파일에 기록되는 한 줄을 만듭니다.
    pub fn format_line(&self) -> String {
        format!(
            "[{}] [{}] {} - {}",
            self.timestamp_label,
            self.severity.label(),
            self.reason_text,
            self.raw_line
        )
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_line())
    }
}

/// 알림 생성기
///
/// 실행(run) 단위로 생성되며, 생성한 알림을 순서대로 보관합니다.
#[derive(Debug, Clone, Default)]
pub struct AlertEmitter {
    policy: DetectionPolicy,
    alerts: Vec<Alert>,
}

impl AlertEmitter {
    /// 새 알림 생성기를 만듭니다.
    pub fn new(policy: DetectionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// 의심 판정에서 알림을 생성해 시퀀스에 추가합니다.
    ///
    /// 의심이 아닌 판정이면 아무것도 하지 않고 `None`을 반환합니다.
    pub fn emit(&mut self, record: &LogRecord, verdict: &Verdict) -> Option<Alert> {
        if !verdict.is_suspect {
            return None;
        }

        let reason_text = verdict
            .reasons
            .iter()
            .map(|code| self.policy.reason_text(*code))
            .collect::<Vec<_>>()
            .join(REASON_SEPARATOR);

        let alert = Alert {
            timestamp_label: record.timestamp_label(),
            severity: verdict.severity,
            reasons: verdict.reasons.clone(),
            reason_text,
            raw_line: record.line.clone(),
            source_ip: record.source_ip.clone(),
            user: record.user.clone(),
            hour: record.hour,
        };

        metrics::counter!(m::ALERTS_TOTAL, m::LABEL_SEVERITY => alert.severity.label())
            .increment(1);
        tracing::info!(
            severity = %alert.severity,
            reasons = ?alert.reasons,
            source_ip = alert.source_ip.as_deref().unwrap_or("-"),
            user = alert.user.as_deref().unwrap_or("-"),
            "suspicious authentication event"
        );

        self.alerts.push(alert.clone());
        Some(alert)
    }

    /// 생성된 알림 (로그 순서)
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// 생성된 알림 수
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// 알림이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

fn banner() -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!("{rule}\n{ALERT_LOG_TITLE}\n{rule}\n\n")
}

fn header(count: usize) -> String {
    format!("{}{TOTAL_PREFIX}{count}\n\n", banner())
}

/// 헤더(배너 + 개수 줄)를 건너뛴 알림 본문
fn alert_body(content: &str) -> &str {
    let body = content.strip_prefix(banner().as_str()).unwrap_or(content);
    match body
        .strip_prefix(TOTAL_PREFIX)
        .and_then(|rest| rest.split_once('\n'))
    {
        Some((_, rest)) => rest.strip_prefix('\n').unwrap_or(rest),
        None => body,
    }
}

/// 배치 모드 알림 파일 내용을 만듭니다.
pub fn render_alert_log(alerts: &[Alert]) -> String {
    let mut out = header(alerts.len());
    for alert in alerts {
        out.push_str(&alert.format_line());
        out.push('\n');
    }
    out
}

/// 배치 모드 알림 파일을 씁니다 (기존 내용 덮어쓰기).
pub async fn write_alert_log(path: &Path, alerts: &[Alert]) -> Result<(), LogPipelineError> {
    tokio::fs::write(path, render_alert_log(alerts))
        .await
        .map_err(|source| LogPipelineError::AlertWrite {
            path: path.display().to_string(),
            source,
        })?;
    tracing::info!(path = %path.display(), alerts = alerts.len(), "alert log written");
    Ok(())
}

/// 감시 모드 append-only 알림 파일
///
/// 파일이 새로 만들어지면(또는 비어 있으면) 개수 없는 배너를 먼저 씁니다.
/// 종료 시 [`AlertSink::finalize`]가 파일 전체의 알림 수로 헤더를 다시 씁니다.
/// 기록 실패는 [`AlertSink::persist`]에서 경고로 처리되며 수집을 멈추지 않습니다.
#[derive(Debug)]
pub struct AlertSink {
    path: PathBuf,
    file: Option<tokio::fs::File>,
    written: u64,
    write_errors: u64,
}

impl AlertSink {
    /// 새 알림 싱크를 생성합니다. 파일은 첫 기록 시 열립니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            written: 0,
            write_errors: 0,
        }
    }

    /// 알림 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 기록된 알림 수
    pub fn written(&self) -> u64 {
        self.written
    }

    /// 기록 실패 횟수
    pub fn write_errors(&self) -> u64 {
        self.write_errors
    }

    /// 알림들을 파일에 추가합니다.
    pub async fn append(&mut self, alerts: &[Alert]) -> Result<(), LogPipelineError> {
        if alerts.is_empty() {
            return Ok(());
        }

        let mut buf = String::new();
        for alert in alerts {
            buf.push_str(&alert.format_line());
            buf.push('\n');
        }

        let result = async {
            let file = self.open().await?;
            file.write_all(buf.as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(source) = result {
            // 다음 기록 때 다시 연다
            self.file = None;
            return Err(LogPipelineError::AlertWrite {
                path: self.path.display().to_string(),
                source,
            });
        }

        self.written += alerts.len() as u64;
        Ok(())
    }

    /// 알림들을 기록하고, 실패하면 경고만 남깁니다.
    ///
    /// 기록된 알림 수를 반환합니다 (실패 시 0).
    pub async fn persist(&mut self, alerts: &[Alert]) -> usize {
        match self.append(alerts).await {
            Ok(()) => alerts.len(),
            Err(e) => {
                self.write_errors += 1;
                metrics::counter!(m::ALERT_WRITE_ERRORS_TOTAL).increment(alerts.len() as u64);
                tracing::warn!(error = %e, dropped = alerts.len(), "alert persistence failed");
                0
            }
        }
    }

    /// 헤더를 파일에 들어 있는 알림 수로 다시 씁니다.
    ///
    /// 이전 세션에서 이어 쓴 알림도 개수에 포함됩니다. 열린 핸들은 닫히며,
    /// 이후 기록은 다시 연 파일 끝에 이어집니다. 파일에 든 알림 수를 반환합니다.
    pub async fn finalize(&mut self) -> Result<usize, LogPipelineError> {
        self.file = None;
        let write_err = |source| LogPipelineError::AlertWrite {
            path: self.path.display().to_string(),
            source,
        };

        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(write_err(e)),
        };
        let body = alert_body(&content);
        let count = body.lines().filter(|l| l.starts_with('[')).count();

        let mut out = header(count);
        out.push_str(body);
        tokio::fs::write(&self.path, out).await.map_err(write_err)?;
        tracing::info!(path = %self.path.display(), alerts = count, "alert log header updated");
        Ok(count)
    }

    async fn open(&mut self) -> std::io::Result<&mut tokio::fs::File> {
        if self.file.is_none() {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            if file.metadata().await?.len() == 0 {
                file.write_all(banner().as_bytes()).await?;
            }
            tracing::debug!(path = %self.path.display(), "alert log opened for append");
            self.file = Some(file);
        }
        self.file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("alert log handle unavailable"))
    }
}
