//! 파이프라인 오케스트레이션 -- 파싱/통계/규칙 평가/알림의 흐름을 관리합니다.
//!
//! # 내부 아키텍처
//! ```text
//! line -> AuthLogParser -> FailureCounter (FAIL) -> RuleEngine -> AlertEmitter
//! ```
//!
//! # 배치 모드와 감시 모드의 차이
//! - 배치 ([`DetectionState::ingest_batch`]): 먼저 전체 라인의 실패를 집계한 뒤
//!   두 번째 단계에서 규칙을 평가합니다. 반복 실패 규칙은 파일 전체의 **최종** 카운트와 비교합니다.
//! - 감시 ([`DetectionState::ingest_live`]): 라인마다 카운터를 갱신하고 바로 평가합니다.
//!   카운트는 **지금까지의 누적값**이므로, 같은 IP의 앞선 라인은 임계값 도달 전이면 알림이 없습니다.

use std::path::Path;
use std::sync::Arc;

use authwatch_core::metrics as m;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

use crate::alert::{Alert, AlertEmitter, write_alert_log};
use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::parser::{AuthLogParser, LogRecord};
use crate::report::{ReportSummary, summarize, write_report};
use crate::rule::{DetectionPolicy, RuleEngine};
use crate::stats::FailureCounter;

/// 감시 태스크와 보고서 태스크가 공유하는 탐지 상태
///
/// 락은 인메모리 수집/스냅샷 동안에만 잡고, 파일 I/O 동안에는 잡지 않습니다.
pub type SharedDetectionState = Arc<Mutex<DetectionState>>;

/// 실행 모드 (메트릭 레이블)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// 두 단계 배치 분석
    Batch,
    /// 누적 감시
    Live,
}

impl IngestMode {
    fn label(self) -> &'static str {
        match self {
            Self::Batch => "batch",
            Self::Live => "live",
        }
    }
}

/// 한 실행(run)의 탐지 상태
///
/// 파서, 실패 카운터, 규칙 엔진, 알림 시퀀스를 소유합니다.
/// 실행마다 새로 만들어지므로 실행 간에 상태가 공유되지 않습니다.
#[derive(Debug, Clone)]
pub struct DetectionState {
    parser: AuthLogParser,
    counter: FailureCounter,
    engine: RuleEngine,
    emitter: AlertEmitter,
    lines_analyzed: u64,
}

impl Default for DetectionState {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl DetectionState {
    /// 파이프라인 설정으로 빈 상태를 생성합니다.
    pub fn new(config: &PipelineConfig) -> Self {
        let policy = config.policy();
        Self {
            parser: AuthLogParser::new().with_max_line_length(config.max_line_length),
            counter: FailureCounter::new(),
            engine: RuleEngine::new(policy.clone()),
            emitter: AlertEmitter::new(policy),
            lines_analyzed: 0,
        }
    }

    /// 공유 가능한 상태로 감쌉니다.
    pub fn into_shared(self) -> SharedDetectionState {
        Arc::new(Mutex::new(self))
    }

    /// 라인 하나를 누적 방식으로 처리합니다 (감시 모드).
    ///
    /// 실패 레코드면 카운터를 먼저 갱신한 뒤 평가합니다.
    /// 빈 라인은 건너뜁니다.
    pub fn ingest_live(&mut self, line: &str) -> Option<Alert> {
        let record = self.parse_line(line, IngestMode::Live)?;
        self.count_failure(&record);
        self.evaluate(&record)
    }

    /// 라인 묶음을 두 단계로 처리합니다 (배치 모드).
    ///
    /// 1단계에서 모든 실패를 집계하고, 2단계에서 최종 카운트로 평가합니다.
    /// 이번 호출에서 생성된 알림 수를 반환합니다.
    pub fn ingest_batch<'a, I>(&mut self, lines: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let records: Vec<LogRecord> = lines
            .into_iter()
            .filter_map(|line| self.parse_line(line, IngestMode::Batch))
            .collect();

        for record in &records {
            self.count_failure(record);
        }

        let before = self.emitter.len();
        for record in &records {
            self.evaluate(record);
        }
        let produced = self.emitter.len() - before;

        tracing::debug!(
            records = records.len(),
            alerts = produced,
            distinct_ips = self.counter.distinct_ips(),
            "batch ingested"
        );
        produced
    }

    fn parse_line(&mut self, line: &str, mode: IngestMode) -> Option<LogRecord> {
        if line.trim().is_empty() {
            return None;
        }
        self.lines_analyzed += 1;
        metrics::counter!(m::LINES_PROCESSED_TOTAL, m::LABEL_MODE => mode.label()).increment(1);
        Some(self.parser.parse(line))
    }

    fn count_failure(&mut self, record: &LogRecord) {
        if let Some(ip) = record.failed_source() {
            let count = self.counter.record_failure(ip);
            metrics::counter!(m::FAILURES_TOTAL).increment(1);
            tracing::trace!(ip, count, "authentication failure recorded");
        }
    }

    fn evaluate(&mut self, record: &LogRecord) -> Option<Alert> {
        let verdict = self.engine.evaluate(record, &self.counter);
        self.emitter.emit(record, &verdict)
    }

    /// 현재 상태의 보고서 요약
    pub fn summary(&self) -> ReportSummary {
        summarize(
            self.emitter.alerts(),
            &self.counter,
            self.lines_analyzed,
            self.engine.policy(),
        )
    }

    /// 실패 카운터
    pub fn counter(&self) -> &FailureCounter {
        &self.counter
    }

    /// 생성된 알림 (로그 순서)
    pub fn alerts(&self) -> &[Alert] {
        self.emitter.alerts()
    }

    /// 분석한 (비어 있지 않은) 라인 수
    pub fn lines_analyzed(&self) -> u64 {
        self.lines_analyzed
    }

    /// 탐지 파라미터
    pub fn policy(&self) -> &DetectionPolicy {
        self.engine.policy()
    }
}

/// 배치 분석기
///
/// 로그 파일 전체를 읽어 두 단계로 분석합니다.
/// 원본 로그를 읽을 수 없으면 분석을 중단합니다.
///
/// # 사용 예시
/// ```no_run
/// # async fn example() -> Result<(), authwatch_log_pipeline::LogPipelineError> {
/// use authwatch_log_pipeline::{BatchAnalyzer, PipelineConfig};
///
/// let analyzer = BatchAnalyzer::new(PipelineConfig::default());
/// let state = analyzer.analyze().await?;
/// analyzer.persist(&state).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BatchAnalyzer {
    config: PipelineConfig,
}

impl BatchAnalyzer {
    /// 새 배치 분석기를 생성합니다.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// 분석기 설정
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 설정된 로그 파일을 분석합니다.
    pub async fn analyze(&self) -> Result<DetectionState, LogPipelineError> {
        self.analyze_file(Path::new(&self.config.log_path)).await
    }

    /// 지정한 로그 파일을 분석합니다.
    pub async fn analyze_file(&self, path: &Path) -> Result<DetectionState, LogPipelineError> {
        let content = read_source(path).await?;
        let state = self.analyze_str(&content);
        tracing::info!(
            path = %path.display(),
            lines = state.lines_analyzed(),
            alerts = state.alerts().len(),
            failures = state.counter().total_failures(),
            "batch analysis complete"
        );
        Ok(state)
    }

    /// 메모리에 있는 로그 내용을 분석합니다.
    pub fn analyze_str(&self, content: &str) -> DetectionState {
        let mut state = DetectionState::new(&self.config);
        state.ingest_batch(content.lines());
        state
    }

    /// 알림 파일(설정된 경우)과 보고서를 씁니다.
    ///
    /// 알림 파일 실패는 경고로 남기고, 보고서 실패는 에러로 반환합니다.
    pub async fn persist(&self, state: &DetectionState) -> Result<ReportSummary, LogPipelineError> {
        if let Some(alert_path) = self.config.alert_path()
            && let Err(e) = write_alert_log(alert_path, state.alerts()).await
        {
            metrics::counter!(m::ALERT_WRITE_ERRORS_TOTAL).increment(state.alerts().len() as u64);
            tracing::warn!(error = %e, "alert log not written");
        }

        let summary = state.summary();
        write_report(Path::new(&self.config.report_path), &summary).await?;
        Ok(summary)
    }
}

/// 원본 로그 파일을 통째로 읽습니다.
///
/// 잘못된 UTF-8 바이트는 대체 문자로 바꿉니다.
async fn read_source(path: &Path) -> Result<String, LogPipelineError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|source| LogPipelineError::SourceOpen {
            path: path.display().to_string(),
            source,
        })?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)
        .await
        .map_err(|source| LogPipelineError::SourceRead {
            path: path.display().to_string(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
