//! 인증 로그 감시기
//!
//! 로그 파일을 주기적으로 폴링하며 새로 추가된 완전한 라인만 처리합니다.
//! `tail -f`와 유사한 동작을 비동기 방식으로 구현합니다.
//!
//! # 상태 전이
//! ```text
//! Idle --start()--> Polling --cancel--> Shutdown
//! ```
//!
//! # 동작
//! - 시작 위치: `from-start`면 0, `tail-only`면 현재 파일 끝
//! - 주기마다 `byte_offset`으로 seek 후 끝까지 읽고, 마지막 개행까지만 소비
//! - 개행으로 끝나지 않은 마지막 조각은 다음 주기로 미룸
//! - 파일 크기 < `byte_offset` 이면 truncation으로 보고 0부터 다시 읽음
//!   (리셋 이전 이력이 중복 집계될 수 있음)
//! - 파일 열기/읽기 실패는 경고 후 다음 주기에 재시도
//! - 취소는 주기 사이에서만 확인하므로 진행 중인 주기는 끝까지 수행

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use authwatch_core::config::ReplayMode;
use authwatch_core::metrics as m;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::sync::CancellationToken;

use crate::alert::AlertSink;
use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::pipeline::SharedDetectionState;

/// 감시기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MonitorState {
    /// 생성됨, 아직 시작하지 않음
    Idle,
    /// 폴링 중
    Polling,
    /// 종료됨
    Shutdown,
}

/// 파일 읽기 위치
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TailState {
    /// 다음에 읽을 바이트 오프셋
    pub byte_offset: u64,
}

/// 한 번의 폴링 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollOutcome {
    /// 처리한 라인 수
    pub lines: usize,
    /// 생성된 알림 수
    pub alerts: usize,
    /// 소비한 바이트 수
    pub bytes_consumed: u64,
    /// 이번 주기에 truncation이 감지되었는지
    pub truncated: bool,
}

/// 인증 로그 감시기
///
/// 파일 하나당 하나만 실행합니다. 탐지 상태는 [`SharedDetectionState`]로 공유되어
/// 보고서 태스크가 동시에 스냅샷을 뜰 수 있습니다.
pub struct TailMonitor {
    path: PathBuf,
    poll_interval: Duration,
    replay_mode: ReplayMode,
    tail: TailState,
    state: MonitorState,
    shared: SharedDetectionState,
    sink: Option<AlertSink>,
    cycles: u64,
}

impl TailMonitor {
    /// 새 감시기를 생성합니다.
    ///
    /// 알림 파일 경로가 설정되어 있으면 append-only 싱크를 만듭니다.
    pub fn new(config: &PipelineConfig, shared: SharedDetectionState) -> Self {
        Self {
            path: PathBuf::from(&config.log_path),
            poll_interval: config.poll_interval(),
            replay_mode: config.replay_mode,
            tail: TailState::default(),
            state: MonitorState::Idle,
            shared,
            sink: config.alert_path().map(AlertSink::new),
            cycles: 0,
        }
    }

    /// 폴링 간격을 덮어씁니다.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// 알림 싱크를 교체합니다. `None`이면 파일에 기록하지 않습니다.
    pub fn with_sink(mut self, sink: Option<AlertSink>) -> Self {
        self.sink = sink;
        self
    }

    /// 감시 대상 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 현재 상태
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// 현재 읽기 위치
    pub fn tail_state(&self) -> TailState {
        self.tail
    }

    /// 완료한 폴링 주기 수
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// 알림 싱크
    pub fn sink(&self) -> Option<&AlertSink> {
        self.sink.as_ref()
    }

    /// 종료 시 헤더 갱신용 가변 참조
    pub fn sink_mut(&mut self) -> Option<&mut AlertSink> {
        self.sink.as_mut()
    }

    /// 시작 위치를 정하고 폴링 상태로 전환합니다.
    ///
    /// `tail-only`인데 파일 크기를 알 수 없으면 0부터 시작합니다.
    pub async fn start(&mut self) {
        self.tail.byte_offset = match self.replay_mode {
            ReplayMode::FromStart => 0,
            ReplayMode::TailOnly => match tokio::fs::metadata(&self.path).await {
                Ok(meta) => meta.len(),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "log file not available yet, starting at offset 0"
                    );
                    0
                }
            },
        };
        self.state = MonitorState::Polling;
        tracing::info!(
            path = %self.path.display(),
            replay_mode = %self.replay_mode,
            offset = self.tail.byte_offset,
            interval_secs = self.poll_interval.as_secs(),
            "tail monitor started"
        );
    }

    /// 폴링 주기 하나를 수행합니다.
    ///
    /// 파일 접근 실패는 [`LogPipelineError::SourceOpen`] / [`LogPipelineError::SourceRead`]로
    /// 반환되며, 이때 `byte_offset`은 바뀌지 않습니다.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, LogPipelineError> {
        let mut outcome = PollOutcome::default();

        let mut file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|source| self.source_open(source))?;
        let size = file
            .metadata()
            .await
            .map_err(|source| self.source_read(source))?
            .len();

        if size < self.tail.byte_offset {
            tracing::warn!(
                path = %self.path.display(),
                offset = self.tail.byte_offset,
                size,
                "log truncation detected, re-reading from start"
            );
            metrics::counter!(m::TRUNCATIONS_TOTAL).increment(1);
            self.tail.byte_offset = 0;
            outcome.truncated = true;
        }

        if size == self.tail.byte_offset {
            return Ok(outcome);
        }

        file.seek(SeekFrom::Start(self.tail.byte_offset))
            .await
            .map_err(|source| self.source_read(source))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .await
            .map_err(|source| self.source_read(source))?;

        let Some(last_newline) = buf.iter().rposition(|b| *b == b'\n') else {
            tracing::debug!(
                path = %self.path.display(),
                pending = buf.len(),
                "partial line pending, waiting for newline"
            );
            return Ok(outcome);
        };
        let complete = &buf[..=last_newline];
        let text = String::from_utf8_lossy(complete);

        let alerts = {
            let mut state = self.shared.lock().await;
            let mut alerts = Vec::new();
            for line in text.lines() {
                outcome.lines += 1;
                if let Some(alert) = state.ingest_live(line) {
                    alerts.push(alert);
                }
            }
            alerts
        };

        outcome.bytes_consumed = complete.len() as u64;
        outcome.alerts = alerts.len();
        self.tail.byte_offset += outcome.bytes_consumed;

        if let Some(sink) = self.sink.as_mut() {
            sink.persist(&alerts).await;
        }

        Ok(outcome)
    }

    /// 취소될 때까지 폴링을 반복합니다.
    ///
    /// 취소 요청은 주기 사이의 대기 중에만 반영됩니다.
    pub async fn run(&mut self, cancel: CancellationToken) -> TailState {
        if self.state == MonitorState::Idle {
            self.start().await;
        }

        loop {
            match self.poll_once().await {
                Ok(outcome) => {
                    tracing::debug!(
                        cycle = self.cycles,
                        lines = outcome.lines,
                        alerts = outcome.alerts,
                        offset = self.tail.byte_offset,
                        truncated = outcome.truncated,
                        "poll cycle complete"
                    );
                }
                Err(e) => {
                    metrics::counter!(m::POLL_ERRORS_TOTAL).increment(1);
                    tracing::warn!(error = %e, "poll cycle skipped, retrying next interval");
                }
            }
            self.cycles += 1;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => {
                    tracing::info!("tail monitor received shutdown signal");
                    break;
                }
            }
        }

        self.state = MonitorState::Shutdown;
        tracing::info!(
            path = %self.path.display(),
            offset = self.tail.byte_offset,
            cycles = self.cycles,
            "tail monitor stopped"
        );
        self.tail
    }

    fn source_open(&self, source: std::io::Error) -> LogPipelineError {
        LogPipelineError::SourceOpen {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn source_read(&self, source: std::io::Error) -> LogPipelineError {
        LogPipelineError::SourceRead {
            path: self.path.display().to_string(),
            source,
        }
    }
}
