//! 로그 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`AuthwatchConfig`](authwatch_core::config::AuthwatchConfig)에서
//! `[detection]`과 `[monitor]` 섹션을 합쳐 파이프라인 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```
//! use authwatch_core::config::AuthwatchConfig;
//! use authwatch_log_pipeline::config::PipelineConfig;
//!
//! let core_config = AuthwatchConfig::default();
//! let config = PipelineConfig::from_core(&core_config);
//! assert_eq!(config.failure_threshold, 5);
//! ```

use std::path::Path;
use std::time::Duration;

use authwatch_core::config::{AuthwatchConfig, ReplayMode};
use serde::{Deserialize, Serialize};

use crate::error::LogPipelineError;
use crate::rule::DetectionPolicy;

/// 폴링 간격 상한 (초)
const MAX_POLL_INTERVAL_SECS: u64 = 86_400;

/// 라인 길이 상한 (바이트)
const MAX_LINE_LENGTH_LIMIT: usize = 1024 * 1024;

/// 로그 파이프라인 설정
///
/// core 설정에서 파생되며, 파이프라인 내부에서 사용하는 추가 설정을 포함합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 업무 시작 시각 (포함)
    pub business_hours_start: u32,
    /// 업무 종료 시각 (제외)
    pub business_hours_end: u32,
    /// 반복 실패 임계값
    pub failure_threshold: u64,
    /// 특권 계정 이름
    pub privileged_user: String,
    /// 인증 로그 경로
    pub log_path: String,
    /// 폴링 간격 (초)
    pub poll_interval_secs: u64,
    /// 감시 시작 위치
    pub replay_mode: ReplayMode,
    /// 주기적 보고서 간격 (초, 0이면 비활성)
    pub report_interval_secs: u64,
    /// 알림 파일 경로 (빈 문자열이면 기록하지 않음)
    pub alert_path: String,
    /// 보고서 경로
    pub report_path: String,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 최대 라인 길이 (바이트)
    pub max_line_length: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_core(&AuthwatchConfig::default())
    }
}

impl PipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &AuthwatchConfig) -> Self {
        Self {
            business_hours_start: core.detection.business_hours_start,
            business_hours_end: core.detection.business_hours_end,
            failure_threshold: core.detection.failure_threshold,
            privileged_user: core.detection.privileged_user.clone(),
            log_path: core.monitor.log_path.clone(),
            poll_interval_secs: core.monitor.poll_interval_secs,
            replay_mode: core.monitor.replay_mode,
            report_interval_secs: core.monitor.report_interval_secs,
            alert_path: core.monitor.alert_path.clone(),
            report_path: core.monitor.report_path.clone(),
            max_line_length: 64 * 1024,
        }
    }

    /// 규칙 엔진용 탐지 파라미터
    pub fn policy(&self) -> DetectionPolicy {
        DetectionPolicy {
            business_hours_start: self.business_hours_start,
            business_hours_end: self.business_hours_end,
            failure_threshold: self.failure_threshold,
            privileged_user: self.privileged_user.clone(),
        }
    }

    /// 폴링 간격
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// 주기적 보고서 간격. 0이면 `None`.
    pub fn report_interval(&self) -> Option<Duration> {
        (self.report_interval_secs > 0).then(|| Duration::from_secs(self.report_interval_secs))
    }

    /// 알림 파일 경로. 비어 있으면 기록하지 않습니다.
    pub fn alert_path(&self) -> Option<&Path> {
        let trimmed = self.alert_path.trim();
        (!trimmed.is_empty()).then(|| Path::new(trimmed))
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        if self.business_hours_end > 24 {
            return Err(config_err("business_hours_end", "must be at most 24".to_owned()));
        }

        if self.business_hours_start >= self.business_hours_end {
            return Err(config_err(
                "business_hours_start",
                format!("must be lower than business_hours_end ({})", self.business_hours_end),
            ));
        }

        if self.failure_threshold == 0 {
            return Err(config_err("failure_threshold", "must be greater than 0".to_owned()));
        }

        if self.privileged_user.trim().is_empty() {
            return Err(config_err("privileged_user", "must not be empty".to_owned()));
        }

        if self.log_path.trim().is_empty() {
            return Err(config_err("log_path", "must not be empty".to_owned()));
        }

        if self.poll_interval_secs == 0 || self.poll_interval_secs > MAX_POLL_INTERVAL_SECS {
            return Err(config_err(
                "poll_interval_secs",
                format!("must be 1-{MAX_POLL_INTERVAL_SECS}"),
            ));
        }

        if self.report_path.trim().is_empty() {
            return Err(config_err("report_path", "must not be empty".to_owned()));
        }

        if self.max_line_length == 0 || self.max_line_length > MAX_LINE_LENGTH_LIMIT {
            return Err(config_err(
                "max_line_length",
                format!("must be 1-{MAX_LINE_LENGTH_LIMIT}"),
            ));
        }

        Ok(())
    }
}

fn config_err(field: &str, reason: String) -> LogPipelineError {
    LogPipelineError::Config {
        field: field.to_owned(),
        reason,
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 기존 설정에서 시작합니다.
    pub fn from_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// 업무 시간대 `[start, end)`를 설정합니다.
    pub fn business_hours(mut self, start: u32, end: u32) -> Self {
        self.config.business_hours_start = start;
        self.config.business_hours_end = end;
        self
    }

    /// 반복 실패 임계값을 설정합니다.
    pub fn failure_threshold(mut self, threshold: u64) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    /// 특권 계정 이름을 설정합니다.
    pub fn privileged_user(mut self, user: impl Into<String>) -> Self {
        self.config.privileged_user = user.into();
        self
    }

    /// 인증 로그 경로를 설정합니다.
    pub fn log_path(mut self, path: impl Into<String>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// 폴링 간격(초)을 설정합니다.
    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.config.poll_interval_secs = secs;
        self
    }

    /// 감시 시작 위치를 설정합니다.
    pub fn replay_mode(mut self, mode: ReplayMode) -> Self {
        self.config.replay_mode = mode;
        self
    }

    /// 주기적 보고서 간격(초)을 설정합니다.
    pub fn report_interval_secs(mut self, secs: u64) -> Self {
        self.config.report_interval_secs = secs;
        self
    }

    /// 알림 파일 경로를 설정합니다. 빈 문자열이면 기록하지 않습니다.
    pub fn alert_path(mut self, path: impl Into<String>) -> Self {
        self.config.alert_path = path.into();
        self
    }

    /// 보고서 경로를 설정합니다.
    pub fn report_path(mut self, path: impl Into<String>) -> Self {
        self.config.report_path = path.into();
        self
    }

    /// 최대 라인 길이를 설정합니다.
    pub fn max_line_length(mut self, len: usize) -> Self {
        self.config.max_line_length = len;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
