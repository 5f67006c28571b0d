//! 설정 관리 -- authwatch.toml 파싱 및 런타임 설정
//!
//! [`AuthwatchConfig`]는 모든 섹션의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`AUTHWATCH_DETECTION_FAILURE_THRESHOLD=3` 형식)
//! 3. 설정 파일 (`authwatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), authwatch_core::error::AuthwatchError> {
//! use authwatch_core::config::AuthwatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = AuthwatchConfig::load("authwatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = AuthwatchConfig::parse("[detection]\nfailure_threshold = 3")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AuthwatchError, ConfigError};

/// 폴링 간격 상한 (초)
const MAX_POLL_INTERVAL_SECS: u64 = 86_400;

/// authwatch 통합 설정
///
/// `authwatch.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthwatchConfig {
    /// 일반 설정 (로깅)
    #[serde(default)]
    pub general: GeneralConfig,
    /// 탐지 규칙 파라미터
    #[serde(default)]
    pub detection: DetectionConfig,
    /// 감시/출력 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl AuthwatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AuthwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값에 환경변수만 적용합니다.
    ///
    /// CLI가 기본 경로(`authwatch.toml`)를 사용할 때 호출합니다.
    /// 파일은 있지만 파싱/검증에 실패하면 에러를 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, AuthwatchError> {
        let path = path.as_ref();
        match Self::load(path).await {
            Err(AuthwatchError::Config(ConfigError::FileNotFound { .. })) => {
                tracing::info!(
                    path = %path.display(),
                    "config file not found, using defaults"
                );
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AuthwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                AuthwatchError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, AuthwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            AuthwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `AUTHWATCH_{SECTION}_{FIELD}`
    /// 예: `AUTHWATCH_MONITOR_POLL_INTERVAL_SECS=5`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "AUTHWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "AUTHWATCH_GENERAL_LOG_FORMAT");

        // Detection
        override_u32(
            &mut self.detection.business_hours_start,
            "AUTHWATCH_DETECTION_BUSINESS_HOURS_START",
        );
        override_u32(
            &mut self.detection.business_hours_end,
            "AUTHWATCH_DETECTION_BUSINESS_HOURS_END",
        );
        override_u64(
            &mut self.detection.failure_threshold,
            "AUTHWATCH_DETECTION_FAILURE_THRESHOLD",
        );
        override_string(
            &mut self.detection.privileged_user,
            "AUTHWATCH_DETECTION_PRIVILEGED_USER",
        );

        // Monitor
        override_string(&mut self.monitor.log_path, "AUTHWATCH_MONITOR_LOG_PATH");
        override_u64(
            &mut self.monitor.poll_interval_secs,
            "AUTHWATCH_MONITOR_POLL_INTERVAL_SECS",
        );
        override_replay_mode(&mut self.monitor.replay_mode, "AUTHWATCH_MONITOR_REPLAY_MODE");
        override_u64(
            &mut self.monitor.report_interval_secs,
            "AUTHWATCH_MONITOR_REPORT_INTERVAL_SECS",
        );
        override_string(&mut self.monitor.alert_path, "AUTHWATCH_MONITOR_ALERT_PATH");
        override_string(&mut self.monitor.report_path, "AUTHWATCH_MONITOR_REPORT_PATH");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), AuthwatchError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        self.detection.validate()?;

        if self.monitor.log_path.is_empty() {
            return Err(invalid("monitor.log_path", "must not be empty".to_owned()));
        }

        if self.monitor.poll_interval_secs == 0
            || self.monitor.poll_interval_secs > MAX_POLL_INTERVAL_SECS
        {
            return Err(invalid(
                "monitor.poll_interval_secs",
                format!("must be 1-{}", MAX_POLL_INTERVAL_SECS),
            ));
        }

        if self.monitor.report_path.is_empty() {
            return Err(invalid("monitor.report_path", "must not be empty".to_owned()));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> AuthwatchError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 탐지 규칙 파라미터
///
/// 업무 시간대는 반개구간 `[business_hours_start, business_hours_end)` 입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// 업무 시작 시각 (포함)
    pub business_hours_start: u32,
    /// 업무 종료 시각 (제외)
    pub business_hours_end: u32,
    /// 반복 실패 규칙 임계값 (IP당 FAIL 횟수)
    pub failure_threshold: u64,
    /// 특권 계정 이름 (대소문자 구분)
    pub privileged_user: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            business_hours_start: 8,
            business_hours_end: 18,
            failure_threshold: 5,
            privileged_user: "admin".to_owned(),
        }
    }
}

impl DetectionConfig {
    /// 탐지 파라미터를 검증합니다.
    pub fn validate(&self) -> Result<(), AuthwatchError> {
        if self.business_hours_end > 24 {
            return Err(invalid(
                "detection.business_hours_end",
                "must be at most 24".to_owned(),
            ));
        }

        if self.business_hours_start >= self.business_hours_end {
            return Err(invalid(
                "detection.business_hours_start",
                format!(
                    "must be lower than business_hours_end ({})",
                    self.business_hours_end
                ),
            ));
        }

        if self.failure_threshold == 0 {
            return Err(invalid(
                "detection.failure_threshold",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.privileged_user.trim().is_empty() {
            return Err(invalid(
                "detection.privileged_user",
                "must not be empty".to_owned(),
            ));
        }

        Ok(())
    }
}

/// 감시 시작 위치
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplayMode {
    /// 파일 처음부터 전체 재생 (기본값)
    #[default]
    FromStart,
    /// 현재 파일 끝부터 새 라인만 처리
    TailOnly,
}

impl ReplayMode {
    /// 문자열에서 재생 모드를 파싱합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "from-start" | "from_start" | "replay" => Some(Self::FromStart),
            "tail-only" | "tail_only" | "tail" => Some(Self::TailOnly),
            _ => None,
        }
    }
}

impl fmt::Display for ReplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromStart => f.write_str("from-start"),
            Self::TailOnly => f.write_str("tail-only"),
        }
    }
}

/// 감시 및 출력 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// 감시할 인증 로그 경로
    pub log_path: String,
    /// 폴링 간격 (초)
    pub poll_interval_secs: u64,
    /// 시작 위치
    pub replay_mode: ReplayMode,
    /// 주기적 보고서 재생성 간격 (초, 0이면 종료 시에만)
    pub report_interval_secs: u64,
    /// 알림 파일 경로 (빈 문자열이면 기록하지 않음)
    pub alert_path: String,
    /// 보안 보고서 경로
    pub report_path: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_path: "data/auth.log".to_owned(),
            poll_interval_secs: 30,
            replay_mode: ReplayMode::FromStart,
            report_interval_secs: 0,
            alert_path: "alertes.txt".to_owned(),
            report_path: "rapport_securite.txt".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_replay_mode(target: &mut ReplayMode, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match ReplayMode::from_str_loose(&val) {
            Some(mode) => *target = mode,
            None => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse replay mode from env var, ignoring"
            ),
        }
    }
}
