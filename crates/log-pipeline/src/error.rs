//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 로그 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogPipelineError> for AuthwatchError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 파싱은 실패하지 않으므로 파싱 에러 변형은 없습니다.
//! 필드가 없으면 레코드의 해당 필드가 `None`이 됩니다.

use authwatch_core::error::{AuthwatchError, ConfigError, PipelineError};

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 감시 대상 로그 파일 열기 실패
    #[error("cannot open source log {path}: {source}")]
    SourceOpen {
        /// 로그 파일 경로
        path: String,
        /// 원인
        #[source]
        source: std::io::Error,
    },

    /// 감시 대상 로그 파일 읽기/seek 실패
    #[error("cannot read source log {path}: {source}")]
    SourceRead {
        /// 로그 파일 경로
        path: String,
        /// 원인
        #[source]
        source: std::io::Error,
    },

    /// 알림 파일 기록 실패
    #[error("cannot write alert log {path}: {source}")]
    AlertWrite {
        /// 알림 파일 경로
        path: String,
        /// 원인
        #[source]
        source: std::io::Error,
    },

    /// 보고서 파일 기록 실패
    #[error("cannot write report {path}: {source}")]
    ReportWrite {
        /// 보고서 경로
        path: String,
        /// 원인
        #[source]
        source: std::io::Error,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// JSON 직렬화 에러
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LogPipelineError {
    /// 원본 로그 파일 접근 실패인지 확인합니다.
    ///
    /// 배치 모드에서는 치명적이고, 감시 모드에서는 다음 주기에 재시도합니다.
    pub fn is_source_error(&self) -> bool {
        matches!(self, Self::SourceOpen { .. } | Self::SourceRead { .. })
    }
}

impl From<LogPipelineError> for AuthwatchError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Config { field, reason } => {
                AuthwatchError::Config(ConfigError::InvalidValue { field, reason })
            }
            e @ (LogPipelineError::SourceOpen { .. } | LogPipelineError::SourceRead { .. }) => {
                AuthwatchError::Pipeline(PipelineError::SourceUnavailable(e.to_string()))
            }
            e => AuthwatchError::Pipeline(PipelineError::Output(e.to_string())),
        }
    }
}
