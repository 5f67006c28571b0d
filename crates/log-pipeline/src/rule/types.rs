//! 탐지 규칙 데이터 타입
//!
//! 규칙 이유 코드, 판정 결과, 탐지 파라미터를 정의합니다.

use std::fmt;

use authwatch_core::config::DetectionConfig;
use authwatch_core::types::Severity;
use serde::{Deserialize, Serialize};

/// 규칙 이유 코드
///
/// 선언 순서가 곧 보고 순서입니다 (반복 실패 → 업무 외 시간 → 특권 계정).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// IP의 실패 횟수가 임계값 이상
    IpRepeatedFailure,
    /// 업무 시간대 밖의 접속
    OffHours,
    /// 특권 계정 대상 시도
    AdminTarget,
}

impl ReasonCode {
    /// 규칙 선언 순서
    pub const ALL: [ReasonCode; 3] = [Self::IpRepeatedFailure, Self::OffHours, Self::AdminTarget];

    /// 이 규칙이 기여하는 심각도
    pub fn severity(&self) -> Severity {
        match self {
            Self::IpRepeatedFailure | Self::AdminTarget => Severity::Critical,
            Self::OffHours => Severity::Warning,
        }
    }

    /// 고정 코드 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IpRepeatedFailure => "IP_REPEATED_FAILURE",
            Self::OffHours => "OFF_HOURS",
            Self::AdminTarget => "ADMIN_TARGET",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 레코드 하나에 대한 판정
///
/// 레코드마다 새로 생성되며 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// 하나 이상의 규칙이 발동했는지
    pub is_suspect: bool,
    /// 발동한 규칙 (선언 순서)
    pub reasons: Vec<ReasonCode>,
    /// 종합 심각도
    pub severity: Severity,
}

impl Verdict {
    /// 발동한 이유 목록으로 판정을 만듭니다.
    ///
    /// 이유는 선언 순서로 정렬되고, 심각도는 기여 심각도의 최댓값입니다.
    /// 이유가 없으면 `Info`.
    pub fn from_reasons(mut reasons: Vec<ReasonCode>) -> Self {
        reasons.sort();
        reasons.dedup();
        let severity = reasons
            .iter()
            .map(ReasonCode::severity)
            .max()
            .unwrap_or(Severity::Info);
        Self {
            is_suspect: !reasons.is_empty(),
            reasons,
            severity,
        }
    }

    /// 아무 규칙도 발동하지 않은 판정
    pub fn clean() -> Self {
        Self::from_reasons(Vec::new())
    }

    /// 특정 이유가 포함되어 있는지 확인합니다.
    pub fn has(&self, code: ReasonCode) -> bool {
        self.reasons.contains(&code)
    }
}

/// 탐지 파라미터
///
/// core의 [`DetectionConfig`]에서 생성됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionPolicy {
    /// 업무 시작 시각 (포함)
    pub business_hours_start: u32,
    /// 업무 종료 시각 (제외)
    pub business_hours_end: u32,
    /// 반복 실패 임계값
    pub failure_threshold: u64,
    /// 특권 계정 이름
    pub privileged_user: String,
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self::from_core(&DetectionConfig::default())
    }
}

impl DetectionPolicy {
    /// core 설정에서 탐지 파라미터를 생성합니다.
    pub fn from_core(core: &DetectionConfig) -> Self {
        Self {
            business_hours_start: core.business_hours_start,
            business_hours_end: core.business_hours_end,
            failure_threshold: core.failure_threshold,
            privileged_user: core.privileged_user.clone(),
        }
    }

    /// 업무 시간대 `[start, end)` 밖인지 확인합니다.
    ///
    /// 음수나 24 이상의 시각은 항상 업무 시간 밖입니다.
    pub fn is_off_hours(&self, hour: i32) -> bool {
        let hour = i64::from(hour);
        hour < i64::from(self.business_hours_start) || hour >= i64::from(self.business_hours_end)
    }

    /// 사람이 읽는 이유 문구
    pub fn reason_text(&self, code: ReasonCode) -> String {
        match code {
            ReasonCode::IpRepeatedFailure => {
                format!("IP with {}+ failures", self.failure_threshold)
            }
            ReasonCode::OffHours => "Connection outside business hours".to_owned(),
            ReasonCode::AdminTarget => {
                format!("Attempt on privileged account {}", self.privileged_user)
            }
        }
    }
}
