//! 탐지 규칙 엔진 -- (레코드, 실패 카운터 스냅샷) → 판정
//!
//! 세 규칙은 서로 독립적이며 단락 평가 없이 모두 평가됩니다.
//! 따라서 한 레코드에 여러 이유가 동시에 붙을 수 있습니다.
//!
//! | 순서 | 이유 코드              | 조건                                          | 심각도   |
//! |------|------------------------|-----------------------------------------------|----------|
//! | 1    | `IP_REPEATED_FAILURE`  | IP가 있고 `failures_for(ip) >= threshold`     | CRITICAL |
//! | 2    | `OFF_HOURS`            | 시가 있고 `[start, end)` 밖                   | WARNING  |
//! | 3    | `ADMIN_TARGET`         | `user == privileged_user` (대소문자 구분)     | CRITICAL |
//!
//! 엔진은 순수 함수입니다. 카운터 갱신은 호출 측(파이프라인)이 평가 전에 수행합니다.

pub mod types;

pub use types::{DetectionPolicy, ReasonCode, Verdict};

use crate::parser::LogRecord;
use crate::stats::FailureCounter;

/// 규칙 엔진
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    policy: DetectionPolicy,
}

impl RuleEngine {
    /// 탐지 파라미터로 엔진을 생성합니다.
    pub fn new(policy: DetectionPolicy) -> Self {
        Self { policy }
    }

    /// 현재 탐지 파라미터
    pub fn policy(&self) -> &DetectionPolicy {
        &self.policy
    }

    /// 레코드를 평가합니다.
    pub fn evaluate(&self, record: &LogRecord, counter: &FailureCounter) -> Verdict {
        let reasons = ReasonCode::ALL
            .into_iter()
            .filter(|code| self.fires(*code, record, counter))
            .collect();
        Verdict::from_reasons(reasons)
    }

    /// 단일 규칙의 발동 여부
    pub fn fires(&self, code: ReasonCode, record: &LogRecord, counter: &FailureCounter) -> bool {
        match code {
            ReasonCode::IpRepeatedFailure => record
                .source_ip
                .as_deref()
                .is_some_and(|ip| counter.failures_for(ip) >= self.policy.failure_threshold),
            ReasonCode::OffHours => record.hour.is_some_and(|h| self.policy.is_off_hours(h)),
            ReasonCode::AdminTarget => {
                record.user.as_deref() == Some(self.policy.privileged_user.as_str())
            }
        }
    }

    /// 사람이 읽는 이유 문구
    pub fn reason_text(&self, code: ReasonCode) -> String {
        self.policy.reason_text(code)
    }
}
