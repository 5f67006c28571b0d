//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 파이프라인은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//! 익스포터는 설치하지 않으므로, 임베딩하는 쪽에서 recorder를 설치하지 않으면
//! 모든 호출은 no-op 입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `authwatch_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(authwatch_core::metrics::LINES_PROCESSED_TOTAL).increment(1);
//! ```

use metrics::{Unit, describe_counter};

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 심각도 레이블 키 (INFO, WARNING, CRITICAL)
pub const LABEL_SEVERITY: &str = "severity";

/// 실행 모드 레이블 키 (batch, live)
pub const LABEL_MODE: &str = "mode";

// ─── 파이프라인 메트릭 ──────────────────────────────────────────────

/// 처리된 로그 라인 수 (counter, label: mode)
pub const LINES_PROCESSED_TOTAL: &str = "authwatch_lines_processed_total";

/// 관측된 인증 실패 수 (counter)
pub const FAILURES_TOTAL: &str = "authwatch_failures_total";

/// 생성된 알림 수 (counter, label: severity)
pub const ALERTS_TOTAL: &str = "authwatch_alerts_total";

/// 알림 파일 기록 실패 수 (counter)
pub const ALERT_WRITE_ERRORS_TOTAL: &str = "authwatch_alert_write_errors_total";

/// 로그 truncation/rotation 감지 횟수 (counter)
pub const TRUNCATIONS_TOTAL: &str = "authwatch_truncations_total";

/// 실패한 폴링 주기 수 (counter)
pub const POLL_ERRORS_TOTAL: &str = "authwatch_poll_errors_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// recorder 설치 직후 한 번 호출합니다.
pub fn describe_metrics() {
    describe_counter!(
        LINES_PROCESSED_TOTAL,
        Unit::Count,
        "Authentication log lines pushed through the pipeline"
    );
    describe_counter!(
        FAILURES_TOTAL,
        Unit::Count,
        "Lines carrying STATUS=FAIL with a source address"
    );
    describe_counter!(ALERTS_TOTAL, Unit::Count, "Alerts emitted, by severity");
    describe_counter!(
        ALERT_WRITE_ERRORS_TOTAL,
        Unit::Count,
        "Alert lines that could not be persisted"
    );
    describe_counter!(
        TRUNCATIONS_TOTAL,
        Unit::Count,
        "Times the monitored file shrank below the stored offset"
    );
    describe_counter!(
        POLL_ERRORS_TOTAL,
        Unit::Count,
        "Poll cycles skipped because the source log could not be read"
    );
}
