//! 인증 로그 파서 -- 원시 라인 하나를 [`LogRecord`]로 변환합니다.
//!
//! 파서는 전(total) 함수입니다. 손상된 라인이라도 에러를 반환하지 않고,
//! 찾을 수 없는 필드를 `None` / [`Outcome::Unknown`]으로 표시한 레코드를 만듭니다.
//! 파이프라인은 잘못된 라인 하나 때문에 멈추지 않아야 합니다.
//!
//! # 라인 형식
//! ```text
//! 2026-01-10 09:12:45 USER=bob IP=10.0.0.5 STATUS=FAIL
//! ```
//!
//! # 사용 예시
//! ```
//! use authwatch_log_pipeline::parser::{AuthLogParser, Outcome};
//!
//! let parser = AuthLogParser::new();
//! let record = parser.parse("2026-01-10 03:12:45 USER=bob IP=1.2.3.4 STATUS=FAIL");
//! assert_eq!(record.hour, Some(3));
//! assert_eq!(record.source_ip.as_deref(), Some("1.2.3.4"));
//! assert_eq!(record.outcome, Outcome::Fail);
//! ```

pub mod fields;

use chrono::NaiveDateTime;
use serde::Serialize;

/// 날짜/시각 토큰이 없는 라인의 알림 레이블
pub const UNKNOWN_DATE_LABEL: &str = "UNKNOWN_DATE";

/// 날짜 + 시각 토큰 형식
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 인증 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    /// 성공. 현재 로그 형식에는 성공 마커가 없어 파서가 생성하지 않습니다.
    Success,
    /// `STATUS=FAIL` 포함
    Fail,
    /// 그 외 모든 라인
    #[default]
    Unknown,
}

/// 파싱된 인증 로그 레코드
///
/// 라인마다 생성되며 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    /// 앞뒤 공백을 제거한 원본 라인
    pub line: String,
    /// 날짜 + 시각 토큰 (`%Y-%m-%d %H:%M:%S`) 파싱 결과
    pub timestamp: Option<NaiveDateTime>,
    /// 첫 번째 토큰 (날짜)
    pub raw_date_token: Option<String>,
    /// 두 번째 토큰 (시각)
    pub raw_time_token: Option<String>,
    /// 시. 정상 로그는 0-23이지만 범위를 검사하지 않습니다
    pub hour: Option<i32>,
    /// `IP=` 값
    pub source_ip: Option<String>,
    /// `USER=` 값
    pub user: Option<String>,
    /// 인증 결과
    pub outcome: Outcome,
}

impl LogRecord {
    /// 알림 라인에 쓰이는 `"<date> <time>"` 레이블.
    ///
    /// 토큰이 두 개 미만이면 [`UNKNOWN_DATE_LABEL`].
    pub fn timestamp_label(&self) -> String {
        match (&self.raw_date_token, &self.raw_time_token) {
            (Some(date), Some(time)) => format!("{date} {time}"),
            _ => UNKNOWN_DATE_LABEL.to_owned(),
        }
    }

    /// `STATUS=FAIL` 레코드인지 확인합니다.
    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Fail
    }

    /// 통계에 반영할 실패 IP. 실패 레코드이고 IP가 있을 때만 `Some`.
    pub fn failed_source(&self) -> Option<&str> {
        if self.is_failure() {
            self.source_ip.as_deref()
        } else {
            None
        }
    }
}

/// 인증 로그 라인 파서
#[derive(Debug, Clone)]
pub struct AuthLogParser {
    /// 최대 처리 라인 길이 (바이트). 초과분은 잘라낸 뒤 파싱합니다.
    max_line_length: usize,
}

impl AuthLogParser {
    /// 기본 설정으로 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self {
            max_line_length: 64 * 1024, // 64KB
        }
    }

    /// 최대 라인 길이를 설정합니다.
    pub fn with_max_line_length(mut self, len: usize) -> Self {
        self.max_line_length = len.max(1);
        self
    }

    /// 라인 하나를 파싱합니다. 실패하지 않습니다.
    pub fn parse(&self, raw: &str) -> LogRecord {
        let line = self.clamp(raw.trim());

        let mut tokens = line.split_whitespace();
        let date = tokens.next();
        let time = tokens.next();

        let hour = time.and_then(fields::hour);
        let timestamp = match (date, time) {
            (Some(d), Some(t)) => {
                NaiveDateTime::parse_from_str(&format!("{d} {t}"), TIMESTAMP_FORMAT).ok()
            }
            _ => None,
        };

        let outcome = if fields::is_failure(line) {
            Outcome::Fail
        } else {
            Outcome::Unknown
        };

        LogRecord {
            line: line.to_owned(),
            timestamp,
            // 시각 토큰이 없으면 날짜만으로는 레이블을 만들지 않는다
            raw_date_token: date.filter(|_| time.is_some()).map(str::to_owned),
            raw_time_token: time.map(str::to_owned),
            hour,
            source_ip: fields::source_ip(line).map(str::to_owned),
            user: fields::user(line).map(str::to_owned),
            outcome,
        }
    }

    fn clamp<'a>(&self, line: &'a str) -> &'a str {
        if line.len() <= self.max_line_length {
            return line;
        }
        let mut end = self.max_line_length;
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        tracing::debug!(
            len = line.len(),
            max = self.max_line_length,
            "log line exceeds max length, truncating before parse"
        );
        &line[..end]
    }
}

impl Default for AuthLogParser {
    fn default() -> Self {
        Self::new()
    }
}
