//! 인증 로그 필드 토크나이저
//!
//! 일반적인 key-value 파서가 아니라, 기존 로그 생산자와의 호환을 위해
//! 고정된 부분 문자열 검색 규칙만 구현합니다.
//!
//! - `IP=` / `USER=`: 라인에서 **첫 번째** 등장 위치 바로 뒤부터 다음 공백 전까지.
//!   값이 비어 있으면 `None`
//! - `STATUS=FAIL`: 라인 어디든 포함되어 있으면 실패
//! - 시각: 두 번째 공백 토큰(`HH:MM:SS`)에서 첫 `:` 앞부분의 정수.
//!   범위 검사는 하지 않으므로 `25`나 `-1`도 그대로 유지됩니다

/// 출발지 주소 마커
pub const IP_MARKER: &str = "IP=";

/// 대상 사용자 마커
pub const USER_MARKER: &str = "USER=";

/// 인증 실패 마커
pub const FAIL_MARKER: &str = "STATUS=FAIL";

/// 마커 바로 뒤부터 다음 공백 전까지의 값을 추출합니다.
///
/// 마커가 없거나 값이 비어 있으면 `None`.
pub fn value_after<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let rest = &line[line.find(marker)? + marker.len()..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    Some(&rest[..end]).filter(|v| !v.is_empty())
}

/// `IP=` 값을 추출합니다.
pub fn source_ip(line: &str) -> Option<&str> {
    value_after(line, IP_MARKER)
}

/// `USER=` 값을 추출합니다.
pub fn user(line: &str) -> Option<&str> {
    value_after(line, USER_MARKER)
}

/// `STATUS=FAIL` 포함 여부
pub fn is_failure(line: &str) -> bool {
    line.contains(FAIL_MARKER)
}

/// 시각 토큰(`HH:MM:SS`)에서 시(hour)를 추출합니다.
///
/// 정수 변환에 실패할 때만 `None`. 부호 있는 정수를 허용합니다.
pub fn hour(time_token: &str) -> Option<i32> {
    time_token.split(':').next()?.parse().ok()
}
