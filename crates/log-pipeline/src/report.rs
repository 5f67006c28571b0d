//! 보안 보고서 집계 및 렌더링
//!
//! [`summarize`]는 알림 시퀀스와 실패 카운터에서 [`ReportSummary`]를 계산하고,
//! [`render`]는 고정된 섹션 순서의 텍스트 보고서를 만듭니다.
//!
//! # 섹션 순서
//! 1. 일반 통계
//! 2. 상위 5개 IP (실패 횟수 내림차순, 동률은 처음 관측 순서)
//! 3. 상위 5개 시간대 (의심 이벤트 수 내림차순, 동률은 시 오름차순)
//! 4. 대상 사용자 (내림차순, 동률은 이름순)
//! 5. 권고 사항
//!
//! 보고서는 요청마다 전체를 다시 생성합니다.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use authwatch_core::types::Severity;
use chrono::NaiveDateTime;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::alert::Alert;
use crate::error::LogPipelineError;
use crate::pipeline::SharedDetectionState;
use crate::rule::DetectionPolicy;
use crate::stats::FailureCounter;

/// 상위 목록 최대 길이
pub const TOP_N: usize = 5;

/// 보고서 제목
pub const REPORT_TITLE: &str = "SECURITY REPORT - GLOBAL ANALYSIS";

const RULE_WIDTH: usize = 60;
const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// IP별 실패 횟수
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpCount {
    /// 출발지 IP
    pub ip: String,
    /// 실패 횟수
    pub failures: u64,
}

/// 시간대별 의심 이벤트 수
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourCount {
    /// 시
    pub hour: i32,
    /// 의심 이벤트 수
    pub events: u64,
}

/// 보고서 요약
///
/// 읽기 전용 산출물입니다. 락 밖에서 렌더링할 수 있도록 소유 데이터만 담습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    /// 총 알림 수
    pub total_alerts: usize,
    /// CRITICAL 알림 수
    pub critical_alerts: usize,
    /// WARNING 알림 수
    pub warning_alerts: usize,
    /// 총 인증 실패 수
    pub total_failures: u64,
    /// 실패가 관측된 서로 다른 IP 수
    pub distinct_ip_count: usize,
    /// 상위 IP (최대 5개)
    pub top_ips: Vec<IpCount>,
    /// 상위 시간대 (최대 5개)
    pub top_hours: Vec<HourCount>,
    /// 사용자별 의심 시도 수
    pub targeted_users: BTreeMap<String, u64>,
    /// 분석한 라인 수
    pub lines_analyzed: u64,
    /// 반복 실패 임계값
    pub failure_threshold: u64,
    /// 임계값 이상인 IP 수
    pub ips_over_threshold: usize,
    /// 특권 계정 이름
    pub privileged_user: String,
}

impl ReportSummary {
    /// 대상 사용자를 렌더링 순서로 반환합니다 (내림차순, 동률은 이름순).
    pub fn ranked_users(&self) -> Vec<(&str, u64)> {
        let mut users: Vec<(&str, u64)> = self
            .targeted_users
            .iter()
            .map(|(user, n)| (user.as_str(), *n))
            .collect();
        users.sort_by(|a, b| b.1.cmp(&a.1));
        users
    }

    /// 기계 판독용 JSON 문자열
    pub fn to_json(&self) -> Result<String, LogPipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// 알림과 실패 카운터에서 보고서 요약을 계산합니다.
pub fn summarize(
    alerts: &[Alert],
    counter: &FailureCounter,
    lines_analyzed: u64,
    policy: &DetectionPolicy,
) -> ReportSummary {
    // entries()는 처음 관측 순서이므로 stable sort로 동률 순서가 유지된다
    let mut top_ips: Vec<IpCount> = counter
        .entries()
        .iter()
        .map(|(ip, n)| IpCount {
            ip: ip.clone(),
            failures: *n,
        })
        .collect();
    top_ips.sort_by(|a, b| b.failures.cmp(&a.failures));
    top_ips.truncate(TOP_N);

    let mut per_hour: BTreeMap<i32, u64> = BTreeMap::new();
    let mut targeted_users: BTreeMap<String, u64> = BTreeMap::new();
    let mut critical_alerts = 0;
    let mut warning_alerts = 0;

    for alert in alerts {
        match alert.severity {
            Severity::Critical => critical_alerts += 1,
            Severity::Warning => warning_alerts += 1,
            Severity::Info => {}
        }
        if let Some(hour) = alert.hour {
            *per_hour.entry(hour).or_default() += 1;
        }
        if let Some(user) = &alert.user {
            *targeted_users.entry(user.clone()).or_default() += 1;
        }
    }

    let mut top_hours: Vec<HourCount> = per_hour
        .into_iter()
        .map(|(hour, events)| HourCount { hour, events })
        .collect();
    top_hours.sort_by(|a, b| b.events.cmp(&a.events));
    top_hours.truncate(TOP_N);

    ReportSummary {
        total_alerts: alerts.len(),
        critical_alerts,
        warning_alerts,
        total_failures: counter.total_failures(),
        distinct_ip_count: counter.distinct_ips(),
        top_ips,
        top_hours,
        targeted_users,
        lines_analyzed,
        failure_threshold: policy.failure_threshold,
        ips_over_threshold: counter.ips_at_or_above(policy.failure_threshold),
        privileged_user: policy.privileged_user.clone(),
    }
}

fn section(out: &mut String, title: &str) {
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');
}

/// 텍스트 보고서를 렌더링합니다.
pub fn render(summary: &ReportSummary, generated_at: NaiveDateTime) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = format!("{rule}\n{REPORT_TITLE}\n{rule}\n");

    section(&mut out, "GENERAL STATISTICS");
    out.push_str(&format!("Total alerts detected          : {}\n", summary.total_alerts));
    out.push_str(&format!("  critical                     : {}\n", summary.critical_alerts));
    out.push_str(&format!("  warning                      : {}\n", summary.warning_alerts));
    out.push_str(&format!("Total authentication failures  : {}\n", summary.total_failures));
    out.push_str(&format!("Distinct source IPs            : {}\n", summary.distinct_ip_count));
    out.push_str(&format!("Lines analysed                 : {}\n", summary.lines_analyzed));

    section(&mut out, "TOP 5 SUSPICIOUS IPS");
    if summary.top_ips.is_empty() {
        out.push_str("  (none)\n");
    }
    for (i, entry) in summary.top_ips.iter().enumerate() {
        out.push_str(&format!("{}. {} : {} failures\n", i + 1, entry.ip, entry.failures));
    }

    section(&mut out, "TOP 5 SUSPICIOUS HOURS");
    if summary.top_hours.is_empty() {
        out.push_str("  (none)\n");
    }
    for (i, entry) in summary.top_hours.iter().enumerate() {
        out.push_str(&format!(
            "{}. {:02}h00 : {} suspicious events\n",
            i + 1,
            entry.hour,
            entry.events
        ));
    }

    section(&mut out, "TARGETED USERS");
    let users = summary.ranked_users();
    if users.is_empty() {
        out.push_str("  (none)\n");
    }
    for (user, n) in users {
        out.push_str(&format!("  {user} : {n} suspicious attempts\n"));
    }

    section(&mut out, "RECOMMENDATIONS");
    out.push_str(&format!(
        "1. Block IPs with {}+ failures ({} IPs concerned)\n",
        summary.failure_threshold, summary.ips_over_threshold
    ));
    out.push_str(&format!(
        "2. Harden the privileged account '{}'\n",
        summary.privileged_user
    ));
    let busiest: Vec<String> = summary
        .top_hours
        .iter()
        .take(3)
        .map(|h| format!("{:02}h", h.hour))
        .collect();
    if busiest.is_empty() {
        out.push_str("3. No suspicious hour stands out yet\n");
    } else {
        out.push_str(&format!("3. Watch hours {} closely\n", busiest.join(", ")));
    }
    out.push_str("4. Set up automatic alerting for off-hours connections\n");

    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!(
        "Report generated at: {}\n",
        generated_at.format(GENERATED_AT_FORMAT)
    ));
    out.push_str(&rule);
    out.push('\n');
    out
}

/// 보고서를 현재 시각으로 렌더링해 파일에 씁니다 (덮어쓰기).
///
/// 실패하면 [`LogPipelineError::ReportWrite`]를 반환합니다.
/// 요약 자체는 영향이 없으므로 다른 경로로 다시 시도할 수 있습니다.
pub async fn write_report(path: &Path, summary: &ReportSummary) -> Result<(), LogPipelineError> {
    let text = render(summary, chrono::Local::now().naive_local());
    tokio::fs::write(path, text)
        .await
        .map_err(|source| LogPipelineError::ReportWrite {
            path: path.display().to_string(),
            source,
        })?;
    tracing::info!(
        path = %path.display(),
        alerts = summary.total_alerts,
        "security report written"
    );
    Ok(())
}

/// 주기적으로 보고서를 다시 생성합니다.
///
/// 스냅샷은 락 안에서 요약만 계산하고, 렌더링과 파일 쓰기는 락 밖에서 수행합니다.
/// 쓰기 실패는 경고로 남기고 다음 주기에 다시 시도합니다.
pub async fn run_periodic_reports(
    state: SharedDetectionState,
    path: std::path::PathBuf,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        path = %path.display(),
        interval_secs = interval.as_secs(),
        "periodic report task started"
    );
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                let summary = state.lock().await.summary();
                if let Err(e) = write_report(&path, &summary).await {
                    tracing::warn!(error = %e, "periodic report failed");
                }
            }
            _ = cancel.cancelled() => {
                tracing::debug!("periodic report task shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertEmitter;
    use crate::parser::AuthLogParser;
    use crate::rule::RuleEngine;

    fn generated_at() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2026-01-10 12:00:00", GENERATED_AT_FORMAT).unwrap()
    }

    /// 두 단계(카운트 → 평가)로 알림을 만든다
    fn build(lines: &[&str]) -> (Vec<Alert>, FailureCounter) {
        let parser = AuthLogParser::new();
        let engine = RuleEngine::default();
        let mut emitter = AlertEmitter::default();
        let mut counter = FailureCounter::new();
        let records: Vec<_> = lines.iter().map(|l| parser.parse(l)).collect();
        for record in &records {
            if let Some(ip) = record.failed_source() {
                counter.record_failure(ip);
            }
        }
        for record in &records {
            let verdict = engine.evaluate(record, &counter);
            emitter.emit(record, &verdict);
        }
        (emitter.alerts().to_vec(), counter)
    }

    #[test]
    fn top_ips_sorted_with_first_seen_ties() {
        let mut counter = FailureCounter::new();
        for ip in ["b", "a", "a", "c", "b", "d", "e", "f", "g"] {
            counter.record_failure(ip);
        }
        let summary = summarize(&[], &counter, 9, &DetectionPolicy::default());
        let ips: Vec<&str> = summary.top_ips.iter().map(|e| e.ip.as_str()).collect();
        assert_eq!(ips, vec!["b", "a", "c", "d", "e"]);
        assert_eq!(summary.top_ips[0].failures, 2);
        assert_eq!(summary.distinct_ip_count, 7);
        assert_eq!(summary.total_failures, 9);
    }

    #[test]
    fn top_hours_ties_by_ascending_hour() {
        let lines = [
            "2026-01-10 22:00:00 USER=x",
            "2026-01-10 03:00:00 USER=x",
            "2026-01-10 23:00:00 USER=x",
            "2026-01-10 23:10:00 USER=x",
            "2026-01-10 01:00:00 USER=x",
            "2026-01-10 02:00:00 USER=x",
            "2026-01-10 05:00:00 USER=x",
        ];
        let (alerts, counter) = build(&lines);
        let summary = summarize(&alerts, &counter, lines.len() as u64, &DetectionPolicy::default());
        let hours: Vec<i32> = summary.top_hours.iter().map(|h| h.hour).collect();
        assert_eq!(hours, vec![23, 1, 2, 3, 5]);
        assert!(summary.top_hours.len() <= TOP_N);
    }

    #[test]
    fn targeted_users_ranked_desc_then_name() {
        let lines = [
            "2026-01-10 02:00:00 USER=zed",
            "2026-01-10 02:00:00 USER=amy",
            "2026-01-10 02:00:00 USER=admin",
            "2026-01-10 02:00:00 USER=admin",
            "2026-01-10 02:00:00 USER=",
        ];
        let (alerts, counter) = build(&lines);
        let summary = summarize(&alerts, &counter, 5, &DetectionPolicy::default());
        assert_eq!(summary.ranked_users(), vec![("admin", 2), ("amy", 1), ("zed", 1)]);
    }

    #[test]
    fn repeated_failure_scenario_report() {
        let lines: Vec<String> = (0..6)
            .map(|i| format!("2026-01-10 09:0{i}:00 USER=bob IP=10.0.0.5 STATUS=FAIL"))
            .collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let (alerts, counter) = build(&refs);
        let summary = summarize(&alerts, &counter, 6, &DetectionPolicy::default());

        assert_eq!(summary.total_alerts, 6);
        assert_eq!(summary.critical_alerts, 6);
        assert_eq!(
            summary.top_ips[0],
            IpCount {
                ip: "10.0.0.5".to_owned(),
                failures: 6
            }
        );
        assert_eq!(summary.ips_over_threshold, 1);
    }

    #[test]
    fn render_keeps_section_order() {
        let (alerts, counter) = build(&[
            "2026-01-10 03:12:45 USER=bob IP=1.2.3.4 STATUS=FAIL",
            "2026-01-10 10:00:00 USER=admin IP=9.9.9.9 STATUS=FAIL",
        ]);
        let summary = summarize(&alerts, &counter, 2, &DetectionPolicy::default());
        let text = render(&summary, generated_at());

        let positions: Vec<usize> = [
            REPORT_TITLE,
            "GENERAL STATISTICS",
            "TOP 5 SUSPICIOUS IPS",
            "TOP 5 SUSPICIOUS HOURS",
            "TARGETED USERS",
            "RECOMMENDATIONS",
            "Report generated at: 2026-01-10 12:00:00",
        ]
        .iter()
        .map(|needle| text.find(needle).unwrap())
        .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);

        assert!(text.contains("Total alerts detected          : 2"));
        assert!(text.contains("1. 1.2.3.4 : 1 failures"));
        assert!(text.contains("03h00 : 1 suspicious events"));
        assert!(text.contains("  admin : 1 suspicious attempts"));
        assert!(text.contains("1. Block IPs with 5+ failures (0 IPs concerned)"));
        assert!(text.contains("3. Watch hours 03h, 10h closely"));
    }

    #[test]
    fn summary_json_uses_field_names() {
        let (alerts, counter) = build(&["2026-01-10 03:12:45 USER=bob IP=1.2.3.4 STATUS=FAIL"]);
        let summary = summarize(&alerts, &counter, 1, &DetectionPolicy::default());
        let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(json["total_alerts"], 1);
        assert_eq!(json["top_ips"][0]["ip"], "1.2.3.4");
        assert_eq!(json["top_hours"][0]["hour"], 3);
        assert_eq!(json["targeted_users"]["bob"], 1);
    }

    #[test]
    fn render_empty_summary() {
        let summary = summarize(&[], &FailureCounter::new(), 0, &DetectionPolicy::default());
        let text = render(&summary, generated_at());
        assert!(text.contains("Total alerts detected          : 0"));
        assert_eq!(text.matches("(none)").count(), 3);
        assert!(text.contains("No suspicious hour stands out yet"));
    }

    #[tokio::test]
    async fn write_report_failure_is_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let summary = summarize(&[], &FailureCounter::new(), 0, &DetectionPolicy::default());

        let err = write_report(dir.path(), &summary).await.unwrap_err();
        assert!(matches!(err, LogPipelineError::ReportWrite { .. }));

        // 같은 요약으로 다른 경로에 다시 시도할 수 있다
        let path = dir.path().join("report.txt");
        write_report(&path, &summary).await.unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
    }
}
