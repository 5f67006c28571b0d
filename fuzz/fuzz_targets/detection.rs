#![no_main]

use arbitrary::Arbitrary;
use authwatch_log_pipeline::DetectionState;
use libfuzzer_sys::fuzz_target;

/// 퍼저용 구조적 로그 라인
#[derive(Arbitrary, Debug)]
struct FuzzLine {
    hour: u8,
    user: FuzzUser,
    ip_octet: u8,
    failed: bool,
    noise: String,
}

#[derive(Arbitrary, Debug)]
enum FuzzUser {
    Admin,
    Regular,
    Missing,
}

impl FuzzLine {
    fn render(&self) -> String {
        let user = match self.user {
            FuzzUser::Admin => "USER=admin ",
            FuzzUser::Regular => "USER=bob ",
            FuzzUser::Missing => "",
        };
        let status = if self.failed { "FAIL" } else { "OK" };
        format!(
            "2026-01-10 {:02}:00:00 {}IP=10.0.0.{} STATUS={} {}",
            self.hour % 30,
            user,
            self.ip_octet % 8,
            status,
            self.noise.replace('\n', " ")
        )
    }
}

fuzz_target!(|lines: Vec<FuzzLine>| {
    let lines: Vec<String> = lines.iter().take(256).map(FuzzLine::render).collect();

    let mut batch = DetectionState::default();
    batch.ingest_batch(lines.iter().map(String::as_str));

    let mut live = DetectionState::default();
    for line in &lines {
        let _ = live.ingest_live(line);
    }

    // 카운터는 두 모드에서 같고, 배치 알림은 라이브 알림 이상이다
    assert_eq!(batch.counter().total_failures(), live.counter().total_failures());
    assert!(batch.alerts().len() >= live.alerts().len());

    let summary = batch.summary();
    assert_eq!(summary.total_alerts, batch.alerts().len());
    assert!(summary.top_ips.len() <= 5);
    assert!(summary.top_hours.len() <= 5);
});
