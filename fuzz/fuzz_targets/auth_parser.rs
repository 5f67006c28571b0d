#![no_main]

use authwatch_log_pipeline::parser::AuthLogParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    let parser = AuthLogParser::new().with_max_line_length(4096);

    // 어떤 입력이든 패닉 없이 레코드를 만들어야 한다
    let record = parser.parse(&line);

    assert!(record.line.len() <= 4096);
    // 시각 토큰이 정상 형식이면 시(hour)는 0-23
    if record.timestamp.is_some() {
        assert!(record.hour.is_some_and(|h| (0..24).contains(&h)));
    }
    if let Some(ip) = record.failed_source() {
        assert!(!ip.is_empty());
    }
    let _ = record.timestamp_label();
});
