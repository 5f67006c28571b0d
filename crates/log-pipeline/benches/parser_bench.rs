//! 인증 로그 파서 벤치마크
//!
//! 정상 라인, 필드 누락 라인, 긴 라인의 파싱 처리량을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use authwatch_log_pipeline::parser::AuthLogParser;

/// 모든 필드가 있는 실패 라인
const FULL_LINE: &str = "2026-01-10 09:12:45 USER=bob IP=10.0.0.5 STATUS=FAIL";

/// 필드 순서가 다르고 부가 정보가 붙은 라인
const NOISY_LINE: &str = "2026-01-10 23:59:59 sshd[4242]: session=ab12 STATUS=FAIL reason=bad_password IP=203.0.113.45 port=51514 USER=admin method=password";

/// 토큰 하나뿐인 손상된 라인
const CORRUPT_LINE: &str = "@@@@garbage@@@@";

fn bench_single_line(c: &mut Criterion) {
    let parser = AuthLogParser::new();

    let mut group = c.benchmark_group("auth_parser");
    group.throughput(Throughput::Elements(1));

    for (name, line) in [
        ("full", FULL_LINE),
        ("noisy", NOISY_LINE),
        ("corrupt", CORRUPT_LINE),
    ] {
        group.bench_with_input(BenchmarkId::new("line", name), &line, |b, &input| {
            b.iter(|| parser.parse(black_box(input)))
        });
    }

    group.finish();
}

fn bench_throughput(c: &mut Criterion) {
    let parser = AuthLogParser::new();

    let mut group = c.benchmark_group("auth_parser_throughput");
    group.throughput(Throughput::Elements(1000));
    group.bench_function("throughput_1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(parser.parse(black_box(FULL_LINE)));
            }
        })
    });
    group.finish();
}

fn bench_long_line(c: &mut Criterion) {
    let parser = AuthLogParser::new();
    let long = format!("{FULL_LINE} {}", "x".repeat(128 * 1024));

    let mut group = c.benchmark_group("auth_parser_long_line");
    group.throughput(Throughput::Bytes(long.len() as u64));
    group.bench_function("truncated_128k", |b| {
        b.iter(|| parser.parse(black_box(&long)))
    });
    group.finish();
}

criterion_group!(benches, bench_single_line, bench_throughput, bench_long_line);
criterion_main!(benches);
