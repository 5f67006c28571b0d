//! 엔티티 통계 저장소 -- 출발지 IP별 인증 실패 카운터
//!
//! [`FailureCounter`]는 파이프라인이 소유하는 명시적 객체입니다.
//! 실행(run) 단위로 생성되고, 프로세스가 재시작되면 초기화됩니다 (영속화하지 않음).
//!
//! # 불변식
//! - IP의 카운트 = 저장소 생성 이후 관측된 해당 IP의 FAIL 레코드 수
//! - 실행 중 카운트는 감소하지 않음
//! - [`FailureCounter::entries`]는 처음 관측된 순서를 유지 (보고서 동률 처리용)

use std::collections::HashMap;

use serde::Serialize;

/// IP별 실패 카운터
#[derive(Debug, Clone, Default, Serialize)]
pub struct FailureCounter {
    /// (ip, count) -- 처음 관측된 순서
    entries: Vec<(String, u64)>,
    /// ip -> entries 인덱스
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl FailureCounter {
    /// 빈 카운터를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 실패를 한 건 기록하고 갱신된 카운트를 반환합니다.
    pub fn record_failure(&mut self, ip: &str) -> u64 {
        match self.index.get(ip) {
            Some(&i) => {
                self.entries[i].1 += 1;
                self.entries[i].1
            }
            None => {
                self.index.insert(ip.to_owned(), self.entries.len());
                self.entries.push((ip.to_owned(), 1));
                1
            }
        }
    }

    /// IP의 현재 실패 횟수. 관측되지 않은 IP는 0.
    pub fn failures_for(&self, ip: &str) -> u64 {
        self.index.get(ip).map_or(0, |&i| self.entries[i].1)
    }

    /// 관측된 서로 다른 IP 수
    pub fn distinct_ips(&self) -> usize {
        self.entries.len()
    }

    /// 전체 실패 횟수
    pub fn total_failures(&self) -> u64 {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// 임계값 이상인 IP 수
    pub fn ips_at_or_above(&self, threshold: u64) -> usize {
        self.entries.iter().filter(|(_, n)| *n >= threshold).count()
    }

    /// 처음 관측된 순서의 (ip, count) 목록
    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }

    /// 아무 실패도 기록되지 않았는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
