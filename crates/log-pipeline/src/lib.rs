#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`parser`]: 인증 로그 라인 파서 (전 함수, 필드 누락 시 `None`)
//! - [`stats`]: 출발지 IP별 실패 카운터
//! - [`rule`]: 세 가지 탐지 규칙과 판정
//! - [`alert`]: 알림 생성, 알림 파일 기록
//! - [`monitor`]: 로그 파일 감시 (폴링, truncation 감지)
//! - [`report`]: 보안 보고서 집계 및 렌더링
//! - [`pipeline`]: 배치/감시 오케스트레이션, 공유 탐지 상태
//! - [`config`]: 파이프라인 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! auth.log -> TailMonitor / BatchAnalyzer -> AuthLogParser -> FailureCounter
//!                                                   |              |
//!                                                   +-> RuleEngine <+
//!                                                          |
//!                                               AlertEmitter -> AlertSink / alert log
//!                                                          |
//!                                                    ReportSummary -> report file
//! ```

pub mod alert;
pub mod config;
pub mod error;
pub mod monitor;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod rule;
pub mod stats;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{BatchAnalyzer, DetectionState, SharedDetectionState};

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::LogPipelineError;

// 파서
pub use parser::{AuthLogParser, LogRecord, Outcome};

// 통계
pub use stats::FailureCounter;

// 규칙 엔진
pub use rule::{DetectionPolicy, ReasonCode, RuleEngine, Verdict};

// 알림
pub use alert::{Alert, AlertEmitter, AlertSink, write_alert_log};

// 감시
pub use monitor::{MonitorState, PollOutcome, TailMonitor, TailState};

// 보고서
pub use report::{ReportSummary, render, summarize, write_report};
