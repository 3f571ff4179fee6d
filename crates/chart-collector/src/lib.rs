//! 일봉 수집 및 시그널 검출 배치.
//!
//! 이 crate는 다음 작업을 실행하는 바이너리를 제공합니다:
//! - 종목별 증분 일봉 동기화 (신규/업데이트/스킵)
//! - 하락 후 망치형 시그널 검출
//! - 스키마 초기화

pub mod config;
pub mod error;
pub mod modules;
pub mod retry;
pub mod stats;
pub mod throttle;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use retry::{RetryFailure, RetryPolicy};
pub use stats::{DetectionStats, PlanSummary, SyncStats};
pub use throttle::RequestThrottle;
