//! 캔들 패턴 분석.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 망치형(아랫꼬리) 캔들 판정과 꼬리/몸통 비율
//! - 연속 하락 구간 검증
//! - 한 종목 윈도우에 대한 "하락 후 망치형" 시그널 평가

pub mod detector;
pub mod pattern;

pub use detector::{HammerSignalDetector, DEFAULT_LOOKBACK, DEFAULT_MIN_DECLINE_DAYS};
pub use pattern::{analyze_hammer, check_consecutive_decline, DeclineRun, HammerMetrics};
