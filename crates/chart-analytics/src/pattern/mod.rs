//! 단일 캔들/캔들 구간 패턴.

pub mod decline;
pub mod hammer;

pub use decline::{check_consecutive_decline, DeclineRun};
pub use hammer::{analyze_hammer, HammerMetrics};
