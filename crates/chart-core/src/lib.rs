//! # Chart Core
//!
//! 일봉 수집기와 시그널 검출기가 공유하는 핵심 도메인 모델을 제공합니다.
//!
//! - 일봉(`Bar`), 시그널(`SignalDetection`), 종목 마스터(`Security`)
//! - 주말/공휴일을 제외하는 영업일 캘린더
//! - 증분 동기화 계획 (신규/업데이트/스킵)
//! - 로깅 인프라

pub mod calendar;
pub mod domain;
pub mod error;
pub mod logging;
pub mod sync;

pub use calendar::{
    BusinessDayCalendar, HolidayCache, HolidaySet, HolidaySource, MAX_LOOKBACK_DAYS,
};
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use sync::{DateRange, FetchPlan, SyncPlanner, SyncStatus};
