//! 외부 데이터 Provider 모듈.
//!
//! ## 일봉 데이터
//! - `MarketDataSource`: 날짜 범위 일봉 조회 계약
//! - `YahooMarketDataSource`: Yahoo Finance 구현
//!
//! ## 공휴일
//! - `CabinetOfficeHolidaySource`: 내각부 공휴일 CSV (연도별 로컬 파일 캐시)

pub mod holiday;
pub mod yahoo;

pub use holiday::CabinetOfficeHolidaySource;
pub use yahoo::YahooMarketDataSource;

use async_trait::async_trait;
use chart_core::Bar;
use chrono::NaiveDate;

use crate::error::Result;

/// 일봉 데이터 소스.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// `start`..=`end` 구간의 일봉을 날짜 오름차순으로 반환.
    ///
    /// 해당 구간에 데이터가 없으면 빈 벡터를 반환합니다 (오류 아님).
    /// 재시도 가능한 실패는 [`DataError::is_transient`](crate::DataError::is_transient)로 구분됩니다.
    async fn fetch_history(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<Bar>>;
}
