//! 일봉 저장소와 외부 데이터 소스.
//!
//! 이 crate는 다음을 제공합니다:
//! - `BarRepository`: 일봉/시그널 저장소 (PostgreSQL, 인메모리)
//! - `MarketDataSource`: 일봉 조회 소스 (Yahoo Finance)
//! - `CabinetOfficeHolidaySource`: 내각부 공휴일 CSV 소스

pub mod error;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};
pub use provider::{CabinetOfficeHolidaySource, MarketDataSource, YahooMarketDataSource};
pub use storage::{BarRepository, DataStatistics, MemoryBarRepository, PgBarRepository};
