//! 일봉/시그널 저장소.
//!
//! - `PgBarRepository`: PostgreSQL (`stocks`, `stock_master`, `signal_detections`)
//! - `MemoryBarRepository`: 테스트 및 dry-run용 인메모리 구현

pub mod memory;
pub mod postgres;

pub use memory::MemoryBarRepository;
pub use postgres::PgBarRepository;

use async_trait::async_trait;
use chart_core::{Bar, DateRange, Security, SignalDetection};
use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;

/// 일봉 및 시그널 저장소.
#[async_trait]
pub trait BarRepository: Send + Sync {
    /// 종목 마스터 전체 (코드순).
    async fn list_securities(&self) -> Result<Vec<Security>>;

    /// 일봉이 하나 이상 저장된 종목 심볼 (심볼순).
    async fn list_bar_symbols(&self) -> Result<Vec<String>>;

    /// 심볼로 종목 마스터 조회.
    async fn get_security(&self, symbol: &str) -> Result<Option<Security>>;

    /// 저장된 일봉의 최소/최대 날짜. 일봉이 없으면 `None`.
    async fn get_date_range(&self, symbol: &str) -> Result<Option<DateRange>>;

    /// (symbol, date) 기준 upsert. 반영된 행 수를 반환합니다.
    async fn upsert_bars(&self, symbol: &str, bars: &[Bar]) -> Result<usize>;

    /// `end_inclusive` 이하의 최신 `max_count`개 일봉을 오래된 순으로 반환.
    async fn get_window(
        &self,
        symbol: &str,
        end_inclusive: NaiveDate,
        max_count: usize,
    ) -> Result<Vec<Bar>>;

    /// (symbol, signal_date) 기준 upsert. 기존 행은 지표만 갱신됩니다.
    async fn upsert_signal(&self, detection: &SignalDetection) -> Result<()>;

    /// 전체 데이터 통계.
    async fn data_statistics(&self) -> Result<DataStatistics>;
}

/// 저장된 일봉 통계.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataStatistics {
    /// 종목 수
    pub unique_symbols: i64,
    /// 총 레코드 수
    pub total_records: i64,
    /// 가장 오래된 데이터
    pub earliest_date: Option<NaiveDate>,
    /// 가장 최신 데이터
    pub latest_date: Option<NaiveDate>,
    /// 종목별 최신일 분포 (최신일, 종목 수) 상위 5개, 최신일 내림차순
    pub latest_date_distribution: Vec<(NaiveDate, i64)>,
}

impl DataStatistics {
    /// 통계 로그 출력
    pub fn log_summary(&self, title: &str) {
        tracing::info!(
            title = title,
            unique_symbols = self.unique_symbols,
            total_records = self.total_records,
            earliest = ?self.earliest_date,
            latest = ?self.latest_date,
            "데이터 통계"
        );
        for (date, count) in &self.latest_date_distribution {
            tracing::info!(latest_date = %date, symbols = count, "최신일별 종목 수");
        }
    }
}
