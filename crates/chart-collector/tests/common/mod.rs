//! 통합 테스트 공용 도우미.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chart_core::{Bar, BusinessDayCalendar, DateRange, HolidayCache, HolidaySet, Security, SignalDetection};
use chart_data::{BarRepository, DataError, DataStatistics, MarketDataSource, MemoryBarRepository};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use rust_decimal::Decimal;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 2025-01-13 (성인의 날)만 공휴일로 둔 캘린더.
pub fn calendar() -> BusinessDayCalendar {
    let holidays = HolidaySet::from_dates(2025, [date(2025, 1, 13)]);
    BusinessDayCalendar::new(Arc::new(HolidayCache::fixed([holidays])))
}

pub fn bar(symbol: &str, date: NaiveDate, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Bar {
    Bar::new(symbol, date, open, high, low, close, 10_000)
}

/// 몸통/꼬리가 없는 평범한 캔들 (종가 기준).
pub fn plain_bar(symbol: &str, date: NaiveDate, close: Decimal) -> Bar {
    bar(symbol, date, close, close + Decimal::ONE, close - Decimal::ONE, close)
}

/// `start`부터 `end`까지 평일마다 하나씩 생성.
pub fn weekday_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    let mut bars = Vec::new();
    let mut current = start;
    while current <= end {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            bars.push(plain_bar(symbol, current, Decimal::from(100)));
        }
        current = current + Days::new(1);
    }
    bars
}

/// 스크립트로 응답을 정하는 가짜 데이터 소스.
#[derive(Default)]
pub struct FakeSource {
    bars: HashMap<String, Vec<Bar>>,
    failures: Mutex<HashMap<String, VecDeque<DataError>>>,
    calls: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    /// 다음 조회들이 순서대로 실패하도록 설정.
    pub fn with_failures(self, symbol: &str, errors: Vec<DataError>) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(symbol.to_string(), errors.into());
        self
    }

    pub fn calls(&self) -> Vec<(String, NaiveDate, NaiveDate)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, symbol: &str) -> usize {
        self.calls().iter().filter(|(s, _, _)| s == symbol).count()
    }
}

#[async_trait]
impl MarketDataSource for FakeSource {
    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> chart_data::Result<Vec<Bar>> {
        self.calls
            .lock()
            .unwrap()
            .push((symbol.to_string(), start, end));

        let failure = self
            .failures
            .lock()
            .unwrap()
            .get_mut(symbol)
            .and_then(|queue| queue.pop_front());
        if let Some(err) = failure {
            return Err(err);
        }

        Ok(self
            .bars
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn source(fake: FakeSource) -> Arc<FakeSource> {
    Arc::new(fake)
}

/// 날짜 범위/통계 조회를 실패시킬 수 있는 저장소 래퍼.
pub struct FlakyRepository {
    inner: Arc<MemoryBarRepository>,
    failing_ranges: Vec<String>,
    failing_statistics: bool,
}

impl FlakyRepository {
    pub fn new(inner: Arc<MemoryBarRepository>) -> Self {
        Self {
            inner,
            failing_ranges: Vec::new(),
            failing_statistics: false,
        }
    }

    pub fn fail_range_for(mut self, symbol: &str) -> Self {
        self.failing_ranges.push(symbol.to_string());
        self
    }

    pub fn fail_statistics(mut self) -> Self {
        self.failing_statistics = true;
        self
    }
}

#[async_trait]
impl BarRepository for FlakyRepository {
    async fn list_securities(&self) -> chart_data::Result<Vec<Security>> {
        self.inner.list_securities().await
    }

    async fn list_bar_symbols(&self) -> chart_data::Result<Vec<String>> {
        self.inner.list_bar_symbols().await
    }

    async fn get_security(&self, symbol: &str) -> chart_data::Result<Option<Security>> {
        self.inner.get_security(symbol).await
    }

    async fn get_date_range(&self, symbol: &str) -> chart_data::Result<Option<DateRange>> {
        if self.failing_ranges.iter().any(|s| s == symbol) {
            return Err(DataError::QueryError("statement timeout".to_string()));
        }
        self.inner.get_date_range(symbol).await
    }

    async fn upsert_bars(&self, symbol: &str, bars: &[Bar]) -> chart_data::Result<usize> {
        self.inner.upsert_bars(symbol, bars).await
    }

    async fn get_window(
        &self,
        symbol: &str,
        end_inclusive: NaiveDate,
        max_count: usize,
    ) -> chart_data::Result<Vec<Bar>> {
        self.inner.get_window(symbol, end_inclusive, max_count).await
    }

    async fn upsert_signal(&self, detection: &SignalDetection) -> chart_data::Result<()> {
        self.inner.upsert_signal(detection).await
    }

    async fn data_statistics(&self) -> chart_data::Result<DataStatistics> {
        if self.failing_statistics {
            return Err(DataError::ConnectionError("pool closed".to_string()));
        }
        self.inner.data_statistics().await
    }
}
