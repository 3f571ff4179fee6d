//! 인메모리 저장소.
//!
//! PostgreSQL 저장소와 같은 upsert 의미를 갖습니다. 테스트와 dry-run에 사용됩니다.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chart_core::{Bar, DateRange, Security, SignalDetection};
use chrono::NaiveDate;
use tokio::sync::RwLock;

use super::{BarRepository, DataStatistics};
use crate::error::{DataError, Result};

#[derive(Default)]
struct MemoryState {
    securities: Vec<Security>,
    bars: BTreeMap<String, BTreeMap<NaiveDate, Bar>>,
    signals: BTreeMap<(String, NaiveDate, String), SignalDetection>,
    failing_writes: HashSet<String>,
}

/// 인메모리 저장소.
#[derive(Default)]
pub struct MemoryBarRepository {
    state: RwLock<MemoryState>,
}

impl MemoryBarRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 종목 마스터를 채운 저장소 생성.
    pub fn with_securities(securities: Vec<Security>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                securities,
                ..Default::default()
            }),
        }
    }

    /// 해당 심볼의 일봉/시그널 쓰기를 실패하도록 설정.
    pub async fn fail_writes_for(&self, symbol: &str) {
        self.state.write().await.failing_writes.insert(symbol.to_string());
    }

    /// 저장된 시그널 전체 (symbol, signal_date 순).
    pub async fn signals(&self) -> Vec<SignalDetection> {
        self.state.read().await.signals.values().cloned().collect()
    }

    /// 저장된 일봉 수.
    pub async fn bar_count(&self, symbol: &str) -> usize {
        self.state
            .read()
            .await
            .bars
            .get(symbol)
            .map(|b| b.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl BarRepository for MemoryBarRepository {
    async fn list_securities(&self) -> Result<Vec<Security>> {
        let mut securities = self.state.read().await.securities.clone();
        securities.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(securities)
    }

    async fn list_bar_symbols(&self) -> Result<Vec<String>> {
        let state = self.state.read().await;
        Ok(state
            .bars
            .iter()
            .filter(|(_, bars)| !bars.is_empty())
            .map(|(symbol, _)| symbol.clone())
            .collect())
    }

    async fn get_security(&self, symbol: &str) -> Result<Option<Security>> {
        let state = self.state.read().await;
        Ok(state.securities.iter().find(|s| s.symbol == symbol).cloned())
    }

    async fn get_date_range(&self, symbol: &str) -> Result<Option<DateRange>> {
        let state = self.state.read().await;
        let Some(bars) = state.bars.get(symbol) else {
            return Ok(None);
        };
        let min = bars.keys().next().copied();
        let max = bars.keys().next_back().copied();
        Ok(min.zip(max).map(|(min, max)| DateRange::new(min, max)))
    }

    async fn upsert_bars(&self, symbol: &str, bars: &[Bar]) -> Result<usize> {
        let mut state = self.state.write().await;
        if state.failing_writes.contains(symbol) {
            return Err(DataError::InsertError(format!("write rejected: {}", symbol)));
        }

        let entry = state.bars.entry(symbol.to_string()).or_default();
        for bar in bars {
            let mut bar = bar.clone();
            bar.symbol = symbol.to_string();
            entry.insert(bar.date, bar);
        }
        Ok(bars.len())
    }

    async fn get_window(
        &self,
        symbol: &str,
        end_inclusive: NaiveDate,
        max_count: usize,
    ) -> Result<Vec<Bar>> {
        let state = self.state.read().await;
        let Some(bars) = state.bars.get(symbol) else {
            return Ok(Vec::new());
        };

        let mut window: Vec<Bar> = bars
            .range(..=end_inclusive)
            .rev()
            .take(max_count)
            .map(|(_, bar)| bar.clone())
            .collect();
        window.reverse();
        Ok(window)
    }

    async fn upsert_signal(&self, detection: &SignalDetection) -> Result<()> {
        let mut state = self.state.write().await;
        if state.failing_writes.contains(&detection.symbol) {
            return Err(DataError::InsertError(format!(
                "write rejected: {}",
                detection.symbol
            )));
        }

        let key = (
            detection.symbol.clone(),
            detection.signal_date,
            detection.signal_type.clone(),
        );

        match state.signals.entry(key) {
            // 기존 행은 지표만 갱신
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.detected_at = detection.detected_at;
                existing.lower_shadow_ratio = detection.lower_shadow_ratio;
                existing.upper_shadow_ratio = detection.upper_shadow_ratio;
                existing.body_ratio = detection.body_ratio;
                existing.decline_days = detection.decline_days;
                existing.decline_start_date = detection.decline_start_date;
                existing.decline_start_price = detection.decline_start_price;
                existing.decline_end_price = detection.decline_end_price;
                existing.total_decline_pct = detection.total_decline_pct;
            }
            Entry::Vacant(entry) => {
                entry.insert(detection.clone());
            }
        }
        Ok(())
    }

    async fn data_statistics(&self) -> Result<DataStatistics> {
        let state = self.state.read().await;
        let non_empty = state.bars.values().filter(|b| !b.is_empty());

        let mut stats = DataStatistics::default();
        let mut latest_counts: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for bars in non_empty {
            stats.unique_symbols += 1;
            stats.total_records += bars.len() as i64;

            let (first, last) = match (bars.keys().next(), bars.keys().next_back()) {
                (Some(first), Some(last)) => (*first, *last),
                _ => continue,
            };
            stats.earliest_date = Some(stats.earliest_date.map_or(first, |d| d.min(first)));
            stats.latest_date = Some(stats.latest_date.map_or(last, |d| d.max(last)));
            *latest_counts.entry(last).or_default() += 1;
        }

        stats.latest_date_distribution = latest_counts.into_iter().rev().take(5).collect();
        Ok(stats)
    }
}
