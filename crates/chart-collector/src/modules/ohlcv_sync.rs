//! 일봉 증분 동기화 모듈.
//!
//! 종목별로 저장된 날짜 범위를 확인해 신규/업데이트/스킵을 결정하고,
//! 필요한 구간만 외부 소스에서 조회해 저장합니다.

use std::sync::Arc;
use std::time::Instant;

use chart_core::{BusinessDayCalendar, FetchPlan, SyncPlanner, SyncStatus};
use chart_data::{BarRepository, DataError, MarketDataSource};
use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::error::CollectorError;
use crate::retry::RetryPolicy;
use crate::stats::{PlanSummary, SyncStats};
use crate::throttle::RequestThrottle;
use crate::Result;

/// 종목 하나의 처리 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymbolOutcome {
    Stored { status: SyncStatus, records: usize },
    Empty,
    Skipped,
}

/// 종목별 수집 계획 (날짜 범위 조회 실패 포함).
pub type SymbolPlan = (String, std::result::Result<FetchPlan, DataError>);

/// 일봉 동기화 실행기.
pub struct SyncExecutor {
    repository: Arc<dyn BarRepository>,
    source: Arc<dyn MarketDataSource>,
    calendar: BusinessDayCalendar,
    planner: SyncPlanner,
    retry: RetryPolicy,
    throttle: RequestThrottle,
    batch_size: usize,
}

impl SyncExecutor {
    pub fn new(
        repository: Arc<dyn BarRepository>,
        source: Arc<dyn MarketDataSource>,
        calendar: BusinessDayCalendar,
        config: &SyncConfig,
    ) -> Self {
        Self {
            repository,
            source,
            calendar,
            planner: SyncPlanner::new(config.base_start_date),
            retry: RetryPolicy::new(config.max_retries, config.retry_delay()),
            throttle: RequestThrottle::new(config.request_delay()),
            batch_size: config.batch_size.max(1),
        }
    }

    /// 수집 종료일 결정 (미지정 시 시장 기준 오늘) 후 직전 영업일로 정규화.
    pub async fn resolve_target_end(&self, target_date: Option<NaiveDate>) -> NaiveDate {
        let requested = target_date.unwrap_or_else(BusinessDayCalendar::market_today);
        self.calendar.latest_trading_day_or_input(requested).await
    }

    /// 전체 동기화 실행.
    ///
    /// 종목 단위 실패(날짜 범위 조회, 수집, 저장)는 집계만 하고 계속 진행합니다.
    /// 종목 마스터가 비어 있거나 조회에 실패하면 에러를 반환합니다.
    pub async fn run(
        &self,
        target_date: Option<NaiveDate>,
        test_limit: Option<usize>,
    ) -> Result<SyncStats> {
        let start = Instant::now();
        let mut stats = SyncStats::new();

        let target_end = self.resolve_target_end(target_date).await;
        info!(target_end = %target_end, "일봉 동기화 시작");

        self.log_statistics("동기화 전").await;

        let mut symbols: Vec<String> = self
            .repository
            .list_securities()
            .await?
            .into_iter()
            .map(|s| s.symbol)
            .collect();
        if let Some(limit) = test_limit {
            symbols.truncate(limit);
            info!(limit = limit, "테스트 모드: 종목 수 제한");
        }
        if symbols.is_empty() {
            warn!("수집할 종목이 없습니다");
            return Err(CollectorError::EmptyUniverse);
        }

        let plans = self.plan_all(&symbols, target_end).await;
        self.summarize_plans(&plans).log_summary();

        let total_batches = plans.len().div_ceil(self.batch_size);
        for (batch_idx, batch) in plans.chunks(self.batch_size).enumerate() {
            info!(
                batch = batch_idx + 1,
                total_batches = total_batches,
                symbols = batch.len(),
                "배치 처리"
            );

            for (symbol, plan) in batch {
                stats.total += 1;
                let plan = match plan {
                    Ok(plan) => plan,
                    Err(e) => {
                        stats.failed += 1;
                        error!(symbol = %symbol, error = %e, "날짜 범위 조회 실패");
                        continue;
                    }
                };
                match self.sync_symbol(symbol, plan).await {
                    Ok(SymbolOutcome::Stored { status, records }) => {
                        match status {
                            SyncStatus::New => stats.new += 1,
                            _ => stats.updated += 1,
                        }
                        stats.records += records;
                    }
                    Ok(SymbolOutcome::Empty) => stats.empty += 1,
                    Ok(SymbolOutcome::Skipped) => stats.skipped += 1,
                    Err(e) => {
                        stats.failed += 1;
                        error!(symbol = %symbol, error = %e, "종목 동기화 실패");
                    }
                }
            }
        }

        self.log_statistics("동기화 후").await;

        stats.elapsed = start.elapsed();
        Ok(stats)
    }

    /// 종목별 수집 계획.
    ///
    /// 날짜 범위 조회 실패는 해당 종목의 계획에만 남깁니다.
    pub async fn plan_all(&self, symbols: &[String], target_end: NaiveDate) -> Vec<SymbolPlan> {
        let mut plans = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let plan = self
                .repository
                .get_date_range(symbol)
                .await
                .map(|range| self.planner.plan_fetch(range, target_end));
            if let Ok(plan) = &plan {
                debug!(symbol = %symbol, status = %plan.status(), "수집 계획");
            }
            plans.push((symbol.clone(), plan));
        }
        plans
    }

    /// 계획 분석 (신규/업데이트/스킵/실패 수, 예상 레코드와 소요 시간).
    pub fn summarize_plans(&self, plans: &[SymbolPlan]) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for (_, plan) in plans {
            let Ok(plan) = plan else {
                summary.failed += 1;
                continue;
            };
            match plan.status() {
                SyncStatus::New => summary.new += 1,
                SyncStatus::Update => summary.update += 1,
                SyncStatus::Skip => summary.skip += 1,
            }
            summary.estimated_records += plan.estimated_days();
        }
        summary.estimated_duration = self.throttle.min_interval() * summary.fetch_count() as u32;
        summary
    }

    /// 저장소 통계 로그. 조회 실패는 경고만 남깁니다.
    async fn log_statistics(&self, title: &str) {
        match self.repository.data_statistics().await {
            Ok(statistics) => statistics.log_summary(title),
            Err(e) => warn!(title = title, error = %e, "데이터 통계 조회 실패"),
        }
    }

    async fn sync_symbol(&self, symbol: &str, plan: &FetchPlan) -> Result<SymbolOutcome> {
        let Some((fetch_start, fetch_end)) = plan.window() else {
            debug!(symbol = symbol, "최신 데이터 보유, 스킵");
            return Ok(SymbolOutcome::Skipped);
        };

        let bars = self
            .retry
            .run(
                symbol,
                move || async move {
                    self.throttle.acquire().await;
                    self.source
                        .fetch_history(symbol, fetch_start, fetch_end)
                        .await
                },
                DataError::is_transient,
            )
            .await
            .map_err(|failure| CollectorError::FetchFailed {
                symbol: symbol.to_string(),
                attempts: failure.attempts,
                reason: failure.error.to_string(),
            })?;

        if bars.is_empty() {
            debug!(symbol = symbol, start = %fetch_start, end = %fetch_end, "추가 데이터 없음");
            return Ok(SymbolOutcome::Empty);
        }

        let records = self
            .repository
            .upsert_bars(symbol, &bars)
            .await
            .map_err(|source| CollectorError::PersistenceFailed {
                symbol: symbol.to_string(),
                source,
            })?;

        info!(
            symbol = symbol,
            status = %plan.status(),
            start = %fetch_start,
            end = %fetch_end,
            records = records,
            "저장 완료"
        );

        Ok(SymbolOutcome::Stored {
            status: plan.status(),
            records,
        })
    }
}
