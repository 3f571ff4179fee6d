//! 하락 후 망치형 시그널 검출 모듈.

use std::sync::Arc;
use std::time::Instant;

use chart_analytics::HammerSignalDetector;
use chart_core::{BusinessDayCalendar, SignalDetection};
use chart_data::BarRepository;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use crate::config::DetectConfig;
use crate::error::CollectorError;
use crate::stats::DetectionStats;
use crate::Result;

/// 진행 상황 로그 주기 (종목 수).
const PROGRESS_INTERVAL: usize = 100;

/// 시그널 검출 실행기.
pub struct SignalDetectionRunner {
    repository: Arc<dyn BarRepository>,
    calendar: BusinessDayCalendar,
    detector: HammerSignalDetector,
}

impl SignalDetectionRunner {
    pub fn new(
        repository: Arc<dyn BarRepository>,
        calendar: BusinessDayCalendar,
        config: &DetectConfig,
    ) -> Self {
        Self {
            repository,
            calendar,
            detector: HammerSignalDetector::new(config.min_decline_days, config.lookback),
        }
    }

    /// 검출 대상 거래일: [최근 영업일, 그 직전 영업일] (최신 순).
    pub async fn target_dates(&self, reference: NaiveDate) -> Vec<NaiveDate> {
        let latest = self.calendar.latest_trading_day_or_input(reference).await;
        match self.calendar.previous_trading_day(latest).await {
            Ok(previous) => vec![latest, previous],
            Err(e) => {
                warn!(latest = %latest, error = %e, "직전 영업일 계산 실패, 최근 영업일만 검사");
                vec![latest]
            }
        }
    }

    /// 현재 시각 기준 검출 실행.
    pub async fn run(
        &self,
        reference: Option<NaiveDate>,
        limit: Option<usize>,
    ) -> Result<DetectionStats> {
        self.run_at(reference, limit, Utc::now()).await
    }

    /// 검출 실행.
    ///
    /// 종목마다 대상 거래일을 최신 순으로 평가하고, 첫 시그널만 저장합니다.
    /// 종목 단위 에러는 집계 후 다음 종목으로 진행합니다.
    pub async fn run_at(
        &self,
        reference: Option<NaiveDate>,
        limit: Option<usize>,
        detected_at: DateTime<Utc>,
    ) -> Result<DetectionStats> {
        let start = Instant::now();
        let mut stats = DetectionStats::new();

        let reference = reference.unwrap_or_else(BusinessDayCalendar::market_today);
        let target_dates = self.target_dates(reference).await;
        info!(
            target_dates = ?target_dates,
            min_decline_days = self.detector.min_decline_days,
            lookback = self.detector.lookback,
            "시그널 검출 시작"
        );

        let mut symbols = self.repository.list_bar_symbols().await?;
        if let Some(limit) = limit {
            symbols.truncate(limit);
            info!(limit = limit, "테스트 모드: 종목 수 제한");
        }
        if symbols.is_empty() {
            warn!("검출할 종목이 없습니다");
            return Err(CollectorError::EmptyUniverse);
        }

        let total = symbols.len();
        for (idx, symbol) in symbols.iter().enumerate() {
            stats.processed += 1;

            match self.detect_symbol(symbol, &target_dates, detected_at).await {
                Ok(Some(signal)) => {
                    stats.signals += 1;
                    info!(
                        symbol = %signal.symbol,
                        name = signal.stock_name.as_deref().unwrap_or("-"),
                        signal_date = %signal.signal_date,
                        decline_days = signal.decline_days,
                        total_decline_pct = %signal.total_decline_pct,
                        "시그널 검출"
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    stats.errors += 1;
                    error!(symbol = %symbol, error = %e, "종목 검출 실패");
                }
            }

            if (idx + 1) % PROGRESS_INTERVAL == 0 {
                info!(
                    progress = format!("{}/{}", idx + 1, total),
                    signals = stats.signals,
                    "검출 진행 중"
                );
            }
        }

        stats.elapsed = start.elapsed();
        Ok(stats)
    }

    async fn detect_symbol(
        &self,
        symbol: &str,
        target_dates: &[NaiveDate],
        detected_at: DateTime<Utc>,
    ) -> Result<Option<SignalDetection>> {
        for &target in target_dates {
            let window = self
                .repository
                .get_window(symbol, target, self.detector.lookback)
                .await?;

            let Some(signal) = self.detector.evaluate(&window, target, detected_at) else {
                debug!(symbol = symbol, target = %target, "시그널 없음");
                continue;
            };

            let security = self.repository.get_security(symbol).await?;
            let signal = signal.with_security(security.as_ref());

            self.repository
                .upsert_signal(&signal)
                .await
                .map_err(|source| CollectorError::PersistenceFailed {
                    symbol: symbol.to_string(),
                    source,
                })?;

            return Ok(Some(signal));
        }
        Ok(None)
    }
}
