//! 시그널 검출 통합 테스트.

mod common;

use std::sync::Arc;

use chart_collector::config::DetectConfig;
use chart_collector::modules::SignalDetectionRunner;
use chart_collector::CollectorError;
use chart_core::{Bar, Security, SIGNAL_TYPE_HAMMER_AFTER_DECLINE};
use chart_data::{BarRepository, MemoryBarRepository};
use chrono::{NaiveDate, TimeZone, Utc};
use common::{bar, calendar, date, plain_bar};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 2024-12-30 ~ 2025-01-10 평일.
fn trading_dates() -> Vec<NaiveDate> {
    vec![
        date(2024, 12, 30),
        date(2024, 12, 31),
        date(2025, 1, 1),
        date(2025, 1, 2),
        date(2025, 1, 3),
        date(2025, 1, 6),
        date(2025, 1, 7),
        date(2025, 1, 8),
        date(2025, 1, 9),
        date(2025, 1, 10),
    ]
}

fn series(symbol: &str, closes: &[Decimal]) -> Vec<Bar> {
    trading_dates()
        .into_iter()
        .zip(closes)
        .map(|(d, &c)| plain_bar(symbol, d, c))
        .collect()
}

/// 7일 연속 하락 후 1/10 망치형.
fn hammer_on_latest(symbol: &str) -> Vec<Bar> {
    let mut bars = series(
        symbol,
        &[
            dec!(130),
            dec!(131),
            dec!(125),
            dec!(120),
            dec!(115),
            dec!(110),
            dec!(105),
            dec!(100),
            dec!(95),
        ],
    );
    bars.push(bar(symbol, date(2025, 1, 10), dec!(94), dec!(96), dec!(85), dec!(95)));
    bars
}

/// 1/9 망치형, 1/10은 긴 윗꼬리 캔들.
fn hammer_on_previous(symbol: &str) -> Vec<Bar> {
    let mut bars = series(
        symbol,
        &[
            dec!(200),
            dec!(210),
            dec!(205),
            dec!(200),
            dec!(195),
            dec!(190),
            dec!(185),
        ],
    );
    bars.push(bar(symbol, date(2025, 1, 8), dec!(184), dec!(186), dec!(170), dec!(180)));
    bars.push(bar(symbol, date(2025, 1, 9), dec!(178), dec!(179), dec!(165), dec!(176)));
    bars.push(bar(symbol, date(2025, 1, 10), dec!(176), dec!(190), dec!(175), dec!(176)));
    bars
}

fn detected_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 14, 7, 0, 0).unwrap()
}

async fn repository() -> Arc<MemoryBarRepository> {
    let mut toyota = Security::new("7203", "7203.T", "Toyota Motor");
    toyota.market = Some("Prime".to_string());
    toyota.sector = Some("Transportation Equipment".to_string());

    let repo = Arc::new(MemoryBarRepository::with_securities(vec![toyota]));
    repo.upsert_bars("7203.T", &hammer_on_latest("7203.T")).await.unwrap();
    repo.upsert_bars("6501.T", &hammer_on_previous("6501.T")).await.unwrap();
    // 1/8 이후 데이터 없음
    repo.upsert_bars(
        "4502.T",
        &series("4502.T", &[dec!(50), dec!(49), dec!(48), dec!(47), dec!(46), dec!(45), dec!(44), dec!(43)]),
    )
    .await
    .unwrap();
    repo
}

fn runner(repo: &Arc<MemoryBarRepository>) -> SignalDetectionRunner {
    let repository: Arc<dyn BarRepository> = repo.clone();
    SignalDetectionRunner::new(repository, calendar(), &DetectConfig::default())
}

#[tokio::test]
async fn target_dates_skip_weekends_and_holidays() {
    let repo = repository().await;
    let runner = runner(&repo);

    // 1/13(월)은 공휴일
    assert_eq!(
        runner.target_dates(date(2025, 1, 14)).await,
        vec![date(2025, 1, 14), date(2025, 1, 10)]
    );
    assert_eq!(
        runner.target_dates(date(2025, 1, 13)).await,
        vec![date(2025, 1, 10), date(2025, 1, 9)]
    );
}

#[tokio::test]
async fn detects_newest_signal_per_symbol() {
    let repo = repository().await;

    let stats = runner(&repo)
        .run_at(Some(date(2025, 1, 13)), None, detected_at())
        .await
        .unwrap();

    assert_eq!(stats.processed, 3);
    assert_eq!(stats.signals, 2);
    assert_eq!(stats.errors, 0);

    let signals = repo.signals().await;
    assert_eq!(signals.len(), 2);

    // 1/9, 1/10 모두 조건을 만족하지만 최신일 하나만 저장
    let toyota = signals.iter().find(|s| s.symbol == "7203.T").unwrap();
    assert_eq!(toyota.signal_date, date(2025, 1, 10));
    assert_eq!(toyota.signal_type, SIGNAL_TYPE_HAMMER_AFTER_DECLINE);
    assert_eq!(toyota.decline_days, 7);
    assert_eq!(toyota.decline_start_date, date(2024, 12, 31));
    assert_eq!(toyota.decline_start_price, dec!(131));
    assert_eq!(toyota.decline_end_price, dec!(95));
    assert_eq!(toyota.total_decline_pct, dec!(27.48));
    assert_eq!(toyota.stock_name.as_deref(), Some("Toyota Motor"));
    assert_eq!(toyota.market.as_deref(), Some("Prime"));
    assert_eq!(toyota.detected_at, detected_at());

    let hitachi = signals.iter().find(|s| s.symbol == "6501.T").unwrap();
    assert_eq!(hitachi.signal_date, date(2025, 1, 9));
    assert!(hitachi.stock_name.is_none());
}

#[tokio::test]
async fn rerun_keeps_single_identical_row() {
    let repo = repository().await;
    let runner = runner(&repo);

    runner
        .run_at(Some(date(2025, 1, 13)), None, detected_at())
        .await
        .unwrap();
    let first = repo.signals().await;

    runner
        .run_at(Some(date(2025, 1, 13)), None, detected_at())
        .await
        .unwrap();
    let second = repo.signals().await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn symbol_errors_are_counted() {
    let repo = repository().await;
    repo.fail_writes_for("7203.T").await;

    let stats = runner(&repo)
        .run_at(Some(date(2025, 1, 13)), None, detected_at())
        .await
        .unwrap();

    assert_eq!(stats.processed, 3);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.signals, 1);
}

#[tokio::test]
async fn limit_restricts_universe() {
    let repo = repository().await;

    let stats = runner(&repo)
        .run_at(Some(date(2025, 1, 13)), Some(1), detected_at())
        .await
        .unwrap();

    // 심볼순 첫 종목 4502.T
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.signals, 0);
}

#[tokio::test]
async fn empty_universe_is_an_error() {
    let repo = Arc::new(MemoryBarRepository::new());
    let result = runner(&repo)
        .run_at(Some(date(2025, 1, 13)), None, detected_at())
        .await;
    assert!(matches!(result, Err(CollectorError::EmptyUniverse)));
}
