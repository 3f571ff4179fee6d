//! "하락 후 망치형" 시그널 평가.
//!
//! 한 종목의 최근 캔들 윈도우(오래된 순)를 받아, 마지막 캔들이 대상 거래일의
//! 망치형이고 그 직전에 최소 일수 이상 종가가 연속 하락했으면 시그널을 생성합니다.

use chart_core::{Bar, SignalDetection, SIGNAL_TYPE_HAMMER_AFTER_DECLINE};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::pattern::{analyze_hammer, check_consecutive_decline};

/// 기본 최소 연속 하락 일수.
pub const DEFAULT_MIN_DECLINE_DAYS: u32 = 4;
/// 기본 조회 캔들 수.
pub const DEFAULT_LOOKBACK: usize = 20;

/// 하락 후 망치형 시그널 검출기.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HammerSignalDetector {
    /// 최소 연속 하락 일수.
    pub min_decline_days: u32,
    /// 윈도우 캔들 수.
    pub lookback: usize,
}

impl Default for HammerSignalDetector {
    fn default() -> Self {
        Self {
            min_decline_days: DEFAULT_MIN_DECLINE_DAYS,
            lookback: DEFAULT_LOOKBACK,
        }
    }
}

impl HammerSignalDetector {
    pub fn new(min_decline_days: u32, lookback: usize) -> Self {
        Self {
            min_decline_days,
            lookback,
        }
    }

    /// 윈도우의 마지막 캔들을 대상 거래일 기준으로 평가합니다.
    ///
    /// 다음 경우 `None`:
    /// - 캔들 수가 `min_decline_days + 1` 미만
    /// - 마지막 캔들 날짜가 `target_date`와 다름 (해당일 데이터 없음)
    /// - 망치형이 아니거나 연속 하락 조건 미충족
    pub fn evaluate(
        &self,
        window: &[Bar],
        target_date: NaiveDate,
        detected_at: DateTime<Utc>,
    ) -> Option<SignalDetection> {
        if window.len() < self.min_decline_days as usize + 1 {
            return None;
        }

        let hammer_index = window.len() - 1;
        let hammer = &window[hammer_index];
        if hammer.date != target_date {
            trace!(symbol = %hammer.symbol, last = %hammer.date, target = %target_date, "대상일 캔들 없음");
            return None;
        }

        let metrics = analyze_hammer(hammer).filter(|m| m.is_hammer)?;
        let decline = check_consecutive_decline(window, hammer_index, self.min_decline_days)?;

        Some(SignalDetection {
            symbol: hammer.symbol.clone(),
            signal_date: hammer.date,
            signal_type: SIGNAL_TYPE_HAMMER_AFTER_DECLINE.to_string(),
            hammer_open: hammer.open,
            hammer_high: hammer.high,
            hammer_low: hammer.low,
            hammer_close: hammer.close,
            hammer_volume: hammer.volume,
            lower_shadow_ratio: metrics.lower_shadow_ratio,
            upper_shadow_ratio: metrics.upper_shadow_ratio,
            body_ratio: metrics.body_ratio,
            decline_days: decline.days,
            decline_start_date: decline.start_date,
            decline_start_price: decline.start_price,
            decline_end_price: decline.end_price,
            total_decline_pct: decline.total_decline_pct,
            stock_name: None,
            market: None,
            sector: None,
            detected_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 3).unwrap() + Duration::days(offset)
    }

    fn flat(offset: i64, close: Decimal) -> Bar {
        Bar::new("9984.T", day(offset), close, close + dec!(1), close - dec!(1), close, 1_000)
    }

    /// 5일 연속 하락 후 망치형.
    fn hammer_window() -> Vec<Bar> {
        let mut window: Vec<Bar> = [dec!(120), dec!(115), dec!(110), dec!(105), dec!(100), dec!(95)]
            .iter()
            .enumerate()
            .map(|(i, &c)| flat(i as i64, c))
            .collect();
        window.push(Bar::new("9984.T", day(6), dec!(94), dec!(96), dec!(85), dec!(95), 3_000));
        window
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_detects_hammer_after_decline() {
        let detector = HammerSignalDetector::default();
        let signal = detector.evaluate(&hammer_window(), day(6), now()).unwrap();

        assert_eq!(signal.signal_type, SIGNAL_TYPE_HAMMER_AFTER_DECLINE);
        assert_eq!(signal.signal_date, day(6));
        assert_eq!(signal.decline_days, 5);
        assert_eq!(signal.decline_start_date, day(0));
        assert_eq!(signal.decline_start_price, dec!(120));
        assert_eq!(signal.decline_end_price, dec!(95));
        assert_eq!(signal.total_decline_pct, dec!(20.83));
        assert_eq!(signal.hammer_volume, 3_000);
        assert!(signal.stock_name.is_none());
    }

    #[test]
    fn test_target_date_mismatch() {
        let detector = HammerSignalDetector::default();
        assert!(detector.evaluate(&hammer_window(), day(7), now()).is_none());
    }

    #[test]
    fn test_short_window() {
        let detector = HammerSignalDetector::default();
        let window = hammer_window();
        assert!(detector.evaluate(&window[3..], day(6), now()).is_none());
    }

    #[test]
    fn test_zero_threshold_single_bar() {
        let detector = HammerSignalDetector::new(0, 20);
        let window = hammer_window();
        assert!(detector.evaluate(&window[6..], day(6), now()).is_none());

        let signal = detector.evaluate(&window[5..], day(6), now()).unwrap();
        assert_eq!(signal.decline_days, 0);
        assert_eq!(signal.decline_start_date, day(5));
    }

    #[test]
    fn test_non_hammer_last_bar() {
        let detector = HammerSignalDetector::default();
        let mut window = hammer_window();
        // 긴 윗꼬리
        window[6] = Bar::new("9984.T", day(6), dec!(94), dec!(104), dec!(93), dec!(94), 3_000);
        assert!(detector.evaluate(&window, day(6), now()).is_none());
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let detector = HammerSignalDetector::default();
        let first = detector.evaluate(&hammer_window(), day(6), now());
        let second = detector.evaluate(&hammer_window(), day(6), now());
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn prop_signal_respects_threshold(
            closes in prop::collection::vec(1u32..500, 1..25),
            min_days in 0u32..6,
        ) {
            let window: Vec<Bar> = closes
                .iter()
                .enumerate()
                .map(|(i, &c)| {
                    let c = Decimal::from(c);
                    Bar::new("1301.T", day(i as i64), c, c + dec!(1), c - dec!(2), c, 10)
                })
                .collect();
            let target = window[window.len() - 1].date;
            let detector = HammerSignalDetector::new(min_days, 20);

            if let Some(signal) = detector.evaluate(&window, target, now()) {
                prop_assert!(signal.decline_days >= min_days);
                prop_assert!(signal.decline_start_date < signal.signal_date);
                prop_assert!(signal.body_ratio >= Decimal::ZERO && signal.body_ratio <= dec!(100));
            }
        }
    }
}
