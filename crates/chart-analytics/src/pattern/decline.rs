//! 연속 하락 구간 검증.

use chart_core::Bar;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// 망치형 직전의 연속 하락 구간.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclineRun {
    /// 연속 하락 일수.
    pub days: u32,
    /// 하락 시작 캔들 인덱스.
    pub start_index: usize,
    pub start_date: NaiveDate,
    pub start_price: Decimal,
    /// 망치형 전일 종가.
    pub end_price: Decimal,
    /// 총 하락률 (%).
    pub total_decline_pct: Decimal,
}

/// `hammer_index` 직전까지 종가가 연속으로 하락했는지 확인합니다.
///
/// `hammer_index - 1`부터 거꾸로 인접 캔들 쌍을 비교하며, 종가가 이전보다
/// 낮지 않은 첫 쌍에서 멈춥니다. 하락 일수가 `min_days` 이상이면 구간을 반환합니다.
/// 망치형 캔들 자신의 종가는 비교하지 않습니다.
pub fn check_consecutive_decline(
    window: &[Bar],
    hammer_index: usize,
    min_days: u32,
) -> Option<DeclineRun> {
    // 비교할 직전 캔들이 하나는 있어야 함
    if hammer_index == 0 || hammer_index >= window.len() || hammer_index < min_days as usize {
        return None;
    }

    let days = window[..hammer_index]
        .windows(2)
        .rev()
        .take_while(|pair| pair[1].close < pair[0].close)
        .count();

    if days < min_days as usize {
        return None;
    }

    let start_index = hammer_index - 1 - days;
    let start = &window[start_index];
    let end_price = window[hammer_index - 1].close;

    let total_decline_pct = if start.close.is_zero() {
        Decimal::ZERO
    } else {
        ((start.close - end_price) / start.close * dec!(100)).round_dp(2)
    };

    Some(DeclineRun {
        days: days as u32,
        start_index,
        start_date: start.date,
        start_price: start.close,
        end_price,
        total_decline_pct,
    })
}
