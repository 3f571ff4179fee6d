//! 망치형(아랫꼬리) 캔들 판정.
//!
//! 판정 규칙:
//! - 종가 > 저가
//! - (종가 - 저가) >= (고가 - 시가)
//!
//! 꼬리/몸통 비율은 기록용이며 판정에 사용하지 않습니다.

use chart_core::Bar;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// 망치형 판정 결과와 캔들 비율.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HammerMetrics {
    /// 망치형 여부.
    pub is_hammer: bool,
    /// 종가 - 저가.
    pub close_low_diff: Decimal,
    /// 고가 - 시가.
    pub high_open_diff: Decimal,
    /// 아랫꼬리 / 전체 범위 (%).
    pub lower_shadow_ratio: Decimal,
    /// 윗꼬리 / 전체 범위 (%).
    pub upper_shadow_ratio: Decimal,
    /// 몸통 / 전체 범위 (%).
    pub body_ratio: Decimal,
}

fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    (part / whole * dec!(100)).round_dp(2)
}

/// 캔들을 분석합니다.
///
/// 고가 == 저가(범위 0)인 캔들은 판정할 수 없으므로 `None`을 반환합니다.
pub fn analyze_hammer(bar: &Bar) -> Option<HammerMetrics> {
    let total_range = bar.range();
    if total_range <= Decimal::ZERO {
        return None;
    }

    let close_low_diff = bar.close - bar.low;
    let high_open_diff = bar.high - bar.open;
    let is_hammer = bar.close > bar.low && close_low_diff >= high_open_diff;

    Some(HammerMetrics {
        is_hammer,
        close_low_diff,
        high_open_diff,
        lower_shadow_ratio: percent_of(bar.lower_shadow(), total_range),
        upper_shadow_ratio: percent_of(bar.upper_shadow(), total_range),
        body_ratio: percent_of(bar.body_size(), total_range),
    })
}
