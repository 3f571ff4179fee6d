//! 하락 후 망치형(아랫꼬리) 시그널.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Security;

/// 시그널 유형 식별자 (DB `signal_type` 컬럼 값).
pub const SIGNAL_TYPE_HAMMER_AFTER_DECLINE: &str = "hammer_after_decline";

/// 검출된 시그널.
///
/// (symbol, signal_date)당 하나의 논리적 행으로 저장됩니다.
/// 같은 조합으로 재검출되면 비율/지표만 갱신됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDetection {
    pub symbol: String,
    /// 망치형 캔들이 나타난 거래일
    pub signal_date: NaiveDate,
    pub signal_type: String,

    // 망치형 캔들 스냅샷
    pub hammer_open: Decimal,
    pub hammer_high: Decimal,
    pub hammer_low: Decimal,
    pub hammer_close: Decimal,
    pub hammer_volume: i64,

    /// 아랫꼬리 / 전체 범위 (%)
    pub lower_shadow_ratio: Decimal,
    /// 윗꼬리 / 전체 범위 (%)
    pub upper_shadow_ratio: Decimal,
    /// 몸통 / 전체 범위 (%)
    pub body_ratio: Decimal,

    /// 연속 하락 일수
    pub decline_days: u32,
    /// 하락 시작일
    pub decline_start_date: NaiveDate,
    /// 하락 시작일 종가
    pub decline_start_price: Decimal,
    /// 망치형 전일 종가
    pub decline_end_price: Decimal,
    /// 총 하락률 (%)
    pub total_decline_pct: Decimal,

    pub stock_name: Option<String>,
    pub market: Option<String>,
    pub sector: Option<String>,

    /// 검출 시각
    pub detected_at: DateTime<Utc>,
}

impl SignalDetection {
    /// 종목 마스터 정보로 종목명/시장/업종을 채웁니다.
    pub fn with_security(mut self, security: Option<&Security>) -> Self {
        if let Some(sec) = security {
            self.stock_name = Some(sec.name.clone());
            self.market = sec.market.clone();
            self.sector = sec.sector.clone();
        }
        self
    }
}
